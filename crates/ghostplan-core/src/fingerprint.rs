//! Identity keys for placed suggestions.
//!
//! Two placements with the same fingerprint are treated as the same ghost,
//! even when they came out of different refresh passes. Reusing the old id
//! for a matching fingerprint keeps the user's selection attached to it and
//! stops the list from flickering when nothing really moved.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interval::snap_up;
use crate::suggestion::{PlacedSuggestion, SuggestionId};

const FINGERPRINT_GRID_MINUTES: i64 = 5;

/// `title|minutes|energy|start-epoch-minutes`, title lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(suggestion: &PlacedSuggestion) -> Self {
        let start = snap_up(suggestion.start, FINGERPRINT_GRID_MINUTES);
        Self(format!(
            "{}|{}|{}|{}",
            suggestion.title().to_lowercase(),
            suggestion.duration_minutes,
            suggestion.candidate.energy,
            start.timestamp().div_euclid(60),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Carry ids over from `previous` to matching entries of `next`.
///
/// Each previous id is handed out at most once; when several placements
/// share a fingerprint they are paired up in list order.
pub fn reconcile(previous: &[PlacedSuggestion], next: Vec<PlacedSuggestion>) -> Vec<PlacedSuggestion> {
    let mut known: HashMap<Fingerprint, VecDeque<SuggestionId>> = HashMap::new();
    for p in previous {
        known.entry(Fingerprint::of(p)).or_default().push_back(p.id);
    }

    next.into_iter()
        .map(|mut p| {
            if let Some(id) = known.get_mut(&Fingerprint::of(&p)).and_then(VecDeque::pop_front) {
                p.id = id;
            }
            p
        })
        .collect()
}

/// Ordered comparison of two start-sorted lists.
///
/// The same fingerprints in a different order still count as a change,
/// since the layout on screen differs.
pub fn has_changed(previous: &[PlacedSuggestion], next: &[PlacedSuggestion]) -> bool {
    previous.len() != next.len()
        || previous
            .iter()
            .zip(next)
            .any(|(a, b)| Fingerprint::of(a) != Fingerprint::of(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::{CandidateSuggestion, EnergyTag};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    fn ghost(title: &str, start: DateTime<Utc>, minutes: i64) -> PlacedSuggestion {
        PlacedSuggestion::new(CandidateSuggestion::new(title, minutes), start, Duration::minutes(minutes))
    }

    #[test]
    fn fingerprint_format() {
        let p = ghost("Walk Outside", at(6, 0), 20);
        let expected = format!("walk outside|20|medium|{}", at(6, 0).timestamp() / 60);
        assert_eq!(Fingerprint::of(&p).as_str(), expected);
    }

    #[test]
    fn fingerprint_ignores_title_case_but_not_energy() {
        let a = ghost("Walk", at(6, 0), 20);
        let b = ghost("WALK", at(6, 0), 20);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));

        let mut c = ghost("Walk", at(6, 0), 20);
        c.candidate.energy = EnergyTag::High;
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&c));
    }

    #[test]
    fn reconcile_reuses_ids_for_matching_fingerprints() {
        let previous = vec![ghost("Walk", at(6, 0), 20), ghost("Read", at(9, 0), 30)];
        let next = vec![ghost("Walk", at(6, 0), 20), ghost("Read", at(9, 5), 30)];

        let merged = reconcile(&previous, next.clone());
        assert_eq!(merged[0].id, previous[0].id);
        assert_eq!(merged[1].id, next[1].id);
        assert_ne!(merged[1].id, previous[1].id);
    }

    #[test]
    fn reconcile_hands_out_each_id_once() {
        let previous = vec![ghost("Water", at(9, 0), 10)];
        let next = vec![ghost("Water", at(9, 0), 10), ghost("Water", at(9, 0), 10)];

        let merged = reconcile(&previous, next);
        assert_eq!(merged[0].id, previous[0].id);
        assert_ne!(merged[1].id, previous[0].id);
    }

    #[test]
    fn identical_lists_are_unchanged() {
        let previous = vec![ghost("Walk", at(6, 0), 20), ghost("Read", at(9, 0), 30)];
        let next = vec![ghost("Walk", at(6, 0), 20), ghost("Read", at(9, 0), 30)];
        assert!(!has_changed(&previous, &next));
        assert!(!has_changed(&[], &[]));
    }

    #[test]
    fn count_or_position_difference_is_a_change() {
        let a = ghost("Walk", at(6, 0), 20);
        let b = ghost("Read", at(9, 0), 30);
        assert!(has_changed(&[a.clone()], &[a.clone(), b.clone()]));
        assert!(has_changed(&[a.clone(), b.clone()], &[b, a]));
    }
}
