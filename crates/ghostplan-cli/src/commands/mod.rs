pub mod config;
pub mod gaps;
pub mod plan;
pub mod watch;
