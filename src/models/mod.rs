pub mod config;
pub mod key;
pub mod stats;

pub use config::TrackerConfig;
pub use key::RawKey;
pub use stats::{MostActiveDay, Period, StatsSnapshot};
