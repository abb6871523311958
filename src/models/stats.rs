use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Time window for count queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Week,
    Month,
    All,
}

impl Period {
    /// First calendar date included in this period, relative to `today`.
    /// `None` means unbounded (all history). Weeks start on Monday, months
    /// on the 1st.
    pub fn start_from(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Today => Some(today),
            Period::Week => {
                let back = today.weekday().num_days_from_monday();
                Some(today - Duration::days(i64::from(back)))
            }
            Period::Month => Some(today.with_day(1).unwrap_or(today)),
            Period::All => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MostActiveDay {
    pub date: NaiveDate,
    pub count: u64,
}

/// Derived, read-only aggregate over the daily counters. Computed on demand
/// by the store; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total: u64,
    #[serde(default)]
    pub tracking_since: Option<NaiveDate>,
    pub days_tracked: u64,
    pub keys_per_day: u64,
    pub keys_per_hour: u64,
    #[serde(default)]
    pub most_active_day: Option<MostActiveDay>,
    pub current_streak: u32,
}
