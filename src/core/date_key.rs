use chrono::{Local, NaiveDate};

/// Daily counters are keyed by the local calendar date as `YYYY-MM-DD`.
/// ISO date strings compare lexicographically in date order, which the
/// store's range queries rely on.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn today_key() -> String {
    today().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format_is_iso_and_orders_lexicographically() {
        let key = today_key();
        assert_eq!(key.len(), 10);
        assert!(key.parse::<NaiveDate>().is_ok());

        // The range queries assume string order == date order.
        assert!("2024-01-31" < "2024-02-01");
        assert!("2024-12-31" < "2025-01-01");
    }
}
