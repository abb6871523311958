use anyhow::{Context, Result};
use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core::date_key;
use crate::models::{MostActiveDay, Period, StatsSnapshot};

/// Hours of active typing assumed per tracked day when deriving the
/// keys-per-hour figure.
const ACTIVE_HOURS_PER_DAY: u64 = 8;

/// Durable store of daily per-key counters.
///
/// Owns its SQLite connection; the host application opens the store once
/// and shares it by reference with the flush and query paths. All writes
/// are additive upserts, so a row's count never decreases within a day.
pub struct CounterStore {
    conn: Mutex<Connection>,
}

impl CounterStore {
    /// Opens (creating if needed) the store at `path`, including parent
    /// directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store dir {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite db {}", path.display()))?;
        let _ = conn.busy_timeout(Duration::from_secs(2));
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("set journal_mode=WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .context("set synchronous=NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")
            .context("set temp_store=MEMORY")?;

        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store with the same schema. Used by tests and available
    /// to hosts that want a throwaway session.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Applies one drained buffer as a batch of additive deltas for
    /// `date_key`. The batch runs in a single transaction; re-applying the
    /// same batch adds again (flushes are additive, not idempotent).
    pub fn apply_deltas(&self, date_key: &str, deltas: &HashMap<Arc<str>, u64>) -> Result<()> {
        if deltas.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction().context("start sqlite transaction")?;
        {
            let mut stmt = tx
                .prepare(
                    r#"
INSERT INTO daily_counts(key, date_key, count)
VALUES (?1, ?2, ?3)
ON CONFLICT(key, date_key) DO UPDATE SET count = count + excluded.count
"#,
                )
                .context("prepare daily_counts upsert")?;
            for (key, count) in deltas {
                if *count == 0 {
                    continue;
                }
                stmt.execute(params![
                    key.as_ref(),
                    date_key,
                    i64::try_from(*count).unwrap_or(i64::MAX)
                ])
                .context("upsert daily_counts")?;
            }
        }
        tx.commit().context("commit daily_counts batch")
    }

    /// Per-key counts summed over `period`. Empty store or empty period
    /// yields an empty map.
    pub fn key_counts(&self, period: Period) -> Result<HashMap<String, u64>> {
        let start = period.start_from(date_key::today()).map(|d| d.to_string());
        let conn = self.conn.lock();

        let mut out = HashMap::new();
        let mut collect = |row: (String, i64)| {
            let (key, count) = row;
            out.insert(key, u64::try_from(count).unwrap_or(0));
        };

        match start {
            Some(start) => {
                let mut stmt = conn
                    .prepare(
                        "SELECT key, SUM(count) FROM daily_counts WHERE date_key >= ?1 GROUP BY key",
                    )
                    .context("prepare key counts query")?;
                let rows = stmt
                    .query_map(params![start], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })
                    .context("query key counts")?;
                for row in rows {
                    collect(row.context("read key counts row")?);
                }
            }
            None => {
                let mut stmt = conn
                    .prepare("SELECT key, SUM(count) FROM daily_counts GROUP BY key")
                    .context("prepare key counts query")?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })
                    .context("query key counts")?;
                for row in rows {
                    collect(row.context("read key counts row")?);
                }
            }
        }

        Ok(out)
    }

    /// Total keystrokes over `period`.
    pub fn total(&self, period: Period) -> Result<u64> {
        let start = period.start_from(date_key::today()).map(|d| d.to_string());
        let conn = self.conn.lock();

        let total: i64 = match start {
            Some(start) => conn
                .query_row(
                    "SELECT COALESCE(SUM(count), 0) FROM daily_counts WHERE date_key >= ?1",
                    params![start],
                    |row| row.get(0),
                )
                .context("query period total")?,
            None => conn
                .query_row(
                    "SELECT COALESCE(SUM(count), 0) FROM daily_counts",
                    [],
                    |row| row.get(0),
                )
                .context("query total")?,
        };
        Ok(u64::try_from(total).unwrap_or(0))
    }

    /// Today's total; the tray tooltip reads this.
    pub fn today_total(&self) -> Result<u64> {
        self.total(Period::Today)
    }

    pub fn earliest_date(&self) -> Result<Option<NaiveDate>> {
        let conn = self.conn.lock();
        let min: Option<String> = conn
            .query_row("SELECT MIN(date_key) FROM daily_counts", [], |row| {
                row.get(0)
            })
            .context("query earliest date")?;
        Ok(min.and_then(|s| s.parse().ok()))
    }

    pub fn tracked_day_count(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(DISTINCT date_key) FROM daily_counts",
                [],
                |row| row.get(0),
            )
            .context("query tracked day count")?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Day with the highest summed count. Ties resolve to the earliest
    /// date so the result is deterministic.
    pub fn most_active_day(&self) -> Result<Option<MostActiveDay>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                r#"
SELECT date_key, SUM(count) AS day_total
FROM daily_counts
GROUP BY date_key
ORDER BY day_total DESC, date_key ASC
LIMIT 1
"#,
                [],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            );
        match row {
            Ok((date, count)) => Ok(date.parse().ok().map(|date| MostActiveDay {
                date,
                count: u64::try_from(count).unwrap_or(0),
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e).context("query most active day"),
        }
    }

    /// Consecutive tracked days ending today. Zero when today has no row,
    /// regardless of earlier days.
    pub fn current_streak(&self) -> Result<u32> {
        let dates = self.tracked_dates()?;
        let mut streak = 0u32;
        let mut day = date_key::today();
        while dates.contains(&day) {
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        Ok(streak)
    }

    /// Composes the derived statistics the report generator consumes.
    pub fn snapshot(&self) -> Result<StatsSnapshot> {
        let total = self.total(Period::All)?;
        let tracking_since = self.earliest_date()?;
        let days_tracked = self.tracked_day_count()?;
        let keys_per_day = if days_tracked == 0 {
            0
        } else {
            (total + days_tracked / 2) / days_tracked
        };
        let keys_per_hour = (keys_per_day + ACTIVE_HOURS_PER_DAY / 2) / ACTIVE_HOURS_PER_DAY;

        Ok(StatsSnapshot {
            total,
            tracking_since,
            days_tracked,
            keys_per_day,
            keys_per_hour,
            most_active_day: self.most_active_day()?,
            current_streak: self.current_streak()?,
        })
    }

    fn tracked_dates(&self) -> Result<HashSet<NaiveDate>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT DISTINCT date_key FROM daily_counts")
            .context("prepare tracked dates query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("query tracked dates")?;

        let mut out = HashSet::new();
        for row in rows {
            let key = row.context("read tracked date row")?;
            if let Ok(date) = key.parse() {
                out.insert(date);
            }
        }
        Ok(out)
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS daily_counts (
  key TEXT NOT NULL,
  date_key TEXT NOT NULL,
  count INTEGER NOT NULL,
  PRIMARY KEY(key, date_key)
);
CREATE INDEX IF NOT EXISTS idx_daily_counts_date ON daily_counts(date_key);
"#,
    )
    .context("migrate sqlite schema")
}
