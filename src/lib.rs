//! Keystroke-frequency tracker core.
//!
//! Captures global key-release events, resolves them to canonical key
//! names, aggregates per-key counts in a mutex-guarded buffer, and
//! periodically flushes the buffer into a SQLite store of daily
//! counters. Presentation layers (tray icon, heat-map report) consume
//! the per-event observer callback and the store's query surface.

pub mod core;
pub mod models;

pub use crate::core::buffer::{CountBuffer, KeyObserver};
pub use crate::core::flusher::{flush_once, FlushScheduler};
pub use crate::core::key_names::{raw_key_from_rdev, resolve};
pub use crate::core::listener::KeyTracker;
pub use crate::core::paths::default_db_path;
pub use crate::core::store::CounterStore;
pub use crate::models::{MostActiveDay, Period, RawKey, StatsSnapshot, TrackerConfig};
