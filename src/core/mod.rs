pub mod buffer;
pub mod date_key;
pub mod flusher;
pub mod key_names;
pub mod listener;
pub mod paths;
pub mod store;

pub use buffer::{CountBuffer, KeyObserver};
pub use flusher::{flush_once, FlushScheduler};
pub use listener::KeyTracker;
pub use store::CounterStore;
