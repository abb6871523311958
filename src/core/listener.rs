use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, warn};

use crate::core::buffer::{CountBuffer, KeyObserver};
use crate::core::flusher::{flush_once, FlushScheduler};
use crate::core::key_names;
use crate::core::store::CounterStore;
use crate::models::{RawKey, TrackerConfig};

/// Lifecycle controller gating the event stream into the buffer.
///
/// States: Stopped -> Running -> Paused -> Running -> Stopped. Start and
/// stop are idempotent. Pausing flushes immediately and then discards
/// events without re-registering the OS hook; `rdev::listen` cannot be
/// unregistered, so after `stop` the hook thread keeps running with
/// events gated off, and a later `start` reuses it.
pub struct KeyTracker {
    buffer: Arc<CountBuffer>,
    store: Arc<CounterStore>,
    flush_interval: Duration,
    scheduler: Mutex<Option<FlushScheduler>>,
    running: AtomicBool,
    paused: AtomicBool,
    hook_started: AtomicBool,
}

impl KeyTracker {
    pub fn new(store: Arc<CounterStore>, config: &TrackerConfig) -> Arc<Self> {
        Arc::new(Self {
            buffer: Arc::new(CountBuffer::new()),
            store,
            flush_interval: config.flush_interval(),
            scheduler: Mutex::new(None),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            hook_started: AtomicBool::new(false),
        })
    }

    /// Registers the per-event notification consumed by presentation
    /// layers. Fired once per accepted event, after buffering.
    pub fn set_observer(&self, observer: KeyObserver) {
        self.buffer.set_observer(observer);
    }

    pub fn clear_observer(&self) {
        self.buffer.clear_observer();
    }

    /// Feeds one raw key event through resolution into the buffer.
    /// Discarded while stopped or paused. The platform hook calls this;
    /// alternative capture backends can too.
    pub fn ingest(&self, raw: RawKey) {
        if !self.running.load(Ordering::SeqCst) || self.paused.load(Ordering::SeqCst) {
            return;
        }
        self.buffer.record(key_names::resolve(&raw));
    }

    /// Starts capture and the periodic flush. No-op when already running.
    pub fn start(self: &Arc<Self>) {
        if !self.begin() {
            return;
        }
        self.spawn_hook();
    }

    fn begin(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.paused.store(false, Ordering::SeqCst);

        let mut scheduler = self.scheduler.lock();
        if scheduler.is_none() {
            *scheduler = Some(FlushScheduler::start(
                Arc::clone(&self.buffer),
                Arc::clone(&self.store),
                self.flush_interval,
            ));
        }
        true
    }

    fn spawn_hook(self: &Arc<Self>) {
        if self.hook_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let tracker = Arc::clone(self);
        thread::spawn(move || {
            let callback = {
                let tracker = Arc::clone(&tracker);
                move |event: rdev::Event| {
                    if let rdev::EventType::KeyRelease(key) = event.event_type {
                        tracker
                            .ingest(key_names::raw_key_from_rdev(key, event.name.as_deref()));
                    }
                }
            };
            if let Err(e) = rdev::listen(callback) {
                error!("global key hook failed: {:?}", e);
                tracker.hook_started.store(false, Ordering::SeqCst);
            }
        });
    }

    /// Flushes pending counts, then discards events until `resume`.
    pub fn pause(&self) {
        if self.paused.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = flush_once(&self.buffer, &self.store) {
            warn!("flush on pause failed, batch re-queued: {:#}", e);
        }
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Flips between Paused and Running; returns the resulting paused
    /// flag.
    pub fn toggle(&self) -> bool {
        if self.is_paused() {
            self.resume();
            false
        } else {
            self.pause();
            true
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ordered shutdown: stop accepting events, cancel the flush timer
    /// synchronously, then persist whatever is still buffered. No-op when
    /// already stopped.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(mut scheduler) = self.scheduler.lock().take() {
            scheduler.shutdown();
        }
        if let Err(e) = flush_once(&self.buffer, &self.store) {
            warn!("final flush failed: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Period;

    fn tracker_with_memory_store() -> Arc<KeyTracker> {
        let store = Arc::new(CounterStore::open_in_memory().expect("open"));
        KeyTracker::new(store, &TrackerConfig::default())
    }

    fn char_key(ch: char) -> RawKey {
        RawKey::Character { ch, vk: None }
    }

    #[test]
    fn events_while_paused_are_dropped() {
        let tracker = tracker_with_memory_store();
        assert!(tracker.begin());

        tracker.ingest(char_key('a'));
        tracker.ingest(char_key('b'));
        tracker.pause();
        tracker.ingest(char_key('c'));
        tracker.resume();
        tracker.ingest(char_key('a'));
        tracker.stop();

        let counts = tracker.store.key_counts(Period::All).expect("query");
        assert_eq!(counts.get("a").copied(), Some(2));
        assert_eq!(counts.get("b").copied(), Some(1));
        assert_eq!(counts.get("c"), None);
    }

    #[test]
    fn events_outside_the_running_state_are_dropped() {
        let tracker = tracker_with_memory_store();
        tracker.ingest(char_key('a'));

        assert!(tracker.begin());
        tracker.ingest(char_key('a'));
        tracker.stop();

        tracker.ingest(char_key('a'));
        assert_eq!(tracker.store.total(Period::All).expect("total"), 1);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let tracker = tracker_with_memory_store();
        assert!(tracker.begin());
        assert!(!tracker.begin());

        tracker.stop();
        tracker.stop();
        assert!(!tracker.is_running());

        assert!(tracker.begin());
        assert!(tracker.is_running());
        tracker.stop();
    }

    #[test]
    fn toggle_flips_pause_state_and_reports_it() {
        let tracker = tracker_with_memory_store();
        assert!(tracker.begin());

        assert!(tracker.toggle());
        assert!(tracker.is_paused());
        assert!(!tracker.toggle());
        assert!(!tracker.is_paused());

        tracker.stop();
    }

    #[test]
    fn pause_flushes_pending_counts_immediately() {
        let tracker = tracker_with_memory_store();
        assert!(tracker.begin());

        tracker.ingest(char_key('z'));
        assert_eq!(tracker.store.total(Period::All).expect("total"), 0);
        tracker.pause();
        assert_eq!(tracker.store.total(Period::All).expect("total"), 1);

        tracker.stop();
    }

    #[test]
    fn stop_persists_the_remaining_buffer() {
        let tracker = tracker_with_memory_store();
        assert!(tracker.begin());

        tracker.ingest(char_key('q'));
        tracker.ingest(char_key('q'));
        tracker.stop();

        let counts = tracker.store.key_counts(Period::All).expect("query");
        assert_eq!(counts.get("q").copied(), Some(2));
    }
}
