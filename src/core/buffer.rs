use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-event notification for presentation layers (live tray feedback).
/// Fire-and-forget: the buffer never waits on it and a misbehaving
/// observer cannot corrupt the counts.
pub type KeyObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Thread-safe multiset of key counts accumulated between flushes.
///
/// The mutex guards map mutation only; persistence always happens on a
/// drained copy outside the lock, so recording never blocks on storage
/// I/O.
#[derive(Default)]
pub struct CountBuffer {
    counts: Mutex<HashMap<Arc<str>, u64>>,
    observer: RwLock<Option<KeyObserver>>,
}

impl CountBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_observer(&self, observer: KeyObserver) {
        *self.observer.write() = Some(observer);
    }

    pub fn clear_observer(&self) {
        *self.observer.write() = None;
    }

    /// Increments the count for `key` and notifies the observer. The
    /// observer runs after the lock is released to keep the event path
    /// short.
    pub fn record(&self, key: Arc<str>) {
        {
            let mut counts = self.counts.lock();
            let entry = counts.entry(Arc::clone(&key)).or_insert(0);
            *entry = entry.saturating_add(1);
        }

        let observer = self.observer.read().clone();
        if let Some(observer) = observer {
            observer(&key);
        }
    }

    /// Atomically takes the accumulated counts, leaving the buffer empty.
    /// Every `record` preceding a `drain` lands in exactly one drain
    /// result; none are lost or double-counted.
    pub fn drain(&self) -> HashMap<Arc<str>, u64> {
        std::mem::take(&mut *self.counts.lock())
    }

    /// Adds counts back into the buffer. Used to re-queue a drained batch
    /// whose persist failed, so the next flush retries it.
    pub fn merge(&self, counts: HashMap<Arc<str>, u64>) {
        if counts.is_empty() {
            return;
        }
        let mut guard = self.counts.lock();
        for (key, count) in counts {
            let entry = guard.entry(key).or_insert(0);
            *entry = entry.saturating_add(count);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;

    #[test]
    fn record_then_drain_returns_counts_and_empties() {
        let buffer = CountBuffer::new();
        buffer.record(Arc::from("a"));
        buffer.record(Arc::from("a"));
        buffer.record(Arc::from("b"));

        let drained = buffer.drain();
        assert_eq!(drained.get("a").copied(), Some(2));
        assert_eq!(drained.get("b").copied(), Some(1));
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn merge_restores_a_failed_batch() {
        let buffer = CountBuffer::new();
        buffer.record(Arc::from("a"));
        let drained = buffer.drain();

        buffer.record(Arc::from("a"));
        buffer.merge(drained);

        let drained = buffer.drain();
        assert_eq!(drained.get("a").copied(), Some(2));
    }

    #[test]
    fn observer_sees_every_accepted_key() {
        let buffer = CountBuffer::new();
        let seen = Arc::new(AtomicU64::new(0));
        let seen_in_observer = Arc::clone(&seen);
        buffer.set_observer(Arc::new(move |key| {
            assert_eq!(key, "a");
            seen_in_observer.fetch_add(1, Ordering::SeqCst);
        }));

        buffer.record(Arc::from("a"));
        buffer.record(Arc::from("a"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        buffer.clear_observer();
        buffer.record(Arc::from("a"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_records_and_drains_lose_nothing() {
        const WRITERS: usize = 4;
        const PER_WRITER: u64 = 5_000;

        let buffer = Arc::new(CountBuffer::new());
        let total_drained = Arc::new(AtomicU64::new(0));

        let drainer = {
            let buffer = Arc::clone(&buffer);
            let total_drained = Arc::clone(&total_drained);
            thread::spawn(move || {
                // Drain aggressively while writers are running to exercise
                // the record/drain interleaving.
                for _ in 0..200 {
                    let drained = buffer.drain();
                    let sum: u64 = drained.values().sum();
                    total_drained.fetch_add(sum, Ordering::SeqCst);
                    thread::yield_now();
                }
            })
        };

        let writers: Vec<_> = (0..WRITERS)
            .map(|_| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for _ in 0..PER_WRITER {
                        buffer.record(Arc::from("k"));
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().expect("writer thread");
        }
        drainer.join().expect("drainer thread");

        // A final drain picks up whatever the drainer missed.
        let rest: u64 = buffer.drain().values().sum();
        assert_eq!(
            total_drained.load(Ordering::SeqCst) + rest,
            WRITERS as u64 * PER_WRITER
        );
    }
}
