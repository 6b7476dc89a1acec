//! Bounded timestamped hand-off buffer between pipeline stages.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::core::Timestamped;

/// Bounded, thread-safe, timestamp-tagged ring buffer.
///
/// The sole hand-off mechanism between adjacent pipeline stages. `push`
/// never blocks the producer: at capacity the oldest entry is silently
/// dropped, so a slow consumer degrades to losing old data instead of
/// stalling the sensor path or growing without bound. Consumers observe
/// entries in insertion order (timestamp-monotonic by producer contract)
/// and choose between FIFO draining ([`Self::try_pop`]) and newest-wins
/// access ([`Self::pop_newest`]).
#[derive(Debug)]
pub struct PipelineBuffer<T> {
    entries: Mutex<VecDeque<Timestamped<T>>>,
    capacity: usize,
}

impl<T> PipelineBuffer<T> {
    /// Create a buffer holding at most `capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "buffer capacity must be non-zero");
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one at capacity.
    pub fn push(&self, timestamp_us: u64, payload: T) {
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(Timestamped::new(payload, timestamp_us));
    }

    /// Remove and return the oldest entry (FIFO draining).
    pub fn try_pop(&self) -> Option<Timestamped<T>> {
        self.entries.lock().ok()?.pop_front()
    }

    /// Remove everything and return only the newest entry.
    ///
    /// For status-only stages (e.g. mesh triggers) where stale entries are
    /// worthless.
    pub fn pop_newest(&self) -> Option<Timestamped<T>> {
        self.entries.lock().ok()?.drain(..).last()
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let buffer = PipelineBuffer::new(4);
        buffer.push(1, "a");
        buffer.push(2, "b");
        buffer.push(3, "c");

        assert_eq!(buffer.try_pop().unwrap().data, "a");
        assert_eq!(buffer.try_pop().unwrap().data, "b");
        assert_eq!(buffer.try_pop().unwrap().data, "c");
        assert!(buffer.try_pop().is_none());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let buffer = PipelineBuffer::new(3);
        for ts in 1..=7u64 {
            buffer.push(ts, ts);
        }

        // capacity + k pushes leave exactly the capacity most recent
        // entries, oldest first
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.try_pop().unwrap().timestamp_us, 5);
        assert_eq!(buffer.try_pop().unwrap().timestamp_us, 6);
        assert_eq!(buffer.try_pop().unwrap().timestamp_us, 7);
    }

    #[test]
    fn test_pop_newest_discards_backlog() {
        let buffer = PipelineBuffer::new(8);
        buffer.push(1, "stale");
        buffer.push(2, "stale");
        buffer.push(3, "fresh");

        let newest = buffer.pop_newest().unwrap();
        assert_eq!(newest.timestamp_us, 3);
        assert_eq!(newest.data, "fresh");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;

        let buffer = Arc::new(PipelineBuffer::new(64));
        let producer = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for ts in 1..=50u64 {
                    buffer.push(ts, ts);
                }
            })
        };
        producer.join().unwrap();

        let mut last = 0;
        while let Some(entry) = buffer.try_pop() {
            assert!(entry.timestamp_us > last);
            last = entry.timestamp_us;
        }
        assert_eq!(last, 50);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_zero_capacity_panics() {
        let _: PipelineBuffer<()> = PipelineBuffer::new(0);
    }
}
