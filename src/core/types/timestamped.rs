//! Generic timestamp wrapper.

use serde::{Deserialize, Serialize};

/// Sentinel for "no measurement yet".
///
/// Workers must not publish for this timestamp; see [`is_timestamp_valid`].
pub const INVALID_TIMESTAMP: u64 = 0;

/// Whether a timestamp refers to an actual measurement.
#[inline]
pub fn is_timestamp_valid(timestamp_us: u64) -> bool {
    timestamp_us != INVALID_TIMESTAMP
}

/// Generic timestamp wrapper for any data type.
///
/// Timestamps are in microseconds since epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestamped<T> {
    /// The wrapped data
    pub data: T,
    /// Timestamp in microseconds since epoch
    pub timestamp_us: u64,
}

impl<T> Timestamped<T> {
    /// Create a new timestamped value.
    #[inline]
    pub fn new(data: T, timestamp_us: u64) -> Self {
        Self { data, timestamp_us }
    }

    /// Map the inner data while preserving timestamp.
    #[inline]
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Timestamped<U> {
        Timestamped {
            data: f(self.data),
            timestamp_us: self.timestamp_us,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_map() {
        let ts = Timestamped::new(7i32, 42);
        let tripled = ts.map(|x| x * 3);

        assert_eq!(tripled.data, 21);
        assert_eq!(tripled.timestamp_us, 42);
    }

    #[test]
    fn test_timestamp_validity() {
        assert!(!is_timestamp_valid(INVALID_TIMESTAMP));
        assert!(is_timestamp_valid(1));
    }
}
