//! Shared pipeline state flags and stage timestamps.
//!
//! Each downstream worker decides staleness from these timestamps
//! independently through its own [`super::PublicationGate`]; there is no
//! coordination between workers beyond what the timestamps encode.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::core::INVALID_TIMESTAMP;

/// Flags and timestamps shared by every worker thread.
pub struct PipelineState {
    /// Timestamp of the newest scan the odometry stage registered.
    latest_scan_to_scan_us: AtomicU64,
    /// Timestamp of the newest scan the mapping stage refined.
    latest_scan_to_map_us: AtomicU64,
    /// Cooperative shutdown token, checked by every worker each iteration.
    shutdown_requested: AtomicBool,
}

impl PipelineState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            latest_scan_to_scan_us: AtomicU64::new(INVALID_TIMESTAMP),
            latest_scan_to_map_us: AtomicU64::new(INVALID_TIMESTAMP),
            shutdown_requested: AtomicBool::new(false),
        })
    }

    pub fn latest_scan_to_scan(&self) -> u64 {
        self.latest_scan_to_scan_us.load(Ordering::SeqCst)
    }

    pub fn set_latest_scan_to_scan(&self, timestamp_us: u64) {
        self.latest_scan_to_scan_us
            .store(timestamp_us, Ordering::SeqCst);
    }

    pub fn latest_scan_to_map(&self) -> u64 {
        self.latest_scan_to_map_us.load(Ordering::SeqCst)
    }

    pub fn set_latest_scan_to_map(&self, timestamp_us: u64) {
        self.latest_scan_to_map_us
            .store(timestamp_us, Ordering::SeqCst);
    }

    /// Ask all workers to exit their loops.
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }
}

/// Handle type for shared pipeline state.
pub type PipelineStateHandle = Arc<PipelineState>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::is_timestamp_valid;

    #[test]
    fn test_timestamps_start_invalid() {
        let state = PipelineState::new();
        assert!(!is_timestamp_valid(state.latest_scan_to_scan()));
        assert!(!is_timestamp_valid(state.latest_scan_to_map()));
    }

    #[test]
    fn test_shutdown_token() {
        let state = PipelineState::new();
        assert!(!state.is_shutdown_requested());
        state.request_shutdown();
        assert!(state.is_shutdown_requested());
    }
}
