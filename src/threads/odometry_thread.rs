//! Odometry worker: drains raw scans and drives scan-to-scan registration.
//!
//! FIFO draining: losing raw scans is worse than lagging slightly, the
//! ring buffer already bounds how far behind this stage can fall.

use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::PointCloud;
use crate::engine::ScanOdometry;
use crate::state::{PipelineBuffer, PipelineStateHandle};

/// Odometry worker handle.
pub struct OdometryThread {
    handle: JoinHandle<()>,
}

impl OdometryThread {
    /// Spawn the odometry worker.
    pub fn spawn(
        state: PipelineStateHandle,
        odometry: Arc<RwLock<dyn ScanOdometry>>,
        input: Arc<PipelineBuffer<PointCloud>>,
        output: Arc<PipelineBuffer<PointCloud>>,
        poll_interval: Duration,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("odometry".into())
            .spawn(move || {
                run_odometry_loop(state, odometry, input, output, poll_interval);
            })
            .expect("Failed to spawn odometry thread");

        Self { handle }
    }

    /// Wait for the worker to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn run_odometry_loop(
    state: PipelineStateHandle,
    odometry: Arc<RwLock<dyn ScanOdometry>>,
    input: Arc<PipelineBuffer<PointCloud>>,
    output: Arc<PipelineBuffer<PointCloud>>,
    poll_interval: Duration,
) {
    log::info!("Odometry worker starting");

    while !state.is_shutdown_requested() {
        let Some(entry) = input.try_pop() else {
            thread::sleep(poll_interval);
            continue;
        };

        let registered = match odometry.write() {
            Ok(mut odometry) => odometry.add_range_scan(&entry.data, entry.timestamp_us),
            Err(_) => {
                log::warn!("Odometry lock poisoned, retrying next poll");
                thread::sleep(poll_interval);
                continue;
            }
        };

        if registered {
            state.set_latest_scan_to_scan(entry.timestamp_us);
            output.push(entry.timestamp_us, entry.data);
        } else {
            log::debug!("Odometry rejected scan at {} us", entry.timestamp_us);
        }
    }

    log::info!("Odometry worker shutting down");
}
