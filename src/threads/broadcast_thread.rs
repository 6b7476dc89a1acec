//! Transform broadcast worker.
//!
//! Publishes the odometry and map poses for the newest registered scan,
//! de-duplicated by timestamp so an idle sensor does not re-broadcast the
//! same transform every poll.

use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nalgebra::Isometry3;

use crate::config::FrameIds;
use crate::core::is_timestamp_valid;
use crate::engine::{ScanMapper, ScanOdometry};
use crate::io::TransformSink;
use crate::state::{PipelineStateHandle, PublicationGate};

/// Transform broadcast worker handle.
pub struct BroadcastThread {
    handle: JoinHandle<()>,
}

impl BroadcastThread {
    /// Spawn the broadcast worker.
    pub fn spawn(
        state: PipelineStateHandle,
        odometry: Arc<RwLock<dyn ScanOdometry>>,
        mapper: Arc<RwLock<dyn ScanMapper>>,
        sink: Arc<dyn TransformSink>,
        frames: FrameIds,
        poll_interval: Duration,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("tf-broadcast".into())
            .spawn(move || {
                run_broadcast_loop(state, odometry, mapper, sink, frames, poll_interval);
            })
            .expect("Failed to spawn broadcast thread");

        Self { handle }
    }

    /// Wait for the worker to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn run_broadcast_loop(
    state: PipelineStateHandle,
    odometry: Arc<RwLock<dyn ScanOdometry>>,
    mapper: Arc<RwLock<dyn ScanMapper>>,
    sink: Arc<dyn TransformSink>,
    frames: FrameIds,
    poll_interval: Duration,
) {
    log::info!("Transform broadcast worker starting");

    let mut scan_gate = PublicationGate::dedup_only();
    let mut map_gate = PublicationGate::dedup_only();

    while !state.is_shutdown_requested() {
        let scan_ts = state.latest_scan_to_scan();
        if is_timestamp_valid(scan_ts) && scan_gate.should_publish(scan_ts) {
            if let Ok(odometry) = odometry.read() {
                if odometry.has_processed_measurements() {
                    let t = odometry
                        .odom_to_range_sensor(scan_ts)
                        .unwrap_or_else(|| identity_fallback("odom->range_sensor", scan_ts));
                    sink.publish(&t, scan_ts, &frames.odom, &frames.range_sensor);
                    scan_gate.mark_published(scan_ts);
                }
            }
        }

        let map_ts = state.latest_scan_to_map();
        if is_timestamp_valid(map_ts) && map_gate.should_publish(map_ts) {
            if let Ok(mapper) = mapper.read() {
                if mapper.has_processed_measurements() {
                    let map_to_odom = mapper
                        .map_to_odom(map_ts)
                        .unwrap_or_else(|| identity_fallback("map->odom", map_ts));
                    let map_to_sensor = mapper
                        .map_to_range_sensor(map_ts)
                        .unwrap_or_else(|| identity_fallback("map->range_sensor", map_ts));
                    sink.publish(&map_to_odom, map_ts, &frames.map, &frames.odom);
                    sink.publish(&map_to_sensor, map_ts, &frames.map, &frames.range_sensor);
                    map_gate.mark_published(map_ts);
                }
            }
        }

        thread::sleep(poll_interval);
    }

    log::info!("Transform broadcast worker shutting down");
}

fn identity_fallback(which: &str, timestamp_us: u64) -> Isometry3<f64> {
    log::warn!(
        "Transform lookup {} failed at {} us, substituting identity",
        which,
        timestamp_us
    );
    Isometry3::identity()
}
