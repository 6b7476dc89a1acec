//! Mesher worker: turns map-update triggers into background mesh builds.
//!
//! Newest-wins consumption: a mesh of a stale map state is worthless, so
//! the trigger backlog is discarded every cycle. The at-most-one-build
//! contract lives in [`MeshBuilder`]; this worker only decides when to ask.

use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nalgebra::{Isometry3, Vector3};

use crate::engine::ScanMapper;
use crate::mapping::voxel_downsample;
use crate::mesh::MeshBuilder;
use crate::state::{PipelineBuffer, PipelineStateHandle};

/// Mesher worker handle.
pub struct MesherThread {
    handle: JoinHandle<()>,
}

impl MesherThread {
    /// Spawn the mesher worker.
    pub fn spawn(
        state: PipelineStateHandle,
        mapper: Arc<RwLock<dyn ScanMapper>>,
        mesh_builder: Arc<MeshBuilder>,
        triggers: Arc<PipelineBuffer<()>>,
        input_voxel_size: Vector3<f64>,
        poll_interval: Duration,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("mesher".into())
            .spawn(move || {
                run_mesher_loop(
                    state,
                    mapper,
                    mesh_builder,
                    triggers,
                    input_voxel_size,
                    poll_interval,
                );
            })
            .expect("Failed to spawn mesher thread");

        Self { handle }
    }

    /// Wait for the worker to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn run_mesher_loop(
    state: PipelineStateHandle,
    mapper: Arc<RwLock<dyn ScanMapper>>,
    mesh_builder: Arc<MeshBuilder>,
    triggers: Arc<PipelineBuffer<()>>,
    input_voxel_size: Vector3<f64>,
    poll_interval: Duration,
) {
    log::info!("Mesher worker starting");

    while !state.is_shutdown_requested() {
        if let Some(trigger) = triggers.pop_newest() {
            if mesh_builder.is_build_in_progress() {
                log::debug!(
                    "Dropping mesh trigger at {} us, build in progress",
                    trigger.timestamp_us
                );
            } else {
                trigger_build(&mapper, &mesh_builder, &input_voxel_size, trigger.timestamp_us);
            }
        }
        thread::sleep(poll_interval);
    }

    log::info!("Mesher worker shutting down");
}

fn trigger_build(
    mapper: &Arc<RwLock<dyn ScanMapper>>,
    mesh_builder: &Arc<MeshBuilder>,
    input_voxel_size: &Vector3<f64>,
    timestamp_us: u64,
) {
    let (dense, pose) = {
        let Ok(mapper) = mapper.read() else {
            log::warn!("Mapper lock poisoned, skipping mesh trigger");
            return;
        };
        let pose = mapper.map_to_range_sensor(timestamp_us).unwrap_or_else(|| {
            log::warn!(
                "No map pose for mesh trigger at {} us, substituting identity",
                timestamp_us
            );
            Isometry3::identity()
        });
        (mapper.active_submap_dense_map(), pose)
    };

    let cloud = dense.to_point_cloud();
    if cloud.is_empty() {
        log::debug!("Dense map empty, skipping mesh build");
        return;
    }

    mesh_builder.set_pose(pose);
    mesh_builder.request_build(voxel_downsample(&cloud, input_voxel_size), timestamp_us);
}
