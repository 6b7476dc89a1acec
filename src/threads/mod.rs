//! Worker threads and the pipeline orchestrator.
//!
//! One named thread per stage, wired together exclusively through bounded
//! [`PipelineBuffer`]s. The orchestrator owns every handle and joins all
//! workers explicitly on [`MappingPipeline::shutdown`]; nothing is joined
//! implicitly from a destructor.

mod broadcast_thread;
mod mapping_thread;
mod mesher_thread;
mod odometry_thread;
mod visualization_thread;

pub use broadcast_thread::BroadcastThread;
pub use mapping_thread::MappingThread;
pub use mesher_thread::MesherThread;
pub use odometry_thread::OdometryThread;
pub use visualization_thread::{VisualizationSinks, VisualizationThread};

use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::config::PipelineConfig;
use crate::core::{PointCloud, is_timestamp_valid};
use crate::engine::{ScanMapper, ScanOdometry};
use crate::error::{Error, Result};
use crate::io::TransformSink;
use crate::mesh::{MeshBuilder, MeshSnapshot, SurfaceReconstructor};
use crate::state::{
    CommandResponse, CommandSender, MapCommand, PipelineBuffer, PipelineState,
    PipelineStateHandle, create_command_channel, send_command_sync,
};

/// All transport sinks the pipeline publishes into.
pub struct PipelineSinks {
    /// Frame-tree broadcasting.
    pub transforms: Arc<dyn TransformSink>,
    /// Cloud and mesh visualization targets.
    pub visualization: VisualizationSinks,
}

/// The running pipeline: one worker per stage plus the shared wiring.
///
/// Construction spawns every worker; [`Self::shutdown`] is the only way
/// the threads stop, and it joins each one before returning.
pub struct MappingPipeline {
    config: PipelineConfig,
    state: PipelineStateHandle,
    ingestion_buffer: Arc<PipelineBuffer<PointCloud>>,
    command_tx: CommandSender,
    mesh_builder: Arc<MeshBuilder>,
    workers: Workers,
}

struct Workers {
    odometry: OdometryThread,
    mapping: MappingThread,
    mesher: MesherThread,
    broadcast: BroadcastThread,
    visualization: VisualizationThread,
}

impl MappingPipeline {
    /// Wire the buffers and spawn all five workers.
    pub fn start(
        config: PipelineConfig,
        odometry: Arc<RwLock<dyn ScanOdometry>>,
        mapper: Arc<RwLock<dyn ScanMapper>>,
        reconstructor: Arc<dyn SurfaceReconstructor>,
        sinks: PipelineSinks,
    ) -> Self {
        log::info!(
            "Starting mapping pipeline ({}Hz polling, voxel size {:?})",
            config.poll_rate_hz,
            config.voxel_size
        );

        let state = PipelineState::new();
        let poll = config.poll_interval();

        let ingestion_buffer = Arc::new(PipelineBuffer::new(config.buffers.odometry_capacity));
        let mapping_buffer = Arc::new(PipelineBuffer::new(config.buffers.mapping_capacity));
        let mesh_triggers = Arc::new(PipelineBuffer::new(config.buffers.mesher_capacity));

        let (command_tx, command_rx) = create_command_channel();
        let mesh_builder = Arc::new(MeshBuilder::new(reconstructor));

        let workers = Workers {
            odometry: OdometryThread::spawn(
                state.clone(),
                odometry.clone(),
                ingestion_buffer.clone(),
                mapping_buffer.clone(),
                poll,
            ),
            mapping: MappingThread::spawn(
                state.clone(),
                mapper.clone(),
                mapping_buffer,
                mesh_triggers.clone(),
                command_rx,
                poll,
            ),
            mesher: MesherThread::spawn(
                state.clone(),
                mapper.clone(),
                mesh_builder.clone(),
                mesh_triggers,
                config.voxel_size_vec(),
                poll,
            ),
            broadcast: BroadcastThread::spawn(
                state.clone(),
                odometry.clone(),
                mapper.clone(),
                sinks.transforms,
                config.frame_ids.clone(),
                poll,
            ),
            visualization: VisualizationThread::spawn(
                state.clone(),
                odometry,
                mapper,
                mesh_builder.clone(),
                sinks.visualization,
                config.visualization.clone(),
                config.frame_ids.clone(),
                poll,
            ),
        };

        Self {
            config,
            state,
            ingestion_buffer,
            command_tx,
            mesh_builder,
            workers,
        }
    }

    /// Feed a sensor cloud into the pipeline.
    ///
    /// Never blocks; at capacity the oldest unprocessed scan is dropped.
    pub fn add_range_scan(&self, cloud: PointCloud, timestamp_us: u64) {
        if !is_timestamp_valid(timestamp_us) {
            log::warn!("Dropping range scan with invalid timestamp");
            return;
        }
        self.ingestion_buffer.push(timestamp_us, cloud);
    }

    /// Save the assembled map under `dir`; returns a status message.
    pub fn save_map(&self, dir: &Path) -> Result<String> {
        let response = send_command_sync(
            &self.command_tx,
            MapCommand::SaveMap {
                dir: dir.to_path_buf(),
            },
            self.config.command_timeout_ms,
        )
        .map_err(Error::Command)?;
        match response {
            CommandResponse::MapSaved { path } => Ok(format!("Map saved to: {}", path)),
            other => Err(Error::Command(format!("Unexpected response: {:?}", other))),
        }
    }

    /// Save every submap under `dir`; returns a status message.
    pub fn save_submaps(&self, dir: &Path) -> Result<String> {
        let response = send_command_sync(
            &self.command_tx,
            MapCommand::SaveSubmaps {
                dir: dir.to_path_buf(),
            },
            self.config.command_timeout_ms,
        )
        .map_err(Error::Command)?;
        match response {
            CommandResponse::SubmapsSaved { count, dir } => {
                Ok(format!("{} submaps saved to: {}", count, dir))
            }
            other => Err(Error::Command(format!("Unexpected response: {:?}", other))),
        }
    }

    /// Shared stage timestamps and shutdown token.
    pub fn state(&self) -> &PipelineStateHandle {
        &self.state
    }

    /// Latest completed mesh snapshot.
    pub fn mesh_snapshot(&self) -> Arc<MeshSnapshot> {
        self.mesh_builder.snapshot()
    }

    /// Stop all workers and wait for them.
    ///
    /// Also waits for an in-flight mesh build; a build that never returns
    /// is owned by the external reconstruction step, not timed out here.
    pub fn shutdown(self) {
        log::info!("Pipeline shutdown requested, waiting for workers...");
        self.state.request_shutdown();

        if let Err(e) = self.workers.odometry.join() {
            log::error!("Odometry worker panicked: {:?}", e);
        }
        if let Err(e) = self.workers.mapping.join() {
            log::error!("Mapping worker panicked: {:?}", e);
        }
        if let Err(e) = self.workers.mesher.join() {
            log::error!("Mesher worker panicked: {:?}", e);
        }
        if let Err(e) = self.workers.broadcast.join() {
            log::error!("Broadcast worker panicked: {:?}", e);
        }
        if let Err(e) = self.workers.visualization.join() {
            log::error!("Visualization worker panicked: {:?}", e);
        }
        self.mesh_builder.join();

        log::info!("All pipeline workers stopped");
    }
}
