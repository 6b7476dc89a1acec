//! Mapping worker: scan-to-map refinement, mesh triggering, save services.
//!
//! One write lock per insert cycle is the whole concurrency story for the
//! map: readers (visualization, broadcast) only ever see the map between
//! full insert cycles. Save commands are handled here because this worker
//! already owns the map access pattern; the service side blocks on the
//! response channel, never on the map lock.

use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::PointCloud;
use crate::engine::ScanMapper;
use crate::io::{save_point_cloud_ply, save_submaps};
use crate::state::{
    CommandReceiver, CommandResponse, CommandResult, MapCommand, PipelineBuffer,
    PipelineStateHandle,
};

/// Mapping worker handle.
pub struct MappingThread {
    handle: JoinHandle<()>,
}

impl MappingThread {
    /// Spawn the mapping worker.
    pub fn spawn(
        state: PipelineStateHandle,
        mapper: Arc<RwLock<dyn ScanMapper>>,
        input: Arc<PipelineBuffer<PointCloud>>,
        mesh_triggers: Arc<PipelineBuffer<()>>,
        command_rx: CommandReceiver,
        poll_interval: Duration,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("mapping".into())
            .spawn(move || {
                run_mapping_loop(
                    state,
                    mapper,
                    input,
                    mesh_triggers,
                    command_rx,
                    poll_interval,
                );
            })
            .expect("Failed to spawn mapping thread");

        Self { handle }
    }

    /// Wait for the worker to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn run_mapping_loop(
    state: PipelineStateHandle,
    mapper: Arc<RwLock<dyn ScanMapper>>,
    input: Arc<PipelineBuffer<PointCloud>>,
    mesh_triggers: Arc<PipelineBuffer<()>>,
    command_rx: CommandReceiver,
    poll_interval: Duration,
) {
    log::info!("Mapping worker starting");

    while !state.is_shutdown_requested() {
        // Service commands first so save calls are answered even when the
        // scan stream is idle
        while let Ok(cmd) = command_rx.try_recv() {
            let result = process_command(&cmd.command, &mapper);
            cmd.response_tx.send(result).ok();
        }

        let Some(entry) = input.try_pop() else {
            thread::sleep(poll_interval);
            continue;
        };

        let inserted = match mapper.write() {
            Ok(mut mapper) => mapper.insert_scan(&entry.data, entry.timestamp_us),
            Err(_) => {
                log::warn!("Mapper lock poisoned, retrying next poll");
                thread::sleep(poll_interval);
                continue;
            }
        };

        if inserted {
            state.set_latest_scan_to_map(entry.timestamp_us);
            mesh_triggers.push(entry.timestamp_us, ());
        } else {
            log::debug!("Mapper rejected scan at {} us", entry.timestamp_us);
        }
    }

    log::info!("Mapping worker shutting down");
}

/// Execute a save command against the current map.
fn process_command(command: &MapCommand, mapper: &Arc<RwLock<dyn ScanMapper>>) -> CommandResult {
    let Ok(mapper) = mapper.read() else {
        return Err("Map lock poisoned".to_string());
    };

    match command {
        MapCommand::SaveMap { dir } => {
            let cloud = mapper.assembled_map_cloud();
            let path = dir.join("map.ply");
            match save_point_cloud_ply(&cloud, &path) {
                Ok(()) => {
                    log::info!("Saved assembled map ({} points) to {:?}", cloud.len(), path);
                    Ok(CommandResponse::MapSaved {
                        path: path.display().to_string(),
                    })
                }
                Err(e) => Err(format!("Error while saving map: {}", e)),
            }
        }

        MapCommand::SaveSubmaps { dir } => {
            let submaps = mapper.submaps();
            match save_submaps(&submaps, dir) {
                Ok(count) => {
                    log::info!("Saved {} submaps to {:?}", count, dir);
                    Ok(CommandResponse::SubmapsSaved {
                        count,
                        dir: dir.display().to_string(),
                    })
                }
                Err(e) => Err(format!("Error while saving submaps: {}", e)),
            }
        }
    }
}
