//! Visualization worker.
//!
//! Assembles and publishes the expensive debug outputs: the odometry input
//! cloud, the thinned assembled map, the mapping input scan, the colored
//! submap cloud, the dense map, and the latest mesh snapshot. Every target
//! has its own [`PublicationGate`], and subscriber presence is checked
//! before any assembly work.

use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nalgebra::Vector3;

use crate::config::{FrameIds, VisualizationConfig};
use crate::core::{Color, PointCloud, is_timestamp_valid};
use crate::engine::{ScanMapper, ScanOdometry, SubmapSnapshot};
use crate::io::{CloudSink, MeshSink};
use crate::mapping::voxel_downsample;
use crate::mesh::MeshBuilder;
use crate::state::{PipelineStateHandle, PublicationGate};

/// Cloud and mesh sinks fed by the visualization worker.
pub struct VisualizationSinks {
    /// Preprocessed scan entering odometry (range sensor frame).
    pub odometry_input: Arc<dyn CloudSink>,
    /// Preprocessed scan entering mapping (range sensor frame).
    pub mapping_input: Arc<dyn CloudSink>,
    /// Thinned assembled map (map frame).
    pub assembled_map: Arc<dyn CloudSink>,
    /// Active submap dense map (map frame).
    pub dense_map: Arc<dyn CloudSink>,
    /// Colored per-submap cloud (map frame).
    pub submaps: Arc<dyn CloudSink>,
    /// Latest reconstructed mesh (map frame).
    pub mesh: Arc<dyn MeshSink>,
}

/// Visualization worker handle.
pub struct VisualizationThread {
    handle: JoinHandle<()>,
}

impl VisualizationThread {
    /// Spawn the visualization worker.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        state: PipelineStateHandle,
        odometry: Arc<RwLock<dyn ScanOdometry>>,
        mapper: Arc<RwLock<dyn ScanMapper>>,
        mesh_builder: Arc<MeshBuilder>,
        sinks: VisualizationSinks,
        config: VisualizationConfig,
        frames: FrameIds,
        poll_interval: Duration,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("visualization".into())
            .spawn(move || {
                run_visualization_loop(
                    state,
                    odometry,
                    mapper,
                    mesh_builder,
                    sinks,
                    config,
                    frames,
                    poll_interval,
                );
            })
            .expect("Failed to spawn visualization thread");

        Self { handle }
    }

    /// Wait for the worker to finish.
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

#[allow(clippy::too_many_arguments)]
fn run_visualization_loop(
    state: PipelineStateHandle,
    odometry: Arc<RwLock<dyn ScanOdometry>>,
    mapper: Arc<RwLock<dyn ScanMapper>>,
    mesh_builder: Arc<MeshBuilder>,
    sinks: VisualizationSinks,
    config: VisualizationConfig,
    frames: FrameIds,
    poll_interval: Duration,
) {
    log::info!("Visualization worker starting");

    let map_interval = Duration::from_millis(config.visualize_every_n_msec);
    let mut odom_input_gate = PublicationGate::dedup_only();
    let mut dense_map_gate = PublicationGate::new(map_interval);
    let mut maps_gate = PublicationGate::new(map_interval);
    let mut mesh_gate = PublicationGate::new(Duration::from_millis(config.mesh_every_n_msec));

    while !state.is_shutdown_requested() {
        let scan_ts = state.latest_scan_to_scan();
        if is_timestamp_valid(scan_ts)
            && odom_input_gate.should_publish(scan_ts)
            && sinks.odometry_input.subscriber_count() > 0
        {
            if let Ok(odometry) = odometry.read() {
                let cloud = odometry.preprocessed_cloud();
                if !cloud.is_empty() {
                    sinks.odometry_input.publish(&cloud, &frames.range_sensor, scan_ts);
                    odom_input_gate.mark_published(scan_ts);
                }
            }
        }

        let map_ts = state.latest_scan_to_map();
        if is_timestamp_valid(map_ts) {
            publish_dense_map(&mapper, &sinks, &mut dense_map_gate, &frames, map_ts);
            publish_maps(&mapper, &sinks, &mut maps_gate, &config, &frames, map_ts);
        }

        publish_mesh(&mesh_builder, &sinks, &mut mesh_gate, &frames);

        thread::sleep(poll_interval);
    }

    log::info!("Visualization worker shutting down");
}

/// Publish the active submap's dense map on its own cadence.
fn publish_dense_map(
    mapper: &Arc<RwLock<dyn ScanMapper>>,
    sinks: &VisualizationSinks,
    gate: &mut PublicationGate,
    frames: &FrameIds,
    timestamp_us: u64,
) {
    if !gate.should_publish(timestamp_us) || sinks.dense_map.subscriber_count() == 0 {
        return;
    }
    let dense = match mapper.read() {
        Ok(mapper) => mapper.active_submap_dense_map(),
        Err(_) => return,
    };
    let cloud = dense.to_point_cloud();
    if cloud.is_empty() {
        return;
    }
    sinks.dense_map.publish(&cloud, &frames.map, timestamp_us);
    gate.mark_published(timestamp_us);
}

/// Publish the assembled map, mapping input, and colored submaps.
fn publish_maps(
    mapper: &Arc<RwLock<dyn ScanMapper>>,
    sinks: &VisualizationSinks,
    gate: &mut PublicationGate,
    config: &VisualizationConfig,
    frames: &FrameIds,
    timestamp_us: u64,
) {
    if !gate.should_publish(timestamp_us) {
        return;
    }
    let Ok(mapper) = mapper.read() else {
        return;
    };

    let mut published = false;

    if sinks.assembled_map.subscriber_count() > 0 {
        let map = mapper.assembled_map_cloud();
        if !map.is_empty() {
            let thinned =
                voxel_downsample(&map, &Vector3::from(config.assembled_map_voxel_size));
            sinks.assembled_map.publish(&thinned, &frames.map, timestamp_us);
            published = true;
        }
    }

    if sinks.mapping_input.subscriber_count() > 0 {
        let scan = mapper.preprocessed_scan();
        if !scan.is_empty() {
            sinks.mapping_input.publish(&scan, &frames.range_sensor, timestamp_us);
            published = true;
        }
    }

    if sinks.submaps.subscriber_count() > 0 {
        let submaps = mapper.submaps();
        let colored = assemble_colored_submap_cloud(&submaps);
        if !colored.is_empty() {
            let thinned = voxel_downsample(&colored, &Vector3::from(config.submap_voxel_size));
            sinks.submaps.publish(&thinned, &frames.map, timestamp_us);
            published = true;
        }
    }

    if published {
        gate.mark_published(timestamp_us);
    }
}

/// Publish the latest mesh snapshot, de-duplicated by its build timestamp.
fn publish_mesh(
    mesh_builder: &Arc<MeshBuilder>,
    sinks: &VisualizationSinks,
    gate: &mut PublicationGate,
    frames: &FrameIds,
) {
    let snapshot = mesh_builder.snapshot();
    if snapshot.mesh.is_empty()
        || !is_timestamp_valid(snapshot.timestamp_us)
        || !gate.should_publish(snapshot.timestamp_us)
        || sinks.mesh.subscriber_count() == 0
    {
        return;
    }
    sinks.mesh.publish(&snapshot.mesh, &frames.map, snapshot.timestamp_us);
    gate.mark_published(snapshot.timestamp_us);
}

/// Concatenate all submap clouds, tinting each with its palette color.
fn assemble_colored_submap_cloud(submaps: &[SubmapSnapshot]) -> PointCloud {
    let total: usize = submaps.iter().map(|s| s.cloud.len()).sum();
    let mut points = Vec::with_capacity(total);
    let mut colors = Vec::with_capacity(total);
    for (j, submap) in submaps.iter().enumerate() {
        let tint = Color::for_submap(j).rgb();
        points.extend_from_slice(&submap.cloud.points);
        colors.extend(std::iter::repeat_n(tint, submap.cloud.len()));
    }
    PointCloud {
        points,
        normals: None,
        colors: Some(colors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Isometry3;

    fn submap(id: u64, points: Vec<Vector3<f64>>) -> SubmapSnapshot {
        SubmapSnapshot {
            id,
            origin: Isometry3::identity(),
            cloud: PointCloud::from_points(points),
        }
    }

    #[test]
    fn test_colored_assembly_tints_per_submap() {
        let submaps = vec![
            submap(0, vec![Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)]),
            submap(1, vec![Vector3::new(5.0, 0.0, 0.0)]),
        ];

        let cloud = assemble_colored_submap_cloud(&submaps);
        assert_eq!(cloud.len(), 3);

        let colors = cloud.colors.as_ref().unwrap();
        assert_eq!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_eq!(colors[0], Color::for_submap(0).rgb());
        assert_eq!(colors[2], Color::for_submap(1).rgb());
    }

    #[test]
    fn test_colored_assembly_of_nothing_is_empty() {
        let cloud = assemble_colored_submap_cloud(&[]);
        assert!(cloud.is_empty());
    }
}
