//! Configuration for the mapping pipeline.
//!
//! All parameters have defaults matching the reference behavior; the
//! embedding node deserializes these from its own config file (TOML in the
//! usual deployment) and passes them in at startup.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Coordinate frame identifiers, resolved once at startup and passed to
/// the components that need them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameIds {
    /// Fixed map frame.
    pub map: String,
    /// Odometry frame (drifts relative to map).
    pub odom: String,
    /// Range sensor frame.
    pub range_sensor: String,
}

impl Default for FrameIds {
    fn default() -> Self {
        Self {
            map: "map".to_string(),
            odom: "odom".to_string(),
            range_sensor: "range_sensor".to_string(),
        }
    }
}

/// Visualization publication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    /// Minimum interval between map visualizations (milliseconds).
    pub visualize_every_n_msec: u64,
    /// Minimum interval between mesh publications (milliseconds).
    pub mesh_every_n_msec: u64,
    /// Voxel size the assembled map is thinned to before publishing.
    pub assembled_map_voxel_size: [f64; 3],
    /// Voxel size the colored submap cloud is thinned to before publishing.
    pub submap_voxel_size: [f64; 3],
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            visualize_every_n_msec: 250,
            mesh_every_n_msec: 1000,
            assembled_map_voxel_size: [0.3, 0.3, 0.3],
            submap_voxel_size: [0.2, 0.2, 0.2],
        }
    }
}

/// Capacities of the inter-stage hand-off buffers.
///
/// Capacity bounds memory independent of producer/consumer rate mismatch;
/// a slow consumer loses old entries instead of blocking the producer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Scans queued toward the odometry stage.
    pub odometry_capacity: usize,
    /// Registered scans queued toward the mapping stage.
    pub mapping_capacity: usize,
    /// Mesh triggers; only the newest matters, so this stays small.
    pub mesher_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            odometry_capacity: 10,
            mapping_capacity: 10,
            mesher_capacity: 4,
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Per-axis voxel size of the dense map fed into mesh reconstruction.
    pub voxel_size: [f64; 3],
    /// Polling rate of every worker loop (Hz).
    pub poll_rate_hz: f64,
    /// Timeout for synchronous service commands (milliseconds).
    pub command_timeout_ms: u64,
    #[serde(rename = "frames")]
    pub frame_ids: FrameIds,
    pub visualization: VisualizationConfig,
    pub buffers: BufferConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            voxel_size: [0.25, 0.25, 0.25],
            poll_rate_hz: 20.0,
            command_timeout_ms: 5000,
            frame_ids: FrameIds::default(),
            visualization: VisualizationConfig::default(),
            buffers: BufferConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Dense-map voxel size as a vector.
    pub fn voxel_size_vec(&self) -> Vector3<f64> {
        Vector3::from(self.voxel_size)
    }

    /// Sleep interval of a worker loop.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.poll_rate_hz.max(1e-3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behavior() {
        let config = PipelineConfig::default();
        assert_eq!(config.poll_rate_hz, 20.0);
        assert_eq!(config.voxel_size, [0.25, 0.25, 0.25]);
        assert_eq!(config.frame_ids.map, "map");
        assert_eq!(config.poll_interval(), std::time::Duration::from_millis(50));
    }

    #[test]
    fn test_partial_toml_overlays_defaults() {
        let toml = r#"
            poll_rate_hz = 10.0

            [visualization]
            visualize_every_n_msec = 100
            assembled_map_voxel_size = [0.5, 0.5, 1.0]

            [frames]
            map = "map_o3d"
        "#;
        let config: PipelineConfig = basic_toml::from_str(toml).unwrap();

        assert_eq!(config.poll_rate_hz, 10.0);
        assert_eq!(config.visualization.visualize_every_n_msec, 100);
        assert_eq!(config.visualization.assembled_map_voxel_size, [0.5, 0.5, 1.0]);
        assert_eq!(config.frame_ids.map, "map_o3d");
        // Untouched sections keep their defaults
        assert_eq!(config.buffers.odometry_capacity, 10);
        assert_eq!(config.visualization.mesh_every_n_msec, 1000);
    }
}
