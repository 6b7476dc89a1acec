//! Seams to the external registration algorithms.
//!
//! The scan-registration, pose-refinement, and submap-lifecycle logic live
//! outside this crate; the pipeline only drives them through these traits.
//! Algorithm objects sit behind `Arc<RwLock<_>>`: exactly one worker writes
//! per cycle, downstream workers take short read locks for the getters.

use nalgebra::Isometry3;

use crate::core::PointCloud;
use crate::mapping::AggregatingVoxelGrid;

/// Scan-to-scan registration (lidar odometry).
pub trait ScanOdometry: Send + Sync {
    /// Register a new range scan. Returns `false` if the scan was rejected;
    /// a rejected scan does not advance the odometry timestamp.
    fn add_range_scan(&mut self, cloud: &PointCloud, timestamp_us: u64) -> bool;

    /// Whether at least one scan has been successfully registered.
    fn has_processed_measurements(&self) -> bool;

    /// Odometry-frame pose of the range sensor at `timestamp_us`.
    ///
    /// `None` when the timestamp is outside the interpolation window;
    /// callers substitute the identity and continue (logged, never fatal).
    fn odom_to_range_sensor(&self, timestamp_us: u64) -> Option<Isometry3<f64>>;

    /// The last scan after the odometry stage's own preprocessing.
    fn preprocessed_cloud(&self) -> PointCloud;
}

/// Scan-to-map refinement and map maintenance.
pub trait ScanMapper: Send + Sync {
    /// Fold a registered scan into the map. Returns `false` if rejected.
    fn insert_scan(&mut self, cloud: &PointCloud, timestamp_us: u64) -> bool;

    /// Whether at least one scan has been folded into the map.
    fn has_processed_measurements(&self) -> bool;

    /// Drift correction: map frame to odometry frame at `timestamp_us`.
    ///
    /// `None` when the timestamp is outside the interpolation window, same
    /// recovery contract as [`ScanOdometry::odom_to_range_sensor`].
    fn map_to_odom(&self, timestamp_us: u64) -> Option<Isometry3<f64>>;

    /// Refined sensor pose in the map frame at `timestamp_us`.
    fn map_to_range_sensor(&self, timestamp_us: u64) -> Option<Isometry3<f64>>;

    /// The whole accumulated map as one cloud (map frame).
    fn assembled_map_cloud(&self) -> PointCloud;

    /// The last scan after the mapping stage's own preprocessing.
    fn preprocessed_scan(&self) -> PointCloud;

    /// Copy of the active submap's dense voxel map (map frame).
    fn active_submap_dense_map(&self) -> AggregatingVoxelGrid;

    /// Snapshot of all submaps (map frame).
    fn submaps(&self) -> Vec<SubmapSnapshot>;
}

/// Read-only view of one externally-managed submap.
#[derive(Debug, Clone)]
pub struct SubmapSnapshot {
    /// Stable submap identifier.
    pub id: u64,
    /// Submap origin pose in the map frame.
    pub origin: Isometry3<f64>,
    /// Submap points in the map frame.
    pub cloud: PointCloud,
}
