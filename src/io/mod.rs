//! Transport seams and map persistence.
//!
//! Wire formats are out of scope; the pipeline publishes through these
//! traits and the embedding node binds them to its transport of choice.

mod saver;

pub use saver::{save_point_cloud_ply, save_submaps};

use nalgebra::Isometry3;

use crate::core::{PointCloud, TriangleMesh};

/// Sink for rigid transforms (frame tree broadcasting).
pub trait TransformSink: Send + Sync {
    fn publish(
        &self,
        transform: &Isometry3<f64>,
        timestamp_us: u64,
        parent_frame: &str,
        child_frame: &str,
    );
}

/// Sink for point clouds.
///
/// Publishing with zero subscribers is expected to be a no-op, so callers
/// check [`Self::subscriber_count`] BEFORE doing expensive assembly work.
pub trait CloudSink: Send + Sync {
    fn subscriber_count(&self) -> usize;
    fn publish(&self, cloud: &PointCloud, frame: &str, timestamp_us: u64);
}

/// Sink for triangle meshes.
pub trait MeshSink: Send + Sync {
    fn subscriber_count(&self) -> usize;
    fn publish(&self, mesh: &TriangleMesh, frame: &str, timestamp_us: u64);
}
