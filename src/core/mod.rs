//! Core foundation layer: geometry value types and timestamps.

pub mod types;

pub use types::{
    Color, PointCloud, Timestamped, TriangleMesh, INVALID_TIMESTAMP, is_timestamp_valid,
};
