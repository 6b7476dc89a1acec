//! Core data types for the mapping pipeline.
//!
//! - [`PointCloud`]: 3D points with optional per-point normals and colors
//! - [`TriangleMesh`]: indexed triangle mesh produced by reconstruction
//! - [`Color`]: fixed visualization palette with checked code lookup
//! - [`Timestamped<T>`]: generic timestamp wrapper

mod cloud;
mod color;
mod mesh;
mod timestamped;

pub use cloud::PointCloud;
pub use color::{Color, NUM_PALETTE_COLORS};
pub use mesh::TriangleMesh;
pub use timestamped::{INVALID_TIMESTAMP, Timestamped, is_timestamp_valid};
