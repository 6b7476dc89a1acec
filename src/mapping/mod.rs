//! Spatial voxel indexing and statistical aggregation.
//!
//! Everything here is single-threaded by design; one mapping cycle mutates
//! a grid under one write lock while readers take copies (see the
//! concurrency notes on [`crate::threads::MappingPipeline`]).
//!
//! - [`VoxelKey`] / [`voxel_key`]: point → integer cell coordinate
//! - [`VoxelGrid`]: generic key → cell-payload storage
//! - [`VoxelIndex`] / [`MultiLayerVoxelIndex`]: per-cell point-index lists
//! - [`AggregatingVoxelGrid`]: online statistical voxel downsampling

mod aggregate;
mod grid;
mod index;
mod voxel;

pub use aggregate::{AggregatedVoxel, AggregatingVoxelGrid, voxel_downsample};
pub use grid::VoxelGrid;
pub use index::{MultiLayerVoxelIndex, VoxelIndex};
pub use voxel::{VoxelKey, compute_voxel_bounds, voxel_key, voxel_key_from_origin};
