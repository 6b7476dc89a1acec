//! Voxel indices: per-cell lists of point indices into an external cloud.
//!
//! Indices reference, never copy, coordinate data. They are built once per
//! mapping cycle and read many times; there is no removal operation, the
//! caller discards and rebuilds instead.

use std::collections::HashMap;

use nalgebra::Vector3;

use super::grid::VoxelGrid;
use super::voxel::VoxelKey;
use crate::core::PointCloud;

const EMPTY: &[usize] = &[];

/// Single-layer voxel index.
///
/// Re-inserting appends rather than replaces, so inserting overlapping
/// index sets twice produces duplicates; deduplication is the caller's
/// responsibility.
#[derive(Debug, Clone)]
pub struct VoxelIndex {
    grid: VoxelGrid<Vec<usize>>,
}

impl VoxelIndex {
    pub fn new(voxel_size: Vector3<f64>) -> Self {
        Self {
            grid: VoxelGrid::new(voxel_size),
        }
    }

    /// Index every point of `cloud` (indices `0..len`).
    pub fn insert(&mut self, cloud: &PointCloud) {
        for (idx, p) in cloud.points.iter().enumerate() {
            let key = self.grid.key_of(p);
            self.grid.cell_mut(key).push(idx);
        }
    }

    /// Index only the given point indices of `cloud`.
    pub fn insert_indices(&mut self, cloud: &PointCloud, indices: &[usize]) {
        for &idx in indices {
            let key = self.grid.key_of(&cloud.points[idx]);
            self.grid.cell_mut(key).push(idx);
        }
    }

    /// Indices stored in the voxel containing `p`; empty if the cell is
    /// absent.
    pub fn indices_in_voxel(&self, p: &Vector3<f64>) -> &[usize] {
        self.grid.get_at(p).map(Vec::as_slice).unwrap_or(EMPTY)
    }

    /// Indices stored under `key`; empty if the cell is absent.
    pub fn indices_in_voxel_key(&self, key: &VoxelKey) -> &[usize] {
        self.grid.get(key).map(Vec::as_slice).unwrap_or(EMPTY)
    }

    /// Number of populated voxels.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

/// Multi-layer voxel index: independent index lists per named layer,
/// sharing one key space.
///
/// A physical voxel may be populated in zero, one, or several layers; layer
/// absence is distinct from empty occupancy ([`Self::has_layer`] answers
/// the former, the lenient lookups cannot distinguish the two).
#[derive(Debug, Clone)]
pub struct MultiLayerVoxelIndex {
    grid: VoxelGrid<HashMap<String, Vec<usize>>>,
}

impl MultiLayerVoxelIndex {
    pub fn new(voxel_size: Vector3<f64>) -> Self {
        Self {
            grid: VoxelGrid::new(voxel_size),
        }
    }

    /// Index every point of `cloud` into `layer`.
    pub fn insert(&mut self, layer: &str, cloud: &PointCloud) {
        for (idx, p) in cloud.points.iter().enumerate() {
            self.insert_one(layer, p, idx);
        }
    }

    /// Index only the given point indices of `cloud` into `layer`.
    pub fn insert_indices(&mut self, layer: &str, cloud: &PointCloud, indices: &[usize]) {
        for &idx in indices {
            self.insert_one(layer, &cloud.points[idx], idx);
        }
    }

    fn insert_one(&mut self, layer: &str, p: &Vector3<f64>, idx: usize) {
        let key = self.grid.key_of(p);
        self.grid
            .cell_mut(key)
            .entry(layer.to_owned())
            .or_default()
            .push(idx);
    }

    /// Indices stored for `layer` in the voxel containing `p`.
    ///
    /// An unknown layer and an empty cell both yield an empty result; this
    /// lenient behavior is deliberate, callers that need to tell the cases
    /// apart use [`Self::has_layer`].
    pub fn indices_in_voxel(&self, layer: &str, p: &Vector3<f64>) -> &[usize] {
        self.indices_in_voxel_key(layer, &self.grid.key_of(p))
    }

    /// Indices stored for `layer` under `key`.
    pub fn indices_in_voxel_key(&self, layer: &str, key: &VoxelKey) -> &[usize] {
        self.grid
            .get(key)
            .and_then(|layers| layers.get(layer))
            .map(Vec::as_slice)
            .unwrap_or(EMPTY)
    }

    /// Whether the voxel under `key` is populated in `layer`.
    pub fn has_layer(&self, key: &VoxelKey, layer: &str) -> bool {
        self.grid
            .get(key)
            .is_some_and(|layers| layers.contains_key(layer))
    }

    /// Number of populated voxels (across all layers).
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}
