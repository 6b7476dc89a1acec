//! Generic voxel grid storage.

use std::collections::HashMap;

use nalgebra::Vector3;

use super::voxel::{VoxelKey, voxel_key};

/// A sparse voxel grid mapping cell keys to an arbitrary cell payload.
///
/// The payload type decides what the grid is: `Vec<usize>` gives a point
/// index ([`super::VoxelIndex`]), a layer map gives the multi-layer variant,
/// and [`super::AggregatedVoxel`] gives the statistical downsampler. The
/// grid itself only owns the key space.
#[derive(Debug, Clone)]
pub struct VoxelGrid<C> {
    voxel_size: Vector3<f64>,
    voxels: HashMap<VoxelKey, C>,
}

impl<C> VoxelGrid<C> {
    /// Create an empty grid with the given per-axis voxel size.
    ///
    /// # Panics
    ///
    /// Panics if any component of `voxel_size` is not strictly positive.
    pub fn new(voxel_size: Vector3<f64>) -> Self {
        assert!(
            voxel_size.iter().all(|s| *s > 0.0),
            "voxel size must be strictly positive, got {:?}",
            voxel_size
        );
        Self {
            voxel_size,
            voxels: HashMap::new(),
        }
    }

    /// Per-axis voxel size.
    #[inline]
    pub fn voxel_size(&self) -> &Vector3<f64> {
        &self.voxel_size
    }

    /// Key of the cell containing `p`.
    #[inline]
    pub fn key_of(&self, p: &Vector3<f64>) -> VoxelKey {
        voxel_key(p, &self.voxel_size)
    }

    /// Cell payload for a key, if the cell exists.
    #[inline]
    pub fn get(&self, key: &VoxelKey) -> Option<&C> {
        self.voxels.get(key)
    }

    /// Cell payload for the cell containing `p`, if it exists.
    #[inline]
    pub fn get_at(&self, p: &Vector3<f64>) -> Option<&C> {
        self.voxels.get(&self.key_of(p))
    }

    /// Whether a cell exists for this key.
    #[inline]
    pub fn contains_key(&self, key: &VoxelKey) -> bool {
        self.voxels.contains_key(key)
    }

    /// Mutable access to the cell for `key`, creating it lazily.
    #[inline]
    pub fn cell_mut(&mut self, key: VoxelKey) -> &mut C
    where
        C: Default,
    {
        self.voxels.entry(key).or_default()
    }

    /// Number of populated cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Check if no cell is populated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Drop all cells; the voxel size is kept.
    pub fn clear(&mut self) {
        self.voxels.clear();
    }

    /// Iterate over `(key, payload)` pairs.
    ///
    /// Order is unspecified but stable while the grid is not mutated.
    pub fn iter(&self) -> impl Iterator<Item = (&VoxelKey, &C)> {
        self.voxels.iter()
    }

    /// Replace the whole cell storage (used by key-rebuilding transforms).
    pub(crate) fn replace_cells(&mut self, cells: HashMap<VoxelKey, C>) {
        self.voxels = cells;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_cell_creation() {
        let mut grid: VoxelGrid<Vec<usize>> = VoxelGrid::new(Vector3::new(1.0, 1.0, 1.0));
        let key = grid.key_of(&Vector3::new(0.5, 0.5, 0.5));

        assert!(grid.get(&key).is_none());
        grid.cell_mut(key).push(3);
        grid.cell_mut(key).push(4);

        assert_eq!(grid.len(), 1);
        assert_eq!(grid.get(&key).unwrap(), &[3, 4]);
    }

    #[test]
    #[should_panic(expected = "strictly positive")]
    fn test_zero_voxel_size_panics() {
        let _: VoxelGrid<Vec<usize>> = VoxelGrid::new(Vector3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_clear_keeps_voxel_size() {
        let mut grid: VoxelGrid<Vec<usize>> = VoxelGrid::new(Vector3::new(0.25, 0.25, 0.25));
        grid.cell_mut(VoxelKey::new(0, 0, 0)).push(0);
        grid.clear();

        assert!(grid.is_empty());
        assert_eq!(grid.voxel_size().x, 0.25);
    }
}
