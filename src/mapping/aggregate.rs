//! Online statistical voxel downsampling.
//!
//! Each populated voxel keeps sufficient statistics (point count, position
//! and normal sums, a per-channel color histogram) instead of the points
//! themselves, so memory stays bounded by the number of occupied cells
//! regardless of how many scans are folded in.

use std::collections::HashMap;

use nalgebra::{Isometry3, Vector3};

use super::grid::VoxelGrid;
use super::voxel::VoxelKey;
use crate::core::PointCloud;

/// Buckets per color channel.
const COLOR_BUCKETS: usize = 256;

/// Per-channel color histogram, one bucket row per quantized intensity.
///
/// Boxed and allocated lazily: most range sensors produce colorless clouds
/// and the table is 3 KiB per voxel.
type ColorHistogram = Box<[[u32; 3]; COLOR_BUCKETS]>;

/// Sufficient statistics for one voxel.
///
/// All derived getters return the zero vector while the voxel is empty.
/// Histogram buckets only ever grow under insertion; nothing resets them
/// short of clearing the owning grid.
#[derive(Debug, Clone, Default)]
pub struct AggregatedVoxel {
    num_points: usize,
    position_sum: Vector3<f64>,
    normal_sum: Vector3<f64>,
    color_histogram: Option<ColorHistogram>,
}

impl AggregatedVoxel {
    /// Number of points folded into this voxel.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    /// Fold in a point position.
    pub fn aggregate_point(&mut self, p: &Vector3<f64>) {
        self.position_sum += p;
        self.num_points += 1;
    }

    /// Fold in a surface normal.
    pub fn aggregate_normal(&mut self, n: &Vector3<f64>) {
        self.normal_sum += n;
    }

    /// Fold in an RGB color with channels in `[0, 1]`.
    ///
    /// Out-of-range channels are clamped to the boundary buckets rather
    /// than rejected; each channel votes in its own histogram
    /// independently.
    pub fn aggregate_color(&mut self, c: &Vector3<f64>) {
        let histogram = self
            .color_histogram
            .get_or_insert_with(|| Box::new([[0u32; 3]; COLOR_BUCKETS]));
        for channel in 0..3 {
            let bucket = (c[channel].clamp(0.0, 1.0) * 255.0) as usize;
            histogram[bucket.min(COLOR_BUCKETS - 1)][channel] += 1;
        }
    }

    /// Mean position; zero vector while empty.
    pub fn position(&self) -> Vector3<f64> {
        if self.num_points == 0 {
            Vector3::zeros()
        } else {
            self.position_sum / self.num_points as f64
        }
    }

    /// Mean normal; zero vector while empty.
    pub fn normal(&self) -> Vector3<f64> {
        if self.num_points == 0 {
            Vector3::zeros()
        } else {
            self.normal_sum / self.num_points as f64
        }
    }

    /// Most frequent color, decided per channel independently.
    ///
    /// This is the per-channel mode, not the joint mode: each channel's
    /// argmax is taken on its own histogram, ties resolved toward the lower
    /// bucket. Zero vector while empty or colorless.
    pub fn color(&self) -> Vector3<f64> {
        if self.num_points == 0 {
            return Vector3::zeros();
        }
        let Some(histogram) = &self.color_histogram else {
            return Vector3::zeros();
        };
        let mut best = [0usize; 3];
        for bucket in 1..COLOR_BUCKETS {
            for channel in 0..3 {
                if histogram[bucket][channel] > histogram[best[channel]][channel] {
                    best[channel] = bucket;
                }
            }
        }
        Vector3::new(best[0] as f64, best[1] as f64, best[2] as f64) / 255.0
    }

    /// Merge another voxel's statistics into this one.
    fn merge(&mut self, other: &AggregatedVoxel) {
        self.num_points += other.num_points;
        self.position_sum += other.position_sum;
        self.normal_sum += other.normal_sum;
        if let Some(theirs) = &other.color_histogram {
            let ours = self
                .color_histogram
                .get_or_insert_with(|| Box::new([[0u32; 3]; COLOR_BUCKETS]));
            for bucket in 0..COLOR_BUCKETS {
                for channel in 0..3 {
                    ours[bucket][channel] += theirs[bucket][channel];
                }
            }
        }
    }
}

/// Statistically voxel-downsampled point cloud.
///
/// `insert` folds whole clouds into the per-voxel statistics;
/// `to_point_cloud` flattens one representative point per populated voxel.
/// The attribute flags flip true the first time an inserted cloud carries
/// normals/colors and stay true until [`Self::clear`].
///
/// No knowledge of time or threads; callers serialize access (one write
/// lock per mapping cycle, see the pipeline concurrency notes).
#[derive(Debug, Clone)]
pub struct AggregatingVoxelGrid {
    grid: VoxelGrid<AggregatedVoxel>,
    has_normals: bool,
    has_colors: bool,
}

impl AggregatingVoxelGrid {
    pub fn new(voxel_size: Vector3<f64>) -> Self {
        Self {
            grid: VoxelGrid::new(voxel_size),
            has_normals: false,
            has_colors: false,
        }
    }

    /// Per-axis voxel size.
    pub fn voxel_size(&self) -> &Vector3<f64> {
        self.grid.voxel_size()
    }

    /// Whether any inserted cloud carried normals.
    pub fn has_normals(&self) -> bool {
        self.has_normals
    }

    /// Whether any inserted cloud carried colors.
    pub fn has_colors(&self) -> bool {
        self.has_colors
    }

    /// Number of populated voxels.
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Statistics of the voxel containing `p`, if populated.
    pub fn voxel_at(&self, p: &Vector3<f64>) -> Option<&AggregatedVoxel> {
        self.grid.get_at(p)
    }

    /// Fold a cloud into the grid, lazily creating voxels.
    pub fn insert(&mut self, cloud: &PointCloud) {
        for (i, p) in cloud.points.iter().enumerate() {
            let key = self.grid.key_of(p);
            let voxel = self.grid.cell_mut(key);
            voxel.aggregate_point(p);
            if let Some(normals) = &cloud.normals {
                voxel.aggregate_normal(&normals[i]);
                self.has_normals = true;
            }
            if let Some(colors) = &cloud.colors {
                voxel.aggregate_color(&colors[i]);
                self.has_colors = true;
            }
        }
    }

    /// Apply a rigid transform by rebuilding the whole key space.
    ///
    /// Keys are a function of absolute position, so cells are re-keyed from
    /// their transformed mean; position sums pick up the translation once
    /// per aggregated point so the mean transforms exactly, normal sums are
    /// rotated only. Cells with zero points are dropped; cells that land in
    /// the same target voxel are merged. No-op on an empty grid.
    pub fn transform(&mut self, t: &Isometry3<f64>) {
        if self.grid.is_empty() {
            return;
        }
        let translation = t.translation.vector;
        let mut rebuilt: HashMap<VoxelKey, AggregatedVoxel> = HashMap::with_capacity(self.len());
        for (_, voxel) in self.grid.iter() {
            if voxel.num_points == 0 {
                continue;
            }
            let moved = AggregatedVoxel {
                num_points: voxel.num_points,
                position_sum: t.rotation * voxel.position_sum
                    + translation * voxel.num_points as f64,
                normal_sum: t.rotation * voxel.normal_sum,
                color_histogram: voxel.color_histogram.clone(),
            };
            let key = self.grid.key_of(&moved.position());
            match rebuilt.entry(key) {
                std::collections::hash_map::Entry::Occupied(mut e) => e.get_mut().merge(&moved),
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(moved);
                }
            }
        }
        self.grid.replace_cells(rebuilt);
    }

    /// Flatten to one representative point per populated voxel.
    ///
    /// Output length equals the number of cells with at least one point;
    /// the normals/colors channels are present iff the corresponding
    /// attribute flag is set. Iteration order is unspecified but stable
    /// within one call.
    pub fn to_point_cloud(&self) -> PointCloud {
        if self.grid.is_empty() {
            return PointCloud::new();
        }
        let mut points = Vec::with_capacity(self.grid.len());
        let mut normals = self.has_normals.then(|| Vec::with_capacity(self.grid.len()));
        let mut colors = self.has_colors.then(|| Vec::with_capacity(self.grid.len()));
        for (_, voxel) in self.grid.iter() {
            if voxel.num_points == 0 {
                continue;
            }
            points.push(voxel.position());
            if let Some(normals) = &mut normals {
                normals.push(voxel.normal());
            }
            if let Some(colors) = &mut colors {
                colors.push(voxel.color());
            }
        }
        PointCloud {
            points,
            normals,
            colors,
        }
    }

    /// Drop all voxels and reset the attribute flags.
    pub fn clear(&mut self) {
        self.grid.clear();
        self.has_normals = false;
        self.has_colors = false;
    }
}

impl Default for AggregatingVoxelGrid {
    fn default() -> Self {
        Self::new(Vector3::from_element(0.25))
    }
}

/// Voxel-downsample a cloud in one shot.
///
/// Used on the visualization path to thin large assembled maps before
/// publishing.
pub fn voxel_downsample(cloud: &PointCloud, voxel_size: &Vector3<f64>) -> PointCloud {
    let mut grid = AggregatingVoxelGrid::new(*voxel_size);
    grid.insert(cloud);
    grid.to_point_cloud()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn test_empty_voxel_returns_zero_vectors() {
        let voxel = AggregatedVoxel::default();
        assert_eq!(voxel.position(), Vector3::zeros());
        assert_eq!(voxel.normal(), Vector3::zeros());
        assert_eq!(voxel.color(), Vector3::zeros());
    }

    #[test]
    fn test_mean_position() {
        let mut voxel = AggregatedVoxel::default();
        voxel.aggregate_point(&Vector3::new(1.0, 0.0, 0.0));
        voxel.aggregate_point(&Vector3::new(2.0, 0.0, 0.0));
        voxel.aggregate_point(&Vector3::new(3.0, 0.0, 0.0));

        assert_relative_eq!(voxel.position(), Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(voxel.num_points(), 3);
    }

    #[test]
    fn test_color_mode_is_per_channel() {
        let mut voxel = AggregatedVoxel::default();
        voxel.aggregate_point(&Vector3::zeros());
        // Red channel votes: two for 1.0, one for 0.0
        // Green channel votes: two for 0.0, one for 1.0
        voxel.aggregate_color(&Vector3::new(1.0, 0.0, 0.5));
        voxel.aggregate_color(&Vector3::new(1.0, 0.0, 0.5));
        voxel.aggregate_color(&Vector3::new(0.0, 1.0, 0.5));

        let c = voxel.color();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 0.0);
        // 0.5 quantizes to bucket 127
        assert_relative_eq!(c.z, 127.0 / 255.0);
    }

    #[test]
    fn test_out_of_range_color_is_clamped() {
        let mut voxel = AggregatedVoxel::default();
        voxel.aggregate_point(&Vector3::zeros());
        voxel.aggregate_color(&Vector3::new(1.7, -0.3, 0.0));

        let c = voxel.color();
        assert_relative_eq!(c.x, 1.0);
        assert_relative_eq!(c.y, 0.0);
    }

    #[test]
    fn test_insert_sets_monotonic_flags() {
        let mut grid = AggregatingVoxelGrid::new(Vector3::from_element(1.0));
        assert!(!grid.has_normals() && !grid.has_colors());

        grid.insert(
            &PointCloud::from_points(vec![Vector3::zeros()])
                .with_normals(vec![Vector3::new(0.0, 0.0, 1.0)]),
        );
        assert!(grid.has_normals());

        // A later colorless, normal-less cloud does not clear the flag
        grid.insert(&PointCloud::from_points(vec![Vector3::new(3.0, 3.0, 3.0)]));
        assert!(grid.has_normals());
        assert!(!grid.has_colors());

        grid.clear();
        assert!(!grid.has_normals());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_to_point_cloud_size_matches_occupancy() {
        let mut grid = AggregatingVoxelGrid::new(Vector3::from_element(1.0));
        grid.insert(&PointCloud::from_points(vec![
            Vector3::new(0.1, 0.0, 0.0),
            Vector3::new(0.2, 0.0, 0.0),
            Vector3::new(5.0, 5.0, 5.0),
            Vector3::new(5.1, 5.0, 5.0),
        ]));

        let out = grid.to_point_cloud();
        assert_eq!(out.len(), 2);
        assert!(!out.has_normals() && !out.has_colors());

        let mut means: Vec<_> = out.points.clone();
        means.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        assert_relative_eq!(means[0], Vector3::new(0.15, 0.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(means[1], Vector3::new(5.05, 5.0, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn test_whole_cloud_in_one_voxel_yields_centroid() {
        let cloud = PointCloud::from_points(vec![
            Vector3::new(0.1, 0.2, 0.3),
            Vector3::new(0.4, 0.1, 0.2),
            Vector3::new(0.2, 0.3, 0.1),
        ]);
        // Voxel larger than the cloud's bounding box
        let mut grid = AggregatingVoxelGrid::new(Vector3::from_element(10.0));
        grid.insert(&cloud);

        let out = grid.to_point_cloud();
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out.points[0], cloud.centroid().unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_transform_rekeys_and_round_trips() {
        let mut grid = AggregatingVoxelGrid::new(Vector3::from_element(1.0));
        grid.insert(&PointCloud::from_points(vec![
            Vector3::new(0.4, 0.4, 0.4),
            Vector3::new(0.6, 0.6, 0.6),
            Vector3::new(7.5, 0.0, 0.0),
        ]));
        let before = grid.to_point_cloud();

        let t = Isometry3::from_parts(
            Translation3::new(10.0, -3.0, 2.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_4),
        );
        grid.transform(&t);

        // Means must land exactly where transforming the flattened cloud would
        let mut expected = before.clone();
        expected.transform(&t);
        let mut moved = grid.to_point_cloud().points;
        moved.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        let mut reference = expected.points;
        reference.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        for (m, r) in moved.iter().zip(&reference) {
            assert_relative_eq!(*m, *r, epsilon = 1e-9);
        }

        // And the inverse brings the flattened output back
        grid.transform(&t.inverse());
        let mut back = grid.to_point_cloud().points;
        back.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        let mut original = before.points;
        original.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        for (b, o) in back.iter().zip(&original) {
            assert_relative_eq!(*b, *o, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_transform_on_empty_grid_is_noop() {
        let mut grid = AggregatingVoxelGrid::default();
        grid.transform(&Isometry3::translation(1.0, 2.0, 3.0));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_transform_rotates_normals_without_translating() {
        let mut grid = AggregatingVoxelGrid::new(Vector3::from_element(1.0));
        grid.insert(
            &PointCloud::from_points(vec![Vector3::new(0.5, 0.5, 0.5)])
                .with_normals(vec![Vector3::new(1.0, 0.0, 0.0)]),
        );

        grid.transform(&Isometry3::translation(100.0, 0.0, 0.0));

        let out = grid.to_point_cloud();
        assert_relative_eq!(
            out.normals.unwrap()[0],
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_voxel_downsample_helper() {
        let cloud = PointCloud::from_points(vec![
            Vector3::new(0.1, 0.0, 0.0),
            Vector3::new(0.2, 0.0, 0.0),
            Vector3::new(3.1, 0.0, 0.0),
        ]);
        let thinned = voxel_downsample(&cloud, &Vector3::from_element(1.0));
        assert_eq!(thinned.len(), 2);
    }
}
