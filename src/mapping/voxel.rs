//! Voxel key derivation and hashing.

use std::hash::{Hash, Hasher};

use nalgebra::Vector3;

use crate::core::PointCloud;

/// Multiplier separating the axes in the hash; chosen large and prime so
/// axis-aligned point patterns do not collide into the same buckets.
const HASH_STRIDE: i64 = 17191;

/// Integer cell coordinate of a voxel.
///
/// Equality is exact integer comparison. The hash folds the three
/// components together with distinct multipliers (`1`, `HASH_STRIDE`,
/// `HASH_STRIDE²`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelKey {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl Hash for VoxelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mixed =
            self.x as i64 + self.y as i64 * HASH_STRIDE + self.z as i64 * HASH_STRIDE * HASH_STRIDE;
        state.write_i64(mixed);
    }
}

/// Quantize a point to its voxel key: `floor(p / voxel_size)` per axis.
///
/// Deterministic and idempotent: the same point with the same voxel size
/// always yields the same key. Voxel sizes are per-axis, so anisotropic
/// voxels are allowed; all components must be positive.
#[inline]
pub fn voxel_key(p: &Vector3<f64>, voxel_size: &Vector3<f64>) -> VoxelKey {
    VoxelKey::new(
        (p.x / voxel_size.x).floor() as i32,
        (p.y / voxel_size.y).floor() as i32,
        (p.z / voxel_size.z).floor() as i32,
    )
}

/// Quantize relative to an origin so that keys stay small and non-negative
/// for points above `min_bound` (typically from [`compute_voxel_bounds`]).
#[inline]
pub fn voxel_key_from_origin(
    p: &Vector3<f64>,
    voxel_size: &Vector3<f64>,
    min_bound: &Vector3<f64>,
) -> VoxelKey {
    voxel_key(&(p - min_bound), voxel_size)
}

/// Axis-aligned bounds of a cloud, expanded outward to whole voxels.
///
/// Returns `None` for an empty cloud.
pub fn compute_voxel_bounds(
    cloud: &PointCloud,
    voxel_size: &Vector3<f64>,
) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let first = cloud.points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &cloud.points {
        min = min.inf(p);
        max = max.sup(p);
    }
    let floor_to_voxel = |v: Vector3<f64>| {
        Vector3::new(
            (v.x / voxel_size.x).floor() * voxel_size.x,
            (v.y / voxel_size.y).floor() * voxel_size.y,
            (v.z / voxel_size.z).floor() * voxel_size.z,
        )
    };
    let ceil_to_voxel = |v: Vector3<f64>| {
        Vector3::new(
            (v.x / voxel_size.x).ceil() * voxel_size.x,
            (v.y / voxel_size.y).ceil() * voxel_size.y,
            (v.z / voxel_size.z).ceil() * voxel_size.z,
        )
    };
    Some((floor_to_voxel(min), ceil_to_voxel(max)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(key: &VoxelKey) -> u64 {
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        h.finish()
    }

    #[test]
    fn test_key_is_floor_quantization() {
        let size = Vector3::new(1.0, 1.0, 1.0);
        assert_eq!(
            voxel_key(&Vector3::new(0.1, 0.9, 0.0), &size),
            VoxelKey::new(0, 0, 0)
        );
        assert_eq!(
            voxel_key(&Vector3::new(-0.1, 1.0, 2.5), &size),
            VoxelKey::new(-1, 1, 2)
        );
    }

    #[test]
    fn test_key_is_deterministic_and_idempotent() {
        let size = Vector3::new(0.25, 0.25, 0.25);
        let p = Vector3::new(3.17, -2.58, 0.99);
        let k1 = voxel_key(&p, &size);
        let k2 = voxel_key(&p, &size);
        assert_eq!(k1, k2);
        assert_eq!(hash_of(&k1), hash_of(&k2));
    }

    #[test]
    fn test_anisotropic_voxel_size() {
        let size = Vector3::new(1.0, 2.0, 4.0);
        let k = voxel_key(&Vector3::new(1.5, 1.5, 1.5), &size);
        assert_eq!(k, VoxelKey::new(1, 0, 0));
    }

    #[test]
    fn test_key_from_origin_is_non_negative_above_min_bound() {
        let size = Vector3::new(0.5, 0.5, 0.5);
        let min_bound = Vector3::new(-2.0, -2.0, -2.0);
        let k = voxel_key_from_origin(&Vector3::new(-1.9, 0.0, 1.3), &size, &min_bound);
        assert!(k.x >= 0 && k.y >= 0 && k.z >= 0);
    }

    #[test]
    fn test_axis_neighbors_hash_differently() {
        let base = VoxelKey::new(5, 5, 5);
        for neighbor in [
            VoxelKey::new(6, 5, 5),
            VoxelKey::new(5, 6, 5),
            VoxelKey::new(5, 5, 6),
        ] {
            assert_ne!(hash_of(&base), hash_of(&neighbor));
        }
    }

    #[test]
    fn test_voxel_bounds_cover_cloud() {
        let cloud = PointCloud::from_points(vec![
            Vector3::new(-0.3, 0.2, 1.7),
            Vector3::new(2.4, -1.1, 0.0),
        ]);
        let size = Vector3::new(0.5, 0.5, 0.5);
        let (min, max) = compute_voxel_bounds(&cloud, &size).unwrap();

        for p in &cloud.points {
            assert!(p.x >= min.x && p.x <= max.x);
            assert!(p.y >= min.y && p.y <= max.y);
            assert!(p.z >= min.z && p.z <= max.z);
        }

        assert!(compute_voxel_bounds(&PointCloud::new(), &size).is_none());
    }
}
