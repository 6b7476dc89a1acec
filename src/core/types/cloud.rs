//! 3D point cloud type.

use nalgebra::{Isometry3, Vector3};

/// A 3D point cloud with optional per-point normals and colors.
///
/// Normals are unit-length direction vectors; colors are RGB with each
/// channel in `[0, 1]`. When an optional channel is present it has exactly
/// one entry per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    /// Point positions in meters.
    pub points: Vec<Vector3<f64>>,
    /// Optional per-point surface normals.
    pub normals: Option<Vec<Vector3<f64>>>,
    /// Optional per-point RGB colors, channels in `[0, 1]`.
    pub colors: Option<Vec<Vector3<f64>>>,
}

impl PointCloud {
    /// Create an empty cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cloud from bare positions.
    pub fn from_points(points: Vec<Vector3<f64>>) -> Self {
        Self {
            points,
            normals: None,
            colors: None,
        }
    }

    /// Attach normals (one per point).
    pub fn with_normals(mut self, normals: Vec<Vector3<f64>>) -> Self {
        debug_assert_eq!(normals.len(), self.points.len());
        self.normals = Some(normals);
        self
    }

    /// Attach colors (one per point, channels in `[0, 1]`).
    pub fn with_colors(mut self, colors: Vec<Vector3<f64>>) -> Self {
        debug_assert_eq!(colors.len(), self.points.len());
        self.colors = Some(colors);
        self
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the cloud has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether per-point normals are present.
    #[inline]
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Whether per-point colors are present.
    #[inline]
    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    /// Apply a rigid transform in place.
    ///
    /// Positions get the full transform; normals are rotated only.
    pub fn transform(&mut self, t: &Isometry3<f64>) {
        for p in &mut self.points {
            *p = t.rotation * *p + t.translation.vector;
        }
        if let Some(normals) = &mut self.normals {
            for n in normals {
                *n = t.rotation * *n;
            }
        }
    }

    /// Return a transformed copy.
    pub fn transformed(&self, t: &Isometry3<f64>) -> Self {
        let mut out = self.clone();
        out.transform(t);
        out
    }

    /// Append all points (and matching channels) of `other`.
    ///
    /// A channel survives the merge only if both clouds carry it; mixing a
    /// cloud with normals into one without would leave the arrays
    /// misaligned otherwise.
    pub fn append(&mut self, other: &PointCloud) {
        if self.is_empty() {
            *self = other.clone();
            return;
        }
        self.points.extend_from_slice(&other.points);
        match (&mut self.normals, &other.normals) {
            (Some(ours), Some(theirs)) => ours.extend_from_slice(theirs),
            _ => self.normals = None,
        }
        match (&mut self.colors, &other.colors) {
            (Some(ours), Some(theirs)) => ours.extend_from_slice(theirs),
            _ => self.colors = None,
        }
    }

    /// Arithmetic mean of all positions, `None` for an empty cloud.
    pub fn centroid(&self) -> Option<Vector3<f64>> {
        if self.points.is_empty() {
            return None;
        }
        let sum: Vector3<f64> = self.points.iter().sum();
        Some(sum / self.points.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Translation3;

    #[test]
    fn test_transform_moves_points_and_rotates_normals() {
        let mut cloud = PointCloud::from_points(vec![Vector3::new(1.0, 0.0, 0.0)])
            .with_normals(vec![Vector3::new(0.0, 0.0, 1.0)]);

        let t = Isometry3::from_parts(
            Translation3::new(0.0, 0.0, 5.0),
            nalgebra::UnitQuaternion::identity(),
        );
        cloud.transform(&t);

        assert_relative_eq!(cloud.points[0].z, 5.0);
        // Pure translation leaves normals untouched
        assert_relative_eq!(cloud.normals.as_ref().unwrap()[0].z, 1.0);
    }

    #[test]
    fn test_centroid() {
        let cloud = PointCloud::from_points(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(2.0, 4.0, 6.0),
        ]);
        let c = cloud.centroid().unwrap();
        assert_relative_eq!(c, Vector3::new(1.0, 2.0, 3.0));

        assert!(PointCloud::new().centroid().is_none());
    }

    #[test]
    fn test_append_drops_mismatched_channels() {
        let mut a = PointCloud::from_points(vec![Vector3::zeros()])
            .with_colors(vec![Vector3::new(1.0, 0.0, 0.0)]);
        let b = PointCloud::from_points(vec![Vector3::new(1.0, 1.0, 1.0)]);

        a.append(&b);

        assert_eq!(a.len(), 2);
        assert!(!a.has_colors());
    }

    #[test]
    fn test_append_into_empty_keeps_channels() {
        let mut a = PointCloud::new();
        let b = PointCloud::from_points(vec![Vector3::zeros()])
            .with_normals(vec![Vector3::new(0.0, 1.0, 0.0)]);

        a.append(&b);

        assert_eq!(a.len(), 1);
        assert!(a.has_normals());
    }
}
