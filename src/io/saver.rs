//! Point cloud persistence for the save services.
//!
//! ASCII PLY keeps the output readable by standard tooling without pulling
//! a format crate into the core.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::PointCloud;
use crate::engine::SubmapSnapshot;
use crate::error::{Error, Result};

/// Write a cloud as ASCII PLY.
///
/// Normals and colors are written when present. Fails on an empty cloud so
/// the save services report "nothing to save" instead of writing husks.
pub fn save_point_cloud_ply(cloud: &PointCloud, path: &Path) -> Result<()> {
    if cloud.is_empty() {
        return Err(Error::Empty("point cloud"));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "ply")?;
    writeln!(w, "format ascii 1.0")?;
    writeln!(w, "element vertex {}", cloud.len())?;
    writeln!(w, "property double x")?;
    writeln!(w, "property double y")?;
    writeln!(w, "property double z")?;
    if cloud.has_normals() {
        writeln!(w, "property double nx")?;
        writeln!(w, "property double ny")?;
        writeln!(w, "property double nz")?;
    }
    if cloud.has_colors() {
        writeln!(w, "property uchar red")?;
        writeln!(w, "property uchar green")?;
        writeln!(w, "property uchar blue")?;
    }
    writeln!(w, "end_header")?;

    for i in 0..cloud.len() {
        let p = &cloud.points[i];
        write!(w, "{} {} {}", p.x, p.y, p.z)?;
        if let Some(normals) = &cloud.normals {
            let n = &normals[i];
            write!(w, " {} {} {}", n.x, n.y, n.z)?;
        }
        if let Some(colors) = &cloud.colors {
            let c = &colors[i];
            write!(
                w,
                " {} {} {}",
                (c.x.clamp(0.0, 1.0) * 255.0) as u8,
                (c.y.clamp(0.0, 1.0) * 255.0) as u8,
                (c.z.clamp(0.0, 1.0) * 255.0) as u8
            )?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

/// Write one PLY file per submap into `dir`.
///
/// Returns the number of files written; submaps with empty clouds are
/// skipped.
pub fn save_submaps(submaps: &[SubmapSnapshot], dir: &Path) -> Result<usize> {
    if submaps.is_empty() {
        return Err(Error::Empty("submap collection"));
    }
    fs::create_dir_all(dir)?;

    let mut written = 0;
    for submap in submaps {
        if submap.cloud.is_empty() {
            log::debug!("Skipping empty submap {}", submap.id);
            continue;
        }
        let path = dir.join(format!("submap_{}.ply", submap.id));
        save_point_cloud_ply(&submap.cloud, &path)?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Isometry3, Vector3};

    #[test]
    fn test_ply_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.ply");

        let cloud = PointCloud::from_points(vec![
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 5.0, 6.0),
        ])
        .with_colors(vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ]);
        save_point_cloud_ply(&cloud, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("ply\nformat ascii 1.0\n"));
        assert!(contents.contains("element vertex 2"));
        assert!(contents.contains("property uchar red"));
        assert!(!contents.contains("property double nx"));
        assert!(contents.contains("1 2 3 255 0 0"));
    }

    #[test]
    fn test_empty_cloud_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_point_cloud_ply(&PointCloud::new(), &dir.path().join("map.ply"));
        assert!(matches!(result, Err(Error::Empty(_))));
    }

    #[test]
    fn test_save_submaps_writes_one_file_each() {
        let dir = tempfile::tempdir().unwrap();
        let submaps = vec![
            SubmapSnapshot {
                id: 0,
                origin: Isometry3::identity(),
                cloud: PointCloud::from_points(vec![Vector3::zeros()]),
            },
            SubmapSnapshot {
                id: 1,
                origin: Isometry3::translation(5.0, 0.0, 0.0),
                cloud: PointCloud::from_points(vec![Vector3::new(5.0, 0.0, 0.0)]),
            },
            SubmapSnapshot {
                id: 2,
                origin: Isometry3::identity(),
                cloud: PointCloud::new(),
            },
        ];

        let written = save_submaps(&submaps, dir.path()).unwrap();
        assert_eq!(written, 2);
        assert!(dir.path().join("submap_0.ply").exists());
        assert!(dir.path().join("submap_1.ply").exists());
        assert!(!dir.path().join("submap_2.ply").exists());
    }
}
