use denoise_core::PointCloud;
use std::fmt;
use std::io;
use std::path::Path;

use crate::xyz::XyzLayout;

/// On-disk point cloud format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudFormat {
    Pcd,
    Ply,
    Las,
    Xyz(XyzLayout),
}

impl CloudFormat {
    /// Detect the format from the extension of `path` (case-insensitive).
    /// `.txt` is read as plain `xyz`.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let format = match ext.as_str() {
            "pcd" => CloudFormat::Pcd,
            "ply" => CloudFormat::Ply,
            "las" => CloudFormat::Las,
            "xyz" | "txt" => CloudFormat::Xyz(XyzLayout::Xyz),
            "xyzn" => CloudFormat::Xyz(XyzLayout::Xyzn),
            "xyzrgb" => CloudFormat::Xyz(XyzLayout::Xyzrgb),
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported point cloud format: {}", path.display()),
                ))
            }
        };
        Ok(format)
    }
}

impl fmt::Display for CloudFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CloudFormat::Pcd => "pcd",
            CloudFormat::Ply => "ply",
            CloudFormat::Las => "las",
            CloudFormat::Xyz(XyzLayout::Xyz) => "xyz",
            CloudFormat::Xyz(XyzLayout::Xyzn) => "xyzn",
            CloudFormat::Xyz(XyzLayout::Xyzrgb) => "xyzrgb",
        };
        f.write_str(name)
    }
}

/// Read a point cloud, dispatching on the file extension.
pub fn read_cloud(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let path = path.as_ref();
    let format = CloudFormat::from_path(path)?;
    log::debug!("reading {} as {}", path.display(), format);
    match format {
        CloudFormat::Pcd => crate::read_pcd(path),
        CloudFormat::Ply => crate::read_ply(path),
        CloudFormat::Las => crate::read_las(path),
        CloudFormat::Xyz(layout) => crate::read_xyz(path, layout),
    }
}

/// Write a point cloud, dispatching on the file extension. PCD and PLY are
/// written in their binary encodings.
pub fn write_cloud(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let path = path.as_ref();
    let format = CloudFormat::from_path(path)?;
    log::debug!("writing {} points to {} as {}", cloud.len(), path.display(), format);
    match format {
        CloudFormat::Pcd => crate::write_pcd_binary(path, cloud),
        CloudFormat::Ply => crate::write_ply_binary(path, cloud),
        CloudFormat::Las => crate::write_las(path, cloud),
        CloudFormat::Xyz(layout) => crate::write_xyz(path, cloud, layout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detects_formats_case_insensitively() {
        assert_eq!(CloudFormat::from_path("a.pcd").unwrap(), CloudFormat::Pcd);
        assert_eq!(CloudFormat::from_path("dir/b.PLY").unwrap(), CloudFormat::Ply);
        assert_eq!(CloudFormat::from_path("c.Las").unwrap(), CloudFormat::Las);
        assert_eq!(
            CloudFormat::from_path("d.txt").unwrap(),
            CloudFormat::Xyz(XyzLayout::Xyz)
        );
        assert_eq!(
            CloudFormat::from_path("e.xyzrgb").unwrap(),
            CloudFormat::Xyz(XyzLayout::Xyzrgb)
        );
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        for path in ["cloud.obj", "cloud", "cloud.pcd.gz"] {
            let err = CloudFormat::from_path(path).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::Unsupported, "{}", path);
        }
    }

    #[test]
    fn write_then_read_every_format() {
        let dir = TempDir::new().unwrap();
        let cloud = PointCloud::from_points(&[[0.5, 1.5, -2.0], [3.0, 4.0, 5.0]]);
        for ext in ["pcd", "ply", "las", "xyz", "xyzn", "xyzrgb", "txt"] {
            let path = dir.path().join(format!("cloud.{}", ext));
            write_cloud(&path, &cloud).unwrap();
            let loaded = read_cloud(&path).unwrap();
            assert_eq!(loaded.len(), 2, "{}", ext);
            assert_eq!(loaded.point(1), [3.0, 4.0, 5.0], "{}", ext);
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = read_cloud("/nonexistent/dir/cloud.pcd").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
