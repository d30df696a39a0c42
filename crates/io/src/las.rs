use denoise_core::{Colors, PointCloud};
use las::point::Format;
use las::{Builder, Color, Reader, Transform, Vector, Writer};
use std::io;
use std::path::Path;

/// Coordinate resolution used when writing: millimetres for metric data.
const SCALE: f64 = 0.001;

fn las_error(context: &str, e: las::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("{}: {}", context, e))
}

/// Read a LAS file.
///
/// Intensity is kept when at least one point has a non-zero value. Colors
/// are kept when the point format carries them; 16-bit values are reduced
/// to 8 bits unless every channel already fits in a byte.
pub fn read_las(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let mut reader = Reader::from_path(path.as_ref())
        .map_err(|e| io::Error::other(format!("failed to open LAS file: {}", e)))?;
    let has_color = reader.header().point_format().has_color;

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut z = Vec::new();
    let mut intensity = Vec::new();
    let mut has_nonzero_intensity = false;
    let mut rgb16: Vec<[u16; 3]> = Vec::new();

    for point_result in reader.points() {
        let point = point_result.map_err(|e| las_error("failed to read LAS point", e))?;
        x.push(point.x as f32);
        y.push(point.y as f32);
        z.push(point.z as f32);
        if point.intensity != 0 {
            has_nonzero_intensity = true;
        }
        intensity.push(point.intensity as f32);
        if has_color {
            let c = point.color.unwrap_or_default();
            rgb16.push([c.red, c.green, c.blue]);
        }
    }

    let mut cloud = PointCloud::from_xyz(x, y, z);
    if has_nonzero_intensity {
        cloud.intensity = Some(intensity);
    }
    if has_color {
        let shift = if rgb16.iter().flatten().any(|&v| v > 255) { 8 } else { 0 };
        let channel = |k: usize| rgb16.iter().map(|c| (c[k] >> shift) as u8).collect();
        cloud.colors = Some(Colors {
            r: channel(0),
            g: channel(1),
            b: channel(2),
        });
    }

    log::trace!(
        "read {} LAS points (color: {}, intensity: {})",
        cloud.len(),
        has_color,
        has_nonzero_intensity
    );
    Ok(cloud)
}

/// Write a LAS 1.2 file.
///
/// Point format 0 is used, or format 2 when the cloud has colors (8-bit
/// channels are widened to 16 bits). Coordinates are stored at millimetre
/// resolution relative to the cloud's minimum corner. Intensity is rounded
/// and clamped to `u16`.
///
/// Non-finite coordinates cannot be represented and yield `InvalidData`.
pub fn write_las(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    if let Some(i) = (0..cloud.len()).find(|&i| !cloud.is_finite_at(i)) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("point {} has a non-finite coordinate; LAS cannot store it", i),
        ));
    }

    let aabb = cloud.aabb();
    let offset = |axis: usize| {
        if aabb.is_empty() {
            0.0
        } else {
            (aabb.min[axis] as f64).floor()
        }
    };

    let mut builder = Builder::from((1, 2));
    let format = if cloud.colors.is_some() { 2 } else { 0 };
    builder.point_format = Format::new(format).map_err(|e| las_error("bad point format", e))?;
    builder.transforms = Vector {
        x: Transform { scale: SCALE, offset: offset(0) },
        y: Transform { scale: SCALE, offset: offset(1) },
        z: Transform { scale: SCALE, offset: offset(2) },
    };
    let header = builder
        .into_header()
        .map_err(|e| las_error("failed to build LAS header", e))?;

    let mut writer = Writer::from_path(path.as_ref(), header)
        .map_err(|e| io::Error::other(format!("failed to create LAS file: {}", e)))?;

    for i in 0..cloud.len() {
        let [px, py, pz] = cloud.point(i);
        let mut point = las::Point {
            x: px as f64,
            y: py as f64,
            z: pz as f64,
            ..Default::default()
        };
        if let Some(ref intensity) = cloud.intensity {
            point.intensity = intensity[i].round().clamp(0.0, u16::MAX as f32) as u16;
        }
        if let Some(ref colors) = cloud.colors {
            let widen = |v: u8| v as u16 * 257;
            point.color = Some(Color::new(
                widen(colors.r[i]),
                widen(colors.g[i]),
                widen(colors.b[i]),
            ));
        }
        writer
            .write_point(point)
            .map_err(|e| las_error("failed to write LAS point", e))?;
    }

    writer
        .close()
        .map_err(|e| io::Error::other(format!("failed to finish LAS file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn las_read_nonexistent() {
        let result = read_las("/tmp/nonexistent_file_that_does_not_exist_12345.las");
        assert!(result.is_err());
    }

    #[test]
    fn las_reads_points_written_by_las_crate() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path();

        let mut builder = Builder::from((1, 2));
        builder.point_format = Format::new(0).unwrap();
        let header = builder.into_header().unwrap();
        let mut writer = Writer::from_path(path, header).unwrap();
        for (xyz, intensity) in [([1.0, 2.0, 3.0], 100), ([4.0, 5.0, 6.0], 200)] {
            writer
                .write_point(las::Point {
                    x: xyz[0],
                    y: xyz[1],
                    z: xyz[2],
                    intensity,
                    ..Default::default()
                })
                .unwrap();
        }
        writer.close().unwrap();

        let cloud = read_las(path).unwrap();
        assert_eq!(cloud.len(), 2);
        assert!((cloud.x[0] - 1.0).abs() < 0.01);
        assert!((cloud.y[0] - 2.0).abs() < 0.01);
        assert!((cloud.z[0] - 3.0).abs() < 0.01);
        assert!((cloud.x[1] - 4.0).abs() < 0.01);
        assert_eq!(cloud.intensity.as_deref(), Some(&[100.0, 200.0][..]));
        assert!(cloud.colors.is_none());
    }

    #[test]
    fn las_roundtrip_keeps_colors_and_intensity() {
        let cloud = PointCloud::from_xyz(
            vec![1000.125, -3.5, 0.0],
            vec![20.0, 21.25, 22.5],
            vec![-1.0, 0.0, 1.0],
        )
        .with_colors(Colors {
            r: vec![255, 0, 10],
            g: vec![0, 128, 20],
            b: vec![1, 2, 30],
        })
        .with_intensity(vec![0.0, 12.0, 65535.0]);

        let tmp = NamedTempFile::new().unwrap();
        write_las(tmp.path(), &cloud).unwrap();
        let loaded = read_las(tmp.path()).unwrap();

        assert_eq!(loaded.len(), 3);
        for i in 0..3 {
            let (a, b) = (loaded.point(i), cloud.point(i));
            for k in 0..3 {
                assert!((a[k] - b[k]).abs() <= 0.001, "{:?} vs {:?}", a, b);
            }
        }
        assert_eq!(loaded.colors, cloud.colors);
        assert_eq!(loaded.intensity, cloud.intensity);
    }

    #[test]
    fn las_without_attributes_uses_format_zero() {
        let cloud = PointCloud::from_points(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let tmp = NamedTempFile::new().unwrap();
        write_las(tmp.path(), &cloud).unwrap();

        let reader = Reader::from_path(tmp.path()).unwrap();
        assert_eq!(reader.header().point_format().to_u8().unwrap(), 0);
        assert_eq!(reader.header().number_of_points(), 2);

        let loaded = read_las(tmp.path()).unwrap();
        assert!(loaded.colors.is_none());
        assert!(loaded.intensity.is_none());
    }

    #[test]
    fn las_empty_cloud() {
        let tmp = NamedTempFile::new().unwrap();
        write_las(tmp.path(), &PointCloud::new()).unwrap();
        assert!(read_las(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn las_rejects_non_finite() {
        let cloud = PointCloud::from_points(&[[0.0, f32::NAN, 0.0]]);
        let tmp = NamedTempFile::new().unwrap();
        let err = write_las(tmp.path(), &cloud).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
