//! Plain-text point lists: one point per line, whitespace separated.
//!
//! | layout   | columns                  |
//! |----------|--------------------------|
//! | `xyz`    | `x y z`                  |
//! | `xyzn`   | `x y z nx ny nz`         |
//! | `xyzrgb` | `x y z r g b`, `r g b` in `[0, 1]` |
//!
//! Blank lines and lines starting with `#` are skipped. Extra trailing
//! columns are ignored.

use denoise_core::{Colors, Normals, PointCloud};
use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XyzLayout {
    Xyz,
    Xyzn,
    Xyzrgb,
}

impl XyzLayout {
    fn columns(self) -> usize {
        match self {
            XyzLayout::Xyz => 3,
            XyzLayout::Xyzn | XyzLayout::Xyzrgb => 6,
        }
    }
}

fn unit_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub fn read_xyz(path: impl AsRef<Path>, layout: XyzLayout) -> io::Result<PointCloud> {
    let text = fs::read_to_string(path)?;
    let wanted = layout.columns();

    let mut cols: Vec<Vec<f32>> = vec![Vec::new(); wanted];
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        for col in cols.iter_mut() {
            let token = parts.next().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: expected {} columns", lineno + 1, wanted),
                )
            })?;
            let v = token.parse::<f32>().map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: failed to parse {:?}: {}", lineno + 1, token, e),
                )
            })?;
            col.push(v);
        }
    }

    let mut cols = cols.into_iter();
    let mut next = || cols.next().unwrap_or_default();
    let mut cloud = PointCloud::from_xyz(next(), next(), next());
    match layout {
        XyzLayout::Xyz => {}
        XyzLayout::Xyzn => {
            cloud.normals = Some(Normals {
                nx: next(),
                ny: next(),
                nz: next(),
            });
        }
        XyzLayout::Xyzrgb => {
            let mut channel = || next().into_iter().map(unit_to_byte).collect();
            cloud.colors = Some(Colors {
                r: channel(),
                g: channel(),
                b: channel(),
            });
        }
    }
    Ok(cloud)
}

/// Write `cloud` in `layout`. Attributes the layout asks for but the cloud
/// lacks are written as zeros.
pub fn write_xyz(path: impl AsRef<Path>, cloud: &PointCloud, layout: XyzLayout) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);

    for i in 0..cloud.len() {
        write!(w, "{} {} {}", cloud.x[i], cloud.y[i], cloud.z[i])?;
        match layout {
            XyzLayout::Xyz => {}
            XyzLayout::Xyzn => match cloud.normals {
                Some(ref n) => write!(w, " {} {} {}", n.nx[i], n.ny[i], n.nz[i])?,
                None => w.write_all(b" 0 0 0")?,
            },
            XyzLayout::Xyzrgb => match cloud.colors {
                Some(ref c) => {
                    let unit = |v: u8| v as f32 / 255.0;
                    write!(w, " {} {} {}", unit(c.r[i]), unit(c.g[i]), unit(c.b[i]))?
                }
                None => w.write_all(b" 0 0 0")?,
            },
        }
        w.write_all(b"\n")?;
    }

    w.flush()
}
