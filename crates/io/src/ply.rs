use denoise_core::{Colors, Normals, PointCloud};
use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
}

/// Property type as declared in the PLY header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropType {
    Char,
    Uchar,
    Short,
    Ushort,
    Int,
    Uint,
    Float,
    Double,
}

impl PropType {
    fn parse(name: &str) -> io::Result<Self> {
        let ty = match name {
            "char" | "int8" => PropType::Char,
            "uchar" | "uint8" => PropType::Uchar,
            "short" | "int16" => PropType::Short,
            "ushort" | "uint16" => PropType::Ushort,
            "int" | "int32" => PropType::Int,
            "uint" | "uint32" => PropType::Uint,
            "float" | "float32" => PropType::Float,
            "double" | "float64" => PropType::Double,
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported property type: {}", other),
                ))
            }
        };
        Ok(ty)
    }

    fn byte_size(self) -> usize {
        match self {
            PropType::Char | PropType::Uchar => 1,
            PropType::Short | PropType::Ushort => 2,
            PropType::Int | PropType::Uint | PropType::Float => 4,
            PropType::Double => 8,
        }
    }

    fn read_le(self, b: &[u8]) -> f64 {
        match self {
            PropType::Char => b[0] as i8 as f64,
            PropType::Uchar => b[0] as f64,
            PropType::Short => i16::from_le_bytes([b[0], b[1]]) as f64,
            PropType::Ushort => u16::from_le_bytes([b[0], b[1]]) as f64,
            PropType::Int => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            PropType::Uint => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            PropType::Float => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
            PropType::Double => {
                f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
            }
        }
    }
}

/// A scalar vertex property and its byte offset inside a binary record.
#[derive(Debug, Clone)]
struct Property {
    name: String,
    ty: PropType,
    offset: usize,
}

/// Parsed header information.
struct PlyHeader {
    format: PlyFormat,
    vertex_count: usize,
    properties: Vec<Property>,
    stride: usize,
    header_end_offset: usize, // byte offset just after "end_header\n"
}

impl PlyHeader {
    fn position(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn parse_ply_header(data: &[u8]) -> io::Result<PlyHeader> {
    let end_marker = b"end_header\n";
    let header_end = find_bytes(data, end_marker)
        .ok_or_else(|| invalid("missing end_header in PLY file"))?;
    let header_end_offset = header_end + end_marker.len();

    let header_text = std::str::from_utf8(&data[..header_end])
        .map_err(|_| invalid("PLY header not valid UTF-8"))?;

    let mut format = None;
    let mut vertex_count: Option<usize> = None;
    let mut properties: Vec<Property> = Vec::new();
    let mut stride = 0;
    let mut in_vertex_element = false;
    let mut seen_ply_magic = false;

    for line in header_text.lines() {
        let line = line.trim();

        if !seen_ply_magic {
            if line == "ply" {
                seen_ply_magic = true;
                continue;
            }
            return Err(invalid("file does not start with 'ply'"));
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first().copied() {
            Some("format") => {
                format = match parts.get(1).copied() {
                    Some("ascii") => Some(PlyFormat::Ascii),
                    Some("binary_little_endian") => Some(PlyFormat::BinaryLittleEndian),
                    _ => {
                        return Err(io::Error::new(
                            io::ErrorKind::Unsupported,
                            format!("unsupported PLY format: {}", line),
                        ))
                    }
                };
            }
            Some("element") => {
                if parts.len() < 3 {
                    return Err(invalid(format!("invalid element line: {}", line)));
                }
                let count = parts[2]
                    .parse::<usize>()
                    .map_err(|e| invalid(format!("invalid element count: {}", e)))?;
                in_vertex_element = parts[1] == "vertex";
                if in_vertex_element {
                    vertex_count = Some(count);
                } else if vertex_count.is_none() && count > 0 {
                    // Records of an earlier element would sit in front of the
                    // vertices and shift every offset.
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        format!("PLY element '{}' precedes vertex data", parts[1]),
                    ));
                }
            }
            Some("property") if in_vertex_element => {
                if parts.get(1) == Some(&"list") {
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        "list properties on vertices are not supported",
                    ));
                }
                if parts.len() < 3 {
                    return Err(invalid(format!("invalid property line: {}", line)));
                }
                let ty = PropType::parse(parts[1])?;
                properties.push(Property {
                    name: parts[2].to_string(),
                    ty,
                    offset: stride,
                });
                stride += ty.byte_size();
            }
            _ => {}
        }
    }

    let format = format.ok_or_else(|| invalid("PLY format line missing"))?;

    Ok(PlyHeader {
        format,
        vertex_count: vertex_count.unwrap_or(0),
        properties,
        stride,
        header_end_offset,
    })
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read the vertices of a PLY file (ASCII or binary little endian).
///
/// `x y z` are required; `nx ny nz`, `red green blue` and `intensity` are
/// picked up when all of their components are present.
pub fn read_ply(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let data = fs::read(&path)?;
    let header = parse_ply_header(&data)?;

    let (idx_x, idx_y, idx_z) = match (
        header.position("x"),
        header.position("y"),
        header.position("z"),
    ) {
        (Some(ix), Some(iy), Some(iz)) => (ix, iy, iz),
        _ => return Err(invalid("PLY file missing required x, y, z properties")),
    };

    let normal_idx = match (
        header.position("nx"),
        header.position("ny"),
        header.position("nz"),
    ) {
        (Some(a), Some(b), Some(c)) => Some([a, b, c]),
        _ => None,
    };
    let color_idx = match (
        header.position("red"),
        header.position("green"),
        header.position("blue"),
    ) {
        (Some(a), Some(b), Some(c)) => Some([a, b, c]),
        _ => None,
    };
    let intensity_idx = header.position("intensity");

    let n = header.vertex_count;
    let body_len = data.len() - header.header_end_offset;
    // The declared count is only trusted as far as the body could hold it.
    let capacity = match header.format {
        PlyFormat::Ascii => n.min(body_len / 2),
        PlyFormat::BinaryLittleEndian => n.min(body_len / header.stride.max(1)),
    };
    let mut x = Vec::with_capacity(capacity);
    let mut y = Vec::with_capacity(capacity);
    let mut z = Vec::with_capacity(capacity);
    let mut normals: [Vec<f32>; 3] = Default::default();
    let mut colors: [Vec<u8>; 3] = Default::default();
    let mut intensity = Vec::new();

    // Pushes one vertex given a per-property value reader.
    let mut push_vertex = |value: &dyn Fn(usize) -> io::Result<f64>| -> io::Result<()> {
        x.push(value(idx_x)? as f32);
        y.push(value(idx_y)? as f32);
        z.push(value(idx_z)? as f32);
        if let Some(idx) = normal_idx {
            for (col, &i) in normals.iter_mut().zip(&idx) {
                col.push(value(i)? as f32);
            }
        }
        if let Some(idx) = color_idx {
            for (col, &i) in colors.iter_mut().zip(&idx) {
                col.push(value(i)?.clamp(0.0, 255.0) as u8);
            }
        }
        if let Some(i) = intensity_idx {
            intensity.push(value(i)? as f32);
        }
        Ok(())
    };

    match header.format {
        PlyFormat::Ascii => {
            let body = std::str::from_utf8(&data[header.header_end_offset..])
                .map_err(|_| invalid("PLY body not valid UTF-8"))?;
            let mut count = 0usize;
            for line in body.lines() {
                if count >= n {
                    break;
                }
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < header.properties.len() {
                    return Err(invalid(format!(
                        "vertex line has {} fields, expected {}",
                        parts.len(),
                        header.properties.len()
                    )));
                }

                push_vertex(&|i: usize| {
                    // Single-precision values parse as f32 so they round-trip exactly.
                    let parsed = if header.properties[i].ty == PropType::Float {
                        parts[i].parse::<f32>().map(f64::from).map_err(|e| e.to_string())
                    } else {
                        parts[i].parse::<f64>().map_err(|e| e.to_string())
                    };
                    parsed.map_err(|e| invalid(format!("failed to parse {:?}: {}", parts[i], e)))
                })?;
                count += 1;
            }
            if count < n {
                return Err(invalid(format!(
                    "PLY body has {} vertices, header declares {}",
                    count, n
                )));
            }
        }
        PlyFormat::BinaryLittleEndian => {
            let body = &data[header.header_end_offset..];
            let needed = n.checked_mul(header.stride);
            if needed.map_or(true, |needed| body.len() < needed) {
                return Err(invalid(format!(
                    "PLY binary body too short: {} vertices of {} bytes, got {} bytes",
                    n,
                    header.stride,
                    body.len()
                )));
            }

            for row in body.chunks_exact(header.stride).take(n) {
                push_vertex(&|i: usize| {
                    let prop = &header.properties[i];
                    Ok(prop.ty.read_le(&row[prop.offset..]))
                })?;
            }
        }
    }

    let mut cloud = PointCloud::from_xyz(x, y, z);
    if normal_idx.is_some() {
        let [nx, ny, nz] = normals;
        cloud.normals = Some(Normals { nx, ny, nz });
    }
    if color_idx.is_some() {
        let [r, g, b] = colors;
        cloud.colors = Some(Colors { r, g, b });
    }
    if intensity_idx.is_some() {
        cloud.intensity = Some(intensity);
    }

    Ok(cloud)
}

fn write_ply_header(w: &mut impl io::Write, cloud: &PointCloud, format: &str) -> io::Result<()> {
    w.write_all(b"ply\n")?;
    writeln!(w, "format {} 1.0", format)?;
    writeln!(w, "element vertex {}", cloud.len())?;
    w.write_all(b"property float x\nproperty float y\nproperty float z\n")?;
    if cloud.normals.is_some() {
        w.write_all(b"property float nx\nproperty float ny\nproperty float nz\n")?;
    }
    if cloud.colors.is_some() {
        w.write_all(b"property uchar red\nproperty uchar green\nproperty uchar blue\n")?;
    }
    if cloud.intensity.is_some() {
        w.write_all(b"property float intensity\n")?;
    }
    w.write_all(b"end_header\n")
}

/// Write a PLY file in ASCII format.
pub fn write_ply(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    write_ply_header(&mut w, cloud, "ascii")?;

    for i in 0..cloud.len() {
        write!(w, "{} {} {}", cloud.x[i], cloud.y[i], cloud.z[i])?;
        if let Some(ref normals) = cloud.normals {
            write!(w, " {} {} {}", normals.nx[i], normals.ny[i], normals.nz[i])?;
        }
        if let Some(ref colors) = cloud.colors {
            write!(w, " {} {} {}", colors.r[i], colors.g[i], colors.b[i])?;
        }
        if let Some(ref intensity) = cloud.intensity {
            write!(w, " {}", intensity[i])?;
        }
        w.write_all(b"\n")?;
    }

    w.flush()
}

/// Write a PLY file in binary_little_endian format.
///
/// Binary PLY is ~3-4x smaller and faster to read/write than ASCII PLY.
pub fn write_ply_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    write_ply_header(&mut w, cloud, "binary_little_endian")?;

    for i in 0..cloud.len() {
        w.write_all(&cloud.x[i].to_le_bytes())?;
        w.write_all(&cloud.y[i].to_le_bytes())?;
        w.write_all(&cloud.z[i].to_le_bytes())?;

        if let Some(ref normals) = cloud.normals {
            w.write_all(&normals.nx[i].to_le_bytes())?;
            w.write_all(&normals.ny[i].to_le_bytes())?;
            w.write_all(&normals.nz[i].to_le_bytes())?;
        }

        if let Some(ref colors) = cloud.colors {
            w.write_all(&[colors.r[i], colors.g[i], colors.b[i]])?;
        }

        if let Some(ref intensity) = cloud.intensity {
            w.write_all(&intensity[i].to_le_bytes())?;
        }
    }

    w.flush()
}
