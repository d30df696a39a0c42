use denoise_core::{Colors, Normals, PointCloud};
use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;

/// Reads a PCD file (`DATA ascii` or `DATA binary`).
///
/// Coordinates are taken from the `x y z` fields. Colors are read from a
/// packed `rgb`/`rgba` field, normals from `normal_x normal_y normal_z`, and
/// `intensity` when present. Any scalar type PCL writes (F4, F8, I1-I8,
/// U1-U8) is accepted; other fields are skipped.
pub fn read_pcd(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let raw = fs::read(path)?;
    let header = parse_header(&raw)?;
    let body = &raw[header.data_offset..];
    log::trace!(
        "PCD header: {} points, {:?} data, fields {:?}",
        header.points,
        header.data,
        header.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>()
    );

    let mut columns = Columns::new(&header, body_capacity(&header, body.len()))?;
    match header.data {
        DataFormat::Ascii => read_ascii_body(body, &header, &mut columns)?,
        DataFormat::Binary => read_binary_body(body, &header, &mut columns)?,
    }
    Ok(columns.into_cloud())
}

/// Writes a PCD file in ASCII format.
pub fn write_pcd(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let mut out = String::new();
    out.push_str(&write_header(cloud, "ascii"));

    for i in 0..cloud.len() {
        out.push_str(&format!("{} {} {}", cloud.x[i], cloud.y[i], cloud.z[i]));
        if let Some(ref normals) = cloud.normals {
            out.push_str(&format!(
                " {} {} {}",
                normals.nx[i], normals.ny[i], normals.nz[i]
            ));
        }
        if let Some(ref colors) = cloud.colors {
            out.push_str(&format!(" {}", pack_rgb(colors, i)));
        }
        if let Some(ref intensity) = cloud.intensity {
            out.push_str(&format!(" {}", intensity[i]));
        }
        out.push('\n');
    }

    fs::write(path, out)
}

/// Writes a PCD file in binary format.
pub fn write_pcd_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    w.write_all(write_header(cloud, "binary").as_bytes())?;

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
            w.write_all(&pack_rgb(colors, i).to_le_bytes())?;
        }
        if let Some(ref intensity) = cloud.intensity {
            w.write_all(&intensity[i].to_le_bytes())?;
        }
    }

    w.flush()
}

// --- Header ---

#[derive(Debug, Clone, Copy, PartialEq)]
enum DataFormat {
    Ascii,
    Binary,
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    size: usize,
    kind: char,
    count: usize,
    /// Byte offset inside a binary record.
    offset: usize,
    /// Token offset inside an ASCII row.
    column: usize,
}

#[derive(Debug)]
struct Header {
    fields: Vec<Field>,
    points: usize,
    data: DataFormat,
    stride: usize,
    data_offset: usize,
}

impl Header {
    fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name && f.count >= 1)
    }

    fn columns(&self) -> usize {
        self.fields.iter().map(|f| f.count).sum()
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn parse_numbers<T: std::str::FromStr>(keyword: &str, parts: &[&str]) -> io::Result<Vec<T>>
where
    T::Err: std::fmt::Display,
{
    parts
        .iter()
        .map(|p| {
            p.parse::<T>()
                .map_err(|e| invalid(format!("invalid {} value {:?}: {}", keyword, p, e)))
        })
        .collect()
}

fn parse_header(raw: &[u8]) -> io::Result<Header> {
    let mut names: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut kinds: Vec<char> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut width: Option<usize> = None;
    let mut height: usize = 1;
    let mut points: Option<usize> = None;

    let mut pos = 0;
    while pos < raw.len() {
        let end = raw[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|off| pos + off + 1)
            .unwrap_or(raw.len());
        let line = std::str::from_utf8(&raw[pos..end])
            .map_err(|_| invalid("PCD header is not valid UTF-8"))?
            .trim();
        pos = end;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let values = &parts[1..];
        match parts[0].to_ascii_uppercase().as_str() {
            "FIELDS" => names = values.iter().map(|s| s.to_string()).collect(),
            "SIZE" => sizes = parse_numbers("SIZE", values)?,
            "TYPE" => {
                kinds = values
                    .iter()
                    .map(|t| t.chars().next().unwrap_or('F').to_ascii_uppercase())
                    .collect()
            }
            "COUNT" => counts = parse_numbers("COUNT", values)?,
            "WIDTH" => width = parse_numbers("WIDTH", values)?.first().copied(),
            "HEIGHT" => {
                height = parse_numbers("HEIGHT", values)?.first().copied().unwrap_or(1)
            }
            "POINTS" => points = parse_numbers("POINTS", values)?.first().copied(),
            "DATA" => {
                let data = match values.first().map(|v| v.to_ascii_lowercase()).as_deref() {
                    Some("ascii") => DataFormat::Ascii,
                    Some("binary") => DataFormat::Binary,
                    Some(other) => {
                        return Err(io::Error::new(
                            io::ErrorKind::Unsupported,
                            format!("unsupported PCD DATA format: {}", other),
                        ))
                    }
                    None => return Err(invalid("PCD DATA line has no format")),
                };
                let points = match (points, width) {
                    (Some(points), _) => points,
                    (None, Some(width)) => width
                        .checked_mul(height)
                        .ok_or_else(|| invalid("PCD WIDTH x HEIGHT overflows"))?,
                    (None, None) => return Err(invalid("PCD file missing POINTS/WIDTH header")),
                };
                return build_header(names, sizes, kinds, counts, points, data, pos);
            }
            _ => {}
        }
    }

    Err(invalid("PCD file missing DATA line"))
}

fn build_header(
    names: Vec<String>,
    mut sizes: Vec<usize>,
    mut kinds: Vec<char>,
    mut counts: Vec<usize>,
    points: usize,
    data: DataFormat,
    data_offset: usize,
) -> io::Result<Header> {
    if names.is_empty() {
        return Err(invalid("PCD file missing FIELDS header"));
    }
    // Absent or mismatched SIZE/TYPE/COUNT fall back to single f32 fields.
    if sizes.len() != names.len() {
        sizes = vec![4; names.len()];
    }
    if kinds.len() != names.len() {
        kinds = vec!['F'; names.len()];
    }
    if counts.len() != names.len() {
        counts = vec![1; names.len()];
    }

    let mut fields = Vec::with_capacity(names.len());
    let mut offset = 0;
    let mut column = 0;
    for (i, name) in names.into_iter().enumerate() {
        let field = Field {
            name,
            size: sizes[i],
            kind: kinds[i],
            count: counts[i],
            offset,
            column,
        };
        offset = field
            .size
            .checked_mul(field.count)
            .and_then(|bytes| offset.checked_add(bytes))
            .ok_or_else(|| invalid(format!("PCD field {} is too large", field.name)))?;
        column = column
            .checked_add(field.count)
            .ok_or_else(|| invalid(format!("PCD field {} has too many values", field.name)))?;
        fields.push(field);
    }

    Ok(Header {
        fields,
        points,
        data,
        stride: offset,
        data_offset,
    })
}

fn write_header(cloud: &PointCloud, data: &str) -> String {
    let mut fields = vec!["x", "y", "z"];
    let mut sizes = vec!["4"; 3];
    let mut types = vec!["F"; 3];
    if cloud.normals.is_some() {
        fields.extend(["normal_x", "normal_y", "normal_z"]);
        sizes.extend(["4"; 3]);
        types.extend(["F"; 3]);
    }
    if cloud.colors.is_some() {
        fields.push("rgb");
        sizes.push("4");
        types.push("U");
    }
    if cloud.intensity.is_some() {
        fields.push("intensity");
        sizes.push("4");
        types.push("F");
    }

    let mut out = String::new();
    out.push_str("# .PCD v0.7 - Point Cloud Data file format\n");
    out.push_str("VERSION 0.7\n");
    out.push_str(&format!("FIELDS {}\n", fields.join(" ")));
    out.push_str(&format!("SIZE {}\n", sizes.join(" ")));
    out.push_str(&format!("TYPE {}\n", types.join(" ")));
    out.push_str(&format!("COUNT {}\n", vec!["1"; fields.len()].join(" ")));
    out.push_str(&format!("WIDTH {}\n", cloud.len()));
    out.push_str("HEIGHT 1\n");
    out.push_str("VIEWPOINT 0 0 0 1 0 0 0\n");
    out.push_str(&format!("POINTS {}\n", cloud.len()));
    out.push_str(&format!("DATA {}\n", data));
    out
}

// --- Body ---

fn pack_rgb(colors: &Colors, i: usize) -> u32 {
    (u32::from(colors.r[i]) << 16) | (u32::from(colors.g[i]) << 8) | u32::from(colors.b[i])
}

/// Field positions for the attributes we extract, plus their output columns.
struct Columns {
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    normals: Option<(Field, Field, Field, Normals)>,
    colors: Option<(Field, Colors)>,
    intensity: Option<(Field, Vec<f32>)>,
    xyz: (Field, Field, Field),
}

/// Rows worth reserving up front. The header's point count is only trusted
/// as far as the body could actually hold it.
fn body_capacity(header: &Header, body_len: usize) -> usize {
    let max_rows = match header.data {
        // Shortest possible ASCII row is one digit and a newline.
        DataFormat::Ascii => body_len / 2,
        DataFormat::Binary => body_len / header.stride.max(1),
    };
    header.points.min(max_rows)
}

impl Columns {
    fn new(header: &Header, n: usize) -> io::Result<Self> {
        let get = |name: &str| header.field(name).cloned();

        let xyz = match (get("x"), get("y"), get("z")) {
            (Some(fx), Some(fy), Some(fz)) => (fx, fy, fz),
            _ => return Err(invalid("PCD file missing x, y, z fields")),
        };

        let normals = match (get("normal_x"), get("normal_y"), get("normal_z")) {
            (Some(fx), Some(fy), Some(fz)) => Some((
                fx,
                fy,
                fz,
                Normals {
                    nx: Vec::with_capacity(n),
                    ny: Vec::with_capacity(n),
                    nz: Vec::with_capacity(n),
                },
            )),
            _ => None,
        };
        let colors = get("rgb").or_else(|| get("rgba")).map(|f| {
            (
                f,
                Colors {
                    r: Vec::with_capacity(n),
                    g: Vec::with_capacity(n),
                    b: Vec::with_capacity(n),
                },
            )
        });
        let intensity = get("intensity").map(|f| (f, Vec::with_capacity(n)));

        Ok(Self {
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
            normals,
            colors,
            intensity,
            xyz,
        })
    }

    /// Append one point, reading scalars through `scalar` and packed colors
    /// through `packed`.
    fn push(
        &mut self,
        scalar: impl Fn(&Field) -> io::Result<f64>,
        packed: impl Fn(&Field) -> io::Result<u32>,
    ) -> io::Result<()> {
        self.x.push(scalar(&self.xyz.0)? as f32);
        self.y.push(scalar(&self.xyz.1)? as f32);
        self.z.push(scalar(&self.xyz.2)? as f32);
        if let Some((fx, fy, fz, normals)) = self.normals.as_mut() {
            normals.nx.push(scalar(fx)? as f32);
            normals.ny.push(scalar(fy)? as f32);
            normals.nz.push(scalar(fz)? as f32);
        }
        if let Some((field, colors)) = self.colors.as_mut() {
            let rgb = packed(field)?;
            colors.r.push((rgb >> 16) as u8);
            colors.g.push((rgb >> 8) as u8);
            colors.b.push(rgb as u8);
        }
        if let Some((field, intensity)) = self.intensity.as_mut() {
            intensity.push(scalar(field)? as f32);
        }
        Ok(())
    }

    fn into_cloud(self) -> PointCloud {
        let mut cloud = PointCloud::from_xyz(self.x, self.y, self.z);
        cloud.normals = self.normals.map(|(_, _, _, n)| n);
        cloud.colors = self.colors.map(|(_, c)| c);
        cloud.intensity = self.intensity.map(|(_, i)| i);
        cloud
    }
}

fn read_ascii_body(body: &[u8], header: &Header, columns: &mut Columns) -> io::Result<()> {
    let text = std::str::from_utf8(body)
        .map_err(|e| invalid(format!("invalid UTF-8 in ASCII PCD body: {}", e)))?;
    let width = header.columns();

    let mut rows = 0;
    for line in text.lines() {
        if rows == header.points {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < width {
            return Err(invalid(format!(
                "PCD row {} has {} values, expected {}",
                rows,
                parts.len(),
                width
            )));
        }

        let token = |f: &Field| parts[f.column];
        columns.push(
            |f| {
                let t = token(f);
                // Parse single-precision fields directly so values written
                // with `{}` come back bit-exact.
                let parsed = if f.kind == 'F' && f.size == 4 {
                    t.parse::<f32>().map(f64::from).map_err(|e| e.to_string())
                } else {
                    t.parse::<f64>().map_err(|e| e.to_string())
                };
                parsed.map_err(|e| invalid(format!("invalid {} value {:?}: {}", f.name, t, e)))
            },
            |f| {
                // PCL writes packed colors as a float reinterpretation of the
                // integer when the field type is F.
                let t = token(f);
                let parsed = if f.kind == 'F' {
                    t.parse::<f32>().map(f32::to_bits).ok()
                } else {
                    t.parse::<u32>().ok()
                };
                parsed.ok_or_else(|| invalid(format!("invalid {} value {:?}", f.name, t)))
            },
        )?;
        rows += 1;
    }

    if rows < header.points {
        return Err(invalid(format!(
            "ASCII PCD has {} rows, header declares {}",
            rows, header.points
        )));
    }
    Ok(())
}

fn read_binary_body(body: &[u8], header: &Header, columns: &mut Columns) -> io::Result<()> {
    if header.points > 0 && header.stride == 0 {
        return Err(invalid("binary PCD fields have zero size"));
    }
    let expected = header.points.checked_mul(header.stride).unwrap_or(usize::MAX);
    if body.len() < expected {
        return Err(invalid(format!(
            "binary PCD data too short: have {} bytes, expected {} ({} points x {} bytes)",
            body.len(),
            expected,
            header.points,
            header.stride
        )));
    }

    for record in body[..expected].chunks_exact(header.stride.max(1)) {
        columns.push(
            |f| read_scalar(&record[f.offset..f.offset + f.size], f.kind),
            |f| {
                let bytes = &record[f.offset..f.offset + f.size];
                match bytes {
                    [a, b, c, d] => Ok(u32::from_le_bytes([*a, *b, *c, *d])),
                    _ => Err(invalid(format!("{} field must be 4 bytes", f.name))),
                }
            },
        )?;
    }
    Ok(())
}

fn read_scalar(bytes: &[u8], kind: char) -> io::Result<f64> {
    let value = match (kind, bytes.len()) {
        ('F', 4) => f32::from_le_bytes(le_array(bytes)) as f64,
        ('F', 8) => f64::from_le_bytes(le_array(bytes)),
        ('I', 1) => i8::from_le_bytes(le_array(bytes)) as f64,
        ('I', 2) => i16::from_le_bytes(le_array(bytes)) as f64,
        ('I', 4) => i32::from_le_bytes(le_array(bytes)) as f64,
        ('I', 8) => i64::from_le_bytes(le_array(bytes)) as f64,
        ('U', 1) => bytes[0] as f64,
        ('U', 2) => u16::from_le_bytes(le_array(bytes)) as f64,
        ('U', 4) => u32::from_le_bytes(le_array(bytes)) as f64,
        ('U', 8) => u64::from_le_bytes(le_array(bytes)) as f64,
        (kind, size) => {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported PCD field type {}{}", kind, size),
            ))
        }
    };
    Ok(value)
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::NamedTempFile;

    fn attributed_cloud() -> PointCloud {
        PointCloud::from_xyz(vec![1.5, -2.5], vec![4.0, 5.25], vec![7.0, 9.125])
            .with_normals(Normals {
                nx: vec![0.0, 1.0],
                ny: vec![1.0, 0.0],
                nz: vec![0.0, 0.0],
            })
            .with_colors(Colors {
                r: vec![255, 1],
                g: vec![0, 2],
                b: vec![128, 3],
            })
            .with_intensity(vec![10.0, 20.5])
    }

    #[test]
    fn pcd_roundtrip() {
        let cloud = PointCloud::from_xyz(
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        );
        let tmp = NamedTempFile::new().unwrap();
        write_pcd(tmp.path(), &cloud).unwrap();
        let loaded = read_pcd(tmp.path()).unwrap();
        assert_eq!(loaded, cloud);
    }

    #[test]
    fn pcd_empty_cloud() {
        let tmp = NamedTempFile::new().unwrap();
        write_pcd(tmp.path(), &PointCloud::new()).unwrap();
        assert!(read_pcd(tmp.path()).unwrap().is_empty());
        write_pcd_binary(tmp.path(), &PointCloud::new()).unwrap();
        assert!(read_pcd(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn pcd_attributes_survive_both_encodings() {
        let cloud = attributed_cloud();
        let tmp = NamedTempFile::new().unwrap();

        write_pcd(tmp.path(), &cloud).unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap(), cloud);

        write_pcd_binary(tmp.path(), &cloud).unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap(), cloud);
    }

    #[test]
    fn pcd_binary_with_mixed_types_and_padding() {
        // x y z as f64, a 2-wide padding field, packed rgb as F4, label as U2.
        let mut raw = Vec::new();
        raw.extend_from_slice(
            b"VERSION 0.7\nFIELDS x y z _ rgb label\nSIZE 8 8 8 1 4 2\nTYPE F F F U F U\n\
              COUNT 1 1 1 2 1 1\nWIDTH 2\nHEIGHT 1\nPOINTS 2\nDATA binary\n",
        );
        let records = [
            ([1.0f64, 2.0, 3.0], 0x00ff_8000u32, 7u16),
            ([-1.0, 0.5, 0.25], 0x0000_00ff, 9),
        ];
        for (p, rgb, label) in records {
            for v in p {
                raw.extend_from_slice(&v.to_le_bytes());
            }
            raw.extend_from_slice(&[0xaa, 0xbb]);
            raw.extend_from_slice(&rgb.to_le_bytes());
            raw.extend_from_slice(&label.to_le_bytes());
        }
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), raw).unwrap();

        let cloud = read_pcd(tmp.path()).unwrap();
        assert_eq!(cloud.point(0), [1.0, 2.0, 3.0]);
        assert_eq!(cloud.point(1), [-1.0, 0.5, 0.25]);
        let colors = cloud.colors.as_ref().unwrap();
        assert_eq!(colors.r, vec![255, 0]);
        assert_eq!(colors.g, vec![128, 0]);
        assert_eq!(colors.b, vec![0, 255]);
    }

    #[test]
    fn pcd_ascii_with_float_packed_rgb() {
        let packed = f32::from_bits(0x0010_2030);
        let text = format!(
            "FIELDS x y z rgb\nSIZE 4 4 4 4\nTYPE F F F F\nCOUNT 1 1 1 1\nPOINTS 1\nDATA ascii\n1 2 3 {:e}\n",
            packed
        );
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), text).unwrap();
        let cloud = read_pcd(tmp.path()).unwrap();
        let colors = cloud.colors.unwrap();
        assert_eq!((colors.r[0], colors.g[0], colors.b[0]), (0x10, 0x20, 0x30));
    }

    #[test]
    fn pcd_points_falls_back_to_width_times_height() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(
            tmp.path(),
            "FIELDS x y z\nWIDTH 2\nHEIGHT 2\nDATA ascii\n0 0 0\n1 1 1\n2 2 2\n3 3 3\n",
        )
        .unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap().len(), 4);
    }

    #[test]
    fn pcd_rejects_compressed_data() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "FIELDS x y z\nPOINTS 1\nDATA binary_compressed\n").unwrap();
        let err = read_pcd(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn pcd_rejects_missing_xyz() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "FIELDS a b c\nPOINTS 1\nDATA ascii\n1 2 3\n").unwrap();
        let err = read_pcd(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn pcd_rejects_truncated_body() {
        let cloud = PointCloud::from_xyz(vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]);
        let tmp = NamedTempFile::new().unwrap();
        write_pcd_binary(tmp.path(), &cloud).unwrap();
        let mut raw = fs::read(tmp.path()).unwrap();
        raw.truncate(raw.len() - 3);
        fs::write(tmp.path(), raw).unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap_err().kind(), io::ErrorKind::InvalidData);

        fs::write(tmp.path(), "FIELDS x y z\nPOINTS 3\nDATA ascii\n1 2 3\n").unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn pcd_huge_point_count_with_tiny_body() {
        let tmp = NamedTempFile::new().unwrap();
        let mut raw = b"FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 1\n\
                        POINTS 4611686018427387904\nDATA binary\n"
            .to_vec();
        raw.extend_from_slice(&[0u8; 4]);
        fs::write(tmp.path(), raw).unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap_err().kind(), io::ErrorKind::InvalidData);

        fs::write(tmp.path(), "FIELDS x y z\nPOINTS 4000000000000\nDATA ascii\n1 2 3\n").unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn pcd_width_times_height_overflow() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(
            tmp.path(),
            "FIELDS x y z\nWIDTH 18446744073709551615\nHEIGHT 2\nDATA binary\n",
        )
        .unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn pcd_oversized_field_declaration() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(
            tmp.path(),
            "FIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 18446744073709551615\n\
             POINTS 1\nDATA binary\n",
        )
        .unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn pcd_missing_data_line() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "FIELDS x y z\nPOINTS 0\n").unwrap();
        assert_eq!(read_pcd(tmp.path()).unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    proptest! {
        #[test]
        fn pcd_binary_roundtrip_is_bit_exact(
            pts in prop::collection::vec(
                (-1000.0f32..1000.0f32, -1000.0f32..1000.0f32, -1000.0f32..1000.0f32),
                0..200
            )
        ) {
            let points: Vec<[f32; 3]> = pts.iter().map(|p| [p.0, p.1, p.2]).collect();
            let cloud = PointCloud::from_points(&points);

            let tmp = NamedTempFile::new().unwrap();
            write_pcd_binary(tmp.path(), &cloud).unwrap();
            let loaded = read_pcd(tmp.path()).unwrap();

            prop_assert_eq!(loaded.len(), cloud.len());
            for i in 0..cloud.len() {
                prop_assert_eq!(loaded.x[i].to_bits(), cloud.x[i].to_bits());
                prop_assert_eq!(loaded.y[i].to_bits(), cloud.y[i].to_bits());
                prop_assert_eq!(loaded.z[i].to_bits(), cloud.z[i].to_bits());
            }
        }
    }
}
