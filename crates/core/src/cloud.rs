use crate::Aabb;

/// A point cloud stored as parallel columns.
///
/// Optional attribute columns, when present, always have the same length as
/// the coordinate columns. Every operation that reorders or subsets points
/// carries the attributes along.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
    pub normals: Option<Normals>,
    pub colors: Option<Colors>,
    pub intensity: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normals {
    pub nx: Vec<f32>,
    pub ny: Vec<f32>,
    pub nz: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub r: Vec<u8>,
    pub g: Vec<u8>,
    pub b: Vec<u8>,
}

fn gather<T: Copy>(column: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| column[i]).collect()
}

impl Normals {
    pub fn len(&self) -> usize {
        self.nx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nx.is_empty()
    }

    fn gather(&self, indices: &[usize]) -> Self {
        Self {
            nx: gather(&self.nx, indices),
            ny: gather(&self.ny, indices),
            nz: gather(&self.nz, indices),
        }
    }
}

impl Colors {
    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    fn gather(&self, indices: &[usize]) -> Self {
        Self {
            r: gather(&self.r, indices),
            g: gather(&self.g, indices),
            b: gather(&self.b, indices),
        }
    }
}

impl PointCloud {
    pub fn new() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            normals: None,
            colors: None,
            intensity: None,
        }
    }

    pub fn from_xyz(x: Vec<f32>, y: Vec<f32>, z: Vec<f32>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        assert_eq!(x.len(), z.len(), "x and z must have same length");

        Self {
            x,
            y,
            z,
            normals: None,
            colors: None,
            intensity: None,
        }
    }

    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let mut x = Vec::with_capacity(points.len());
        let mut y = Vec::with_capacity(points.len());
        let mut z = Vec::with_capacity(points.len());
        for p in points {
            x.push(p[0]);
            y.push(p[1]);
            z.push(p[2]);
        }
        Self::from_xyz(x, y, z)
    }

    /// Attach a normal column.
    ///
    /// # Panics
    ///
    /// Panics if the column length differs from the number of points.
    pub fn with_normals(mut self, normals: Normals) -> Self {
        assert_eq!(normals.nx.len(), self.len(), "normals length mismatch");
        assert_eq!(normals.ny.len(), self.len(), "normals length mismatch");
        assert_eq!(normals.nz.len(), self.len(), "normals length mismatch");
        self.normals = Some(normals);
        self
    }

    /// Attach a color column.
    ///
    /// # Panics
    ///
    /// Panics if the column length differs from the number of points.
    pub fn with_colors(mut self, colors: Colors) -> Self {
        assert_eq!(colors.r.len(), self.len(), "colors length mismatch");
        assert_eq!(colors.g.len(), self.len(), "colors length mismatch");
        assert_eq!(colors.b.len(), self.len(), "colors length mismatch");
        self.colors = Some(colors);
        self
    }

    /// Attach an intensity column.
    ///
    /// # Panics
    ///
    /// Panics if the column length differs from the number of points.
    pub fn with_intensity(mut self, intensity: Vec<f32>) -> Self {
        assert_eq!(intensity.len(), self.len(), "intensity length mismatch");
        self.intensity = Some(intensity);
        self
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        debug_assert_eq!(self.x.len(), self.z.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_xyz(&self.x, &self.y, &self.z)
    }

    pub fn point(&self, i: usize) -> [f32; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    /// True when all three coordinates of point `i` are finite.
    pub fn is_finite_at(&self, i: usize) -> bool {
        self.x[i].is_finite() && self.y[i].is_finite() && self.z[i].is_finite()
    }

    pub fn iter_points(&self) -> impl Iterator<Item = [f32; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((x, y), z)| [*x, *y, *z])
    }

    /// Gather the points at `indices`, in the order given, with all attributes.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Self {
        let n = self.len();
        assert!(
            indices.iter().all(|&i| i < n),
            "select index out of bounds for a cloud of {} points",
            n
        );

        Self {
            x: gather(&self.x, indices),
            y: gather(&self.y, indices),
            z: gather(&self.z, indices),
            normals: self.normals.as_ref().map(|nr| nr.gather(indices)),
            colors: self.colors.as_ref().map(|c| c.gather(indices)),
            intensity: self.intensity.as_deref().map(|it| gather(it, indices)),
        }
    }

    /// The complement of [`select`](Self::select): every point whose index
    /// is not listed, in original order. Repeated indices are harmless.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn select_inverse(&self, indices: &[usize]) -> Self {
        let n = self.len();
        let mut keep = vec![true; n];
        for &i in indices {
            assert!(i < n, "select_inverse index {} out of bounds ({} points)", i, n);
            keep[i] = false;
        }
        let rest: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.select(&rest)
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}
