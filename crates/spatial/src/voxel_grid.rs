use denoise_core::PointCloud;
use hashbrown::HashMap;

use crate::RadiusIndex;

type CellKey = (i64, i64, i64);

/// Uniform grid over a point cloud, hashed by integer cell coordinates.
///
/// Cells are measured from the minimum corner of the cloud's bounding box.
/// A radius query scans the block of cells that can hold a point within
/// `radius` and checks exact squared distances, so results match a brute
/// force scan. With `cell_size == radius` that block is 3x3x3.
///
/// Points with a non-finite coordinate are not binned.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    cells: HashMap<CellKey, Vec<usize>>,
    coords: Vec<[f32; 3]>,
    origin: [f32; 3],
    cell_size: f32,
}

impl VoxelGrid {
    /// Bin every finite point of `cloud` into cubic cells of side `cell_size`.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not finite and positive.
    pub fn build(cloud: &PointCloud, cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be > 0 and finite"
        );

        let aabb = cloud.aabb();
        let origin = if aabb.is_empty() { [0.0; 3] } else { aabb.min };

        let mut grid = Self {
            cells: HashMap::new(),
            coords: cloud.iter_points().collect(),
            origin,
            cell_size,
        };

        for i in 0..cloud.len() {
            if !cloud.is_finite_at(i) {
                continue;
            }
            let key = grid.cell_of(&cloud.point(i));
            grid.cells.entry(key).or_default().push(i);
        }

        grid
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, p: &[f32; 3]) -> CellKey {
        let c = |axis: usize| ((p[axis] - self.origin[axis]) / self.cell_size).floor() as i64;
        (c(0), c(1), c(2))
    }

    /// Call `visit` with every binned point within `radius` of `query`, in
    /// no particular order.
    fn for_each_within(&self, query: &[f32; 3], radius: f32, mut visit: impl FnMut(usize)) {
        if self.cells.is_empty()
            || radius <= 0.0
            || !radius.is_finite()
            || !query.iter().all(|v| v.is_finite())
        {
            return;
        }

        let radius_sq = radius * radius;
        let mut scan = |bucket: &[usize]| {
            for &i in bucket {
                let p = self.coords[i];
                let dx = p[0] - query[0];
                let dy = p[1] - query[1];
                let dz = p[2] - query[2];
                if dx * dx + dy * dy + dz * dz <= radius_sq {
                    visit(i);
                }
            }
        };

        let reach = (radius / self.cell_size).ceil() as i64;
        let (cx, cy, cz) = self.cell_of(query);

        // When the search block would touch more cells than are occupied,
        // walking the occupied cells is cheaper.
        let span = 2 * reach as u128 + 1;
        if span.saturating_mul(span).saturating_mul(span) > self.cells.len() as u128 {
            let reach = reach as u64;
            for (&(kx, ky, kz), bucket) in &self.cells {
                if kx.abs_diff(cx) <= reach && ky.abs_diff(cy) <= reach && kz.abs_diff(cz) <= reach
                {
                    scan(bucket);
                }
            }
        } else {
            for dx in -reach..=reach {
                for dy in -reach..=reach {
                    for dz in -reach..=reach {
                        let key = (
                            cx.saturating_add(dx),
                            cy.saturating_add(dy),
                            cz.saturating_add(dz),
                        );
                        if let Some(bucket) = self.cells.get(&key) {
                            scan(bucket);
                        }
                    }
                }
            }
        }
    }
}

impl RadiusIndex for VoxelGrid {
    fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize> {
        let mut out = Vec::new();
        self.for_each_within(query, radius, |i| out.push(i));
        out.sort_unstable();
        out
    }

    fn radius_count(&self, query: &[f32; 3], radius: f32) -> usize {
        let mut count = 0;
        self.for_each_within(query, radius, |_| count += 1);
        count
    }

    fn len(&self) -> usize {
        self.coords.len()
    }
}
