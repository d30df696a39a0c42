use std::fmt;
use std::str::FromStr;

use denoise_core::PointCloud;

use crate::{KdTree, VoxelGrid};

/// A read-only index answering fixed-radius queries over a point cloud.
///
/// Returned indices refer to positions in the cloud the index was built
/// from. Implementations must be shareable across threads so a single index
/// can serve parallel queries.
pub trait RadiusIndex: Send + Sync {
    /// Indices of all points with `euclidean_dist(point, query) <= radius`,
    /// sorted ascending.
    ///
    /// Returns empty for an empty index, a non-finite query, or a radius
    /// that is non-finite or `<= 0`.
    fn radius_search(&self, query: &[f32; 3], radius: f32) -> Vec<usize>;

    /// Number of points within `radius` of `query`. Override to count
    /// without building the sorted index list.
    fn radius_count(&self, query: &[f32; 3], radius: f32) -> usize {
        self.radius_search(query, radius).len()
    }

    /// Number of points the index was built over, including any it skipped.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which spatial index backs a radius query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexKind {
    #[default]
    KdTree,
    Grid,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::KdTree => f.pad("kdtree"),
            IndexKind::Grid => f.pad("grid"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "kdtree" | "kd-tree" | "kd" => Ok(IndexKind::KdTree),
            "grid" | "voxel" => Ok(IndexKind::Grid),
            other => Err(format!("unknown index kind: {other}")),
        }
    }
}

/// Build the index of the requested kind over `cloud`.
///
/// `radius` is the query radius the index will serve; the grid uses it as
/// its cell size. It must be finite and `> 0` for [`IndexKind::Grid`].
pub fn build_index(kind: IndexKind, cloud: &PointCloud, radius: f32) -> Box<dyn RadiusIndex> {
    match kind {
        IndexKind::KdTree => Box::new(KdTree::build(cloud)),
        IndexKind::Grid => Box::new(VoxelGrid::build(cloud, radius)),
    }
}
