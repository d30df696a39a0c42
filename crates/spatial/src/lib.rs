#![forbid(unsafe_code)]

pub mod index;
pub mod kdtree;
pub mod voxel_grid;

pub use index::{build_index, IndexKind, RadiusIndex};
pub use kdtree::KdTree;
pub use voxel_grid::VoxelGrid;
