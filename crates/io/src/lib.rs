#![forbid(unsafe_code)]

pub mod format;
pub mod las;
pub mod pcd;
pub mod ply;
pub mod xyz;

pub use format::{read_cloud, write_cloud, CloudFormat};
pub use self::las::{read_las, write_las};
pub use pcd::{read_pcd, write_pcd, write_pcd_binary};
pub use ply::{read_ply, write_ply, write_ply_binary};
pub use xyz::{read_xyz, write_xyz, XyzLayout};
