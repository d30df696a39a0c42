//! Radius outlier removal for point cloud files.
//!
//! The binary is a thin wrapper around [`run`]; the pieces live in the
//! workspace crates:
//!
//! - `denoise-core`: the [`PointCloud`] container
//! - `denoise-spatial`: k-d tree and voxel grid radius indices
//! - `denoise-filters`: the radius outlier filter
//! - `denoise-io`: PCD, PLY, LAS and XYZ readers and writers

#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod logging;
pub mod pipeline;

pub use denoise_core::PointCloud;
pub use error::DenoiseError;
pub use pipeline::{rejected_output_path, run, DenoiseConfig, RunSummary};
