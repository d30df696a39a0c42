use clap::{Parser, ValueEnum};
use denoise_spatial::IndexKind;
use std::path::PathBuf;

use crate::pipeline::DenoiseConfig;

#[derive(Parser, Debug)]
#[command(
    name = "radius-denoise",
    about = "Remove radius outliers from a point cloud file",
    version
)]
pub struct Cli {
    /// Input cloud (.pcd, .ply, .las, .xyz, .xyzn, .xyzrgb, .txt)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output cloud; the format follows the extension
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Neighbourhood radius, in the cloud's units
    #[arg(long, default_value_t = 0.08)]
    pub radius: f32,

    /// Minimum number of other points within the radius for a point to be kept
    #[arg(long, default_value_t = 6, allow_negative_numbers = true)]
    pub min_neighbors: i64,

    /// Also write the rejected points to <OUTPUT>_rejected.pcd
    #[arg(long)]
    pub keep_statistics: bool,

    /// Spatial index used for radius queries
    #[arg(long, value_enum, default_value_t = IndexArg::Kdtree)]
    pub index: IndexArg,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexArg {
    Kdtree,
    Grid,
}

impl From<IndexArg> for IndexKind {
    fn from(arg: IndexArg) -> Self {
        match arg {
            IndexArg::Kdtree => IndexKind::KdTree,
            IndexArg::Grid => IndexKind::Grid,
        }
    }
}

impl Cli {
    pub fn config(&self) -> DenoiseConfig {
        DenoiseConfig {
            input: self.input.clone(),
            output: self.output.clone(),
            radius: self.radius,
            min_neighbors: self.min_neighbors,
            keep_statistics: self.keep_statistics,
            index: self.index.into(),
        }
    }
}
