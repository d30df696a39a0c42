use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use denoise_filters::{radius_outlier_removal, RadiusOutlierParams};
use denoise_spatial::IndexKind;
use log::{debug, info};

use crate::DenoiseError;

/// Everything one run needs, already parsed from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct DenoiseConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub radius: f32,
    /// Signed so that a negative value reaches validation instead of
    /// failing argument parsing.
    pub min_neighbors: i64,
    pub keep_statistics: bool,
    pub index: IndexKind,
}

impl DenoiseConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            radius: 0.08,
            min_neighbors: 6,
            keep_statistics: false,
            index: IndexKind::default(),
        }
    }

    /// Check the numeric parameters and turn them into filter parameters.
    pub fn filter_params(&self) -> Result<RadiusOutlierParams, DenoiseError> {
        let min_neighbors = usize::try_from(self.min_neighbors).map_err(|_| {
            DenoiseError::InvalidParameter(format!(
                "min-neighbors must be >= 0, got {}",
                self.min_neighbors
            ))
        })?;
        let params = RadiusOutlierParams::new(self.radius, min_neighbors).with_index(self.index);
        params.validate()?;
        Ok(params)
    }
}

/// Counts, paths and timings of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rejected_output: Option<PathBuf>,
    pub total_points: usize,
    pub kept_points: usize,
    pub rejected_points: usize,
    pub load_time: Duration,
    pub filter_time: Duration,
    pub write_time: Duration,
    pub total_time: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Loaded {} points from {}",
            self.total_points,
            self.input.display()
        )?;
        writeln!(
            f,
            "Kept {} points (removed {} / {})",
            self.kept_points, self.rejected_points, self.total_points
        )?;
        writeln!(f, "Saved filtered cloud to {}", self.output.display())?;
        if let Some(ref path) = self.rejected_output {
            writeln!(f, "Saved rejected points to {}", path.display())?;
        }
        writeln!(
            f,
            "Load {:.1} ms, filter {:.1} ms, write {:.1} ms",
            self.load_time.as_secs_f64() * 1e3,
            self.filter_time.as_secs_f64() * 1e3,
            self.write_time.as_secs_f64() * 1e3
        )?;
        writeln!(f, "Elapsed time: {:.2}s", self.total_time.as_secs_f64())
    }
}

/// Where the rejected points of a run writing `output` go: the output file
/// name with `_rejected.pcd` appended, next to the output.
pub fn rejected_output_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push("_rejected.pcd");
    output.with_file_name(name)
}

fn write_to(path: &Path, cloud: &denoise_core::PointCloud) -> Result<(), DenoiseError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DenoiseError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    denoise_io::write_cloud(path, cloud).map_err(|source| DenoiseError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Load, filter and save one cloud.
///
/// Parameters are checked before any file is touched. The kept points are
/// written to `config.output` in the format its extension names; with
/// `keep_statistics` the rejected points also go to
/// [`rejected_output_path`] as binary PCD.
pub fn run(config: &DenoiseConfig) -> Result<RunSummary, DenoiseError> {
    let started = Instant::now();
    let params = config.filter_params()?;

    info!("input: {}", config.input.display());
    info!("output: {}", config.output.display());
    info!(
        "radius: {}, min neighbors: {}, index: {}",
        params.radius, params.min_neighbors, params.index
    );

    if !config.input.is_file() {
        return Err(DenoiseError::FileNotFound(config.input.clone()));
    }

    let phase = Instant::now();
    let cloud = denoise_io::read_cloud(&config.input).map_err(|source| DenoiseError::Read {
        path: config.input.clone(),
        source,
    })?;
    let load_time = phase.elapsed();
    if cloud.is_empty() {
        return Err(DenoiseError::EmptyInput(config.input.clone()));
    }
    info!("loaded {} points in {:.1} ms", cloud.len(), load_time.as_secs_f64() * 1e3);
    debug!("cloud extent: {:?}", cloud.aabb().extent());

    let phase = Instant::now();
    let result = radius_outlier_removal(&cloud, &params)?;
    let filter_time = phase.elapsed();
    info!(
        "kept {} of {} points in {:.1} ms",
        result.kept_count(),
        result.total(),
        filter_time.as_secs_f64() * 1e3
    );

    let phase = Instant::now();
    write_to(&config.output, &result.kept)?;
    debug!("wrote {} points to {}", result.kept.len(), config.output.display());

    let rejected_output = if config.keep_statistics {
        let path = rejected_output_path(&config.output);
        let rejected = result.rejected_cloud(&cloud);
        // Sibling of the output, so its directory exists by now.
        denoise_io::write_pcd_binary(&path, &rejected).map_err(|source| {
            DenoiseError::Write {
                path: path.clone(),
                source,
            }
        })?;
        debug!("wrote {} rejected points to {}", rejected.len(), path.display());
        Some(path)
    } else {
        None
    };
    let write_time = phase.elapsed();
    info!("saved output in {:.1} ms", write_time.as_secs_f64() * 1e3);

    Ok(RunSummary {
        input: config.input.clone(),
        output: config.output.clone(),
        rejected_output,
        total_points: result.total(),
        kept_points: result.kept_count(),
        rejected_points: result.rejected_count(),
        load_time,
        filter_time,
        write_time,
        total_time: started.elapsed(),
    })
}
