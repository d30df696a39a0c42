use std::time::Instant;

use denoise_core::PointCloud;
use denoise_spatial::{build_index, IndexKind, RadiusIndex};
use log::debug;
use rayon::prelude::*;

use crate::FilterError;

/// Parameters for [`radius_outlier_removal`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusOutlierParams {
    /// Neighbourhood radius, in the cloud's units.
    pub radius: f32,
    /// A point survives when at least this many *other* points lie within
    /// `radius` of it.
    pub min_neighbors: usize,
    pub index: IndexKind,
}

impl RadiusOutlierParams {
    pub fn new(radius: f32, min_neighbors: usize) -> Self {
        Self {
            radius,
            min_neighbors,
            index: IndexKind::default(),
        }
    }

    pub fn with_index(mut self, index: IndexKind) -> Self {
        self.index = index;
        self
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(FilterError::InvalidParameter(format!(
                "radius must be > 0 and finite, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

/// Partition of a cloud into kept points and rejected indices.
///
/// `kept_indices` and `rejected` are disjoint, strictly increasing, and
/// together cover every index of the input exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResult {
    pub kept: PointCloud,
    pub kept_indices: Vec<usize>,
    pub rejected: Vec<usize>,
}

impl FilterResult {
    pub fn kept_count(&self) -> usize {
        self.kept_indices.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// Size of the input the result was computed from.
    pub fn total(&self) -> usize {
        self.kept_indices.len() + self.rejected.len()
    }

    /// The rejected points of `input`, in original order.
    ///
    /// # Panics
    ///
    /// Panics if `input` is smaller than the cloud this result came from.
    pub fn rejected_cloud(&self, input: &PointCloud) -> PointCloud {
        input.select(&self.rejected)
    }
}

/// Count, for every point, the other points within `radius` of it.
///
/// The point itself is never counted; coincident points at other indices
/// are. Points with a non-finite coordinate get a count of zero. Queries run
/// in parallel against the shared `index`, which must have been built over
/// `cloud`.
pub fn neighbor_counts(cloud: &PointCloud, radius: f32, index: &dyn RadiusIndex) -> Vec<usize> {
    (0..cloud.len())
        .into_par_iter()
        .map(|i| {
            if !cloud.is_finite_at(i) {
                return 0;
            }
            // A finite point always finds itself.
            index.radius_count(&cloud.point(i), radius).saturating_sub(1)
        })
        .collect()
}

/// Remove points with fewer than `params.min_neighbors` other points within
/// `params.radius`.
///
/// The threshold is inclusive: a point with exactly `min_neighbors`
/// neighbours is kept. With `min_neighbors == 0` every point is kept.
/// Kept points retain their relative order.
///
/// # Errors
///
/// - [`FilterError::InvalidParameter`] if the radius is non-finite or `<= 0`.
/// - [`FilterError::EmptyInput`] if the cloud has no points.
pub fn radius_outlier_removal(
    cloud: &PointCloud,
    params: &RadiusOutlierParams,
) -> Result<FilterResult, FilterError> {
    params.validate()?;
    if cloud.is_empty() {
        return Err(FilterError::EmptyInput);
    }

    if params.min_neighbors == 0 {
        debug!("min_neighbors is 0, keeping all {} points", cloud.len());
        return Ok(FilterResult {
            kept: cloud.clone(),
            kept_indices: (0..cloud.len()).collect(),
            rejected: Vec::new(),
        });
    }

    let start = Instant::now();
    let index = build_index(params.index, cloud, params.radius);
    debug!(
        "built {} index over {} points in {:.1} ms",
        params.index,
        index.len(),
        start.elapsed().as_secs_f64() * 1e3
    );

    let start = Instant::now();
    let counts = neighbor_counts(cloud, params.radius, index.as_ref());

    let mut kept_indices = Vec::with_capacity(cloud.len());
    let mut rejected = Vec::new();
    for (i, &count) in counts.iter().enumerate() {
        if count >= params.min_neighbors {
            kept_indices.push(i);
        } else {
            rejected.push(i);
        }
    }
    debug!(
        "counted neighbours within {} in {:.1} ms: kept {}, rejected {}",
        params.radius,
        start.elapsed().as_secs_f64() * 1e3,
        kept_indices.len(),
        rejected.len()
    );

    Ok(FilterResult {
        kept: cloud.select(&kept_indices),
        kept_indices,
        rejected,
    })
}
