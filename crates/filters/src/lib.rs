#![forbid(unsafe_code)]

pub mod error;
pub mod radius_outlier;

pub use error::FilterError;
pub use radius_outlier::{
    neighbor_counts, radius_outlier_removal, FilterResult, RadiusOutlierParams,
};
