use denoise_filters::FilterError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DenoiseError {
    #[error("input file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("input cloud is empty: {}", .0.display())]
    EmptyInput(PathBuf),

    /// An empty cloud handed to the filter directly, with no file behind it.
    #[error("input cloud is empty")]
    EmptyCloud,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<FilterError> for DenoiseError {
    fn from(e: FilterError) -> Self {
        match e {
            FilterError::InvalidParameter(msg) => DenoiseError::InvalidParameter(msg),
            FilterError::EmptyInput => DenoiseError::EmptyCloud,
        }
    }
}
