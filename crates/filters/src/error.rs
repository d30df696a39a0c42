use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("input point cloud is empty")]
    EmptyInput,
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
