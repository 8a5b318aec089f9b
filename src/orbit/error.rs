use thiserror::Error;

use crate::orbit::source::Axis;

#[derive(Debug, Error)]
pub enum OrbitError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("{axis} reading has {actual} rows, device table has {expected}")]
    RowMismatch {
        axis: Axis,
        expected: usize,
        actual: usize,
    },
    #[error("data source failed: {0}")]
    Source(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

impl OrbitError {
    pub fn config(msg: impl Into<String>) -> Self {
        OrbitError::InvalidConfiguration(msg.into())
    }

    #[cfg(test)]
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, OrbitError::InvalidConfiguration(_))
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for OrbitError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        OrbitError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for OrbitError {
    fn from(value: image::ImageError) -> Self {
        OrbitError::Plot(value.to_string())
    }
}
