pub mod window;
pub mod weighted;
pub mod ols;
pub mod ts_linear;
pub mod ts_quadratic;

pub use window::SampleWindow;
pub use weighted::WeightedAverage;
pub use ols::OlsLinear;
pub use ts_linear::TheilSenLinear;
pub use ts_quadratic::TheilSenQuadratic;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("index {index} out of bounds for a window of {len} samples")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Median of an owned batch of values; even lengths average the two middle elements.
pub(crate) fn median_of(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;

    if values.len() % 2 != 0 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}
