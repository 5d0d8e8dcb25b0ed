//! Standard Scaler
//!
//! Zero-mean, unit-variance copy of a chunk's matrix using that chunk's own
//! statistics (population variance). A constant column is centred and left
//! unscaled; a matrix where every column is constant cannot be fit.

use ndarray::{Array1, Array2, Axis};

use super::types::DetectorError;

/// Fitted per-column statistics
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub mean: Array1<f64>,
    pub scale: Array1<f64>,
    /// Columns with (numerically) zero variance
    pub constant_columns: usize,
}

impl StandardScaler {
    /// Fit column statistics
    pub fn fit(data: &Array2<f64>) -> Result<Self, DetectorError> {
        let (rows, cols) = data.dim();
        if rows == 0 {
            return Err(DetectorError::insufficient("empty chunk"));
        }
        if cols == 0 {
            return Err(DetectorError::insufficient("no feature columns"));
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| DetectorError::insufficient("empty chunk"))?;
        let variance = data.var_axis(Axis(0), 0.0);

        let mut constant_columns = 0;
        let scale = Array1::from_iter(variance.iter().zip(mean.iter()).map(|(&var, &mu)| {
            if is_constant(var, mu, rows) {
                constant_columns += 1;
                1.0
            } else {
                var.sqrt()
            }
        }));

        if constant_columns == cols {
            return Err(DetectorError::insufficient("zero-variance feature matrix"));
        }

        Ok(Self { mean, scale, constant_columns })
    }

    pub fn transform(&self, data: &Array2<f64>) -> Array2<f64> {
        (data - &self.mean) / &self.scale
    }
}

/// Fit and transform in one step
pub fn standardize(data: &Array2<f64>) -> Result<Array2<f64>, DetectorError> {
    let scaler = StandardScaler::fit(data)?;
    Ok(scaler.transform(data))
}

/// Variance below accumulated rounding noise counts as zero
fn is_constant(var: f64, mean: f64, rows: usize) -> bool {
    let bound = f64::EPSILON * mean.abs().max(1.0);
    var <= bound * bound * rows as f64
}
