use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ArtifactError;

/// A fitted per-column feature transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// Centers each column on its training mean and divides by its training spread.
    Standard { mean: Vec<f64>, scale: Vec<f64> },
    /// Maps each column's training range onto the target range: `x * scale + min`.
    MinMax { min: Vec<f64>, scale: Vec<f64> },
}

#[derive(Error, Debug, PartialEq)]
pub enum ScalerError {
    #[error("The scaler was fitted on {expected} features, but the row has {found}.")]
    DimensionMismatch { found: usize, expected: usize },
}

impl Scaler {
    pub fn n_features(&self) -> usize {
        match self {
            Self::Standard { scale, .. } | Self::MinMax { scale, .. } => scale.len(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Standard { .. } => "standard",
            Self::MinMax { .. } => "min_max",
        }
    }

    /// Checks the fitted parameters once at load time. Offsets and scales must be
    /// finite, and a standard scale must be a normal float whose reciprocal is finite,
    /// so a subnormal spread cannot turn ordinary inputs into infinities.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let (offset_name, offset, scale) = match self {
            Self::Standard { mean, scale } => ("mean", mean, scale),
            Self::MinMax { min, scale } => ("min", min, scale),
        };

        if offset.len() != scale.len() {
            return Err(ArtifactError::InvalidScaler(format!(
                "{offset_name} has {} entries but scale has {}",
                offset.len(),
                scale.len()
            )));
        }

        if let Some(idx) = offset.iter().position(|v| !v.is_finite()) {
            return Err(ArtifactError::InvalidScaler(format!(
                "{offset_name}[{idx}] is not finite"
            )));
        }

        let divides = matches!(self, Self::Standard { .. });
        if let Some(idx) = scale
            .iter()
            .position(|v| !v.is_finite() || (divides && !is_divisor(*v)))
        {
            return Err(ArtifactError::InvalidScaler(format!(
                "scale[{idx}] = {} cannot be used",
                scale[idx]
            )));
        }

        Ok(())
    }

    pub fn transform(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, ScalerError> {
        let expected = self.n_features();
        if row.len() != expected {
            return Err(ScalerError::DimensionMismatch {
                found: row.len(),
                expected,
            });
        }

        let scaled = match self {
            Self::Standard { mean, scale } => {
                (&row - &ArrayView1::from(mean.as_slice())) / &ArrayView1::from(scale.as_slice())
            }
            Self::MinMax { min, scale } => {
                &row * &ArrayView1::from(scale.as_slice()) + &ArrayView1::from(min.as_slice())
            }
        };
        Ok(scaled)
    }
}

fn is_divisor(v: f64) -> bool {
    v.abs() >= f64::MIN_POSITIVE && (1.0 / v).is_finite()
}
