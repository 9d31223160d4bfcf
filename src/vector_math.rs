/// Vector math used by the SOM model and the trajectory BMU search.

use crate::error::{Result, UMatrixError};

/// Euclidean distance between two equal-length vectors
///
/// # Examples
/// ```
/// use som_umatrix::vector_math::distance;
///
/// assert_eq!(distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap(), 5.0);
/// assert_eq!(distance(&[1.0], &[1.0]).unwrap(), 0.0);
/// ```
pub fn distance(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(UMatrixError::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }

    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    Ok(sum.sqrt())
}

/// Running min/max tracker for the distance lattice.
///
/// The minimum starts at 0.0 rather than +infinity. Euclidean distances are
/// never negative, so the recorded minimum only drops below 0 if a caller
/// feeds in a negative value. The contour thickness default depends on this
/// starting point.
#[derive(Debug, Clone, Copy)]
pub struct DistanceRange {
    min: f64,
    max: f64,
}

impl Default for DistanceRange {
    fn default() -> Self {
        Self { min: 0.0, max: 0.0 }
    }
}

impl DistanceRange {
    pub fn observe(&mut self, value: f64) {
        if value > self.max {
            self.max = value;
        }
        if value < self.min {
            self.min = value;
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
