//! Kernel-weighted local averaging (Nadaraya-Watson).
//!
//! Each output value is the weighted mean of its neighbours, weights coming
//! from a kernel of the scaled distance `(x_i - x_j) / bandwidth`. The scan
//! away from a point stops once the weight falls below a fraction of the
//! point's own weight, so a smoothing pass costs O(n·k) for a window of k.

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};
use thiserror::Error;

/// Default relative weight below which the neighbour scan stops (0.1%).
pub const DEFAULT_CUTOFF: f64 = 0.001;

/// Smoothing kernel shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kernel {
    Uniform,
    Triangle,
    Epanechnikov,
    Quartic,
    Triweight,
    Logistic,
    Cosine,
    #[default]
    Gaussian,
    Tricube,
    Silverman,
}

impl Kernel {
    /// Weight of the point at `x2` when smoothing the point at `x1`.
    pub fn weight(self, x1: f64, x2: f64, bandwidth: f64) -> f64 {
        let u = (x1 - x2) / bandwidth;
        let bounded = u.abs() <= 1.0;

        match self {
            Kernel::Uniform => {
                if bounded {
                    0.5
                } else {
                    0.0
                }
            }
            Kernel::Triangle => {
                if bounded {
                    1.0 - u.abs()
                } else {
                    0.0
                }
            }
            Kernel::Epanechnikov => {
                if bounded {
                    0.75 * (1.0 - u * u)
                } else {
                    0.0
                }
            }
            Kernel::Quartic => {
                if bounded {
                    (15.0 / 16.0) * (1.0 - u * u).powi(2)
                } else {
                    0.0
                }
            }
            Kernel::Triweight => {
                if bounded {
                    (35.0 / 32.0) * (1.0 - u * u).powi(3)
                } else {
                    0.0
                }
            }
            Kernel::Logistic => 1.0 / (u.exp() + (-u).exp()),
            Kernel::Cosine => {
                if bounded {
                    FRAC_PI_4 * (FRAC_PI_2 * u).cos()
                } else {
                    0.0
                }
            }
            Kernel::Gaussian => (1.0 / (2.0 * PI).sqrt()) * (-(u * u) / 2.0).exp(),
            Kernel::Tricube => {
                if bounded {
                    (70.0 / 81.0) * (1.0 - u.abs().powi(3)).powi(3)
                } else {
                    0.0
                }
            }
            Kernel::Silverman => {
                let u = u.abs();
                0.5 * (-u / SQRT_2).exp() * (u / SQRT_2 + FRAC_PI_4).sin()
            }
        }
    }
}

impl std::fmt::Display for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Kernel::Uniform => "Uniform",
            Kernel::Triangle => "Triangle",
            Kernel::Epanechnikov => "Epanechnikov",
            Kernel::Quartic => "Quartic",
            Kernel::Triweight => "Triweight",
            Kernel::Logistic => "Logistic",
            Kernel::Cosine => "Cosine",
            Kernel::Gaussian => "Gaussian",
            Kernel::Tricube => "Tricube",
            Kernel::Silverman => "Silverman",
        };
        write!(f, "{}", name)
    }
}

/// Kernel width, either shared by every point or given per point.
#[derive(Debug, Clone, PartialEq)]
pub enum Bandwidth {
    Fixed(f64),
    PerPoint(Vec<f64>),
}

/// Errors from kernel smoothing.
#[derive(Debug, Error, PartialEq)]
pub enum SmoothingError {
    #[error("Bandwidth must be positive and finite, got {0}")]
    InvalidBandwidth(f64),

    #[error("Expected {expected} bandwidths, got {actual}")]
    BandwidthLength { expected: usize, actual: usize },
}

/// Kernel regression smoother.
#[derive(Debug, Clone)]
pub struct KernelSmoother {
    kernel: Kernel,
    bandwidth: Bandwidth,
    cutoff: f64,
}

impl KernelSmoother {
    /// Create a smoother with one bandwidth for every point.
    pub fn new(kernel: Kernel, bandwidth: f64) -> Self {
        Self {
            kernel,
            bandwidth: Bandwidth::Fixed(bandwidth),
            cutoff: DEFAULT_CUTOFF,
        }
    }

    /// Create a smoother with a bandwidth per data point.
    pub fn with_bandwidths(kernel: Kernel, bandwidths: Vec<f64>) -> Self {
        Self {
            kernel,
            bandwidth: Bandwidth::PerPoint(bandwidths),
            cutoff: DEFAULT_CUTOFF,
        }
    }

    /// Override the relative weight at which the neighbour scan stops.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    fn bandwidths(&self, len: usize) -> Result<Vec<f64>, SmoothingError> {
        let bandwidths = match &self.bandwidth {
            Bandwidth::Fixed(b) => vec![*b; len],
            Bandwidth::PerPoint(values) => {
                if values.len() != len {
                    return Err(SmoothingError::BandwidthLength {
                        expected: len,
                        actual: values.len(),
                    });
                }
                values.clone()
            }
        };

        if let Some(bad) = bandwidths.iter().find(|b| !(b.is_finite() && **b > 0.0)) {
            return Err(SmoothingError::InvalidBandwidth(*bad));
        }

        Ok(bandwidths)
    }

    /// Smooth `(x, y)` points, returning `(x, smoothed_y)` in the same order.
    pub fn smooth(&self, points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>, SmoothingError> {
        let bandwidths = self.bandwidths(points.len())?;
        let mut output = Vec::with_capacity(points.len());

        for (i, &(xi, yi)) in points.iter().enumerate() {
            let b = bandwidths[i];
            let self_weight = self.kernel.weight(xi, xi, b);
            let mut weighted_sum = self_weight * yi;
            let mut weight_total = self_weight;

            for &(xj, yj) in points[..i].iter().rev() {
                let w = self.kernel.weight(xi, xj, b);
                if w / self_weight < self.cutoff {
                    break;
                }
                weighted_sum += w * yj;
                weight_total += w;
            }

            for &(xj, yj) in &points[i + 1..] {
                let w = self.kernel.weight(xi, xj, b);
                if w / self_weight < self.cutoff {
                    break;
                }
                weighted_sum += w * yj;
                weight_total += w;
            }

            output.push((xi, weighted_sum / weight_total));
        }

        Ok(output)
    }

    /// Smooth a series indexed 0, 1, 2, ...
    pub fn smooth_series(&self, values: &[f64]) -> Result<Vec<f64>, SmoothingError> {
        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as f64, *v))
            .collect();

        Ok(self.smooth(&points)?.into_iter().map(|(_, y)| y).collect())
    }
}
