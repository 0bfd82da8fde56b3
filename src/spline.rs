//! Interpolating B-splines of configurable degree.
//!
//! The spline passes through every data point. Boundary knots are repeated
//! `degree + 1` times; interior knots sit on the data abscissae for odd
//! degrees and on midpoints between them for even degrees, which for the
//! cubic case is the not-a-knot condition.
//!
//! The collocation matrix is banded and totally positive, so it is solved by
//! Gaussian elimination without pivoting.

use crate::config::{ExtrapolateMode, SplineConfig};
use crate::error::{EccError, EccResult};
use crate::helpers::{check_finite, check_strictly_increasing};

/// Highest supported degree.
pub const MAX_DEGREE: usize = 5;

/// Interpolating spline `y(x)` through strictly increasing abscissae.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatingSpline {
    knots: Vec<f64>,
    coefs: Vec<f64>,
    degree: usize,
    ext: ExtrapolateMode,
    x_min: f64,
    x_max: f64,
}

impl InterpolatingSpline {
    /// Build the spline through `(x[i], y[i])`.
    ///
    /// Requires `x.len() == y.len() > degree` and strictly increasing `x`.
    pub fn new(x: &[f64], y: &[f64], config: &SplineConfig) -> EccResult<Self> {
        let n = x.len();
        let k = config.degree;
        config.validate()?;
        if y.len() != n {
            return Err(EccError::ShapeMismatch {
                expected: n,
                actual: y.len(),
                context: "spline ordinates".to_string(),
            });
        }
        if n <= k {
            return Err(EccError::InsufficientData {
                required: k + 1,
                actual: n,
                context: format!("degree {} spline", k),
            });
        }
        if let Some(w) = &config.weights {
            if w.len() != n {
                return Err(EccError::ShapeMismatch {
                    expected: n,
                    actual: w.len(),
                    context: "spline weights".to_string(),
                });
            }
            if w.iter().any(|&v| !(v > 0.0)) {
                return Err(EccError::InvalidParameter {
                    parameter: "weights".to_string(),
                    message: "must be positive".to_string(),
                });
            }
        }
        if config.check_finite {
            check_finite(x, "spline abscissae")?;
            check_finite(y, "spline ordinates")?;
        }
        check_strictly_increasing(x, "spline abscissae")?;

        let x_min = x[0];
        let x_max = x[n - 1];
        let xb = config.bbox[0].unwrap_or(x_min);
        let xe = config.bbox[1].unwrap_or(x_max);
        if xb > x_min || xe < x_max {
            return Err(EccError::InvalidParameter {
                parameter: "bbox".to_string(),
                message: format!(
                    "[{}, {}] must enclose the data span [{}, {}]",
                    xb, xe, x_min, x_max
                ),
            });
        }

        let knots = interpolation_knots(x, k, xb, xe);
        let coefs = solve_collocation(x, y, &knots, k)?;

        Ok(Self {
            knots,
            coefs,
            degree: k,
            ext: config.ext,
            x_min,
            x_max,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Data span `(x_min, x_max)`.
    pub fn domain(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// Evaluate at `x`, applying the extrapolation mode outside the data span.
    pub fn evaluate(&self, x: f64) -> EccResult<f64> {
        if x < self.x_min || x > self.x_max {
            match self.ext {
                ExtrapolateMode::Extrapolate => {}
                ExtrapolateMode::Zeros => return Ok(0.0),
                ExtrapolateMode::Const => {
                    let edge = if x < self.x_min { self.x_min } else { self.x_max };
                    return Ok(self.evaluate_unchecked(edge));
                }
                ExtrapolateMode::Raise => {
                    return Err(EccError::OutOfDomain {
                        point: x,
                        min: self.x_min,
                        max: self.x_max,
                        context: "spline evaluation".to_string(),
                    })
                }
            }
        }
        Ok(self.evaluate_unchecked(x))
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> EccResult<Vec<f64>> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    fn evaluate_unchecked(&self, x: f64) -> f64 {
        let k = self.degree;
        let span = find_span(&self.knots, self.coefs.len(), k, x);
        let basis = basis_functions(&self.knots, span, k, x);
        basis
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coefs[span - k + r])
            .sum()
    }
}

/// Knot vector of length `n + k + 1` for interpolation at `x`.
fn interpolation_knots(x: &[f64], k: usize, xb: f64, xe: f64) -> Vec<f64> {
    let n = x.len();
    let mut knots = Vec::with_capacity(n + k + 1);
    knots.extend(std::iter::repeat(xb).take(k + 1));
    if k % 2 == 1 {
        let half = (k + 1) / 2;
        knots.extend_from_slice(&x[half..n - half]);
    } else {
        let half = k / 2;
        for j in half..(n - half - 1) {
            knots.push(0.5 * (x[j] + x[j + 1]));
        }
    }
    knots.extend(std::iter::repeat(xe).take(k + 1));
    knots
}

/// Knot span `s` with `knots[s] <= x < knots[s + 1]`, clamped to `[k, n_coefs - 1]`.
fn find_span(knots: &[f64], n_coefs: usize, k: usize, x: f64) -> usize {
    let upper = knots.partition_point(|&t| t <= x);
    upper.saturating_sub(1).clamp(k, n_coefs - 1)
}

/// The `k + 1` non-zero B-spline values at `x` for knot span `span`.
fn basis_functions(knots: &[f64], span: usize, k: usize, x: f64) -> Vec<f64> {
    let mut values = vec![0.0; k + 1];
    let mut left = vec![0.0; k + 1];
    let mut right = vec![0.0; k + 1];
    values[0] = 1.0;

    for j in 1..=k {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            let temp = if denom != 0.0 { values[r] / denom } else { 0.0 };
            values[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        values[j] = saved;
    }

    values
}

/// Solve the collocation system for the B-spline coefficients.
fn solve_collocation(x: &[f64], y: &[f64], knots: &[f64], k: usize) -> EccResult<Vec<f64>> {
    let n = x.len();
    let width = 2 * k + 1;
    // Row i holds columns i-k..=i+k at offsets 0..width
    let mut band = vec![0.0; n * width];
    let idx = |row: usize, col: usize| row * width + (col + k - row);

    for (i, &xi) in x.iter().enumerate() {
        let span = find_span(knots, n, k, xi);
        let basis = basis_functions(knots, span, k, xi);
        for (r, &b) in basis.iter().enumerate() {
            let col = span - k + r;
            if col + k < i || col > i + k {
                if b != 0.0 {
                    return Err(EccError::Numerical {
                        message: format!("collocation row {} exceeds the band", i),
                    });
                }
                continue;
            }
            band[idx(i, col)] = b;
        }
    }

    let mut rhs = y.to_vec();
    for p in 0..n {
        let pivot = band[idx(p, p)];
        if pivot.abs() < f64::MIN_POSITIVE {
            return Err(EccError::Numerical {
                message: format!("singular collocation matrix at row {}", p),
            });
        }
        let last = (p + k).min(n - 1);
        for r in (p + 1)..=last {
            let factor = band[idx(r, p)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in p..=last {
                band[idx(r, c)] -= factor * band[idx(p, c)];
            }
            rhs[r] -= factor * rhs[p];
        }
    }

    let mut coefs = vec![0.0; n];
    for p in (0..n).rev() {
        let last = (p + k).min(n - 1);
        let mut s = rhs[p];
        for c in (p + 1)..=last {
            s -= band[idx(p, c)] * coefs[c];
        }
        coefs[p] = s / band[idx(p, p)];
    }

    Ok(coefs)
}
