//! Helper functions for numerical differentiation, phase handling and input checks.

use crate::error::{EccError, EccResult};
use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

/// Unwrap phase to remove 2π discontinuities.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    if phase.is_empty() {
        return Vec::new();
    }

    let mut unwrapped = Vec::with_capacity(phase.len());
    unwrapped.push(phase[0]);
    let mut cumulative_correction = 0.0;

    for i in 1..phase.len() {
        let diff = phase[i] - phase[i - 1];

        if diff > PI {
            cumulative_correction -= 2.0 * PI;
        } else if diff < -PI {
            cumulative_correction += 2.0 * PI;
        }

        unwrapped.push(phase[i] + cumulative_correction);
    }

    unwrapped
}

/// Numerical derivative of `values` with respect to `t`.
///
/// Second-order central differences in the interior, valid for unequal
/// spacing; one-sided first-order differences at the ends. Returns zeros
/// when fewer than two samples are given.
pub fn gradient(values: &[f64], t: &[f64]) -> Vec<f64> {
    let m = values.len();
    if m < 2 || t.len() != m {
        return vec![0.0; m];
    }

    let mut deriv = vec![0.0; m];
    deriv[0] = (values[1] - values[0]) / (t[1] - t[0]);
    for j in 1..(m - 1) {
        let hd = t[j] - t[j - 1];
        let hs = t[j + 1] - t[j];
        deriv[j] = (hd * hd * values[j + 1] + (hs * hs - hd * hd) * values[j]
            - hs * hs * values[j - 1])
            / (hs * hd * (hs + hd));
    }
    deriv[m - 1] = (values[m - 1] - values[m - 2]) / (t[m - 1] - t[m - 2]);

    deriv
}

/// Index of the largest value (first occurrence). `None` for empty input.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the value closest to `target` (first occurrence).
pub fn argmin_abs_diff(values: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let d = (v - target).abs();
        match best {
            Some((_, b)) if d >= b => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Locate the peak of a sampled function with sub-sample precision.
///
/// Fits a parabola through the discrete maximum and its two neighbours
/// (the window is shifted inwards when the maximum sits on an end sample)
/// and returns `(t_peak, f_peak)` at its vertex. If the vertex would fall
/// outside the three-sample window, the discrete maximum is returned.
pub fn peak_via_quadratic_fit(t: &[f64], func: &[f64]) -> EccResult<(f64, f64)> {
    let n = func.len();
    if t.len() != n {
        return Err(EccError::ShapeMismatch {
            expected: t.len(),
            actual: n,
            context: "peak_via_quadratic_fit".to_string(),
        });
    }
    if n < 3 {
        return Err(EccError::InsufficientData {
            required: 3,
            actual: n,
            context: "peak_via_quadratic_fit".to_string(),
        });
    }

    let imax = argmax(func).unwrap_or(0);
    let center = imax.clamp(1, n - 2);
    let t0 = t[center];

    // Centered abscissae keep the Vandermonde system well conditioned
    let tau = [t[center - 1] - t0, 0.0, t[center + 1] - t0];
    let vander = Matrix3::new(
        1.0,
        tau[0],
        tau[0] * tau[0],
        1.0,
        tau[1],
        tau[1] * tau[1],
        1.0,
        tau[2],
        tau[2] * tau[2],
    );
    let rhs = Vector3::new(func[center - 1], func[center], func[center + 1]);

    let fallback = (t[imax], func[imax]);
    let coeffs = match vander.lu().solve(&rhs) {
        Some(c) => c,
        None => return Ok(fallback),
    };
    let (a, b, c) = (coeffs[0], coeffs[1], coeffs[2]);
    if c.abs() < f64::MIN_POSITIVE {
        return Ok(fallback);
    }

    let tau_peak = -b / (2.0 * c);
    if !tau_peak.is_finite() || tau_peak < tau[0] || tau_peak > tau[2] {
        return Ok(fallback);
    }
    let f_peak = a + b * tau_peak + c * tau_peak * tau_peak;

    Ok((t0 + tau_peak, f_peak))
}

/// Check that `values` is strictly increasing.
pub fn check_strictly_increasing(values: &[f64], context: &str) -> EccResult<()> {
    if values.windows(2).all(|w| w[1] > w[0]) {
        Ok(())
    } else {
        Err(EccError::NotMonotonic {
            context: context.to_string(),
        })
    }
}

/// Check that every entry of `values` is finite.
pub fn check_finite(values: &[f64], context: &str) -> EccResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(EccError::NonFinite {
            index,
            context: context.to_string(),
        }),
        None => Ok(()),
    }
}
