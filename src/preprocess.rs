//! Amplitude, phase and frequency of the (2,2) mode on a merger-centered grid.

use crate::error::EccResult;
use crate::helpers::{gradient, peak_via_quadratic_fit, unwrap_phase};
use num_complex::Complex64;

/// Series derived from the (2,2) mode for one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    /// Time grid shifted so that the amplitude peak is at `t = 0`.
    pub t: Vec<f64>,
    /// |h22|
    pub amp22: Vec<f64>,
    /// −unwrap(arg h22), increasing for an inspiral.
    pub phase22: Vec<f64>,
    /// d(phase22)/dt
    pub omega22: Vec<f64>,
    /// Peak time on the caller's grid; `t = t_input − t_merger`.
    pub t_merger: f64,
}

impl Preprocessed {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Sample closest to the merger (`t = 0`).
    pub fn merger_index(&self) -> usize {
        crate::helpers::argmin_abs_diff(&self.t, 0.0).unwrap_or(0)
    }
}

/// Derive amplitude, phase and frequency and center time on the amplitude peak.
///
/// `t` and `h22` are assumed validated (same length >= 3, increasing time).
/// The caller's arrays are not modified.
pub fn preprocess(t: &[f64], h22: &[Complex64]) -> EccResult<Preprocessed> {
    let amp22: Vec<f64> = h22.iter().map(|h| h.norm()).collect();
    let (t_merger, _) = peak_via_quadratic_fit(t, &amp22)?;
    let t_shifted: Vec<f64> = t.iter().map(|&x| x - t_merger).collect();

    let arg: Vec<f64> = h22.iter().map(|h| h.arg()).collect();
    let phase22: Vec<f64> = unwrap_phase(&arg).into_iter().map(|p| -p).collect();
    let omega22 = gradient(&phase22, &t_shifted);

    log::debug!(
        "preprocessed {} samples, merger at t = {:.6}",
        t.len(),
        t_merger
    );

    Ok(Preprocessed {
        t: t_shifted,
        amp22,
        phase22,
        omega22,
        t_merger,
    })
}
