//! Waveform data bundle consumed by the measurement pipeline.
//!
//! A [`WaveformData`] holds the time grid and spherical-harmonic modes of the
//! eccentric waveform and, for residual methods, a matching zero-eccentricity
//! waveform on its own grid.

use crate::error::{EccError, EccResult};
use crate::helpers::{check_finite, check_strictly_increasing};
use num_complex::Complex64;
use std::collections::BTreeMap;

/// Mode index `(l, m)`.
pub type ModeIndex = (u32, i32);

/// Complex strain modes sampled on a shared time grid.
pub type WaveformModes = BTreeMap<ModeIndex, Vec<Complex64>>;

/// The dominant quadrupole mode.
pub const MODE_22: ModeIndex = (2, 2);

/// Time grid and modes of an eccentric waveform, with an optional
/// zero-eccentricity companion.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformData {
    /// Time grid, strictly increasing.
    pub t: Vec<f64>,
    /// Modes on `t`.
    pub hlm: WaveformModes,
    /// Time grid of the zero-eccentricity waveform.
    pub t_zeroecc: Option<Vec<f64>>,
    /// Modes of the zero-eccentricity waveform on `t_zeroecc`.
    pub hlm_zeroecc: Option<WaveformModes>,
}

impl WaveformData {
    pub fn new(t: Vec<f64>, hlm: WaveformModes) -> Self {
        Self {
            t,
            hlm,
            t_zeroecc: None,
            hlm_zeroecc: None,
        }
    }

    /// Attach a zero-eccentricity waveform.
    pub fn with_zeroecc(mut self, t_zeroecc: Vec<f64>, hlm_zeroecc: WaveformModes) -> Self {
        self.t_zeroecc = Some(t_zeroecc);
        self.hlm_zeroecc = Some(hlm_zeroecc);
        self
    }

    /// Eccentric (2,2) mode, after validating the eccentric waveform.
    pub fn h22(&self) -> EccResult<&[Complex64]> {
        validate_modes(&self.t, &self.hlm, "hlm")
    }

    /// Zero-eccentricity time grid and (2,2) mode, after validation.
    ///
    /// `context` names the caller in the error when the data is absent.
    pub fn zeroecc_h22(&self, context: &str) -> EccResult<(&[f64], &[Complex64])> {
        let t = self.t_zeroecc.as_deref().ok_or_else(|| EccError::MissingData {
            key: "t_zeroecc",
            context: context.to_string(),
        })?;
        let hlm = self
            .hlm_zeroecc
            .as_ref()
            .ok_or_else(|| EccError::MissingData {
                key: "hlm_zeroecc",
                context: context.to_string(),
            })?;
        let h22 = validate_modes(t, hlm, "hlm_zeroecc")?;
        Ok((t, h22))
    }

    pub fn has_zeroecc(&self) -> bool {
        self.t_zeroecc.is_some() && self.hlm_zeroecc.is_some()
    }
}

/// Check grid and mode invariants and return the (2,2) mode.
fn validate_modes<'a>(
    t: &[f64],
    hlm: &'a WaveformModes,
    label: &'static str,
) -> EccResult<&'a [Complex64]> {
    if t.len() < 3 {
        return Err(EccError::InsufficientData {
            required: 3,
            actual: t.len(),
            context: format!("time grid of {}", label),
        });
    }
    check_finite(t, "time grid")?;
    check_strictly_increasing(t, "time grid")?;

    for (&(l, m), mode) in hlm {
        if mode.len() != t.len() {
            return Err(EccError::ShapeMismatch {
                expected: t.len(),
                actual: mode.len(),
                context: format!("{} mode ({}, {})", label, l, m),
            });
        }
        if let Some(index) = mode.iter().position(|h| !h.re.is_finite() || !h.im.is_finite()) {
            return Err(EccError::NonFinite {
                index,
                context: format!("{} mode ({}, {})", label, l, m),
            });
        }
    }

    hlm.get(&MODE_22)
        .map(|h| h.as_slice())
        .ok_or_else(|| EccError::MissingData {
            key: "(2, 2) mode",
            context: label.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_modes(n: usize) -> (Vec<f64>, WaveformModes) {
        let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let h22: Vec<Complex64> = t.iter().map(|&x| Complex64::from_polar(1.0, -x)).collect();
        let mut hlm = WaveformModes::new();
        hlm.insert(MODE_22, h22);
        (t, hlm)
    }

    #[test]
    fn test_valid_waveform() {
        let (t, hlm) = simple_modes(10);
        let data = WaveformData::new(t, hlm);
        assert_eq!(data.h22().unwrap().len(), 10);
        assert!(!data.has_zeroecc());
    }

    #[test]
    fn test_missing_22_mode() {
        let (t, mut hlm) = simple_modes(10);
        let h = hlm.remove(&MODE_22).unwrap();
        hlm.insert((3, 3), h);
        let err = WaveformData::new(t, hlm).h22().unwrap_err();
        assert!(matches!(err, EccError::MissingData { .. }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_mismatched_lengths() {
        let (t, mut hlm) = simple_modes(10);
        hlm.insert((2, 1), vec![Complex64::new(0.0, 0.0); 9]);
        let err = WaveformData::new(t, hlm).h22().unwrap_err();
        assert!(matches!(
            err,
            EccError::ShapeMismatch {
                expected: 10,
                actual: 9,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_zeroecc() {
        let (t, hlm) = simple_modes(10);
        let err = WaveformData::new(t, hlm)
            .zeroecc_h22("ResidualAmplitude")
            .unwrap_err();
        assert!(matches!(err, EccError::MissingData { key: "t_zeroecc", .. }));
    }
}
