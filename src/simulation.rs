//! Synthetic eccentric inspiral-merger waveforms.
//!
//! The (2,2) mode of a slowly chirping Keplerian orbit, to first order in
//! eccentricity:
//!
//! ```text
//! n(t) = n0 (1 + α (t − t_a))                  mean motion
//! l(t) = n0 [(t − t_a) + α (t − t_a)² / 2]     mean anomaly
//! e(t) = e0 (n / n0)^(−19/18)                 eccentricity
//! φ(t) = l + 2 e sin l                         orbital phase
//! h22  = n^(2/3) (1 + e cos l) g(t) exp(−2iφ)
//! ```
//!
//! where `g` is a Gaussian bump that places the amplitude peak (merger) at
//! `t = 0`. ω22 then oscillates as `2n (1 + 2e cos l)`, so periapsis passages
//! fall at `l = 2πk` and the measured eccentricity is close to `e(t)`.

use crate::error::{EccError, EccResult};
use crate::waveform::{WaveformData, WaveformModes, MODE_22};
use num_complex::Complex64;
use rand::prelude::*;
use rand_distr::Normal;
use std::collections::BTreeMap;

/// Parameters of a synthetic eccentric inspiral.
#[derive(Debug, Clone, PartialEq)]
pub struct EccentricInspiral {
    /// Eccentricity at `t_anchor`.
    pub e0: f64,
    /// Mean motion at `t_anchor`.
    pub n0: f64,
    /// Relative growth rate of the mean motion.
    pub chirp_rate: f64,
    /// Time where the mean anomaly is zero.
    pub t_anchor: f64,
    /// Width of the merger bump.
    pub merger_width: f64,
    pub t_start: f64,
    pub t_end: f64,
    pub dt: f64,
}

impl Default for EccentricInspiral {
    fn default() -> Self {
        Self {
            e0: 0.1,
            n0: 0.01,
            chirp_rate: 5e-5,
            t_anchor: -20000.0,
            merger_width: 30.0,
            t_start: -20000.0,
            t_end: 200.0,
            dt: 1.0,
        }
    }
}

impl EccentricInspiral {
    /// Circular counterpart on a wider grid, for residual methods.
    pub fn zero_eccentricity(&self) -> Self {
        Self {
            e0: 0.0,
            t_start: self.t_start - 2000.0,
            t_end: self.t_end + 100.0,
            ..self.clone()
        }
    }

    pub fn with_eccentricity(&self, e0: f64) -> Self {
        Self {
            e0,
            ..self.clone()
        }
    }

    pub fn time_grid(&self) -> Vec<f64> {
        let m = ((self.t_end - self.t_start) / self.dt).round() as usize + 1;
        (0..m).map(|i| self.t_start + i as f64 * self.dt).collect()
    }

    pub fn mean_motion(&self, t: f64) -> f64 {
        self.n0 * (1.0 + self.chirp_rate * (t - self.t_anchor))
    }

    pub fn mean_anomaly(&self, t: f64) -> f64 {
        let s = t - self.t_anchor;
        self.n0 * (s + 0.5 * self.chirp_rate * s * s)
    }

    pub fn eccentricity(&self, t: f64) -> f64 {
        self.e0 * (self.mean_motion(t) / self.n0).powf(-19.0 / 18.0)
    }

    fn merger_envelope(&self, t: f64) -> f64 {
        let bump = (-0.5 * (t / self.merger_width).powi(2)).exp();
        if t <= 0.0 {
            1.0 + 2.0 * bump
        } else {
            3.0 * bump
        }
    }

    /// (2,2) mode at `t`.
    pub fn h22(&self, t: f64) -> Complex64 {
        let n = self.mean_motion(t);
        let l = self.mean_anomaly(t);
        let e = self.eccentricity(t);
        let phi = l + 2.0 * e * l.sin();
        let amp = n.powf(2.0 / 3.0) * (1.0 + e * l.cos()) * self.merger_envelope(t);
        Complex64::from_polar(amp, -2.0 * phi)
    }

    pub fn modes(&self) -> (Vec<f64>, WaveformModes) {
        let t = self.time_grid();
        let h22: Vec<Complex64> = t.iter().map(|&x| self.h22(x)).collect();
        let mut hlm = BTreeMap::new();
        hlm.insert(MODE_22, h22);
        (t, hlm)
    }

    /// Waveform data without a zero-eccentricity companion.
    pub fn waveform(&self) -> WaveformData {
        let (t, hlm) = self.modes();
        WaveformData::new(t, hlm)
    }

    /// Waveform data with [`Self::zero_eccentricity`] attached.
    pub fn waveform_with_zeroecc(&self) -> WaveformData {
        let (t_zeroecc, hlm_zeroecc) = self.zero_eccentricity().modes();
        self.waveform().with_zeroecc(t_zeroecc, hlm_zeroecc)
    }
}

/// Add independent Gaussian noise to the real and imaginary parts of every mode.
///
/// # Arguments
/// * `data` - Waveform to perturb; the zero-eccentricity companion is left untouched
/// * `sd` - Standard deviation of each component
/// * `seed` - Optional random seed for reproducibility
pub fn add_noise(data: &WaveformData, sd: f64, seed: Option<u64>) -> EccResult<WaveformData> {
    if !sd.is_finite() || sd < 0.0 {
        return Err(EccError::InvalidParameter {
            parameter: "sd".to_string(),
            message: format!("must be finite and non-negative, got {}", sd),
        });
    }
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let normal = Normal::new(0.0, sd).map_err(|e| EccError::InvalidParameter {
        parameter: "sd".to_string(),
        message: e.to_string(),
    })?;

    let mut noisy = data.clone();
    for mode in noisy.hlm.values_mut() {
        for h in mode.iter_mut() {
            *h += Complex64::new(normal.sample(&mut rng), normal.sample(&mut rng));
        }
    }
    Ok(noisy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::preprocess;

    #[test]
    fn test_grid_and_anchor() {
        let sim = EccentricInspiral::default();
        let t = sim.time_grid();
        assert_eq!(t.len(), 20201);
        assert_eq!(t[0], -20000.0);
        assert_eq!(t[t.len() - 1], 200.0);
        assert_eq!(sim.eccentricity(sim.t_anchor), 0.1);
        assert_eq!(sim.mean_anomaly(sim.t_anchor), 0.0);
        // Eccentricity decays as the orbit shrinks
        assert!(sim.eccentricity(-10000.0) < sim.eccentricity(-15000.0));
    }

    #[test]
    fn test_merger_at_origin() {
        let sim = EccentricInspiral::default();
        let data = sim.waveform();
        let pre = preprocess(&data.t, data.h22().unwrap()).unwrap();
        assert!(pre.t_merger.abs() < 2.0);
    }

    #[test]
    fn test_frequency_oscillation() {
        let sim = EccentricInspiral::default();
        let data = sim.waveform();
        let pre = preprocess(&data.t, data.h22().unwrap()).unwrap();
        // phase22 tracks twice the mean anomaly up to the 4e sin l modulation
        let i = 5000;
        let t0 = data.t[i];
        let dphase = pre.phase22[i + 100] - pre.phase22[i];
        let dl = sim.mean_anomaly(t0 + 100.0) - sim.mean_anomaly(t0);
        assert!((dphase - 2.0 * dl).abs() < 4.0 * sim.eccentricity(t0) * 2.0 + 1e-9);
        assert!(pre.omega22.iter().take(15000).all(|&w| w > 0.0));
    }

    #[test]
    fn test_circular_counterpart_is_monotonic() {
        let sim = EccentricInspiral::default().zero_eccentricity();
        assert_eq!(sim.e0, 0.0);
        let data = sim.waveform();
        let pre = preprocess(&data.t, data.h22().unwrap()).unwrap();
        let merger = pre.merger_index();
        for w in pre.omega22[..merger].windows(2) {
            assert!(w[1] > w[0]);
        }
        for w in pre.amp22[..merger - 200].windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn test_add_noise_reproducible() {
        let data = EccentricInspiral::default().waveform();
        let a = add_noise(&data, 1e-3, Some(42)).unwrap();
        let b = add_noise(&data, 1e-3, Some(42)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, data);
        let diff: Vec<f64> = a.hlm[&MODE_22]
            .iter()
            .zip(&data.hlm[&MODE_22])
            .map(|(x, y)| (x - y).re)
            .collect();
        let mean = diff.iter().sum::<f64>() / diff.len() as f64;
        assert!(mean.abs() < 1e-4);
    }

    #[test]
    fn test_add_noise_rejects_invalid_sd() {
        let data = EccentricInspiral::default().waveform();
        for sd in [-1.0, f64::NAN, f64::INFINITY] {
            let err = add_noise(&data, sd, Some(1)).unwrap_err();
            assert!(matches!(err, EccError::InvalidParameter { .. }));
        }
        // Zero noise leaves the waveform unchanged
        assert_eq!(add_noise(&data, 0.0, Some(1)).unwrap(), data);
    }
}
