//! Eccentricity and mean anomaly from interpolants through frequency extrema.
//!
//! Given ω22 interpolated through maxima (ω_p) and minima (ω_t), the
//! eccentricity is
//!
//! ```text
//! e(t) = (√|ω_p(t)| − √|ω_t(t)|) / (√|ω_p(t)| + √|ω_t(t)|)
//! ```
//!
//! and the mean anomaly grows linearly from 0 to 2π between consecutive
//! maxima (periapsis passages). Both follow arXiv:2101.11798, eqs. 4 and 7.

use crate::config::SplineConfig;
use crate::error::{EccError, EccResult, MeasurementWarning};
use crate::extrema::{ExtremaKind, ExtremaSet};
use crate::spline::InterpolatingSpline;
use std::f64::consts::PI;

/// ω22 interpolant through one kind of extrema, or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtremaInterpolant {
    Available {
        spline: InterpolatingSpline,
        extrema: ExtremaSet,
        /// Times of the extrema, strictly increasing.
        times: Vec<f64>,
    },
    /// Fewer than two extrema were found.
    Insufficient { kind: ExtremaKind, found: usize },
}

impl ExtremaInterpolant {
    /// Interpolate `omega22` through `extrema`.
    ///
    /// The spline degree is lowered to `count - 1` when there are not enough
    /// extrema for the configured degree; the change is recorded in `warnings`.
    pub fn build(
        extrema: ExtremaSet,
        t: &[f64],
        omega22: &[f64],
        config: &SplineConfig,
        warnings: &mut Vec<MeasurementWarning>,
    ) -> EccResult<Self> {
        let kind = extrema.kind();
        let found = extrema.len();
        if found < 2 {
            let warning = MeasurementWarning::InsufficientExtrema { kind, found };
            log::warn!("{}", warning);
            warnings.push(warning);
            return Ok(Self::Insufficient { kind, found });
        }

        let times = extrema.select(t);
        let values = extrema.select(omega22);

        let mut config = if found <= config.degree {
            let warning = MeasurementWarning::ReducedSplineDegree {
                kind,
                requested: config.degree,
                used: found - 1,
            };
            log::warn!("{}", warning);
            warnings.push(warning);
            config.with_degree(found - 1)
        } else {
            config.clone()
        };

        // Maxima and minima usually differ in count, so weights fit one side at most
        if let Some(n_weights) = config.weights.as_ref().map(Vec::len) {
            if n_weights != found {
                let warning = MeasurementWarning::IgnoredSplineWeights {
                    kind,
                    weights: n_weights,
                    extrema: found,
                };
                log::warn!("{}", warning);
                warnings.push(warning);
                config.weights = None;
            }
        }

        let spline = InterpolatingSpline::new(&times, &values, &config)?;
        Ok(Self::Available {
            spline,
            extrema,
            times,
        })
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    pub fn spline(&self) -> Option<&InterpolatingSpline> {
        match self {
            Self::Available { spline, .. } => Some(spline),
            Self::Insufficient { .. } => None,
        }
    }

    pub fn times(&self) -> Option<&[f64]> {
        match self {
            Self::Available { times, .. } => Some(times),
            Self::Insufficient { .. } => None,
        }
    }

    pub fn extrema(&self) -> Option<&ExtremaSet> {
        match self {
            Self::Available { extrema, .. } => Some(extrema),
            Self::Insufficient { .. } => None,
        }
    }
}

/// Eccentricity from ω22 at the maxima and minima envelopes.
pub fn eccentricity_from_omegas(omega_peak: f64, omega_trough: f64) -> f64 {
    let sp = omega_peak.abs().sqrt();
    let st = omega_trough.abs().sqrt();
    (sp - st) / (sp + st)
}

/// Span on which both interpolants are defined without extrapolation.
///
/// Both slices must be non-empty.
pub fn valid_time_range(t_peaks: &[f64], t_troughs: &[f64]) -> (f64, f64) {
    let tmin = t_peaks[0].max(t_troughs[0]);
    let tmax = t_peaks[t_peaks.len() - 1].min(t_troughs[t_troughs.len() - 1]);
    (tmin, tmax)
}

/// Requested times within `[tmin, tmax]`, in request order.
pub fn filter_reference_times(tref_in: &[f64], tmin: f64, tmax: f64) -> Vec<f64> {
    tref_in
        .iter()
        .copied()
        .filter(|&t| t >= tmin && t <= tmax)
        .collect()
}

/// Index `k` of the peak interval with `t_peaks[k] <= t < t_peaks[k + 1]`.
///
/// `None` when `t` precedes the first peak or no peak follows it.
pub fn bracketing_interval(t_peaks: &[f64], t: f64) -> Option<usize> {
    let at_or_before = t_peaks.partition_point(|&tp| tp <= t);
    if at_or_before == 0 || at_or_before >= t_peaks.len() {
        None
    } else {
        Some(at_or_before - 1)
    }
}

/// Mean anomaly at `t`, in `[0, 2π)`.
pub fn mean_anomaly(t_peaks: &[f64], t: f64) -> EccResult<f64> {
    let k = bracketing_interval(t_peaks, t).ok_or_else(|| EccError::NotBracketed {
        time: t,
        first_peak: t_peaks.first().copied().unwrap_or(f64::NAN),
        last_peak: t_peaks.last().copied().unwrap_or(f64::NAN),
    })?;
    let t_last = t_peaks[k];
    let t_next = t_peaks[k + 1];
    Ok(2.0 * PI * (t - t_last) / (t_next - t_last))
}

/// Eccentricity and mean anomaly at each of `tref`.
///
/// Every point must lie inside the spans of both splines and be bracketed by
/// two peaks.
pub fn evaluate(
    omega_peaks: &InterpolatingSpline,
    omega_troughs: &InterpolatingSpline,
    t_peaks: &[f64],
    tref: &[f64],
) -> EccResult<(Vec<f64>, Vec<f64>)> {
    let mut ecc = Vec::with_capacity(tref.len());
    let mut mean_ano = Vec::with_capacity(tref.len());
    for &t in tref {
        let wp = omega_peaks.evaluate(t)?;
        let wt = omega_troughs.evaluate(t)?;
        ecc.push(eccentricity_from_omegas(wp, wt));
        mean_ano.push(mean_anomaly(t_peaks, t)?);
    }
    Ok((ecc, mean_ano))
}

/// Orbit-averaged ω22 between consecutive extrema of each kind.
///
/// Each pair contributes `Δphase22 / Δt` at the midpoint time. Points from
/// maxima and minima are merged and sorted; coincident times are kept once.
pub fn orbit_averaged_omega22(
    t: &[f64],
    phase22: &[f64],
    sets: &[&ExtremaSet],
) -> (Vec<f64>, Vec<f64>) {
    let mut points: Vec<(f64, f64)> = Vec::new();
    for set in sets {
        for w in set.indices().windows(2) {
            let (i, j) = (w[0], w[1]);
            let dt = t[j] - t[i];
            points.push((0.5 * (t[i] + t[j]), (phase22[j] - phase22[i]) / dt));
        }
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points.dedup_by(|a, b| a.0 == b.0);
    points.into_iter().unzip()
}

/// Map each target ordinate to an abscissa on a sampled increasing curve.
///
/// `values` must be strictly increasing. Targets outside
/// `[values[0], values[n-1]]` yield `None`; others are located by linear
/// interpolation between samples.
pub fn invert_increasing(times: &[f64], values: &[f64], target: f64) -> Option<f64> {
    let n = values.len();
    if n < 2 || target < values[0] || target > values[n - 1] {
        return None;
    }
    let upper = values.partition_point(|&v| v < target).clamp(1, n - 1);
    let lower = upper - 1;
    let frac = (target - values[lower]) / (values[upper] - values[lower]);
    Some(times[lower] + frac * (times[upper] - times[lower]))
}

/// Flag consecutive extrema whose phase22 separation is not about one orbit.
///
/// One orbit advances phase22 by 4π. Separations outside
/// `[0.5, 1.5]` orbits are reported.
pub fn check_extrema_separation(phase22: &[f64], set: &ExtremaSet) -> Vec<MeasurementWarning> {
    set.indices()
        .windows(2)
        .enumerate()
        .filter_map(|(index, w)| {
            let orbits = (phase22[w[1]] - phase22[w[0]]) / (4.0 * PI);
            if (0.5..=1.5).contains(&orbits) {
                None
            } else {
                Some(MeasurementWarning::IrregularExtremaSeparation {
                    kind: set.kind(),
                    index,
                    orbits,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtrapolateMode;

    #[test]
    fn test_eccentricity_formula() {
        assert_eq!(eccentricity_from_omegas(1.0, 1.0), 0.0);
        let e = eccentricity_from_omegas(1.21, 0.81); // √ = 1.1, 0.9
        assert!((e - 0.1).abs() < 1e-12);
        // Sign of ω does not matter
        assert!((eccentricity_from_omegas(-1.21, -0.81) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_mean_anomaly_between_peaks() {
        let t_peaks = [0.0, 10.0, 20.0];
        assert!((mean_anomaly(&t_peaks, 5.0).unwrap() - PI).abs() < 1e-12);
        assert_eq!(mean_anomaly(&t_peaks, 0.0).unwrap(), 0.0);
        let just_before = mean_anomaly(&t_peaks, 10.0 - 1e-9).unwrap();
        assert!(just_before < 2.0 * PI && (2.0 * PI - just_before) < 1e-8);
        // At a peak the phase restarts
        assert_eq!(mean_anomaly(&t_peaks, 10.0).unwrap(), 0.0);
        assert!((mean_anomaly(&t_peaks, 15.0).unwrap() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_mean_anomaly_requires_bracketing() {
        let t_peaks = [0.0, 10.0, 20.0];
        assert!(matches!(
            mean_anomaly(&t_peaks, -1.0),
            Err(EccError::NotBracketed { .. })
        ));
        // The last peak has no successor
        assert!(mean_anomaly(&t_peaks, 20.0).is_err());
        assert!(mean_anomaly(&t_peaks, 25.0).is_err());
        assert_eq!(bracketing_interval(&t_peaks, 19.9), Some(1));
    }

    #[test]
    fn test_valid_range_and_filter() {
        let (tmin, tmax) = valid_time_range(&[0.0, 10.0, 20.0], &[5.0, 15.0, 25.0]);
        assert_eq!((tmin, tmax), (5.0, 20.0));
        let kept = filter_reference_times(&[7.0, 1.0, 20.0, 21.0, 5.0], tmin, tmax);
        assert_eq!(kept, vec![7.0, 20.0, 5.0]);
    }

    #[test]
    fn test_interpolant_insufficient_and_reduced_degree() {
        let t: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let omega: Vec<f64> = t.iter().map(|&x| 1.0 + 0.01 * x).collect();
        let cfg = SplineConfig::default();
        let mut warnings = Vec::new();

        let one = ExtremaSet::new(ExtremaKind::Maxima, vec![4]).unwrap();
        let interp = ExtremaInterpolant::build(one, &t, &omega, &cfg, &mut warnings).unwrap();
        assert!(!interp.is_available());
        assert!(interp.times().is_none());

        let three = ExtremaSet::new(ExtremaKind::Minima, vec![4, 14, 24]).unwrap();
        let interp = ExtremaInterpolant::build(three, &t, &omega, &cfg, &mut warnings).unwrap();
        let spline = interp.spline().unwrap();
        assert_eq!(spline.degree(), 2);
        assert!((spline.evaluate(10.0).unwrap() - 1.1).abs() < 1e-12);
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_interpolant_drops_weights_of_wrong_length() {
        let t: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let omega: Vec<f64> = t.iter().map(|&x| 1.0 + 0.01 * x).collect();
        let cfg = SplineConfig {
            weights: Some(vec![1.0; 4]),
            ..SplineConfig::default()
        };
        let mut warnings = Vec::new();

        let four = ExtremaSet::new(ExtremaKind::Maxima, vec![2, 12, 22, 32]).unwrap();
        let peaks = ExtremaInterpolant::build(four, &t, &omega, &cfg, &mut warnings).unwrap();
        assert!(peaks.is_available());
        assert!(warnings.is_empty());

        let five = ExtremaSet::new(ExtremaKind::Minima, vec![0, 7, 17, 27, 37]).unwrap();
        let troughs = ExtremaInterpolant::build(five, &t, &omega, &cfg, &mut warnings).unwrap();
        assert!((troughs.spline().unwrap().evaluate(20.0).unwrap() - 1.2).abs() < 1e-12);
        assert_eq!(
            warnings,
            vec![MeasurementWarning::IgnoredSplineWeights {
                kind: ExtremaKind::Minima,
                weights: 4,
                extrema: 5,
            }]
        );
    }

    #[test]
    fn test_evaluate_constant_envelopes() {
        let t: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let omega: Vec<f64> = t
            .iter()
            .map(|&x| if (x as usize) % 10 == 0 { 1.21 } else { 0.81 })
            .collect();
        let cfg = SplineConfig {
            ext: ExtrapolateMode::Raise,
            ..SplineConfig::default()
        };
        let mut warnings = Vec::new();
        let peaks = ExtremaSet::new(ExtremaKind::Maxima, (0..10).map(|k| k * 10).collect()).unwrap();
        let troughs =
            ExtremaSet::new(ExtremaKind::Minima, (0..10).map(|k| k * 10 + 5).collect()).unwrap();
        let wp = ExtremaInterpolant::build(peaks, &t, &omega, &cfg, &mut warnings).unwrap();
        let wt = ExtremaInterpolant::build(troughs, &t, &omega, &cfg, &mut warnings).unwrap();

        let (ecc, ano) = evaluate(
            wp.spline().unwrap(),
            wt.spline().unwrap(),
            wp.times().unwrap(),
            &[10.0, 12.5, 30.0],
        )
        .unwrap();
        for e in &ecc {
            assert!((e - 0.1).abs() < 1e-10);
        }
        assert!((ano[1] - PI / 2.0).abs() < 1e-12);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_orbit_averaged_and_inversion() {
        // phase22 = 0.5 t: averaged frequency is 0.5 everywhere
        let t: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let phase: Vec<f64> = t.iter().map(|&x| 0.5 * x).collect();
        let peaks = ExtremaSet::new(ExtremaKind::Maxima, vec![0, 20, 40]).unwrap();
        let troughs = ExtremaSet::new(ExtremaKind::Minima, vec![10, 30, 50]).unwrap();
        let (times, values) = orbit_averaged_omega22(&t, &phase, &[&peaks, &troughs]);
        assert_eq!(times, vec![10.0, 20.0, 30.0, 40.0]);
        assert!(values.iter().all(|&v| (v - 0.5).abs() < 1e-12));

        let curve_t = [0.0, 1.0, 2.0];
        let curve_v = [1.0, 2.0, 4.0];
        assert_eq!(invert_increasing(&curve_t, &curve_v, 3.0), Some(1.5));
        assert_eq!(invert_increasing(&curve_t, &curve_v, 1.0), Some(0.0));
        assert_eq!(invert_increasing(&curve_t, &curve_v, 4.0), Some(2.0));
        assert_eq!(invert_increasing(&curve_t, &curve_v, 4.5), None);
    }

    #[test]
    fn test_extrema_separation_check() {
        let phase: Vec<f64> = (0..100).map(|i| i as f64 * 4.0 * PI / 10.0).collect();
        let regular = ExtremaSet::new(ExtremaKind::Maxima, vec![0, 10, 20, 30]).unwrap();
        assert!(check_extrema_separation(&phase, &regular).is_empty());
        let gap = ExtremaSet::new(ExtremaKind::Maxima, vec![0, 10, 30]).unwrap();
        let warnings = check_extrema_separation(&phase, &gap);
        assert_eq!(warnings.len(), 1);
    }
}
