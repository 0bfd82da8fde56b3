//! Measurement entry point.
//!
//! [`EccMeasurement`] runs the pipeline once per waveform: preprocessing,
//! extrema search on the method's series, and interpolation of ω22 through
//! the extrema. It can then be evaluated at reference times or reference
//! frequencies any number of times. [`measure_eccentricity`] wraps the two
//! steps for a single call and [`measure_eccentricity_batch`] runs
//! independent measurements in parallel.

use crate::config::{ExtraConfig, OmegaAveraging, SplineConfig};
use crate::eccentricity::{
    check_extrema_separation, evaluate, filter_reference_times, invert_increasing,
    orbit_averaged_omega22, valid_time_range, ExtremaInterpolant,
};
use crate::error::{EccError, EccResult, MeasurementWarning};
use crate::extrema::{find_extrema, merger_cutoff_index, ExtremaKind};
use crate::helpers::check_finite;
use crate::iter_maybe_parallel;
use crate::methods::EccMethod;
use crate::preprocess::{preprocess, Preprocessed};
use crate::spline::InterpolatingSpline;
use crate::waveform::WaveformData;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A scalar or an array of reference points.
///
/// Outputs mirror the variant of the input they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Values {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Values {
    pub fn as_slice(&self) -> &[f64] {
        match self {
            Values::Scalar(v) => std::slice::from_ref(v),
            Values::Array(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Values::Scalar(_))
    }

    /// Wrap `values` in the same variant as `self`.
    ///
    /// A scalar stays scalar only when exactly one value is given.
    pub fn like(&self, values: Vec<f64>) -> Values {
        match (self, values.as_slice()) {
            (Values::Scalar(_), [single]) => Values::Scalar(*single),
            _ => Values::Array(values),
        }
    }

    pub fn into_vec(self) -> Vec<f64> {
        match self {
            Values::Scalar(v) => vec![v],
            Values::Array(v) => v,
        }
    }
}

impl From<f64> for Values {
    fn from(v: f64) -> Self {
        Values::Scalar(v)
    }
}

impl From<Vec<f64>> for Values {
    fn from(v: Vec<f64>) -> Self {
        Values::Array(v)
    }
}

impl From<&[f64]> for Values {
    fn from(v: &[f64]) -> Self {
        Values::Array(v.to_vec())
    }
}

/// Where to evaluate the eccentricity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reference {
    /// Times on the merger-centered grid.
    Times(Values),
    /// Orbit-averaged (2,2) frequencies, ⟨ω22⟩/2π.
    Frequencies(Values),
}

impl Reference {
    fn from_arguments(tref_in: Option<Values>, fref_in: Option<Values>) -> EccResult<Self> {
        match (tref_in, fref_in) {
            (Some(t), None) => Ok(Reference::Times(t)),
            (None, Some(f)) => Ok(Reference::Frequencies(f)),
            (Some(_), Some(_)) => Err(EccError::ReferenceArguments { provided: "both" }),
            (None, None) => Err(EccError::ReferenceArguments {
                provided: "neither",
            }),
        }
    }
}

/// Output of a measurement.
///
/// `tref_out`, `eccentricity` and `mean_anomaly` are co-indexed.
#[derive(Debug, Clone)]
pub struct EccentricityResult {
    /// Reference times the values were computed at, merger-centered.
    pub tref_out: Values,
    /// Reference frequencies that could be mapped to times.
    pub fref_out: Option<Values>,
    pub eccentricity: Values,
    /// Mean anomaly in `[0, 2π)`.
    pub mean_anomaly: Values,
    /// Recoverable conditions met while measuring.
    pub warnings: Vec<MeasurementWarning>,
    /// The measurement itself, when requested.
    pub ecc_method: Option<EccMeasurement>,
}

/// Prepared measurement for one waveform and method.
#[derive(Debug, Clone)]
pub struct EccMeasurement {
    pub method: EccMethod,
    pub spline_config: SplineConfig,
    pub extra_config: ExtraConfig,
    /// Eccentric waveform on the merger-centered grid.
    pub preprocessed: Preprocessed,
    /// Zero-eccentricity waveform, for residual methods.
    pub zeroecc: Option<Preprocessed>,
    /// Series searched for extrema, truncated before the merger.
    pub search_series: Vec<f64>,
    /// ω22 through the maxima of the search series.
    pub omega_peaks: ExtremaInterpolant,
    /// ω22 through the minima of the search series.
    pub omega_troughs: ExtremaInterpolant,
    warnings: Vec<MeasurementWarning>,
}

impl EccMeasurement {
    /// Preprocess `data`, find extrema and build the ω22 interpolants.
    pub fn new(
        data: &WaveformData,
        method: EccMethod,
        spline_config: SplineConfig,
        extra_config: ExtraConfig,
    ) -> EccResult<Self> {
        extra_config.validate()?;
        spline_config.validate()?;

        let definition = method.definition();
        let preprocessed = preprocess(&data.t, data.h22()?)?;
        let zeroecc = if definition.requires_zeroecc() {
            let (t_zeroecc, h22_zeroecc) = data.zeroecc_h22(definition.name())?;
            Some(preprocess(t_zeroecc, h22_zeroecc)?)
        } else {
            None
        };

        let mut search_series =
            definition.data_for_finding_extrema(&preprocessed, zeroecc.as_ref())?;
        let cutoff = merger_cutoff_index(
            &preprocessed,
            extra_config.num_orbits_to_exclude_before_merger,
        );
        search_series.truncate(cutoff);
        log::debug!(
            "{}: searching {} of {} samples for extrema",
            method,
            search_series.len(),
            preprocessed.len()
        );

        let finding = &extra_config.extrema_finding;
        let peaks = find_extrema(&search_series, ExtremaKind::Maxima, finding)?;
        let troughs = find_extrema(&search_series, ExtremaKind::Minima, finding)?;
        log::debug!(
            "{}: found {} maxima and {} minima",
            method,
            peaks.len(),
            troughs.len()
        );

        let mut warnings = Vec::new();
        if extra_config.debug {
            for set in [&peaks, &troughs] {
                for warning in check_extrema_separation(&preprocessed.phase22, set) {
                    log::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        let omega_peaks = ExtremaInterpolant::build(
            peaks,
            &preprocessed.t,
            &preprocessed.omega22,
            &spline_config,
            &mut warnings,
        )?;
        let omega_troughs = ExtremaInterpolant::build(
            troughs,
            &preprocessed.t,
            &preprocessed.omega22,
            &spline_config,
            &mut warnings,
        )?;

        Ok(Self {
            method,
            spline_config,
            extra_config,
            preprocessed,
            zeroecc,
            search_series,
            omega_peaks,
            omega_troughs,
            warnings,
        })
    }

    /// Warnings raised while building the interpolants.
    pub fn warnings(&self) -> &[MeasurementWarning] {
        &self.warnings
    }

    /// Whether either interpolant is missing, so eccentricity is reported as zero.
    pub fn is_degraded(&self) -> bool {
        !(self.omega_peaks.is_available() && self.omega_troughs.is_available())
    }

    /// Span on which eccentricity can be evaluated, `None` when degraded.
    pub fn valid_time_range(&self) -> Option<(f64, f64)> {
        let t_peaks = self.omega_peaks.times()?;
        let t_troughs = self.omega_troughs.times()?;
        Some(valid_time_range(t_peaks, t_troughs))
    }

    /// Eccentricity and mean anomaly at reference times.
    ///
    /// Times outside the valid span are dropped from `tref_out`. When fewer
    /// than two maxima or minima were found, every requested time is kept and
    /// both quantities are zero.
    pub fn measure_at_times(&self, tref_in: &Values) -> EccResult<EccentricityResult> {
        check_finite(tref_in.as_slice(), "tref_in")?;
        let mut warnings = self.warnings.clone();

        let Some((tmin, tmax)) = self.valid_time_range() else {
            let zeros = vec![0.0; tref_in.len()];
            return Ok(EccentricityResult {
                tref_out: tref_in.clone(),
                fref_out: None,
                eccentricity: tref_in.like(zeros.clone()),
                mean_anomaly: tref_in.like(zeros),
                warnings,
                ecc_method: None,
            });
        };

        let tref = filter_reference_times(tref_in.as_slice(), tmin, tmax);
        if tref.is_empty() {
            return Err(EccError::EmptyReference {
                quantity: "tref_in",
                min: tmin,
                max: tmax,
            });
        }
        let (ecc, mean_ano) = self.evaluate_available(&tref, &mut warnings)?;

        Ok(EccentricityResult {
            tref_out: tref_in.like(tref),
            fref_out: None,
            eccentricity: tref_in.like(ecc),
            mean_anomaly: tref_in.like(mean_ano),
            warnings,
            ecc_method: None,
        })
    }

    /// Eccentricity and mean anomaly at reference frequencies.
    ///
    /// Each frequency is mapped to the time where ⟨ω22⟩/2π reaches it.
    /// Frequencies outside the range of ⟨ω22⟩/2π are dropped from `fref_out`.
    pub fn measure_at_frequencies(&self, fref_in: &Values) -> EccResult<EccentricityResult> {
        check_finite(fref_in.as_slice(), "fref_in")?;
        let mut warnings = self.warnings.clone();

        let (times, omega) = self.averaged_omega22()?;
        if omega.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EccError::Numerical {
                message: "orbit averaged omega22 is not monotonically increasing, \
                          reference frequencies cannot be mapped to times"
                    .to_string(),
            });
        }

        let mut fref = Vec::with_capacity(fref_in.len());
        let mut tref = Vec::with_capacity(fref_in.len());
        for &f in fref_in.as_slice() {
            if let Some(t) = invert_increasing(&times, &omega, 2.0 * PI * f) {
                fref.push(f);
                tref.push(t);
            }
        }
        if fref.is_empty() {
            let n = omega.len();
            return Err(EccError::EmptyReference {
                quantity: "fref_in",
                min: omega.first().map_or(f64::NAN, |w| w / (2.0 * PI)),
                max: if n > 0 { omega[n - 1] / (2.0 * PI) } else { f64::NAN },
            });
        }

        let (ecc, mean_ano) = if self.is_degraded() {
            (vec![0.0; tref.len()], vec![0.0; tref.len()])
        } else {
            self.evaluate_available(&tref, &mut warnings)?
        };

        Ok(EccentricityResult {
            tref_out: fref_in.like(tref),
            fref_out: Some(fref_in.like(fref)),
            eccentricity: fref_in.like(ecc),
            mean_anomaly: fref_in.like(mean_ano),
            warnings,
            ecc_method: None,
        })
    }

    /// Dispatch on the kind of reference point.
    pub fn measure(&self, reference: &Reference) -> EccResult<EccentricityResult> {
        match reference {
            Reference::Times(tref_in) => self.measure_at_times(tref_in),
            Reference::Frequencies(fref_in) => self.measure_at_frequencies(fref_in),
        }
    }

    fn evaluate_available(
        &self,
        tref: &[f64],
        warnings: &mut Vec<MeasurementWarning>,
    ) -> EccResult<(Vec<f64>, Vec<f64>)> {
        let (Some(spline_p), Some(spline_t), Some(t_peaks)) = (
            self.omega_peaks.spline(),
            self.omega_troughs.spline(),
            self.omega_peaks.times(),
        ) else {
            return Err(EccError::Numerical {
                message: "omega22 interpolants are not available".to_string(),
            });
        };

        let (ecc, mean_ano) = evaluate(spline_p, spline_t, t_peaks, tref)?;

        if self.extra_config.debug {
            let non_finite = ecc.iter().filter(|e| !e.is_finite()).count();
            if non_finite > 0 {
                push_warning(
                    warnings,
                    MeasurementWarning::NonFiniteEccentricity { count: non_finite },
                );
            }
            let mut below = 0;
            for &t in tref {
                if spline_p.evaluate(t)? < spline_t.evaluate(t)? {
                    below += 1;
                }
            }
            if below > 0 {
                push_warning(warnings, MeasurementWarning::PeaksBelowTroughs { count: below });
            }
        }

        Ok((ecc, mean_ano))
    }

    /// ⟨ω22⟩ sampled on the waveform grid.
    ///
    /// Without interpolants the instantaneous ω22 up to the merger is used.
    fn averaged_omega22(&self) -> EccResult<(Vec<f64>, Vec<f64>)> {
        let pre = &self.preprocessed;
        let (Some(spline_p), Some(spline_t), Some(peaks), Some(troughs)) = (
            self.omega_peaks.spline(),
            self.omega_troughs.spline(),
            self.omega_peaks.extrema(),
            self.omega_troughs.extrema(),
        ) else {
            let end = (pre.merger_index() + 1).min(pre.len());
            return Ok((pre.t[..end].to_vec(), pre.omega22[..end].to_vec()));
        };
        let Some((tmin, tmax)) = self.valid_time_range() else {
            return Ok((Vec::new(), Vec::new()));
        };

        match self.extra_config.omega_averaging {
            OmegaAveraging::OrbitAveraged => {
                let (t_avg, omega_avg) =
                    orbit_averaged_omega22(&pre.t, &pre.phase22, &[peaks, troughs]);
                if t_avg.len() < 2 {
                    return Err(EccError::InsufficientData {
                        required: 2,
                        actual: t_avg.len(),
                        context: "orbit averaged omega22".to_string(),
                    });
                }
                let degree = self.spline_config.degree.min(t_avg.len() - 1);
                let config = SplineConfig {
                    weights: None,
                    bbox: [None, None],
                    ..self.spline_config.with_degree(degree)
                };
                let spline = InterpolatingSpline::new(&t_avg, &omega_avg, &config)?;
                let lo = tmin.max(t_avg[0]);
                let hi = tmax.min(t_avg[t_avg.len() - 1]);
                let times: Vec<f64> = pre
                    .t
                    .iter()
                    .copied()
                    .filter(|&t| t >= lo && t <= hi)
                    .collect();
                let omega = spline.evaluate_many(&times)?;
                Ok((times, omega))
            }
            OmegaAveraging::MeanOfExtremaInterpolants => {
                let times: Vec<f64> = pre
                    .t
                    .iter()
                    .copied()
                    .filter(|&t| t >= tmin && t <= tmax)
                    .collect();
                let omega = times
                    .iter()
                    .map(|&t| Ok(0.5 * (spline_p.evaluate(t)? + spline_t.evaluate(t)?)))
                    .collect::<EccResult<Vec<f64>>>()?;
                Ok((times, omega))
            }
        }
    }
}

fn push_warning(warnings: &mut Vec<MeasurementWarning>, warning: MeasurementWarning) {
    log::warn!("{}", warning);
    warnings.push(warning);
}

/// Measure eccentricity and mean anomaly of a waveform.
///
/// # Arguments
/// * `tref_in` - Reference times on the merger-centered grid
/// * `fref_in` - Reference frequencies; exactly one of `tref_in`/`fref_in`
/// * `data` - Waveform modes and, for residual methods, the zero-eccentricity waveform
/// * `method` - One of [`crate::get_available_methods`]
/// * `spline_config` - Interpolant options, defaults when `None`
/// * `extra_config` - Extrema search and checks, defaults when `None`
/// * `return_ecc_method` - Keep the [`EccMeasurement`] in the result
pub fn measure_eccentricity(
    tref_in: Option<Values>,
    fref_in: Option<Values>,
    data: &WaveformData,
    method: &str,
    spline_config: Option<SplineConfig>,
    extra_config: Option<ExtraConfig>,
    return_ecc_method: bool,
) -> EccResult<EccentricityResult> {
    let reference = Reference::from_arguments(tref_in, fref_in)?;
    let method: EccMethod = method.parse()?;
    let measurement = EccMeasurement::new(
        data,
        method,
        spline_config.unwrap_or_default(),
        extra_config.unwrap_or_default(),
    )?;
    let mut result = measurement.measure(&reference)?;
    if return_ecc_method {
        result.ecc_method = Some(measurement);
    }
    Ok(result)
}

/// One independent measurement in a batch.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub data: WaveformData,
    pub method: String,
    pub reference: Reference,
    pub spline_config: SplineConfig,
    pub extra_config: ExtraConfig,
}

impl BatchJob {
    pub fn new(data: WaveformData, method: &str, reference: Reference) -> Self {
        Self {
            data,
            method: method.to_string(),
            reference,
            spline_config: SplineConfig::default(),
            extra_config: ExtraConfig::default(),
        }
    }

    pub fn run(&self) -> EccResult<EccentricityResult> {
        let method: EccMethod = self.method.parse()?;
        EccMeasurement::new(
            &self.data,
            method,
            self.spline_config.clone(),
            self.extra_config.clone(),
        )?
        .measure(&self.reference)
    }
}

/// Run independent measurements, in parallel with the `parallel` feature.
///
/// Results are returned in job order.
pub fn measure_eccentricity_batch(jobs: &[BatchJob]) -> Vec<EccResult<EccentricityResult>> {
    iter_maybe_parallel!(jobs).map(|job| job.run()).collect()
}
