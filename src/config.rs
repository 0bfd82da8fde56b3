//! Configuration for extrema finding, spline construction and measurement.
//!
//! All structs deserialize with per-field defaults, so a partial JSON object
//! such as `{"num_orbits_to_exclude_before_merger": 2}` is a valid
//! [`ExtraConfig`].

use crate::error::{EccError, EccResult};
use crate::spline::MAX_DEGREE;
use serde::{Deserialize, Serialize};

/// Behaviour of a spline outside its data span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolateMode {
    /// Extend the boundary polynomial pieces.
    Extrapolate,
    /// Return zero.
    Zeros,
    /// Return a domain error.
    Raise,
    /// Return the boundary value.
    Const,
}

impl Default for ExtrapolateMode {
    fn default() -> Self {
        Self::Raise
    }
}

/// Options for the interpolating splines through extrema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplineConfig {
    /// Positive weights, one per data point. Accepted for interface
    /// compatibility; an interpolating spline passes through every point
    /// regardless of weight. When building interpolants through extrema,
    /// weights whose length differs from the number of maxima (or minima)
    /// are dropped for that side with an `IgnoredSplineWeights` warning.
    pub weights: Option<Vec<f64>>,
    /// Boundary of the approximation interval. `None` uses the first/last
    /// data abscissa.
    pub bbox: [Option<f64>; 2],
    /// Polynomial degree, 1..=5.
    pub degree: usize,
    /// Behaviour outside the data span.
    pub ext: ExtrapolateMode,
    /// Reject non-finite input data.
    pub check_finite: bool,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            weights: None,
            bbox: [None, None],
            degree: 3,
            ext: ExtrapolateMode::Raise,
            check_finite: false,
        }
    }
}

impl SplineConfig {
    /// Check that the degree is supported.
    pub fn validate(&self) -> EccResult<()> {
        if (1..=MAX_DEGREE).contains(&self.degree) {
            Ok(())
        } else {
            Err(invalid_owned(
                "degree",
                format!("must be between 1 and {}, got {}", MAX_DEGREE, self.degree),
            ))
        }
    }

    /// Same configuration with a different degree.
    pub fn with_degree(&self, degree: usize) -> Self {
        Self {
            degree,
            ..self.clone()
        }
    }
}

/// Options for locating extrema, mirroring the usual `find_peaks` filters.
///
/// Every filter is a lower bound. Distances, widths, window lengths and
/// plateau sizes are measured in samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremaFindingConfig {
    /// Minimum height of a peak.
    pub height: Option<f64>,
    /// Minimum vertical distance to both neighbouring samples.
    pub threshold: Option<f64>,
    /// Minimum horizontal distance between neighbouring peaks (>= 1).
    pub distance: Option<f64>,
    /// Minimum prominence.
    pub prominence: Option<f64>,
    /// Minimum width at `rel_height` of the prominence.
    pub width: Option<f64>,
    /// Window length used when computing prominences.
    pub wlen: Option<f64>,
    /// Relative height at which widths are measured.
    pub rel_height: f64,
    /// Minimum number of flat samples at the top of a peak.
    pub plateau_size: Option<usize>,
}

impl Default for ExtremaFindingConfig {
    fn default() -> Self {
        Self {
            height: None,
            threshold: None,
            distance: None,
            prominence: None,
            width: Some(10.0),
            wlen: None,
            rel_height: 0.5,
            plateau_size: None,
        }
    }
}

impl ExtremaFindingConfig {
    pub fn validate(&self) -> EccResult<()> {
        if let Some(d) = self.distance {
            if !(d >= 1.0) {
                return Err(invalid("distance", "must be >= 1"));
            }
        }
        if !(self.rel_height >= 0.0) {
            return Err(invalid("rel_height", "must be non-negative"));
        }
        for (name, value) in [
            ("height", self.height),
            ("threshold", self.threshold),
            ("prominence", self.prominence),
            ("width", self.width),
            ("wlen", self.wlen),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(invalid(name, "must be finite"));
                }
            }
        }
        Ok(())
    }
}

/// How the orbit-averaged (2,2) frequency is built for reference frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OmegaAveraging {
    /// Phase advance divided by elapsed time between consecutive extrema.
    OrbitAveraged,
    /// Mean of the interpolants through maxima and minima.
    MeanOfExtremaInterpolants,
}

impl Default for OmegaAveraging {
    fn default() -> Self {
        Self::OrbitAveraged
    }
}

/// Measurement options beyond the spline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraConfig {
    /// Orbits before merger to drop when searching for extrema. `None` keeps
    /// the full waveform, including post-merger data.
    pub num_orbits_to_exclude_before_merger: Option<f64>,
    /// Options forwarded to the extrema locator.
    pub extrema_finding: ExtremaFindingConfig,
    /// Run additional sanity checks and report them as warnings.
    pub debug: bool,
    /// Averaging used to map reference frequencies to times.
    pub omega_averaging: OmegaAveraging,
}

impl Default for ExtraConfig {
    fn default() -> Self {
        Self {
            num_orbits_to_exclude_before_merger: Some(1.0),
            extrema_finding: ExtremaFindingConfig::default(),
            debug: true,
            omega_averaging: OmegaAveraging::default(),
        }
    }
}

impl ExtraConfig {
    pub fn validate(&self) -> EccResult<()> {
        if let Some(n) = self.num_orbits_to_exclude_before_merger {
            if !n.is_finite() || n < 0.0 {
                return Err(invalid(
                    "num_orbits_to_exclude_before_merger",
                    "must be None or a non-negative real number",
                ));
            }
        }
        self.extrema_finding.validate()
    }
}

fn invalid(parameter: &str, message: &str) -> EccError {
    invalid_owned(parameter, message.to_string())
}

fn invalid_owned(parameter: &str, message: String) -> EccError {
    EccError::InvalidParameter {
        parameter: parameter.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let extra = ExtraConfig::default();
        assert_eq!(extra.num_orbits_to_exclude_before_merger, Some(1.0));
        assert!(extra.debug);
        assert_eq!(extra.extrema_finding.width, Some(10.0));
        assert_eq!(extra.extrema_finding.rel_height, 0.5);

        let spline = SplineConfig::default();
        assert_eq!(spline.degree, 3);
        assert_eq!(spline.ext, ExtrapolateMode::Raise);
        assert!(!spline.check_finite);
    }

    #[test]
    fn test_validation() {
        let mut extra = ExtraConfig::default();
        assert!(extra.validate().is_ok());

        extra.num_orbits_to_exclude_before_merger = Some(-1.0);
        assert!(extra.validate().is_err());

        extra.num_orbits_to_exclude_before_merger = None;
        extra.extrema_finding.distance = Some(0.5);
        assert!(extra.validate().is_err());

        let spline = SplineConfig::default();
        assert!(spline.validate().is_ok());
        assert!(spline.with_degree(MAX_DEGREE).validate().is_ok());
        for degree in [0, MAX_DEGREE + 1] {
            let err = spline.with_degree(degree).validate().unwrap_err();
            assert!(err.to_string().contains("must be between 1 and 5"));
        }
    }
}
