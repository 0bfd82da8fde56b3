//! Eccentricity definitions and the method registry.
//!
//! Every definition shares the same pipeline and differs only in the series
//! searched for extrema. Residual definitions subtract the merger-aligned
//! zero-eccentricity series first, which isolates the eccentricity-induced
//! oscillations from the secular chirp.

use crate::config::{ExtrapolateMode, SplineConfig};
use crate::error::{EccError, EccResult};
use crate::preprocess::Preprocessed;
use crate::spline::InterpolatingSpline;
use std::fmt;
use std::str::FromStr;

/// Series selection strategy for one eccentricity definition.
pub trait EccDefinition: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Whether `t_zeroecc`/`hlm_zeroecc` must be supplied.
    fn requires_zeroecc(&self) -> bool {
        false
    }

    /// Series whose maxima and minima mark periapsis and apoapsis passages.
    ///
    /// `zeroecc` is the preprocessed zero-eccentricity waveform when the
    /// definition requires one.
    fn data_for_finding_extrema(
        &self,
        ecc: &Preprocessed,
        zeroecc: Option<&Preprocessed>,
    ) -> EccResult<Vec<f64>>;
}

/// Extrema of the (2,2) amplitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmplitudeMethod;

/// Extrema of the (2,2) frequency.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyMethod;

/// Extrema of the amplitude minus the zero-eccentricity amplitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidualAmplitudeMethod;

/// Extrema of the frequency minus the zero-eccentricity frequency.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidualFrequencyMethod;

impl EccDefinition for AmplitudeMethod {
    fn name(&self) -> &'static str {
        "Amplitude"
    }

    fn data_for_finding_extrema(
        &self,
        ecc: &Preprocessed,
        _zeroecc: Option<&Preprocessed>,
    ) -> EccResult<Vec<f64>> {
        Ok(ecc.amp22.clone())
    }
}

impl EccDefinition for FrequencyMethod {
    fn name(&self) -> &'static str {
        "Frequency"
    }

    fn data_for_finding_extrema(
        &self,
        ecc: &Preprocessed,
        _zeroecc: Option<&Preprocessed>,
    ) -> EccResult<Vec<f64>> {
        Ok(ecc.omega22.clone())
    }
}

impl EccDefinition for ResidualAmplitudeMethod {
    fn name(&self) -> &'static str {
        "ResidualAmplitude"
    }

    fn requires_zeroecc(&self) -> bool {
        true
    }

    fn data_for_finding_extrema(
        &self,
        ecc: &Preprocessed,
        zeroecc: Option<&Preprocessed>,
    ) -> EccResult<Vec<f64>> {
        let zeroecc = require_zeroecc(zeroecc, self.name())?;
        let reference = zeroecc_on_grid(&ecc.t, &zeroecc.t, &zeroecc.amp22)?;
        Ok(subtract(&ecc.amp22, &reference))
    }
}

impl EccDefinition for ResidualFrequencyMethod {
    fn name(&self) -> &'static str {
        "ResidualFrequency"
    }

    fn requires_zeroecc(&self) -> bool {
        true
    }

    fn data_for_finding_extrema(
        &self,
        ecc: &Preprocessed,
        zeroecc: Option<&Preprocessed>,
    ) -> EccResult<Vec<f64>> {
        let zeroecc = require_zeroecc(zeroecc, self.name())?;
        let reference = zeroecc_on_grid(&ecc.t, &zeroecc.t, &zeroecc.omega22)?;
        Ok(subtract(&ecc.omega22, &reference))
    }
}

fn require_zeroecc<'a>(
    zeroecc: Option<&'a Preprocessed>,
    method: &str,
) -> EccResult<&'a Preprocessed> {
    zeroecc.ok_or_else(|| EccError::MissingData {
        key: "hlm_zeroecc",
        context: format!("method {}", method),
    })
}

fn subtract(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Cubic interpolation of a zero-eccentricity series onto the eccentric grid.
///
/// Both grids are merger-centered. The zero-eccentricity grid must cover the
/// eccentric one.
pub fn zeroecc_on_grid(t: &[f64], t_zeroecc: &[f64], series: &[f64]) -> EccResult<Vec<f64>> {
    let (Some(&t_first), Some(&t_last)) = (t.first(), t.last()) else {
        return Ok(Vec::new());
    };
    let (Some(&z_first), Some(&z_last)) = (t_zeroecc.first(), t_zeroecc.last()) else {
        return Err(EccError::MissingData {
            key: "t_zeroecc",
            context: "residual series".to_string(),
        });
    };
    if z_first > t_first || z_last < t_last {
        return Err(EccError::InvalidParameter {
            parameter: "t_zeroecc".to_string(),
            message: format!(
                "zero eccentricity waveform spans [{}, {}] after merger alignment, \
                 which does not cover the eccentric waveform span [{}, {}]",
                z_first, z_last, t_first, t_last
            ),
        });
    }

    let config = SplineConfig {
        ext: ExtrapolateMode::Raise,
        ..SplineConfig::default()
    };
    let spline = InterpolatingSpline::new(t_zeroecc, series, &config)?;
    spline.evaluate_many(t)
}

/// Registered eccentricity definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EccMethod {
    Amplitude,
    Frequency,
    ResidualAmplitude,
    ResidualFrequency,
}

impl EccMethod {
    pub const ALL: [EccMethod; 4] = [
        EccMethod::Amplitude,
        EccMethod::Frequency,
        EccMethod::ResidualAmplitude,
        EccMethod::ResidualFrequency,
    ];

    /// Strategy implementing this method.
    pub fn definition(self) -> &'static dyn EccDefinition {
        match self {
            EccMethod::Amplitude => &AmplitudeMethod,
            EccMethod::Frequency => &FrequencyMethod,
            EccMethod::ResidualAmplitude => &ResidualAmplitudeMethod,
            EccMethod::ResidualFrequency => &ResidualFrequencyMethod,
        }
    }

    pub fn name(self) -> &'static str {
        self.definition().name()
    }
}

impl fmt::Display for EccMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EccMethod {
    type Err = EccError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EccMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| EccError::UnknownMethod {
                name: s.to_string(),
                valid: get_available_methods(),
            })
    }
}

/// Names accepted by [`crate::measure_eccentricity`].
pub fn get_available_methods() -> Vec<&'static str> {
    EccMethod::ALL.iter().map(|m| m.name()).collect()
}
