//! Error and warning types for eccentricity measurement.
//!
//! Hard failures are reported through [`EccError`]. Recoverable conditions,
//! such as too few extrema to build an interpolant, are collected as
//! [`MeasurementWarning`]s on the result and logged instead.

use crate::extrema::ExtremaKind;
use std::fmt;
use thiserror::Error;

/// Result type for eccentricity measurement operations.
pub type EccResult<T> = Result<T, EccError>;

/// Coarse grouping of [`EccError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or arguments: unknown method, missing data, malformed arrays.
    Configuration,
    /// A requested point lies where the quantity is undefined.
    Domain,
    /// A numerical routine could not produce a usable answer.
    Numerical,
}

/// Errors that can occur while measuring eccentricity.
#[derive(Debug, Clone, Error)]
pub enum EccError {
    /// Method name is not in the registry.
    #[error("Invalid method '{name}', has to be one of {valid:?}")]
    UnknownMethod {
        name: String,
        valid: Vec<&'static str>,
    },

    /// A waveform entry required by the selected method is absent.
    #[error("Missing '{key}' in waveform data, required by {context}")]
    MissingData { key: &'static str, context: String },

    /// Both or neither of `tref_in` and `fref_in` were given.
    #[error("Exactly one of tref_in and fref_in must be provided, got {provided}")]
    ReferenceArguments { provided: &'static str },

    /// Input arrays have mismatched lengths.
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        context: String,
    },

    /// Input array is too small for the requested operation.
    #[error("Insufficient data for {context}: need at least {required}, got {actual}")]
    InsufficientData {
        required: usize,
        actual: usize,
        context: String,
    },

    /// Input abscissae are not strictly increasing.
    #[error("Input values must be strictly increasing in {context}")]
    NotMonotonic { context: String },

    /// Invalid parameter value.
    #[error("Invalid parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Input contains NaN or infinite values.
    #[error("Non-finite value at index {index} in {context}")]
    NonFinite { index: usize, context: String },

    /// Evaluation point is outside the valid domain.
    #[error("Point {point} is outside the domain [{min}, {max}] in {context}")]
    OutOfDomain {
        point: f64,
        min: f64,
        max: f64,
        context: String,
    },

    /// Mean anomaly is undefined without a peak on each side of the point.
    #[error(
        "Reference time {time} must be within two peaks (first peak {first_peak}, last peak {last_peak})"
    )]
    NotBracketed {
        time: f64,
        first_peak: f64,
        last_peak: f64,
    },

    /// Every requested reference point was outside the valid range.
    #[error("No requested {quantity} lies within the valid range [{min}, {max}]")]
    EmptyReference {
        quantity: &'static str,
        min: f64,
        max: f64,
    },

    /// Numerical computation failed (singular system, non-invertible curve).
    #[error("Numerical error: {message}")]
    Numerical { message: String },
}

impl EccError {
    /// Group this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownMethod { .. }
            | Self::MissingData { .. }
            | Self::ReferenceArguments { .. }
            | Self::ShapeMismatch { .. }
            | Self::InsufficientData { .. }
            | Self::NotMonotonic { .. }
            | Self::InvalidParameter { .. }
            | Self::NonFinite { .. } => ErrorKind::Configuration,
            Self::OutOfDomain { .. } | Self::NotBracketed { .. } | Self::EmptyReference { .. } => {
                ErrorKind::Domain
            }
            Self::Numerical { .. } => ErrorKind::Numerical,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    pub fn is_domain(&self) -> bool {
        self.kind() == ErrorKind::Domain
    }
}

/// Recoverable condition encountered during a measurement.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementWarning {
    /// Fewer than two extrema; eccentricity falls back to zero.
    InsufficientExtrema { kind: ExtremaKind, found: usize },
    /// Spline degree lowered because there were too few extrema.
    ReducedSplineDegree {
        kind: ExtremaKind,
        requested: usize,
        used: usize,
    },
    /// Spline weights did not match the number of extrema and were not applied.
    IgnoredSplineWeights {
        kind: ExtremaKind,
        weights: usize,
        extrema: usize,
    },
    /// Eccentricity evaluated to NaN or infinity at some points.
    NonFiniteEccentricity { count: usize },
    /// Peak frequency interpolant fell below the trough interpolant.
    PeaksBelowTroughs { count: usize },
    /// Consecutive extrema are not roughly one orbit apart.
    IrregularExtremaSeparation {
        kind: ExtremaKind,
        index: usize,
        orbits: f64,
    },
}

impl fmt::Display for MeasurementWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientExtrema { kind, found } => write!(
                f,
                "Number of {} is {}, less than 2. Can not create an interpolator. \
                 Most probably the eccentricity is too small, returning zero",
                kind, found
            ),
            Self::ReducedSplineDegree {
                kind,
                requested,
                used,
            } => write!(
                f,
                "Only {} {} found, spline degree reduced from {} to {}",
                used + 1,
                kind,
                requested,
                used
            ),
            Self::IgnoredSplineWeights {
                kind,
                weights,
                extrema,
            } => write!(
                f,
                "{} spline weights given for {} {}, weights not applied",
                weights, extrema, kind
            ),
            Self::NonFiniteEccentricity { count } => {
                write!(f, "Eccentricity is not finite at {} reference points", count)
            }
            Self::PeaksBelowTroughs { count } => write!(
                f,
                "omega22 through maxima is below omega22 through minima at {} reference points",
                count
            ),
            Self::IrregularExtremaSeparation {
                kind,
                index,
                orbits,
            } => write!(
                f,
                "{} {} and {} are separated by {:.3} orbits",
                kind,
                index,
                index + 1,
                orbits
            ),
        }
    }
}
