//! # gwecc-core
//!
//! Eccentricity and mean anomaly of gravitational-wave signals from
//! time-domain waveform modes.
//!
//! The measurement locates periapsis and apoapsis passages as maxima and
//! minima of a series derived from the (2,2) mode, interpolates the (2,2)
//! frequency through each set of extrema and evaluates
//!
//! ```text
//! e(t) = (√ω_p(t) − √ω_t(t)) / (√ω_p(t) + √ω_t(t))
//! ```
//!
//! with a mean anomaly that grows linearly from 0 to 2π between periapses.
//!
//! ## Methods
//!
//! - **Amplitude**: extrema of |h22|
//! - **Frequency**: extrema of ω22
//! - **ResidualAmplitude**: extrema of |h22| minus that of a zero-eccentricity waveform
//! - **ResidualFrequency**: extrema of ω22 minus that of a zero-eccentricity waveform
//!
//! ## Time Convention
//!
//! All times are on the merger-centered grid: the peak of |h22| is at `t = 0`.

#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod parallel;

pub mod config;
pub mod eccentricity;
pub mod error;
pub mod extrema;
pub mod helpers;
pub mod measure;
pub mod methods;
pub mod preprocess;
pub mod simulation;
pub mod spline;
pub mod waveform;

pub use config::{ExtraConfig, ExtrapolateMode, ExtremaFindingConfig, OmegaAveraging, SplineConfig};
pub use error::{EccError, EccResult, ErrorKind, MeasurementWarning};
pub use extrema::{find_peaks, ExtremaKind, ExtremaSet};
pub use measure::{
    measure_eccentricity, measure_eccentricity_batch, BatchJob, EccMeasurement,
    EccentricityResult, Reference, Values,
};
pub use methods::{get_available_methods, EccDefinition, EccMethod};
pub use preprocess::{preprocess, Preprocessed};
pub use spline::InterpolatingSpline;
pub use waveform::{ModeIndex, WaveformData, WaveformModes, MODE_22};
