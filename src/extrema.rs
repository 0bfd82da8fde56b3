//! Local extrema detection with prominence and width filtering.
//!
//! [`find_peaks`] locates local maxima of a sampled signal and filters them by
//! plateau size, height, threshold, distance, prominence and width, in that
//! order. Minima are found by searching the negated signal.

use crate::config::ExtremaFindingConfig;
use crate::error::{EccError, EccResult};
use crate::helpers::argmin_abs_diff;
use crate::preprocess::Preprocessed;
use std::cmp::Ordering;
use std::f64::consts::PI;
use std::fmt;

/// Which extrema to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtremaKind {
    Maxima,
    Minima,
}

impl ExtremaKind {
    fn sign(self) -> f64 {
        match self {
            Self::Maxima => 1.0,
            Self::Minima => -1.0,
        }
    }
}

impl fmt::Display for ExtremaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maxima => write!(f, "maxima"),
            Self::Minima => write!(f, "minima"),
        }
    }
}

/// Sample indices of located extrema, strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremaSet {
    kind: ExtremaKind,
    indices: Vec<usize>,
}

impl ExtremaSet {
    pub fn new(kind: ExtremaKind, indices: Vec<usize>) -> EccResult<Self> {
        if indices.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EccError::NotMonotonic {
                context: format!("{} indices", kind),
            });
        }
        Ok(Self { kind, indices })
    }

    pub fn kind(&self) -> ExtremaKind {
        self.kind
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Values of `series` at the extrema.
    pub fn select(&self, series: &[f64]) -> Vec<f64> {
        self.indices.iter().map(|&i| series[i]).collect()
    }
}

/// Prominences with the bases they were measured against.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakProminences {
    pub prominences: Vec<f64>,
    pub left_bases: Vec<usize>,
    pub right_bases: Vec<usize>,
}

/// Local maxima with flat tops reduced to their midpoint.
///
/// Returns `(peaks, left_edges, right_edges)`.
fn local_maxima(x: &[f64]) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let n = x.len();
    let mut peaks = Vec::new();
    let mut left_edges = Vec::new();
    let mut right_edges = Vec::new();
    if n < 3 {
        return (peaks, left_edges, right_edges);
    }

    let i_max = n - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                let left = i;
                let right = i_ahead - 1;
                peaks.push((left + right) / 2);
                left_edges.push(left);
                right_edges.push(right);
                i = i_ahead;
            }
        }
        i += 1;
    }

    (peaks, left_edges, right_edges)
}

/// Keep the highest peaks so that no two are closer than `distance` samples.
fn select_by_peak_distance(peaks: &[usize], x: &[f64], distance: f64) -> Vec<bool> {
    let n = peaks.len();
    let distance = distance.ceil() as usize;
    let mut keep = vec![true; n];

    let mut priority: Vec<usize> = (0..n).collect();
    priority.sort_by(|&a, &b| {
        x[peaks[b]]
            .partial_cmp(&x[peaks[a]])
            .unwrap_or(Ordering::Equal)
            .then(b.cmp(&a))
    });

    for &j in &priority {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && peaks[j] - peaks[k - 1] < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && peaks[k] - peaks[j] < distance {
            keep[k] = false;
            k += 1;
        }
    }

    keep
}

/// Prominence of each peak, optionally restricted to a window of `wlen` samples.
pub fn peak_prominences(x: &[f64], peaks: &[usize], wlen: Option<f64>) -> PeakProminences {
    let n = x.len();
    let half_window = wlen
        .map(|w| w.ceil())
        .filter(|&w| w > 1.0)
        .map(|w| (w as usize) / 2);

    let mut prominences = Vec::with_capacity(peaks.len());
    let mut left_bases = Vec::with_capacity(peaks.len());
    let mut right_bases = Vec::with_capacity(peaks.len());

    for &peak in peaks {
        let peak_val = x[peak];
        let (i_min, i_max) = match half_window {
            Some(h) => (peak.saturating_sub(h), (peak + h).min(n - 1)),
            None => (0, n - 1),
        };

        let mut left_base = peak;
        let mut left_min = peak_val;
        let mut i = peak;
        loop {
            if x[i] > peak_val {
                break;
            }
            if x[i] < left_min {
                left_min = x[i];
                left_base = i;
            }
            if i == i_min {
                break;
            }
            i -= 1;
        }

        let mut right_base = peak;
        let mut right_min = peak_val;
        let mut i = peak;
        while i <= i_max && x[i] <= peak_val {
            if x[i] < right_min {
                right_min = x[i];
                right_base = i;
            }
            i += 1;
        }

        prominences.push(peak_val - left_min.max(right_min));
        left_bases.push(left_base);
        right_bases.push(right_base);
    }

    PeakProminences {
        prominences,
        left_bases,
        right_bases,
    }
}

/// Width of each peak at `rel_height` of its prominence, in samples.
pub fn peak_widths(x: &[f64], peaks: &[usize], prom: &PeakProminences, rel_height: f64) -> Vec<f64> {
    peaks
        .iter()
        .enumerate()
        .map(|(p, &peak)| {
            let left_base = prom.left_bases[p];
            let right_base = prom.right_bases[p];
            let height = x[peak] - prom.prominences[p] * rel_height;

            let mut i = peak;
            while left_base < i && height < x[i] {
                i -= 1;
            }
            let mut left_ip = i as f64;
            if x[i] < height {
                left_ip += (height - x[i]) / (x[i + 1] - x[i]);
            }

            let mut i = peak;
            while i < right_base && height < x[i] {
                i += 1;
            }
            let mut right_ip = i as f64;
            if x[i] < height {
                right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
            }

            right_ip - left_ip
        })
        .collect()
}

/// Find local maxima of `x` passing every filter in `config`.
pub fn find_peaks(x: &[f64], config: &ExtremaFindingConfig) -> Vec<usize> {
    let (mut peaks, mut left_edges, mut right_edges) = local_maxima(x);

    if let Some(min_size) = config.plateau_size {
        let keep: Vec<bool> = left_edges
            .iter()
            .zip(&right_edges)
            .map(|(&l, &r)| r - l + 1 >= min_size)
            .collect();
        retain_by(&mut peaks, &keep);
        retain_by(&mut left_edges, &keep);
        retain_by(&mut right_edges, &keep);
    }

    if let Some(height) = config.height {
        peaks.retain(|&p| x[p] >= height);
    }

    if let Some(threshold) = config.threshold {
        peaks.retain(|&p| (x[p] - x[p - 1]).min(x[p] - x[p + 1]) >= threshold);
    }

    if let Some(distance) = config.distance {
        if peaks.len() > 1 {
            let keep = select_by_peak_distance(&peaks, x, distance);
            retain_by(&mut peaks, &keep);
        }
    }

    if config.prominence.is_some() || config.width.is_some() {
        let mut prom = peak_prominences(x, &peaks, config.wlen);

        if let Some(min_prominence) = config.prominence {
            let keep: Vec<bool> = prom.prominences.iter().map(|&p| p >= min_prominence).collect();
            retain_by(&mut peaks, &keep);
            retain_by(&mut prom.prominences, &keep);
            retain_by(&mut prom.left_bases, &keep);
            retain_by(&mut prom.right_bases, &keep);
        }

        if let Some(min_width) = config.width {
            let widths = peak_widths(x, &peaks, &prom, config.rel_height);
            let keep: Vec<bool> = widths.iter().map(|&w| w >= min_width).collect();
            retain_by(&mut peaks, &keep);
        }
    }

    peaks
}

fn retain_by<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut flags = keep.iter();
    values.retain(|_| *flags.next().unwrap_or(&false));
}

/// Locate maxima or minima of `series`.
pub fn find_extrema(
    series: &[f64],
    kind: ExtremaKind,
    config: &ExtremaFindingConfig,
) -> EccResult<ExtremaSet> {
    let signed: Vec<f64> = series.iter().map(|&v| kind.sign() * v).collect();
    ExtremaSet::new(kind, find_peaks(&signed, config))
}

/// Number of leading samples searched for extrema.
///
/// With `num_orbits = Some(n)`, the search stops at the sample whose phase22
/// is closest to `n` orbits (4πn in phase22) before the merger. `None`
/// searches the whole waveform.
pub fn merger_cutoff_index(pre: &Preprocessed, num_orbits: Option<f64>) -> usize {
    match num_orbits {
        None => pre.len(),
        Some(n) => {
            let phase_at_merger = pre.phase22[pre.merger_index()];
            let phase_cutoff = phase_at_merger - 4.0 * PI * n;
            argmin_abs_diff(&pre.phase22, phase_cutoff).unwrap_or(0)
        }
    }
}
