//! Read-only measurements over an archive.
//!
//! Peaks follow NaN: a snapshot holding a NaN reports NaN as its maximum and
//! the first NaN as its argmax, so a diverged run can not hide behind the
//! finite samples that remain.

use crate::archive::SolutionArchive;
use crate::error::{SurgeError, SurgeResult};
use crate::grid::GridSpec;
use crate::traits::Scalar;
use serde::{Deserialize, Serialize};

/// Ratio by which the late-run mean peak may exceed the early-run mean before
/// a run counts as growing.
pub const DEFAULT_GROWTH_TOLERANCE: f64 = 1.05;

/// Tunable knobs of the split-in-half growth detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityHeuristic {
    pub growth_tolerance: f64,
}

impl Default for StabilityHeuristic {
    fn default() -> Self {
        Self {
            growth_tolerance: DEFAULT_GROWTH_TOLERANCE,
        }
    }
}

fn peak<T: Scalar>(snapshot: &[T]) -> T {
    let mut best = T::neg_infinity();
    for &v in snapshot {
        if v.is_nan() {
            return v;
        }
        if v > best {
            best = v;
        }
    }
    best
}

fn argmax<T: Scalar>(snapshot: &[T]) -> usize {
    let mut best_idx = 0;
    let mut best = T::neg_infinity();
    for (idx, &v) in snapshot.iter().enumerate() {
        if v.is_nan() {
            return idx;
        }
        if v > best {
            best = v;
            best_idx = idx;
        }
    }
    best_idx
}

fn mean<T: Scalar>(values: &[T]) -> T {
    let total = values.iter().fold(T::zero(), |acc, &v| acc + v);
    total / T::from_real(values.len() as f64)
}

/// Riemann sum `dx * sum(u)` for every snapshot.
pub fn integral<T: Scalar>(archive: &SolutionArchive<T>, dx: T) -> Vec<T> {
    archive
        .iter()
        .map(|s| s.iter().fold(T::zero(), |acc, &v| acc + v) * dx)
        .collect()
}

/// `dx * sum(u^2)` for every snapshot.
pub fn integral_squared<T: Scalar>(archive: &SolutionArchive<T>, dx: T) -> Vec<T> {
    archive
        .iter()
        .map(|s| s.iter().fold(T::zero(), |acc, &v| acc + v * v) * dx)
        .collect()
}

/// Maximum of every snapshot after the initial one.
pub fn peak_amplitude<T: Scalar>(archive: &SolutionArchive<T>) -> Vec<T> {
    archive.iter().skip(1).map(peak).collect()
}

/// Sample index of the maximum of every snapshot after the initial one.
pub fn peak_position<T: Scalar>(archive: &SolutionArchive<T>) -> Vec<usize> {
    archive.iter().skip(1).map(argmax).collect()
}

/// Heuristic growth check: true when the mean peak over the first half of the
/// run, scaled by the tolerance, exceeds the mean over the second half (last
/// peak excluded).
///
/// This is not a stability proof. It assumes the peak should not grow, shifts
/// with run length and split point, and needs at least three post-initial
/// snapshots.
pub fn stability_verdict<T: Scalar>(
    archive: &SolutionArchive<T>,
    heuristic: StabilityHeuristic,
) -> SurgeResult<bool> {
    let peaks = peak_amplitude(archive);
    let half = peaks.len() / 2;
    if half == 0 || peaks.len() - 1 <= half {
        return Err(SurgeError::degenerate(format!(
            "Stability verdict needs at least 3 post-initial snapshots, got {}.",
            peaks.len()
        )));
    }

    let early = mean(&peaks[..half]);
    let late = mean(&peaks[half..peaks.len() - 1]);
    Ok(early * T::from_real(heuristic.growth_tolerance) > late)
}

/// Mean translation speed of the dominant peak between the first and last
/// snapshot. Only meaningful while the peak has not wrapped around.
pub fn average_velocity<T: Scalar>(
    archive: &SolutionArchive<T>,
    spec: &GridSpec<T>,
) -> SurgeResult<T> {
    let span = spec.t_end - spec.t_start;
    if span <= T::zero() {
        return Err(SurgeError::degenerate(
            "Average velocity needs a positive time span.",
        ));
    }
    let start = argmax(archive.initial()) as f64;
    let end = argmax(archive.latest()) as f64;
    Ok(T::from_real(end - start) * spec.dx / span)
}

/// Difference between the final peak positions of a reference run and a run
/// with an interaction, in samples.
pub fn phase_shift<T: Scalar>(
    interacting: &SolutionArchive<T>,
    reference: &SolutionArchive<T>,
) -> SurgeResult<isize> {
    if interacting.len() < 2 || reference.len() < 2 {
        return Err(SurgeError::degenerate(
            "Phase shift needs propagated archives.",
        ));
    }
    let moved = argmax(interacting.latest()) as isize;
    let free = argmax(reference.latest()) as isize;
    Ok(free - moved)
}

/// Index of the first snapshot holding a NaN or infinity.
pub fn first_non_finite<T: Scalar>(archive: &SolutionArchive<T>) -> Option<usize> {
    archive
        .iter()
        .position(|s| s.iter().any(|v| !v.is_finite()))
}

/// Every diagnostic in one serialisable bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport<T> {
    pub integral: Vec<T>,
    pub integral_squared: Vec<T>,
    pub peak_amplitude: Vec<T>,
    pub peak_position: Vec<usize>,
    /// `None` when the run is too short for the heuristic.
    pub stable: Option<bool>,
    pub average_velocity: Option<T>,
    pub first_non_finite: Option<usize>,
}

pub fn summarize<T: Scalar>(
    archive: &SolutionArchive<T>,
    spec: &GridSpec<T>,
    heuristic: StabilityHeuristic,
) -> DiagnosticsReport<T> {
    DiagnosticsReport {
        integral: integral(archive, spec.dx),
        integral_squared: integral_squared(archive, spec.dx),
        peak_amplitude: peak_amplitude(archive),
        peak_position: peak_position(archive),
        stable: stability_verdict(archive, heuristic).ok(),
        average_velocity: average_velocity(archive, spec).ok(),
        first_non_finite: first_non_finite(archive),
    }
}
