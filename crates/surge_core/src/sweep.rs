//! Parameter sweeps over independent solver runs.
//!
//! Runs share nothing, so they are spread over a worker pool when the
//! `parallel` feature is on. Cancellation is checked before each run starts;
//! a run that has started always finishes.

use crate::diagnostics::StabilityHeuristic;
use crate::flux::EquationParameters;
use crate::grid::GridSpec;
use crate::initial::Profile;
use crate::solver::Solver;
use anyhow::{anyhow, bail, Context, Result};
use nalgebra::{DMatrix, DVector};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a sweep between runs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// `start, start + step, ...` strictly below `end`.
pub fn arange(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    if !step.is_finite() || step <= 0.0 {
        bail!("Step must be positive and finite.");
    }
    if !start.is_finite() || !end.is_finite() {
        bail!("Range bounds must be finite.");
    }
    let count = ((end - start) / step)
        .ceil()
        .max(0.0)
        .to_usize()
        .ok_or_else(|| anyhow!("Range holds too many samples."))?;
    let mut values = Vec::new();
    values
        .try_reserve_exact(count)
        .map_err(|_| anyhow!("Range holds too many samples."))?;
    values.extend((0..count).map(|i| start + i as f64 * step));
    Ok(values)
}

fn map_runs<I, R, F>(items: &[I], cancel: &CancelToken, run: F) -> Result<Vec<R>>
where
    I: Sync,
    R: Send,
    F: Fn(&I) -> Result<R> + Sync + Send,
{
    let guarded = |item: &I| {
        if cancel.is_cancelled() {
            bail!("Sweep cancelled.");
        }
        run(item)
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        items.par_iter().map(guarded).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(guarded).collect()
    }
}

/// Each amplitude is measured once per grid; several grids show how the
/// measured speed converges with resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocitySweepSettings {
    pub grids: Vec<GridSpec<f64>>,
    pub profile: Profile,
}

impl Default for VelocitySweepSettings {
    fn default() -> Self {
        let grid = |dx: f64, dt: f64| GridSpec {
            x_start: 0.0,
            x_end: 500.0,
            t_start: 0.0,
            t_end: 1.0,
            dx,
            dt,
        };
        Self {
            grids: vec![grid(0.1, 0.001), grid(0.09, 0.09 * 0.09 * 0.09)],
            profile: Profile::Soliton,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocitySample {
    pub amplitude: f64,
    /// Spatial step of the grid the run used.
    pub dx: f64,
    pub velocity: f64,
    /// Continuum soliton speed `4 a^2`.
    pub theoretical: f64,
}

/// Measures the dispersive-equation peak velocity for each amplitude on every
/// grid. Samples are ordered grid by grid, amplitudes in input order.
pub fn velocity_scan(
    amplitudes: &[f64],
    settings: &VelocitySweepSettings,
    cancel: &CancelToken,
) -> Result<Vec<VelocitySample>> {
    if amplitudes.is_empty() {
        bail!("Velocity scan needs at least one amplitude.");
    }
    if settings.grids.is_empty() {
        bail!("Velocity scan needs at least one grid.");
    }
    for grid in &settings.grids {
        grid.validate().context("Invalid velocity sweep grid")?;
    }

    let runs: Vec<(GridSpec<f64>, f64)> = settings
        .grids
        .iter()
        .flat_map(|&grid| amplitudes.iter().map(move |&amplitude| (grid, amplitude)))
        .collect();

    map_runs(&runs, cancel, |&(grid, amplitude)| {
        let solution = Solver::new(
            grid,
            EquationParameters::dispersive(amplitude),
            &settings.profile,
        )?
        .propagate();
        let velocity = solution
            .average_velocity()
            .with_context(|| format!("Velocity undefined for amplitude {amplitude}"))?;
        tracing::debug!(amplitude, dx = grid.dx, velocity, "velocity run finished");
        Ok(VelocitySample {
            amplitude,
            dx: grid.dx,
            velocity,
            theoretical: 4.0 * amplitude * amplitude,
        })
    })
}

/// Extents of the critical step search; `dt` is always `dx^3`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalStepSettings {
    pub x_start: f64,
    pub x_end: f64,
    pub t_start: f64,
    pub t_end: f64,
    pub profile: Profile,
    pub heuristic: StabilityHeuristic,
}

impl Default for CriticalStepSettings {
    fn default() -> Self {
        Self {
            x_start: 0.0,
            x_end: 60.0,
            t_start: 0.0,
            t_end: 2.0,
            profile: Profile::Soliton,
            heuristic: StabilityHeuristic::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalStep {
    pub amplitude: f64,
    /// First candidate `dx` whose run failed the stability verdict.
    pub critical_dx: Option<f64>,
}

/// Least-squares fit of `ln y = slope * ln x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerLawFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalStepReport {
    pub samples: Vec<CriticalStep>,
    /// Present once two or more amplitudes found a critical step.
    pub fit: Option<PowerLawFit>,
}

fn critical_dx(
    amplitude: f64,
    steps: &[f64],
    settings: &CriticalStepSettings,
    cancel: &CancelToken,
) -> Result<Option<f64>> {
    for &dx in steps {
        if cancel.is_cancelled() {
            bail!("Sweep cancelled.");
        }
        let spec = GridSpec::new(
            settings.x_start,
            settings.x_end,
            settings.t_start,
            settings.t_end,
            dx,
            dx * dx * dx,
        )?;
        let solution = Solver::new(spec, EquationParameters::dispersive(amplitude), &settings.profile)?
            .propagate();
        let stable = crate::diagnostics::stability_verdict(solution.archive(), settings.heuristic)
            .with_context(|| format!("Stability undefined for amplitude {amplitude}, dx {dx}"))?;
        tracing::debug!(amplitude, dx, stable, "stability run finished");
        if !stable {
            return Ok(Some(dx));
        }
    }
    Ok(None)
}

/// For each amplitude, scans `steps` in order for the first unstable `dx`
/// (with `dt = dx^3`) and fits a power law through the results.
pub fn critical_step_scan(
    amplitudes: &[f64],
    steps: &[f64],
    settings: &CriticalStepSettings,
    cancel: &CancelToken,
) -> Result<CriticalStepReport> {
    if amplitudes.is_empty() {
        bail!("Critical step scan needs at least one amplitude.");
    }
    if steps.is_empty() {
        bail!("Critical step scan needs at least one candidate step.");
    }
    if steps.iter().any(|&dx| dx.is_nan() || dx <= 0.0) {
        bail!("Candidate steps must be positive.");
    }

    let samples = map_runs(amplitudes, cancel, |&amplitude| {
        Ok(CriticalStep {
            amplitude,
            critical_dx: critical_dx(amplitude, steps, settings, cancel)?,
        })
    })?;

    let (xs, ys): (Vec<f64>, Vec<f64>) = samples
        .iter()
        .filter_map(|s| s.critical_dx.map(|dx| (s.amplitude, dx)))
        .unzip();
    let fit = if xs.len() >= 2 {
        Some(power_law_fit(&xs, &ys)?)
    } else {
        None
    };

    Ok(CriticalStepReport { samples, fit })
}

/// Linear regression in log-log space.
pub fn power_law_fit(xs: &[f64], ys: &[f64]) -> Result<PowerLawFit> {
    if xs.len() != ys.len() {
        bail!(
            "Series length mismatch. Expected {}, got {}.",
            xs.len(),
            ys.len()
        );
    }
    if xs.len() < 2 {
        bail!("Power law fit needs at least two points.");
    }
    if xs.iter().chain(ys).any(|&v| v.is_nan() || v <= 0.0) {
        bail!("Power law fit needs strictly positive values.");
    }

    let n = xs.len();
    let lx: Vec<f64> = xs.iter().map(|v| v.ln()).collect();
    let ly = DVector::from_iterator(n, ys.iter().map(|v| v.ln()));

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { lx[i] } else { 1.0 });
    let svd = design.clone().svd(true, true);
    if svd.rank(1e-12) < 2 {
        bail!("Power law fit needs at least two distinct x values.");
    }
    let coefficients = svd
        .solve(&ly, 1e-12)
        .map_err(|e| anyhow!("Least-squares solve failed: {e}"))?;

    // r from the coefficient of determination, signed like the slope
    let residual = (&design * &coefficients - &ly).norm_squared();
    let mean_y = ly.mean();
    let total = ly.iter().map(|y| (y - mean_y).powi(2)).sum::<f64>();
    let r_value = if total <= 0.0 {
        0.0
    } else {
        (1.0 - residual / total).max(0.0).sqrt().copysign(coefficients[0])
    };

    Ok(PowerLawFit {
        slope: coefficients[0],
        intercept: coefficients[1],
        r_value,
    })
}
