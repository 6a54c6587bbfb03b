//! Solver lifecycle.
//!
//! A [`Solver`] is the constructed state: the grid is built, the initial
//! condition is archived and integration can proceed in batches. Calling
//! [`Solver::propagate`] consumes it and yields a [`Solution`] whose archive is
//! frozen, so a run can not be propagated twice.

use crate::archive::SolutionArchive;
use crate::diagnostics::{self, DiagnosticsReport, StabilityHeuristic};
use crate::error::SurgeResult;
use crate::flux::{EquationParameters, Flux};
use crate::grid::{Axis, Grid, GridSpec};
use crate::initial::sample;
use crate::solvers::RK4;
use crate::traits::{FluxModel, InitialCondition, Scalar};
use serde::Serialize;

/// Progress of a batched propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub steps_done: usize,
    pub total_steps: usize,
    pub done: bool,
}

pub struct Solver<T: Scalar, F: FluxModel<T>> {
    grid: Grid<T>,
    flux: F,
    stepper: RK4<T>,
    archive: SolutionArchive<T>,
}

impl<T: Scalar> Solver<T, Flux<T>> {
    /// Builds the grid and flux for `params` and archives the sampled initial condition.
    pub fn new<IC>(spec: GridSpec<T>, params: EquationParameters<T>, initial: &IC) -> SurgeResult<Self>
    where
        IC: InitialCondition<T> + ?Sized,
    {
        params.validate()?;
        let flux = params.equation.flux(spec.dx, spec.dt);
        Self::with_flux(spec, flux, initial, params.amplitude)
    }
}

impl<T: Scalar, F: FluxModel<T>> Solver<T, F> {
    pub fn with_flux<IC>(spec: GridSpec<T>, flux: F, initial: &IC, amplitude: T) -> SurgeResult<Self>
    where
        IC: InitialCondition<T> + ?Sized,
    {
        let grid = spec.build()?;
        let state = sample(initial, grid.space(), spec.t_start, amplitude);
        let points = state.len();
        let snapshots = grid.time().len();

        let archive = SolutionArchive::new(state, snapshots)?;

        tracing::debug!(points, snapshots, "solver constructed");

        Ok(Self {
            stepper: RK4::new(points),
            archive,
            grid,
            flux,
        })
    }

    pub fn grid(&self) -> &Grid<T> {
        &self.grid
    }

    pub fn spec(&self) -> &GridSpec<T> {
        self.grid.spec()
    }

    pub fn spatial_axis(&self) -> &Axis<T> {
        self.grid.space()
    }

    pub fn temporal_axis(&self) -> &Axis<T> {
        self.grid.time()
    }

    pub fn archive(&self) -> &SolutionArchive<T> {
        &self.archive
    }

    /// Steps between the initial sample and the last temporal sample.
    pub fn total_steps(&self) -> usize {
        self.grid.time().len() - 1
    }

    pub fn steps_done(&self) -> usize {
        self.archive.len() - 1
    }

    pub fn is_done(&self) -> bool {
        self.steps_done() >= self.total_steps()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            steps_done: self.steps_done(),
            total_steps: self.total_steps(),
            done: self.is_done(),
        }
    }

    /// Advances at most `max_steps` steps, never past the last temporal sample.
    pub fn run_steps(&mut self, max_steps: usize) -> Progress {
        let remaining = self.total_steps() - self.steps_done();
        for _ in 0..max_steps.min(remaining) {
            let mut next = vec![T::zero(); self.archive.points()];
            self.stepper
                .advance(&self.flux, self.archive.latest(), &mut next);
            self.archive.push(next);
        }
        self.progress()
    }

    /// Runs all remaining steps and freezes the archive.
    pub fn propagate(mut self) -> Solution<T> {
        self.run_steps(self.total_steps());

        tracing::info!(
            snapshots = self.archive.len(),
            points = self.archive.points(),
            "propagation complete"
        );
        if let Some(index) = diagnostics::first_non_finite(&self.archive) {
            tracing::warn!(snapshot = index, "solution diverged to non-finite values");
        }

        Solution {
            grid: self.grid,
            archive: self.archive,
        }
    }

    pub fn diagnostics(&self, heuristic: StabilityHeuristic) -> DiagnosticsReport<T> {
        diagnostics::summarize(&self.archive, self.grid.spec(), heuristic)
    }
}

/// A fully propagated run. Read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<T> {
    grid: Grid<T>,
    archive: SolutionArchive<T>,
}

impl<T: Scalar> Solution<T> {
    pub fn grid(&self) -> &Grid<T> {
        &self.grid
    }

    pub fn spec(&self) -> &GridSpec<T> {
        self.grid.spec()
    }

    pub fn spatial_axis(&self) -> &Axis<T> {
        self.grid.space()
    }

    pub fn temporal_axis(&self) -> &Axis<T> {
        self.grid.time()
    }

    pub fn archive(&self) -> &SolutionArchive<T> {
        &self.archive
    }

    pub fn snapshot(&self, step: usize) -> Option<&[T]> {
        self.archive.get(step)
    }

    pub fn integral(&self) -> Vec<T> {
        diagnostics::integral(&self.archive, self.grid.dx())
    }

    pub fn integral_squared(&self) -> Vec<T> {
        diagnostics::integral_squared(&self.archive, self.grid.dx())
    }

    pub fn peak_amplitude(&self) -> Vec<T> {
        diagnostics::peak_amplitude(&self.archive)
    }

    pub fn peak_position(&self) -> Vec<usize> {
        diagnostics::peak_position(&self.archive)
    }

    /// Verdict under the default 1.05 growth tolerance.
    pub fn stability_verdict(&self) -> SurgeResult<bool> {
        self.stability_verdict_with(StabilityHeuristic::default())
    }

    pub fn stability_verdict_with(&self, heuristic: StabilityHeuristic) -> SurgeResult<bool> {
        diagnostics::stability_verdict(&self.archive, heuristic)
    }

    pub fn average_velocity(&self) -> SurgeResult<T> {
        diagnostics::average_velocity(&self.archive, self.grid.spec())
    }

    pub fn diagnostics(&self, heuristic: StabilityHeuristic) -> DiagnosticsReport<T> {
        diagnostics::summarize(&self.archive, self.grid.spec(), heuristic)
    }
}
