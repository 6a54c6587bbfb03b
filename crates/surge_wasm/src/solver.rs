//! Stepped solver runner.

use anyhow::Context;
use js_sys::Float64Array;
use serde_wasm_bindgen::{from_value, to_value};
use surge_core::archive::SolutionArchive;
use surge_core::diagnostics::StabilityHeuristic;
use surge_core::flux::Flux;
use surge_core::grid::Grid;
use surge_core::solver::Progress;
use surge_core::{EquationParameters, GridSpec, Profile, Solution, Solver};
use wasm_bindgen::prelude::*;

pub(crate) enum Run {
    Running(Solver<f64, Flux<f64>>),
    Finished(Solution<f64>),
}

impl Run {
    pub(crate) fn build(
        profile: Profile,
        params: EquationParameters<f64>,
        grid: GridSpec<f64>,
    ) -> anyhow::Result<Self> {
        let solver = Solver::new(grid, params, &profile).context("Solver init failed")?;
        Ok(Run::Running(solver))
    }

    fn archive(&self) -> &SolutionArchive<f64> {
        match self {
            Run::Running(solver) => solver.archive(),
            Run::Finished(solution) => solution.archive(),
        }
    }

    fn grid(&self) -> &Grid<f64> {
        match self {
            Run::Running(solver) => solver.grid(),
            Run::Finished(solution) => solution.grid(),
        }
    }

    /// Runs up to `batch` steps, freezing the run once the last sample is reached.
    pub(crate) fn advance(self, batch: usize) -> (Self, Progress) {
        match self {
            Run::Running(mut solver) => {
                let progress = solver.run_steps(batch);
                if progress.done {
                    (Run::Finished(solver.propagate()), progress)
                } else {
                    (Run::Running(solver), progress)
                }
            }
            Run::Finished(solution) => {
                let total = solution.archive().len() - 1;
                let progress = Progress {
                    steps_done: total,
                    total_steps: total,
                    done: true,
                };
                (Run::Finished(solution), progress)
            }
        }
    }
}

/// WASM-exported solver that propagates in batches so the page stays responsive.
#[wasm_bindgen]
pub struct WasmSolver {
    run: Option<Run>,
}

impl WasmSolver {
    fn run(&self) -> Result<&Run, JsValue> {
        self.run
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Solver not initialized"))
    }
}

#[wasm_bindgen]
impl WasmSolver {
    /// Create a solver from serialized `Profile`, `EquationParameters` and `GridSpec` values.
    #[wasm_bindgen(constructor)]
    pub fn new(
        profile_val: JsValue,
        params_val: JsValue,
        grid_val: JsValue,
    ) -> Result<WasmSolver, JsValue> {
        console_error_panic_hook::set_once();

        let profile: Profile = from_value(profile_val)
            .map_err(|e| JsValue::from_str(&format!("Invalid profile: {}", e)))?;
        let params: EquationParameters<f64> = from_value(params_val)
            .map_err(|e| JsValue::from_str(&format!("Invalid equation parameters: {}", e)))?;
        let grid: GridSpec<f64> = from_value(grid_val)
            .map_err(|e| JsValue::from_str(&format!("Invalid grid: {}", e)))?;

        let run = Run::build(profile, params, grid)
            .map_err(|e| JsValue::from_str(&format!("{:#}", e)))?;

        Ok(WasmSolver { run: Some(run) })
    }

    pub fn is_done(&self) -> bool {
        matches!(self.run, Some(Run::Finished(_)))
    }

    /// Run a batch of steps and return progress.
    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let run = self
            .run
            .take()
            .ok_or_else(|| JsValue::from_str("Solver not initialized"))?;
        let (run, progress) = run.advance(batch_size as usize);
        self.run = Some(run);

        to_value(&progress).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn snapshot_count(&self) -> Result<u32, JsValue> {
        Ok(self.run()?.archive().len() as u32)
    }

    pub fn snapshot(&self, index: u32) -> Result<Float64Array, JsValue> {
        let snapshot = self
            .run()?
            .archive()
            .get(index as usize)
            .ok_or_else(|| JsValue::from_str(&format!("No snapshot at index {}", index)))?;
        Ok(Float64Array::from(snapshot))
    }

    pub fn spatial_axis(&self) -> Result<Float64Array, JsValue> {
        Ok(Float64Array::from(self.run()?.grid().space().values()))
    }

    pub fn temporal_axis(&self) -> Result<Float64Array, JsValue> {
        Ok(Float64Array::from(self.run()?.grid().time().values()))
    }

    /// All diagnostics of the snapshots archived so far.
    pub fn diagnostics(&self, growth_tolerance: Option<f64>) -> Result<JsValue, JsValue> {
        let run = self.run()?;
        let heuristic = growth_tolerance
            .map(|growth_tolerance| StabilityHeuristic { growth_tolerance })
            .unwrap_or_default();
        let report =
            surge_core::diagnostics::summarize(run.archive(), run.grid().spec(), heuristic);

        to_value(&report).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use surge_core::Equation;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn grid_value(dx: f64) -> JsValue {
        let grid = GridSpec {
            x_start: 0.0,
            x_end: 30.0,
            t_start: 0.0,
            t_end: 0.01,
            dx,
            dt: 0.001,
        };
        to_value(&grid).expect("grid")
    }

    fn params_value() -> JsValue {
        let params = EquationParameters {
            amplitude: 1.0,
            equation: Equation::Diffusive { diffusion: 0.1 },
        };
        to_value(&params).expect("params")
    }

    #[wasm_bindgen_test]
    fn solver_rejects_invalid_grid() {
        let result = WasmSolver::new(
            to_value(&Profile::Square).expect("profile"),
            params_value(),
            grid_value(0.0),
        );
        assert!(result.is_err(), "should reject dx = 0");
        let message = result
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("dx must be positive"));
    }

    #[wasm_bindgen_test]
    fn solver_runs_to_completion_in_batches() {
        let mut solver = WasmSolver::new(
            to_value(&Profile::Square).expect("profile"),
            params_value(),
            grid_value(0.1),
        )
        .expect("solver");

        while !solver.is_done() {
            solver.run_steps(3).expect("steps");
        }
        assert_eq!(solver.snapshot_count().expect("count"), 11);
        assert_eq!(solver.spatial_axis().expect("axis").length(), 301);
        assert_eq!(solver.snapshot(10).expect("snapshot").length(), 301);
        assert!(solver.snapshot(11).is_err());
        assert!(solver.diagnostics(None).is_ok());
    }
}
