pub mod archive;
pub mod diagnostics;
pub mod error;
pub mod flux;
pub mod grid;
pub mod initial;
pub mod solver;
pub mod solvers;
pub mod sweep;
/// The `surge_core` crate integrates two nonlinear 1D evolution equations on a
/// periodic grid: the dispersive Korteweg-de Vries equation and the viscous
/// Burgers equation.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `FluxModel` (right-hand sides), `InitialCondition`.
/// - **Grid**: spatial and temporal axes derived from a `GridSpec`.
/// - **Flux**: periodic finite-difference stencils for each equation.
/// - **Solvers**: the RK4 stepper for `dt`-scaled increments.
/// - **Solver**: construct, propagate, and query a run through its `SolutionArchive`.
/// - **Diagnostics**: conserved quantities, peak tracking, velocity and a heuristic stability verdict.
/// - **Sweep**: parallel amplitude and step-size scans built on independent runs.
pub mod traits;

pub use error::{SurgeError, SurgeResult};
pub use flux::{Equation, EquationParameters};
pub use grid::GridSpec;
pub use initial::Profile;
pub use solver::{Solution, Solver};
