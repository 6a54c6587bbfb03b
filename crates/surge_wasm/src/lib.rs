//! WASM bindings for the Surge core library.
//!
//! The browser front end owns plotting and animation; this crate only builds
//! runs, advances them in batches and hands back snapshots and diagnostics.

mod solver;

pub use solver::WasmSolver;
