//! Periodic finite-difference right-hand sides.
//!
//! Every stencil reads its neighbours with wraparound, so the discretisation is
//! periodic over the sampled interval whatever x-range was declared: mass that
//! leaves one edge re-enters at the other.
//!
//! Increments already carry the `dt` factor; the stepper adds weighted sums of
//! them directly to the state.

use crate::error::{SurgeError, SurgeResult};
use crate::traits::{FluxModel, Scalar};
use serde::{Deserialize, Serialize};

#[inline]
fn wrap(i: usize, offset: isize, n: usize) -> usize {
    (i as isize + offset).rem_euclid(n as isize) as usize
}

/// Korteweg-de Vries flux for `u_t + u u_x + u_xxx = 0`.
#[derive(Debug, Clone, Copy)]
pub struct DispersiveFlux<T> {
    advective: T,
    dispersive: T,
}

impl<T: Scalar> DispersiveFlux<T> {
    pub fn new(dx: T, dt: T) -> Self {
        Self {
            advective: T::from_real(0.25) * dt / dx,
            dispersive: T::from_real(0.5) * dt / (dx * dx * dx),
        }
    }
}

impl<T: Scalar> FluxModel<T> for DispersiveFlux<T> {
    fn increment(&self, state: &[T], trial: &[T], out: &mut [T]) {
        let n = state.len();
        let two = T::from_real(2.0);
        let u = |i: usize, offset: isize| {
            let j = wrap(i, offset, n);
            state[j] + trial[j]
        };

        for i in 0..n {
            let (b2, b1, f1, f2) = (u(i, -2), u(i, -1), u(i, 1), u(i, 2));
            // u u_x as a central difference of u^2 / 2
            let advection = self.advective * (f1 * f1 - b1 * b1);
            // u_xxx on the 4-point central stencil
            let dispersion = self.dispersive * (f2 - two * f1 + two * b1 - b2);
            out[i] = -advection - dispersion;
        }
    }
}

/// Viscous Burgers flux for `u_t + u u_x = D u_xx`.
#[derive(Debug, Clone, Copy)]
pub struct DiffusiveFlux<T> {
    advective: T,
    diffusive: T,
}

impl<T: Scalar> DiffusiveFlux<T> {
    pub fn new(dx: T, dt: T, diffusion: T) -> Self {
        Self {
            advective: T::from_real(0.25) * dt / dx,
            diffusive: diffusion * dt / (dx * dx),
        }
    }
}

impl<T: Scalar> FluxModel<T> for DiffusiveFlux<T> {
    fn increment(&self, state: &[T], trial: &[T], out: &mut [T]) {
        let n = state.len();
        let two = T::from_real(2.0);
        let u = |i: usize, offset: isize| {
            let j = wrap(i, offset, n);
            state[j] + trial[j]
        };

        for i in 0..n {
            let (b1, centre, f1) = (u(i, -1), u(i, 0), u(i, 1));
            let advection = self.advective * (f1 * f1 - b1 * b1);
            let diffusion = self.diffusive * (f1 - two * centre + b1);
            out[i] = diffusion - advection;
        }
    }
}

/// Which evolution equation a run integrates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Equation<T> {
    Dispersive,
    Diffusive { diffusion: T },
}

impl<T: Scalar> Equation<T> {
    pub fn validate(&self) -> SurgeResult<()> {
        match *self {
            Equation::Dispersive => Ok(()),
            Equation::Diffusive { diffusion } => {
                if !diffusion.is_finite() || diffusion < T::zero() {
                    return Err(SurgeError::parameters(
                        "Diffusion coefficient must be finite and non-negative.",
                    ));
                }
                Ok(())
            }
        }
    }

    pub fn flux(&self, dx: T, dt: T) -> Flux<T> {
        match *self {
            Equation::Dispersive => Flux::Dispersive(DispersiveFlux::new(dx, dt)),
            Equation::Diffusive { diffusion } => {
                Flux::Diffusive(DiffusiveFlux::new(dx, dt, diffusion))
            }
        }
    }
}

/// Amplitude passed to the initial condition plus the equation to integrate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquationParameters<T> {
    pub amplitude: T,
    pub equation: Equation<T>,
}

impl<T: Scalar> EquationParameters<T> {
    pub fn dispersive(amplitude: T) -> Self {
        Self {
            amplitude,
            equation: Equation::Dispersive,
        }
    }

    pub fn diffusive(amplitude: T, diffusion: T) -> Self {
        Self {
            amplitude,
            equation: Equation::Diffusive { diffusion },
        }
    }

    pub fn validate(&self) -> SurgeResult<()> {
        if !self.amplitude.is_finite() {
            return Err(SurgeError::parameters("Amplitude must be finite."));
        }
        self.equation.validate()
    }
}

/// Either flux behind one dispatch point.
#[derive(Debug, Clone, Copy)]
pub enum Flux<T> {
    Dispersive(DispersiveFlux<T>),
    Diffusive(DiffusiveFlux<T>),
}

impl<T: Scalar> FluxModel<T> for Flux<T> {
    fn increment(&self, state: &[T], trial: &[T], out: &mut [T]) {
        match self {
            Flux::Dispersive(f) => f.increment(state, trial, out),
            Flux::Diffusive(f) => f.increment(state, trial, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(flux: &impl FluxModel<f64>, state: &[f64], trial: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; state.len()];
        flux.increment(state, trial, &mut out);
        out
    }

    #[test]
    fn wrap_handles_both_edges_and_tiny_arrays() {
        assert_eq!(wrap(0, -1, 5), 4);
        assert_eq!(wrap(0, -2, 5), 3);
        assert_eq!(wrap(4, 1, 5), 0);
        assert_eq!(wrap(4, 2, 5), 1);
        assert_eq!(wrap(0, -2, 1), 0);
        assert_eq!(wrap(1, 2, 2), 1);
    }

    #[test]
    fn dispersive_flux_vanishes_on_constant_state() {
        let flux = DispersiveFlux::new(0.1, 0.001);
        let out = apply(&flux, &[3.0; 8], &[0.0; 8]);
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn dispersive_flux_matches_hand_stencil() {
        let dx = 0.5;
        let dt = 0.01;
        let flux = DispersiveFlux::new(dx, dt);
        let state = [0.0, 1.0, 4.0, 2.0, 0.5, 0.0];
        let out = apply(&flux, &state, &[0.0; 6]);

        // i = 2: b2 = 0, b1 = 1, f1 = 2, f2 = 0.5
        let expected = -0.25 * dt / dx * (4.0 - 1.0)
            - 0.5 * dt / (dx * dx * dx) * (0.5 - 4.0 + 2.0 - 0.0);
        assert!((out[2] - expected).abs() < 1e-15);

        // i = 0 wraps: b2 = 0.5, b1 = 0, f1 = 1, f2 = 4
        let expected = -0.25 * dt / dx * (1.0 - 0.0)
            - 0.5 * dt / (dx * dx * dx) * (4.0 - 2.0 + 0.0 - 0.5);
        assert!((out[0] - expected).abs() < 1e-15);
    }

    #[test]
    fn trial_is_added_before_differencing() {
        let flux = DispersiveFlux::new(0.5, 0.01);
        let base = [0.0, 1.0, 4.0, 2.0, 0.5, 0.0];
        let trial = [0.1, -0.2, 0.3, 0.0, 0.2, 0.4];
        let combined: Vec<f64> = base.iter().zip(&trial).map(|(a, b)| a + b).collect();
        assert_eq!(
            apply(&flux, &base, &trial),
            apply(&flux, &combined, &[0.0; 6])
        );
    }

    #[test]
    fn diffusive_flux_matches_hand_stencil() {
        let dx = 0.5;
        let dt = 0.01;
        let d = 0.2;
        let flux = DiffusiveFlux::new(dx, dt, d);
        let state = [1.0, 3.0, 2.0, 0.0];
        let out = apply(&flux, &state, &[0.0; 4]);

        let expected = -0.25 * dt / dx * (4.0 - 1.0) + d * dt * (2.0 - 6.0 + 1.0) / (dx * dx);
        assert!((out[1] - expected).abs() < 1e-15);

        // i = 3 wraps forward to index 0
        let expected = -0.25 * dt / dx * (1.0 - 4.0) + d * dt * (1.0 - 0.0 + 2.0) / (dx * dx);
        assert!((out[3] - expected).abs() < 1e-15);
    }

    #[test]
    fn diffusive_trial_is_added_before_differencing() {
        let flux = DiffusiveFlux::new(0.5, 0.01, 0.2);
        let base = [1.0, 3.0, 2.0, 0.0, -1.0];
        let trial = [0.2, -0.5, 0.7, 0.1, 0.3];
        let combined: Vec<f64> = base.iter().zip(&trial).map(|(a, b)| a + b).collect();
        let expected = apply(&flux, &combined, &[0.0; 5]);
        assert_eq!(apply(&flux, &base, &trial), expected);

        // centre term on the combined profile: i = 2 reads 2.7, not 2.0
        let (b1, centre, f1) = (2.5, 2.7, 0.1);
        let by_hand = 0.2 * 0.01 * (f1 - 2.0 * centre + b1) / 0.25
            - 0.25 * 0.01 / 0.5 * (f1 * f1 - b1 * b1);
        assert!((expected[2] - by_hand).abs() < 1e-12);
    }

    #[test]
    fn increments_sum_to_zero_on_periodic_grid() {
        let state: Vec<f64> = (0..40).map(|i| (i as f64 * 0.37).sin() + 1.5).collect();
        let zeros = vec![0.0; state.len()];
        for flux in [
            Equation::Dispersive.flux(0.1, 0.001),
            Equation::Diffusive { diffusion: 0.3 }.flux(0.1, 0.001),
        ] {
            let total: f64 = apply(&flux, &state, &zeros).iter().sum();
            assert!(total.abs() < 1e-12, "{flux:?} leaked {total}");
        }
    }

    #[test]
    fn negative_diffusion_is_rejected() {
        let err = EquationParameters::diffusive(1.0, -0.1)
            .validate()
            .expect_err("expected error");
        assert!(format!("{err}").contains("non-negative"));
        assert!(EquationParameters::diffusive(1.0, 0.0).validate().is_ok());
        assert!(EquationParameters::dispersive(f64::NAN).validate().is_err());
    }
}
