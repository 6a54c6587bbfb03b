use crate::traits::{FluxModel, Scalar};

/// Classic Runge-Kutta 4th Order stepper for `dt`-scaled increments.
///
/// The flux already multiplies by `dt`, so stage offsets are plain fractions of
/// the previous stage and the final combination carries no extra `dt`.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }

    pub fn dimension(&self) -> usize {
        self.tmp.len()
    }

    /// Writes the state one step after `state` into `out`.
    pub fn advance(&mut self, flux: &impl FluxModel<T>, state: &[T], out: &mut [T]) {
        let half = T::from_real(0.5);
        let sixth = T::from_real(1.0 / 6.0);
        let two = T::from_real(2.0);

        // k1 = f(u, 0)
        self.tmp.iter_mut().for_each(|v| *v = T::zero());
        flux.increment(state, &self.tmp, &mut self.k1);

        // k2 = f(u, k1/2)
        for i in 0..state.len() {
            self.tmp[i] = half * self.k1[i];
        }
        flux.increment(state, &self.tmp, &mut self.k2);

        // k3 = f(u, k2/2)
        for i in 0..state.len() {
            self.tmp[i] = half * self.k2[i];
        }
        flux.increment(state, &self.tmp, &mut self.k3);

        // k4 = f(u, k3)
        flux.increment(state, &self.k3, &mut self.k4);

        // u_next = u + (k1 + 2k2 + 2k3 + k4) / 6
        for i in 0..state.len() {
            out[i] = state[i]
                + sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flux::DispersiveFlux;

    /// Increment `dt * rate * u` with no spatial coupling.
    struct Decay {
        rate_dt: f64,
    }

    impl FluxModel<f64> for Decay {
        fn increment(&self, state: &[f64], trial: &[f64], out: &mut [f64]) {
            for i in 0..state.len() {
                out[i] = self.rate_dt * (state[i] + trial[i]);
            }
        }
    }

    #[test]
    fn advance_matches_rk4_amplification_factor() {
        let z = -0.1;
        let mut stepper = RK4::new(1);
        let mut out = [0.0];
        stepper.advance(&Decay { rate_dt: z }, &[1.0], &mut out);
        let expected = 1.0 + z + z * z / 2.0 + z * z * z / 6.0 + z * z * z * z / 24.0;
        assert!((out[0] - expected).abs() < 1e-15);
    }

    #[test]
    fn repeated_steps_track_exponential_decay() {
        let mut stepper = RK4::new(2);
        let flux = Decay { rate_dt: -0.01 };
        let mut state = vec![1.0, 2.0];
        let mut next = vec![0.0; 2];
        for _ in 0..100 {
            stepper.advance(&flux, &state, &mut next);
            std::mem::swap(&mut state, &mut next);
        }
        let expected = (-1.0f64).exp();
        assert!((state[0] - expected).abs() < 1e-9);
        assert!((state[1] - 2.0 * expected).abs() < 1e-9);
    }

    #[test]
    fn advance_is_pure_in_its_inputs() {
        let flux = DispersiveFlux::new(0.1, 0.001);
        let state: Vec<f64> = (0..32).map(|i| (i as f64 * 0.2).cos()).collect();
        let mut first = vec![0.0; 32];
        let mut second = vec![0.0; 32];
        let mut stepper = RK4::new(32);
        stepper.advance(&flux, &state, &mut first);
        stepper.advance(&flux, &state, &mut second);
        assert_eq!(first, second);
        assert_eq!(stepper.dimension(), 32);
    }
}
