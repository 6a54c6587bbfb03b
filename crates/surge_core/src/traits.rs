use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars on the grid.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {
    /// Converts an `f64` literal. Values the type cannot represent become NaN.
    fn from_real(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }
}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Right-hand side of one evolution equation on a periodic grid.
pub trait FluxModel<T: Scalar> {
    /// Writes the `dt`-scaled increment for the profile `state + trial` into `out`.
    /// state: base state of the current step
    /// trial: previous Runge-Kutta stage contribution (zeros for the first stage)
    /// out: buffer of the same length as `state`
    fn increment(&self, state: &[T], trial: &[T], out: &mut [T]);
}

/// A scalar initial-condition shape `f(x, t, a)`.
pub trait InitialCondition<T: Scalar> {
    fn evaluate(&self, x: T, t: T, amplitude: T) -> T;
}

impl<T, F> InitialCondition<T> for F
where
    T: Scalar,
    F: Fn(T, T, T) -> T,
{
    fn evaluate(&self, x: T, t: T, amplitude: T) -> T {
        self(x, t, amplitude)
    }
}
