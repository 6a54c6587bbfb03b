//! Initial profiles and sampling onto the spatial axis.

use crate::grid::Axis;
use crate::traits::{InitialCondition, Scalar};
use serde::{Deserialize, Serialize};

/// Evaluates `f(x, t_start, a)` at every spatial sample.
pub fn sample<T, F>(f: &F, space: &Axis<T>, t_start: T, amplitude: T) -> Vec<T>
where
    T: Scalar,
    F: InitialCondition<T> + ?Sized,
{
    space
        .values()
        .iter()
        .map(|&x| f.evaluate(x, t_start, amplitude))
        .collect()
}

/// Catalog of the stock initial shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Profile {
    /// Single soliton centred at x = 15.
    Soliton,
    /// Solitons centred at x = 40 (amplitude `a`) and x = 50.
    TwoSoliton { second_amplitude: f64 },
    /// Half-period cosine on 20 <= x <= 70.
    CosinePulse,
    Gaussian,
    /// Unit gaussian at x = 50 plus a soliton of fixed amplitude 0.45 at x = 30.
    GaussianSoliton,
    /// Rectangular pulse of height `a` on 20 <= x <= 30.
    Square,
    Sine,
    /// Unit-height gaussian at x = 25 with unit width.
    NarrowGaussian,
}

impl Profile {
    pub fn two_soliton() -> Self {
        Profile::TwoSoliton {
            second_amplitude: 0.8,
        }
    }
}

/// `12 a^2 sech^2(a ((x - centre) - 4 a^2 t))`
pub fn soliton<T: Scalar>(x: T, t: T, amplitude: T, centre: T) -> T {
    let a2 = amplitude * amplitude;
    let phase = amplitude * ((x - centre) - T::from_real(4.0) * a2 * t);
    let sech = phase.cosh().recip();
    T::from_real(12.0) * a2 * sech * sech
}

fn within<T: Scalar>(x: T, lo: f64, hi: f64) -> bool {
    x >= T::from_real(lo) && x <= T::from_real(hi)
}

impl<T: Scalar> InitialCondition<T> for Profile {
    fn evaluate(&self, x: T, t: T, amplitude: T) -> T {
        let lit = T::from_real;
        match *self {
            Profile::Soliton => soliton(x, t, amplitude, lit(15.0)),
            Profile::TwoSoliton { second_amplitude } => {
                soliton(x, t, amplitude, lit(40.0)) + soliton(x, t, lit(second_amplitude), lit(50.0))
            }
            Profile::CosinePulse => {
                if within(x, 20.0, 70.0) {
                    let two_pi = lit(std::f64::consts::TAU);
                    amplitude * ((x - lit(45.0) - t) * two_pi / lit(100.0)).cos()
                } else {
                    T::zero()
                }
            }
            Profile::Gaussian => {
                let d = x - lit(50.0);
                amplitude * (lit(-0.01) * d * d).exp()
            }
            Profile::GaussianSoliton => {
                let d = x - lit(50.0);
                (lit(-0.01) * d * d).exp() + soliton(x, t, lit(0.45), lit(30.0))
            }
            Profile::Square => {
                if within(x, 20.0, 30.0) {
                    amplitude
                } else {
                    T::zero()
                }
            }
            Profile::Sine => amplitude * (x - lit(5.0 / (6.0 * std::f64::consts::PI))).sin(),
            Profile::NarrowGaussian => {
                let d = x - lit(25.0);
                (-(d * d)).exp()
            }
        }
    }
}
