//! Spatial and temporal sample sequences.
//!
//! Both axes are built the same way: sample `k` sits at `k * step` for every
//! integer `k` between `floor(start / step)` and `floor(end / step)`, so the
//! samples are aligned to multiples of the step rather than to `start`.

use crate::error::{SurgeError, SurgeResult};
use crate::traits::Scalar;
use serde::{Deserialize, Serialize};

/// Extents and resolution of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec<T> {
    pub x_start: T,
    pub x_end: T,
    pub t_start: T,
    pub t_end: T,
    pub dx: T,
    pub dt: T,
}

impl<T: Scalar> GridSpec<T> {
    pub fn new(x_start: T, x_end: T, t_start: T, t_end: T, dx: T, dt: T) -> SurgeResult<Self> {
        let spec = Self {
            x_start,
            x_end,
            t_start,
            t_end,
            dx,
            dt,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> SurgeResult<()> {
        let fields = [
            ("x_start", self.x_start),
            ("x_end", self.x_end),
            ("t_start", self.t_start),
            ("t_end", self.t_end),
            ("dx", self.dx),
            ("dt", self.dt),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(SurgeError::grid(format!("{name} must be finite.")));
            }
        }
        if self.dx <= T::zero() {
            return Err(SurgeError::grid("Spatial step dx must be positive."));
        }
        if self.dt <= T::zero() {
            return Err(SurgeError::grid("Time step dt must be positive."));
        }
        if self.x_end < self.x_start {
            return Err(SurgeError::grid("x_end must not precede x_start."));
        }
        if self.t_end < self.t_start {
            return Err(SurgeError::grid("t_end must not precede t_start."));
        }
        Ok(())
    }

    /// Validates the extents and derives both axes.
    pub fn build(&self) -> SurgeResult<Grid<T>> {
        self.validate()?;
        let space = Axis::sampled(self.x_start, self.x_end, self.dx)?;
        let time = Axis::sampled(self.t_start, self.t_end, self.dt)?;
        Ok(Grid {
            spec: *self,
            space,
            time,
        })
    }
}

/// An ordered, immutable sample sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis<T> {
    first_index: i64,
    step: T,
    values: Vec<T>,
}

impl<T: Scalar> Axis<T> {
    fn sampled(start: T, end: T, step: T) -> SurgeResult<Self> {
        let first = sample_index(start, step)?;
        let last = sample_index(end, step)?;
        let count = last
            .checked_sub(first)
            .and_then(|span| span.checked_add(1))
            .and_then(|len| usize::try_from(len).ok())
            .ok_or_else(|| SurgeError::grid("Axis sample count overflows."))?;

        let mut values = Vec::new();
        values
            .try_reserve_exact(count)
            .map_err(|_| SurgeError::grid("Axis sample count is too large."))?;
        values.extend(
            (0..count).map(|offset| T::from_real((first + offset as i64) as f64) * step),
        );

        Ok(Self {
            first_index: first,
            step,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a built axis.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn step(&self) -> T {
        self.step
    }

    /// Integer multiple of the step at which the first sample sits.
    pub fn first_index(&self) -> i64 {
        self.first_index
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index).copied()
    }
}

fn sample_index<T: Scalar>(bound: T, step: T) -> SurgeResult<i64> {
    (bound / step)
        .floor()
        .to_i64()
        .ok_or_else(|| SurgeError::grid("Axis bound is out of range for the step size."))
}

/// Validated extents together with the axes derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    spec: GridSpec<T>,
    space: Axis<T>,
    time: Axis<T>,
}

impl<T: Scalar> Grid<T> {
    pub fn spec(&self) -> &GridSpec<T> {
        &self.spec
    }

    pub fn space(&self) -> &Axis<T> {
        &self.space
    }

    pub fn time(&self) -> &Axis<T> {
        &self.time
    }

    pub fn dx(&self) -> T {
        self.spec.dx
    }

    pub fn dt(&self) -> T {
        self.spec.dt
    }
}

/// Derives `(spatial axis, temporal axis)` from raw extents.
pub fn build<T: Scalar>(
    x_start: T,
    x_end: T,
    t_start: T,
    t_end: T,
    dx: T,
    dt: T,
) -> SurgeResult<(Axis<T>, Axis<T>)> {
    let grid = GridSpec::new(x_start, x_end, t_start, t_end, dx, dt)?.build()?;
    Ok((grid.space, grid.time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_err_contains<T: std::fmt::Debug>(result: SurgeResult<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn build_rejects_invalid_specs() {
        assert_err_contains(build(0.0, 10.0, 0.0, 1.0, 0.0, 0.1), "dx must be positive");
        assert_err_contains(build(0.0, 10.0, 0.0, 1.0, -0.1, 0.1), "dx must be positive");
        assert_err_contains(build(0.0, 10.0, 0.0, 1.0, 0.1, 0.0), "dt must be positive");
        assert_err_contains(build(10.0, 0.0, 0.0, 1.0, 0.1, 0.1), "x_end");
        assert_err_contains(build(0.0, 10.0, 1.0, 0.0, 0.1, 0.1), "t_end");
        assert_err_contains(build(0.0, f64::NAN, 0.0, 1.0, 0.1, 0.1), "x_end must be finite");
        assert_err_contains(build(0.0, 1.0e300, 0.0, 1.0, 1.0e-300, 0.1), "out of range");
    }

    #[test]
    fn oversized_axes_fail_before_allocating() {
        let spec = GridSpec::new(0.0, 1.0e12, 0.0, 1.0, 1.0e-6, 0.1).expect("spec");
        assert_err_contains(spec.build(), "too large");
    }

    #[test]
    fn invalid_grid_is_reported_as_grid_error() {
        let err = build(0.0, 1.0, 0.0, 1.0, 0.0, 0.1).expect_err("expected error");
        assert!(matches!(err, SurgeError::InvalidGrid { .. }));
    }

    #[test]
    fn axes_align_to_step_multiples() {
        let (space, time) = build(0.3, 2.0, 0.0, 2.0, 0.25, 0.125).expect("grid");
        assert_eq!(space.first_index(), 1);
        assert_eq!(space.values(), &[0.25, 0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0]);
        assert_eq!(time.len(), 17);
        assert_eq!(time.get(16), Some(2.0));
    }

    #[test]
    fn reference_run_has_expected_sizes() {
        let (space, time) = build(0.0, 100.0, 0.0, 1.0, 0.1, 0.001).expect("grid");
        assert_eq!(space.len(), 1001);
        assert_eq!(time.len(), 1001);
    }

    #[test]
    fn degenerate_ranges_yield_single_sample() {
        let (space, time) = build(2.0, 2.0, 0.0, 0.0, 0.5, 0.5).expect("grid");
        assert_eq!(space.values(), &[2.0]);
        assert_eq!(time.values(), &[0.0]);
    }

    #[test]
    fn negative_starts_floor_downward() {
        let (space, _) = build(-1.25, 1.0, 0.0, 1.0, 0.5, 0.5).expect("grid");
        assert_eq!(space.first_index(), -3);
        assert_eq!(space.values(), &[-1.5, -1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    proptest! {
        #[test]
        fn axis_lengths_follow_floor_formula(
            x_start in -50.0f64..50.0,
            x_span in 0.0f64..100.0,
            t_start in 0.0f64..10.0,
            t_span in 0.0f64..5.0,
            dx in 0.05f64..2.0,
            dt in 0.01f64..1.0,
        ) {
            let x_end = x_start + x_span;
            let t_end = t_start + t_span;
            let (space, time) = build(x_start, x_end, t_start, t_end, dx, dt).unwrap();

            let expected_space = (x_end / dx).floor() as i64 - (x_start / dx).floor() as i64 + 1;
            let expected_time = (t_end / dt).floor() as i64 - (t_start / dt).floor() as i64 + 1;
            prop_assert_eq!(space.len() as i64, expected_space);
            prop_assert_eq!(time.len() as i64, expected_time);

            for pair in space.values().windows(2) {
                prop_assert!(((pair[1] - pair[0]) - dx).abs() < 1e-9);
            }
        }
    }
}
