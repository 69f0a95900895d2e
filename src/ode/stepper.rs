//! Error-controlled numerical integration.
//!
//! The [`Integrator`] trait is the seam for the underlying initial-value
//! solver; everything above it treats the integrator as a black box that
//! either reaches the requested time or reports divergence. The default
//! implementation is an embedded Cash-Karp Runge-Kutta 4(5) pair with
//! proportional step-size control.

use nalgebra::DVector;

use crate::error::{Error, Result};

/// Right-hand side `f(t, y) -> dy/dt` in packed (flat vector) space.
pub type Derivative<'a> = &'a dyn Fn(f64, &DVector<f64>) -> DVector<f64>;

/// Advances an initial value problem from `(t0, y0)` to `t1 >= t0`.
///
/// Non-convergence must surface as [`Error::Integration`]; it is never
/// retried at this layer.
pub trait Integrator {
    fn integrate(
        &self,
        derivative: Derivative,
        t0: f64,
        y0: &DVector<f64>,
        t1: f64,
    ) -> Result<DVector<f64>>;
}

/// Embedded Cash-Karp Runge-Kutta 4(5) with adaptive step control.
#[derive(Debug, Clone)]
pub struct AdaptiveRk {
    pub rel_tol: f64,
    pub abs_tol: f64,
    pub max_steps: usize,
}

impl Default for AdaptiveRk {
    fn default() -> Self {
        Self {
            rel_tol: 1e-8,
            abs_tol: 1e-12,
            max_steps: 1_000_000,
        }
    }
}

// Cash-Karp tableau
const A: [[f64; 5]; 5] = [
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [3.0 / 10.0, -9.0 / 10.0, 6.0 / 5.0, 0.0, 0.0],
    [-11.0 / 54.0, 5.0 / 2.0, -70.0 / 27.0, 35.0 / 27.0, 0.0],
    [
        1631.0 / 55296.0,
        175.0 / 512.0,
        575.0 / 13824.0,
        44275.0 / 110592.0,
        253.0 / 4096.0,
    ],
];
const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 3.0 / 5.0, 1.0, 7.0 / 8.0];
const B5: [f64; 6] = [
    37.0 / 378.0,
    0.0,
    250.0 / 621.0,
    125.0 / 594.0,
    0.0,
    512.0 / 1771.0,
];
const B4: [f64; 6] = [
    2825.0 / 27648.0,
    0.0,
    18575.0 / 48384.0,
    13525.0 / 55296.0,
    277.0 / 14336.0,
    1.0 / 4.0,
];

impl Integrator for AdaptiveRk {
    fn integrate(
        &self,
        derivative: Derivative,
        t0: f64,
        y0: &DVector<f64>,
        t1: f64,
    ) -> Result<DVector<f64>> {
        assert!(t1 >= t0, "integration target precedes start time");
        let span = t1 - t0;
        if span == 0.0 {
            return Ok(y0.clone());
        }

        let mut t = t0;
        let mut y = y0.clone();
        let mut h = span / 100.0;
        let min_step = span * 1e-14;

        for _ in 0..self.max_steps {
            if t >= t1 {
                return Ok(y);
            }
            h = h.min(t1 - t);

            let mut k: Vec<DVector<f64>> = Vec::with_capacity(6);
            k.push(derivative(t, &y));
            for stage in 1..6 {
                let mut arg = y.clone();
                for (j, kj) in k.iter().enumerate() {
                    let a = A[stage - 1][j];
                    if a != 0.0 {
                        arg.axpy(h * a, kj, 1.0);
                    }
                }
                k.push(derivative(t + C[stage] * h, &arg));
            }

            let mut y5 = y.clone();
            let mut y4 = y.clone();
            for (j, kj) in k.iter().enumerate() {
                if B5[j] != 0.0 {
                    y5.axpy(h * B5[j], kj, 1.0);
                }
                if B4[j] != 0.0 {
                    y4.axpy(h * B4[j], kj, 1.0);
                }
            }

            let mut err: f64 = 0.0;
            for i in 0..y.len() {
                let scale = self.abs_tol + self.rel_tol * y[i].abs().max(y5[i].abs());
                err = err.max(((y5[i] - y4[i]) / scale).abs());
            }
            if !err.is_finite() {
                return Err(Error::Integration(format!(
                    "derivative produced non-finite values at t = {t}"
                )));
            }

            if err <= 1.0 {
                t += h;
                y = y5;
                if t >= t1 {
                    return Ok(y);
                }
            }
            let factor = if err > 0.0 {
                (0.9 * err.powf(-0.2)).clamp(0.2, 5.0)
            } else {
                5.0
            };
            h *= factor;
            if h < min_step {
                return Err(Error::Integration(format!(
                    "step size underflow at t = {t} (requested accuracy unattainable)"
                )));
            }
        }
        Err(Error::Integration(format!(
            "exceeded {} steps before reaching t = {t1}",
            self.max_steps
        )))
    }
}
