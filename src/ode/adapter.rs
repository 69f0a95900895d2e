//! Packing adapter around an opaque integrator.
//!
//! The adapter owns a structured solution value `Y` and a flat packed
//! vector the integrator actually advances. Packing must be configured
//! before the first step; construction of the packed state is lazy.
//! Time is monotone: stepping backwards is an error, stepping to the
//! current time is a no-op.

use nalgebra::DVector;

use crate::error::{Error, Result};
use crate::ode::stepper::{AdaptiveRk, Integrator};

/// Bidirectional conversion between the structured solution `Y` and the
/// flat vector handed to the integrator.
pub struct Packing<Y> {
    pub pack: Box<dyn Fn(&Y) -> DVector<f64>>,
    pub unpack: Box<dyn Fn(&DVector<f64>) -> Y>,
}

/// How the derivative function is expressed.
///
/// `Packed` derivatives already operate on flat vectors and are handed
/// to the integrator as-is; `Structured` derivatives operate on `Y` and
/// are wrapped in pack/unpack on every evaluation.
pub enum DerivativeForm<Y> {
    Packed(Box<dyn Fn(f64, &DVector<f64>) -> DVector<f64>>),
    Structured(Box<dyn Fn(f64, &Y) -> Y>),
}

enum Solution<Y> {
    Pending(Y),
    Active(DVector<f64>),
}

pub struct OdeSolver<Y> {
    derivative: DerivativeForm<Y>,
    integrator: Box<dyn Integrator>,
    packing: Option<Packing<Y>>,
    solution: Solution<Y>,
    t: f64,
}

impl<Y: Clone> OdeSolver<Y> {
    pub fn new(derivative: DerivativeForm<Y>, y0: Y, t0: f64) -> Self {
        Self {
            derivative,
            integrator: Box::new(AdaptiveRk::default()),
            packing: None,
            solution: Solution::Pending(y0),
            t: t0,
        }
    }

    /// Swap in a different integrator implementation.
    pub fn with_integrator(mut self, integrator: Box<dyn Integrator>) -> Self {
        self.integrator = integrator;
        self
    }

    /// Configure the pack/unpack pair. Must happen before the first
    /// `step`; reconfiguring a live solver is an error.
    pub fn set_packing(&mut self, packing: Packing<Y>) -> Result<()> {
        if matches!(self.solution, Solution::Active(_)) {
            return Err(Error::Packing(
                "set_packing must be called before the solver is stepped".into(),
            ));
        }
        self.packing = Some(packing);
        Ok(())
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    /// A copy of the current structured solution.
    pub fn y(&self) -> Result<Y> {
        match &self.solution {
            Solution::Pending(y0) => Ok(y0.clone()),
            Solution::Active(x) => {
                let packing = self.packing.as_ref().expect("active solver has packing");
                Ok((packing.unpack)(x))
            }
        }
    }

    /// Evaluate the derivative at `(t, y)` in structured space.
    pub fn dy_dt(&self, t: f64, y: &Y) -> Result<Y> {
        let packing = self.packing.as_ref().ok_or_else(|| {
            Error::Packing("packing must be configured before evaluating dy_dt".into())
        })?;
        match &self.derivative {
            DerivativeForm::Packed(f) => Ok((packing.unpack)(&f(t, &(packing.pack)(y)))),
            DerivativeForm::Structured(f) => Ok(f(t, y)),
        }
    }

    /// Advance the solution to time `t`.
    pub fn step(&mut self, t: f64) -> Result<()> {
        if t < self.t {
            return Err(Error::TimeReversal {
                requested: t,
                current: self.t,
            });
        }
        if t == self.t {
            return Ok(());
        }

        let packing = self.packing.as_ref().ok_or_else(|| {
            Error::Packing("packing must be configured before stepping".into())
        })?;
        let packed_initial = match &self.solution {
            Solution::Pending(y0) => Some((packing.pack)(y0)),
            Solution::Active(_) => None,
        };
        if let Some(x0) = packed_initial {
            self.solution = Solution::Active(x0);
        }
        let x = match &self.solution {
            Solution::Active(x) => x,
            Solution::Pending(_) => unreachable!(),
        };

        let advanced = match &self.derivative {
            DerivativeForm::Packed(f) => {
                let derivative = |t: f64, x: &DVector<f64>| f(t, x);
                self.integrator.integrate(&derivative, self.t, x, t)?
            }
            DerivativeForm::Structured(f) => {
                let derivative =
                    |t: f64, x: &DVector<f64>| (packing.pack)(&f(t, &(packing.unpack)(x)));
                self.integrator.integrate(&derivative, self.t, x, t)?
            }
        };
        self.solution = Solution::Active(advanced);
        self.t = t;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scalar decay y' = -y with the solution stored as a plain f64.
    fn decay_solver() -> OdeSolver<f64> {
        let mut solver = OdeSolver::new(
            DerivativeForm::Structured(Box::new(|_t, y: &f64| -y)),
            1.0,
            0.0,
        );
        solver
            .set_packing(Packing {
                pack: Box::new(|&y| DVector::from_vec(vec![y])),
                unpack: Box::new(|x| x[0]),
            })
            .unwrap();
        solver
    }

    #[test]
    fn test_step_and_read() {
        let mut solver = decay_solver();
        assert_eq!(solver.y().unwrap(), 1.0);
        solver.step(1.0).unwrap();
        assert!((solver.y().unwrap() - (-1.0f64).exp()).abs() < 1e-7);
        assert_eq!(solver.t(), 1.0);
    }

    #[test]
    fn test_monotonic_time() {
        let mut solver = decay_solver();
        solver.step(1.0).unwrap();
        // stepping to the current time is a no-op
        let y = solver.y().unwrap();
        solver.step(1.0).unwrap();
        assert_eq!(solver.y().unwrap(), y);
        // stepping backwards is an error
        assert!(matches!(
            solver.step(0.5),
            Err(Error::TimeReversal { .. })
        ));
    }

    #[test]
    fn test_packing_locked_after_first_step() {
        let mut solver = decay_solver();
        solver.step(0.1).unwrap();
        let reconfigure = solver.set_packing(Packing {
            pack: Box::new(|&y| DVector::from_vec(vec![y])),
            unpack: Box::new(|x| x[0]),
        });
        assert!(matches!(reconfigure, Err(Error::Packing(_))));
    }

    #[test]
    fn test_step_without_packing_is_an_error() {
        let mut solver: OdeSolver<f64> = OdeSolver::new(
            DerivativeForm::Structured(Box::new(|_t, y: &f64| -y)),
            1.0,
            0.0,
        );
        assert!(matches!(solver.step(1.0), Err(Error::Packing(_))));
    }

    #[test]
    fn test_packed_derivative_form() {
        let mut solver = OdeSolver::new(
            DerivativeForm::Packed(Box::new(|_t, x: &DVector<f64>| -x.clone())),
            2.0,
            0.0,
        );
        solver
            .set_packing(Packing {
                pack: Box::new(|&y| DVector::from_vec(vec![y])),
                unpack: Box::new(|x| x[0]),
            })
            .unwrap();
        solver.step(1.0).unwrap();
        assert!((solver.y().unwrap() - 2.0 * (-1.0f64).exp()).abs() < 1e-7);
    }
}
