use crate::error::Result;
use crate::trajectory::StepResult;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars in the activation kernels.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A smooth unimodal cost in one variable with an analytic derivative.
pub trait Objective {
    fn value(&self, x: f64) -> f64;

    fn derivative(&self, x: f64) -> f64;

    /// Location of the unique minimum, used for the convergence test.
    fn minimizer(&self) -> f64;

    /// Rejects shapes that have no unique minimum.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// The update rule of one demo family.
///
/// A rule is stateless: the controller hands it the trajectory tail and the
/// frozen settings, and it returns the next state.
pub trait StepRule {
    type Settings: Clone + Debug;

    /// Rejects settings before any step runs.
    fn validate(&self, settings: &Self::Settings) -> Result<()>;

    /// The state at iteration 0.
    fn initial_state(&self, settings: &Self::Settings) -> Result<StepResult>;

    /// Produces `trajectory[i + 1]` from `trajectory[i]`.
    fn step(&self, previous: &StepResult, settings: &Self::Settings) -> Result<StepResult>;

    /// The demo's own stopping rule for convergence-driven auto-play.
    fn converged(&self, _state: &StepResult, _settings: &Self::Settings) -> bool {
        false
    }

    /// True when no further step is possible from `state`.
    fn exhausted(&self, _state: &StepResult, _settings: &Self::Settings) -> bool {
        false
    }
}
