//! One-dimensional gradient descent on a convex cost.

use crate::config;
use crate::error::{DemoError, Result};
use crate::traits::{Objective, StepRule};
use crate::trajectory::{ParameterVector, StepDetail, StepResult};
use serde::{Deserialize, Serialize};

/// `f(x) = curvature * (x - center)²`. The default is the page's `f(x) = x²`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parabola {
    pub curvature: f64,
    pub center: f64,
}

impl Default for Parabola {
    fn default() -> Self {
        Self {
            curvature: 1.0,
            center: 0.0,
        }
    }
}

impl Objective for Parabola {
    fn value(&self, x: f64) -> f64 {
        let d = x - self.center;
        self.curvature * d * d
    }

    fn derivative(&self, x: f64) -> f64 {
        2.0 * self.curvature * (x - self.center)
    }

    fn minimizer(&self) -> f64 {
        self.center
    }

    fn validate(&self) -> Result<()> {
        config::positive("curvature", self.curvature)?;
        config::finite("center", self.center)?;
        Ok(())
    }
}

/// `x' = x - learning_rate * f'(x)`, with no clamping.
pub fn gradient_descent_step(x: f64, learning_rate: f64) -> f64 {
    descend(&Parabola::default(), x, learning_rate)
}

/// The same update for any objective.
pub fn descend<O: Objective + ?Sized>(objective: &O, x: f64, learning_rate: f64) -> f64 {
    x - learning_rate * objective.derivative(x)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescentSettings {
    pub initial_position: f64,
    pub learning_rate: f64,
    /// Converged once `|x - x*|` drops below this.
    pub tolerance: f64,
}

impl Default for DescentSettings {
    fn default() -> Self {
        Self {
            initial_position: 8.0,
            learning_rate: 0.1,
            tolerance: 0.01,
        }
    }
}

/// Gradient descent on an objective, as a steppable demo.
#[derive(Debug, Clone, Default)]
pub struct GradientDescent<O = Parabola> {
    objective: O,
}

impl<O: Objective> GradientDescent<O> {
    pub fn new(objective: O) -> Self {
        Self { objective }
    }

    pub fn objective(&self) -> &O {
        &self.objective
    }

    /// Fails instead of recording a state that has run off to infinity.
    fn state_at(&self, iteration: usize, x: f64) -> Result<StepResult> {
        let cost = self.objective.value(x);
        let gradient = self.objective.derivative(x);
        if !(x.is_finite() && cost.is_finite() && gradient.is_finite()) {
            return Err(DemoError::not_computable(
                "gradient descent step",
                "diverged to a non-finite value",
            ));
        }
        Ok(StepResult::new(
            iteration,
            ParameterVector::new(vec![x]),
            Some(cost),
            StepDetail::Descent { gradient },
        ))
    }
}

impl<O: Objective> StepRule for GradientDescent<O> {
    type Settings = DescentSettings;

    fn validate(&self, settings: &DescentSettings) -> Result<()> {
        self.objective.validate()?;
        config::finite("initial_position", settings.initial_position)?;
        config::learning_rate(settings.learning_rate)?;
        config::positive("tolerance", settings.tolerance)?;
        Ok(())
    }

    fn initial_state(&self, settings: &DescentSettings) -> Result<StepResult> {
        self.state_at(0, settings.initial_position)
    }

    fn step(&self, previous: &StepResult, settings: &DescentSettings) -> Result<StepResult> {
        if previous.params.len() != 1 {
            return Err(DemoError::mismatch(
                "gradient descent step",
                1,
                previous.params.len(),
            ));
        }
        let next = descend(&self.objective, previous.params[0], settings.learning_rate);
        self.state_at(previous.iteration + 1, next)
    }

    fn converged(&self, state: &StepResult, settings: &DescentSettings) -> bool {
        state
            .params
            .as_slice()
            .first()
            .is_some_and(|x| (x - self.objective.minimizer()).abs() < settings.tolerance)
    }
}
