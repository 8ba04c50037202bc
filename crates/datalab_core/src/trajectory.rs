//! Session state: the parameter vector, step results and their history.

use crate::backprop::ForwardBackward;
use crate::error::{DemoError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Fixed-length numeric state (a position, a pair of weights, a hidden state).
///
/// There is no API to grow or shrink it after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterVector(Vec<f64>);

impl ParameterVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.0.clone()
    }
}

impl From<Vec<f64>> for ParameterVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl Index<usize> for ParameterVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Demo-specific scalars carried alongside the parameters for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepDetail {
    None,
    Descent {
        gradient: f64,
    },
    Backprop(ForwardBackward),
    Recurrent {
        input: Vec<f64>,
        output: Vec<f64>,
    },
}

/// One kernel invocation's output. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub iteration: usize,
    pub params: ParameterVector,
    pub loss: Option<f64>,
    pub detail: StepDetail,
}

impl StepResult {
    pub fn new(
        iteration: usize,
        params: ParameterVector,
        loss: Option<f64>,
        detail: StepDetail,
    ) -> Self {
        Self {
            iteration,
            params,
            loss,
            detail,
        }
    }
}

/// Append-only history of step results, indexed from the initial state at 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    steps: Vec<StepResult>,
    dimension: usize,
}

impl Trajectory {
    pub fn new(initial: StepResult) -> Self {
        let dimension = initial.params.len();
        let mut trajectory = Self {
            steps: Vec::new(),
            dimension,
        };
        trajectory.reset(initial);
        trajectory
    }

    /// Clears the history down to `[initial]`. The dimension is re-pinned to
    /// the initial state's, so a reset is also how settings with a different
    /// shape take effect.
    pub fn reset(&mut self, initial: StepResult) {
        debug!("trajectory reset: dimension={}", initial.params.len());
        self.dimension = initial.params.len();
        self.steps.clear();
        self.steps.push(StepResult {
            iteration: 0,
            ..initial
        });
    }

    /// The only mutator besides `reset`.
    pub fn append(&mut self, step: StepResult) -> Result<()> {
        if step.params.len() != self.dimension {
            return Err(DemoError::mismatch(
                "trajectory append",
                self.dimension,
                step.params.len(),
            ));
        }
        if step.iteration != self.steps.len() {
            return Err(DemoError::mismatch(
                "trajectory iteration",
                self.steps.len(),
                step.iteration,
            ));
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn current(&self) -> &StepResult {
        // Never empty: construction and reset both leave the initial state.
        &self.steps[self.steps.len() - 1]
    }

    pub fn initial(&self) -> &StepResult {
        &self.steps[0]
    }

    pub fn history(&self) -> &[StepResult] {
        &self.steps
    }

    /// Number of states, including the initial one.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn iteration(&self) -> usize {
        self.current().iteration
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(iteration: usize, x: f64) -> StepResult {
        StepResult::new(
            iteration,
            ParameterVector::new(vec![x]),
            Some(x * x),
            StepDetail::Descent { gradient: 2.0 * x },
        )
    }

    #[test]
    fn starts_with_the_initial_state() {
        let trajectory = Trajectory::new(state(0, 8.0));
        assert_eq!(trajectory.len(), 1);
        assert_eq!(trajectory.iteration(), 0);
        assert_eq!(trajectory.current(), &state(0, 8.0));
        assert_eq!(trajectory.dimension(), 1);
    }

    #[test]
    fn append_grows_history_in_order() {
        let mut trajectory = Trajectory::new(state(0, 8.0));
        trajectory.append(state(1, 6.4)).expect("append");
        trajectory.append(state(2, 5.12)).expect("append");

        let xs: Vec<f64> = trajectory.history().iter().map(|s| s.params[0]).collect();
        assert_eq!(xs, vec![8.0, 6.4, 5.12]);
        assert_eq!(trajectory.current().iteration, 2);
        assert_eq!(trajectory.initial().params[0], 8.0);
    }

    #[test]
    fn append_rejects_a_different_dimension() {
        let mut trajectory = Trajectory::new(state(0, 8.0));
        let wide = StepResult::new(1, vec![1.0, 2.0].into(), None, StepDetail::None);
        assert!(matches!(
            trajectory.append(wide),
            Err(DemoError::DimensionMismatch { left: 1, right: 2, .. })
        ));
        assert_eq!(trajectory.len(), 1);
    }

    #[test]
    fn append_rejects_an_out_of_order_iteration() {
        let mut trajectory = Trajectory::new(state(0, 1.0));
        assert_eq!(
            trajectory.append(state(7, 2.0)),
            Err(DemoError::DimensionMismatch {
                operation: "trajectory iteration",
                left: 1,
                right: 7
            })
        );
        assert!(trajectory.append(state(0, 2.0)).is_err());
        assert_eq!(trajectory.len(), 1);
        trajectory.append(state(1, 2.0)).expect("append");
        assert_eq!(trajectory.iteration(), 1);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut trajectory = Trajectory::new(state(0, 8.0));
        trajectory.append(state(1, 6.4)).expect("append");

        trajectory.reset(state(0, 8.0));
        let first = trajectory.clone();
        trajectory.reset(state(0, 8.0));

        assert_eq!(first, trajectory);
        assert_eq!(trajectory.history(), &[state(0, 8.0)]);
    }

    #[test]
    fn reset_forces_iteration_zero() {
        let mut trajectory = Trajectory::new(state(0, 8.0));
        trajectory.reset(state(5, 1.0));
        assert_eq!(trajectory.iteration(), 0);
    }
}
