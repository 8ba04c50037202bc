//! Forward and backward pass of the two-weight toy network
//! `x --w1--> h --w2--> y`, both layers sigmoid, squared-error loss.

use crate::activation::{sigmoid, sigmoid_prime};
use crate::config;
use crate::error::{DemoError, Result};
use crate::traits::StepRule;
use crate::trajectory::{ParameterVector, StepDetail, StepResult};
use serde::{Deserialize, Serialize};

/// Activations, loss and every partial derivative of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardBackward {
    pub h: f64,
    pub y: f64,
    pub loss: f64,
    pub dl_dw1: f64,
    pub dl_dw2: f64,
    pub dl_dh: f64,
    pub dl_dy: f64,
}

/// `loss = ½(y - target)²` only, for gradient checking.
pub fn loss(x: f64, target: f64, w1: f64, w2: f64) -> f64 {
    let h = sigmoid(x * w1);
    let y = sigmoid(h * w2);
    0.5 * (y - target) * (y - target)
}

/// Runs both passes. The weight update is left to the caller.
pub fn forward_backward(x: f64, target: f64, w1: f64, w2: f64) -> ForwardBackward {
    let z1 = x * w1;
    let h = sigmoid(z1);
    let z2 = h * w2;
    let y = sigmoid(z2);
    let loss = 0.5 * (y - target) * (y - target);

    let dl_dy = y - target;
    let dl_dw2 = dl_dy * sigmoid_prime(z2) * h;
    let dl_dh = dl_dy * sigmoid_prime(z2) * w2;
    let dl_dw1 = dl_dh * sigmoid_prime(z1) * x;

    ForwardBackward {
        h,
        y,
        loss,
        dl_dw1,
        dl_dw2,
        dl_dh,
        dl_dy,
    }
}

/// Forward-difference estimate of `(dL/dw1, dL/dw2)`.
pub fn numerical_gradient(x: f64, target: f64, w1: f64, w2: f64, h: f64) -> Result<[f64; 2]> {
    config::positive("h", h)?;
    let base = loss(x, target, w1, w2);
    Ok([
        (loss(x, target, w1 + h, w2) - base) / h,
        (loss(x, target, w1, w2 + h) - base) / h,
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackpropSettings {
    pub input: f64,
    pub target: f64,
    pub initial_weights: [f64; 2],
    pub learning_rate: f64,
    pub loss_tolerance: f64,
}

impl Default for BackpropSettings {
    fn default() -> Self {
        Self {
            input: 2.0,
            target: 5.0,
            initial_weights: [0.5, 0.5],
            learning_rate: 0.1,
            loss_tolerance: 1e-3,
        }
    }
}

/// Gradient descent on `[w1, w2]` through the toy network.
///
/// Each state carries the pass evaluated at its own weights, so the loss on
/// screen always belongs to the weights on screen.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoLayerNetwork;

impl TwoLayerNetwork {
    fn state_at(iteration: usize, weights: [f64; 2], settings: &BackpropSettings) -> StepResult {
        let pass = forward_backward(settings.input, settings.target, weights[0], weights[1]);
        StepResult::new(
            iteration,
            ParameterVector::new(weights.to_vec()),
            Some(pass.loss),
            StepDetail::Backprop(pass),
        )
    }
}

impl StepRule for TwoLayerNetwork {
    type Settings = BackpropSettings;

    fn validate(&self, settings: &BackpropSettings) -> Result<()> {
        config::finite("input", settings.input)?;
        config::finite("target", settings.target)?;
        config::all_finite("initial_weights", &settings.initial_weights)?;
        config::learning_rate(settings.learning_rate)?;
        config::positive("loss_tolerance", settings.loss_tolerance)?;
        Ok(())
    }

    fn initial_state(&self, settings: &BackpropSettings) -> Result<StepResult> {
        Ok(Self::state_at(0, settings.initial_weights, settings))
    }

    fn step(&self, previous: &StepResult, settings: &BackpropSettings) -> Result<StepResult> {
        let [w1, w2] = match previous.params.as_slice() {
            &[w1, w2] => [w1, w2],
            other => return Err(DemoError::mismatch("backprop step", 2, other.len())),
        };
        let pass = forward_backward(settings.input, settings.target, w1, w2);
        let updated = [
            w1 - settings.learning_rate * pass.dl_dw1,
            w2 - settings.learning_rate * pass.dl_dw2,
        ];
        Ok(Self::state_at(previous.iteration + 1, updated, settings))
    }

    fn converged(&self, state: &StepResult, settings: &BackpropSettings) -> bool {
        state.loss.is_some_and(|loss| loss < settings.loss_tolerance)
    }
}
