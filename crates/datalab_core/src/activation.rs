//! Activation functions and their derivatives.
//!
//! The scalar helpers are generic so the same formulas serve `f32` plots and
//! `f64` kernels.

use crate::traits::Scalar;
use serde::{Deserialize, Serialize};

/// Logistic sigmoid `1 / (1 + e^-z)`.
pub fn sigmoid<T: Scalar>(z: T) -> T {
    T::one() / (T::one() + (-z).exp())
}

/// `σ'(z) = σ(z)(1 - σ(z))`.
pub fn sigmoid_prime<T: Scalar>(z: T) -> T {
    let s = sigmoid(z);
    s * (T::one() - s)
}

/// `tanh'(z) = 1 - tanh²(z)`.
pub fn tanh_prime<T: Scalar>(z: T) -> T {
    let t = z.tanh();
    T::one() - t * t
}

const LEAKY_SLOPE: f64 = 0.01;

/// The activations shown on the activation-function page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    Step,
}

impl Activation {
    pub fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(z),
            Activation::Tanh => z.tanh(),
            Activation::Relu => z.max(0.0),
            Activation::LeakyRelu => {
                if z > 0.0 {
                    z
                } else {
                    LEAKY_SLOPE * z
                }
            }
            Activation::Step => {
                if z >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Derivative with respect to `z`. At `z = 0` the kinks of ReLU and
    /// the step take the left-hand value.
    pub fn derivative(self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid_prime(z),
            Activation::Tanh => tanh_prime(z),
            Activation::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::LeakyRelu => {
                if z > 0.0 {
                    1.0
                } else {
                    LEAKY_SLOPE
                }
            }
            Activation::Step => 0.0,
        }
    }

    /// Samples `(z, f(z))` on an evenly spaced grid for plotting.
    pub fn sample(self, min: f64, max: f64, samples: usize) -> Vec<[f64; 2]> {
        if samples < 2 || !(max > min) {
            return Vec::new();
        }
        let step = (max - min) / (samples - 1) as f64;
        (0..samples)
            .map(|i| {
                let z = min + step * i as f64;
                [z, self.apply(z)]
            })
            .collect()
    }
}
