//! Stateless kernel functions for the calculator widgets.

use anyhow::{bail, Context, Result};
use datalab_core::activation::Activation;
use datalab_core::backprop;
use datalab_core::recurrent::{self, RecurrentSettings};
use datalab_core::{config, descent, statistics, vector};
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

fn js<T>(result: datalab_core::Result<T>) -> Result<T, JsValue> {
    result.map_err(|err| crate::to_js_error(err.into()))
}

fn serialize<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

pub(crate) fn parse_activation(name: &str) -> Result<Activation> {
    let activation = match name.to_ascii_lowercase().as_str() {
        "sigmoid" => Activation::Sigmoid,
        "tanh" => Activation::Tanh,
        "relu" => Activation::Relu,
        "leaky_relu" | "leakyrelu" => Activation::LeakyRelu,
        "step" => Activation::Step,
        _ => bail!("Unknown activation: {name}"),
    };
    Ok(activation)
}

pub(crate) fn activation_samples(
    name: &str,
    min: f64,
    max: f64,
    samples: u32,
    derivative: bool,
) -> Result<Vec<f64>> {
    let activation = parse_activation(name)?;
    config::finite("min", min).context("Invalid plot range")?;
    config::finite("max", max).context("Invalid plot range")?;
    if max <= min {
        bail!("Invalid plot range: max must exceed min");
    }
    if samples < 2 {
        bail!("At least two samples are required");
    }
    Ok(activation
        .sample(min, max, samples as usize)
        .into_iter()
        .flat_map(|[z, y]| {
            if derivative {
                [z, activation.derivative(z)]
            } else {
                [z, y]
            }
        })
        .collect())
}

#[wasm_bindgen]
pub fn vector_add(a: &[f64], b: &[f64]) -> Result<Vec<f64>, JsValue> {
    js(vector::add(a, b))
}

#[wasm_bindgen]
pub fn vector_subtract(a: &[f64], b: &[f64]) -> Result<Vec<f64>, JsValue> {
    js(vector::subtract(a, b))
}

#[wasm_bindgen]
pub fn vector_scale(a: &[f64], factor: f64) -> Result<Vec<f64>, JsValue> {
    js(vector::scale(a, factor))
}

#[wasm_bindgen]
pub fn vector_dot(a: &[f64], b: &[f64]) -> Result<f64, JsValue> {
    js(vector::dot(a, b))
}

#[wasm_bindgen]
pub fn vector_norm(a: &[f64]) -> Result<f64, JsValue> {
    js(vector::norm(a))
}

#[wasm_bindgen]
pub fn vector_distance(a: &[f64], b: &[f64]) -> Result<f64, JsValue> {
    js(vector::distance(a, b))
}

/// Angle in radians.
#[wasm_bindgen]
pub fn vector_angle(a: &[f64], b: &[f64]) -> Result<f64, JsValue> {
    js(vector::angle_between(a, b))
}

#[wasm_bindgen]
pub fn vector_project(a: &[f64], b: &[f64]) -> Result<Vec<f64>, JsValue> {
    js(vector::project(a, b))
}

#[wasm_bindgen]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64, JsValue> {
    js(statistics::cosine_similarity(a, b))
}

#[wasm_bindgen]
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64, JsValue> {
    js(statistics::pearson_correlation(a, b))
}

#[wasm_bindgen]
pub fn mean(values: &[f64]) -> Result<f64, JsValue> {
    js(statistics::mean(values))
}

/// Population variance.
#[wasm_bindgen]
pub fn variance(values: &[f64]) -> Result<f64, JsValue> {
    js(statistics::variance(values))
}

#[wasm_bindgen]
pub fn std_dev(values: &[f64]) -> Result<f64, JsValue> {
    js(statistics::std_dev(values))
}

#[wasm_bindgen]
pub fn quantile(values: &[f64], p: f64) -> Result<f64, JsValue> {
    js(statistics::quantile(values, p))
}

#[wasm_bindgen]
pub fn median(values: &[f64]) -> Result<f64, JsValue> {
    js(statistics::median(values))
}

#[wasm_bindgen]
pub fn covariance(a: &[f64], b: &[f64]) -> Result<f64, JsValue> {
    js(statistics::covariance(a, b))
}

#[wasm_bindgen]
pub fn z_scores(values: &[f64]) -> Result<Vec<f64>, JsValue> {
    js(statistics::z_scores(values))
}

/// Five-number summary plus mean and standard deviation, as an object.
#[wasm_bindgen]
pub fn statistics_summary(values: &[f64]) -> Result<JsValue, JsValue> {
    let summary = js(statistics::summary(values))?;
    serialize(&summary)
}

/// Forward and backward pass of the two-weight network, as an object.
#[wasm_bindgen]
pub fn forward_backward(x: f64, target: f64, w1: f64, w2: f64) -> Result<JsValue, JsValue> {
    js(config::all_finite("forward_backward", &[x, target, w1, w2]))?;
    serialize(&backprop::forward_backward(x, target, w1, w2))
}

/// Finite-difference `[dL/dw1, dL/dw2]` for the gradient-check panel.
#[wasm_bindgen]
pub fn numerical_gradient(
    x: f64,
    target: f64,
    w1: f64,
    w2: f64,
    h: f64,
) -> Result<Vec<f64>, JsValue> {
    js(config::all_finite("numerical_gradient", &[x, target, w1, w2]))?;
    Ok(js(backprop::numerical_gradient(x, target, w1, w2, h))?.to_vec())
}

/// `x - lr * 2x`, with the learning rate held to the slider range.
#[wasm_bindgen]
pub fn gradient_descent_step(x: f64, learning_rate: f64) -> Result<f64, JsValue> {
    js(config::finite("x", x))?;
    js(config::learning_rate(learning_rate))?;
    Ok(descent::gradient_descent_step(x, learning_rate))
}

/// Flat `[z0, f(z0), z1, f(z1), ...]` samples of the named activation, or of
/// its derivative when `derivative` is set.
#[wasm_bindgen]
pub fn activation_curve(
    name: &str,
    min: f64,
    max: f64,
    samples: u32,
    derivative: bool,
) -> Result<Vec<f64>, JsValue> {
    activation_samples(name, min, max, samples, derivative).map_err(crate::to_js_error)
}

/// The whole unrolled sequence for the configured cell, as
/// `[{hidden, output}]`. `settings` may be omitted to use the defaults.
#[wasm_bindgen]
pub fn unroll_recurrent(settings: JsValue) -> Result<JsValue, JsValue> {
    let settings: RecurrentSettings = if settings.is_undefined() || settings.is_null() {
        RecurrentSettings::default()
    } else {
        serde_wasm_bindgen::from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid demo settings: {}", e)))?
    };
    let outputs = js(recurrent::run_sequence(
        &settings.inputs,
        &settings.initial_hidden,
        &settings.weights,
    ))?;
    serialize(&outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_names_are_case_insensitive() {
        assert_eq!(parse_activation("ReLU").expect("relu"), Activation::Relu);
        assert_eq!(
            parse_activation("leaky_relu").expect("leaky"),
            Activation::LeakyRelu
        );
        assert!(parse_activation("softmax").is_err());
    }

    #[test]
    fn activation_samples_are_flattened_pairs() {
        let flat = activation_samples("step", -1.0, 1.0, 3, false).expect("samples");
        assert_eq!(flat.len(), 6);
        assert_eq!(flat[0], -1.0);
        assert_eq!(flat[4], 1.0);
        assert_eq!(flat[5], 1.0);

        let slopes = activation_samples("relu", -1.0, 1.0, 3, true).expect("samples");
        assert_eq!(slopes, vec![-1.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn activation_samples_reject_bad_ranges() {
        let err = activation_samples("tanh", 1.0, 1.0, 10, false).expect_err("empty range");
        assert!(err.to_string().contains("max must exceed min"));
        assert!(activation_samples("tanh", 0.0, 1.0, 1, false).is_err());
        let err = activation_samples("tanh", f64::NAN, 1.0, 10, false).expect_err("nan");
        assert!(format!("{err:#}").starts_with("Invalid plot range"));
    }
}
