//! Descriptive statistics for the data-exploration widgets.
//!
//! Variance and standard deviation use the population convention (divide by
//! `n`) everywhere. The example values shown on the pages depend on it.

use crate::config;
use crate::error::{DemoError, Result};
use crate::vector;
use serde::Serialize;

/// Every statistic needs at least one value, and only finite ones.
fn non_empty(operation: &'static str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(DemoError::not_computable(operation, "empty input"));
    }
    config::all_finite(operation, values)
}

fn same_length(operation: &'static str, a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(DemoError::mismatch(operation, a.len(), b.len()));
    }
    non_empty(operation, a)?;
    non_empty(operation, b)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

pub fn mean(values: &[f64]) -> Result<f64> {
    non_empty("mean", values)?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance.
pub fn variance(values: &[f64]) -> Result<f64> {
    let m = mean(values)?;
    Ok(values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Result<f64> {
    Ok(variance(values)?.sqrt())
}

/// Population covariance.
pub fn covariance(a: &[f64], b: &[f64]) -> Result<f64> {
    same_length("covariance", a, b)?;
    let ma = mean(a)?;
    let mb = mean(b)?;
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum();
    Ok(sum / a.len() as f64)
}

/// Nearest-rank quantile: the element at `floor(p * n)` of the sorted input,
/// clamped to the last element so that `p = 1` yields the maximum.
pub fn quantile(values: &[f64], p: f64) -> Result<f64> {
    non_empty("quantile", values)?;
    config::finite("p", p)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(DemoError::invalid("p", p, "must lie in [0, 1]"));
    }
    let sorted = sorted(values);
    Ok(sorted[rank(p, sorted.len())])
}

fn rank(p: f64, n: usize) -> usize {
    ((p * n as f64).floor() as usize).min(n - 1)
}

pub fn median(values: &[f64]) -> Result<f64> {
    quantile(values, 0.5)
}

pub fn min(values: &[f64]) -> Result<f64> {
    non_empty("min", values)?;
    Ok(values.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn max(values: &[f64]) -> Result<f64> {
    non_empty("max", values)?;
    Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Standardized scores `(v - mean) / std`.
pub fn z_scores(values: &[f64]) -> Result<Vec<f64>> {
    let m = mean(values)?;
    let s = std_dev(values)?;
    if s == 0.0 {
        return Err(DemoError::not_computable(
            "z_scores",
            "zero standard deviation",
        ));
    }
    Ok(values.iter().map(|v| (v - m) / s).collect())
}

/// Pearson correlation coefficient.
///
/// A constant input has no defined correlation and is reported as
/// `NotComputable` instead of leaking a NaN.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64> {
    same_length("pearson_correlation", a, b)?;
    let va = variance(a)?;
    let vb = variance(b)?;
    if va == 0.0 || vb == 0.0 {
        return Err(DemoError::not_computable(
            "pearson_correlation",
            "zero standard deviation",
        ));
    }
    // sqrt(v * v) == v exactly, so self-correlation is exactly 1. Rounding can
    // still push other ratios just outside [-1, 1].
    Ok((covariance(a, b)? / (va * vb).sqrt()).clamp(-1.0, 1.0))
}

pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    let dot = vector::dot(a, b)?;
    let magnitude = vector::norm(a)? * vector::norm(b)?;
    if magnitude == 0.0 {
        return Err(DemoError::not_computable(
            "cosine_similarity",
            "zero magnitude",
        ));
    }
    Ok(dot / magnitude)
}

/// Everything a box plot needs, plus the moments shown beside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

pub fn summary(values: &[f64]) -> Result<Summary> {
    non_empty("summary", values)?;
    let sorted = sorted(values);
    let n = sorted.len();
    Ok(Summary {
        count: n,
        min: sorted[0],
        q1: sorted[rank(0.25, n)],
        median: sorted[rank(0.5, n)],
        q3: sorted[rank(0.75, n)],
        max: sorted[n - 1],
        mean: mean(values)?,
        std_dev: std_dev(values)?,
    })
}
