//! Minimal Elman-style recurrent cell:
//! `h_t = tanh(W_xh·x_t + W_hh·h_{t-1})`, `y_t = tanh(W_hy·h_t)`.
//!
//! Weights are fixed by configuration; nothing here learns.

use crate::config;
use crate::error::{DemoError, Result};
use crate::traits::StepRule;
use crate::trajectory::{ParameterVector, StepDetail, StepResult};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Row-major weight matrices of the cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrentWeights {
    /// hidden × input
    pub w_xh: Vec<Vec<f64>>,
    /// hidden × hidden
    pub w_hh: Vec<Vec<f64>>,
    /// output × hidden
    pub w_hy: Vec<Vec<f64>>,
}

impl Default for RecurrentWeights {
    fn default() -> Self {
        Self {
            w_xh: vec![vec![0.5], vec![-0.3]],
            w_hh: vec![vec![0.8, -0.2], vec![0.1, 0.6]],
            w_hy: vec![vec![1.0, -1.0]],
        }
    }
}

struct CellMatrices {
    w_xh: DMatrix<f64>,
    w_hh: DMatrix<f64>,
    w_hy: DMatrix<f64>,
}

fn to_matrix(name: &'static str, rows: &[Vec<f64>]) -> Result<DMatrix<f64>> {
    let cols = rows.first().map_or(0, Vec::len);
    if rows.is_empty() || cols == 0 {
        return Err(DemoError::mismatch(name, rows.len(), cols));
    }
    for row in rows {
        if row.len() != cols {
            return Err(DemoError::mismatch(name, cols, row.len()));
        }
        config::all_finite(name, row)?;
    }
    Ok(DMatrix::from_fn(rows.len(), cols, |r, c| rows[r][c]))
}

impl RecurrentWeights {
    pub fn hidden_size(&self) -> usize {
        self.w_hh.len()
    }

    pub fn input_size(&self) -> usize {
        self.w_xh.first().map_or(0, Vec::len)
    }

    pub fn output_size(&self) -> usize {
        self.w_hy.len()
    }

    fn matrices(&self) -> Result<CellMatrices> {
        let w_xh = to_matrix("w_xh", &self.w_xh)?;
        let w_hh = to_matrix("w_hh", &self.w_hh)?;
        let w_hy = to_matrix("w_hy", &self.w_hy)?;

        let hidden = w_hh.nrows();
        if w_hh.ncols() != hidden {
            return Err(DemoError::mismatch("w_hh", hidden, w_hh.ncols()));
        }
        if w_xh.nrows() != hidden {
            return Err(DemoError::mismatch("w_xh", hidden, w_xh.nrows()));
        }
        if w_hy.ncols() != hidden {
            return Err(DemoError::mismatch("w_hy", hidden, w_hy.ncols()));
        }
        Ok(CellMatrices { w_xh, w_hh, w_hy })
    }

    pub fn validate(&self) -> Result<()> {
        self.matrices().map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrentOutput {
    pub hidden: Vec<f64>,
    pub output: Vec<f64>,
}

fn output_of(matrices: &CellMatrices, hidden: &DVector<f64>) -> Vec<f64> {
    (&matrices.w_hy * hidden).map(f64::tanh).iter().copied().collect()
}

fn advance(
    matrices: &CellMatrices,
    input: &[f64],
    prev_hidden: &[f64],
) -> Result<RecurrentOutput> {
    if input.len() != matrices.w_xh.ncols() {
        return Err(DemoError::mismatch(
            "recurrent input",
            matrices.w_xh.ncols(),
            input.len(),
        ));
    }
    if prev_hidden.len() != matrices.w_hh.nrows() {
        return Err(DemoError::mismatch(
            "recurrent hidden state",
            matrices.w_hh.nrows(),
            prev_hidden.len(),
        ));
    }

    let x = DVector::from_column_slice(input);
    let h_prev = DVector::from_column_slice(prev_hidden);
    let hidden = (&matrices.w_xh * x + &matrices.w_hh * h_prev).map(f64::tanh);
    let output = output_of(matrices, &hidden);

    Ok(RecurrentOutput {
        hidden: hidden.iter().copied().collect(),
        output,
    })
}

/// One time step of the cell.
pub fn recurrent_step(
    input: &[f64],
    prev_hidden: &[f64],
    weights: &RecurrentWeights,
) -> Result<RecurrentOutput> {
    advance(&weights.matrices()?, input, prev_hidden)
}

/// Unrolls the cell over a whole sequence, one output per input.
pub fn run_sequence(
    inputs: &[Vec<f64>],
    initial_hidden: &[f64],
    weights: &RecurrentWeights,
) -> Result<Vec<RecurrentOutput>> {
    let matrices = weights.matrices()?;
    let mut hidden = initial_hidden.to_vec();
    let mut outputs = Vec::with_capacity(inputs.len());
    for input in inputs {
        let out = advance(&matrices, input, &hidden)?;
        hidden.clone_from(&out.hidden);
        outputs.push(out);
    }
    Ok(outputs)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrentSettings {
    pub weights: RecurrentWeights,
    pub inputs: Vec<Vec<f64>>,
    pub initial_hidden: Vec<f64>,
}

impl Default for RecurrentSettings {
    fn default() -> Self {
        Self {
            weights: RecurrentWeights::default(),
            inputs: vec![vec![1.0], vec![0.5], vec![-0.5], vec![-1.0], vec![0.0]],
            initial_hidden: vec![0.0, 0.0],
        }
    }
}

/// Feeds the configured input sequence through the cell, one element per step.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecurrentCell;

impl StepRule for RecurrentCell {
    type Settings = RecurrentSettings;

    fn validate(&self, settings: &RecurrentSettings) -> Result<()> {
        let matrices = settings.weights.matrices()?;
        config::non_zero_count("inputs", settings.inputs.len())?;
        for input in &settings.inputs {
            if input.len() != matrices.w_xh.ncols() {
                return Err(DemoError::mismatch(
                    "recurrent input",
                    matrices.w_xh.ncols(),
                    input.len(),
                ));
            }
            config::all_finite("inputs", input)?;
        }
        if settings.initial_hidden.len() != matrices.w_hh.nrows() {
            return Err(DemoError::mismatch(
                "initial_hidden",
                matrices.w_hh.nrows(),
                settings.initial_hidden.len(),
            ));
        }
        config::all_finite("initial_hidden", &settings.initial_hidden)?;
        Ok(())
    }

    fn initial_state(&self, settings: &RecurrentSettings) -> Result<StepResult> {
        let matrices = settings.weights.matrices()?;
        let hidden = DVector::from_column_slice(&settings.initial_hidden);
        Ok(StepResult::new(
            0,
            ParameterVector::new(settings.initial_hidden.clone()),
            None,
            StepDetail::Recurrent {
                input: Vec::new(),
                output: output_of(&matrices, &hidden),
            },
        ))
    }

    fn step(&self, previous: &StepResult, settings: &RecurrentSettings) -> Result<StepResult> {
        let input = settings
            .inputs
            .get(previous.iteration)
            .ok_or(DemoError::SequenceExhausted {
                length: settings.inputs.len(),
            })?;
        let out = recurrent_step(input, previous.params.as_slice(), &settings.weights)?;
        Ok(StepResult::new(
            previous.iteration + 1,
            ParameterVector::new(out.hidden),
            None,
            StepDetail::Recurrent {
                input: input.clone(),
                output: out.output,
            },
        ))
    }

    fn converged(&self, state: &StepResult, settings: &RecurrentSettings) -> bool {
        self.exhausted(state, settings)
    }

    fn exhausted(&self, state: &StepResult, settings: &RecurrentSettings) -> bool {
        state.iteration >= settings.inputs.len()
    }
}
