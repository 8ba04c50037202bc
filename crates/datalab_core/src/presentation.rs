//! Maps trajectories to drawing primitives for the external renderer.
//!
//! Output depends only on the history and the settings, so identical inputs
//! always draw identically and the mapping can be tested without a canvas.

use crate::backprop::TwoLayerNetwork;
use crate::controller::StepController;
use crate::descent::GradientDescent;
use crate::recurrent::RecurrentCell;
use crate::traits::{Objective, StepRule};
use crate::trajectory::{StepDetail, StepResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// `{points: [[x,y]], lines: [[{x,y},{x,y}]], labels: [{text,x,y}]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Primitives {
    pub points: Vec<[f64; 2]>,
    pub lines: Vec<[Point; 2]>,
    pub labels: Vec<Label>,
}

impl Primitives {
    fn point(&mut self, x: f64, y: f64) {
        self.points.push([x, y]);
    }

    fn line(&mut self, from: Point, to: Point) {
        self.lines.push([from, to]);
    }

    fn polyline(&mut self, points: impl IntoIterator<Item = Point>) {
        let mut previous: Option<Point> = None;
        for point in points {
            if let Some(from) = previous {
                self.line(from, point);
            }
            previous = Some(point);
        }
    }

    fn label(&mut self, text: String, x: f64, y: f64) {
        self.labels.push(Label { text, x, y });
    }
}

/// The drawing collaborator. Fire-and-forget.
pub trait Renderer {
    fn render(&mut self, primitives: &Primitives);
}

/// A demo that knows how to draw its own trajectory.
pub trait Present: StepRule {
    fn primitives(&self, history: &[StepResult], settings: &Self::Settings) -> Primitives;
}

impl<R: Present> StepController<R> {
    pub fn primitives(&self) -> Primitives {
        self.rule().primitives(self.history(), self.settings())
    }

    pub fn render_to(&self, renderer: &mut impl Renderer) {
        renderer.render(&self.primitives());
    }
}

const CURVE_SAMPLES: usize = 81;

fn fmt3(value: f64) -> String {
    format!("{value:.3}")
}

impl<O: Objective> Present for GradientDescent<O> {
    fn primitives(&self, history: &[StepResult], settings: &Self::Settings) -> Primitives {
        let objective = self.objective();
        let mut out = Primitives::default();

        // Symmetric window around the minimum wide enough for the whole path.
        let center = objective.minimizer();
        let reach = history
            .iter()
            .filter_map(|s| s.params.as_slice().first())
            .chain(std::iter::once(&settings.initial_position))
            .map(|x| (x - center).abs())
            .fold(1.0_f64, f64::max)
            + 1.0;
        let step = 2.0 * reach / (CURVE_SAMPLES - 1) as f64;
        out.polyline((0..CURVE_SAMPLES).map(|i| {
            let x = center - reach + step * i as f64;
            Point::new(x, objective.value(x))
        }));

        let path: Vec<Point> = history
            .iter()
            .filter_map(|s| s.params.as_slice().first())
            .map(|&x| Point::new(x, objective.value(x)))
            .collect();
        for p in &path {
            out.point(p.x, p.y);
        }
        out.polyline(path.iter().copied());

        if let Some(last) = path.last() {
            out.label(
                format!("x = {}, f(x) = {}", fmt3(last.x), fmt3(last.y)),
                last.x,
                last.y,
            );
        }
        out
    }
}

impl Present for TwoLayerNetwork {
    fn primitives(&self, history: &[StepResult], _settings: &Self::Settings) -> Primitives {
        let mut out = Primitives::default();
        let losses: Vec<Point> = history
            .iter()
            .filter_map(|s| s.loss.map(|loss| Point::new(s.iteration as f64, loss)))
            .collect();
        for p in &losses {
            out.point(p.x, p.y);
        }
        out.polyline(losses.iter().copied());

        if let Some(last) = history.last() {
            let x = last.iteration as f64;
            let y = last.loss.unwrap_or(0.0);
            if let [w1, w2] = last.params.as_slice() {
                out.label(format!("w1 = {}", fmt3(*w1)), x, y);
                out.label(format!("w2 = {}", fmt3(*w2)), x, y);
            }
            if let StepDetail::Backprop(pass) = &last.detail {
                out.label(format!("loss = {}", fmt3(pass.loss)), x, y);
            }
        }
        out
    }
}

impl Present for RecurrentCell {
    fn primitives(&self, history: &[StepResult], _settings: &Self::Settings) -> Primitives {
        let mut out = Primitives::default();
        let units = history.first().map_or(0, |s| s.params.len());
        for unit in 0..units {
            let series: Vec<Point> = history
                .iter()
                .filter_map(|s| {
                    s.params
                        .as_slice()
                        .get(unit)
                        .map(|&h| Point::new(s.iteration as f64, h))
                })
                .collect();
            for p in &series {
                out.point(p.x, p.y);
            }
            out.polyline(series);
        }

        if let Some(last) = history.last() {
            if let StepDetail::Recurrent { output, .. } = &last.detail {
                let text = output.iter().map(|&y| fmt3(y)).collect::<Vec<_>>().join(", ");
                out.label(
                    format!("y[{}] = [{}]", last.iteration, text),
                    last.iteration as f64,
                    output.first().copied().unwrap_or(0.0),
                );
            }
        }
        out
    }
}
