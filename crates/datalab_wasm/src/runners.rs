//! Stepped demo runners exported to JS.
//!
//! Each runner owns one controller. The page drives it with `step`,
//! `train_epochs`, or `auto_play` followed by `poll` from its own timer, and
//! gets a fresh frame through the render callback after every change.

use crate::render::{DateClock, JsRenderer};
use anyhow::{Context, Result};
use datalab_core::backprop::TwoLayerNetwork;
use datalab_core::clock::Clock;
use datalab_core::config::AutoPlaySettings;
use datalab_core::controller::{
    ControllerEvent, RunState, StepController, StopCondition, TimerHandle,
};
use datalab_core::descent::{GradientDescent, Parabola};
use datalab_core::presentation::{Present, Primitives, Renderer};
use datalab_core::recurrent::RecurrentCell;
use datalab_core::trajectory::StepResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Runner logic shared by every demo family, free of `JsValue`.
pub(crate) struct RunnerCore<R: Present> {
    controller: StepController<R>,
    renderer: Option<Box<dyn Renderer>>,
}

impl<R: Present> RunnerCore<R> {
    pub(crate) fn new(rule: R, settings: R::Settings) -> Result<Self> {
        let controller =
            StepController::new(rule, settings).context("Invalid demo settings")?;
        Ok(Self {
            controller,
            renderer: None,
        })
    }

    pub(crate) fn controller(&self) -> &StepController<R> {
        &self.controller
    }

    pub(crate) fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
        self.notify();
    }

    fn notify(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&self.controller.primitives());
        }
    }

    pub(crate) fn configure(&mut self, settings: R::Settings) -> Result<()> {
        self.controller
            .set_settings(settings)
            .context("Invalid demo settings")?;
        self.notify();
        Ok(())
    }

    pub(crate) fn step(&mut self) -> Result<StepResult> {
        let step = self.controller.step().context("Step failed")?;
        self.notify();
        Ok(step)
    }

    pub(crate) fn train_epochs(&mut self, epochs: usize) -> Result<Vec<StepResult>> {
        let steps = self
            .controller
            .train_epochs(epochs)
            .context("Training failed")?;
        self.notify();
        Ok(steps)
    }

    pub(crate) fn auto_play(
        &mut self,
        settings: AutoPlaySettings,
        until_converged: bool,
        clock: &impl Clock,
    ) -> Result<TimerHandle> {
        settings.validate().context("Invalid auto-play settings")?;
        let stop = if until_converged {
            StopCondition::UntilConverged {
                cap: settings.max_steps,
            }
        } else {
            StopCondition::MaxSteps(settings.max_steps)
        };
        self.controller
            .auto_play(settings.interval_ms, stop, clock)
            .context("Auto-play failed to start")
    }

    pub(crate) fn poll(&mut self, clock: &impl Clock) -> Result<Option<ControllerEvent>> {
        let event = self.controller.poll(clock).context("Auto-play step failed")?;
        if event.is_some() {
            self.notify();
        }
        Ok(event)
    }

    pub(crate) fn pause(&mut self) -> bool {
        self.controller.pause()
    }

    pub(crate) fn reset(&mut self) {
        self.controller.reset();
        self.notify();
    }

    pub(crate) fn primitives(&self) -> Primitives {
        self.controller.primitives()
    }
}

fn decode_settings<S: DeserializeOwned + Default>(value: JsValue) -> Result<S, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(S::default());
    }
    from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid demo settings: {}", e)))
}

fn encode<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn run_state_name(state: RunState) -> &'static str {
    match state {
        RunState::Idle => "idle",
        RunState::Stepping => "stepping",
        RunState::AutoPlaying => "auto_playing",
    }
}

macro_rules! demo_runner {
    ($(#[$meta:meta])* $name:ident, $rule:ty, $settings:ty) => {
        $(#[$meta])*
        #[wasm_bindgen]
        pub struct $name {
            core: RunnerCore<$rule>,
        }

        #[wasm_bindgen]
        impl $name {
            /// `settings` may be omitted to use the page defaults.
            #[wasm_bindgen(constructor)]
            pub fn new(settings: JsValue) -> Result<$name, JsValue> {
                crate::logging::init();
                let settings: $settings = decode_settings(settings)?;
                let core = RunnerCore::new(<$rule>::default(), settings)
                    .map_err(crate::to_js_error)?;
                Ok($name { core })
            }

            /// Registers `render(primitives)` and draws the current frame.
            pub fn set_renderer(&mut self, callback: js_sys::Function) {
                self.core.set_renderer(Box::new(JsRenderer::new(callback)));
            }

            pub fn set_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
                let settings: $settings = decode_settings(settings)?;
                self.core.configure(settings).map_err(crate::to_js_error)
            }

            pub fn get_settings(&self) -> Result<JsValue, JsValue> {
                encode(self.core.controller().settings())
            }

            pub fn step(&mut self) -> Result<JsValue, JsValue> {
                let step = self.core.step().map_err(crate::to_js_error)?;
                encode(&step)
            }

            pub fn train_epochs(&mut self, epochs: u32) -> Result<JsValue, JsValue> {
                let steps = self
                    .core
                    .train_epochs(epochs as usize)
                    .map_err(crate::to_js_error)?;
                encode(&steps)
            }

            /// Starts timed stepping. Call `poll` from a timer or animation
            /// frame; `next_due_ms` tells when the next step is due.
            pub fn auto_play(
                &mut self,
                settings: JsValue,
                until_converged: bool,
            ) -> Result<JsValue, JsValue> {
                let settings: AutoPlaySettings = decode_settings(settings)?;
                let handle = self
                    .core
                    .auto_play(settings, until_converged, &DateClock)
                    .map_err(crate::to_js_error)?;
                encode(&handle)
            }

            /// Returns the event for a step taken now, or `null`.
            pub fn poll(&mut self) -> Result<JsValue, JsValue> {
                match self.core.poll(&DateClock).map_err(crate::to_js_error)? {
                    Some(event) => encode(&event),
                    None => Ok(JsValue::NULL),
                }
            }

            pub fn next_due_ms(&self) -> Option<f64> {
                self.core.controller().next_due_ms()
            }

            pub fn pause(&mut self) -> bool {
                self.core.pause()
            }

            pub fn reset(&mut self) {
                self.core.reset();
            }

            pub fn run_state(&self) -> String {
                run_state_name(self.core.controller().run_state()).to_string()
            }

            pub fn is_converged(&self) -> bool {
                self.core.controller().converged()
            }

            pub fn iteration(&self) -> u32 {
                self.core.controller().trajectory().iteration() as u32
            }

            pub fn get_current(&self) -> Result<JsValue, JsValue> {
                encode(self.core.controller().current())
            }

            pub fn get_trajectory(&self) -> Result<JsValue, JsValue> {
                encode(&self.core.controller().history())
            }

            pub fn get_primitives(&self) -> Result<JsValue, JsValue> {
                encode(&self.core.primitives())
            }
        }
    };
}

demo_runner!(
    /// Gradient descent on `f(x) = x²`.
    WasmGradientDescentRunner,
    GradientDescent<Parabola>,
    datalab_core::descent::DescentSettings
);

demo_runner!(
    /// Backpropagation through the two-weight sigmoid network.
    WasmBackpropRunner,
    TwoLayerNetwork,
    datalab_core::backprop::BackpropSettings
);

demo_runner!(
    /// A recurrent cell fed one sequence element per step.
    WasmRecurrentRunner,
    RecurrentCell,
    datalab_core::recurrent::RecurrentSettings
);
