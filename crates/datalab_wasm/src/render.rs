//! Browser-side collaborators: the render callback and the wall clock.

use datalab_core::clock::Clock;
use datalab_core::presentation::{Primitives, Renderer};
use js_sys::Function;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// Forwards primitives to a JS `render(primitives)` callback.
pub(crate) struct JsRenderer {
    callback: Function,
}

impl JsRenderer {
    pub(crate) fn new(callback: Function) -> Self {
        Self { callback }
    }
}

impl Renderer for JsRenderer {
    fn render(&mut self, primitives: &Primitives) {
        let value = match to_value(primitives) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("failed to serialize primitives: {err}");
                return;
            }
        };
        if let Err(err) = self.callback.call1(&JsValue::NULL, &value) {
            log::warn!("render callback threw: {err:?}");
        }
    }
}

/// `Date.now()` in milliseconds.
pub(crate) struct DateClock;

impl Clock for DateClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}
