//! Browser bindings for the datalab demos.

use wasm_bindgen::prelude::*;

mod kernel;
mod logging;
mod render;
mod runners;

pub use kernel::*;
pub use logging::set_log_level;
pub use runners::{WasmBackpropRunner, WasmGradientDescentRunner, WasmRecurrentRunner};

/// Flattens an error chain into the string thrown on the JS side.
pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
