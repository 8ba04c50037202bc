//! Routes `log` records and panics to the browser console.

use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(message: &str);
    #[wasm_bindgen(js_namespace = console, js_name = warn)]
    fn console_warn(message: &str);
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(message: &str);
}

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        match record.level() {
            Level::Error => console_error(&message),
            Level::Warn => console_warn(&message),
            _ => console_log(&message),
        }
    }

    fn flush(&self) {}
}

/// Installs the panic hook and the console logger. Safe to call repeatedly.
pub(crate) fn init() {
    console_error_panic_hook::set_once();
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

pub(crate) fn parse_level(level: &str) -> anyhow::Result<LevelFilter> {
    level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow::anyhow!("Unknown log level: {level}"))
}

/// Adjusts console verbosity (`off`, `error`, `warn`, `info`, `debug`, `trace`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    init();
    let filter = parse_level(level).map_err(crate::to_js_error)?;
    log::set_max_level(filter);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_level;
    use log::LevelFilter;

    #[test]
    fn parses_known_levels_case_insensitively() {
        assert_eq!(parse_level("debug").expect("level"), LevelFilter::Debug);
        assert_eq!(parse_level("WARN").expect("level"), LevelFilter::Warn);
        assert_eq!(parse_level("off").expect("level"), LevelFilter::Off);
    }

    #[test]
    fn rejects_unknown_levels() {
        let err = parse_level("loud").expect_err("unknown level");
        assert!(err.to_string().contains("Unknown log level"));
    }
}
