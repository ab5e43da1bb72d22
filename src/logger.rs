use log::{Level, LevelFilter, Metadata, Record};

pub static LOGGER: Logger = Logger;

/// Sends `log` records to the browser console, or to stderr off the web.
pub struct Logger;

impl Logger {
    /// Installs the logger unless the host already set one.
    pub fn init(level: LevelFilter) {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(level);
        }
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!(
                "{} - {} - {}",
                record.level(),
                record.target(),
                record.args()
            );
            write(record.level(), &message);
        }
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn write(level: Level, message: &str) {
    use wasm_bindgen::JsValue;
    use web_sys::console;

    let value = JsValue::from_str(message);
    match level {
        Level::Error => console::error_1(&value),
        Level::Warn => console::warn_1(&value),
        Level::Info => console::info_1(&value),
        Level::Debug | Level::Trace => console::debug_1(&value),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn write(level: Level, message: &str) {
    if level <= Level::Warn {
        eprintln!("{message}");
    } else {
        println!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        Logger::init(LevelFilter::Warn);
        Logger::init(LevelFilter::Debug);
        log::warn!("logger smoke test");
    }
}
