//! Cross-platform log sink behind the `log_*!` macros.
//!
//! Browser builds write to the devtools console, native builds to
//! stdout/stderr.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn write(level: Level, message: &str) {
    let line = format!("[{}] {}", level.tag(), message);
    match level {
        Level::Info => web_sys::console::log_1(&line.into()),
        Level::Warn => web_sys::console::warn_1(&line.into()),
        Level::Error => web_sys::console::error_1(&line.into()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn write(level: Level, message: &str) {
    match level {
        Level::Info => println!("[{}] {}", level.tag(), message),
        Level::Warn | Level::Error => eprintln!("[{}] {}", level.tag(), message),
    }
}
