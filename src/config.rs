//! Configuration taken from the environment

use std::env;
use std::path::PathBuf;

/// Display used when `DISPLAY` is not set
pub const DEFAULT_DISPLAY: &str = ":0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Display name, `[host][/unix]:display[.screen]`
    pub display: String,
    /// Whether `display` fell back to [`DEFAULT_DISPLAY`]
    pub display_defaulted: bool,
    pub xauthority: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(
            env::var("DISPLAY").ok(),
            env::var_os("XAUTHORITY").map(PathBuf::from),
            env::var_os("HOME").map(PathBuf::from),
        )
    }

    pub fn from_vars(
        display: Option<String>,
        xauthority: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Self {
        let (display, display_defaulted) = match display {
            Some(display) if !display.is_empty() => (display, false),
            _ => (DEFAULT_DISPLAY.to_string(), true),
        };

        let xauthority = xauthority
            .filter(|path| !path.as_os_str().is_empty())
            .or_else(|| home.map(|home| home.join(".Xauthority")))
            .unwrap_or_else(|| PathBuf::from(".Xauthority"));

        Config {
            display,
            display_defaulted,
            xauthority,
        }
    }
}
