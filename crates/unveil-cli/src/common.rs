//! Helpers shared by the subcommands.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use unveil_core::{Config, ConfigError};

pub struct Context {
    config_path: PathBuf,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path: config_path.unwrap_or_else(Config::default_path),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config file; a missing file yields defaults.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        Config::load_from(&self.config_path)
    }
}

const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a local timestamp for `--at`. Accepts `YYYY-MM-DD`,
/// `YYYY-MM-DDTHH:MM[:SS[.fff]]` and the same with a space.
pub fn parse_at(value: &str) -> Result<NaiveDateTime, String> {
    let value = value.trim();
    for format in FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(at);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("invalid timestamp '{value}', expected YYYY-MM-DD[THH:MM[:SS]]"))
}

/// The `--at` instant, or the local wall clock.
pub fn now_or(at: Option<NaiveDateTime>) -> NaiveDateTime {
    at.unwrap_or_else(|| Local::now().naive_local())
}

pub fn month_name(month0: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES.get(month0 as usize).copied().unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_formats() {
        let midnight = parse_at("2026-01-20").unwrap();
        assert_eq!(midnight.to_string(), "2026-01-20 00:00:00");
        assert_eq!(
            parse_at("2026-01-19T23:59:59").unwrap().to_string(),
            "2026-01-19 23:59:59"
        );
        assert_eq!(
            parse_at("2026-01-19 23:59:59.500").unwrap().to_string(),
            "2026-01-19 23:59:59.500"
        );
        assert_eq!(parse_at("2026-01-19T08:30").unwrap().to_string(), "2026-01-19 08:30:00");
        assert!(parse_at("tomorrow").is_err());
    }
}
