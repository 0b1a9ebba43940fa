//! TOML-based page configuration.
//!
//! Every option has a default, so an empty file (or no file at all) yields the
//! stock page: a January 20th gate, the standard particle counts and the
//! standard animation timings.
//!
//! The CLI keeps its copy at `~/.config/unveil/config.toml`; the page runtime
//! only ever receives an already-built [`Config`] value.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ValidationError};
use crate::gate::AnnualWindow;

/// Annual gate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// When false the content is revealed as soon as loading finishes.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Zero-based month (0 = January).
    #[serde(default)]
    pub month: u32,
    #[serde(default = "default_gate_day")]
    pub day: u32,
}

/// Loading overlay timings and decoration counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingConfig {
    #[serde(default = "default_progress_duration_ms")]
    pub progress_duration_ms: u64,
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// Time the overlay stays up before it starts fading out.
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
    #[serde(default = "default_loading_star_count")]
    pub star_count: usize,
    #[serde(default = "default_50")]
    pub particle_count: usize,
}

/// Particle counts for the lock screen and hero section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticlesConfig {
    #[serde(default = "default_50")]
    pub lock_screen_particle_count: usize,
    #[serde(default = "default_lock_screen_star_count")]
    pub lock_screen_star_count: usize,
    #[serde(default = "default_hero_particle_count")]
    pub hero_particle_count: usize,
}

/// Reveal timings and scroll-reveal geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealConfig {
    #[serde(default = "default_unlock_duration_ms")]
    pub unlock_duration_ms: u64,
    #[serde(default = "default_100")]
    pub stagger_ms: u64,
    #[serde(default = "default_100")]
    pub post_reveal_delay_ms: u64,
    /// Fraction of the viewport height kept clear at the bottom.
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f64,
    #[serde(default = "default_root_margin_bottom_px")]
    pub root_margin_bottom_px: f64,
}

/// Cursor glow settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
}

/// Rate limits for high-frequency host events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WiringConfig {
    #[serde(default = "default_100")]
    pub scroll_throttle_ms: u64,
    #[serde(default = "default_parallax_throttle_ms")]
    pub parallax_throttle_ms: u64,
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,
}

/// Toggles for optional effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectsConfig {
    #[serde(default = "default_true")]
    pub parallax: bool,
    #[serde(default = "default_true")]
    pub tilt: bool,
    #[serde(default)]
    pub typewriter: bool,
    #[serde(default = "default_true")]
    pub smooth_scroll: bool,
    /// Delay after the host `load` event before late effects are attempted.
    #[serde(default = "default_late_effects_delay_ms")]
    pub late_effects_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypewriterConfig {
    #[serde(default = "default_char_interval_ms")]
    pub char_interval_ms: u64,
    #[serde(default = "default_line_delay_ms")]
    pub line_delay_ms: u64,
}

/// Page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Seed for decoration randomness. Entropy-seeded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub particles: ParticlesConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub wiring: WiringConfig,
    #[serde(default)]
    pub effects: EffectsConfig,
    #[serde(default)]
    pub typewriter: TypewriterConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_gate_day() -> u32 {
    20
}
fn default_progress_duration_ms() -> u64 {
    4000
}
fn default_progress_interval_ms() -> u64 {
    30
}
fn default_hold_ms() -> u64 {
    4500
}
fn default_fade_ms() -> u64 {
    1200
}
fn default_loading_star_count() -> usize {
    100
}
fn default_50() -> usize {
    50
}
fn default_lock_screen_star_count() -> usize {
    80
}
fn default_hero_particle_count() -> usize {
    30
}
fn default_unlock_duration_ms() -> u64 {
    1500
}
fn default_100() -> u64 {
    100
}
fn default_scroll_threshold() -> f64 {
    0.12
}
fn default_root_margin_bottom_px() -> f64 {
    80.0
}
fn default_smoothing() -> f64 {
    0.15
}
fn default_parallax_throttle_ms() -> u64 {
    16
}
fn default_resize_debounce_ms() -> u64 {
    200
}
fn default_late_effects_delay_ms() -> u64 {
    500
}
fn default_char_interval_ms() -> u64 {
    50
}
fn default_line_delay_ms() -> u64 {
    1500
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            month: 0,
            day: default_gate_day(),
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            progress_duration_ms: default_progress_duration_ms(),
            progress_interval_ms: default_progress_interval_ms(),
            hold_ms: default_hold_ms(),
            fade_ms: default_fade_ms(),
            star_count: default_loading_star_count(),
            particle_count: 50,
        }
    }
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            lock_screen_particle_count: 50,
            lock_screen_star_count: default_lock_screen_star_count(),
            hero_particle_count: default_hero_particle_count(),
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            unlock_duration_ms: default_unlock_duration_ms(),
            stagger_ms: 100,
            post_reveal_delay_ms: 100,
            scroll_threshold: default_scroll_threshold(),
            root_margin_bottom_px: default_root_margin_bottom_px(),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smoothing: default_smoothing(),
        }
    }
}

impl Default for WiringConfig {
    fn default() -> Self {
        Self {
            scroll_throttle_ms: 100,
            parallax_throttle_ms: default_parallax_throttle_ms(),
            resize_debounce_ms: default_resize_debounce_ms(),
        }
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            parallax: true,
            tilt: true,
            typewriter: false,
            smooth_scroll: true,
            late_effects_delay_ms: default_late_effects_delay_ms(),
        }
    }
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            char_interval_ms: default_char_interval_ms(),
            line_delay_ms: default_line_delay_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            gate: GateConfig::default(),
            loading: LoadingConfig::default(),
            particles: ParticlesConfig::default(),
            reveal: RevealConfig::default(),
            cursor: CursorConfig::default(),
            wiring: WiringConfig::default(),
            effects: EffectsConfig::default(),
            typewriter: TypewriterConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = match obj.get(part) {
                    Some(v) => v.clone(),
                    // Optional top-level values are omitted while unset.
                    None if key == "seed" => serde_json::Value::Null,
                    None => return Err(ConfigError::UnknownKey(key.to_string())),
                };

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) | serde_json::Value::Null => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    /// Default location: `<config_dir>/unveil/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("unveil")
            .join("config.toml")
    }

    /// Load from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };
        let cfg = Self::from_toml_str(&content)?;
        Ok(cfg)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(content)?;
        cfg.validate().map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(cfg)
    }

    /// Persist to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from `path`, returning defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The result is validated before it replaces
    /// `self`; on error `self` is left untouched.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        AnnualWindow::new(self.gate.month, self.gate.day)?;
        check_range(
            "reveal.scroll_threshold",
            self.reveal.scroll_threshold,
            0.0..1.0,
            "0.0 <= x < 1.0",
        )?;
        check_range(
            "cursor.smoothing",
            self.cursor.smoothing,
            f64::MIN_POSITIVE..1.0 + f64::EPSILON,
            "0.0 < x <= 1.0",
        )?;
        if self.reveal.root_margin_bottom_px < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "reveal.root_margin_bottom_px".into(),
                value: self.reveal.root_margin_bottom_px,
                expected: "x >= 0".into(),
            });
        }
        if self.loading.progress_interval_ms == 0 {
            return Err(ValidationError::OutOfRange {
                field: "loading.progress_interval_ms".into(),
                value: 0.0,
                expected: "x > 0".into(),
            });
        }
        Ok(())
    }

    /// The gate window, or `None` when gating is disabled.
    pub fn window(&self) -> Result<Option<AnnualWindow>, ValidationError> {
        if !self.gate.enabled {
            return Ok(None);
        }
        AnnualWindow::new(self.gate.month, self.gate.day).map(Some)
    }
}

fn check_range(
    field: &str,
    value: f64,
    range: std::ops::Range<f64>,
    expected: &str,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            expected: expected.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.gate.month, 0);
        assert_eq!(cfg.gate.day, 20);
        assert_eq!(cfg.particles.lock_screen_star_count, 80);
        assert_eq!(cfg.particles.hero_particle_count, 30);
        assert_eq!(cfg.reveal.unlock_duration_ms, 1500);
        assert_eq!(cfg.reveal.scroll_threshold, 0.12);
        assert_eq!(cfg.cursor.smoothing, 0.15);
        assert_eq!(cfg.wiring.resize_debounce_ms, 200);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml_str("[gate]\nmonth = 6\n\n[reveal]\nstagger_ms = 50\n").unwrap();
        assert_eq!(cfg.gate.month, 6);
        assert_eq!(cfg.gate.day, 20);
        assert!(cfg.gate.enabled);
        assert_eq!(cfg.reveal.stagger_ms, 50);
        assert_eq!(cfg.reveal.unlock_duration_ms, 1500);
    }

    #[test]
    fn invalid_window_is_rejected_on_parse() {
        assert!(Config::from_toml_str("[gate]\nmonth = 12\n").is_err());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("gate.day").as_deref(), Some("20"));
        assert_eq!(cfg.get("effects.typewriter").as_deref(), Some("false"));
        assert!(cfg.get("gate.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("gate.enabled", "false").unwrap();
        cfg.set("reveal.scroll_threshold", "0.25").unwrap();
        cfg.set("seed", "42").unwrap();
        assert!(!cfg.gate.enabled);
        assert_eq!(cfg.reveal.scroll_threshold, 0.25);
        assert_eq!(cfg.seed, Some(42));
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("gate.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("gate.enabled", "not_a_bool").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_rejects_values_that_fail_validation() {
        let mut cfg = Config::default();
        assert!(cfg.set("gate.day", "40").is_err());
        assert!(cfg.set("cursor.smoothing", "0").is_err());
        assert_eq!(cfg.gate.day, 20);
    }

    #[test]
    fn window_respects_enabled_flag() {
        let mut cfg = Config::default();
        assert_eq!(cfg.window().unwrap(), Some(AnnualWindow::new(0, 20).unwrap()));
        cfg.gate.enabled = false;
        assert_eq!(cfg.window().unwrap(), None);
    }

    #[test]
    fn save_and_load_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.gate.month = 11;
        cfg.gate.day = 31;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }
}
