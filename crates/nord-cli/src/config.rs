//! Node configuration – reads/writes `~/.nord/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nord_perception::{
    BumpAxes, DEFAULT_BUMP_THRESHOLD, ProcessorConfig, STANDARD_GRAVITY, ValidationConfig,
};
use nord_runtime::ImuNodeConfig;
use serde::{Deserialize, Serialize};

/// Persisted node configuration. Every field has a default, so a partial
/// file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Scale applied to the gravity unit vector (m/s²).
    #[serde(default = "default_gravity_g")]
    pub gravity_g: f64,

    /// Jump magnitude above which a bump fires (m/s²).
    #[serde(default = "default_bump_threshold")]
    pub bump_threshold: f64,

    /// Fold the lateral axis into the bump magnitude.
    #[serde(default)]
    pub bump_include_lateral: bool,

    /// Delivery cadence of replayed samples. `0` replays as fast as possible.
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u32,

    /// Reject non-finite samples and non-unit orientations.
    #[serde(default)]
    pub validate_input: bool,

    /// Accepted deviation of |q| from 1 when `validate_input` is set.
    #[serde(default = "default_unit_norm_tolerance")]
    pub unit_norm_tolerance: f64,

    /// Serve the WebSocket bridge.
    #[serde(default)]
    pub ws_enabled: bool,

    /// Port of the WebSocket bridge.
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
}

fn default_gravity_g() -> f64 {
    STANDARD_GRAVITY
}
fn default_bump_threshold() -> f64 {
    DEFAULT_BUMP_THRESHOLD
}
fn default_sample_rate_hz() -> u32 {
    20
}
fn default_unit_norm_tolerance() -> f64 {
    ValidationConfig::default().unit_norm_tolerance
}
fn default_ws_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gravity_g: default_gravity_g(),
            bump_threshold: default_bump_threshold(),
            bump_include_lateral: false,
            sample_rate_hz: default_sample_rate_hz(),
            validate_input: false,
            unit_norm_tolerance: default_unit_norm_tolerance(),
            ws_enabled: false,
            ws_port: default_ws_port(),
        }
    }
}

impl Config {
    /// Translate into the node's runtime configuration.
    pub fn node_config(&self) -> ImuNodeConfig {
        ImuNodeConfig {
            processor: ProcessorConfig {
                gravity_g: self.gravity_g,
                bump_threshold: self.bump_threshold,
                bump_axes: if self.bump_include_lateral {
                    BumpAxes::ForwardUpRight
                } else {
                    BumpAxes::ForwardUp
                },
            },
            validation: self.validate_input.then_some(ValidationConfig {
                unit_norm_tolerance: self.unit_norm_tolerance,
            }),
        }
    }

    /// Interval between replayed samples, `None` when pacing is disabled.
    pub fn sample_period(&self) -> Option<Duration> {
        (self.sample_rate_hz > 0).then(|| Duration::from_secs_f64(1.0 / self.sample_rate_hz as f64))
    }
}

/// Return the config path: `$NORD_CONFIG` if set, else `~/.nord/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("NORD_CONFIG") {
        return PathBuf::from(p);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".nord").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
///
/// Environment overrides are not applied here; see [`apply_env_overrides`].
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    toml::from_str(&raw)
        .map(Some)
        .map_err(|e| format!("Failed to parse config: {}", e))
}

/// Apply `NORD_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `NORD_GRAVITY_G` | `gravity_g` |
/// | `NORD_BUMP_THRESHOLD` | `bump_threshold` |
/// | `NORD_SAMPLE_RATE_HZ` | `sample_rate_hz` |
/// | `NORD_WS_PORT` | `ws_port` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("NORD_GRAVITY_G")
        && let Ok(g) = v.parse::<f64>()
    {
        cfg.gravity_g = g;
    }
    if let Ok(v) = std::env::var("NORD_BUMP_THRESHOLD")
        && let Ok(t) = v.parse::<f64>()
    {
        cfg.bump_threshold = t;
    }
    if let Ok(v) = std::env::var("NORD_SAMPLE_RATE_HZ")
        && let Ok(hz) = v.parse::<u32>()
    {
        cfg.sample_rate_hz = hz;
    }
    if let Ok(v) = std::env::var("NORD_WS_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.ws_port = port;
    }
}

/// Save the config to disk, creating the parent directory if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))
}
