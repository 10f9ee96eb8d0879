// HttpSleuth - platform/config.rs
//
// Platform config directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for HttpSleuth configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/httpsleuth/ or %APPDATA%\HttpSleuth\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[parsing]` section.
    pub parsing: ParsingSection,
    /// `[output]` section.
    pub output: OutputSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[parsing]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ParsingSection {
    /// Lines sampled for grammar detection.
    pub detection_lines: Option<usize>,
    /// Line cap for a single open block.
    pub max_block_lines: Option<usize>,
}

/// `[output]` config section. CLI flags can only switch these on.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub request_body: Option<bool>,
    pub response_body: Option<bool>,
    pub json: Option<bool>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    // -- Parsing --
    pub detection_lines: usize,
    pub max_block_lines: usize,

    // -- Output --
    pub request_body: bool,
    pub response_body: bool,
    pub json: bool,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            detection_lines: constants::DEFAULT_DETECTION_LINES,
            max_block_lines: constants::DEFAULT_MAX_BLOCK_LINES,
            request_body: false,
            response_body: false,
            json: false,
            log_level: None,
            log_file: None,
        }
    }
}

/// Read and deserialise a config file.
fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Take `value` when it lies in `range`, otherwise record a warning.
fn in_range(
    field: &str,
    value: Option<usize>,
    range: std::ops::RangeInclusive<usize>,
    default: usize,
    warnings: &mut Vec<String>,
) -> usize {
    match value {
        Some(v) if range.contains(&v) => v,
        Some(v) => {
            let err = ConfigError::ValueOutOfRange {
                field: field.to_string(),
                value: v.to_string(),
                expected: format!("{}-{}", range.start(), range.end()),
            };
            warnings.push(format!("{err}. Using default ({default})."));
            default
        }
        None => default,
    }
}

/// Load and validate a config file.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// warnings. A missing file yields defaults with no warnings; an unreadable
/// or unparseable file yields defaults with one warning.
///
/// Runs before logging is initialised, so problems are reported through
/// the returned warnings rather than tracing.
pub fn load_config(path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !path.exists() {
        return (AppConfig::default(), warnings);
    }

    let raw = match read_raw(path) {
        Ok(raw) => raw,
        Err(e) => {
            warnings.push(format!("{e}. Using defaults."));
            return (AppConfig::default(), warnings);
        }
    };

    let mut config = AppConfig {
        detection_lines: in_range(
            "[parsing] detection_lines",
            raw.parsing.detection_lines,
            constants::MIN_DETECTION_LINES..=constants::MAX_DETECTION_LINES,
            constants::DEFAULT_DETECTION_LINES,
            &mut warnings,
        ),
        max_block_lines: in_range(
            "[parsing] max_block_lines",
            raw.parsing.max_block_lines,
            constants::MIN_MAX_BLOCK_LINES..=constants::ABSOLUTE_MAX_BLOCK_LINES,
            constants::DEFAULT_MAX_BLOCK_LINES,
            &mut warnings,
        ),
        request_body: raw.output.request_body.unwrap_or(false),
        response_body: raw.output.response_body.unwrap_or(false),
        json: raw.output.json.unwrap_or(false),
        ..AppConfig::default()
    };

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    // -- Logging: file --
    if let Some(ref file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file.clone());
        }
    }

    (config, warnings)
}
