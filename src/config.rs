/**
 * Tagger configuration
 *
 * Settings come from three layers, later layers replacing earlier ones:
 * 1. Built-in defaults
 * 2. Optional TOML file
 * 3. Command-line overrides
 *
 * Make, model, serial number and timezone are per-camera tables keyed by the
 * camera ID the data logger assigns; key `0` covers every camera without its
 * own entry.
 */

use chrono_tz::Tz;
use log::debug;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::csv_parser::EmptyFramePolicy;
use crate::modes::FileSource;
use crate::naming::{FilenameGenerator, PatternError, DEFAULT_FILENAME_PATTERN};
use crate::timestamp::{parse_timezone, CameraTimezone, TimestampFormat};

/// Camera ID whose entries apply to cameras not listed explicitly
pub const FALLBACK_CAMERA_ID: i64 = 0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),

    #[error("invalid camera ID `{key}` in [{table}]")]
    CameraId { table: &'static str, key: String },

    #[error("unknown timezone `{0}`: expected an IANA name such as Europe/Moscow or UTC")]
    Timezone(String),

    #[error("invalid filename pattern")]
    Pattern(#[from] PatternError),
}

/// On-disk layout of the config file
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FileConfig {
    copyright: Option<String>,
    exiftool_binary: Option<String>,
    filename_pattern: Option<String>,
    file_source: Option<FileSource>,
    geotag: Option<PathBuf>,
    set_digitized: Option<bool>,
    timestamp_format: Option<TimestampFormat>,
    empty_frame_policy: Option<EmptyFramePolicy>,
    make: Option<BTreeMap<String, String>>,
    model: Option<BTreeMap<String, String>>,
    serial_number: Option<BTreeMap<String, String>>,
    timezone: Option<BTreeMap<String, String>>,
}

/// Values given on the command line; `None` keeps the lower layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub copyright: Option<String>,
    pub exiftool_binary: Option<String>,
    pub filename_pattern: Option<String>,
    pub file_source: Option<FileSource>,
    pub geotag: Option<PathBuf>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub set_digitized: Option<bool>,
    pub timestamp_format: Option<TimestampFormat>,
    pub timezone: Option<String>,
    pub empty_frame_policy: Option<EmptyFramePolicy>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub copyright: Option<String>,
    pub exiftool_binary: String,
    pub filename_pattern: String,
    pub file_source: Option<FileSource>,
    /// GPS track log handed to exiftool's geotagger
    pub geotag: Option<PathBuf>,
    /// Copy CreateDate into DateTimeDigitized
    pub set_digitized: bool,
    pub timestamp_format: TimestampFormat,
    pub empty_frame_policy: EmptyFramePolicy,
    make: BTreeMap<i64, String>,
    model: BTreeMap<i64, String>,
    serial_number: BTreeMap<i64, String>,
    timezone: BTreeMap<i64, Tz>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            copyright: None,
            exiftool_binary: "exiftool".to_string(),
            filename_pattern: DEFAULT_FILENAME_PATTERN.to_string(),
            file_source: None,
            geotag: None,
            set_digitized: false,
            timestamp_format: TimestampFormat::default(),
            empty_frame_policy: EmptyFramePolicy::default(),
            make: BTreeMap::new(),
            model: BTreeMap::new(),
            serial_number: BTreeMap::new(),
            timezone: BTreeMap::from([(FALLBACK_CAMERA_ID, Tz::UTC)]),
        }
    }
}

impl Config {
    /// Defaults, then `path` if given, then `overrides`
    pub fn load(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides)?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if file.copyright.is_some() {
            config.copyright = file.copyright;
        }
        if let Some(binary) = file.exiftool_binary {
            config.exiftool_binary = binary;
        }
        if let Some(pattern) = file.filename_pattern {
            config.filename_pattern = pattern;
        }
        if file.file_source.is_some() {
            config.file_source = file.file_source;
        }
        if file.geotag.is_some() {
            config.geotag = file.geotag;
        }
        if let Some(flag) = file.set_digitized {
            config.set_digitized = flag;
        }
        if let Some(format) = file.timestamp_format {
            config.timestamp_format = format;
        }
        if let Some(policy) = file.empty_frame_policy {
            config.empty_frame_policy = policy;
        }

        if let Some(table) = file.make {
            config.make = camera_table("make", table)?;
        }
        if let Some(table) = file.model {
            config.model = camera_table("model", table)?;
        }
        if let Some(table) = file.serial_number {
            config.serial_number = camera_table("serial-number", table)?;
        }
        if let Some(table) = file.timezone {
            config.timezone = camera_table("timezone", table)?
                .into_iter()
                .map(|(id, name)| Ok((id, timezone(&name)?)))
                .collect::<Result<_, ConfigError>>()?;
        }

        // surface pattern mistakes at load time rather than per frame
        FilenameGenerator::new(&config.filename_pattern)?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        if overrides.copyright.is_some() {
            self.copyright = overrides.copyright;
        }
        if let Some(binary) = overrides.exiftool_binary {
            self.exiftool_binary = binary;
        }
        if let Some(pattern) = overrides.filename_pattern {
            FilenameGenerator::new(&pattern)?;
            self.filename_pattern = pattern;
        }
        if overrides.file_source.is_some() {
            self.file_source = overrides.file_source;
        }
        if overrides.geotag.is_some() {
            self.geotag = overrides.geotag;
        }
        if let Some(flag) = overrides.set_digitized {
            self.set_digitized = flag;
        }
        if let Some(format) = overrides.timestamp_format {
            self.timestamp_format = format;
        }
        if let Some(policy) = overrides.empty_frame_policy {
            self.empty_frame_policy = policy;
        }

        // a single value on the command line stands for every camera
        if let Some(make) = overrides.make {
            self.make = BTreeMap::from([(FALLBACK_CAMERA_ID, make)]);
        }
        if let Some(model) = overrides.model {
            self.model = BTreeMap::from([(FALLBACK_CAMERA_ID, model)]);
        }
        if let Some(serial) = overrides.serial_number {
            self.serial_number = BTreeMap::from([(FALLBACK_CAMERA_ID, serial)]);
        }
        if let Some(tz) = overrides.timezone {
            self.timezone = BTreeMap::from([(FALLBACK_CAMERA_ID, timezone(&tz)?)]);
        }

        Ok(())
    }

    pub fn make_for(&self, camera_id: i64) -> Option<&str> {
        lookup(&self.make, camera_id).map(String::as_str)
    }

    pub fn model_for(&self, camera_id: i64) -> Option<&str> {
        lookup(&self.model, camera_id).map(String::as_str)
    }

    pub fn serial_number_for(&self, camera_id: i64) -> Option<&str> {
        lookup(&self.serial_number, camera_id).map(String::as_str)
    }

    pub fn filename_generator(&self) -> Result<FilenameGenerator, ConfigError> {
        Ok(FilenameGenerator::new(&self.filename_pattern)?)
    }
}

impl CameraTimezone for Config {
    type Tz = Tz;

    fn timezone_for(&self, camera_id: i64) -> Tz {
        lookup(&self.timezone, camera_id).copied().unwrap_or(Tz::UTC)
    }
}

/// Entry for `camera_id`, else the fallback entry
fn lookup<V>(table: &BTreeMap<i64, V>, camera_id: i64) -> Option<&V> {
    table.get(&camera_id).or_else(|| table.get(&FALLBACK_CAMERA_ID))
}

fn camera_table(table: &'static str, raw: BTreeMap<String, String>) -> Result<BTreeMap<i64, String>, ConfigError> {
    raw.into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| {
            let id = key
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::CameraId { table, key: key.clone() })?;
            Ok((id, value))
        })
        .collect()
}

fn timezone(name: &str) -> Result<Tz, ConfigError> {
    parse_timezone(name).ok_or_else(|| ConfigError::Timezone(name.to_string()))
}
