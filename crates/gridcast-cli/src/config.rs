// Configuration loading and validation (pipeline.toml).

use std::path::{Path, PathBuf};

use gridcast_core::names::NameRules;
use gridcast_core::schema::{Schema, Thresholds};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no pipeline config at {config} and no default at {default}")]
    Missing { config: PathBuf, default: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to install default config at {path}: {source}")]
    Install {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid `{field}`: {message}")]
    Invalid { field: String, message: String },
}

// ---------------------------------------------------------------------------
// pipeline.toml structs
// ---------------------------------------------------------------------------

/// Name of the config file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "pipeline.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub seasons: SeasonsConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub filters: Thresholds,
    #[serde(default)]
    pub datasets: DatasetsConfig,
    #[serde(default)]
    pub names: NameRules,
    #[serde(default)]
    pub schema: Schema,
}

/// Inclusive range of source seasons.
#[derive(Debug, Clone, Deserialize)]
pub struct SeasonsConfig {
    pub start: i32,
    pub end: i32,
}

/// Input and output locations. Relative paths resolve against the base
/// directory the config was loaded from.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    #[serde(default)]
    pub raw_format: RawFormat,
    pub output_dir: PathBuf,
    /// Two-column `Tm,Team` mapping file.
    pub team_codes: PathBuf,
    /// Draft-rankings export; no roster projection without it.
    #[serde(default)]
    pub roster: Option<PathBuf>,
}

/// Layout of the season sheets under `raw_dir`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawFormat {
    /// `{raw_dir}/{dataset}/{year}.csv`
    #[default]
    Csv,
    /// `{raw_dir}/{dataset}.xlsx`, one sheet named after each season.
    Xlsx,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetsConfig {
    pub lookback_depths: Vec<usize>,
    pub roster_lookback: usize,
    /// Defaults to the season after `seasons.end`.
    pub roster_season: Option<i32>,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        DatasetsConfig {
            lookback_depths: vec![4, 3, 2],
            roster_lookback: 2,
            roster_season: None,
        }
    }
}

impl Config {
    /// Number of seasons between `start` and `end` inclusive.
    pub fn season_span(&self) -> i64 {
        i64::from(self.seasons.end) - i64::from(self.seasons.start) + 1
    }

    pub fn roster_season(&self) -> i32 {
        self.datasets
            .roster_season
            .unwrap_or(self.seasons.end + 1)
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

pub fn config_path(base_dir: &Path) -> PathBuf {
    base_dir.join("config").join(CONFIG_FILE)
}

pub fn default_config_path(base_dir: &Path) -> PathBuf {
    base_dir.join("defaults").join(CONFIG_FILE)
}

/// Load and validate `config/pipeline.toml` relative to `base_dir`.
///
/// Does not install the default; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(base_dir);
    let text = std::fs::read_to_string(&path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ConfigError::Missing {
            config: path.clone(),
            default: default_config_path(base_dir),
        },
        _ => ConfigError::Read {
            path: path.clone(),
            source,
        },
    })?;
    let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Copy `defaults/pipeline.toml` to `config/pipeline.toml` on first run.
/// Returns true when the default was installed; an existing config is
/// left alone.
pub fn install_default_config(base_dir: &Path) -> Result<bool, ConfigError> {
    let target = config_path(base_dir);
    if target.exists() {
        return Ok(false);
    }
    let default = default_config_path(base_dir);
    if !default.exists() {
        return Err(ConfigError::Missing {
            config: target,
            default,
        });
    }

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Install {
            path: target.clone(),
            source,
        })?;
    }
    std::fs::copy(&default, &target).map_err(|source| ConfigError::Install {
        path: target.clone(),
        source,
    })?;
    info!("Installed default config at {}", target.display());
    Ok(true)
}

/// Install the default config if needed, then load it.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    install_default_config(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let (start, end) = (config.seasons.start, config.seasons.end);
    if start > end {
        return Err(invalid(
            "seasons.start",
            format!("must not be after seasons.end ({start} > {end})"),
        ));
    }

    let span = config.season_span();
    let datasets = &config.datasets;
    if datasets.lookback_depths.is_empty() {
        return Err(invalid("datasets.lookback_depths", "must not be empty"));
    }
    for &depth in &datasets.lookback_depths {
        if depth == 0 || depth as i64 >= span {
            return Err(invalid(
                "datasets.lookback_depths",
                format!("each depth must be between 1 and {}, got {depth}", span - 1),
            ));
        }
    }
    if datasets.roster_lookback == 0 || datasets.roster_lookback as i64 > span {
        return Err(invalid(
            "datasets.roster_lookback",
            format!("must be between 1 and {span}, got {}", datasets.roster_lookback),
        ));
    }

    let filters = &config.filters;
    if filters.min_games <= 0.0 {
        return Err(invalid(
            "filters.min_games",
            format!("must be > 0, got {}", filters.min_games),
        ));
    }
    if filters.min_scoring < 0.0 {
        return Err(invalid(
            "filters.min_scoring",
            format!("must be >= 0, got {}", filters.min_scoring),
        ));
    }

    let schema = &config.schema;
    if schema.target_columns.is_empty() {
        return Err(invalid("schema.target_columns", "must not be empty"));
    }
    for column in &schema.target_columns {
        if !schema.scoring_columns.contains(column) {
            return Err(invalid(
                "schema.target_columns",
                format!("`{column}` is not one of schema.scoring_columns"),
            ));
        }
    }
    if schema.target_name.trim().is_empty() {
        return Err(invalid("schema.target_name", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
