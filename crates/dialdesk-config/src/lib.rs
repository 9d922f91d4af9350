use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dialdesk_core::domain::{
    PhoneMatchRule, DEFAULT_CDR_TABLE, DEFAULT_IMPORT_CHUNK_SIZE, DEFAULT_IMPORT_DAYS,
    DEFAULT_IMPORT_LIMIT,
};
use dialdesk_core::validation::is_plain_identifier;
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "dialdesk";
const CONFIG_FILENAME: &str = "config.toml";


#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub import: ImportConfig,
    pub source: SourceConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub limit: usize,
    pub days: i64,
    pub chunk_size: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_IMPORT_LIMIT,
            days: DEFAULT_IMPORT_DAYS,
            chunk_size: DEFAULT_IMPORT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub path: Option<PathBuf>,
    pub table: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            table: DEFAULT_CDR_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchingConfig {
    pub country_code: Option<String>,
}

impl MatchingConfig {
    pub fn phone_rule(&self) -> PhoneMatchRule {
        match self.country_code.as_deref() {
            Some(code) => PhoneMatchRule::with_country_code(code),
            None => PhoneMatchRule::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid import.limit value: {0}")]
    InvalidLimit(i64),
    #[error("invalid import.days value: {0}")]
    InvalidDays(i64),
    #[error("invalid import.chunk_size value: {0}")]
    InvalidChunkSize(i64),
    #[error("invalid source.table value: {0}")]
    InvalidSourceTable(String),
    #[error("invalid source.path value")]
    InvalidSourcePath,
    #[error("invalid matching.country_code value: {0}")]
    InvalidCountryCode(String),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    import: Option<ImportFile>,
    source: Option<SourceFile>,
    matching: Option<MatchingFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportFile {
    limit: Option<i64>,
    days: Option<i64>,
    chunk_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceFile {
    path: Option<PathBuf>,
    table: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct MatchingFile {
    country_code: Option<String>,
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(merge_config(parsed)?))
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(import) = parsed.import {
        if let Some(limit) = import.limit {
            config.import.limit = positive_usize(limit).ok_or(ConfigError::InvalidLimit(limit))?;
        }
        if let Some(days) = import.days {
            if days < 0 {
                return Err(ConfigError::InvalidDays(days));
            }
            config.import.days = days;
        }
        if let Some(chunk_size) = import.chunk_size {
            config.import.chunk_size =
                positive_usize(chunk_size).ok_or(ConfigError::InvalidChunkSize(chunk_size))?;
        }
    }

    if let Some(source) = parsed.source {
        if let Some(path) = source.path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidSourcePath);
            }
            config.source.path = Some(path);
        }
        if let Some(table) = source.table {
            let table = table.trim().to_string();
            if !is_plain_identifier(&table) {
                return Err(ConfigError::InvalidSourceTable(table));
            }
            config.source.table = table;
        }
    }

    if let Some(matching) = parsed.matching {
        if let Some(code) = matching.country_code {
            let trimmed = code.trim().trim_start_matches('+');
            if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
                return Err(ConfigError::InvalidCountryCode(code));
            }
            config.matching.country_code = Some(trimmed.to_string());
        }
    }

    Ok(config)
}

fn positive_usize(value: i64) -> Option<usize> {
    if value <= 0 {
        return None;
    }
    usize::try_from(value).ok()
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
