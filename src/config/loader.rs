use super::model::Config;
use super::schema::ValidationReport;
use crate::error::{ApidError, ErrorCode};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format '{0}', expected .yaml, .yml or .json")]
    UnsupportedFormat(String),

    #[error("transaction '{0}' not found")]
    TransactionNotFound(String),

    #[error(transparent)]
    Invalid(#[from] ValidationReport),
}

impl From<ConfigError> for ApidError {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::Invalid(report) => return report.into(),
            ConfigError::Read { .. } => ErrorCode::CONFIG_NOT_FOUND,
            ConfigError::Yaml(_) => ErrorCode::CONFIG_INVALID_YAML,
            ConfigError::Json(_) => ErrorCode::CONFIG_INVALID_JSON,
            ConfigError::UnsupportedFormat(_) => ErrorCode::CONFIG_UNSUPPORTED_FORMAT,
            ConfigError::TransactionNotFound(_) => ErrorCode::CONFIG_TRANSACTION_NOT_FOUND,
        };
        ApidError::config_with_code(code, err.to_string()).with_source(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from the file extension; no extension means YAML
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            None => Ok(Format::Yaml),
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(Format::Yaml)
            }
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }
}

/// Parse a document without validating it
pub fn parse_config(content: &str, format: Format) -> Result<Config, ConfigError> {
    let config = match format {
        Format::Yaml => serde_yaml::from_str(content)?,
        Format::Json => serde_json::from_str(content)?,
    };
    Ok(config)
}

/// Read and parse a document without validating it
pub async fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Loaded {} bytes from {}", content.len(), path.display());
    parse_config(&content, format)
}

/// Read, parse and validate a document
///
/// The returned document carries the defaults applied by validation.
pub async fn load_and_validate(path: &Path) -> Result<Config, ConfigError> {
    let mut config = load_config(path).await?;
    config.validate()?;
    debug!(
        "Validated {} with {} transaction(s)",
        path.display(),
        config.transactions().len()
    );
    Ok(config)
}
