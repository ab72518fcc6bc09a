use std::path::Path;

use tracing::debug;

use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    fn for_path(path: &Path) -> AppResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
                ext: ext.to_owned(),
            })),
            None => Err(AppError::config(ConfigError::MissingExtension)),
        }
    }

    fn parse(self, path: &Path, content: &str) -> AppResult<ConfigFile> {
        let parsed = match self {
            ConfigFormat::Toml => toml::from_str(content).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            }),
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|source| ConfigError::ParseJson {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(parsed?)
    }
}

/// Picked up from the working directory, in order, when `--config` is absent.
const DEFAULT_CONFIG_FILES: [(&str, ConfigFormat); 2] = [
    ("wirebench.toml", ConfigFormat::Toml),
    ("wirebench.json", ConfigFormat::Json),
];

/// Loads `--config <path>`, or else the first default config file present.
///
/// # Errors
///
/// Returns an error when the file cannot be read, has an unknown extension,
/// or does not parse.
pub fn load_config(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    if let Some(path) = path {
        let path = Path::new(path);
        return read_config(path, ConfigFormat::for_path(path)?).map(Some);
    }

    let Some((name, format)) = DEFAULT_CONFIG_FILES
        .into_iter()
        .find(|(name, _)| Path::new(name).exists())
    else {
        return Ok(None);
    };
    debug!("Using config file {}", name);
    read_config(Path::new(name), format).map(Some)
}

/// Whether a default config file exists in the working directory.
#[must_use]
pub fn has_default_config() -> bool {
    DEFAULT_CONFIG_FILES
        .iter()
        .any(|(name, _)| Path::new(name).exists())
}

#[cfg(test)]
pub(crate) fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    read_config(path, ConfigFormat::for_path(path)?)
}

fn read_config(path: &Path, format: ConfigFormat) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    format.parse(path, &content)
}
