use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Cannot access '{}': {source}", .path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    SpecError(#[from] iotlab_core::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Different files share the name '{0}'")]
    FileConflict(String),
    #[error("Cannot find file '{0}' referenced by the experiment")]
    MissingFile(String),
    #[error("Error: {0}")]
    GenericError(String),
}

impl From<toml::de::Error> for ClientError {
    fn from(error: toml::de::Error) -> Self {
        Self::ConfigError(error.to_string())
    }
}
