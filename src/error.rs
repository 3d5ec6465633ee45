//! Errors raised while declaring or synthesizing a stack.

use std::path::PathBuf;

use thiserror::Error;

/// Failures loading the site configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to read the current directory: {0}")]
    WorkingDir(#[source] std::io::Error),
}

/// Everything that can go wrong between declaring resources and writing
/// the synthesized output.
#[derive(Debug, Error)]
pub enum SynthError {
    /// The deployment source directory is missing. This is the one failure
    /// that depends on the local machine rather than on the declarations.
    #[error("Asset directory '{}' does not exist. Build the site before synthesizing", path.display())]
    AssetNotFound { path: PathBuf },

    #[error("Asset path '{}' is not a directory", path.display())]
    AssetNotDirectory { path: PathBuf },

    #[error("Failed to read asset '{}': {source}", path.display())]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid stack name {name:?}\n{reason}")]
    InvalidStackName { name: String, reason: &'static str },

    #[error("Invalid construct id {id:?}\n{reason}")]
    InvalidConstructId { id: String, reason: &'static str },

    #[error("Invalid resource name {id:?}\n{reason}")]
    InvalidLogicalId { id: String, reason: &'static str },

    #[error("Resource name {0:?} is declared more than once in this stack")]
    DuplicateLogicalId(String),

    #[error("Invalid region code {0:?}")]
    InvalidRegion(String),

    #[error("Invalid account id {0:?}\nMust be exactly 12 digits")]
    InvalidAccount(String),

    /// A resource refers to a logical id that this stack never declared.
    #[error("Resource '{from}' references '{to}', which is not declared in this stack")]
    UnknownReference { from: String, to: String },

    #[error("Validation failed on resource '{resource}'\n{message}")]
    Validation { resource: String, message: String },

    #[error("Failed to serialize synthesized output: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SynthError {
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn asset_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::AssetIo {
            path: path.into(),
            source,
        }
    }
}
