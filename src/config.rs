//! Where the stack gets deployed and where files are read and written.
//!
//! Values are layered: the optional `site_stack.toml`, then environment
//! variables, then whatever the caller overrides (usually cli flags).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "site_stack.toml";
pub const DEFAULT_STACK_NAME: &str = "StaticSiteStack";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_ASSET_DIR: &str = "../dist";
pub const DEFAULT_OUT_DIR: &str = "site.out";

pub const ACCOUNT_ENV_VARS: &[&str] = &["SITE_STACK_ACCOUNT", "CDK_DEFAULT_ACCOUNT"];
pub const REGION_ENV_VARS: &[&str] = &["SITE_STACK_REGION", "CDK_DEFAULT_REGION", "AWS_REGION"];

/// the toml file as written, every key optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub stack_name: Option<String>,
    pub account: Option<String>,
    pub region: Option<String>,
    pub asset_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
}

/// values that win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub stack_name: Option<String>,
    pub account: Option<String>,
    pub region: Option<String>,
    pub asset_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
}

impl Overrides {
    /// anchors a relative `asset_dir` at `dir`. Paths typed on the command
    /// line mean the directory the command runs in, not the config file's.
    pub fn relative_to(mut self, dir: &Path) -> Self {
        if let Some(asset_dir) = self.asset_dir.take() {
            self.asset_dir = Some(if asset_dir.is_absolute() {
                asset_dir
            } else {
                dir.join(asset_dir)
            });
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub stack_name: String,
    pub account: Option<String>,
    pub region: String,
    /// relative paths resolve against `base_dir`
    pub asset_dir: PathBuf,
    pub out_dir: PathBuf,
    /// the directory the stack is defined in: the config file's directory
    /// if one was loaded, otherwise the current directory
    pub base_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            account: None,
            region: DEFAULT_REGION.to_string(),
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            base_dir: PathBuf::from("."),
        }
    }
}

impl SiteConfig {
    /// reads `path`, or `site_stack.toml` in the current directory if it
    /// exists. An explicitly given file that is missing is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            debug!("no {} found, using defaults", DEFAULT_CONFIG_FILE);
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                config.base_dir = parent.to_path_buf();
            }
        }
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let file: FileConfig = toml::from_str(contents)?;
        let mut config = Self::default();
        if let Some(stack_name) = file.stack_name {
            config.stack_name = stack_name;
        }
        if file.account.is_some() {
            config.account = file.account;
        }
        if let Some(region) = file.region {
            config.region = region;
        }
        if let Some(asset_dir) = file.asset_dir {
            config.asset_dir = asset_dir;
        }
        if let Some(out_dir) = file.out_dir {
            config.out_dir = out_dir;
        }
        Ok(config)
    }

    /// `lookup` is usually `|k| std::env::var(k).ok()`. The first variable
    /// that is set and non empty wins.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|&name| lookup(name))
                .find(|value| !value.is_empty())
        };
        if let Some(account) = first(ACCOUNT_ENV_VARS) {
            self.account = Some(account);
        }
        if let Some(region) = first(REGION_ENV_VARS) {
            self.region = region;
        }
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(stack_name) = overrides.stack_name {
            self.stack_name = stack_name;
        }
        if overrides.account.is_some() {
            self.account = overrides.account;
        }
        if let Some(region) = overrides.region {
            self.region = region;
        }
        if let Some(asset_dir) = overrides.asset_dir {
            self.asset_dir = asset_dir;
        }
        if let Some(out_dir) = overrides.out_dir {
            self.out_dir = out_dir;
        }
    }
}
