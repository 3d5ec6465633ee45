use std::path::PathBuf;

use super::{Bucket, Distribution, Handle};

/// invalidates every cached path
pub const INVALIDATE_ALL: &str = "/*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// a local directory, relative to where the stack is defined.
    Asset(PathBuf),
}

impl Source {
    pub fn asset(path: impl Into<PathBuf>) -> Self {
        Source::Asset(path.into())
    }
}

/// Uploads local files into a bucket after the stack is deployed, then
/// invalidates the distribution cache.
///
/// Every deploy uploads the sources again and invalidates the distribution
/// paths, whether or not any file changed.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketDeployment {
    pub sources: Vec<Source>,
    pub destination_bucket: Handle<Bucket>,
    pub destination_key_prefix: Option<String>,
    pub distribution: Option<Handle<Distribution>>,
    /// paths to invalidate after the upload. Left empty with a distribution
    /// set, we invalidate [`INVALIDATE_ALL`].
    pub distribution_paths: Vec<String>,
    /// remove objects from the bucket that are not in the sources.
    pub prune: bool,
}

impl BucketDeployment {
    pub fn new(sources: Vec<Source>, destination_bucket: Handle<Bucket>) -> Self {
        Self {
            sources,
            destination_bucket,
            destination_key_prefix: None,
            distribution: None,
            distribution_paths: vec![],
            prune: true,
        }
    }

    pub fn invalidation_paths(&self) -> Vec<String> {
        match (&self.distribution, self.distribution_paths.is_empty()) {
            (None, _) => vec![],
            (Some(_), true) => vec![INVALIDATE_ALL.to_string()],
            (Some(_), false) => self.distribution_paths.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sources.is_empty() {
            return Err("A bucket deployment needs at least one source".to_string());
        }
        if self.distribution.is_none() && !self.distribution_paths.is_empty() {
            return Err("Distribution paths were given without a distribution to invalidate".to_string());
        }
        for path in &self.distribution_paths {
            if !path.starts_with('/') {
                return Err(format!("Distribution path {path:?} must start with '/'"));
            }
        }
        if let Some(prefix) = &self.destination_key_prefix {
            if prefix.starts_with('/') {
                return Err(format!("Destination key prefix {prefix:?} must not start with '/'"));
            }
        }
        Ok(())
    }
}
