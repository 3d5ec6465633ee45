//! Staging of local asset directories.
//!
//! Each file gets a checksum and the directory gets a hash over all of them,
//! so whoever reads the manifest can tell which files changed between two
//! synthesized versions. The upload itself always sends everything.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SynthError;
use crate::naming::adler32_hex;

pub const MANIFEST_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFile {
    /// relative to the asset directory, `/` separated
    pub path: String,
    pub checksum: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedAsset {
    /// the path as it was declared, ie: `../dist`
    pub source: String,
    /// where the directory was found when the stack was synthesized
    pub path: PathBuf,
    pub hash: String,
    pub files: Vec<AssetFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    pub destination_bucket: String,
    /// name of the stack output holding the physical bucket name
    pub bucket_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_key_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    /// name of the stack output holding the distribution id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_output: Option<String>,
    pub invalidation_paths: Vec<String>,
    pub prune: bool,
    pub sources: Vec<StagedAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    pub version: String,
    pub stack_name: String,
    pub region: String,
    /// keyed by the logical id of the deployment
    pub deployments: BTreeMap<String, DeploymentManifest>,
}

impl AssetManifest {
    pub fn new(stack_name: &str, region: &str) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            stack_name: stack_name.to_string(),
            region: region.to_string(),
            deployments: BTreeMap::new(),
        }
    }
}

/// visits every file under `start_dir`, in file name order so the result
/// does not depend on the order the filesystem returns entries.
fn iter_files_recursively(
    start_dir: &Path,
    callback: &mut impl FnMut(PathBuf) -> Result<(), SynthError>,
) -> Result<(), SynthError> {
    let readdir = std::fs::read_dir(start_dir).map_err(|e| SynthError::asset_io(start_dir, e))?;
    let mut entries = vec![];
    for entry in readdir {
        let entry = entry.map_err(|e| SynthError::asset_io(start_dir, e))?;
        entries.push(entry.path());
    }
    entries.sort();
    for path in entries {
        // follows symlinks, unlike DirEntry::file_type
        let meta = std::fs::metadata(&path).map_err(|e| SynthError::asset_io(&path, e))?;
        if meta.is_dir() {
            iter_files_recursively(&path, callback)?;
        } else {
            callback(path)?;
        }
    }
    Ok(())
}

fn relative_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// resolves `source` against `base_dir` and fingerprints its contents.
/// Fails fast when the directory is missing, this is the one input the
/// stack needs from the local machine.
pub fn stage_directory(base_dir: &Path, source: &Path) -> Result<StagedAsset, SynthError> {
    let resolved = if source.is_absolute() {
        source.to_path_buf()
    } else {
        base_dir.join(source)
    };
    let meta = match std::fs::metadata(&resolved) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SynthError::AssetNotFound { path: resolved });
        }
        Err(e) => return Err(SynthError::asset_io(&resolved, e)),
    };
    if !meta.is_dir() {
        return Err(SynthError::AssetNotDirectory { path: resolved });
    }
    let root = std::fs::canonicalize(&resolved).map_err(|e| SynthError::asset_io(&resolved, e))?;

    let mut files = vec![];
    iter_files_recursively(&root, &mut |path| {
        let contents = std::fs::read(&path).map_err(|e| SynthError::asset_io(&path, e))?;
        let file = AssetFile {
            path: relative_key(&root, &path),
            checksum: adler32_hex(&contents),
            size: contents.len() as u64,
        };
        debug!(file = %file.path, checksum = %file.checksum, "staged asset file");
        files.push(file);
        Ok(())
    })?;

    let mut fingerprint = String::new();
    for file in &files {
        fingerprint.push_str(&format!("{}\0{}\n", file.path, file.checksum));
    }
    let hash = adler32_hex(fingerprint.as_bytes());
    info!(source = %source.display(), files = files.len(), hash = %hash, "staged asset directory");

    Ok(StagedAsset {
        source: source.display().to_string(),
        path: root,
        hash,
        files,
    })
}
