//! Resolving specification paths to files and parsing them

use bddap_utils::error::SpecError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::model::Specification;
use crate::parser::parse_str;

/// Extension of specification files
pub const FEATURE_EXTENSION: &str = "feature";

/// Where specifications come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecSource {
    /// A single `.feature` file
    File(PathBuf),
    /// Every `.feature` file directly inside a directory
    Directory(PathBuf),
    /// An explicit list of files, used as given
    List(Vec<PathBuf>),
}

impl SpecSource {
    /// Classify a single path: a `.feature` file is parsed directly,
    /// anything else is treated as a directory.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if has_feature_extension(&path) {
            Self::File(path)
        } else {
            Self::Directory(path)
        }
    }

    /// Explicit list of files, used as given whatever their extension.
    #[must_use]
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self::List(paths)
    }

    /// Expand into the ordered list of files to parse.
    ///
    /// Directory children are sorted by file name.
    ///
    /// # Errors
    ///
    /// `SpecError::FileNotFound` when a directory does not exist,
    /// `SpecError::Read` when it cannot be listed.
    pub fn resolve(&self) -> Result<Vec<PathBuf>, SpecError> {
        match self {
            Self::File(path) => Ok(vec![path.clone()]),
            Self::List(paths) => Ok(paths.clone()),
            Self::Directory(dir) => {
                let entries = fs::read_dir(dir).map_err(|e| io_to_spec_error(dir, &e))?;
                let mut files = Vec::new();
                for entry in entries {
                    let entry = entry.map_err(|e| io_to_spec_error(dir, &e))?;
                    let path = entry.path();
                    if path.is_file() && has_feature_extension(&path) {
                        files.push(path);
                    }
                }
                files.sort();
                debug!(dir = %dir.display(), files = files.len(), "Resolved specification directory");
                Ok(files)
            }
        }
    }

    /// Parse every resolved file, one result per file, continuing past
    /// failures.
    ///
    /// # Errors
    ///
    /// Fails as a whole only when the source itself cannot be resolved.
    pub fn parse_each(&self) -> Result<Vec<(PathBuf, Result<Specification, SpecError>)>, SpecError> {
        let files = self.resolve()?;
        Ok(files
            .into_iter()
            .map(|path| {
                let parsed = parse_file(&path);
                (path, parsed)
            })
            .collect())
    }

    /// Parse every resolved file, one specification per file, in order.
    ///
    /// A directory with no `.feature` files yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns the first file's error; sibling files are still read.
    pub fn parse_all(&self) -> Result<Vec<Specification>, SpecError> {
        let specs = self
            .parse_each()?
            .into_iter()
            .map(|(_, parsed)| parsed)
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            specifications = specs.len(),
            features = specs.iter().map(|s| s.features.len()).sum::<usize>(),
            "Parsed specifications"
        );
        Ok(specs)
    }
}

/// Parse one specification file.
///
/// # Errors
///
/// `SpecError::FileNotFound` for a missing path, `SpecError::Read` for any
/// other read failure.
pub fn parse_file(path: &Path) -> Result<Specification, SpecError> {
    let text = fs::read_to_string(path).map_err(|e| io_to_spec_error(path, &e))?;
    let spec = parse_str(&text);
    debug!(path = %path.display(), features = spec.features.len(), "Parsed specification file");
    Ok(spec)
}

/// Parse a file or directory path.
///
/// # Errors
///
/// See [`SpecSource::parse_all`].
pub fn parse_all(path: impl Into<PathBuf>) -> Result<Vec<Specification>, SpecError> {
    SpecSource::from_path(path).parse_all()
}

fn has_feature_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FEATURE_EXTENSION)
}

fn io_to_spec_error(path: &Path, err: &std::io::Error) -> SpecError {
    let path = path.display().to_string();
    match err.kind() {
        ErrorKind::NotFound => SpecError::FileNotFound { path },
        _ => SpecError::Read {
            path,
            reason: err.to_string(),
        },
    }
}
