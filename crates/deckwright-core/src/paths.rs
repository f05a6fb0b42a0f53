//! Resolves document paths and confines them to allow-listed directories.
//!
//! Paths are canonicalised first, so symlinks and `..` segments cannot smuggle
//! a document out of its sandbox. An empty allow-list disables the
//! containment check entirely; callers opt into that explicitly by
//! constructing [`PathValidator::unrestricted`].

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::debug;

const PATHS_TARGET: &str = "deckwright::paths";

/// Errors raised while resolving a document path.
#[derive(Debug, Error)]
pub enum PathError {
    /// The canonical path escapes every allow-listed base directory.
    #[error("path {path} resolves outside the allowed directories ({allowed})")]
    Traversal {
        /// Canonical path that was rejected.
        path: PathBuf,
        /// Allowed base directories, rendered for display.
        allowed: AllowedDirs,
    },

    /// The document does not exist.
    #[error("document {path} does not exist")]
    NotFound {
        /// Requested path.
        path: PathBuf,
    },

    /// The path names a directory or has no usable file name.
    #[error("path {path} does not name a document file")]
    NotAFile {
        /// Requested path.
        path: PathBuf,
    },

    /// Canonicalisation failed for a reason other than absence.
    #[error("failed to canonicalise {path}: {source}")]
    Canonicalise {
        /// Path being resolved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// An allow-listed base directory could not be resolved.
    #[error("allowed base directory {path} cannot be resolved: {source}")]
    BaseDirectory {
        /// Configured base directory.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Display wrapper for the allow-list carried by [`PathError::Traversal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedDirs(pub Vec<PathBuf>);

impl fmt::Display for AllowedDirs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|dir| dir.display().to_string())
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}

/// A fully resolved document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath(PathBuf);

impl CanonicalPath {
    /// Borrows the path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Consumes the wrapper.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Canonicalises document paths and enforces the allow-list.
#[derive(Debug, Clone, Default)]
pub struct PathValidator {
    allowed: Vec<PathBuf>,
}

impl PathValidator {
    /// Restricts documents to descendants of the given directories.
    ///
    /// Passing an empty iterator yields an unrestricted validator.
    #[must_use]
    pub fn new<I, P>(allowed: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds a validator from configured UTF-8 base directories.
    #[must_use]
    pub fn from_config_dirs(dirs: &[Utf8PathBuf]) -> Self {
        Self::new(dirs.iter().map(|dir| dir.as_std_path().to_path_buf()))
    }

    /// Accepts any path that exists.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            allowed: Vec::new(),
        }
    }

    /// Returns true when containment is enforced.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        !self.allowed.is_empty()
    }

    /// Resolves an existing document path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotFound`] when the file does not exist,
    /// [`PathError::NotAFile`] for directories and [`PathError::Traversal`]
    /// when the canonical path escapes the allow-list.
    pub fn validate(&self, path: &Path) -> Result<CanonicalPath, PathError> {
        let canonical = fs::canonicalize(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                PathError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PathError::Canonicalise {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        if canonical.is_dir() {
            return Err(PathError::NotAFile { path: canonical });
        }
        self.ensure_contained(canonical)
    }

    /// Resolves the path of a document that is about to be created.
    ///
    /// The parent directory must exist; the file itself may not.
    ///
    /// # Errors
    ///
    /// Returns the same kinds as [`Self::validate`], with `NotFound`
    /// describing a missing parent directory.
    pub fn validate_new(&self, path: &Path) -> Result<CanonicalPath, PathError> {
        let file_name = match path.components().next_back() {
            Some(Component::Normal(name)) => name.to_owned(),
            _ => {
                return Err(PathError::NotAFile {
                    path: path.to_path_buf(),
                });
            }
        };
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let canonical_parent = fs::canonicalize(&parent).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                PathError::NotFound { path: parent.clone() }
            } else {
                PathError::Canonicalise {
                    path: parent.clone(),
                    source,
                }
            }
        })?;
        let candidate = canonical_parent.join(file_name);
        if candidate.is_dir() {
            return Err(PathError::NotAFile { path: candidate });
        }
        self.ensure_contained(candidate)
    }

    fn ensure_contained(&self, canonical: PathBuf) -> Result<CanonicalPath, PathError> {
        if self.allowed.is_empty() {
            return Ok(CanonicalPath(canonical));
        }

        let mut resolved_bases = Vec::with_capacity(self.allowed.len());
        for base in &self.allowed {
            let resolved =
                fs::canonicalize(base).map_err(|source| PathError::BaseDirectory {
                    path: base.clone(),
                    source,
                })?;
            if canonical.starts_with(&resolved) {
                debug!(
                    target: PATHS_TARGET,
                    path = %canonical.display(),
                    base = %resolved.display(),
                    "path accepted"
                );
                return Ok(CanonicalPath(canonical));
            }
            resolved_bases.push(resolved);
        }

        Err(PathError::Traversal {
            path: canonical,
            allowed: AllowedDirs(resolved_bases),
        })
    }
}
