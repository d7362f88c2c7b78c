//! Output Placement: moves finished files into `{output_root}/{user_id}/{filename}`.
//!
//! An existing file at the destination is overwritten.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Longest file stem kept when sanitising suggested names.
const MAX_STEM_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("Source file {} does not exist", .0.display())]
    SourceMissing(PathBuf),

    #[error("Could not create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not move {} to {}: {source}", from.display(), to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid path segment '{0}'")]
    InvalidSegment(String),
}

#[derive(Debug, Clone)]
pub struct OutputPlacement {
    root: PathBuf,
}

impl OutputPlacement {
    /// `root` is made absolute against the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination for `filename` under `user_id`. Does not check existence.
    pub fn resolve_path(&self, user_id: &str, filename: &str) -> Result<PathBuf, PlacementError> {
        Ok(self
            .root
            .join(validate_segment(user_id)?)
            .join(validate_segment(filename)?))
    }

    /// Moves `source` to its destination and returns the absolute destination path.
    pub fn place(
        &self,
        source: &Path,
        user_id: &str,
        filename: &str,
    ) -> Result<PathBuf, PlacementError> {
        let destination = self.resolve_path(user_id, filename)?;

        if !source.is_file() {
            return Err(PlacementError::SourceMissing(source.to_path_buf()));
        }

        if let Some(dir) = destination.parent() {
            fs::create_dir_all(dir).map_err(|source| PlacementError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        relocate(source, &destination)?;
        info!("Placed {} at {}", filename, destination.display());
        Ok(destination)
    }
}

/// Rename when possible, otherwise copy and delete (e.g. across filesystems).
fn relocate(from: &Path, to: &Path) -> Result<(), PlacementError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    debug!("Rename failed; copying {} to {}", from.display(), to.display());

    let relocate_err = |source| PlacementError::Relocate {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    fs::copy(from, to).map_err(relocate_err)?;
    fs::remove_file(from).map_err(relocate_err)?;
    Ok(())
}

/// Accepts a single, non-empty path component that is not `.` or `..`.
pub fn validate_segment(segment: &str) -> Result<&str, PlacementError> {
    let invalid = segment.trim().is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(PlacementError::InvalidSegment(segment.to_string()));
    }
    Ok(segment)
}

/// Turns a suggested name into a safe file stem. Returns `None` if nothing usable remains.
pub fn sanitize_file_stem(name: &str) -> Option<String> {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_STEM_CHARS)
        .collect();
    let trimmed = replaced.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
