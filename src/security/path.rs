//! Manifest path validation.
//!
//! Configuration must never point `cargo` at a manifest outside the
//! working tree.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Reasons a path is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path is absolute.
    #[error("absolute paths are not allowed")]
    Absolute,

    /// The normalised path climbs above the working directory.
    #[error("path traversal detected: cannot use '..' to escape working directory")]
    Traversal,
}

/// Lexically normalise a path: drop `.` segments and fold `name/..` pairs.
///
/// Leading `..` segments that cannot be folded are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    out.iter().collect()
}

/// Validate a relative path so it stays inside the working tree.
///
/// An empty path is accepted and means "use the default".
pub fn validate_path(path: &str) -> Result<(), PathError> {
    if path.is_empty() {
        return Ok(());
    }

    let raw = Path::new(path);
    if raw.is_absolute() || raw.has_root() {
        return Err(PathError::Absolute);
    }

    let cleaned = normalize(raw);
    if cleaned.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(PathError::Traversal);
    }

    Ok(())
}
