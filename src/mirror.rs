//! Local mirror layout
//!
//! Every repository lives at `{base_dir}/{owner}/{name}`. Whether that
//! directory exists is the only thing used to pick between clone and pull.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::gitea::Repository;

/// Resolves repositories to directories under a base directory
#[derive(Debug, Clone)]
pub struct MirrorLayout {
    base_dir: PathBuf,
}

/// Where one repository is mirrored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorPath {
    /// `{base_dir}/{owner}`, the working directory for `git clone`
    pub owner_dir: PathBuf,
    /// `{base_dir}/{owner}/{name}`, the working directory for `git pull`
    pub path: PathBuf,
}

impl MirrorPath {
    /// Whether the repository was mirrored by a previous run
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

impl MirrorLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Compute the mirror paths for a repository without touching disk
    pub fn locate(&self, repo: &Repository) -> Result<MirrorPath> {
        let owner = checked_component(&repo.owner.login)
            .with_context(|| format!("Invalid owner for {}", repo.html_url))?;
        let name = checked_component(repo.name())
            .with_context(|| format!("Invalid repository name for {}", repo.html_url))?;

        let owner_dir = self.base_dir.join(owner);
        let path = owner_dir.join(name);

        Ok(MirrorPath { owner_dir, path })
    }

    /// Compute the mirror paths and make sure the owner directory exists
    pub async fn prepare(&self, repo: &Repository) -> Result<MirrorPath> {
        let mirror = self.locate(repo)?;

        if !mirror.owner_dir.is_dir() {
            debug!("Creating owner directory {}", mirror.owner_dir.display());
        }
        tokio::fs::create_dir_all(&mirror.owner_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create owner directory: {}",
                    mirror.owner_dir.display()
                )
            })?;

        Ok(mirror)
    }
}

/// Reject names that would not stay a single directory below the base
fn checked_component(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(anyhow!("'{}' is not a usable directory name", name));
    }
    Ok(name)
}
