//! Sync Engine - mirrors each listed repository in turn
//!
//! Repositories are processed strictly one after another: a clone when the
//! mirror directory is missing, a pull when it exists. Each one produces a
//! [`SyncResult`]; a failed git command never stops the run.

use anyhow::Result;
use futures::{pin_mut, Stream, TryStreamExt};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::git::Vcs;
use crate::gitea::Repository;
use crate::mirror::MirrorLayout;

/// What a repository needs to be brought up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Clone,
    Pull,
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncAction::Clone => f.pad("clone"),
            SyncAction::Pull => f.pad("pull"),
        }
    }
}

/// Result of syncing one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    /// Repository was successfully cloned
    Cloned { path: PathBuf },
    /// Repository was successfully pulled
    Pulled { path: PathBuf },
    /// Dry run: the action that would have been taken
    Planned { path: PathBuf, action: SyncAction },
    /// git exited with a failure status
    Failed {
        path: PathBuf,
        action: SyncAction,
        error: String,
    },
}

impl SyncResult {
    pub fn path(&self) -> &PathBuf {
        match self {
            SyncResult::Cloned { path }
            | SyncResult::Pulled { path }
            | SyncResult::Planned { path, .. }
            | SyncResult::Failed { path, .. } => path,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SyncResult::Failed { .. })
    }
}

/// Results from a complete sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncSummary {
    pub total_repositories: usize,
    pub cloned: usize,
    pub pulled: usize,
    pub planned: usize,
    pub failed: usize,
    pub duration: Duration,
    pub results: Vec<SyncResult>,
}

impl SyncSummary {
    fn record(&mut self, result: SyncResult) {
        self.total_repositories += 1;
        match &result {
            SyncResult::Cloned { .. } => self.cloned += 1,
            SyncResult::Pulled { .. } => self.pulled += 1,
            SyncResult::Planned { .. } => self.planned += 1,
            SyncResult::Failed { .. } => self.failed += 1,
        }
        self.results.push(result);
    }

    pub fn failures(&self) -> impl Iterator<Item = &SyncResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Mirrors repositories into a [`MirrorLayout`] using a [`Vcs`]
pub struct SyncEngine<V> {
    layout: MirrorLayout,
    vcs: V,
    dry_run: bool,
}

impl<V: Vcs> SyncEngine<V> {
    pub fn new(layout: MirrorLayout, vcs: V) -> Self {
        Self {
            layout,
            vcs,
            dry_run: false,
        }
    }

    /// Only report what would happen; no directories, no git
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn layout(&self) -> &MirrorLayout {
        &self.layout
    }

    /// Bring one repository up to date
    ///
    /// Errors are reserved for problems that should abort the whole run
    /// (unusable names, filesystem errors, git missing). A git command that
    /// runs and fails is reported as [`SyncResult::Failed`].
    pub async fn sync_repository(&self, repo: &Repository) -> Result<SyncResult> {
        if self.dry_run {
            let mirror = self.layout.locate(repo)?;
            let action = if mirror.exists() {
                SyncAction::Pull
            } else {
                SyncAction::Clone
            };
            return Ok(SyncResult::Planned {
                path: mirror.path,
                action,
            });
        }

        let mirror = self.layout.prepare(repo).await?;

        let (action, outcome) = if mirror.exists() {
            info!("Updating {}", mirror.path.display());
            (SyncAction::Pull, self.vcs.pull(&mirror.path).await?)
        } else {
            info!("Cloning {}", repo.clone_url);
            (
                SyncAction::Clone,
                self.vcs.clone_repo(&repo.clone_url, &mirror.owner_dir).await?,
            )
        };

        debug!("git {} output for {}:\n{}", action, repo.full_name(), outcome.output);

        if !outcome.success {
            warn!(
                "git {} failed for {}: {}",
                action,
                mirror.path.display(),
                outcome.output.trim()
            );
            return Ok(SyncResult::Failed {
                path: mirror.path,
                action,
                error: outcome.output.trim().to_string(),
            });
        }

        Ok(match action {
            SyncAction::Clone => SyncResult::Cloned { path: mirror.path },
            SyncAction::Pull => SyncResult::Pulled { path: mirror.path },
        })
    }

    /// Drain a repository stream, syncing each item as it arrives
    ///
    /// Stops at the first error from either the stream or
    /// [`sync_repository`](Self::sync_repository).
    pub async fn sync_all<S>(&self, repositories: S) -> Result<SyncSummary>
    where
        S: Stream<Item = Result<Repository>>,
    {
        let start_time = Instant::now();
        let mut summary = SyncSummary::default();

        pin_mut!(repositories);
        while let Some(repo) = repositories.try_next().await? {
            let result = self.sync_repository(&repo).await?;
            summary.record(result);
        }

        summary.duration = start_time.elapsed();

        info!(
            "Sync completed in {:.2}s: {} cloned, {} pulled, {} failed",
            summary.duration.as_secs_f64(),
            summary.cloned,
            summary.pulled,
            summary.failed
        );

        Ok(summary)
    }
}
