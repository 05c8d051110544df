//! saverepos - Gitea Repository Mirroring
//!
//! Keeps a local copy of every repository hosted on a Gitea server. New
//! repositories are cloned, already mirrored ones are updated with `git pull`.
//!
//! ## Modules
//!
//! - [`config`]: Configuration file and log level parsing
//! - [`gitea`]: Paginated repository listing via the Gitea search API
//! - [`mirror`]: Mapping repositories to `{base}/{owner}/{name}` directories
//! - [`git`]: Running `git clone` / `git pull`
//! - [`sync`]: Per-repository clone-or-pull decisions and run summaries

pub mod config;
pub mod git;
pub mod gitea;
pub mod mirror;
pub mod sync;

pub use config::{Config, LogLevel};
pub use git::{GitCli, GitOutput, Vcs};
pub use gitea::{GiteaClient, Repository};
pub use mirror::{MirrorLayout, MirrorPath};
pub use sync::{SyncAction, SyncEngine, SyncResult, SyncSummary};
