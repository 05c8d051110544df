use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// Captured outcome of one git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    /// stdout followed by stderr
    pub output: String,
}

impl GitOutput {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// The two git operations a mirror run needs
///
/// The working directory is always passed explicitly. Implementations must
/// never change the process-wide current directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Vcs: Send + Sync {
    /// `git clone <url>` inside `cwd`, creating `cwd/<name>`
    async fn clone_repo(&self, url: &str, cwd: &Path) -> Result<GitOutput>;

    /// `git pull` inside an existing checkout
    async fn pull(&self, cwd: &Path) -> Result<GitOutput>;
}

/// Runs the `git` executable found on PATH
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
        }
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable, e.g. an absolute path to git
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str], cwd: &Path) -> Result<GitOutput> {
        debug!("Running {} {} in {}", self.program, args.join(" "), cwd.display());

        let output = AsyncCommand::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to execute {} {}", self.program, args.join(" ")))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(GitOutput {
            success: output.status.success(),
            output: combined,
        })
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn clone_repo(&self, url: &str, cwd: &Path) -> Result<GitOutput> {
        self.run(&["clone", url], cwd).await
    }

    async fn pull(&self, cwd: &Path) -> Result<GitOutput> {
        self.run(&["pull"], cwd).await
    }
}
