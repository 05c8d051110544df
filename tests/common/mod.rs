//! Common test utilities and helpers for saverepos tests
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use saverepos::{GitOutput, Vcs};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SEARCH_PATH: &str = "/api/v1/repos/search";

/// Search API record for `owner/name` hosted on `host`
pub fn repo_json(host: &str, owner: &str, name: &str) -> Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "html_url": format!("{}/{}/{}", host, owner, name),
        "clone_url": format!("{}/{}/{}.git", host, owner, name),
        "owner": { "id": 1, "login": owner },
        "private": false
    })
}

/// Serve `pages` as pages 1..=k and an empty page k+1, each fetched exactly once
pub async fn mount_pages(server: &MockServer, pages: Vec<Vec<Value>>) {
    let last = pages.len() + 1;

    for (index, data) in pages.into_iter().enumerate() {
        mount_page(server, index + 1, json!({ "ok": true, "data": data })).await;
    }
    mount_page(server, last, json!({ "ok": true, "data": [] })).await;
}

/// Serve one page body, expected to be requested exactly once
pub async fn mount_page(server: &MockServer, page: usize, body: Value) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Fail the test if `page` is ever requested
pub async fn forbid_page(server: &MockServer, page: usize) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "data": [] })))
        .expect(0)
        .mount(server)
        .await;
}

/// One recorded git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    Clone { url: String, cwd: PathBuf },
    Pull { cwd: PathBuf },
}

/// In-memory stand-in for git
///
/// A clone creates the checkout directory the way git would, so a second
/// run sees the repository as already mirrored.
#[derive(Debug, Clone, Default)]
pub struct RecordingGit {
    calls: Arc<Mutex<Vec<GitCall>>>,
    failing_urls: Vec<String>,
}

impl RecordingGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make clones of `url` exit with a failure status
    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing_urls.push(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn clones(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GitCall::Clone { .. }))
            .count()
    }

    pub fn pulls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GitCall::Pull { .. }))
            .count()
    }
}

#[async_trait]
impl Vcs for RecordingGit {
    async fn clone_repo(&self, url: &str, cwd: &Path) -> Result<GitOutput> {
        self.calls.lock().expect("calls lock poisoned").push(GitCall::Clone {
            url: url.to_string(),
            cwd: cwd.to_path_buf(),
        });

        if self.failing_urls.iter().any(|u| u == url) {
            return Ok(GitOutput::failed("fatal: could not read Username"));
        }

        let name = url
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim_end_matches(".git");
        std::fs::create_dir_all(cwd.join(name))?;
        Ok(GitOutput::succeeded(format!("Cloning into '{}'...", name)))
    }

    async fn pull(&self, cwd: &Path) -> Result<GitOutput> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(GitCall::Pull {
                cwd: cwd.to_path_buf(),
            });
        Ok(GitOutput::succeeded("Already up to date."))
    }
}

/// Relative paths of every directory under `root`, sorted
pub fn directory_tree(root: &Path) -> Vec<PathBuf> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    if let Ok(relative) = path.strip_prefix(root) {
                        out.push(relative.to_path_buf());
                    }
                    walk(root, &path, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
