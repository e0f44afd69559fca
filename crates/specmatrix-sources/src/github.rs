//! GitHub REST implementation of [`CorpusHistorySource`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use specmatrix_core::{CorpusHistorySource, FetchError};
use tracing::{debug, warn};

use crate::error::SourceError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_MAX_PAGES: usize = 10;
pub const PAGE_SIZE: usize = 100;

/// GitHub API configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubConfig {
    pub api_url: String,
    /// Bearer token; anonymous requests are heavily rate limited
    pub token: Option<String>,
    /// Upper bound on fetched history pages of `PAGE_SIZE` commits
    pub max_pages: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl GithubConfig {
    pub fn new(api_url: &str) -> Self {
        GithubConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            token: None,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Read `GITHUB_API_URL`, `GITHUB_TOKEN` and `SPECMATRIX_HISTORY_MAX_PAGES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("GITHUB_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&api_url);
        config.token = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty());
        config.max_pages = lookup("SPECMATRIX_HISTORY_MAX_PAGES")
            .and_then(|v| v.trim().parse().ok())
            .filter(|pages: &usize| *pages > 0)
            .unwrap_or(DEFAULT_MAX_PAGES);
        config
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }
}

#[derive(Debug, Deserialize)]
struct CommitItem {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

/// Directory listings come back as arrays, single entries as objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Entry(ContentEntry),
    Listing(Vec<serde_json::Value>),
}

/// Commit history and submodule pins read from the GitHub REST API.
pub struct GithubHistorySource {
    config: GithubConfig,
    http_client: reqwest::Client,
}

impl GithubHistorySource {
    pub fn new(config: GithubConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("specmatrix/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(GithubHistorySource {
            config,
            http_client,
        })
    }

    pub fn from_env() -> Result<Self, SourceError> {
        Self::new(GithubConfig::from_env())
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    fn repo_url(&self, repo: &str) -> Result<String, SourceError> {
        match repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(format!("{}/repos/{}/{}", self.config.api_url, owner, name))
            }
            _ => Err(SourceError::InvalidRepo(repo.to_string())),
        }
    }

    /// GET `url`; `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, SourceError> {
        let mut request = self.http_client.get(url).query(query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| SourceError::Decode {
                url: url.to_string(),
                detail: e.to_string(),
            })
    }

    async fn fetch_history(&self, repo: &str, branch: &str) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/commits", self.repo_url(repo)?);
        let mut history = Vec::new();

        for page in 1..=self.config.max_pages {
            let query = [
                ("sha", branch.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ];
            let commits: Vec<CommitItem> =
                self.get_json(&url, &query)
                    .await?
                    .ok_or_else(|| SourceError::Status {
                        status: StatusCode::NOT_FOUND.as_u16(),
                        url: url.clone(),
                    })?;

            let fetched = commits.len();
            history.extend(commits.into_iter().map(|c| c.sha));
            if fetched < PAGE_SIZE {
                break;
            }
            if page == self.config.max_pages {
                debug!(repo, branch, pages = page, "history page cap reached");
            }
        }

        debug!(repo, branch, commits = history.len(), "corpus history fetched");
        Ok(history)
    }

    async fn fetch_pinned(&self, sdk_repo: &str, path: &str) -> Result<Option<String>, SourceError> {
        let url = format!(
            "{}/contents/{}",
            self.repo_url(sdk_repo)?,
            path.trim_matches('/')
        );
        match self.get_json::<ContentsResponse>(&url, &[]).await? {
            Some(ContentsResponse::Entry(entry)) if entry.kind == "submodule" => Ok(Some(entry.sha)),
            Some(ContentsResponse::Entry(entry)) => {
                warn!(repo = sdk_repo, path, kind = %entry.kind, "pinned path is not a submodule");
                Ok(None)
            }
            Some(ContentsResponse::Listing(_)) => {
                warn!(repo = sdk_repo, path, "pinned path is a plain directory");
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CorpusHistorySource for GithubHistorySource {
    async fn commit_history(&self, repo: &str, branch: &str) -> Result<Vec<String>, FetchError> {
        Ok(self.fetch_history(repo, branch).await?)
    }

    async fn pinned_commit(
        &self,
        sdk_repo: &str,
        submodule_path: &str,
    ) -> Result<Option<String>, FetchError> {
        Ok(self.fetch_pinned(sdk_repo, submodule_path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = GithubConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.token, None);
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_config_reads_overrides() {
        let config = GithubConfig::from_lookup(lookup(&[
            ("GITHUB_API_URL", "http://localhost:9000/"),
            ("GITHUB_TOKEN", "ghp_x"),
            ("SPECMATRIX_HISTORY_MAX_PAGES", "3"),
        ]));
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.token.as_deref(), Some("ghp_x"));
        assert_eq!(config.max_pages, 3);
    }

    #[test]
    fn test_config_ignores_bad_page_cap() {
        let config =
            GithubConfig::from_lookup(lookup(&[("SPECMATRIX_HISTORY_MAX_PAGES", "zero")]));
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        let config = GithubConfig::from_lookup(lookup(&[("SPECMATRIX_HISTORY_MAX_PAGES", "0")]));
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn test_repo_url_requires_owner_and_name() {
        let source = GithubHistorySource::new(GithubConfig::default()).unwrap();
        assert_eq!(
            source.repo_url("TBD54566975/web5-spec").unwrap(),
            "https://api.github.com/repos/TBD54566975/web5-spec"
        );
        assert!(source.repo_url("web5-spec").is_err());
        assert!(source.repo_url("a/b/c").is_err());
    }
}
