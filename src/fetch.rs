//! Repository content providers.
//!
//! The [`RepoFetcher`] trait is the seam between the pipeline and any
//! hosting provider; [`GitHubFetcher`] is the concrete GitHub v3 REST
//! implementation. Raw file bodies go through raw.githubusercontent.com,
//! which is not subject to the API rate limit.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::SummarizeError;
use crate::repo::{EntryKind, RepoMetadata, RepoRef, TreeEntry};

const GITHUB_API: &str = "https://api.github.com";
const RAW_BASE: &str = "https://raw.githubusercontent.com";
const USER_AGENT: &str = concat!("marrow/", env!("CARGO_PKG_VERSION"));

/// Read-only access to a hosted repository.
#[async_trait]
pub trait RepoFetcher: Send + Sync {
    async fn fetch_metadata(&self, repo: &RepoRef) -> Result<RepoMetadata, SummarizeError>;

    async fn fetch_tree(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, SummarizeError>;

    /// Language byte counts. Failures degrade to an empty map: language
    /// data is decorative, never load-bearing.
    async fn fetch_languages(&self, repo: &RepoRef) -> BTreeMap<String, u64>;

    async fn fetch_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &str,
    ) -> Result<String, SummarizeError>;
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    #[serde(default = "default_branch_name")]
    default_branch: String,
    description: Option<String>,
}

fn default_branch_name() -> String {
    "main".to_string()
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeItem>,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    size: u64,
}

/// GitHub v3 REST API client.
pub struct GitHubFetcher {
    client: reqwest::Client,
    token: Option<String>,
}

impl GitHubFetcher {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    async fn api_get(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, SummarizeError> {
        let url = format!("{GITHUB_API}{endpoint}");
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", USER_AGENT)
            .query(query);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SummarizeError::ContentExtraction(format!("network error fetching {url}: {e}")))?;

        match response.status().as_u16() {
            200 => Ok(response),
            404 => Err(SummarizeError::RepositoryNotFound(
                "make sure the reference points to a public repository".to_string(),
            )),
            403 => {
                let remaining = header_value(&response, "x-ratelimit-remaining");
                if remaining.as_deref() == Some("0") {
                    Err(SummarizeError::RateLimited {
                        retry_after: header_value(&response, "x-ratelimit-reset")
                            .map(|raw| format_reset_time(&raw)),
                    })
                } else {
                    Err(SummarizeError::RepositoryAccessDenied(
                        "the repository may be private".to_string(),
                    ))
                }
            }
            429 => Err(SummarizeError::RateLimited { retry_after: None }),
            status => Err(SummarizeError::ContentExtraction(format!(
                "GitHub API returned HTTP {status} for {url}"
            ))),
        }
    }
}

/// `x-ratelimit-reset` carries epoch seconds; render it as a UTC timestamp,
/// keeping the raw value when it does not parse.
fn format_reset_time(raw: &str) -> String {
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

#[async_trait]
impl RepoFetcher for GitHubFetcher {
    async fn fetch_metadata(&self, repo: &RepoRef) -> Result<RepoMetadata, SummarizeError> {
        let response = self
            .api_get(&format!("/repos/{}/{}", repo.owner, repo.repo), &[])
            .await?;
        let data: RepoResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::ContentExtraction(format!("malformed repository metadata: {e}")))?;

        Ok(RepoMetadata {
            default_branch: data.default_branch,
            description: data.description,
        })
    }

    async fn fetch_tree(
        &self,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, SummarizeError> {
        let response = self
            .api_get(
                &format!("/repos/{}/{}/git/trees/{branch}", repo.owner, repo.repo),
                &[("recursive", "1")],
            )
            .await?;
        let data: TreeResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::ContentExtraction(format!("malformed tree listing: {e}")))?;

        if data.tree.is_empty() {
            return Err(SummarizeError::EmptyRepository(format!(
                "{} has no tree entries",
                repo.full_name()
            )));
        }

        Ok(data
            .tree
            .into_iter()
            .map(|item| TreeEntry {
                path: item.path,
                kind: if item.kind == "tree" {
                    EntryKind::Tree
                } else {
                    EntryKind::Blob
                },
                size_bytes: item.size,
            })
            .collect())
    }

    async fn fetch_languages(&self, repo: &RepoRef) -> BTreeMap<String, u64> {
        let response = match self
            .api_get(&format!("/repos/{}/{}/languages", repo.owner, repo.repo), &[])
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(repo = %repo, error = %e, "language fetch failed, continuing without");
                return BTreeMap::new();
            }
        };

        response.json().await.unwrap_or_default()
    }

    async fn fetch_file_content(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &str,
    ) -> Result<String, SummarizeError> {
        let url = format!("{RAW_BASE}/{}/{}/{branch}/{path}", repo.owner, repo.repo);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| SummarizeError::ContentExtraction(format!("network error fetching {url}: {e}")))?;

        match response.status().as_u16() {
            200 => response
                .text()
                .await
                .map_err(|e| SummarizeError::ContentExtraction(format!("failed reading body of {path}: {e}"))),
            404 => Err(SummarizeError::ContentExtraction(format!(
                "file not found: {path}"
            ))),
            status => Err(SummarizeError::ContentExtraction(format!(
                "raw content host returned HTTP {status} for {path}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_epoch_renders_as_utc() {
        assert_eq!(format_reset_time("1735689600"), "2025-01-01 00:00:00 UTC");
    }

    #[test]
    fn test_unparseable_reset_kept_raw() {
        assert_eq!(format_reset_time("soon"), "soon");
        assert_eq!(format_reset_time(""), "");
    }
}
