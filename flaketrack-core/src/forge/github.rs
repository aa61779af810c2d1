// GitHub REST client: pull requests, issue comments, and commit statuses.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::GitHubSection;
use crate::error::ForgeError;
use crate::types::{IssueComment, PullRequest, StatusEvent};

use super::Forge;

/// Maximum retry attempts for rate-limited requests.
const MAX_RETRIES: u32 = 5;
/// Pause and wait for reset when remaining drops below this threshold.
const RATE_LIMIT_PAUSE_THRESHOLD: u32 = 5;
const PER_PAGE: usize = 100;

/// GitHub REST API client.
///
/// Constructed once and shared by reference with everything that talks to
/// GitHub.
#[derive(Debug)]
pub struct GitHubClient {
    api_base: String,
    token: Option<String>,
    client: Client,
    /// Remaining API calls before rate limit resets.
    rate_remaining: AtomicU32,
    /// Unix timestamp when the rate limit window resets.
    rate_reset: AtomicU64,
}

impl GitHubClient {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        install_crypto_provider();
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
            rate_remaining: AtomicU32::new(u32::MAX),
            rate_reset: AtomicU64::new(0),
        }
    }

    /// Create from config, reading the token from the configured env var.
    pub fn from_config(config: &GitHubSection) -> Self {
        let token = std::env::var(&config.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        if token.is_none() {
            warn!(
                token_env = %config.token_env,
                "No GitHub token set, using unauthenticated rate limits"
            );
        }
        Self::new(&config.api_base, token)
    }

    /// Fetch every page of a list endpoint.
    async fn get_all_pages<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ForgeError> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let batch: Vec<T> = self
                .get_json(&format!(
                    "{}{path}{separator}per_page={PER_PAGE}&page={page}",
                    self.api_base
                ))
                .await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ForgeError> {
        // Pre-check: if remaining is low, wait for reset
        self.wait_for_rate_reset().await;

        let mut delay = Duration::from_secs(1);

        for attempt in 0..=MAX_RETRIES {
            let mut req = self
                .client
                .get(url)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", "flaketrack/0.1");

            if let Some(token) = &self.token {
                req = req.header("Authorization", format!("Bearer {token}"));
            }

            debug!(url = %url, attempt, "GitHub API request");

            let resp = req
                .send()
                .await
                .map_err(|e| ForgeError::Network(e.to_string()))?;

            self.update_rate_limit(&resp);

            if resp.status().is_success() {
                return resp
                    .json()
                    .await
                    .map_err(|e| ForgeError::Parse(format!("{url}: {e}")));
            }

            // Rate limited: retry with backoff
            let status = resp.status().as_u16();
            if (status == 403 || status == 429) && attempt < MAX_RETRIES {
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map_or(delay, Duration::from_secs);
                warn!(
                    attempt,
                    status,
                    wait_secs = wait.as_secs(),
                    "Rate limited, backing off"
                );
                tokio::time::sleep(wait).await;
                delay = (delay * 2).min(Duration::from_secs(60));
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(ForgeError::Api { status, body });
        }

        Err(ForgeError::Network(format!("max retries exceeded for {url}")))
    }

    /// Update rate limit state from response headers.
    fn update_rate_limit(&self, resp: &reqwest::Response) {
        if let Some(remaining) = resp
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok())
        {
            self.rate_remaining.store(remaining, Ordering::Relaxed);
            if remaining < 10 {
                warn!(remaining, "GitHub API rate limit low");
            }
        }
        if let Some(reset) = resp
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.rate_reset.store(reset, Ordering::Relaxed);
        }
    }

    /// Sleep until the rate limit window resets if remaining is low.
    async fn wait_for_rate_reset(&self) {
        let remaining = self.rate_remaining.load(Ordering::Relaxed);
        if remaining > RATE_LIMIT_PAUSE_THRESHOLD {
            return;
        }
        let reset_at = self.rate_reset.load(Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if reset_at > now {
            let wait = reset_at - now + 1;
            warn!(remaining, wait_secs = wait, "Rate limit low, waiting for reset");
            tokio::time::sleep(Duration::from_secs(wait)).await;
        }
    }
}

#[async_trait::async_trait]
impl Forge for GitHubClient {
    async fn list_pull_requests(
        &self,
        org: &str,
        repo: &str,
    ) -> Result<Vec<PullRequest>, ForgeError> {
        let prs: Vec<GhPullRequest> = self
            .get_all_pages(&format!(
                "/repos/{org}/{repo}/pulls?state=all&sort=created&direction=desc"
            ))
            .await?;
        info!(org, repo, pull_requests = prs.len(), "Listed pull requests");
        Ok(prs.into_iter().map(PullRequest::from).collect())
    }

    async fn list_issue_comments(
        &self,
        org: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>, ForgeError> {
        let comments: Vec<GhComment> = self
            .get_all_pages(&format!("/repos/{org}/{repo}/issues/{number}/comments"))
            .await?;
        Ok(comments.into_iter().map(IssueComment::from).collect())
    }

    async fn get_statuses(&self, statuses_url: &str) -> Result<Vec<StatusEvent>, ForgeError> {
        // Only the newest page matters: older statuses are superseded per context
        let separator = if statuses_url.contains('?') { '&' } else { '?' };
        self.get_json(&format!("{statuses_url}{separator}per_page={PER_PAGE}"))
            .await
    }
}

/// reqwest is built without a default rustls provider.
fn install_crypto_provider() {
    // Errors only when a provider is already installed
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

// ── GitHub API Types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GhPullRequest {
    number: u64,
    state: String,
    html_url: String,
    statuses_url: String,
    created_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    merged_at: Option<DateTime<Utc>>,
}

impl From<GhPullRequest> for PullRequest {
    fn from(pr: GhPullRequest) -> Self {
        Self {
            number: pr.number,
            closed: pr.state == "closed",
            html_url: pr.html_url,
            statuses_url: pr.statuses_url,
            created_at: pr.created_at,
            closed_at: pr.closed_at,
            merged_at: pr.merged_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhUser {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct GhComment {
    user: Option<GhUser>,
    body: Option<String>,
}

impl From<GhComment> for IssueComment {
    fn from(comment: GhComment) -> Self {
        Self {
            user_id: comment.user.map(|u| u.id),
            body: comment.body.unwrap_or_default(),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
