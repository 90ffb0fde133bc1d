use crate::config::GithubConfig;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared_types::{Issue, IssueState, OrgRepository, TrackedRepo};
use std::collections::HashMap;
use std::time::Duration;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

pub struct GithubClient {
    client: Client,
    api_base: String,
    per_page: u32,
    max_retries: u32,
}

impl GithubClient {
    pub fn new(config: &GithubConfig, token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("bounty-finder/", env!("CARGO_PKG_VERSION"))),
        );
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .context("GitHub token contains invalid header characters")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            per_page: config.per_page,
            max_retries: config.max_retries,
        })
    }

    /// Open issues of a repository, pull requests excluded
    pub async fn list_open_issues(&self, repo: &TrackedRepo) -> Result<Vec<Issue>> {
        let url = format!(
            "{}/repos/{}/{}/issues?state=open&per_page={}",
            self.api_base, repo.owner, repo.repo, self.per_page
        );
        let issues: Vec<Issue> = self.get_all_pages(&url).await?;

        Ok(issues
            .into_iter()
            .filter(|i| i.state == IssueState::Open && !i.is_pull_request())
            .collect())
    }

    /// Up to two languages, largest byte count first
    pub async fn repo_languages(&self, repo: &TrackedRepo) -> Result<Vec<String>> {
        let url = format!(
            "{}/repos/{}/{}/languages",
            self.api_base, repo.owner, repo.repo
        );
        let (languages, _) = self.get_page::<HashMap<String, u64>>(&url).await?;
        Ok(top_languages(languages, 2))
    }

    /// Non-archived repositories of an organization
    pub async fn org_repos(&self, org: &str) -> Result<Vec<TrackedRepo>> {
        let url = format!(
            "{}/orgs/{}/repos?type=public&per_page={}",
            self.api_base, org, self.per_page
        );
        let repos: Vec<OrgRepository> = self.get_all_pages(&url).await?;

        Ok(repos
            .into_iter()
            .filter(|r| !r.archived)
            .map(|r| TrackedRepo::new(r.owner.login, r.name))
            .collect())
    }

    async fn get_all_pages<T: DeserializeOwned>(&self, first_url: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first_url.to_string());

        while let Some(url) = next {
            let (mut page, next_url) = self.get_page::<Vec<T>>(&url).await?;
            tracing::debug!(url = %url, items = page.len(), "fetched page");
            items.append(&mut page);
            next = next_url;
        }

        Ok(items)
    }

    /// One GET with retries on transport errors and 5xx responses.
    /// Returns the decoded body and the `rel="next"` link, if any.
    async fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<(T, Option<String>)> {
        let mut attempt = 0;
        let mut backoff = INITIAL_BACKOFF;

        loop {
            let outcome = self.client.get(url).send().await;
            let retryable = match &outcome {
                Ok(response) => response.status().is_server_error(),
                Err(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            };

            if retryable && attempt < self.max_retries {
                attempt += 1;
                tracing::warn!(
                    url = %url,
                    attempt,
                    "GitHub request failed, retrying in {:?}",
                    backoff
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            let response = outcome.with_context(|| format!("GET {} failed", url))?;
            let status = response.status();
            if !status.is_success() {
                return Err(request_error(url, status));
            }

            let next = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_page_url);
            let body = response
                .json::<T>()
                .await
                .with_context(|| format!("Invalid JSON from {}", url))?;
            return Ok((body, next));
        }
    }
}

fn request_error(url: &str, status: StatusCode) -> anyhow::Error {
    match status {
        StatusCode::UNAUTHORIZED => anyhow::anyhow!("GitHub rejected the token ({}) for {}", status, url),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            anyhow::anyhow!("GitHub rate limit or permission error ({}) for {}", status, url)
        }
        _ => anyhow::anyhow!("GitHub returned {} for {}", status, url),
    }
}

/// Extracts the `rel="next"` target from a `Link` header
pub fn next_page_url(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|part| {
        let mut sections = part.split(';');
        let target = sections.next()?.trim();
        let is_next = sections.any(|s| {
            let s = s.trim();
            s == r#"rel="next""# || s == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Language names ordered by byte count (descending, ties by name), truncated to `limit`
pub fn top_languages(languages: HashMap<String, u64>, limit: usize) -> Vec<String> {
    let mut sorted: Vec<(String, u64)> = languages.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.into_iter().take(limit).map(|(name, _)| name).collect()
}
