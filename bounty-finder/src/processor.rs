use crate::github::GithubClient;
use anyhow::Result;
use async_trait::async_trait;
use extractors::{is_bounty_candidate, BountyPatternExtractor};
use shared_types::{
    BountyMatch, BountyRecord, ExtraBounty, Issue, TrackedOrg, TrackedRepo,
    NO_SECONDARY_LANGUAGE, UNKNOWN_LANGUAGE,
};
use std::collections::BTreeSet;

/// Where repositories and their issues come from
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn list_open_issues(&self, repo: &TrackedRepo) -> Result<Vec<Issue>>;
    async fn repo_languages(&self, repo: &TrackedRepo) -> Result<Vec<String>>;
    async fn org_repos(&self, org: &str) -> Result<Vec<TrackedRepo>>;
}

#[async_trait]
impl IssueSource for GithubClient {
    async fn list_open_issues(&self, repo: &TrackedRepo) -> Result<Vec<Issue>> {
        GithubClient::list_open_issues(self, repo).await
    }

    async fn repo_languages(&self, repo: &TrackedRepo) -> Result<Vec<String>> {
        GithubClient::repo_languages(self, repo).await
    }

    async fn org_repos(&self, org: &str) -> Result<Vec<TrackedRepo>> {
        GithubClient::org_repos(self, org).await
    }
}

pub struct BountyProcessor<S> {
    source: S,
    extractor: BountyPatternExtractor,
    records: Vec<BountyRecord>,
}

impl<S: IssueSource> BountyProcessor<S> {
    pub fn new(source: S, extractor: BountyPatternExtractor) -> Self {
        Self {
            source,
            extractor,
            records: Vec::new(),
        }
    }

    /// Adds every repository of the given organizations to `repos`, skipping
    /// ones already tracked. Organizations that fail to list are skipped.
    pub async fn process_organizations(
        &self,
        orgs: &[TrackedOrg],
        repos: Vec<TrackedRepo>,
    ) -> Vec<TrackedRepo> {
        let mut seen: BTreeSet<TrackedRepo> = repos.iter().cloned().collect();
        let mut repos = repos;

        for org in orgs {
            match self.source.org_repos(&org.org).await {
                Ok(org_repos) => {
                    let before = repos.len();
                    for repo in org_repos {
                        if seen.insert(repo.clone()) {
                            repos.push(repo);
                        }
                    }
                    tracing::info!("Organization {}: added {} repositories", org.org, repos.len() - before);
                }
                Err(e) => tracing::warn!("Skipping organization {}: {:#}", org.org, e),
            }
        }

        repos
    }

    pub async fn process_repositories(&mut self, repos: &[TrackedRepo]) {
        for repo in repos {
            if let Err(e) = self.process_repository(repo).await {
                tracing::warn!("Skipping {}: {:#}", repo.full_name(), e);
            }
        }
    }

    pub async fn process_repository(&mut self, repo: &TrackedRepo) -> Result<usize> {
        tracing::info!("Processing {}", repo.full_name());

        let languages = match self.source.repo_languages(repo).await {
            Ok(languages) => languages,
            Err(e) => {
                tracing::warn!("No languages for {}: {:#}", repo.full_name(), e);
                Vec::new()
            }
        };
        let issues = self.source.list_open_issues(repo).await?;
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut found = 0;
        for issue in issues.iter().filter(|i| is_bounty_candidate(i)) {
            let bounty = self.extractor.extract_from_issue(issue);
            match &bounty {
                Some(b) => tracing::debug!(url = %issue.html_url, amount = %b.amount, unit = %b.unit, "bounty found"),
                None => tracing::debug!(url = %issue.html_url, "bounty amount not specified"),
            }

            self.records.push(BountyRecord {
                timestamp: timestamp.clone(),
                owner: repo.owner.clone(),
                repo: repo.repo.clone(),
                title: issue.title.clone(),
                url: issue.html_url.clone(),
                bounty,
                primary_lang: languages
                    .first()
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
                secondary_lang: languages
                    .get(1)
                    .cloned()
                    .unwrap_or_else(|| NO_SECONDARY_LANGUAGE.to_string()),
                labels: issue.label_names(),
            });
            found += 1;
        }

        tracing::info!("{}: {} bounties in {} open issues", repo.full_name(), found, issues.len());
        Ok(found)
    }

    /// Appends curated bounties. An unrecognized currency keeps the record
    /// with the amount marked unspecified.
    pub fn add_extra_bounties(&mut self, extra: Vec<ExtraBounty>) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        for entry in extra {
            let bounty = match BountyMatch::from_display(&entry.amount, &entry.currency) {
                Ok(bounty) => bounty,
                Err(e) => {
                    tracing::warn!("Extra bounty {}: {}", entry.url, e);
                    None
                }
            };

            self.records.push(BountyRecord {
                timestamp: timestamp.clone(),
                owner: entry.owner,
                repo: entry.repo,
                title: entry.title,
                url: entry.url,
                bounty,
                primary_lang: entry
                    .primary_lang
                    .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
                secondary_lang: entry
                    .secondary_lang
                    .unwrap_or_else(|| NO_SECONDARY_LANGUAGE.to_string()),
                labels: entry.labels,
            });
        }
    }

    pub fn records(&self) -> &[BountyRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BountyRecord> {
        self.records
    }
}
