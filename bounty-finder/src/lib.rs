//! Scans tracked GitHub repositories for bounty issues and renders reports.

pub mod config;
pub mod github;
pub mod processor;
pub mod rates;
pub mod report;

use anyhow::{Context, Result};
use crate::config::FinderConfig;
use extractors::{BountyPatternExtractor, BountyTotals};
use github::GithubClient;
use processor::{BountyProcessor, IssueSource};
use rates::{CoinGeckoRates, RateSource};
use report::ReportContext;
use shared_types::{ConversionRates, TrackedRepo};
use std::path::Path;

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub repositories: usize,
    pub bounties: usize,
    pub total_value: f64,
    pub reference: String,
}

/// Full scan with the GitHub and CoinGecko clients built from `config`
pub async fn run(config: &FinderConfig, output_dir: &Path) -> Result<RunSummary> {
    config.validate()?;
    let token = config
        .github_token()
        .context("GitHub token disappeared after validation")?;

    let github = GithubClient::new(&config.github, &token)?;
    let rates = CoinGeckoRates::new(config.rates.clone())?;
    run_with(config, github, &rates, output_dir).await
}

/// Full scan against injected collaborators
pub async fn run_with<S, R>(
    config: &FinderConfig,
    source: S,
    rate_source: &R,
    output_dir: &Path,
) -> Result<RunSummary>
where
    S: IssueSource,
    R: RateSource + ?Sized,
{
    let extractor = BountyPatternExtractor::with_custom_patterns(&config.extraction.custom_patterns)?;

    let tracked_repos = config.load_tracked_repos()?;
    let tracked_orgs = config.load_tracked_orgs()?;

    tracing::info!("Fetching conversion rates");
    let rates = match rate_source.fetch_rates().await {
        Ok(rates) => rates,
        Err(e) => {
            tracing::warn!("Continuing without conversion rates: {:#}", e);
            ConversionRates::new(config.rates.reference.clone())
        }
    };

    let mut processor = BountyProcessor::new(source, extractor);
    let repos: Vec<TrackedRepo> = processor
        .process_organizations(&tracked_orgs, tracked_repos)
        .await;

    tracing::info!("Processing {} repositories", repos.len());
    processor.process_repositories(&repos).await;

    let extra = config.load_extra_bounties()?;
    if !extra.is_empty() {
        tracing::info!("Adding {} extra bounties", extra.len());
        processor.add_extra_bounties(extra);
    }

    let records = processor.into_records();
    let totals = BountyTotals::from_records(&records, &rates);
    let ctx = ReportContext::new(&records, &totals, &rates, &repos);

    tracing::info!("Generating output files");
    report::write_reports(&ctx, output_dir)?;

    if let Some(readme) = &config.paths.readme {
        let blocks = [
            (report::BOUNTY_BADGES, report::markdown::readme_badges(&ctx)),
            (report::BOUNTY_TABLE, report::markdown::readme_table(&ctx)),
            (report::ONGOING_PROGRAMS, report::markdown::ongoing_programs_table(&ctx)),
        ];
        report::update_readme(readme, &blocks)?;
    }

    let overall = totals.overall();
    tracing::info!("Total bounties found: {}", overall.count);
    tracing::info!("Total {} equivalent value: {:.2}", rates.reference, overall.value);

    Ok(RunSummary {
        repositories: repos.len(),
        bounties: overall.count,
        total_value: overall.value,
        reference: rates.reference.clone(),
    })
}
