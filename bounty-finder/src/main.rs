use anyhow::Context;
use bounty_finder::config::FinderConfig;
use clap::{Parser, Subcommand};
use extractors::BountyPatternExtractor;
use shared_types::{amount_display, unit_display, Issue, IssueState, Label};
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "bounty-finder", author, version, about = "Find and report bounties on GitHub issues")]
struct Cli {
    /// Also write logs to this file (without ANSI colors)
    #[arg(long, global = true)]
    log_file_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan tracked repositories and regenerate the reports
    Run {
        /// Config file (defaults to the user config directory)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Override paths.output_dir
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Run bounty extraction on ad-hoc input and print the result as JSON
    Extract {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        body: String,

        /// Label name, repeatable; order matters
        #[arg(long = "label")]
        labels: Vec<String>,
    },
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("bounty-finder.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file_path.as_deref());

    match cli.command {
        Command::Run { config, output_dir } => {
            let (config, config_path) = FinderConfig::load(config.as_deref())
                .context("Failed to load bounty-finder config")?;
            tracing::info!("Starting bounty finder with config {}", config_path.display());

            let output_dir = output_dir.unwrap_or_else(|| config.paths.output_dir.clone());
            let summary = bounty_finder::run(&config, &output_dir).await?;

            println!(
                "{} bounties in {} repositories, {:.2} {} total",
                summary.bounties, summary.repositories, summary.total_value, summary.reference
            );
        }
        Command::Extract { title, body, labels } => {
            let issue = Issue {
                title,
                body: Some(body),
                labels: labels.into_iter().map(Label::new).collect(),
                state: IssueState::Open,
                html_url: String::new(),
                pull_request: None,
            };
            let bounty = BountyPatternExtractor::shared().extract_from_issue(&issue);

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "amount": amount_display(bounty.as_ref()),
                    "currency": unit_display(bounty.as_ref()),
                }))?
            );
        }
    }

    Ok(())
}
