use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared_types::{CustomPattern, ExtraBounty, Metal, TrackedOrg, TrackedRepo};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_RATES_ENDPOINT: &str = "https://api.coingecko.com/api/v3/simple/price";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct FinderConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub rates: RatesConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GithubConfig {
    pub api_base: String,
    pub token: Option<String>,
    pub per_page: u32,
    pub max_retries: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API.to_string(),
            token: None,
            per_page: 100,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub output_dir: PathBuf,
    pub tracked_repos: PathBuf,
    pub tracked_orgs: PathBuf,
    pub extra_bounties: PathBuf,
    pub readme: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("bounties"),
            tracked_repos: PathBuf::from("tracked_repos.json"),
            tracked_orgs: PathBuf::from("tracked_orgs.json"),
            extra_bounties: PathBuf::from("extra_bounties.json"),
            readme: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RatesConfig {
    pub endpoint: String,
    /// Unit all values are converted into
    pub reference: String,
    /// Currency code to CoinGecko coin id
    pub coin_ids: BTreeMap<String, String>,
    /// Fallback spot prices, USD per troy ounce
    pub metal_usd_per_oz: BTreeMap<Metal, f64>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RATES_ENDPOINT.to_string(),
            reference: "ERG".to_string(),
            coin_ids: BTreeMap::from([
                ("ERG".to_string(), "ergo".to_string()),
                ("SigUSD".to_string(), "sigmausd".to_string()),
                ("RSN".to_string(), "rosen-bridge".to_string()),
                ("BENE".to_string(), "benefaction-platform".to_string()),
                ("GORT".to_string(), "gort".to_string()),
            ]),
            metal_usd_per_oz: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,
}

const DEFAULT_CONFIG: &str = r#"
[github]
api_base = "https://api.github.com"
# token = "ghp_..."   # or set GITHUB_TOKEN
per_page = 100
max_retries = 3

[paths]
output_dir = "bounties"
tracked_repos = "tracked_repos.json"
tracked_orgs = "tracked_orgs.json"
extra_bounties = "extra_bounties.json"
# readme = "README.md"

[rates]
endpoint = "https://api.coingecko.com/api/v3/simple/price"
reference = "ERG"

[rates.coin_ids]
ERG = "ergo"
SigUSD = "sigmausd"
RSN = "rosen-bridge"
BENE = "benefaction-platform"
GORT = "gort"

[rates.metal_usd_per_oz]
# GOLD = 2350.0
# SILVER = 29.5
# PLATINUM = 990.0

# [[extraction.custom_patterns]]
# name = "reward_erg"
# mode = "text"
# regex = "reward of ([0-9]+) (erg)"
# kind = "currency"
# amount_group = 1
# unit_group = 2
"#;

impl FinderConfig {
    /// Loads the TOML config, writing a commented default on first use.
    ///
    /// `BOUNTY_FINDER__SECTION__KEY` environment variables override file values.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

        if !config_path.exists() {
            if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::Message(format!("Failed to create config directory: {e}"))
                })?;
            }
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
            tracing::info!("Wrote default config to {}", config_path.display());
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .add_source(
                Environment::with_prefix("BOUNTY_FINDER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: FinderConfig = builder.try_deserialize()?;
        Ok((config, config_path))
    }

    /// Token from the config file, falling back to `GITHUB_TOKEN`
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.github.per_page) {
            anyhow::bail!("github.per_page must be between 1 and 100");
        }
        if self.rates.reference.trim().is_empty() {
            anyhow::bail!("rates.reference must not be empty");
        }
        if self.github_token().is_none() {
            anyhow::bail!("No GitHub token: set github.token or the GITHUB_TOKEN environment variable");
        }
        Ok(())
    }

    pub fn load_tracked_repos(&self) -> Result<Vec<TrackedRepo>> {
        read_json_list(&self.paths.tracked_repos)
    }

    pub fn load_tracked_orgs(&self) -> Result<Vec<TrackedOrg>> {
        read_json_list(&self.paths.tracked_orgs)
    }

    pub fn load_extra_bounties(&self) -> Result<Vec<ExtraBounty>> {
        read_json_list(&self.paths.extra_bounties)
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("bounty-finder").join("config.toml")
    } else {
        PathBuf::from("bounty-finder.toml")
    }
}

/// A missing file is an empty list; a malformed one is an error.
fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        tracing::warn!("{} not found, treating it as empty", path.display());
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
