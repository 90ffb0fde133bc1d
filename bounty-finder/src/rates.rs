use crate::config::RatesConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use shared_types::{BountyUnit, ConversionRates, Currency};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Anything that can produce a conversion table for a run
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch_rates(&self) -> Result<ConversionRates>;
}

/// Fixed table, used when no network source is wanted
pub struct StaticRates(pub ConversionRates);

#[async_trait]
impl RateSource for StaticRates {
    async fn fetch_rates(&self) -> Result<ConversionRates> {
        Ok(self.0.clone())
    }
}

/// Coin id → vs-currency → price, as returned by `/simple/price`
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub struct CoinGeckoRates {
    client: reqwest::Client,
    config: RatesConfig,
}

impl CoinGeckoRates {
    pub fn new(config: RatesConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("bounty-finder/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Coin ids keyed by canonical currency code
    fn coin_ids(&self) -> BTreeMap<String, String> {
        canonical_coin_ids(&self.config.coin_ids)
    }
}

#[async_trait]
impl RateSource for CoinGeckoRates {
    async fn fetch_rates(&self) -> Result<ConversionRates> {
        let coin_ids = self.coin_ids();
        let ids = coin_ids.values().cloned().collect::<Vec<_>>().join(",");

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[("ids", ids.as_str()), ("vs_currencies", "usd,eur,gbp")])
            .send()
            .await
            .context("Failed to reach the rates endpoint")?
            .error_for_status()
            .context("Rates endpoint returned an error")?;

        let prices: SimplePriceResponse = response
            .json()
            .await
            .context("Invalid JSON from the rates endpoint")?;

        let usd_prices = usd_prices_from_response(&coin_ids, &prices);
        tracing::info!("Fetched {} prices", usd_prices.len());

        Ok(ConversionRates::from_usd_prices(
            &self.config.reference,
            &usd_prices,
            &self.config.metal_usd_per_oz,
        ))
    }
}

/// Normalizes config keys (which may arrive lower-cased) to report codes
pub fn canonical_coin_ids(raw: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    raw.iter()
        .filter_map(|(code, id)| match code.parse::<BountyUnit>() {
            Ok(unit) => Some((unit.to_string(), id.clone())),
            Err(_) => {
                tracing::warn!("Ignoring unknown currency '{}' in rates.coin_ids", code);
                None
            }
        })
        .collect()
}

/// USD price per unit for every priced coin, plus EUR and GBP derived
/// from any coin that is quoted in all three fiat currencies.
pub fn usd_prices_from_response(
    coin_ids: &BTreeMap<String, String>,
    prices: &SimplePriceResponse,
) -> BTreeMap<String, f64> {
    let mut usd_prices = BTreeMap::new();

    for (code, id) in coin_ids {
        match prices.get(id).and_then(|p| p.get("usd")) {
            Some(usd) if *usd > 0.0 => {
                usd_prices.insert(code.clone(), *usd);
            }
            _ => tracing::warn!("No USD price for {} ({})", code, id),
        }
    }

    let fiat_quote = prices.values().find_map(|quote| {
        let usd = *quote.get("usd")?;
        let eur = *quote.get("eur")?;
        let gbp = *quote.get("gbp")?;
        (usd > 0.0 && eur > 0.0 && gbp > 0.0).then_some((usd, eur, gbp))
    });
    if let Some((usd, eur, gbp)) = fiat_quote {
        usd_prices.insert(Currency::Eur.code().to_string(), usd / eur);
        usd_prices.insert(Currency::Gbp.code().to_string(), usd / gbp);
    }
    usd_prices.insert(Currency::Usd.code().to_string(), 1.0);

    usd_prices
}
