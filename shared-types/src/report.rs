use crate::bounty::{amount_display, unit_display, BountyMatch, BountyUnit, Currency, MassUnit, Metal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNKNOWN_LANGUAGE: &str = "Unknown";
pub const NO_SECONDARY_LANGUAGE: &str = "None";

/// One bounty-tagged issue after extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BountyRecord {
    pub timestamp: String,
    pub owner: String,
    pub repo: String,
    pub title: String,
    pub url: String,
    pub bounty: Option<BountyMatch>,
    pub primary_lang: String,
    pub secondary_lang: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl BountyRecord {
    pub fn amount_display(&self) -> String {
        amount_display(self.bounty.as_ref())
    }

    pub fn unit_display(&self) -> String {
        unit_display(self.bounty.as_ref())
    }

    /// A standing program rather than a one-off bounty: the unit is known
    /// but the amount is free text such as `Ongoing` or `Varies`.
    pub fn is_ongoing_program(&self) -> bool {
        matches!(&self.bounty, Some(b) if b.numeric_amount().is_none())
    }
}

/// Entry of `extra_bounties.json`: bounties announced outside GitHub issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraBounty {
    pub owner: String,
    pub repo: String,
    pub title: String,
    pub url: String,
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub primary_lang: Option<String>,
    #[serde(default)]
    pub secondary_lang: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Count and reference-currency value of bounties
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectTotals {
    pub count: usize,
    pub value: f64,
}

/// Price table: how many units of the reference currency one unit of a bounty unit is worth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionRates {
    pub reference: String,
    pub rates: BTreeMap<String, f64>,
}

impl ConversionRates {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            rates: BTreeMap::new(),
        }
    }

    /// Builds the table from USD prices.
    ///
    /// `usd_prices` maps unit display strings (`"ERG"`, `"RSN"`) to USD per unit;
    /// `metal_usd_per_oz` maps metals to USD per troy ounce. Units without a
    /// price, and every unit when the reference has no price, are left out.
    pub fn from_usd_prices(
        reference: &str,
        usd_prices: &BTreeMap<String, f64>,
        metal_usd_per_oz: &BTreeMap<Metal, f64>,
    ) -> Self {
        let mut table = Self::new(reference);

        let reference_usd = if reference == Currency::Usd.code() {
            Some(1.0)
        } else {
            usd_prices.get(reference).copied()
        };
        let Some(reference_usd) = reference_usd.filter(|p| *p > 0.0) else {
            return table;
        };

        for (unit, usd) in usd_prices {
            if *usd > 0.0 {
                table.rates.insert(unit.clone(), usd / reference_usd);
            }
        }
        table
            .rates
            .entry(Currency::Usd.code().to_string())
            .or_insert(1.0 / reference_usd);

        for (metal, usd_per_oz) in metal_usd_per_oz {
            if *usd_per_oz <= 0.0 {
                continue;
            }
            let per_oz = usd_per_oz / reference_usd;
            let ounce = BountyUnit::Commodity {
                unit: MassUnit::TroyOunce,
                metal: *metal,
            };
            let gram = BountyUnit::Commodity {
                unit: MassUnit::Gram,
                metal: *metal,
            };
            table.rates.insert(ounce.to_string(), per_oz);
            table
                .rates
                .insert(gram.to_string(), per_oz / MassUnit::GRAMS_PER_TROY_OUNCE);
        }

        table.rates.insert(reference.to_string(), 1.0);
        table
    }

    pub fn rate_for(&self, unit: &BountyUnit) -> Option<f64> {
        let key = unit.to_string();
        if key == self.reference {
            return Some(1.0);
        }
        self.rates.get(&key).copied()
    }

    /// Reference-currency value of a bounty, if its amount parses and a rate is known
    pub fn value_of(&self, bounty: &BountyMatch) -> Option<f64> {
        Some(bounty.numeric_amount()? * self.rate_for(&bounty.unit)?)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
