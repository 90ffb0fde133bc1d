use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display string used for both amount and currency when no bounty was found
pub const NOT_SPECIFIED: &str = "Not specified";

/// Currencies a bounty can be paid in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "ERG")]
    Erg,
    #[serde(rename = "SigUSD")]
    SigUsd,
    #[serde(rename = "RSN")]
    Rsn,
    #[serde(rename = "BENE")]
    Bene,
    #[serde(rename = "GORT")]
    Gort,
}

impl Currency {
    /// Report code. SigUSD keeps its mixed-case spelling.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Erg => "ERG",
            Currency::SigUsd => "SigUSD",
            Currency::Rsn => "RSN",
            Currency::Bene => "BENE",
            Currency::Gort => "GORT",
        }
    }

    /// Maps a token found in bounty text (symbol, code or word) to a currency.
    /// Matching is case-insensitive.
    ///
    /// Spelled-out variants fold into their code: `dollar` is USD and `ergo`
    /// is ERG. Tokens outside the table are not upper-cased into ad-hoc codes;
    /// they yield `None` and the pattern that captured them does not match.
    pub fn from_token(token: &str) -> Option<Self> {
        let currency = match token.trim().to_lowercase().as_str() {
            "$" | "usd" | "dollar" | "dollars" => Currency::Usd,
            "€" | "eur" | "euro" | "euros" => Currency::Eur,
            "£" | "gbp" => Currency::Gbp,
            "erg" | "ergo" | "ergos" => Currency::Erg,
            "sigusd" => Currency::SigUsd,
            "rsn" => Currency::Rsn,
            "bene" => Currency::Bene,
            "gort" => Currency::Gort,
            _ => return None,
        };
        Some(currency)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Metal {
    #[serde(alias = "gold")]
    Gold,
    #[serde(alias = "silver")]
    Silver,
    #[serde(alias = "platinum")]
    Platinum,
}

impl Metal {
    pub fn name(&self) -> &'static str {
        match self {
            Metal::Gold => "GOLD",
            Metal::Silver => "SILVER",
            Metal::Platinum => "PLATINUM",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "gold" => Some(Metal::Gold),
            "silver" => Some(Metal::Silver),
            "platinum" => Some(Metal::Platinum),
            _ => None,
        }
    }
}

impl fmt::Display for Metal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mass units accepted for precious metal bounties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MassUnit {
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "oz")]
    TroyOunce,
}

impl MassUnit {
    pub const GRAMS_PER_TROY_OUNCE: f64 = 31.103_476_8;

    pub fn symbol(&self) -> &'static str {
        match self {
            MassUnit::Gram => "g",
            MassUnit::TroyOunce => "oz",
        }
    }

    /// Accepts singular and plural spellings (`gram`, `grams`, `g`, `oz`, `ounce`, `ounces`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Some(MassUnit::Gram),
            "oz" | "ounce" | "ounces" => Some(MassUnit::TroyOunce),
            _ => None,
        }
    }
}

/// What a bounty amount is denominated in.
///
/// Serialized as its display string (`"ERG"`, `"SigUSD"`, `"g GOLD"`), the same
/// text the reports print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BountyUnit {
    Currency(Currency),
    Commodity { unit: MassUnit, metal: Metal },
}

impl fmt::Display for BountyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BountyUnit::Currency(currency) => write!(f, "{}", currency),
            BountyUnit::Commodity { unit, metal } => write!(f, "{} {}", unit.symbol(), metal),
        }
    }
}

impl From<Currency> for BountyUnit {
    fn from(currency: Currency) -> Self {
        BountyUnit::Currency(currency)
    }
}

impl FromStr for BountyUnit {
    type Err = crate::TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some((unit, metal)) = trimmed.split_once(' ') {
            let unit = MassUnit::from_token(unit)
                .ok_or_else(|| crate::TypeError::UnknownUnit(trimmed.to_string()))?;
            let metal = Metal::from_token(metal)
                .ok_or_else(|| crate::TypeError::UnknownUnit(trimmed.to_string()))?;
            return Ok(BountyUnit::Commodity { unit, metal });
        }

        Currency::from_token(trimmed)
            .map(BountyUnit::Currency)
            .ok_or_else(|| crate::TypeError::UnknownUnit(trimmed.to_string()))
    }
}

impl From<BountyUnit> for String {
    fn from(unit: BountyUnit) -> Self {
        unit.to_string()
    }
}

impl TryFrom<String> for BountyUnit {
    type Error = crate::TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A bounty amount and the unit it is denominated in.
///
/// The amount keeps the text as written (minus thousands separators) so reports
/// can echo it verbatim; use [`BountyMatch::numeric_amount`] for arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BountyMatch {
    pub amount: String,
    pub unit: BountyUnit,
}

impl BountyMatch {
    pub fn new(amount: impl Into<String>, unit: BountyUnit) -> Self {
        Self {
            amount: amount.into(),
            unit,
        }
    }

    pub fn numeric_amount(&self) -> Option<f64> {
        self.amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
    }

    /// Builds a match from report strings, treating the sentinel as absent.
    pub fn from_display(amount: &str, currency: &str) -> Result<Option<Self>, crate::TypeError> {
        if amount == NOT_SPECIFIED || currency == NOT_SPECIFIED {
            return Ok(None);
        }
        Ok(Some(Self::new(amount.replace(',', ""), currency.parse()?)))
    }
}

/// Amount column as shown in reports.
pub fn amount_display(bounty: Option<&BountyMatch>) -> String {
    bounty
        .map(|b| b.amount.clone())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

/// Currency column as shown in reports.
pub fn unit_display(bounty: Option<&BountyMatch>) -> String {
    bounty
        .map(|b| b.unit.to_string())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_display() {
        assert_eq!(BountyUnit::Currency(Currency::SigUsd).to_string(), "SigUSD");
        assert_eq!(BountyUnit::Currency(Currency::Erg).to_string(), "ERG");
        assert_eq!(
            BountyUnit::Commodity {
                unit: MassUnit::Gram,
                metal: Metal::Gold
            }
            .to_string(),
            "g GOLD"
        );
    }

    #[test]
    fn test_unit_parse() {
        assert_eq!(
            "oz SILVER".parse::<BountyUnit>().unwrap(),
            BountyUnit::Commodity {
                unit: MassUnit::TroyOunce,
                metal: Metal::Silver
            }
        );
        assert_eq!(
            "SigUSD".parse::<BountyUnit>().unwrap(),
            BountyUnit::Currency(Currency::SigUsd)
        );
        assert!("DOGE".parse::<BountyUnit>().is_err());
        assert!("kg GOLD".parse::<BountyUnit>().is_err());
    }

    #[test]
    fn test_currency_tokens() {
        assert_eq!(Currency::from_token("$"), Some(Currency::Usd));
        assert_eq!(Currency::from_token("dollars"), Some(Currency::Usd));
        assert_eq!(Currency::from_token("€"), Some(Currency::Eur));
        assert_eq!(Currency::from_token("£"), Some(Currency::Gbp));
        assert_eq!(Currency::from_token("ergos"), Some(Currency::Erg));
        assert_eq!(Currency::from_token("SIGUSD"), Some(Currency::SigUsd));
        assert_eq!(Currency::from_token("btc"), None);
    }

    #[test]
    fn test_serde_uses_display_string() {
        let bounty = BountyMatch::new("25", BountyUnit::Currency(Currency::SigUsd));
        let json = serde_json::to_string(&bounty).unwrap();
        assert_eq!(json, r#"{"amount":"25","unit":"SigUSD"}"#);

        let back: BountyMatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bounty);
    }

    #[test]
    fn test_numeric_amount() {
        let unit = BountyUnit::Currency(Currency::Usd);
        assert_eq!(BountyMatch::new("1250.00", unit).numeric_amount(), Some(1250.0));
        assert_eq!(BountyMatch::new("abc", unit).numeric_amount(), None);
    }

    #[test]
    fn test_not_specified_display() {
        assert_eq!(amount_display(None), NOT_SPECIFIED);
        assert_eq!(unit_display(None), NOT_SPECIFIED);
        assert_eq!(
            BountyMatch::from_display(NOT_SPECIFIED, NOT_SPECIFIED).unwrap(),
            None
        );
        assert_eq!(
            BountyMatch::from_display("1,000", "ERG").unwrap(),
            Some(BountyMatch::new("1000", BountyUnit::Currency(Currency::Erg)))
        );
    }
}
