use crate::bounty::Currency;
use serde::{Deserialize, Serialize};

/// User supplied bounty pattern, appended after the built-in families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPattern {
    pub name: String,
    /// `labels` or `text`
    pub mode: String,
    /// Matched against lower-cased input
    pub regex: String,
    /// `currency` or `metal`
    pub kind: String,
    pub amount_group: usize,
    #[serde(default)]
    pub unit_group: Option<usize>,
    #[serde(default)]
    pub metal_group: Option<usize>,
    #[serde(default)]
    pub default_currency: Option<Currency>,
}
