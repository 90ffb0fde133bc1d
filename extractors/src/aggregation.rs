//! Totals and groupings over extracted bounty records.
//!
//! The accumulator is a plain value owned by the caller; nothing here keeps
//! global state.

use shared_types::{BountyRecord, ConversionRates, ProjectTotals};
use std::collections::BTreeMap;

/// Running counts and reference-currency values per owner
#[derive(Debug, Clone, Default)]
pub struct BountyTotals {
    per_owner: BTreeMap<String, ProjectTotals>,
}

impl BountyTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the record and adds its converted value when it can be computed.
    ///
    /// Amounts that do not parse, or units without a rate, add to the count only.
    pub fn record(&mut self, record: &BountyRecord, rates: &ConversionRates) {
        let totals = self.per_owner.entry(record.owner.clone()).or_default();
        totals.count += 1;

        match record.bounty.as_ref().and_then(|b| rates.value_of(b)) {
            Some(value) => totals.value += value,
            None => tracing::debug!(
                owner = %record.owner,
                url = %record.url,
                amount = %record.amount_display(),
                unit = %record.unit_display(),
                "bounty value not included in totals"
            ),
        }
    }

    pub fn from_records(records: &[BountyRecord], rates: &ConversionRates) -> Self {
        let mut totals = Self::new();
        for record in records {
            totals.record(record, rates);
        }
        totals
    }

    pub fn per_owner(&self) -> &BTreeMap<String, ProjectTotals> {
        &self.per_owner
    }

    pub fn overall(&self) -> ProjectTotals {
        self.per_owner
            .values()
            .fold(ProjectTotals::default(), |acc, t| ProjectTotals {
                count: acc.count + t.count,
                value: acc.value + t.value,
            })
    }
}

/// Records grouped by a key, each group keeping input order
pub type Grouped<'a> = BTreeMap<String, Vec<&'a BountyRecord>>;

fn group_by<'a, F>(records: &'a [BountyRecord], key: F) -> Grouped<'a>
where
    F: Fn(&BountyRecord) -> String,
{
    let mut groups: Grouped<'a> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
}

pub fn group_by_language(records: &[BountyRecord]) -> Grouped<'_> {
    group_by(records, |r| r.primary_lang.clone())
}

pub fn group_by_organization(records: &[BountyRecord]) -> Grouped<'_> {
    group_by(records, |r| r.owner.clone())
}

/// Groups by the report currency column, so unspecified bounties form their own group
pub fn group_by_currency(records: &[BountyRecord]) -> Grouped<'_> {
    group_by(records, |r| r.unit_display())
}

/// Sum of the converted values of `records`
pub fn total_value(records: &[&BountyRecord], rates: &ConversionRates) -> f64 {
    records
        .iter()
        .filter_map(|r| r.bounty.as_ref().and_then(|b| rates.value_of(b)))
        .sum()
}
