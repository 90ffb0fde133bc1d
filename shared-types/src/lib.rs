pub mod bounty;
pub mod issue;
pub mod pattern;
pub mod report;

pub use bounty::{
    amount_display, unit_display, BountyMatch, BountyUnit, Currency, MassUnit, Metal,
    NOT_SPECIFIED,
};
pub use issue::{
    Issue, IssueState, Label, OrgRepository, RepositoryOwner, TrackedOrg, TrackedRepo,
};
pub use pattern::CustomPattern;
pub use report::{
    BountyRecord, ConversionRates, ExtraBounty, ProjectTotals, NO_SECONDARY_LANGUAGE,
    UNKNOWN_LANGUAGE,
};

/// Errors raised when parsing shared types from strings
#[derive(Debug, thiserror::Error)]
pub enum TypeError {
    #[error("Unknown bounty unit: {0}")]
    UnknownUnit(String),
}
