//! Extractors Crate
//!
//! Turns GitHub issues into bounty amounts and rolls them up into totals.
//!
//! # Architecture
//!
//! - **Types**: Issue, label and bounty types live in the `shared-types` crate
//! - **Patterns**: `bounty_patterns` holds the ordered pattern tables and the extractor
//! - **Aggregation**: `aggregation` sums and groups extracted records
//!
//! # Example
//!
//! ```rust
//! use extractors::{extract_from_labels, extract_from_text};
//! use shared_types::Label;
//!
//! let found = extract_from_labels(&[Label::new("b-25 sigusd")]).unwrap();
//! assert_eq!(found.amount, "25");
//! assert_eq!(found.unit.to_string(), "SigUSD");
//!
//! assert!(extract_from_text("Fix typo in README", "").is_none());
//! ```

pub mod aggregation;
pub mod bounty_patterns;

pub use aggregation::{
    group_by_currency, group_by_language, group_by_organization, total_value, BountyTotals,
    Grouped,
};
pub use bounty_patterns::{
    extract_bounty, extract_from_labels, extract_from_text, is_bounty_candidate,
    BountyPatternExtractor, SearchMode,
};

/// Extraction error types
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Invalid pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },
}
