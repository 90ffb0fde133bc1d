use crate::bounty_patterns::{create_label_patterns, create_text_patterns, BountyPattern, PatternKind};
use crate::ExtractionError;
use regex::Regex;
use shared_types::{BountyMatch, CustomPattern, Issue, Label};
use std::sync::OnceLock;

/// Where a pattern table is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Each label name separately; the first label with a match wins
    Labels,
    /// The joined issue title and body
    Text,
}

pub struct BountyPatternExtractor {
    label_patterns: Vec<BountyPattern>,
    text_patterns: Vec<BountyPattern>,
}

impl BountyPatternExtractor {
    pub fn new() -> Self {
        Self {
            label_patterns: create_label_patterns(),
            text_patterns: create_text_patterns(),
        }
    }

    /// Process-wide extractor with the built-in tables
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<BountyPatternExtractor> = OnceLock::new();
        SHARED.get_or_init(Self::new)
    }

    /// Built-in tables followed by user supplied families.
    ///
    /// Custom families have the lowest priority within their mode.
    pub fn with_custom_patterns(custom: &[CustomPattern]) -> Result<Self, ExtractionError> {
        let mut extractor = Self::new();

        for pattern in custom {
            let compiled = compile_custom(pattern)?;
            match pattern.mode.as_str() {
                "labels" => extractor.label_patterns.push(compiled),
                "text" => extractor.text_patterns.push(compiled),
                other => {
                    return Err(ExtractionError::InvalidPattern {
                        name: pattern.name.clone(),
                        reason: format!("unknown mode '{}', expected 'labels' or 'text'", other),
                    })
                }
            }
        }

        Ok(extractor)
    }

    pub fn patterns(&self, mode: SearchMode) -> &[BountyPattern] {
        match mode {
            SearchMode::Labels => &self.label_patterns,
            SearchMode::Text => &self.text_patterns,
        }
    }

    /// Runs the table for `mode` over the haystacks in order.
    ///
    /// Haystacks are lower-cased here. Within one haystack the first family
    /// with any acceptable match decides; family order beats match position.
    pub fn search<'a, I>(&self, mode: SearchMode, haystacks: I) -> Option<BountyMatch>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let patterns = self.patterns(mode);
        haystacks.into_iter().find_map(|haystack| {
            let haystack = haystack.to_lowercase();
            patterns.iter().find_map(|pattern| pattern.find(&haystack))
        })
    }

    pub fn extract_from_labels(&self, labels: &[Label]) -> Option<BountyMatch> {
        self.search(SearchMode::Labels, labels.iter().map(|l| l.name.as_str()))
    }

    pub fn extract_from_text(&self, title: &str, body: &str) -> Option<BountyMatch> {
        let text = format!("{} {}", title, body);
        self.search(SearchMode::Text, [text.as_str()])
    }

    /// Labels first, then title and body
    pub fn extract_from_issue(&self, issue: &Issue) -> Option<BountyMatch> {
        self.extract_from_labels(&issue.labels)
            .or_else(|| self.extract_from_text(&issue.title, issue.body_text()))
    }
}

impl Default for BountyPatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

pub fn extract_from_labels(labels: &[Label]) -> Option<BountyMatch> {
    BountyPatternExtractor::shared().extract_from_labels(labels)
}

pub fn extract_from_text(title: &str, body: &str) -> Option<BountyMatch> {
    BountyPatternExtractor::shared().extract_from_text(title, body)
}

pub fn extract_bounty(issue: &Issue) -> Option<BountyMatch> {
    BountyPatternExtractor::shared().extract_from_issue(issue)
}

/// Whether an issue looks like a bounty at all: `bounty` or `b-` in the
/// title or in any label name.
pub fn is_bounty_candidate(issue: &Issue) -> bool {
    let mentions_bounty = |s: &str| {
        let s = s.to_lowercase();
        s.contains("bounty") || s.contains("b-")
    };
    mentions_bounty(&issue.title) || issue.labels.iter().any(|l| mentions_bounty(&l.name))
}

fn compile_custom(pattern: &CustomPattern) -> Result<BountyPattern, ExtractionError> {
    let invalid = |reason: String| ExtractionError::InvalidPattern {
        name: pattern.name.clone(),
        reason,
    };

    let regex = Regex::new(&pattern.regex).map_err(|e| invalid(e.to_string()))?;
    let kind = match pattern.kind.as_str() {
        "currency" => PatternKind::Currency,
        "metal" => PatternKind::Metal,
        other => return Err(invalid(format!("unknown kind '{}'", other))),
    };

    let group_count = regex.captures_len();
    let groups = [Some(pattern.amount_group), pattern.unit_group, pattern.metal_group];
    if let Some(bad) = groups.into_iter().flatten().find(|g| *g == 0 || *g >= group_count) {
        return Err(invalid(format!(
            "group {} does not exist (regex has {} groups)",
            bad,
            group_count.saturating_sub(1)
        )));
    }

    if kind == PatternKind::Metal && (pattern.unit_group.is_none() || pattern.metal_group.is_none()) {
        return Err(invalid("metal patterns need unit_group and metal_group".to_string()));
    }
    if kind == PatternKind::Currency
        && pattern.unit_group.is_none()
        && pattern.default_currency.is_none()
    {
        return Err(invalid(
            "currency patterns need unit_group or default_currency".to_string(),
        ));
    }

    Ok(BountyPattern {
        name: pattern.name.clone(),
        regex,
        kind,
        amount_group: pattern.amount_group,
        unit_group: pattern.unit_group,
        metal_group: pattern.metal_group,
        default_currency: pattern.default_currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BountyUnit, Currency, IssueState, MassUnit, Metal};

    fn labels(names: &[&str]) -> Vec<Label> {
        names.iter().map(|n| Label::new(*n)).collect()
    }

    fn found(amount: &str, unit: &str) -> Option<BountyMatch> {
        Some(BountyMatch::new(amount, unit.parse::<BountyUnit>().unwrap()))
    }

    fn issue(title: &str, body: Option<&str>, label_names: &[&str]) -> Issue {
        Issue {
            title: title.to_string(),
            body: body.map(str::to_string),
            labels: labels(label_names),
            state: IssueState::Open,
            html_url: "https://github.com/ergoplatform/ergo/issues/1".to_string(),
            pull_request: None,
        }
    }

    #[test]
    fn test_label_bounty_prefix() {
        assert_eq!(extract_from_labels(&labels(&["bounty-100erg"])), found("100", "ERG"));
        assert_eq!(extract_from_labels(&labels(&["Bounty 100 ERG"])), found("100", "ERG"));
        assert_eq!(
            extract_from_labels(&labels(&["help wanted", "bounty100erg"])),
            found("100", "ERG")
        );
    }

    #[test]
    fn test_label_b_prefix_keeps_sigusd_casing() {
        assert_eq!(extract_from_labels(&labels(&["b-25 sigusd"])), found("25", "SigUSD"));
        assert_eq!(extract_from_labels(&labels(&["B-40RSN"])), found("40", "RSN"));
    }

    #[test]
    fn test_label_suffix_forms() {
        assert_eq!(extract_from_labels(&labels(&["500 gort bounty"])), found("500", "GORT"));
        assert_eq!(
            extract_from_labels(&labels(&["2 oz of platinum bounty"])),
            found("2", "oz PLATINUM")
        );
    }

    #[test]
    fn test_label_metal_units_normalized() {
        let gold = extract_from_labels(&labels(&["bounty-50g gold"])).unwrap();
        assert_eq!(gold.amount, "50");
        assert_eq!(
            gold.unit,
            BountyUnit::Commodity {
                unit: MassUnit::Gram,
                metal: Metal::Gold
            }
        );
        assert_eq!(gold.unit.to_string(), "g GOLD");

        assert_eq!(
            extract_from_labels(&labels(&["bounty 1.5 ounces of silver"])),
            found("1.5", "oz SILVER")
        );
        assert_eq!(
            extract_from_labels(&labels(&["bounty 10 grams gold"])),
            found("10", "g GOLD")
        );
    }

    #[test]
    fn test_first_matching_label_wins() {
        assert_eq!(
            extract_from_labels(&labels(&["b-10 bene", "bounty-100erg"])),
            found("10", "BENE")
        );
    }

    #[test]
    fn test_family_order_within_label() {
        // family 1 (bounty prefix) is tried before family 3 (bounty suffix)
        assert_eq!(
            extract_from_labels(&labels(&["5 rsn bounty 7 erg"])),
            found("7", "ERG")
        );
    }

    #[test]
    fn test_labels_without_bounty() {
        assert_eq!(extract_from_labels(&labels(&["bug", "good first issue"])), None);
        assert_eq!(extract_from_labels(&labels(&["bounty"])), None);
        assert_eq!(extract_from_labels(&[]), None);
    }

    #[test]
    fn test_text_dollar_amount_strips_separators() {
        assert_eq!(
            extract_from_text("Bounty: $1,250.00 for this fix", ""),
            found("1250.00", "USD")
        );
    }

    #[test]
    fn test_text_prefix_currency_tokens() {
        assert_eq!(extract_from_text("bounty: 300 erg", ""), found("300", "ERG"));
        assert_eq!(extract_from_text("Bounty 20 ergos", ""), found("20", "ERG"));
        assert_eq!(extract_from_text("bounty 75 sigusd", ""), found("75", "SigUSD"));
        assert_eq!(extract_from_text("bounty 40 dollars", ""), found("40", "USD"));
        assert_eq!(extract_from_text("bounty: 100€", ""), found("100", "EUR"));
        assert_eq!(extract_from_text("Add feature", "bounty: 60"), found("60", "USD"));
    }

    #[test]
    fn test_text_symbol_implies_currency() {
        assert_eq!(
            extract_from_text("Implement wallet export", "We offer €500 bounty"),
            found("500", "EUR")
        );
        assert_eq!(
            extract_from_text("Refactor", "£1,000 bounty for this"),
            found("1000", "GBP")
        );
        assert_eq!(extract_from_text("Refactor", "$50 usd on completion"), found("50", "USD"));
        // the keyword only anchors the match
        assert_eq!(extract_from_text("Refactor", "$50 sigusd on completion"), found("50", "USD"));
        assert_eq!(extract_from_text("Refactor", "€20 erg"), found("20", "EUR"));
    }

    #[test]
    fn test_spelled_out_tokens_fold_into_codes() {
        assert_eq!(extract_from_text("bounty 5 ergo", ""), found("5", "ERG"));
        assert_eq!(extract_from_text("bounty 5 dollar", ""), found("5", "USD"));
    }

    #[test]
    fn test_long_number_fragment_in_body() {
        let body = format!(".{} erg bounty", "1".repeat(65_000));
        assert_eq!(extract_from_text("x", &body), None);
    }

    #[test]
    fn test_text_currency_suffix() {
        assert_eq!(
            extract_from_text("Node sync fix", "There is a 250 rsn bounty"),
            found("250", "RSN")
        );
    }

    #[test]
    fn test_text_metal() {
        assert_eq!(
            extract_from_text("bounty 2.5 oz of silver available", ""),
            found("2.5", "oz SILVER")
        );
        assert_eq!(
            extract_from_text("Docs", "Reward: 3 grams of gold bounty"),
            found("3", "g GOLD")
        );
        assert_eq!(
            extract_from_text("Bounty: 10 grams of gold", ""),
            found("10", "g GOLD")
        );
    }

    #[test]
    fn test_text_family_order_beats_position() {
        // the metal mention comes first but currency families have priority
        assert_eq!(
            extract_from_text("1 oz gold bounty", "or bounty: 90 erg"),
            found("90", "ERG")
        );
    }

    #[test]
    fn test_text_without_bounty() {
        assert_eq!(extract_from_text("Fix typo in README", ""), None);
        assert_eq!(extract_from_text("Fix typo in README", "costs $5 to host"), None);
        assert_eq!(extract_from_labels(&labels(&["Fix typo in README"])), None);
    }

    #[test]
    fn test_text_non_ascii_input() {
        assert_eq!(extract_from_text("Ünïcødé ✓ title", "日本語 body"), None);
        assert_eq!(extract_from_text("ÜBER bounty: 12 erg", ""), found("12", "ERG"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let names = labels(&["bounty-100erg"]);
        assert_eq!(extract_from_labels(&names), extract_from_labels(&names));
        assert_eq!(
            extract_from_text("Bounty: $1,250.00", "body"),
            extract_from_text("Bounty: $1,250.00", "body")
        );
    }

    #[test]
    fn test_labels_take_priority_over_text() {
        let labelled = issue("Bounty: $1,250.00", Some("bounty 300 erg"), &["b-25 sigusd"]);
        assert_eq!(extract_bounty(&labelled), found("25", "SigUSD"));

        let unlabelled = issue("Node: sync bug", Some("bounty 300 erg"), &["help wanted"]);
        assert_eq!(extract_bounty(&unlabelled), found("300", "ERG"));
    }

    #[test]
    fn test_unspecified_issue() {
        let issue = issue("Bounty: TBD", None, &["bounty"]);
        assert_eq!(extract_bounty(&issue), None);
    }

    #[test]
    fn test_bounty_candidate_filter() {
        assert!(is_bounty_candidate(&issue("BOUNTY: docs", None, &[])));
        assert!(is_bounty_candidate(&issue("Docs", None, &["B-100 erg"])));
        assert!(!is_bounty_candidate(&issue("Docs", Some("bounty 5 erg"), &["docs"])));
    }

    #[test]
    fn test_custom_pattern_runs_after_builtins() {
        let custom = CustomPattern {
            name: "reward_erg".to_string(),
            mode: "text".to_string(),
            regex: r"reward of ([0-9]+) (erg)".to_string(),
            kind: "currency".to_string(),
            amount_group: 1,
            unit_group: Some(2),
            metal_group: None,
            default_currency: None,
        };
        let extractor = BountyPatternExtractor::with_custom_patterns(&[custom]).unwrap();

        assert_eq!(extractor.patterns(SearchMode::Text).len(), 6);
        assert_eq!(
            extractor.extract_from_text("Reward of 30 ERG", ""),
            found("30", "ERG")
        );
        assert_eq!(
            extractor.extract_from_text("Reward of 30 ERG", "bounty: 5 rsn"),
            found("5", "RSN")
        );
    }

    #[test]
    fn test_custom_pattern_validation() {
        let mut custom = CustomPattern {
            name: "broken".to_string(),
            mode: "labels".to_string(),
            regex: r"prize ([0-9]+)".to_string(),
            kind: "currency".to_string(),
            amount_group: 1,
            unit_group: Some(2),
            metal_group: None,
            default_currency: None,
        };
        assert!(BountyPatternExtractor::with_custom_patterns(&[custom.clone()]).is_err());

        custom.unit_group = None;
        assert!(BountyPatternExtractor::with_custom_patterns(&[custom.clone()]).is_err());

        custom.default_currency = Some(Currency::Erg);
        let extractor = BountyPatternExtractor::with_custom_patterns(&[custom.clone()]).unwrap();
        assert_eq!(
            extractor.extract_from_labels(&labels(&["prize 7"])),
            found("7", "ERG")
        );

        custom.mode = "title".to_string();
        assert!(BountyPatternExtractor::with_custom_patterns(&[custom]).is_err());
    }
}
