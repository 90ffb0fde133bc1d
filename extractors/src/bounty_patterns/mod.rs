mod extractor;

pub use extractor::{
    extract_bounty, extract_from_labels, extract_from_text, is_bounty_candidate,
    BountyPatternExtractor, SearchMode,
};

use regex::{Captures, Regex};
use shared_types::{BountyMatch, BountyUnit, Currency, MassUnit, Metal};

const CRYPTO: &str = "sigusd|rsn|bene|erg|gort";
const TEXT_CURRENCY: &str = "sigusd|gort|rsn|bene|ergos?|erg|usd";
const MASS_UNIT: &str = "gram|g|oz|ounce";
const METAL: &str = "gold|silver|platinum";
const LABEL_INT: &str = "[0-9]+";
const DECIMAL: &str = r"[0-9]+(?:\.[0-9]+)?";
const MONEY: &str = r"[0-9]+(?:,[0-9]{3})*(?:\.[0-9]{2})?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Currency,
    Metal,
}

/// One family of bounty announcements, tried in table order
pub struct BountyPattern {
    pub name: String,
    pub regex: Regex,
    pub kind: PatternKind,
    pub amount_group: usize,
    /// Currency token, symbol, or mass unit depending on `kind`
    pub unit_group: Option<usize>,
    pub metal_group: Option<usize>,
    /// Used when the currency group is optional and did not participate
    pub default_currency: Option<Currency>,
}

impl BountyPattern {
    fn currency(name: &str, pattern: &str, unit_group: usize) -> Self {
        Self {
            name: name.to_string(),
            regex: compile(pattern),
            kind: PatternKind::Currency,
            amount_group: 1,
            unit_group: Some(unit_group),
            metal_group: None,
            default_currency: None,
        }
    }

    fn metal(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            regex: compile(pattern),
            kind: PatternKind::Metal,
            amount_group: 1,
            unit_group: Some(2),
            metal_group: Some(3),
            default_currency: None,
        }
    }

    fn with_default(mut self, currency: Currency) -> Self {
        self.default_currency = Some(currency);
        self
    }

    fn with_amount_group(mut self, amount_group: usize) -> Self {
        self.amount_group = amount_group;
        self
    }

    /// Returns the first acceptable match in `haystack`.
    ///
    /// After a rejected candidate the search resumes behind the number it
    /// captured. Any later candidate starting inside that number would be a
    /// fragment of it, so each digit run is visited once.
    pub fn find(&self, haystack: &str) -> Option<BountyMatch> {
        let mut start = 0;
        while start <= haystack.len() {
            let captures = self.regex.captures_at(haystack, start)?;
            let whole = captures.get(0)?;
            if let Some(bounty) = self.accept(haystack, &captures) {
                return Some(bounty);
            }
            let past_number = captures
                .get(self.amount_group)
                .map(|amount| numeric_run_end(haystack, amount.end()))
                .unwrap_or(0);
            start = next_char_boundary(haystack, whole.start()).max(past_number);
        }
        None
    }

    fn accept(&self, haystack: &str, captures: &Captures) -> Option<BountyMatch> {
        let amount = captures.get(self.amount_group)?;
        if !is_whole_number(haystack, amount.start(), amount.end()) {
            return None;
        }

        let unit = match self.kind {
            PatternKind::Metal => {
                let unit = MassUnit::from_token(captures.get(self.unit_group?)?.as_str())?;
                let metal = Metal::from_token(captures.get(self.metal_group?)?.as_str())?;
                BountyUnit::Commodity { unit, metal }
            }
            PatternKind::Currency => {
                let token = self.unit_group.and_then(|g| captures.get(g));
                match token {
                    Some(token) => Currency::from_token(token.as_str())?,
                    None => {
                        // A bare amount followed by a mass unit belongs to a metal family
                        if starts_with_metal_quantity(&haystack[amount.end()..]) {
                            return None;
                        }
                        self.default_currency?
                    }
                }
                .into()
            }
        };

        Some(BountyMatch::new(amount.as_str().replace(',', ""), unit))
    }
}

/// Families tested against each lower-cased label name, in priority order
pub fn create_label_patterns() -> Vec<BountyPattern> {
    vec![
        BountyPattern::currency(
            "label_bounty_prefix",
            &format!(r"bounty\s*-?\s*({LABEL_INT})\s*({CRYPTO})"),
            2,
        ),
        BountyPattern::currency(
            "label_b_prefix",
            &format!(r"b-({LABEL_INT})\s*({CRYPTO})"),
            2,
        ),
        BountyPattern::currency(
            "label_bounty_suffix",
            &format!(r"({LABEL_INT})\s*({CRYPTO})\s*bounty"),
            2,
        ),
        BountyPattern::metal(
            "label_metal_prefix",
            &format!(r"bounty\s*-?\s*({DECIMAL})\s*({MASS_UNIT})s?\s+(?:of\s+)?({METAL})"),
        ),
        BountyPattern::metal(
            "label_metal_suffix",
            &format!(r"({DECIMAL})\s*({MASS_UNIT})s?\s+(?:of\s+)?({METAL})\s*bounty"),
        ),
    ]
}

/// Families tested against the lower-cased `title + " " + body`, in priority order
pub fn create_text_patterns() -> Vec<BountyPattern> {
    vec![
        BountyPattern::currency(
            "text_bounty_prefix",
            &format!(r"bounty:?\s*[$€£]?\s*({MONEY})\s*({TEXT_CURRENCY}|dollars?|€|£|\$)?"),
            2,
        )
        .with_default(Currency::Usd),
        BountyPattern::currency(
            "text_symbol_amount",
            &format!(r"([$€£])\s*({MONEY})\s*(?:{TEXT_CURRENCY}|bounty)"),
            1,
        )
        .with_amount_group(2),
        BountyPattern::currency(
            "text_currency_suffix",
            &format!(r"({MONEY})\s*({TEXT_CURRENCY})\s*bounty"),
            2,
        ),
        BountyPattern::metal(
            "text_metal_prefix",
            &format!(r"bounty:?\s*({DECIMAL})\s*({MASS_UNIT})s?\s+(?:of\s+)?({METAL})"),
        ),
        BountyPattern::metal(
            "text_metal_suffix",
            &format!(r"({DECIMAL})\s*({MASS_UNIT})s?\s+(?:of\s+)?({METAL})\s*bounty"),
        ),
    ]
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("built-in bounty pattern {pattern:?} is invalid: {e}"))
}

/// The amount must not be a fragment of a longer number such as `1.5` or `12,3456`.
fn is_whole_number(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    if matches!(before, Some(c) if c.is_ascii_digit() || c == '.' || c == ',') {
        return false;
    }

    let mut after = haystack[end..].chars();
    match after.next() {
        Some(c) if c.is_ascii_digit() => false,
        Some('.') | Some(',') => !matches!(after.next(), Some(c) if c.is_ascii_digit()),
        _ => true,
    }
}

fn starts_with_metal_quantity(rest: &str) -> bool {
    static QUANTITY: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    QUANTITY
        .get_or_init(|| compile(&format!(r"^\s*(?:{MASS_UNIT})s?\s+(?:of\s+)?(?:{METAL})")))
        .is_match(rest)
}

/// End of the `[0-9.,]` run continuing at `from`
fn numeric_run_end(haystack: &str, from: usize) -> usize {
    from + haystack.as_bytes()[from..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.' || **b == b',')
        .count()
}

fn next_char_boundary(haystack: &str, index: usize) -> usize {
    haystack[index..]
        .chars()
        .next()
        .map(|c| index + c.len_utf8())
        .unwrap_or(haystack.len() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_compile() {
        assert_eq!(create_label_patterns().len(), 5);
        assert_eq!(create_text_patterns().len(), 5);
    }

    #[test]
    fn test_whole_number_boundaries() {
        let text = "bounty 2.5 oz";
        assert!(!is_whole_number(text, 7, 8));
        assert!(is_whole_number(text, 7, 10));
        assert!(is_whole_number("$100.", 1, 4));
        assert!(!is_whole_number("1,2345", 0, 5));
    }

    #[test]
    fn test_metal_quantity_lookahead() {
        assert!(starts_with_metal_quantity(" grams of gold"));
        assert!(starts_with_metal_quantity("oz silver"));
        assert!(!starts_with_metal_quantity(" for the fix"));
    }

    #[test]
    fn test_numeric_run_end() {
        assert_eq!(numeric_run_end("bounty 1.5 erg", 8), 10);
        assert_eq!(numeric_run_end("12,345,6 x", 2), 8);
        assert_eq!(numeric_run_end("40", 2), 2);
    }

    #[test]
    fn test_long_digit_run_is_scanned_once() {
        let pattern = &create_text_patterns()[2];
        let fragment = format!(".{} erg bounty", "1".repeat(65_000));
        assert_eq!(pattern.find(&fragment), None);

        let later = format!("{fragment}, and 40 erg bounty");
        let found = pattern.find(&later).unwrap();
        assert_eq!(found.amount, "40");
    }

    #[test]
    fn test_pattern_skips_rejected_candidate() {
        let pattern = &create_text_patterns()[0];
        let found = pattern
            .find("bounty 2.5 erg, final bounty: 40 erg")
            .unwrap();
        assert_eq!(found.amount, "40");
        assert_eq!(found.unit, BountyUnit::Currency(Currency::Erg));
    }
}
