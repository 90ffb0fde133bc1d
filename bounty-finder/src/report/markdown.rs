use super::{page_name, PageNames, ReportContext};
use extractors::{total_value, BountyTotals, Grouped};
use shared_types::{BountyRecord, ConversionRates};
use std::fmt::Write;

const FEATURED_LIMIT: usize = 5;

/// Escapes text for use inside a markdown table cell
pub fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn value_cell(record: &BountyRecord, rates: &ConversionRates) -> String {
    record
        .bounty
        .as_ref()
        .and_then(|b| rates.value_of(b))
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "-".to_string())
}

fn header(out: &mut String, title: &str, ctx: &ReportContext) {
    let overall = ctx.totals.overall();
    let _ = writeln!(out, "# {}\n", title);
    let _ = writeln!(out, "*Report generated: {}*\n", ctx.generated_at);
    let _ = writeln!(
        out,
        "**{}** bounties worth **{:.2} {}** across {} languages, {} currencies and {} organizations.\n",
        overall.count,
        overall.value,
        ctx.rates.reference,
        ctx.languages.len(),
        ctx.currencies.len(),
        ctx.orgs.len()
    );
    let _ = writeln!(
        out,
        "[All bounties](all.md) · [Summary](summary.md) · [Featured](featured.md) · [Ongoing programs](ongoing_programs.md) · [Currency prices](currency_prices.md)\n"
    );
}

fn bounty_table(out: &mut String, ctx: &ReportContext, records: &[&BountyRecord], depth: usize) {
    let rates = ctx.rates;
    let _ = writeln!(
        out,
        "| Organization | Repository | Title & Link | Amount | Currency | Value ({}) | Language |",
        rates.reference
    );
    let _ = writeln!(out, "|---|---|---|---|---|---|---|");

    let prefix = "../".repeat(depth);
    for record in records {
        let _ = writeln!(
            out,
            "| [{owner}]({prefix}by_org/{owner_slug}.md) | {repo} | [{title}]({url}) | {amount} | {unit} | {value} | [{lang}]({prefix}by_language/{lang_slug}.md) |",
            owner = cell(&record.owner),
            owner_slug = page_name(&ctx.org_pages, &record.owner),
            repo = cell(&record.repo),
            title = cell(&record.title),
            url = record.url,
            amount = cell(&record.amount_display()),
            unit = cell(&record.unit_display()),
            value = value_cell(record, rates),
            lang = cell(&record.primary_lang),
            lang_slug = page_name(&ctx.language_pages, &record.primary_lang),
        );
    }
    out.push('\n');
}

fn totals_table(out: &mut String, heading: &str, totals: &BountyTotals, reference: &str) {
    let _ = writeln!(out, "| {} | Count | {} Equivalent |", heading, reference);
    let _ = writeln!(out, "|---|---|---|");
    for (owner, t) in totals.per_owner() {
        if t.count > 0 {
            let _ = writeln!(out, "| {} | {} | {:.2} |", cell(owner), t.count, t.value);
        }
    }
    let overall = totals.overall();
    let _ = writeln!(
        out,
        "| **Overall Total** | **{}** | **{:.2}** |\n",
        overall.count, overall.value
    );
}

fn group_table(
    out: &mut String,
    heading: &str,
    dir: &str,
    groups: &Grouped<'_>,
    pages: &PageNames,
    rates: &ConversionRates,
) {
    let _ = writeln!(out, "| {} | Count | {} Equivalent |", heading, rates.reference);
    let _ = writeln!(out, "|---|---|---|");
    for (key, records) in groups {
        let _ = writeln!(
            out,
            "| [{}]({}/{}.md) | {} | {:.2} |",
            cell(key),
            dir,
            page_name(pages, key),
            records.len(),
            total_value(records, rates)
        );
    }
    out.push('\n');
}

/// `all.md`: per-owner totals, every bounty, and the repositories scanned
pub fn main_page(ctx: &ReportContext) -> String {
    let mut out = String::new();
    header(&mut out, "Open Bounties", ctx);

    let _ = writeln!(out, "## Summary\n");
    totals_table(&mut out, "Project", ctx.totals, &ctx.rates.reference);

    let _ = writeln!(out, "## Detailed Bounties\n");
    let all: Vec<&BountyRecord> = ctx.records.iter().collect();
    bounty_table(&mut out, ctx, &all, 0);

    let _ = writeln!(out, "## Listing of Repos Queried\n");
    let _ = writeln!(out, "| Owner | Repo |");
    let _ = writeln!(out, "|---|---|");
    for repo in ctx.tracked_repos {
        let _ = writeln!(out, "| {} | {} |", cell(&repo.owner), cell(&repo.repo));
    }
    out
}

/// `summary.md`: totals by owner, language and currency
pub fn summary_page(ctx: &ReportContext) -> String {
    let mut out = String::new();
    header(&mut out, "Bounty Summary", ctx);

    let _ = writeln!(out, "## By Organization\n");
    totals_table(&mut out, "Organization", ctx.totals, &ctx.rates.reference);

    let _ = writeln!(out, "## By Language\n");
    group_table(&mut out, "Language", "by_language", &ctx.languages, &ctx.language_pages, ctx.rates);

    let _ = writeln!(out, "## By Currency\n");
    group_table(&mut out, "Currency", "by_currency", &ctx.currencies, &ctx.currency_pages, ctx.rates);
    out
}

/// One page of a grouping (`by_language/rust.md` and the like)
pub fn group_page(ctx: &ReportContext, title: &str, records: &[&BountyRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", title);
    let _ = writeln!(out, "*Report generated: {}*\n", ctx.generated_at);
    let _ = writeln!(
        out,
        "**{}** bounties worth **{:.2} {}**.\n",
        records.len(),
        total_value(records, ctx.rates),
        ctx.rates.reference
    );
    let _ = writeln!(out, "[Back to all bounties](../all.md)\n");
    bounty_table(&mut out, ctx, records, 1);
    out
}

/// Highest-valued bounties, best first; ties keep report order
pub fn featured<'a>(ctx: &ReportContext<'a>) -> Vec<&'a BountyRecord> {
    let mut valued: Vec<(&BountyRecord, f64)> = ctx
        .records
        .iter()
        .filter_map(|r| {
            let value = r.bounty.as_ref().and_then(|b| ctx.rates.value_of(b))?;
            (value > 0.0).then_some((r, value))
        })
        .collect();
    valued.sort_by(|a, b| b.1.total_cmp(&a.1));
    valued.into_iter().take(FEATURED_LIMIT).map(|(r, _)| r).collect()
}

/// `featured.md`
pub fn featured_page(ctx: &ReportContext) -> String {
    let mut out = String::new();
    header(&mut out, "Featured Bounties", ctx);

    let top = featured(ctx);
    if top.is_empty() {
        let _ = writeln!(out, "No bounty has a known {} value yet.", ctx.rates.reference);
        return out;
    }
    let _ = writeln!(
        out,
        "The {} open bounties with the highest {} value.\n",
        top.len(),
        ctx.rates.reference
    );
    bounty_table(&mut out, ctx, &top, 0);
    out
}

/// Table of standing programs, shared by `ongoing_programs.md` and the README
pub fn ongoing_programs_table(ctx: &ReportContext) -> String {
    let programs: Vec<&BountyRecord> = ctx.records.iter().filter(|r| r.is_ongoing_program()).collect();
    let mut out = String::new();
    if programs.is_empty() {
        let _ = writeln!(out, "*No ongoing programs are listed.*");
        return out;
    }

    let _ = writeln!(out, "| Program | Organization | Reward | Currency |");
    let _ = writeln!(out, "|---|---|---|---|");
    for record in programs {
        let _ = writeln!(
            out,
            "| [{}]({}) | {} | {} | {} |",
            cell(&record.title),
            record.url,
            cell(&record.owner),
            cell(&record.amount_display()),
            cell(&record.unit_display()),
        );
    }
    out
}

/// `ongoing_programs.md`
pub fn ongoing_programs_page(ctx: &ReportContext) -> String {
    let mut out = String::new();
    header(&mut out, "Ongoing Programs", ctx);
    out.push_str(&ongoing_programs_table(ctx));
    out
}

/// `currency_prices.md`
pub fn price_page(ctx: &ReportContext) -> String {
    let mut out = String::new();
    header(&mut out, "Currency Prices", ctx);

    if ctx.rates.is_empty() {
        let _ = writeln!(out, "No conversion rates were available for this run.");
        return out;
    }

    let _ = writeln!(out, "| Unit | Value in {} |", ctx.rates.reference);
    let _ = writeln!(out, "|---|---|");
    for (unit, rate) in &ctx.rates.rates {
        let _ = writeln!(out, "| {} | {:.6} |", cell(unit), rate);
    }
    out
}

/// Escapes a shields.io static badge path segment
fn badge_segment(text: &str) -> String {
    text.replace('-', "--").replace('_', "__").replace(' ', "_")
}

fn badge(label: &str, message: &str, color: &str) -> String {
    format!(
        "![{label}](https://img.shields.io/badge/{}-{}-{color})",
        badge_segment(label),
        badge_segment(message),
    )
}

/// Count badges shown at the top of the README
pub fn readme_badges(ctx: &ReportContext) -> String {
    let overall = ctx.totals.overall();
    [
        badge("Open bounties", &overall.count.to_string(), "blue"),
        badge(
            "Total value",
            &format!("{:.2} {}", overall.value, ctx.rates.reference),
            "green",
        ),
        badge("Languages", &ctx.languages.len().to_string(), "orange"),
        badge("Currencies", &ctx.currencies.len().to_string(), "yellow"),
        badge("Organizations", &ctx.orgs.len().to_string(), "purple"),
    ]
    .join(" ")
}

/// Compact totals table embedded in the README
pub fn readme_table(ctx: &ReportContext) -> String {
    let overall = ctx.totals.overall();
    let mut out = String::new();
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Open bounties | {} |", overall.count);
    let _ = writeln!(out, "| Total value ({}) | {:.2} |", ctx.rates.reference, overall.value);
    let _ = writeln!(out, "| Languages | {} |", ctx.languages.len());
    let _ = writeln!(out, "| Currencies | {} |", ctx.currencies.len());
    let _ = writeln!(out, "| Organizations | {} |", ctx.orgs.len());
    let _ = writeln!(out, "| Priced units | {} |", ctx.rates.len());
    let _ = writeln!(out, "\n*Updated {}*", ctx.generated_at);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_escaping() {
        assert_eq!(cell("a | b\nc"), "a \\| b c");
    }

    #[test]
    fn test_badge_escaping() {
        assert_eq!(
            badge("Total value", "12.50 ERG", "green"),
            "![Total value](https://img.shields.io/badge/Total_value-12.50_ERG-green)"
        );
        assert_eq!(badge_segment("rosen-bridge_v2"), "rosen--bridge__v2");
    }
}
