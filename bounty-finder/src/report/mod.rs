mod csv_export;
pub mod markdown;
mod readme;

pub use csv_export::write_csv;
pub use readme::{update_readme, ReadmeBlock, BOUNTY_BADGES, BOUNTY_TABLE, ONGOING_PROGRAMS};

use anyhow::{Context, Result};
use extractors::{group_by_currency, group_by_language, group_by_organization, BountyTotals, Grouped};
use shared_types::{BountyRecord, ConversionRates, TrackedRepo};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Group key to page file stem, unique within one group directory
pub type PageNames = BTreeMap<String, String>;

/// Everything a page needs, computed once per run
pub struct ReportContext<'a> {
    pub records: &'a [BountyRecord],
    pub totals: &'a BountyTotals,
    pub rates: &'a ConversionRates,
    pub tracked_repos: &'a [TrackedRepo],
    pub generated_at: String,
    pub languages: Grouped<'a>,
    pub orgs: Grouped<'a>,
    pub currencies: Grouped<'a>,
    pub language_pages: PageNames,
    pub org_pages: PageNames,
    pub currency_pages: PageNames,
}

impl<'a> ReportContext<'a> {
    pub fn new(
        records: &'a [BountyRecord],
        totals: &'a BountyTotals,
        rates: &'a ConversionRates,
        tracked_repos: &'a [TrackedRepo],
    ) -> Self {
        let languages = group_by_language(records);
        let orgs = group_by_organization(records);
        let currencies = group_by_currency(records);
        Self {
            records,
            totals,
            rates,
            tracked_repos,
            generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            language_pages: page_names(&languages),
            org_pages: page_names(&orgs),
            currency_pages: page_names(&currencies),
            languages,
            orgs,
            currencies,
        }
    }
}

/// File-name-safe form of a group key
pub fn slug(key: &str) -> String {
    let mut out = String::new();
    for c in key.trim().to_lowercase().chars() {
        match c {
            c if c.is_alphanumeric() => out.push(c),
            '+' => out.push_str("plus"),
            '#' => out.push_str("sharp"),
            _ if !out.ends_with('-') && !out.is_empty() => out.push('-'),
            _ => {}
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Assigns each key its slug, suffixing `-2`, `-3`, ... when keys such as
/// `foo.bar` and `foo-bar` collide. Keys are visited in sorted order, so the
/// assignment is stable across runs with the same groups.
pub fn page_names(groups: &Grouped<'_>) -> PageNames {
    let mut taken = HashSet::new();
    let mut names = PageNames::new();
    for key in groups.keys() {
        let base = slug(key);
        let mut name = base.clone();
        let mut suffix = 2;
        while !taken.insert(name.clone()) {
            name = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        names.insert(key.clone(), name);
    }
    names
}

/// Page stem for `key`, falling back to its bare slug for keys outside the grouping
pub fn page_name(pages: &PageNames, key: &str) -> String {
    pages.get(key).cloned().unwrap_or_else(|| slug(key))
}

fn write_file(path: &Path, contents: &str) -> Result<PathBuf> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

/// Regenerates a group directory so pages of vanished groups do not linger
fn write_group_dir(
    ctx: &ReportContext,
    output_dir: &Path,
    dir: &str,
    title_prefix: &str,
    groups: &Grouped<'_>,
    pages: &PageNames,
) -> Result<Vec<PathBuf>> {
    let group_dir = output_dir.join(dir);
    if group_dir.exists() {
        std::fs::remove_dir_all(&group_dir)
            .with_context(|| format!("Failed to clear {}", group_dir.display()))?;
    }
    std::fs::create_dir_all(&group_dir)
        .with_context(|| format!("Failed to create {}", group_dir.display()))?;

    let mut written = Vec::new();
    for (key, records) in groups {
        let page = markdown::group_page(ctx, &format!("{}: {}", title_prefix, key), records);
        let file = group_dir.join(format!("{}.md", page_name(pages, key)));
        written.push(write_file(&file, &page)?);
    }
    Ok(written)
}

/// Writes every report page and the CSV export into `output_dir`
pub fn write_reports(ctx: &ReportContext, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut written = vec![
        write_file(&output_dir.join("all.md"), &markdown::main_page(ctx))?,
        write_file(&output_dir.join("summary.md"), &markdown::summary_page(ctx))?,
        write_file(&output_dir.join("currency_prices.md"), &markdown::price_page(ctx))?,
        write_file(&output_dir.join("featured.md"), &markdown::featured_page(ctx))?,
        write_file(
            &output_dir.join("ongoing_programs.md"),
            &markdown::ongoing_programs_page(ctx),
        )?,
    ];
    written.extend(write_group_dir(
        ctx,
        output_dir,
        "by_language",
        "Language",
        &ctx.languages,
        &ctx.language_pages,
    )?);
    written.extend(write_group_dir(
        ctx,
        output_dir,
        "by_org",
        "Organization",
        &ctx.orgs,
        &ctx.org_pages,
    )?);
    written.extend(write_group_dir(
        ctx,
        output_dir,
        "by_currency",
        "Currency",
        &ctx.currencies,
        &ctx.currency_pages,
    )?);

    let csv_path = output_dir.join("bounty_issues.csv");
    write_csv(ctx.records, &csv_path)?;
    written.push(csv_path);

    tracing::info!("Wrote {} report files to {}", written.len(), output_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BountyMatch, BountyUnit, Currency, Metal};
    use std::collections::BTreeMap;

    fn record(owner: &str, lang: &str, bounty: Option<BountyMatch>) -> BountyRecord {
        BountyRecord {
            timestamp: "2024-05-01 12:00:00".to_string(),
            owner: owner.to_string(),
            repo: "node".to_string(),
            title: format!("Bounty | {}", owner),
            url: format!("https://github.com/{}/node/issues/7", owner),
            bounty,
            primary_lang: lang.to_string(),
            secondary_lang: "None".to_string(),
            labels: vec!["bounty".to_string()],
        }
    }

    fn fixtures() -> (Vec<BountyRecord>, ConversionRates, Vec<TrackedRepo>) {
        let records = vec![
            record(
                "ergoplatform",
                "Scala",
                Some(BountyMatch::new("100", BountyUnit::Currency(Currency::Erg))),
            ),
            record(
                "rosen-bridge",
                "C++",
                Some(BountyMatch::new("20", BountyUnit::Currency(Currency::SigUsd))),
            ),
            record("rosen-bridge", "C++", None),
        ];
        let prices = BTreeMap::from([("ERG".to_string(), 2.0), ("SigUSD".to_string(), 1.0)]);
        let rates = ConversionRates::from_usd_prices("ERG", &prices, &BTreeMap::<Metal, f64>::new());
        let repos = vec![TrackedRepo::new("ergoplatform", "node")];
        (records, rates, repos)
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("TypeScript"), "typescript");
        assert_eq!(slug("C++"), "cplusplus");
        assert_eq!(slug("C#"), "csharp");
        assert_eq!(slug("Not specified"), "not-specified");
        assert_eq!(slug("g GOLD"), "g-gold");
        assert_eq!(slug("  --  "), "unknown");
    }

    #[test]
    fn test_colliding_slugs_get_distinct_pages() {
        let records = vec![
            record("foo-bar", "Rust", None),
            record("foo.bar", "Rust", None),
            record("Foo Bar", "Rust", None),
        ];
        let orgs = group_by_organization(&records);
        let pages = page_names(&orgs);

        assert_eq!(pages["Foo Bar"], "foo-bar");
        assert_eq!(pages["foo-bar"], "foo-bar-2");
        assert_eq!(pages["foo.bar"], "foo-bar-3");
        assert_eq!(page_name(&pages, "elsewhere.org"), "elsewhere-org");

        let rates = ConversionRates::new("ERG");
        let totals = BountyTotals::from_records(&records, &rates);
        let ctx = ReportContext::new(&records, &totals, &rates, &[]);
        let dir = tempfile::tempdir().unwrap();
        write_reports(&ctx, dir.path()).unwrap();

        for (stem, owner) in [("foo-bar", "Foo Bar"), ("foo-bar-2", "foo-bar"), ("foo-bar-3", "foo.bar")] {
            let page = std::fs::read_to_string(dir.path().join("by_org").join(format!("{stem}.md"))).unwrap();
            assert!(page.contains(&format!("# Organization: {owner}")));
        }
        let all = std::fs::read_to_string(dir.path().join("all.md")).unwrap();
        assert!(all.contains("[foo.bar](by_org/foo-bar-3.md)"));
    }

    #[test]
    fn test_write_reports() {
        let (records, rates, repos) = fixtures();
        let totals = BountyTotals::from_records(&records, &rates);
        let ctx = ReportContext::new(&records, &totals, &rates, &repos);
        let dir = tempfile::tempdir().unwrap();

        let stale = dir.path().join("by_language").join("cobol.md");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        let written = write_reports(&ctx, dir.path()).unwrap();
        assert!(!stale.exists());
        assert!(written.contains(&dir.path().join("by_language").join("cplusplus.md")));
        assert!(written.contains(&dir.path().join("by_currency").join("not-specified.md")));
        assert!(written.contains(&dir.path().join("by_org").join("ergoplatform.md")));

        let all = std::fs::read_to_string(dir.path().join("all.md")).unwrap();
        assert!(all.contains("| ergoplatform | 1 | 100.00 |"));
        assert!(all.contains("| rosen-bridge | 2 | 10.00 |"));
        assert!(all.contains("| **Overall Total** | **3** | **110.00** |"));
        assert!(all.contains("| Not specified | Not specified | - |"));
        assert!(all.contains("Bounty \\| ergoplatform"));

        let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
        assert!(summary.contains("| [SigUSD](by_currency/sigusd.md) | 1 | 10.00 |"));
        assert!(summary.contains("| [C++](by_language/cplusplus.md) | 2 | 10.00 |"));

        let prices = std::fs::read_to_string(dir.path().join("currency_prices.md")).unwrap();
        assert!(prices.contains("| SigUSD | 0.500000 |"));

        let top: Vec<&str> = markdown::featured(&ctx).iter().map(|r| r.owner.as_str()).collect();
        assert_eq!(top, vec!["ergoplatform", "rosen-bridge"]);
        let ongoing = std::fs::read_to_string(dir.path().join("ongoing_programs.md")).unwrap();
        assert!(ongoing.contains("No ongoing programs"));
    }

    #[test]
    fn test_price_page_without_rates() {
        let (records, _, repos) = fixtures();
        let rates = ConversionRates::new("ERG");
        let totals = BountyTotals::from_records(&records, &rates);
        let ctx = ReportContext::new(&records, &totals, &rates, &repos);

        assert!(markdown::price_page(&ctx).contains("No conversion rates"));
        assert_eq!(totals.overall().value, 100.0);
    }
}
