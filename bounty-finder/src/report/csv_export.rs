use anyhow::{Context, Result};
use shared_types::BountyRecord;
use std::path::Path;

const HEADER: [&str; 10] = [
    "Timestamp",
    "Owner",
    "Repo",
    "Title",
    "Link",
    "Bounty Amount",
    "Bounty Currency",
    "Primary Language",
    "Secondary Language",
    "Labels",
];

/// One row per bounty; labels are joined with `;` into the last column
pub fn write_csv(records: &[BountyRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record([
            record.timestamp.as_str(),
            record.owner.as_str(),
            record.repo.as_str(),
            record.title.as_str(),
            record.url.as_str(),
            record.amount_display().as_str(),
            record.unit_display().as_str(),
            record.primary_lang.as_str(),
            record.secondary_lang.as_str(),
            record.labels.join(";").as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
