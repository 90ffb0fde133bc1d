use anyhow::{Context, Result};
use std::path::Path;

/// A generated region of the README, delimited by HTML comment markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadmeBlock {
    pub start: &'static str,
    pub end: &'static str,
}

pub const BOUNTY_TABLE: ReadmeBlock = ReadmeBlock {
    start: "<!-- BOUNTY_TABLE_START -->",
    end: "<!-- BOUNTY_TABLE_END -->",
};

pub const BOUNTY_BADGES: ReadmeBlock = ReadmeBlock {
    start: "<!-- BOUNTY_BADGES_START -->",
    end: "<!-- BOUNTY_BADGES_END -->",
};

pub const ONGOING_PROGRAMS: ReadmeBlock = ReadmeBlock {
    start: "<!-- ONGOING_PROGRAMS_START -->",
    end: "<!-- ONGOING_PROGRAMS_END -->",
};

/// Replaces each block present in the README with its new content.
///
/// Blocks whose markers are missing or out of order are skipped. Returns how
/// many blocks were found; the file is only rewritten when something changed.
pub fn update_readme(readme: &Path, blocks: &[(ReadmeBlock, String)]) -> Result<usize> {
    let original = std::fs::read_to_string(readme)
        .with_context(|| format!("Failed to read {}", readme.display()))?;

    let mut contents = original.clone();
    let mut found = 0;
    for (block, body) in blocks {
        match replace_between_markers(&contents, block, body) {
            Some(updated) => {
                contents = updated;
                found += 1;
            }
            None => tracing::debug!(
                "{} has no {} ... {} block",
                readme.display(),
                block.start,
                block.end
            ),
        }
    }

    if found == 0 {
        tracing::warn!("{} has no generated blocks, leaving it unchanged", readme.display());
    }
    if contents != original {
        std::fs::write(readme, contents)
            .with_context(|| format!("Failed to write {}", readme.display()))?;
    }
    Ok(found)
}

fn replace_between_markers(contents: &str, block: &ReadmeBlock, body: &str) -> Option<String> {
    let start = contents.find(block.start)? + block.start.len();
    let end = start + contents[start..].find(block.end)?;

    Some(format!(
        "{}\n{}\n{}",
        &contents[..start],
        body.trim_end(),
        &contents[end..]
    ))
}
