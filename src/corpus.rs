//! Reading corpora from disk.
//!
//! `.jsonl` files hold one record object per line
//! (`{"text": ..., "category": ..., "origin": ..., "ordinal": ...}`, only
//! `text` required). Any other file is plain text with one record per
//! non-empty line. A missing origin defaults to the file name and a
//! missing ordinal to the line number. Two records with the same
//! `origin#ordinal` identity are an error.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::{RecordId, TextRecord};
use crate::errors::{Error, Result, ResultExt};

const DEFAULT_CATEGORY: &str = "general";

/// One `.jsonl` line as written, before identity defaults are applied.
#[derive(Debug, Deserialize)]
struct RecordLine {
    text: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    ordinal: Option<u64>,
}

pub fn read_corpus(path: &Path) -> Result<Vec<TextRecord>> {
    let file = std::fs::File::open(path)
        .map_err(Error::from)
        .context(format!("opening corpus {}", path.display()))?;
    let origin = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let jsonl = path.extension().is_some_and(|ext| ext == "jsonl");

    let mut records = Vec::new();
    let mut seen: HashMap<RecordId, u64> = HashMap::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(Error::from)?;
        let line_no = index as u64 + 1;
        if line.trim().is_empty() {
            continue;
        }
        let record = if jsonl {
            parse_record_line(&line, &origin, line_no).context(format!("{origin}:{line_no}"))?
        } else {
            TextRecord::new(line, DEFAULT_CATEGORY, origin.as_str(), line_no)
        };
        if let Some(first) = seen.insert(record.id(), line_no) {
            return Err(Error::WithContext {
                context: format!("{origin}:{line_no}"),
                message: format!("duplicate record id {} (first used on line {first})", record.id()),
            });
        }
        records.push(record);
    }
    tracing::info!(path = %path.display(), records = records.len(), "corpus loaded");
    Ok(records)
}

/// Parses one `.jsonl` line. `origin` and `line_no` stand in for the
/// record's own `origin` and `ordinal` when it leaves them out.
pub fn parse_record_line(line: &str, origin: &str, line_no: u64) -> Result<TextRecord> {
    let raw: RecordLine = serde_json::from_str(line)?;
    Ok(TextRecord::new(
        raw.text,
        raw.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        raw.origin
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| origin.to_string()),
        raw.ordinal.unwrap_or(line_no),
    ))
}
