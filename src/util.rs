use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::api::{RowingProfile, PRESET_NAMES};

/// Parses a delta-time log: one microsecond integer per line, `#` starts a comment.
pub fn parse_delta_times(content: &str) -> Result<Vec<u64>> {
    let mut delta_times = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = match line.split_once('#') {
            Some((data, _)) => data,
            None => line,
        }
        .trim();

        if line.is_empty() {
            continue;
        }

        let delta_time = line
            .parse::<u64>()
            .with_context(|| format!("Invalid delta-time '{}' on line {}", line, index + 1))?;
        delta_times.push(delta_time);
    }

    Ok(delta_times)
}

pub fn load_delta_times<P: AsRef<Path>>(path: P) -> Result<Vec<u64>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read delta-time log {}", path.display()))?;
    parse_delta_times(&content)
        .with_context(|| format!("Failed to parse delta-time log {}", path.display()))
}

pub fn floor_to_thousand(value: u64) -> u64 {
    value / 1_000 * 1_000
}

pub fn preset_parser(s: &str) -> Result<String, String> {
    let s = s.trim();
    if RowingProfile::preset(s).is_some() {
        Ok(s.to_string())
    } else {
        Err(format!(
            "Unknown preset '{}', expected one of: {}",
            s,
            PRESET_NAMES.join(", ")
        ))
    }
}
