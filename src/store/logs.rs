use anyhow::{Context, Result};

use super::types::LogEntry;

/// Byte ceiling for `logs.json`.
pub const MAX_LOG_BYTES: usize = 5 * 1024 * 1024;
/// Entry cap applied when trimming 10% was not enough.
pub const MAX_LOG_ENTRIES: usize = 5000;

/// Encode the answer log so it fits in `ceiling` bytes, evicting the oldest
/// entries from `logs` as needed:
///
/// 1. drop the oldest 10% (at least one entry) until it fits,
/// 2. keep only the newest [`MAX_LOG_ENTRIES`],
/// 3. switch from pretty to compact JSON,
/// 4. drop the oldest entries until it fits.
///
/// Each step only runs while the encoding is still over the ceiling.
pub fn encode_logs(logs: &mut Vec<LogEntry>, ceiling: usize) -> Result<String> {
    let pretty = |logs: &Vec<LogEntry>| {
        serde_json::to_string_pretty(logs).context("serialize logs")
    };
    let compact = |logs: &Vec<LogEntry>| serde_json::to_string(logs).context("serialize logs");

    let mut encoded = pretty(logs)?;
    while encoded.len() > ceiling && !logs.is_empty() {
        let remove = (logs.len() / 10).max(1);
        logs.drain(..remove);
        encoded = pretty(logs)?;
    }

    if encoded.len() > ceiling && logs.len() > MAX_LOG_ENTRIES {
        let excess = logs.len() - MAX_LOG_ENTRIES;
        logs.drain(..excess);
        encoded = pretty(logs)?;
    }

    if encoded.len() > ceiling {
        let drop = compact_overflow(logs, ceiling)?;
        logs.drain(..drop);
        encoded = compact(logs)?;
    }

    Ok(encoded)
}

/// How many of the oldest entries must go for the compact encoding to fit.
fn compact_overflow(logs: &[LogEntry], ceiling: usize) -> Result<usize> {
    let sizes = logs
        .iter()
        .map(|entry| serde_json::to_string(entry).map(|s| s.len()))
        .collect::<Result<Vec<_>, _>>()
        .context("serialize log entry")?;

    // `[` + entries joined by `,` + `]`
    let mut len = 2 + sizes.iter().sum::<usize>() + sizes.len().saturating_sub(1);
    let mut drop = 0;
    while len > ceiling && drop < sizes.len() {
        len -= sizes[drop] + usize::from(drop + 1 < sizes.len());
        drop += 1;
    }
    Ok(drop)
}
