use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::Level;

use crate::quiz::DEFAULT_DAILY_LIMIT;
use crate::session::Timing;

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub discord_token: String,
    pub guild_id: Option<u64>,
    pub dataset_dir: PathBuf,
    pub data_dir: PathBuf,
    pub daily_limit: u32,
    pub timing: Timing,
    pub autosave_every: Duration,
    pub log_level: Level,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let discord_token = get("DISCORD_TOKEN")
            .ok_or_else(|| anyhow!("DISCORD_TOKEN is required but not set"))?;
        let guild_id = get("DISCORD_GUILD_ID")
            .map(|s| s.parse::<u64>().context("DISCORD_GUILD_ID must be a number"))
            .transpose()?;

        let warning_secs: u64 = parse_or(&get, "QUESTION_WARNING_SECS", 15)?;
        let limit_secs: u64 = parse_or(&get, "QUESTION_TIME_LIMIT_SECS", 25)?;
        if warning_secs >= limit_secs {
            return Err(anyhow!(
                "QUESTION_WARNING_SECS ({}) must be below QUESTION_TIME_LIMIT_SECS ({})",
                warning_secs,
                limit_secs
            ));
        }

        Ok(Self {
            discord_token,
            guild_id,
            dataset_dir: get("DATASET_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./RuBQ/RuBQ_2.0")),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
            daily_limit: parse_or(&get, "DAILY_LIMIT", DEFAULT_DAILY_LIMIT)?,
            timing: Timing {
                warning_after: Duration::from_secs(warning_secs),
                time_limit: Duration::from_secs(limit_secs),
            },
            autosave_every: Duration::from_secs(parse_or(&get, "AUTOSAVE_INTERVAL_SECS", 300)?),
            log_level: parse_or(&get, "LOG_LEVEL", Level::DEBUG)?,
        })
    }
}

/// Log level alone, for initializing tracing before the rest is validated.
pub fn log_level_from_env() -> Level {
    dotenv::var("LOG_LEVEL")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(Level::DEBUG)
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("Invalid {}={:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn token_is_required() {
        let err = settings(&[]).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
        assert!(settings(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let s = settings(&[("DISCORD_TOKEN", "abc")]).unwrap();
        assert_eq!(s.guild_id, None);
        assert_eq!(s.daily_limit, 30);
        assert_eq!(s.timing.time_limit, Duration::from_secs(25));
        assert_eq!(s.timing.warning_after, Duration::from_secs(15));
        assert_eq!(s.autosave_every, Duration::from_secs(300));
        assert_eq!(s.data_dir, PathBuf::from("./data"));
        assert_eq!(s.log_level, Level::DEBUG);
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings(&[
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_GUILD_ID", "12345"),
            ("DAILY_LIMIT", "5"),
            ("LOG_LEVEL", "info"),
            ("DATASET_DIR", "/srv/rubq"),
        ])
        .unwrap();
        assert_eq!(s.guild_id, Some(12345));
        assert_eq!(s.daily_limit, 5);
        assert_eq!(s.log_level, Level::INFO);
        assert_eq!(s.dataset_dir, PathBuf::from("/srv/rubq"));
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(settings(&[("DISCORD_TOKEN", "abc"), ("DAILY_LIMIT", "lots")]).is_err());
        assert!(settings(&[("DISCORD_TOKEN", "abc"), ("DISCORD_GUILD_ID", "general")]).is_err());
        assert!(settings(&[
            ("DISCORD_TOKEN", "abc"),
            ("QUESTION_WARNING_SECS", "30"),
            ("QUESTION_TIME_LIMIT_SECS", "25"),
        ])
        .is_err());
    }
}
