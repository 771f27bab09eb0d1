use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "countdown.toml";

/// 2010-05-10 09:00 MST.
const DEFAULT_START_SECS: i64 = 1_273_507_200;
/// 2011-05-10 09:00 MST.
const DEFAULT_END_SECS: i64 = 1_305_043_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub format: OutputFormat,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            start: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(DEFAULT_START_SECS),
            end: DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(DEFAULT_END_SECS),
            format: OutputFormat::Text,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    start: Option<String>,
    end: Option<String>,
    format: Option<OutputFormat>,
    log_filter: Option<String>,
}

/// Defaults, then the config file, then the environment.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    if required || path.exists() {
        apply_file(&mut settings, &path)?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))?;

    if let Some(v) = file_cfg.start {
        settings.start = parse_timestamp(&v).context("config `start`")?;
    }
    if let Some(v) = file_cfg.end {
        settings.end = parse_timestamp(&v).context("config `end`")?;
    }
    if let Some(v) = file_cfg.format {
        settings.format = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

pub(crate) fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    for key in ["COUNTDOWN_START", "APP__START"] {
        if let Some(v) = lookup(key) {
            settings.start = parse_timestamp(&v).with_context(|| format!("env {key}"))?;
        }
    }
    for key in ["COUNTDOWN_END", "APP__END"] {
        if let Some(v) = lookup(key) {
            settings.end = parse_timestamp(&v).with_context(|| format!("env {key}"))?;
        }
    }
    if let Some(v) = lookup("COUNTDOWN_FORMAT") {
        settings.format = match v.to_ascii_lowercase().as_str() {
            "text" => OutputFormat::Text,
            "json" => OutputFormat::Json,
            other => return Err(anyhow!("env COUNTDOWN_FORMAT: unknown format '{other}'")),
        };
    }
    if let Some(v) = lookup("COUNTDOWN_LOG") {
        settings.log_filter = v;
    }
    Ok(())
}

pub fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("'{raw}' is not an RFC 3339 timestamp"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
