use std::env;
use std::path::PathBuf;

const DEFAULT_TRACKED_PLAYERS: usize = 8;
const DEFAULT_LOOKBACK_SLOTS: usize = 24;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Players projected per team, ordered by minutes.
    pub tracked_players: usize,
    /// Injury report URL with `{date}` and `{time}` placeholders.
    pub report_url_template: Option<String>,
    pub report_lookback_slots: usize,
    pub export_dir: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tracked_players: DEFAULT_TRACKED_PLAYERS,
            report_url_template: None,
            report_lookback_slots: DEFAULT_LOOKBACK_SLOTS,
            export_dir: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            log_format: LogFormat::Pretty,
        }
    }
}

impl EngineConfig {
    /// Reads the process environment. Binaries load `.env.local`/`.env` first.
    pub fn from_env() -> Self {
        let tracked_players = env::var("TRACKED_PLAYERS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TRACKED_PLAYERS)
            .clamp(1, 15);
        let report_lookback_slots = env::var("REPORT_LOOKBACK_SLOTS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_LOOKBACK_SLOTS)
            .clamp(1, 96);
        let http_timeout_secs = env_timeout_secs();
        let log_format = match opt_env("LOG_FORMAT").map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            tracked_players,
            report_url_template: opt_env("REPORT_URL_TEMPLATE"),
            report_lookback_slots,
            export_dir: opt_env("EXPORT_DIR").map(PathBuf::from),
            http_timeout_secs,
            log_format,
        }
    }
}

pub fn env_timeout_secs() -> u64 {
    env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
        .clamp(1, 120)
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.tracked_players, 8);
        assert_eq!(cfg.report_lookback_slots, 24);
        assert_eq!(cfg.http_timeout_secs, 10);
        assert!(cfg.report_url_template.is_none());
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }
}
