//! Injury report retrieval with a backward slot fallback.
//!
//! Reports are published on a fixed half-hour schedule. The newest slot at or
//! before "now" is tried first, then each earlier slot in turn; the first one
//! that returns a non-empty body wins. There is no retry or backoff.

use chrono::{Duration as ChronoDuration, NaiveDateTime, Timelike};
use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::http_client::http_client;

const SLOT_MINUTE: u32 = 30;

#[derive(Debug, Error)]
pub enum ReportFetchError {
    #[error("report url template is not configured (set REPORT_URL_TEMPLATE)")]
    MissingTemplate,

    #[error("no report published for {slot} (status {status})")]
    NotPublished { slot: NaiveDateTime, status: u16 },

    #[error("report request for {slot} failed: {message}")]
    Transport { slot: NaiveDateTime, message: String },

    #[error("report for {slot} is empty")]
    Empty { slot: NaiveDateTime },

    #[error("no injury report found in the last {attempts} slots")]
    Exhausted { attempts: usize },
}

/// Anything that can return report text for a scheduled slot.
pub trait ReportSource {
    fn fetch(&self, slot: NaiveDateTime) -> Result<String, ReportFetchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedReport {
    pub slot: NaiveDateTime,
    pub text: String,
}

/// Newest-first publication slots, `count` of them, ending at or before `now`.
pub fn scheduled_slots(now: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
    let Some(anchor) = now
        .with_minute(SLOT_MINUTE)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
    else {
        return Vec::new();
    };
    let latest = if anchor > now {
        anchor - ChronoDuration::hours(1)
    } else {
        anchor
    };
    (0..count)
        .map(|i| latest - ChronoDuration::hours(i as i64))
        .collect()
}

pub fn fetch_latest<S: ReportSource + ?Sized>(
    source: &S,
    now: NaiveDateTime,
    lookback: usize,
) -> Result<FetchedReport, ReportFetchError> {
    let slots = scheduled_slots(now, lookback);
    for slot in &slots {
        match source.fetch(*slot) {
            Ok(text) if !text.trim().is_empty() => {
                info!(%slot, bytes = text.len(), "injury report fetched");
                return Ok(FetchedReport { slot: *slot, text });
            }
            Ok(_) => debug!(%slot, "report slot empty"),
            Err(err) => debug!(%slot, %err, "report slot unavailable"),
        }
    }
    Err(ReportFetchError::Exhausted {
        attempts: slots.len(),
    })
}

/// Fills `{date}` (`2025-01-15`) and `{time}` (`05_30PM`) in a URL template.
pub fn render_url(template: &str, slot: NaiveDateTime) -> String {
    template
        .replace("{date}", &slot.format("%Y-%m-%d").to_string())
        .replace("{time}", &slot.format("%I_%M%p").to_string())
}

#[derive(Debug, Clone)]
pub struct HttpReportSource {
    template: String,
}

impl HttpReportSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, ReportFetchError> {
        config
            .report_url_template
            .as_deref()
            .map(Self::new)
            .ok_or(ReportFetchError::MissingTemplate)
    }
}

impl ReportSource for HttpReportSource {
    fn fetch(&self, slot: NaiveDateTime) -> Result<String, ReportFetchError> {
        let transport = |message: String| ReportFetchError::Transport { slot, message };
        let client = http_client().map_err(|err| transport(format!("{err:#}")))?;
        let url = render_url(&self.template, slot);
        debug!(%url, "requesting injury report");
        let resp = client
            .get(&url)
            .header(ACCEPT, "text/plain, */*")
            .send()
            .map_err(|err| transport(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ReportFetchError::NotPublished {
                slot,
                status: status.as_u16(),
            });
        }
        let body = resp.text().map_err(|err| transport(err.to_string()))?;
        if body.trim().is_empty() {
            return Err(ReportFetchError::Empty { slot });
        }
        Ok(body)
    }
}
