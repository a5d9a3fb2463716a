use crate::calendar::MonthGrid;
use crate::models::{DayStatuses, MonthId, MonthStatuses, StatusList};
use crate::stats::Tally;
use chrono::Utc;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum SyncError {
    Transport(reqwest::Error),
    Status(StatusCode),
    Callback(String),
    Payload(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "remote request failed: {err}"),
            Self::Status(status) => write!(f, "remote endpoint answered {status}"),
            Self::Callback(expected) => {
                write!(f, "remote response was not addressed to callback {expected}")
            }
            Self::Payload(detail) => write!(f, "unexpected remote payload: {detail}"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

/// Body of the load callback. `dailyStatuses` may arrive as an object or as a JSON-encoded string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub daily_statuses: Value,
}

impl LoadResponse {
    /// `None` when the remote side has nothing for this member and month.
    pub fn into_month(
        self,
        grid: &MonthGrid,
        list: &StatusList,
    ) -> Result<Option<MonthStatuses>, SyncError> {
        if !self.found {
            return Ok(None);
        }
        normalize_daily_statuses(self.daily_statuses, grid, list).map(Some)
    }
}

/// Convert a loaded `dailyStatuses` value into integer-keyed label lists.
///
/// Legacy single-string values become one-element lists (empty string: empty list).
pub fn normalize_daily_statuses(
    raw: Value,
    grid: &MonthGrid,
    list: &StatusList,
) -> Result<MonthStatuses, SyncError> {
    let raw = match raw {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|err| SyncError::Payload(format!("dailyStatuses is not JSON: {err}")))?,
        other => other,
    };
    let entries = match raw {
        Value::Object(entries) => entries,
        Value::Null => return Ok(MonthStatuses::default()),
        other => {
            return Err(SyncError::Payload(format!(
                "dailyStatuses should be an object, got {other}"
            )));
        }
    };

    let mut days = MonthStatuses::default();
    for (key, value) in entries {
        let day: u32 = key
            .trim()
            .parse()
            .map_err(|_| SyncError::Payload(format!("invalid day key {key:?}")))?;
        if !grid.contains(day) {
            warn!(day, month = %grid.month(), "dropping status outside of the month");
            continue;
        }

        let labels = match value {
            Value::Null => Vec::new(),
            Value::String(label) => vec![label],
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(label) => Ok(label),
                    other => Err(SyncError::Payload(format!(
                        "day {day} holds a non-string status {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => {
                return Err(SyncError::Payload(format!(
                    "day {day} holds unexpected value {other}"
                )));
            }
        };

        let mut statuses = DayStatuses::new();
        for label in labels {
            if label.is_empty() || statuses.contains(&label) {
                continue;
            }
            if !list.is_selectable(&label) {
                warn!(day, label = %label, "dropping unknown status");
                continue;
            }
            statuses.push(label);
        }
        days.set(day, statuses);
    }

    Ok(days)
}

/// Write request for one member's month.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub month: String,
    pub name: String,
    pub daily_statuses: String,
    pub status_counts: String,
    pub total_count: u32,
    pub action: &'static str,
}

impl SavePayload {
    pub fn new(
        month: MonthId,
        name: &str,
        days: &MonthStatuses,
        tally: &Tally,
    ) -> Result<Self, SyncError> {
        let encode = |err: serde_json::Error| SyncError::Payload(err.to_string());
        Ok(Self {
            month: month.to_string(),
            name: name.to_string(),
            daily_statuses: serde_json::to_string(days).map_err(encode)?,
            status_counts: serde_json::to_string(&tally.counts_by_status()).map_err(encode)?,
            total_count: tally.total,
            action: "save",
        })
    }
}

/// The spreadsheet-backed system of record.
pub trait RemoteStore: Send + Sync {
    fn load(
        &self,
        month: MonthId,
        name: &str,
    ) -> impl Future<Output = Result<LoadResponse, SyncError>> + Send;

    /// Fire-and-forget: `Ok` means the request left, not that the remote side accepted it.
    fn save(&self, payload: &SavePayload) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// Talks to a script endpoint that answers loads with `callback(json)` and accepts saves as a
/// plain-text JSON POST whose response is ignored.
#[derive(Debug)]
pub struct HttpRemote {
    client: Client,
    endpoint: String,
    issued: AtomicU64,
}

impl HttpRemote {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            issued: AtomicU64::new(0),
        }
    }

    fn callback_token(&self) -> String {
        let seq = self.issued.fetch_add(1, Ordering::Relaxed);
        format!("handleDataCallback_{}_{seq}", Utc::now().timestamp_millis())
    }
}

impl RemoteStore for HttpRemote {
    async fn load(&self, month: MonthId, name: &str) -> Result<LoadResponse, SyncError> {
        let callback = self.callback_token();
        let month = month.to_string();
        let stamp = Utc::now().timestamp_millis().to_string();
        info!(%month, name, "loading month from remote");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("callback", callback.as_str()),
                ("month", month.as_str()),
                ("name", name),
                ("action", "load"),
                ("t", stamp.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(status));
        }

        let body = response.text().await?;
        let json = unwrap_callback(&body, &callback)?;
        serde_json::from_str(json).map_err(|err| SyncError::Payload(err.to_string()))
    }

    async fn save(&self, payload: &SavePayload) -> Result<(), SyncError> {
        let body =
            serde_json::to_string(payload).map_err(|err| SyncError::Payload(err.to_string()))?;
        info!(month = %payload.month, name = %payload.name, total = payload.total_count, "saving month to remote");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain;charset=utf-8")
            .body(body)
            .send()
            .await?;
        debug!(status = %response.status(), "remote save response ignored");
        Ok(())
    }
}

/// Strip `token( ... )` (optionally followed by `;`) from a script response.
pub fn unwrap_callback<'a>(body: &'a str, token: &str) -> Result<&'a str, SyncError> {
    let mismatch = || SyncError::Callback(token.to_string());
    let inner = body
        .trim()
        .strip_prefix(token)
        .ok_or_else(mismatch)?
        .trim_start()
        .strip_prefix('(')
        .ok_or_else(mismatch)?;
    let inner = inner.trim_end();
    let inner = inner.strip_suffix(';').unwrap_or(inner).trim_end();
    inner.strip_suffix(')').ok_or_else(mismatch)
}
