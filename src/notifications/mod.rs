//! Announcements of newly accepted content.
//!
//! Delivery is fire-and-forget: a failing sink is logged and the ingestion
//! that triggered it still succeeds.

pub mod webhook;

pub use webhook::WebhookSink;

use anyhow::Result;
use async_trait::async_trait;
use reelhook_common::ContentId;
use reelhook_db::{ContentBody, ContentRecord};
use serde::{Deserialize, Serialize};

use crate::config::NotificationsConfig;
use crate::ingest::MergeOutcome;

/// Payload announced for a new record or a new variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub content_id: ContentId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    pub is_new_record: bool,
    pub is_new_variant: bool,
    pub variant_summary: String,
}

impl From<&MergeOutcome> for Notification {
    fn from(outcome: &MergeOutcome) -> Self {
        Self {
            content_id: outcome.content_id,
            title: outcome.title.clone(),
            poster_url: outcome.poster_url.clone(),
            is_new_record: outcome.is_new_record,
            is_new_variant: outcome.is_new_variant,
            variant_summary: outcome.variant_summary.clone(),
        }
    }
}

/// Manual re-announcement of a stored record: nothing is new, and the
/// summary lists what the record currently carries.
impl From<&ContentRecord> for Notification {
    fn from(record: &ContentRecord) -> Self {
        Self {
            content_id: record.id,
            title: record.title.clone(),
            poster_url: record.metadata.poster_url.clone(),
            is_new_record: false,
            is_new_variant: false,
            variant_summary: summarize_body(&record.body),
        }
    }
}

fn summarize_body(body: &ContentBody) -> String {
    match body {
        ContentBody::Movie { files } => {
            let mut qualities: Vec<&str> = Vec::new();
            for file in files {
                if !qualities.contains(&file.quality.as_str()) {
                    qualities.push(&file.quality);
                }
            }
            if qualities.is_empty() {
                "no files".to_string()
            } else {
                qualities.join(", ")
            }
        }
        ContentBody::Series {
            episodes,
            season_packs,
        } => format!(
            "{} episodes, {} season packs",
            episodes.len(),
            season_packs.len()
        ),
    }
}

/// A notification target.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Writes each announcement as a structured log line.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, n: &Notification) -> Result<()> {
        tracing::info!(
            content_id = %n.content_id,
            title = %n.title,
            variant = %n.variant_summary,
            new_record = n.is_new_record,
            poster = n.poster_url.as_deref().unwrap_or(""),
            "New upload available"
        );
        Ok(())
    }
}

/// Manages all notification sinks
pub struct NotificationManager {
    sinks: Vec<Box<dyn NotificationSink>>,
}

impl NotificationManager {
    pub fn new(config: &NotificationsConfig) -> Self {
        let mut sinks: Vec<Box<dyn NotificationSink>> = Vec::new();
        if config.log {
            sinks.push(Box::new(LogSink));
        }
        if let Some(url) = config.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) {
            sinks.push(Box::new(WebhookSink::new(url)));
        }
        Self { sinks }
    }

    pub fn with_sinks(sinks: Vec<Box<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }

    /// A manager that announces nothing.
    pub fn disabled() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Announce a merge outcome to every sink.
    /// Outcomes that changed nothing visible are skipped. Errors are logged but not propagated.
    pub async fn notify(&self, outcome: &MergeOutcome) {
        if !outcome.is_announceable() {
            tracing::debug!(content_id = %outcome.content_id, "Replaced variant, nothing to announce");
            return;
        }

        self.announce(&Notification::from(outcome)).await;
    }

    /// Send a notification to every sink unconditionally. Errors are
    /// logged but not propagated.
    pub async fn announce(&self, notification: &Notification) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(notification).await {
                tracing::warn!("Failed to notify '{}': {:#}", sink.name(), e);
            }
        }
    }

    /// Check if there are any enabled notification targets
    pub fn has_targets(&self) -> bool {
        !self.sinks.is_empty()
    }
}
