use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Article counters served by `/api/stats`. Missing or `null` fields read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_articles: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pending_articles: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processing_articles: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processed_articles: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published_articles: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub today_published: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub next_run: Option<String>,
}

impl JobEntry {
    /// Parsed `next_run`, `None` when absent or unparsable.
    pub fn next_run_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.next_run.as_deref()?;
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            log::warn!("Ignoring unparsable next_run {:?} for job {}", raw, self.id);
        }
        parsed
    }
}

/// Payload of `/api/scheduler-status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub running: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jobs: Vec<JobEntry>,
}

impl SchedulerSnapshot {
    pub fn job(&self, id: &str) -> Option<&JobEntry> {
        self.jobs.iter().find(|job| job.id == id)
    }
}

/// `/api/ai-status` is opaque to the dashboard.
pub type AiStatus = serde_json::Value;

/// Reply to the control endpoints. Any `error` means the command failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub status: String,
    #[serde(default)]
    pub feed_type: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub processed_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub wordpress_url: Option<String>,
    #[serde(default)]
    pub ai_used: Option<String>,
    #[serde(default)]
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    #[serde(default)]
    pub article_id: Option<i64>,
    pub action: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub ai_used: Option<String>,
    #[serde(default)]
    pub success: bool,
    pub created_at: String,
}

/// The backend writes `null` where a value is unknown; treat it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
