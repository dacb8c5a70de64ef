pub mod api;
pub mod client;
pub mod format;

pub use api::{AiStatus, ArticleSummary, CommandResponse, JobEntry, LogEntry, SchedulerSnapshot, Stats, parse_timestamp};
pub use client::{ApiClient, ApiError, Command};
pub use format::{Countdown, Severity, StatusBadge, countdown, format_datetime, format_status, format_timestamp};

// Backend defaults
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Scheduler job whose next run drives the countdown.
pub const AUTOMATION_JOB_ID: &str = "automation_cycle";

// Endpoints
pub const STATS_PATH: &str = "/api/stats";
pub const SCHEDULER_STATUS_PATH: &str = "/api/scheduler-status";
pub const AI_STATUS_PATH: &str = "/api/ai-status";
pub const RECENT_ARTICLES_PATH: &str = "/api/recent-articles";
pub const RECENT_LOGS_PATH: &str = "/api/recent-logs";

// Dashboard config and log locations
pub const DEFAULT_CONFIG_PATH: &str = "/etc/autodash/config.yaml";
pub const USER_CONFIG_PATH: &str = "autodash.yaml";
pub const DEFAULT_LOG_FILE: &str = "autodash-dashboard.log";
