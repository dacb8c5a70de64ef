use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Countdown text shown once the scheduled run is due.
pub const RUNNING_NOW_LABEL: &str = "Executando...";

/// Visual urgency of the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Normal,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Normal => "normal",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub text: String,
    pub severity: Severity,
}

/// Format the time left until the next run, `difference_ms = next_run - now`.
pub fn countdown(difference_ms: i64) -> Countdown {
    if difference_ms <= 0 {
        return Countdown {
            text: RUNNING_NOW_LABEL.to_string(),
            severity: Severity::Info,
        };
    }

    let minutes = difference_ms / 60_000;
    let seconds = (difference_ms % 60_000) / 1000;

    let text = if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    };

    let severity = if minutes < 1 {
        Severity::Critical
    } else if minutes < 5 {
        Severity::Warning
    } else {
        Severity::Normal
    };

    Countdown { text, severity }
}

/// `dd/mm/yyyy, HH:MM` in the given zone.
pub fn format_datetime(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).format("%d/%m/%Y, %H:%M").to_string()
}

/// `dd/mm/yyyy, HH:MM:SS` in the given zone.
pub fn format_timestamp(ts: DateTime<Utc>, tz: Tz) -> String {
    ts.with_timezone(&tz).format("%d/%m/%Y, %H:%M:%S").to_string()
}

/// Display class and label for an article status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub class: &'static str,
    pub label: String,
}

pub fn format_status(status: &str) -> StatusBadge {
    let (class, label) = match status {
        "pending" => ("secondary", "Pendente"),
        "processing" => ("warning", "Processando"),
        "processed" => ("info", "Processado"),
        "published" => ("success", "Publicado"),
        "failed" => ("danger", "Falhou"),
        other => ("secondary", other),
    };
    StatusBadge {
        class,
        label: label.to_string(),
    }
}
