//! Display regions the dashboard paints into.
//!
//! The orchestrator only ever writes through [`RenderSink`]; it never reads
//! back from the display. [`DashboardView`] keeps the latest value of every
//! region in memory and is what the terminal sink draws from.

use chrono::{DateTime, Duration, Utc};
use common::{AiStatus, Countdown, Stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Danger,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

pub trait RenderSink: Send + 'static {
    /// `current-time`
    fn set_current_time(&mut self, text: &str);

    /// `schedulerStatus`
    fn set_scheduler_running(&mut self, running: bool);

    /// `next-execution-time`
    fn set_next_execution_time(&mut self, text: &str);

    /// `countdown-timer` text and `next-execution-countdown` severity.
    fn set_countdown(&mut self, countdown: &Countdown);

    /// The four statistic cards.
    fn set_statistics(&mut self, stats: &Stats);

    fn set_ai_status(&mut self, status: &AiStatus);

    /// Busy/disabled state of the execute control.
    fn set_execute_busy(&mut self, busy: bool);

    fn show_notification(&mut self, notification: Notification, now: DateTime<Utc>);

    /// Called after each batch of updates.
    fn present(&mut self, _now: DateTime<Utc>) {}
}

#[derive(Debug, Clone)]
pub struct ShownNotification {
    pub notification: Notification,
    pub shown_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub current_time: Option<String>,
    pub scheduler_running: Option<bool>,
    pub next_execution_time: Option<String>,
    pub countdown: Option<Countdown>,
    pub statistics: Option<Stats>,
    pub ai_status: Option<AiStatus>,
    pub execute_busy: bool,
    /// Newest first, like alerts inserted at the top of the page.
    pub notifications: Vec<ShownNotification>,
    notification_ttl: Duration,
}

impl DashboardView {
    pub fn new(notification_ttl: Duration) -> Self {
        Self {
            current_time: None,
            scheduler_running: None,
            next_execution_time: None,
            countdown: None,
            statistics: None,
            ai_status: None,
            execute_busy: false,
            notifications: Vec::new(),
            notification_ttl,
        }
    }

    /// Drop notifications older than the TTL.
    pub fn expire_notifications(&mut self, now: DateTime<Utc>) {
        let ttl = self.notification_ttl;
        self.notifications.retain(|n| now - n.shown_at < ttl);
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::new(Duration::seconds(5))
    }
}

impl RenderSink for DashboardView {
    fn set_current_time(&mut self, text: &str) {
        self.current_time = Some(text.to_string());
    }

    fn set_scheduler_running(&mut self, running: bool) {
        self.scheduler_running = Some(running);
    }

    fn set_next_execution_time(&mut self, text: &str) {
        self.next_execution_time = Some(text.to_string());
    }

    fn set_countdown(&mut self, countdown: &Countdown) {
        self.countdown = Some(countdown.clone());
    }

    fn set_statistics(&mut self, stats: &Stats) {
        self.statistics = Some(stats.clone());
    }

    fn set_ai_status(&mut self, status: &AiStatus) {
        self.ai_status = Some(status.clone());
    }

    fn set_execute_busy(&mut self, busy: bool) {
        self.execute_busy = busy;
    }

    fn show_notification(&mut self, notification: Notification, now: DateTime<Utc>) {
        self.notifications.insert(0, ShownNotification { notification, shown_at: now });
    }

    fn present(&mut self, now: DateTime<Utc>) {
        self.expire_notifications(now);
    }
}
