use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AiStatus, ApiClient, ApiError, Command, CommandResponse, SchedulerSnapshot, Stats};

/// Everything the dashboard reads from or sends to the automation backend.
///
/// Implementations must turn every failure into an `ApiError`; the
/// orchestrator logs it and keeps its last known state.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    async fn stats(&self) -> Result<Stats, ApiError>;

    async fn scheduler_status(&self) -> Result<SchedulerSnapshot, ApiError>;

    async fn ai_status(&self) -> Result<AiStatus, ApiError>;

    async fn send_command(&self, command: Command) -> Result<CommandResponse, ApiError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn stats(&self) -> Result<Stats, ApiError> {
        ApiClient::stats(self).await
    }

    async fn scheduler_status(&self) -> Result<SchedulerSnapshot, ApiError> {
        ApiClient::scheduler_status(self).await
    }

    async fn ai_status(&self) -> Result<AiStatus, ApiError> {
        ApiClient::ai_status(self).await
    }

    async fn send_command(&self, command: Command) -> Result<CommandResponse, ApiError> {
        ApiClient::send_command(self, command).await
    }
}

/// Wall-clock source for countdown rendering.
pub trait Clock: Send + 'static {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
