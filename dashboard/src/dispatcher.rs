use common::{ApiError, Command, CommandResponse};
use std::sync::Arc;

use crate::render::{Notification, NotificationKind};
use crate::source::StatusSource;

/// Result of one control command, ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub command: Command,
    pub notification: Notification,
    /// Success triggers an immediate refresh.
    pub refresh: bool,
}

/// Fires execute/pause/resume at the backend. No de-duplication here; the
/// orchestrator decides whether a trigger is accepted.
pub struct CommandDispatcher<S> {
    source: Arc<S>,
}

impl<S> Clone for CommandDispatcher<S> {
    fn clone(&self) -> Self {
        Self { source: self.source.clone() }
    }
}

impl<S: StatusSource> CommandDispatcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub async fn dispatch(&self, command: Command) -> DispatchOutcome {
        log::info!("Sending {} command", command);
        let result = self.source.send_command(command).await;
        match &result {
            Ok(resp) if resp.error.is_some() => {
                log::warn!("Command {} rejected: {}", command, resp.error.as_deref().unwrap_or_default());
            }
            Ok(_) => log::info!("Command {} accepted", command),
            Err(e) => log::error!("Command {} failed: {}", command, e),
        }
        outcome(command, result)
    }
}

pub fn outcome(command: Command, result: Result<CommandResponse, ApiError>) -> DispatchOutcome {
    let (notification, refresh) = match result {
        Ok(CommandResponse { error: Some(error), .. }) => {
            let action = match command {
                Command::ExecuteNow => "executar",
                Command::Pause => "pausar",
                Command::Resume => "retomar",
            };
            (
                Notification::new(NotificationKind::Danger, format!("Erro ao {} automação: {}", action, error)),
                false,
            )
        }
        Ok(_) => {
            let notification = match command {
                Command::ExecuteNow => Notification::new(NotificationKind::Success, "Automação executada com sucesso!"),
                Command::Pause => Notification::new(NotificationKind::Warning, "Automação pausada com sucesso!"),
                Command::Resume => Notification::new(NotificationKind::Success, "Automação retomada com sucesso!"),
            };
            (notification, true)
        }
        Err(e) => (
            Notification::new(NotificationKind::Danger, format!("Erro na comunicação: {}", e)),
            false,
        ),
    };

    DispatchOutcome { command, notification, refresh }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{FakeSource, decode_error};

    #[test]
    fn test_success_notifications() {
        let ok = || Ok(CommandResponse::default());

        let out = outcome(Command::ExecuteNow, ok());
        assert_eq!(out.notification, Notification::new(NotificationKind::Success, "Automação executada com sucesso!"));
        assert!(out.refresh);

        let out = outcome(Command::Pause, ok());
        assert_eq!(out.notification.kind, NotificationKind::Warning);
        assert_eq!(out.notification.message, "Automação pausada com sucesso!");
        assert!(out.refresh);

        let out = outcome(Command::Resume, ok());
        assert_eq!(out.notification.message, "Automação retomada com sucesso!");
    }

    #[test]
    fn test_application_error_is_surfaced_without_refresh() {
        let resp = CommandResponse { error: Some("Scheduler not available".to_string()), message: None };
        let out = outcome(Command::Pause, Ok(resp));
        assert_eq!(out.notification.kind, NotificationKind::Danger);
        assert_eq!(out.notification.message, "Erro ao pausar automação: Scheduler not available");
        assert!(!out.refresh);
    }

    #[test]
    fn test_communication_error() {
        let out = outcome(Command::ExecuteNow, Err(decode_error()));
        assert_eq!(out.notification.kind, NotificationKind::Danger);
        assert!(out.notification.message.starts_with("Erro na comunicação: "));
        assert!(!out.refresh);
    }

    #[tokio::test]
    async fn test_dispatch_posts_command() {
        let source = Arc::new(FakeSource::default());
        *source.command_error.lock().unwrap() = Some("busy".to_string());
        let dispatcher = CommandDispatcher::new(source.clone());

        let out = dispatcher.dispatch(Command::ExecuteNow).await;
        assert_eq!(out.notification.message, "Erro ao executar automação: busy");
        assert_eq!(*source.commands.lock().unwrap(), vec![Command::ExecuteNow]);
    }

    #[tokio::test]
    async fn test_dispatch_unreachable_backend() {
        let source = Arc::new(FakeSource::default());
        *source.command_fails.lock().unwrap() = true;
        let dispatcher = CommandDispatcher::new(source);

        let out = dispatcher.dispatch(Command::Resume).await;
        assert_eq!(out.notification.kind, NotificationKind::Danger);
        assert!(out.notification.message.starts_with("Erro na comunicação: "));
        assert!(!out.refresh);
    }
}
