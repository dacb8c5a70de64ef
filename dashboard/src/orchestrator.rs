use chrono_tz::Tz;
use common::{AiStatus, ApiError, Command, SchedulerSnapshot, Stats};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::dispatcher::{CommandDispatcher, DispatchOutcome};
use crate::render::RenderSink;
use crate::source::{Clock, StatusSource};
use crate::synchronizer::CountdownSynchronizer;

/// User input the dashboard reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Command(Command),
    Refresh,
    Quit,
}

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub fast_tick: Duration,
    pub slow_tick: Duration,
    pub timezone: Tz,
    pub automation_job_id: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            fast_tick: Duration::from_secs(1),
            slow_tick: Duration::from_secs(30),
            timezone: chrono_tz::America::Sao_Paulo,
            automation_job_id: common::AUTOMATION_JOB_ID.to_string(),
        }
    }
}

/// Completed background work, applied on the dashboard task in arrival order.
enum Update {
    Stats(Result<Stats, ApiError>),
    Scheduler(Result<SchedulerSnapshot, ApiError>),
    Ai(Result<AiStatus, ApiError>),
    Dispatched(DispatchOutcome),
}

/// Owns all dashboard state and drives it from timers, UI events and
/// finished requests. Requests run on their own tasks so ticks keep firing
/// while they are in flight.
pub struct Dashboard<S, R, C> {
    source: Arc<S>,
    dispatcher: CommandDispatcher<S>,
    sink: R,
    clock: C,
    sync: CountdownSynchronizer,
    settings: PollSettings,
    execute_busy: bool,
    updates_tx: mpsc::UnboundedSender<Update>,
    updates_rx: mpsc::UnboundedReceiver<Update>,
}

impl<S: StatusSource, R: RenderSink, C: Clock> Dashboard<S, R, C> {
    pub fn new(source: Arc<S>, sink: R, clock: C, settings: PollSettings) -> Self {
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        Self {
            dispatcher: CommandDispatcher::new(source.clone()),
            source,
            sink,
            clock,
            sync: CountdownSynchronizer::new(settings.automation_job_id.clone(), settings.timezone),
            settings,
            execute_busy: false,
            updates_tx,
            updates_rx,
        }
    }

    /// Run until `shutdown` fires, its sender is dropped, or a `Quit` event
    /// arrives. Hands the sink back on exit.
    pub async fn run(mut self, mut ui: mpsc::Receiver<UiEvent>, mut shutdown: watch::Receiver<bool>) -> R {
        log::info!(
            "Dashboard started (fast tick {:?}, slow tick {:?}, job {})",
            self.settings.fast_tick,
            self.settings.slow_tick,
            self.settings.automation_job_id
        );

        // Don't wait for the first slow tick.
        self.refresh();

        let mut fast = time::interval(self.settings.fast_tick);
        fast.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut slow = time::interval_at(Instant::now() + self.settings.slow_tick, self.settings.slow_tick);
        slow.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ui_open = true;

        loop {
            tokio::select! {
                _ = fast.tick() => self.fast_tick(),
                _ = slow.tick() => {
                    log::debug!("Slow tick, cached next run {:?}", self.sync.next_run());
                    self.refresh();
                }
                Some(update) = self.updates_rx.recv() => self.apply(update),
                event = ui.recv(), if ui_open => match event {
                    Some(UiEvent::Quit) => break,
                    Some(event) => self.handle_ui(event),
                    None => {
                        log::debug!("UI input closed");
                        ui_open = false;
                    }
                },
                _ = shutdown.changed() => break,
            }
            self.sink.present(self.clock.now());
        }

        log::info!("Dashboard stopped");
        self.sink
    }

    fn fast_tick(&mut self) {
        let now = self.clock.now();
        self.sink.set_current_time(&common::format_timestamp(now, self.settings.timezone));
        self.sync.render(now, &mut self.sink);
    }

    /// One full refresh cycle: stats, scheduler status and AI status, each
    /// fetched concurrently and applied independently.
    fn refresh(&self) {
        let (source, tx) = (self.source.clone(), self.updates_tx.clone());
        tokio::spawn(async move {
            let _ = tx.send(Update::Stats(source.stats().await));
        });

        let (source, tx) = (self.source.clone(), self.updates_tx.clone());
        tokio::spawn(async move {
            let _ = tx.send(Update::Scheduler(source.scheduler_status().await));
        });

        let (source, tx) = (self.source.clone(), self.updates_tx.clone());
        tokio::spawn(async move {
            let _ = tx.send(Update::Ai(source.ai_status().await));
        });
    }

    fn handle_ui(&mut self, event: UiEvent) {
        match event {
            UiEvent::Command(command) => {
                if command == Command::ExecuteNow {
                    if self.execute_busy {
                        log::debug!("Execute already in flight, ignoring trigger");
                        return;
                    }
                    self.execute_busy = true;
                    self.sink.set_execute_busy(true);
                }

                let (dispatcher, tx) = (self.dispatcher.clone(), self.updates_tx.clone());
                tokio::spawn(async move {
                    let _ = tx.send(Update::Dispatched(dispatcher.dispatch(command).await));
                });
            }
            UiEvent::Refresh => self.refresh(),
            UiEvent::Quit => {}
        }
    }

    fn apply(&mut self, update: Update) {
        let now = self.clock.now();
        match update {
            Update::Stats(Ok(stats)) => self.sink.set_statistics(&stats),
            Update::Stats(Err(e)) => log::error!("Error refreshing statistics: {}", e),
            Update::Scheduler(Ok(snapshot)) => {
                self.sink.set_scheduler_running(snapshot.running);
                if self.sync.absorb(&snapshot) {
                    self.sync.render(now, &mut self.sink);
                }
            }
            Update::Scheduler(Err(e)) => log::error!("Error refreshing scheduler status: {}", e),
            Update::Ai(Ok(status)) => {
                log::debug!("AI status updated: {}", status);
                self.sink.set_ai_status(&status);
            }
            Update::Ai(Err(e)) => log::error!("Error refreshing AI status: {}", e),
            Update::Dispatched(outcome) => {
                if outcome.command == Command::ExecuteNow {
                    self.execute_busy = false;
                    self.sink.set_execute_busy(false);
                }
                self.sink.show_notification(outcome.notification, now);
                if outcome.refresh {
                    self.refresh();
                }
            }
        }
    }
}
