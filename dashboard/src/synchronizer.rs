use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use common::{Countdown, SchedulerSnapshot};

use crate::render::RenderSink;

/// Caches the automation job's next run and derives the live countdown.
///
/// `next_run` starts unknown and can only be replaced by another fetched
/// value, never cleared. Overlapping fetches resolve last-completed-wins.
pub struct CountdownSynchronizer {
    job_id: String,
    tz: Tz,
    next_run: Option<DateTime<Utc>>,
}

impl CountdownSynchronizer {
    pub fn new(job_id: impl Into<String>, tz: Tz) -> Self {
        Self {
            job_id: job_id.into(),
            tz,
            next_run: None,
        }
    }

    pub fn next_run(&self) -> Option<DateTime<Utc>> {
        self.next_run
    }

    /// Overwrite the cached next run when a value is present. Returns whether
    /// a value was applied.
    pub fn set_if_present(&mut self, value: Option<DateTime<Utc>>) -> bool {
        match value {
            Some(ts) => {
                if self.next_run != Some(ts) {
                    log::debug!("Next run for {} is now {}", self.job_id, ts.to_rfc3339());
                }
                self.next_run = Some(ts);
                true
            }
            None => false,
        }
    }

    /// Merge a fetched scheduler snapshot. A snapshot without the tracked
    /// job, or with the job but no next run, leaves the cache untouched.
    pub fn absorb(&mut self, snapshot: &SchedulerSnapshot) -> bool {
        let next = snapshot.job(&self.job_id).and_then(|job| job.next_run_at());
        self.set_if_present(next)
    }

    /// `None` while the next run is unknown.
    pub fn countdown(&self, now: DateTime<Utc>) -> Option<Countdown> {
        let next_run = self.next_run?;
        Some(common::countdown((next_run - now).num_milliseconds()))
    }

    /// Paint the next execution time and countdown. Leaves the display
    /// untouched while the next run is unknown.
    pub fn render<R: RenderSink + ?Sized>(&self, now: DateTime<Utc>, sink: &mut R) {
        let Some(next_run) = self.next_run else {
            return;
        };
        sink.set_next_execution_time(&common::format_timestamp(next_run, self.tz));
        if let Some(countdown) = self.countdown(now) {
            sink.set_countdown(&countdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DashboardView;
    use chrono::TimeZone;
    use common::{JobEntry, Severity};

    fn snapshot(jobs: &[(&str, Option<&str>)]) -> SchedulerSnapshot {
        SchedulerSnapshot {
            running: true,
            jobs: jobs
                .iter()
                .map(|(id, next_run)| JobEntry {
                    id: id.to_string(),
                    name: None,
                    next_run: next_run.map(|s| s.to_string()),
                })
                .collect(),
        }
    }

    fn sync() -> CountdownSynchronizer {
        CountdownSynchronizer::new("automation_cycle", chrono_tz::America::Sao_Paulo)
    }

    #[test]
    fn test_set_once_then_overwrite_only_on_success() {
        let mut sync = sync();
        assert_eq!(sync.next_run(), None);

        // A failed fetch never reaches absorb; the state stays unknown.
        assert!(!sync.set_if_present(None));
        assert_eq!(sync.next_run(), None);

        assert!(sync.absorb(&snapshot(&[("automation_cycle", Some("2024-01-01T10:00:00Z"))])));
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(sync.next_run(), Some(expected));

        assert!(!sync.absorb(&snapshot(&[("cleanup", Some("2024-01-02T00:00:00Z"))])));
        assert!(!sync.absorb(&snapshot(&[("automation_cycle", None)])));
        assert!(!sync.absorb(&snapshot(&[])));
        assert_eq!(sync.next_run(), Some(expected));
    }

    #[test]
    fn test_last_fetch_wins_even_if_earlier() {
        let mut sync = sync();
        sync.absorb(&snapshot(&[("automation_cycle", Some("2024-01-01T10:00:00Z"))]));
        sync.absorb(&snapshot(&[("automation_cycle", Some("2024-01-01T09:00:00Z"))]));
        assert_eq!(sync.next_run(), Some(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
    }

    #[test]
    fn test_unknown_renders_nothing() {
        let sync = sync();
        let mut view = DashboardView::default();
        view.set_next_execution_time("previous");

        sync.render(Utc::now(), &mut view);
        assert_eq!(view.next_execution_time.as_deref(), Some("previous"));
        assert!(view.countdown.is_none());
        assert!(sync.countdown(Utc::now()).is_none());
    }

    #[test]
    fn test_countdown_progression() {
        let mut sync = sync();
        sync.absorb(&snapshot(&[("automation_cycle", Some("2030-01-01T00:02:30Z"))]));
        let mut view = DashboardView::default();

        sync.render(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(), &mut view);
        assert_eq!(view.next_execution_time.as_deref(), Some("31/12/2029, 21:02:30"));
        let countdown = view.countdown.clone().unwrap();
        assert_eq!(countdown.text, "2m 30s");
        // Two whole minutes left falls in the 1..5 minute band.
        assert_eq!(countdown.severity, Severity::Warning);

        sync.render(Utc.with_ymd_and_hms(2030, 1, 1, 0, 2, 0).unwrap(), &mut view);
        let countdown = view.countdown.clone().unwrap();
        assert_eq!(countdown.text, "30s");
        assert_eq!(countdown.severity, Severity::Critical);

        sync.render(Utc.with_ymd_and_hms(2030, 1, 1, 0, 2, 30).unwrap(), &mut view);
        let countdown = view.countdown.clone().unwrap();
        assert_eq!(countdown.text, "Executando...");
        assert_eq!(countdown.severity, Severity::Info);
        // Absolute time is still shown once due.
        assert_eq!(view.next_execution_time.as_deref(), Some("31/12/2029, 21:02:30"));
    }
}
