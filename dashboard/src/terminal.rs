use chrono::{DateTime, Utc};
use comfy_table::{Attribute, Cell, Color, Table};
use common::{AiStatus, Countdown, Severity, Stats};
use std::io::Write;

use crate::render::{DashboardView, Notification, NotificationKind, RenderSink};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Redraws the whole dashboard on stdout after every batch of updates.
pub struct TerminalSink {
    view: DashboardView,
}

impl TerminalSink {
    pub fn new(view: DashboardView) -> Self {
        Self { view }
    }

    fn draw(&self) -> String {
        let view = &self.view;
        let mut out = String::new();

        out.push_str("Content Automation Dashboard");
        if let Some(now) = &view.current_time {
            out.push_str(&format!("    {}", now));
        }
        out.push_str("\n\n");

        for shown in &view.notifications {
            let tag = notification_tag(shown.notification.kind);
            out.push_str(&format!("[{}] {}\n", tag, shown.notification.message));
        }
        if !view.notifications.is_empty() {
            out.push('\n');
        }

        let stats = view.statistics.clone().unwrap_or_default();
        let mut cards = Table::new();
        cards.set_header(vec!["Total", "Pendentes", "Processados", "Publicados"]);
        cards.add_row(vec![
            stats.total_articles.to_string(),
            stats.pending_articles.to_string(),
            stats.processed_articles.to_string(),
            stats.published_articles.to_string(),
        ]);
        out.push_str(&format!("{}\n\n", cards));

        let mut scheduler = Table::new();
        let status = match view.scheduler_running {
            Some(true) => Cell::new("Ativo").fg(Color::Green),
            Some(false) => Cell::new("Parado").fg(Color::Red),
            None => Cell::new("-"),
        };
        scheduler.add_row(vec![Cell::new("Agendador"), status]);
        scheduler.add_row(vec![
            Cell::new("Próxima execução"),
            Cell::new(view.next_execution_time.as_deref().unwrap_or("-")),
        ]);
        scheduler.add_row(vec![Cell::new("Contagem regressiva"), countdown_cell(view.countdown.as_ref())]);
        out.push_str(&format!("{}\n\n", scheduler));

        if let Some(ai) = &view.ai_status {
            out.push_str(&format!("{}\n\n", ai_table(ai)));
        }

        let execute = if view.execute_busy { "[e] Executando..." } else { "[e] Executar agora" };
        out.push_str(&format!("{}   [p] Pausar   [r] Retomar   [f] Atualizar   [q] Sair\n", execute));
        out
    }
}

impl RenderSink for TerminalSink {
    fn set_current_time(&mut self, text: &str) {
        self.view.set_current_time(text);
    }

    fn set_scheduler_running(&mut self, running: bool) {
        self.view.set_scheduler_running(running);
    }

    fn set_next_execution_time(&mut self, text: &str) {
        self.view.set_next_execution_time(text);
    }

    fn set_countdown(&mut self, countdown: &Countdown) {
        self.view.set_countdown(countdown);
    }

    fn set_statistics(&mut self, stats: &Stats) {
        self.view.set_statistics(stats);
    }

    fn set_ai_status(&mut self, status: &AiStatus) {
        self.view.set_ai_status(status);
    }

    fn set_execute_busy(&mut self, busy: bool) {
        self.view.set_execute_busy(busy);
    }

    fn show_notification(&mut self, notification: Notification, now: DateTime<Utc>) {
        self.view.show_notification(notification, now);
    }

    fn present(&mut self, now: DateTime<Utc>) {
        self.view.present(now);
        let frame = self.draw();
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = write!(stdout, "{}{}", CLEAR_SCREEN, frame).and_then(|_| stdout.flush()) {
            log::error!("Failed to draw dashboard: {}", e);
        }
    }
}

fn countdown_cell(countdown: Option<&Countdown>) -> Cell {
    let Some(countdown) = countdown else {
        return Cell::new("-");
    };
    let color = match countdown.severity {
        Severity::Critical => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Normal => Color::Green,
        Severity::Info => Color::Cyan,
    };
    Cell::new(&countdown.text).fg(color).add_attribute(Attribute::Bold)
}

fn notification_tag(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "ok",
        NotificationKind::Warning => "aviso",
        NotificationKind::Danger => "erro",
        NotificationKind::Info => "info",
    }
}

/// One row per AI type when the payload has the usual
/// `{type: {primary_available, backup_available, last_used}}` shape,
/// raw JSON otherwise.
fn ai_table(status: &AiStatus) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["IA", "Primária", "Backup", "Último uso"]);

    let Some(entries) = status.as_object() else {
        table.add_row(vec![status.to_string()]);
        return table;
    };

    for (name, entry) in entries {
        let flag = |key: &str| match entry.get(key).and_then(|v| v.as_bool()) {
            Some(true) => "sim",
            Some(false) => "não",
            None => "-",
        };
        let last_used = entry
            .get("last_used")
            .and_then(|v| v.as_str())
            .unwrap_or("-")
            .to_string();
        table.add_row(vec![name.clone(), flag("primary_available").to_string(), flag("backup_available").to_string(), last_used]);
    }
    table
}
