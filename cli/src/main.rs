use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use common::{ApiClient, Command, CommandResponse, SchedulerSnapshot, Stats};
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (defaults to $AUTODASH_URL, then http://127.0.0.1:5000)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Timezone used to display timestamps
    #[arg(long, global = true, default_value = common::DEFAULT_TIMEZONE)]
    timezone: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scheduler state and next automation run
    Status,
    /// Article counters
    Stats,
    /// Recently collected articles
    Articles {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
    /// Recent processing log entries
    Logs {
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Run an automation cycle now
    Execute,
    /// Pause the automation scheduler
    Pause,
    /// Resume the automation scheduler
    Resume,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let base_url = cli
        .base_url
        .or_else(|| std::env::var("AUTODASH_URL").ok())
        .unwrap_or_else(|| common::DEFAULT_BASE_URL.to_string());
    let tz: Tz = cli
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid timezone {:?}: {}", cli.timezone, e))?;

    let client = ApiClient::new(&base_url, Duration::from_secs(common::DEFAULT_REQUEST_TIMEOUT_SECS))?;

    match cli.command {
        Commands::Status => {
            let snapshot = client.scheduler_status().await?;
            println!("{}", status_table(&snapshot, tz));
        }
        Commands::Stats => {
            let stats = client.stats().await?;
            println!("{}", stats_table(&stats));
        }
        Commands::Articles { limit } => {
            let articles = client.recent_articles(limit).await?;
            let mut table = Table::new();
            table.set_header(vec!["ID", "Título", "Status", "Feed", "Criado em"]);
            for article in articles {
                table.add_row(vec![
                    article.id.to_string(),
                    article.title.unwrap_or_default(),
                    common::format_status(&article.status).label,
                    article.feed_type.unwrap_or_default(),
                    display_time(&article.created_at, tz),
                ]);
            }
            println!("{}", table);
        }
        Commands::Logs { limit } => {
            let logs = client.recent_logs(limit).await?;
            let mut table = Table::new();
            table.set_header(vec!["Quando", "Artigo", "Ação", "OK", "Mensagem"]);
            for entry in logs {
                table.add_row(vec![
                    display_time(&entry.created_at, tz),
                    entry.article_id.map(|id| id.to_string()).unwrap_or_default(),
                    entry.action,
                    if entry.success { "sim" } else { "não" }.to_string(),
                    entry.message.unwrap_or_default(),
                ]);
            }
            println!("{}", table);
        }
        Commands::Execute => run_command(&client, Command::ExecuteNow).await?,
        Commands::Pause => run_command(&client, Command::Pause).await?,
        Commands::Resume => run_command(&client, Command::Resume).await?,
    }

    Ok(())
}

async fn run_command(client: &ApiClient, command: Command) -> anyhow::Result<()> {
    let resp = client.send_command(command).await?;
    let message = command_message(command, &resp).map_err(anyhow::Error::msg)?;
    println!("{}", message);
    Ok(())
}

fn command_message(command: Command, resp: &CommandResponse) -> Result<String, String> {
    if let Some(error) = &resp.error {
        return Err(format!("{} failed: {}", command, error));
    }
    Ok(resp.message.clone().unwrap_or_else(|| format!("{}: ok", command)))
}

fn status_table(snapshot: &SchedulerSnapshot, tz: Tz) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Job", "Nome", "Próxima execução", "Faltam"]);
    let now = Utc::now();
    for job in &snapshot.jobs {
        let (next, remaining) = match job.next_run_at() {
            Some(ts) => (
                common::format_timestamp(ts, tz),
                common::countdown((ts - now).num_milliseconds()).text,
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![job.id.clone(), job.name.clone().unwrap_or_default(), next, remaining]);
    }

    let state = if snapshot.running { "Ativo" } else { "Parado" };
    let mut outer = Table::new();
    outer.add_row(vec!["Agendador".to_string(), state.to_string()]);
    outer.add_row(vec!["Jobs".to_string(), table.to_string()]);
    outer
}

fn stats_table(stats: &Stats) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Total", "Pendentes", "Processando", "Processados", "Publicados", "Publicados hoje"]);
    table.add_row(vec![
        stats.total_articles,
        stats.pending_articles,
        stats.processing_articles,
        stats.processed_articles,
        stats.published_articles,
        stats.today_published,
    ]);
    table
}

/// Backend timestamps rendered in the display zone; unparsable ones as-is.
fn display_time(raw: &str, tz: Tz) -> String {
    common::parse_timestamp(raw)
        .map(|ts| common::format_datetime(ts, tz))
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::JobEntry;

    #[test]
    fn test_command_message() {
        let ok = CommandResponse::default();
        assert_eq!(command_message(Command::Pause, &ok), Ok("pause: ok".to_string()));

        let failed = CommandResponse { error: Some("not running".to_string()), message: None };
        assert_eq!(
            command_message(Command::Resume, &failed),
            Err("resume failed: not running".to_string())
        );
    }

    #[test]
    fn test_status_table_lists_jobs() {
        let snapshot = SchedulerSnapshot {
            running: false,
            jobs: vec![JobEntry {
                id: "automation_cycle".to_string(),
                name: Some("Automation".to_string()),
                next_run: Some("2024-01-01T10:00:00Z".to_string()),
            }],
        };
        let rendered = status_table(&snapshot, chrono_tz::America::Sao_Paulo).to_string();
        assert!(rendered.contains("Parado"));
        assert!(rendered.contains("automation_cycle"));
        assert!(rendered.contains("01/01/2024, 07:00:00"));
        // Long past, so the job is due.
        assert!(rendered.contains("Executando..."));
    }

    #[test]
    fn test_display_time_falls_back_to_raw() {
        let tz = chrono_tz::UTC;
        assert_eq!(display_time("2024-01-01T10:00:00", tz), "01/01/2024, 10:00");
        assert_eq!(display_time("yesterday", tz), "yesterday");
    }
}
