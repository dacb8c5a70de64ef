use crate::api::{AiStatus, ArticleSummary, CommandResponse, LogEntry, SchedulerSnapshot, Stats};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Control commands accepted by the automation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ExecuteNow,
    Pause,
    Resume,
}

impl Command {
    pub fn path(&self) -> &'static str {
        match self {
            Command::ExecuteNow => "/api/execute-now",
            Command::Pause => "/api/pause-automation",
            Command::Resume => "/api/resume-automation",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::ExecuteNow => "execute-now",
            Command::Pause => "pause",
            Command::Resume => "resume",
        };
        write!(f, "{}", name)
    }
}

/// Thin JSON client over the automation backend's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn stats(&self) -> Result<Stats, ApiError> {
        self.get_json(crate::STATS_PATH, &[]).await
    }

    pub async fn scheduler_status(&self) -> Result<SchedulerSnapshot, ApiError> {
        self.get_json(crate::SCHEDULER_STATUS_PATH, &[]).await
    }

    pub async fn ai_status(&self) -> Result<AiStatus, ApiError> {
        self.get_json(crate::AI_STATUS_PATH, &[]).await
    }

    pub async fn recent_articles(&self, limit: u32) -> Result<Vec<ArticleSummary>, ApiError> {
        self.get_json(crate::RECENT_ARTICLES_PATH, &[("limit", limit.to_string())]).await
    }

    pub async fn recent_logs(&self, limit: u32) -> Result<Vec<LogEntry>, ApiError> {
        self.get_json(crate::RECENT_LOGS_PATH, &[("limit", limit.to_string())]).await
    }

    /// POST a control command. The backend reports failures as
    /// `{"error": ...}` with a 500, so the body is decoded whatever the status.
    pub async fn send_command(&self, command: Command) -> Result<CommandResponse, ApiError> {
        let url = self.url(command.path());
        log::debug!("POST {}", url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        decode_body(status, &bytes)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let url = self.url(path);
        log::debug!("GET {}", url);
        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        decode_body(status, &bytes)
    }
}

/// Decode a JSON reply. A non-2xx status only fails when its body is not
/// the expected JSON; error pages become `ApiError::Status`.
pub fn decode_body<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T, ApiError> {
    match serde_json::from_slice(bytes) {
        Ok(value) => {
            if !status.is_success() {
                log::warn!("Backend answered {} with a JSON body", status.as_u16());
            }
            Ok(value)
        }
        Err(_) if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(bytes).into_owned(),
        }),
        Err(e) => Err(ApiError::Decode(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new("http://localhost:5000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.url(crate::STATS_PATH), "http://localhost:5000/api/stats");
        assert_eq!(client.url(Command::Pause.path()), "http://localhost:5000/api/pause-automation");
    }

    #[test]
    fn test_command_paths() {
        assert_eq!(Command::ExecuteNow.path(), "/api/execute-now");
        assert_eq!(Command::Resume.path(), "/api/resume-automation");
        assert_eq!(Command::ExecuteNow.to_string(), "execute-now");
    }

    #[test]
    fn test_decode_body_by_status() {
        let resp: CommandResponse = decode_body(StatusCode::INTERNAL_SERVER_ERROR, br#"{"error": "already running"}"#).unwrap();
        assert_eq!(resp.error.as_deref(), Some("already running"));

        let err = decode_body::<CommandResponse>(StatusCode::INTERNAL_SERVER_ERROR, b"<html>Internal Server Error</html>").unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));

        let err = decode_body::<Stats>(StatusCode::OK, b"<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn serve_once(status: &'static str, content_type: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    /// Consume headers and any Content-Length body so closing the socket
    /// does not reset the connection under the client.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&request[..end]).to_lowercase();
                let body_len = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + body_len {
                    return;
                }
            }
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
    }

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_stats_ok_response() {
        let url = serve_once("200 OK", "application/json", r#"{"total_articles": 7, "today_published": null}"#).await;
        let stats = client(&url).stats().await.unwrap();
        assert_eq!(stats.total_articles, 7);
        assert_eq!(stats.today_published, 0);
    }

    #[tokio::test]
    async fn test_scheduler_error_json_reads_as_stopped() {
        let url = serve_once("500 Internal Server Error", "application/json", r#"{"error":"scheduler crashed"}"#).await;
        let snapshot = client(&url).scheduler_status().await.unwrap();
        assert!(!snapshot.running);
        assert!(snapshot.jobs.is_empty());
    }

    #[tokio::test]
    async fn test_html_error_page_is_status_error() {
        let url = serve_once("500 Internal Server Error", "text/html", "<html>Internal Server Error</html>").await;
        let err = client(&url).stats().await.unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("Internal Server Error"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ok_non_json_is_decode_error() {
        let url = serve_once("200 OK", "text/plain", "ok").await;
        let err = client(&url).scheduler_status().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_command_error_body_on_500() {
        let url = serve_once("500 Internal Server Error", "application/json", r#"{"error": "Scheduler not available"}"#).await;
        let resp = client(&url).send_command(Command::Pause).await.unwrap();
        assert_eq!(resp.error.as_deref(), Some("Scheduler not available"));
    }

    #[tokio::test]
    async fn test_closed_port_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr)).stats().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
