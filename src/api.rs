use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::DispatchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskQuery {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AskReply {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<Source>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Source {
    pub book: String,
    #[serde(default)]
    pub page: Page,
}

/// Page reference of a source. The service sends a label such as `"N/A"`
/// when the document carries no page metadata, and may send `null`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum Page {
    Number(f64),
    Label(String),
    #[default]
    Missing,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Number(n) => write!(f, "{}", n),
            Page::Label(label) => f.write_str(label),
            Page::Missing => f.write_str("N/A"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiagnosisReply {
    pub diagnosis: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyPayload {
    Answer(AskReply),
    Diagnosis(DiagnosisReply),
}

/// Remote assistant service
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn ask(&self, query: &AskQuery) -> Result<AskReply, DispatchError>;

    async fn diagnose(&self) -> Result<DiagnosisReply, DispatchError>;
}

/// `AssistantBackend` over HTTP: `POST /ask` and `GET /diagnose`
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, DispatchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    async fn ask(&self, query: &AskQuery) -> Result<AskReply, DispatchError> {
        let url = format!("{}/ask", self.base_url);

        let response = self.client.post(&url).json(query).send().await?;
        Self::read_json(response).await
    }

    async fn diagnose(&self) -> Result<DiagnosisReply, DispatchError> {
        let url = format!("{}/diagnose", self.base_url);

        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned response and hand back the raw request that was received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&raw);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&raw).into_owned()
        });

        (base_url, handle)
    }

    fn question(text: &str) -> AskQuery {
        AskQuery {
            question: text.to_string(),
        }
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_reply_with_missing_or_null_sources() {
        let missing: AskReply = serde_json::from_str(r#"{"answer":"a"}"#).unwrap();
        let null: AskReply = serde_json::from_str(r#"{"answer":"a","sources":null}"#).unwrap();
        assert_eq!(missing.sources, None);
        assert_eq!(null.sources, None);
    }

    #[test]
    fn test_page_accepts_numbers_and_labels() {
        let reply: AskReply = serde_json::from_str(
            r#"{"answer":"a","sources":[{"book":"A","page":5},{"book":"B","page":"N/A"}]}"#,
        )
        .unwrap();
        let sources = reply.sources.unwrap();
        assert_eq!(sources[0].page.to_string(), "5");
        assert_eq!(sources[1].page.to_string(), "N/A");
    }

    #[test]
    fn test_null_or_absent_page_keeps_the_answer() {
        let reply: AskReply = serde_json::from_str(
            r#"{"answer":"a","sources":[{"book":"A","page":null},{"book":"B"}]}"#,
        )
        .unwrap();
        let sources = reply.sources.unwrap();
        assert_eq!(sources[0].page, Page::Missing);
        assert_eq!(sources[1].page, Page::Missing);
        assert_eq!(sources[0].page.to_string(), "N/A");
    }

    #[tokio::test]
    async fn test_ask_posts_question_and_parses_reply() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"answer":"Fever is...","sources":[{"book":"Gale","page":12}]}"#,
        )
        .await;

        let backend = HttpBackend::new(&base_url);
        let reply = backend.ask(&question("What is fever?")).await.unwrap();
        assert_eq!(reply.answer, "Fever is...");
        assert_eq!(reply.sources.unwrap()[0].book, "Gale");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /ask "));
        assert!(request.contains(r#"{"question":"What is fever?"}"#));
    }

    #[tokio::test]
    async fn test_diagnose_uses_get() {
        let (base_url, server) = serve_once("200 OK", r#"{"diagnosis":"Stable."}"#).await;

        let backend = HttpBackend::new(&base_url);
        let reply = backend.diagnose().await.unwrap();
        assert_eq!(reply.diagnosis, "Stable.");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /diagnose "));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let (base_url, _server) =
            serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;

        let backend = HttpBackend::new(&base_url);
        let err = backend.diagnose().await.unwrap_err();
        assert!(matches!(err, DispatchError::Status(s) if s.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let (base_url, _server) = serve_once("200 OK", r#"{"unexpected":true}"#).await;

        let backend = HttpBackend::new(&base_url);
        let err = backend.ask(&question("q")).await.unwrap_err();
        assert!(matches!(err, DispatchError::MalformedBody(_)));
    }

    #[tokio::test]
    async fn test_configured_timeout_fails_a_stalled_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let api_url = format!("http://{}", listener.local_addr().unwrap());

        // Accept and hold the connection without ever answering
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let config = Config {
            api_url,
            request_timeout_secs: Some(1),
        };
        let backend = HttpBackend::from_config(&config).unwrap();

        let err = backend.ask(&question("What is fever?")).await.unwrap_err();
        assert!(matches!(&err, DispatchError::Transport(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_transport_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let backend = HttpBackend::new(&format!("http://{}", addr));
        let err = backend.diagnose().await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)));
    }
}
