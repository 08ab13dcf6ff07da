// OpenAI API HTTP client.
// Handles authentication, retries and request/response processing.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;

use crate::error::{Result, ScoutError};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Retry policy for rate limits, server errors and dropped connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    /// Delay before the first retry; doubles on every further retry.
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    fn delay(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.backoff.saturating_mul(2u32.pow(exponent))
    }
}

/// OpenAI API client with bearer authentication.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    retry: RetryConfig,
}

impl OpenAiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ScoutError::Other(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("contact-scout"));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ScoutError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a POST request with a JSON body, retrying transient failures.
    pub async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut attempt = 1;

        loop {
            let result = match self.client.post(&url).json(body).send().await {
                Ok(response) => check_response(response).await,
                Err(e) => Err(ScoutError::Http(e)),
            };

            match result {
                Err(e) if attempt < self.retry.max_attempts && is_transient(&e) => {
                    let delay = self.retry.delay(attempt);
                    log::warn!(
                        "POST {} failed ({}), retry {}/{} in {:?}",
                        endpoint,
                        e,
                        attempt,
                        self.retry.max_attempts - 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

fn is_transient(error: &ScoutError) -> bool {
    match error {
        ScoutError::RateLimited(_) | ScoutError::Server { .. } => true,
        ScoutError::Http(e) => e.is_connect() || e.is_timeout(),
        _ => false,
    }
}

/// Check response status and convert errors.
async fn check_response(response: Response) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED => Err(ScoutError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => Err(ScoutError::RateLimited(
            response.text().await.unwrap_or_default(),
        )),
        status if status.is_server_error() => Err(ScoutError::Server {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
        status => Err(ScoutError::Other(format!(
            "HTTP {}: {}",
            status,
            response.text().await.unwrap_or_default()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// Answer each connection with the next canned status line and body.
    /// The last response repeats once the list runs out.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)];
                read_request(&mut stream).await;
                let reply = format!(
                    "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(reply.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
        });

        (format!("http://{}/v1", addr), hits)
    }

    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            let Some(head_end) = text.find("\r\n\r\n") else {
                continue;
            };
            let length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + length {
                return;
            }
        }
    }

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new("sk-test", base_url)
            .unwrap()
            .with_retry(RetryConfig {
                max_attempts: 3,
                backoff: Duration::from_millis(1),
            })
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = OpenAiClient::new("sk-test", "http://localhost:8080/v1/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_invalid_key_rejected() {
        let result = OpenAiClient::new("bad\nkey", OPENAI_API_BASE);
        assert!(matches!(result, Err(ScoutError::Other(_))));
    }

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay(1), Duration::from_millis(500));
        assert_eq!(retry.delay(2), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_unauthorized_not_retried() {
        let (base, hits) = serve(vec![(401, r#"{"error":"bad key"}"#)]).await;
        let result = client(&base).post("/chat/completions", "{}").await;

        assert!(matches!(result, Err(ScoutError::Unauthorized)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_other_status_not_retried() {
        let (base, hits) = serve(vec![(400, "bad request")]).await;
        let result = client(&base).post("/chat/completions", "{}").await;

        match result {
            Err(ScoutError::Other(message)) => assert!(message.contains("bad request")),
            other => panic!("unexpected result: {:?}", other.map(|r| r.status())),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_and_server_error_retried() {
        let (base, hits) = serve(vec![
            (429, "slow down"),
            (503, "busy"),
            (200, r#"{"choices":[]}"#),
        ])
        .await;
        let response = client(&base).post("/chat/completions", "{}").await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_max_attempts() {
        let (base, hits) = serve(vec![(429, "slow down")]).await;
        let result = client(&base).post("/chat/completions", "{}").await;

        match result {
            Err(ScoutError::RateLimited(body)) => assert_eq!(body, "slow down"),
            other => panic!("unexpected result: {:?}", other.map(|r| r.status())),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
