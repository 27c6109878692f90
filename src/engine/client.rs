//! HTTP client for the analysis service.
//!
//! `AnalysisApi` is the seam the controller talks to; `AnalysisClient` is the
//! reqwest-backed implementation used outside of tests.

use crate::engine::error::ApiError;
use crate::model::{ControllerConfig, JobStatusResponse, SubmitRequest, SubmitResponse};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

#[async_trait]
pub trait AnalysisApi: Send + Sync + 'static {
    /// `POST submit_job` with `{"text": ...}`.
    async fn submit_job(&self, text: &str) -> Result<SubmitResponse, ApiError>;

    /// `GET job_status/{job_id}`.
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ApiError>;
}

pub struct AnalysisClient {
    http: Client,
    base_url: Url,
}

impl AnalysisClient {
    pub fn new(cfg: &ControllerConfig) -> Result<Self, ApiError> {
        let base_url = parse_base_url(&cfg.base_url)?;

        let mut builder = Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint(&self.base_url, segments)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw.trim()).map_err(|_| ApiError::InvalidBaseUrl(raw.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

/// Append path segments to the base URL, keeping any path prefix it already has.
/// Segments are percent-encoded, so an opaque job id cannot escape its segment.
fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl AnalysisApi for AnalysisClient {
    async fn submit_job(&self, text: &str) -> Result<SubmitResponse, ApiError> {
        let url = self.endpoint(&["submit_job"])?;
        debug!(%url, chars = text.chars().count(), "submitting job");

        let resp = self
            .http
            .post(url)
            .json(&SubmitRequest { text })
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(resp).await);
        }
        Ok(resp.json::<SubmitResponse>().await?)
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, ApiError> {
        let url = self.endpoint(&["job_status", job_id])?;
        debug!(%url, "checking job status");

        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::from_response(resp).await);
        }
        Ok(resp.json::<JobStatusResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RemoteStatus;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer one HTTP request with a canned JSON response. The handle yields the
    /// raw request that was received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (AnalysisClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let request = read_request(&mut sock).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            let _ = sock.shutdown().await;
            request
        });
        let cfg = ControllerConfig {
            base_url: format!("http://{addr}/"),
            ..Default::default()
        };
        (AnalysisClient::new(&cfg).unwrap(), handle)
    }

    async fn read_request(sock: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .filter_map(|l| l.split_once(':'))
                    .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    #[tokio::test]
    async fn submit_sends_text_and_decodes_job() {
        let (client, server) =
            serve_once("200 OK", r#"{"job_id":"5f0c2a7e","status":"PENDING"}"#).await;

        let resp = client.submit_job("I love this!").await.unwrap();
        assert_eq!(
            resp,
            SubmitResponse {
                job_id: "5f0c2a7e".into(),
                status: RemoteStatus::Pending,
            }
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /submit_job HTTP/1.1"));
        assert!(request.ends_with(r#"{"text":"I love this!"}"#));
    }

    #[tokio::test]
    async fn status_with_null_keywords_decodes() {
        let (client, server) = serve_once(
            "200 OK",
            r#"{"job_id":"abc","status":"PROCESSING","sentiment":null,"keywords":null}"#,
        )
        .await;

        let resp = client.job_status("abc").await.unwrap();
        assert_eq!(resp.status, RemoteStatus::Processing);
        assert_eq!(resp.sentiment, None);
        assert_eq!(resp.keywords, None);
        assert!(server.await.unwrap().starts_with("GET /job_status/abc HTTP/1.1"));
    }

    #[tokio::test]
    async fn not_found_maps_to_http_error_with_detail() {
        let (client, _server) =
            serve_once("404 Not Found", r#"{"detail":"Trabajo no encontrado"}"#).await;

        let err = client.job_status("missing").await.unwrap_err();
        assert!(matches!(&err, ApiError::Http { status: 404, .. }));
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: Trabajo no encontrado");
    }

    #[tokio::test]
    async fn unknown_status_is_a_decode_failure() {
        let (client, _server) = serve_once("200 OK", r#"{"status":"QUEUED"}"#).await;

        let err = client.job_status("abc").await.unwrap_err();
        assert!(matches!(&err, ApiError::Request(e) if e.is_decode()));
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn submit_server_error_keeps_plain_body() {
        let (client, _server) = serve_once("500 Internal Server Error", "boom\ntrace").await;

        let err = client.submit_job("x").await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    fn join(base: &str, segments: &[&str]) -> String {
        endpoint(&parse_base_url(base).unwrap(), segments)
            .unwrap()
            .to_string()
    }

    #[test]
    fn endpoint_on_bare_host() {
        assert_eq!(
            join("http://localhost:8000", &["submit_job"]),
            "http://localhost:8000/submit_job"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_and_prefix() {
        assert_eq!(
            join("https://api.example.com/v1/", &["job_status", "abc"]),
            "https://api.example.com/v1/job_status/abc"
        );
        assert_eq!(
            join("https://api.example.com/v1", &["job_status", "abc"]),
            "https://api.example.com/v1/job_status/abc"
        );
    }

    #[test]
    fn job_id_is_encoded_as_one_segment() {
        assert_eq!(
            join("http://localhost:8000", &["job_status", "a/b c"]),
            "http://localhost:8000/job_status/a%2Fb%20c"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(parse_base_url("localhost:8000").is_err());
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("ftp://example.com").is_err());
    }

    #[test]
    fn client_builds_from_default_config() {
        let client = AnalysisClient::new(&ControllerConfig::default()).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8000/");
    }
}
