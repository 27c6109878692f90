//! Error handling for the analysis service client

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Reqwest error: connection failures, timeouts, or an undecodable body.
    #[error("{0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl ApiError {
    pub async fn from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let message = match response.text().await {
            Ok(body) if !body.trim().is_empty() => summarize_body(&body),
            Ok(_) => status.canonical_reason().unwrap_or("no response body").to_string(),
            Err(_) => "Failed to read response text".to_string(),
        };

        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::InvalidBaseUrl(_) => None,
        }
    }
}

/// Pull `detail` out of a FastAPI-style `{"detail": ...}` body, otherwise keep the
/// first line of the raw text.
fn summarize_body(body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = v.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    let first = body.lines().next().unwrap_or("").trim();
    const MAX: usize = 200;
    if first.chars().count() > MAX {
        let cut: String = first.chars().take(MAX).collect();
        format!("{cut}…")
    } else {
        first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_extracted_from_json_body() {
        assert_eq!(
            summarize_body(r#"{"detail":"Trabajo no encontrado"}"#),
            "Trabajo no encontrado"
        );
    }

    #[test]
    fn plain_body_keeps_first_line() {
        assert_eq!(summarize_body("bad gateway\nupstream died"), "bad gateway");
    }

    #[test]
    fn long_body_is_truncated() {
        let body = "x".repeat(500);
        let s = summarize_body(&body);
        assert_eq!(s.chars().count(), 201);
        assert!(s.ends_with('…'));
    }

    #[test]
    fn http_error_display() {
        let e = ApiError::Http {
            status: 404,
            message: "Trabajo no encontrado".into(),
        };
        assert_eq!(e.to_string(), "HTTP 404: Trabajo no encontrado");
        assert_eq!(e.status_code(), Some(404));
    }
}
