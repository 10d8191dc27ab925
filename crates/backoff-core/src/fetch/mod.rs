//! HTTP GET through libcurl.
//!
//! [`fetch`] performs one blocking request and returns an `http::Response`
//! so the HTTP retry policy can inspect status and `Retry-After`.
//! [`fetch_with_retry`] runs it on the blocking pool under a
//! [`RetryController`].

mod parse;

use std::str;
use std::time::Duration;

use http::Response;

use crate::classify::decide_http;
use crate::config::HttpConfig;
use crate::retry::{run_with_retry, RetryController, RetryDecision, RetryError};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// libcurl failed before a response arrived (DNS, connect, timeout, ...).
    #[error("transfer failed: {0}")]
    Transport(#[from] curl::Error),
    /// The response could not be represented (e.g. no status code).
    #[error("invalid response: {0}")]
    Invalid(#[from] http::Error),
    /// A complete response with a non-2xx status.
    #[error("HTTP {}", .0.status())]
    Status(Box<Response<Vec<u8>>>),
    #[error("fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl FetchError {
    /// Retry verdict: transient transport failures retry with backoff,
    /// statuses follow the HTTP policy, everything else is final.
    pub fn decision(&self) -> RetryDecision {
        match self {
            FetchError::Transport(e) if is_transient(e) => RetryDecision::Retry,
            FetchError::Status(rsp) => decide_http(rsp),
            _ => RetryDecision::NoRetry,
        }
    }
}

/// Connection-level curl failures that a later attempt may not hit.
fn is_transient(e: &curl::Error) -> bool {
    e.is_operation_timedout()
        || e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
}

/// Performs a GET request and returns the final response (after redirects).
///
/// Any status is returned as `Ok`; only transfer failures are errors.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
pub fn fetch(
    url: &str,
    custom_headers: &[(String, String)],
    cfg: &HttpConfig,
) -> Result<Response<Vec<u8>>, FetchError> {
    let mut header_lines: Vec<String> = Vec::new();
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))?;
    easy.timeout(Duration::from_secs(cfg.timeout_secs))?;

    if !custom_headers.is_empty() {
        let mut list = curl::easy::List::new();
        for (k, v) in custom_headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        easy.http_headers(list)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                header_lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let code = easy.response_code()?;
    tracing::debug!(url, code, bytes = body.len(), "fetch finished");
    Ok(parse::build_response(code, &header_lines, body)?)
}

/// GET `url` until a 2xx response arrives, honouring `Retry-After` on 429/5xx.
pub async fn fetch_with_retry(
    controller: &mut RetryController,
    url: &str,
    custom_headers: &[(String, String)],
    cfg: &HttpConfig,
) -> Result<Response<Vec<u8>>, RetryError<FetchError>> {
    run_with_retry(
        controller,
        || {
            let url = url.to_owned();
            let headers = custom_headers.to_vec();
            let cfg = cfg.clone();
            async move {
                let rsp =
                    tokio::task::spawn_blocking(move || fetch(&url, &headers, &cfg)).await??;
                if rsp.status().is_success() {
                    Ok(rsp)
                } else {
                    Err(FetchError::Status(Box::new(rsp)))
                }
            }
        },
        FetchError::decision,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_error(status: u16, retry_after: Option<&str>) -> FetchError {
        let mut builder = Response::builder().status(status);
        if let Some(v) = retry_after {
            builder = builder.header(http::header::RETRY_AFTER, v);
        }
        FetchError::Status(Box::new(builder.body(Vec::new()).unwrap()))
    }

    #[test]
    fn status_errors_follow_http_policy() {
        assert_eq!(status_error(404, None).decision(), RetryDecision::NoRetry);
        assert_eq!(status_error(500, None).decision(), RetryDecision::Retry);
        assert_eq!(
            status_error(429, Some("2")).decision(),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
    }

    #[test]
    fn status_error_display() {
        assert_eq!(status_error(503, None).to_string(), "HTTP 503 Service Unavailable");
    }

    #[test]
    fn transient_curl_errors_retry() {
        // CURLE_COULDNT_CONNECT
        assert_eq!(
            FetchError::Transport(curl::Error::new(7)).decision(),
            RetryDecision::Retry
        );
        // CURLE_OPERATION_TIMEDOUT
        assert_eq!(
            FetchError::Transport(curl::Error::new(28)).decision(),
            RetryDecision::Retry
        );
        // CURLE_URL_MALFORMAT
        assert_eq!(
            FetchError::Transport(curl::Error::new(3)).decision(),
            RetryDecision::NoRetry
        );
    }
}
