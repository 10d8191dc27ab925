//! Turn collected header lines into an `http::Response`.

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Response};

/// Build a response from curl's status code, header lines and body.
///
/// With redirects curl reports the headers of every hop; only the block after
/// the last status line is kept.
pub(crate) fn build_response(
    code: u32,
    lines: &[String],
    body: Vec<u8>,
) -> Result<Response<Vec<u8>>, http::Error> {
    let status = u16::try_from(code).unwrap_or(0);
    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        *headers = parse_headers(lines);
    }
    builder.body(body)
}

fn parse_headers(lines: &[String]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        // Malformed lines are skipped rather than failing the whole response.
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.trim().as_bytes()),
            HeaderValue::from_str(value.trim()),
        ) {
            headers.append(name, value);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_LENGTH, RETRY_AFTER};
    use http::StatusCode;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_status_headers_and_body() {
        let raw = lines(&[
            "HTTP/1.1 503 Service Unavailable",
            "Retry-After: 120",
            "Content-Length: 4",
            "",
        ]);
        let rsp = build_response(503, &raw, b"busy".to_vec()).unwrap();
        assert_eq!(rsp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(rsp.headers()[RETRY_AFTER], "120");
        assert_eq!(rsp.headers()[CONTENT_LENGTH], "4");
        assert_eq!(rsp.body(), b"busy");
    }

    #[test]
    fn keeps_only_final_hop_headers() {
        let raw = lines(&[
            "HTTP/1.1 302 Found",
            "Location: /elsewhere",
            "Retry-After: 999",
            "",
            "HTTP/1.1 429 Too Many Requests",
            "Retry-After: 5",
            "",
        ]);
        let rsp = build_response(429, &raw, Vec::new()).unwrap();
        assert!(rsp.headers().get("location").is_none());
        assert_eq!(rsp.headers()[RETRY_AFTER], "5");
    }

    #[test]
    fn skips_malformed_lines() {
        let raw = lines(&["HTTP/1.1 200 OK", "no colon here", "Bad Name: x", "X-Ok: yes"]);
        let rsp = build_response(200, &raw, Vec::new()).unwrap();
        assert_eq!(rsp.headers().len(), 1);
        assert_eq!(rsp.headers()["x-ok"], "yes");
    }

    #[test]
    fn missing_status_is_an_error() {
        assert!(build_response(0, &[], Vec::new()).is_err());
    }

    #[test]
    fn http_date_value_survives() {
        let raw = lines(&["HTTP/1.1 503 Service Unavailable", "Retry-After: Wed, 21 Oct 2015 07:28:00 GMT"]);
        let rsp = build_response(503, &raw, Vec::new()).unwrap();
        assert_eq!(rsp.headers()[RETRY_AFTER], "Wed, 21 Oct 2015 07:28:00 GMT");
    }
}
