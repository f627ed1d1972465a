//! Captured HTTP responses as stored in the cache.

use serde::{Deserialize, Serialize};

/// Status used for the synthesized response when every tier failed.
pub const NETWORK_ERROR_STATUS: u16 = 400;

/// Body of the synthesized network error response.
pub const NETWORK_ERROR_BODY: &str = "Network error occurred";

/// A response captured from the network (or synthesized by the agent).
///
/// This is an owned value: handing a clone to the cache and the original to
/// the page never leaves either side with a consumed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// A `text/plain` response.
    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, vec![("Content-Type".into(), "text/plain".into())], body.as_bytes())
    }

    /// The response returned when cache, preload, network and fallback all failed.
    pub fn network_error() -> Self {
        Self::text(NETWORK_ERROR_STATUS, NETWORK_ERROR_BODY)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Header lookup, case-insensitive on the name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_shape() {
        let resp = CapturedResponse::network_error();
        assert_eq!(resp.status, 400);
        assert!(!resp.is_success());
        assert_eq!(resp.content_type(), Some("text/plain"));
        assert_eq!(resp.body, b"Network error occurred");
    }

    #[test]
    fn test_header_case_insensitive() {
        let resp = CapturedResponse::new(200, vec![("ETag".into(), "\"abc\"".into())], Vec::new());
        assert_eq!(resp.header("etag"), Some("\"abc\""));
        assert_eq!(resp.header("last-modified"), None);
    }

    #[test]
    fn test_success_range() {
        assert!(CapturedResponse::new(204, vec![], vec![]).is_success());
        assert!(!CapturedResponse::new(304, vec![], vec![]).is_success());
        assert!(!CapturedResponse::new(199, vec![], vec![]).is_success());
    }
}
