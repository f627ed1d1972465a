//! Cache query protocol wire types.
//!
//! Request:  `{ "message": "IS_FAVICON_CACHED", "request":  { "url": string } }`
//! Response: `{ "message": "IS_FAVICON_CACHED", "response": { "isCached": bool } }`
//!
//! Field names and the tag literal are exact. Receivers ignore unknown fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Message tags understood by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum MessageKind {
    #[serde(rename = "IS_FAVICON_CACHED")]
    IsFaviconCached,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::IsFaviconCached => "IS_FAVICON_CACHED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UrlPayload {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedPayload {
    #[serde(rename = "isCached")]
    pub is_cached: bool,
}

/// Page to agent: "is this URL in the current store?"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FaviconCachedRequest {
    pub message: MessageKind,
    pub request: UrlPayload,
}

impl FaviconCachedRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { message: MessageKind::IsFaviconCached, request: UrlPayload { url: url.into() } }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "message": self.message.as_str(),
            "request": { "url": self.request.url },
        })
    }
}

/// Agent to page: the single answer to a [`FaviconCachedRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FaviconCachedResponse {
    pub message: MessageKind,
    pub response: CachedPayload,
}

impl FaviconCachedResponse {
    pub fn new(is_cached: bool) -> Self {
        Self { message: MessageKind::IsFaviconCached, response: CachedPayload { is_cached } }
    }

    pub fn to_value(self) -> Value {
        serde_json::json!({
            "message": self.message.as_str(),
            "response": { "isCached": self.response.is_cached },
        })
    }

    /// Decode a reply payload.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| Error::Protocol(format!("malformed response: {e}")))
    }
}

/// A decoded message as seen by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentMessage {
    IsFaviconCached { url: String },
    /// A tag this agent does not handle. Logged and dropped.
    Unknown { kind: String },
}

impl AgentMessage {
    /// Decode an incoming payload.
    ///
    /// The tag is compared after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `Protocol` when the payload has no string `message` field, or when a
    /// known tag carries a body that does not match its shape.
    pub fn decode(payload: &Value) -> Result<Self, Error> {
        let kind = payload
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Protocol("missing message tag".into()))?
            .trim();

        if kind == MessageKind::IsFaviconCached.as_str() {
            let body = payload
                .get("request")
                .cloned()
                .ok_or_else(|| Error::Protocol(format!("{kind}: missing request body")))?;
            let UrlPayload { url } =
                serde_json::from_value(body).map_err(|e| Error::Protocol(format!("{kind}: {e}")))?;
            return Ok(AgentMessage::IsFaviconCached { url });
        }

        Ok(AgentMessage::Unknown { kind: kind.to_string() })
    }
}
