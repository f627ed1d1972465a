//! Structured errors for the favicache server.
//!
//! Agent and store failures already map through `favicache_core::Error`;
//! these cover the page-side machinery the tools drive.

use rmcp::model::{ErrorCode, ErrorData as McpError};

use favicache_client::page::TransitionError;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The crossfade machine received an event it cannot accept.
    #[error("TRANSITION_ERROR: {0}")]
    Transition(#[from] TransitionError),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::Transition(_) => -32010,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_maps_to_mcp() {
        let err: McpError = ToolError::from(TransitionError { state: "Settled", event: "Retry" }).into();
        assert_eq!(err.code, ErrorCode(-32010));
        assert_eq!(err.message, "TRANSITION_ERROR: invalid crossfade transition: Retry in Settled");
    }
}
