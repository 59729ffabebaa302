//! Parcelo MCP (Model Context Protocol) Server
//!
//! This crate exposes parcel booking to AI agents over MCP. One free-text
//! message drives the same pipeline the HTTP server uses: extraction,
//! validation, entity resolution, trip setup, pricing, and submission.
//!
//! - `ParceloMcpServer`: Main server implementing the MCP protocol
//! - Tools: `create_parcel`, `parcel_preview`, `entity_list`

mod server;

pub use server::ParceloMcpServer;

use thiserror::Error;

/// Errors specific to MCP tool operations
#[derive(Error, Debug)]
pub enum McpError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("resolution error: {0}")]
    Resolution(String),

    #[error("remote api error: {0}")]
    Remote(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::Validation(_) => -32602, // Invalid params
            McpError::Resolution(_) => -32600, // Invalid request
            McpError::Remote(_) | McpError::Internal(_) => -32603, // Internal error
        }
    }
}

/// Result type for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use crate::McpError;

    #[test]
    fn error_codes_follow_json_rpc_conventions() {
        assert_eq!(McpError::Validation("empty message".into()).error_code(), -32602);
        assert_eq!(McpError::Resolution("unknown city".into()).error_code(), -32600);
        assert_eq!(McpError::Remote("503".into()).error_code(), -32603);
        assert_eq!(McpError::Internal("oops".into()).error_code(), -32603);
    }
}
