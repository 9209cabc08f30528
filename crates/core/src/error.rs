//! Error types for the memclaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] aggregates them.

use thiserror::Error;

/// The top-level error type for all memclaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion service ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Memory service ---
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    // --- Tool execution ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Startup ---
    #[error("Bootstrap failed: {0}")]
    Bootstrap(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    InvalidResponse(String),
}

/// Failures reported by the external memory service.
#[derive(Debug, Clone, Error)]
pub enum MemoryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid identifier: '{0}'")]
    InvalidId(String),

    #[error("Request rejected: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool requested: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Tool {tool_name} failed: {source}")]
    Memory {
        tool_name: String,
        #[source]
        source: MemoryError,
    },
}

impl ToolError {
    /// The tool name this error concerns.
    pub fn tool_name(&self) -> &str {
        match self {
            ToolError::UnknownTool(name) => name,
            ToolError::InvalidArguments { tool_name, .. } => tool_name,
            ToolError::Memory { tool_name, .. } => tool_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn unknown_tool_is_distinct_from_memory_failure() {
        let unknown = ToolError::UnknownTool("launch_rockets".into());
        assert!(unknown.to_string().contains("Unknown tool requested"));
        assert_eq!(unknown.tool_name(), "launch_rockets");

        let failed = ToolError::Memory {
            tool_name: "get_node".into(),
            source: MemoryError::NotFound("node abc".into()),
        };
        assert!(failed.to_string().contains("get_node"));
        assert!(failed.to_string().contains("node abc"));
        assert!(!matches!(failed, ToolError::UnknownTool(_)));
    }
}
