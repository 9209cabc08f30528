//! Tool invocation types and the executor trait.
//!
//! The completion service asks for tools by name; an executor turns each
//! request into work against the memory service and hands back a result
//! that the conversation loop serializes into the transcript.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A request to execute a tool, taken from a tool-use block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlation token (matches the model's tool_use.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The successful outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The invocation this result answers
    pub invocation_id: String,

    /// Memory-service response, passed through unchanged
    pub payload: serde_json::Value,
}

impl ToolResult {
    /// The payload as the string placed in a tool-result transcript entry.
    pub fn to_content(&self) -> String {
        serde_json::to_string(&self.payload).unwrap_or_else(|_| "null".into())
    }
}

/// Executes tool invocations on behalf of the conversation loop.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// The catalog sent to the model on every completion request.
    fn definitions(&self) -> &[ToolDefinition];

    /// Execute one invocation. Failures are returned, never swallowed.
    async fn execute(&self, invocation: &ToolInvocation) -> std::result::Result<ToolResult, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_content_is_json() {
        let result = ToolResult {
            invocation_id: "toolu_1".into(),
            payload: serde_json::json!({"edges": [{"fact": "John owns a dog"}]}),
        };
        let content = result.to_content();
        let back: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(back["edges"][0]["fact"], "John owns a dog");
    }

    #[test]
    fn null_payload_serializes_as_null() {
        let result = ToolResult {
            invocation_id: "toolu_1".into(),
            payload: serde_json::Value::Null,
        };
        assert_eq!(result.to_content(), "null");
    }
}
