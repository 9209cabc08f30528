//! Provider trait: the abstraction over the completion service.
//!
//! A Provider takes the system preamble, the tool catalog and the turn's
//! transcript, and returns the model's reply as ordered content blocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{ContentBlock, Transcript, joined_text};
use crate::tool::ToolInvocation;

/// A completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "claude-3-5-sonnet-20241022")
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Temperature (0.0 = deterministic)
    pub temperature: f32,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Top-level system text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The turn's transcript so far
    pub messages: Transcript,
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique, stable tool name
    pub name: String,

    /// Guidance for the model
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub input_schema: serde_json::Value,
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Provider-assigned message id
    pub id: String,

    /// Which model actually responded
    pub model: String,

    /// Ordered content blocks
    pub content: Vec<ContentBlock>,

    /// Why generation stopped ("end_turn", "tool_use", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    pub fn has_tool_use(&self) -> bool {
        self.content.iter().any(ContentBlock::is_tool_use)
    }

    /// Tool invocations in emitted order.
    pub fn tool_invocations(&self) -> Vec<ToolInvocation> {
        self.content.iter().filter_map(ContentBlock::as_invocation).collect()
    }

    /// All text blocks joined, or `None` if the reply carried no text.
    pub fn text(&self) -> Option<String> {
        joined_text(&self.content)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// The core Provider trait.
///
/// The conversation loop calls `complete()` without knowing which backend
/// answers it; tests substitute scripted providers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError>;
}
