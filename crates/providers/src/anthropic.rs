//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks, kept in
//!   the order the model emitted them

use async_trait::async_trait;
use memclaw_core::error::ProviderError;
use memclaw_core::message::{ContentBlock, TranscriptEntry};
use memclaw_core::provider::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert transcript entries to Anthropic API messages.
    ///
    /// Tool results travel as `user` messages holding a `tool_result` block.
    fn to_api_messages(entries: &[TranscriptEntry]) -> Vec<AnthropicMessage> {
        let mut messages: Vec<AnthropicMessage> = Vec::with_capacity(entries.len());

        for entry in entries {
            match entry {
                TranscriptEntry::UserText { text } => messages.push(AnthropicMessage {
                    role: "user".into(),
                    content: AnthropicContent::Text(text.clone()),
                }),
                TranscriptEntry::AssistantContent { blocks } => messages.push(AnthropicMessage {
                    role: "assistant".into(),
                    content: AnthropicContent::Blocks(
                        blocks
                            .iter()
                            .map(|b| match b {
                                ContentBlock::Text { text } => ApiBlock::Text { text: text.clone() },
                                ContentBlock::ToolUse { id, name, input } => ApiBlock::ToolUse {
                                    id: id.clone(),
                                    name: name.clone(),
                                    input: input.clone(),
                                },
                            })
                            .collect(),
                    ),
                }),
                TranscriptEntry::ToolResult {
                    tool_use_id,
                    content,
                } => {
                    let block = ApiBlock::ToolResult {
                        tool_use_id: tool_use_id.clone(),
                        content: content.clone(),
                    };
                    // All results for one assistant reply share a single user message
                    if let Some(AnthropicMessage {
                        role,
                        content: AnthropicContent::Blocks(results),
                    }) = messages.last_mut()
                        && *role == "user"
                        && results.iter().all(|b| matches!(b, ApiBlock::ToolResult { .. }))
                    {
                        results.push(block);
                        continue;
                    }
                    messages.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::Blocks(vec![block]),
                    });
                }
            }
        }

        messages
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    fn build_body(request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(request.messages.entries()),
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        if let Some(ref sys) = request.system {
            body["system"] = serde_json::json!(sys);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    /// Convert an Anthropic API response to our CompletionResponse.
    fn into_completion_response(resp: AnthropicResponse) -> CompletionResponse {
        let content = resp
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(ContentBlock::Text { text }),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                ResponseContentBlock::Other => None,
            })
            .collect();

        CompletionResponse {
            id: resp.id,
            model: resp.model,
            content,
            stop_reason: resp.stop_reason,
            usage: Some(Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            }),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::build_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse Anthropic response: {e}")))?;

        Ok(Self::into_completion_response(api_resp))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ApiBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ApiBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult { tool_use_id: String, content: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ResponseContentBlock>,
    usage: AnthropicUsage,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Block kinds the loop has no use for (thinking, redacted_thinking, ...)
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
