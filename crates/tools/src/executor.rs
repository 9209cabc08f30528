//! Runs memory tools against a [`MemoryService`].

use crate::memory_tool::MemoryTool;
use crate::registry::tool_catalog;
use async_trait::async_trait;
use memclaw_core::error::ToolError;
use memclaw_core::memory::MemoryService;
use memclaw_core::provider::ToolDefinition;
use memclaw_core::tool::{ToolExecutor, ToolInvocation, ToolResult};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executes the seven memory tools on behalf of a single user.
///
/// User-scoped tools (`graph_add`, `graph_search`, `get_user_*`,
/// `get_episodes`) always act on the user this executor was built for;
/// the model never chooses whose memory it touches.
pub struct MemoryToolExecutor {
    memory: Arc<dyn MemoryService>,
    user_id: String,
    definitions: Vec<ToolDefinition>,
}

impl MemoryToolExecutor {
    pub fn new(memory: Arc<dyn MemoryService>, user_id: impl Into<String>) -> Self {
        Self {
            memory,
            user_id: user_id.into(),
            definitions: tool_catalog(),
        }
    }

    async fn run(&self, tool: &MemoryTool) -> Result<serde_json::Value, memclaw_core::MemoryError> {
        let user = self.user_id.as_str();
        match tool {
            MemoryTool::GraphAdd { data, data_type } => {
                self.memory.graph_add(user, *data_type, data).await
            }
            MemoryTool::GraphSearch { query } => self.memory.graph_search(user, query).await,
            MemoryTool::GetEdge { uuid } => self.memory.get_edge(uuid).await,
            MemoryTool::GetNode { uuid } => self.memory.get_node(uuid).await,
            MemoryTool::GetUserEdges => self.memory.get_user_edges(user).await,
            MemoryTool::GetUserNodes => self.memory.get_user_nodes(user).await,
            MemoryTool::GetEpisodes { last_n } => {
                self.memory.get_user_episodes(user, *last_n).await
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for MemoryToolExecutor {
    fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    async fn execute(&self, invocation: &ToolInvocation) -> Result<ToolResult, ToolError> {
        info!(tool = %invocation.name, id = %invocation.id, "Executing tool");

        let tool = MemoryTool::parse(invocation).inspect_err(|e| {
            warn!(tool = %invocation.name, error = %e, "Rejected tool invocation");
        })?;

        match self.run(&tool).await {
            Ok(payload) => {
                debug!(tool = tool.name(), result = %payload, "Tool result");
                Ok(ToolResult {
                    invocation_id: invocation.id.clone(),
                    payload,
                })
            }
            Err(source) => {
                warn!(tool = tool.name(), error = %source, "Tool execution failed");
                Err(ToolError::Memory {
                    tool_name: tool.name().into(),
                    source,
                })
            }
        }
    }
}
