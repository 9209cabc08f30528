//! Typed decoding of tool-use blocks.

use crate::registry::{
    GET_EDGE, GET_EPISODES, GET_NODE, GET_USER_EDGES, GET_USER_NODES, GRAPH_ADD, GRAPH_SEARCH,
};
use memclaw_core::error::ToolError;
use memclaw_core::memory::GraphDataType;
use memclaw_core::tool::ToolInvocation;
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// One of the seven memory tools, with its arguments already validated.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryTool {
    GraphAdd { data: String, data_type: GraphDataType },
    GraphSearch { query: String },
    GetEdge { uuid: String },
    GetNode { uuid: String },
    GetUserEdges,
    GetUserNodes,
    GetEpisodes { last_n: Option<u32> },
}

#[derive(Deserialize)]
struct GraphAddArgs {
    data: String,
    #[serde(rename = "type")]
    data_type: GraphDataType,
}

#[derive(Deserialize)]
struct GraphSearchArgs {
    query: String,
}

#[derive(Deserialize)]
struct UuidArgs {
    uuid: String,
}

#[derive(Deserialize)]
struct EpisodesArgs {
    #[serde(rename = "lastN", default)]
    last_n: Option<f64>,
}

impl MemoryTool {
    /// Decode an invocation. Unknown names and malformed arguments are
    /// rejected here, before anything touches the memory service.
    pub fn parse(invocation: &ToolInvocation) -> Result<Self, ToolError> {
        let name = invocation.name.as_str();
        match name {
            GRAPH_ADD => {
                let args: GraphAddArgs = args(invocation)?;
                Ok(MemoryTool::GraphAdd {
                    data: args.data,
                    data_type: args.data_type,
                })
            }
            GRAPH_SEARCH => {
                let args: GraphSearchArgs = args(invocation)?;
                Ok(MemoryTool::GraphSearch { query: args.query })
            }
            GET_EDGE => {
                let args: UuidArgs = args(invocation)?;
                Ok(MemoryTool::GetEdge { uuid: args.uuid })
            }
            GET_NODE => {
                let args: UuidArgs = args(invocation)?;
                Ok(MemoryTool::GetNode { uuid: args.uuid })
            }
            GET_USER_EDGES => Ok(MemoryTool::GetUserEdges),
            GET_USER_NODES => Ok(MemoryTool::GetUserNodes),
            GET_EPISODES => {
                let args: EpisodesArgs = args(invocation)?;
                let last_n = match args.last_n {
                    None => None,
                    // Zero means "no limit"
                    Some(n) if n == 0.0 => None,
                    Some(n) if n > 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
                        Some(n as u32)
                    }
                    Some(n) => {
                        return Err(ToolError::InvalidArguments {
                            tool_name: name.into(),
                            reason: format!("lastN must be a positive whole number, got {n}"),
                        });
                    }
                };
                Ok(MemoryTool::GetEpisodes { last_n })
            }
            other => Err(ToolError::UnknownTool(other.into())),
        }
    }

    /// The catalog name of this tool.
    pub fn name(&self) -> &'static str {
        match self {
            MemoryTool::GraphAdd { .. } => GRAPH_ADD,
            MemoryTool::GraphSearch { .. } => GRAPH_SEARCH,
            MemoryTool::GetEdge { .. } => GET_EDGE,
            MemoryTool::GetNode { .. } => GET_NODE,
            MemoryTool::GetUserEdges => GET_USER_EDGES,
            MemoryTool::GetUserNodes => GET_USER_NODES,
            MemoryTool::GetEpisodes { .. } => GET_EPISODES,
        }
    }
}

fn args<T: DeserializeOwned>(invocation: &ToolInvocation) -> Result<T, ToolError> {
    // Tools without parameters sometimes arrive with a null input
    let value = if invocation.arguments.is_null() {
        serde_json::json!({})
    } else {
        invocation.arguments.clone()
    };
    serde_json::from_value(value).map_err(|e| ToolError::InvalidArguments {
        tool_name: invocation.name.clone(),
        reason: e.to_string(),
    })
}
