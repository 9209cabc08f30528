//! The tool catalog sent with every completion request.

use memclaw_core::provider::ToolDefinition;
use serde_json::json;

pub const GRAPH_ADD: &str = "graph_add";
pub const GRAPH_SEARCH: &str = "graph_search";
pub const GET_EDGE: &str = "get_edge";
pub const GET_NODE: &str = "get_node";
pub const GET_USER_EDGES: &str = "get_user_edges";
pub const GET_USER_NODES: &str = "get_user_nodes";
pub const GET_EPISODES: &str = "get_episodes";

/// The seven memory tools, in the order the model sees them.
pub fn tool_catalog() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GRAPH_ADD.into(),
            description: "Add new information to your long-term memory. Use this whenever you \
                learn something important about the user or context that should be remembered \
                for future conversations."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "data": {
                        "type": "string",
                        "description": "The information to store (text or JSON string). For text/message types, include speaker and content. For JSON, include relevant structured data."
                    },
                    "type": {
                        "type": "string",
                        "enum": ["text", "message", "json"],
                        "description": "Format of the data: 'text' for plain text, 'message' for conversational data, 'json' for structured data"
                    }
                },
                "required": ["data", "type"]
            }),
        },
        ToolDefinition {
            name: GRAPH_SEARCH.into(),
            description: "Search your memory graph for any relevant information about a topic, \
                person, or previous conversation. Use this to recall past interactions or stored \
                knowledge."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural language description of what you want to find in memory. Be specific about the information you're looking for."
                    }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: GET_EDGE.into(),
            description: "Retrieve a specific relationship or fact from memory using its UUID. \
                Use this when you need more details about a connection found through search."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "uuid": {
                        "type": "string",
                        "description": "The unique identifier of the edge (relationship/fact) to retrieve"
                    }
                },
                "required": ["uuid"]
            }),
        },
        ToolDefinition {
            name: GET_NODE.into(),
            description: "Retrieve information about a specific entity (person, object, concept) \
                from memory using its UUID. Use this when you need detailed information about \
                something found through search."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "uuid": {
                        "type": "string",
                        "description": "The unique identifier of the node (entity) to retrieve"
                    }
                },
                "required": ["uuid"]
            }),
        },
        ToolDefinition {
            name: GET_USER_EDGES.into(),
            description: "Retrieve all known facts and relationships about the user. Use this to \
                get a complete picture of what you know about them."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "description": "No input needed - automatically uses the current user's ID"
            }),
        },
        ToolDefinition {
            name: GET_USER_NODES.into(),
            description: "Retrieve all entities (people, objects, concepts) directly connected to \
                the user in memory. Use this to understand which topics and entities are relevant \
                to them."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {},
                "description": "No input needed - automatically uses the current user's ID"
            }),
        },
        ToolDefinition {
            name: GET_EPISODES.into(),
            description: "Retrieve specific conversations or interactions with the user. Use this \
                to recall detailed context from past conversations."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "lastN": {
                        "type": "number",
                        "description": "Optional: Number of most recent episodes to retrieve. Omit to get all episodes."
                    }
                }
            }),
        },
    ]
}
