//! MemoryService trait: the long-term memory the agent talks to.
//!
//! The service owns users, sessions, conversation memory and a knowledge
//! graph. Its storage and ranking are opaque; only the request/response
//! contracts below matter to the agent. Graph payloads are passed through
//! as raw JSON because the model, not the agent, interprets them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::identity::Identity;

/// A session bound to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub user_id: String,
}

/// Who authored a stored conversation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    User,
    Assistant,
    System,
    Tool,
}

/// One conversation record stored against a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryMessage {
    /// Free-form speaker label
    pub role: String,

    pub role_type: RoleType,

    pub content: String,
}

impl MemoryMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            role_type: RoleType::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            role_type: RoleType::Assistant,
            content: content.into(),
        }
    }
}

/// What the service currently knows about a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMemory {
    /// Natural-language summary for the system preamble
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Recent records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<MemoryMessage>,
}

/// Format of data added to the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphDataType {
    Text,
    Message,
    Json,
}

impl GraphDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphDataType::Text => "text",
            GraphDataType::Message => "message",
            GraphDataType::Json => "json",
        }
    }
}

/// The memory service surface the agent consumes.
///
/// Implementations: Zep HTTP client, in-memory (for testing and offline use).
/// Probe operations (`get_user`, `get_session`) return `Ok(None)` when the
/// record does not exist; errors are reserved for real failures.
#[async_trait]
pub trait MemoryService: Send + Sync {
    /// The backend name (e.g., "zep", "in_memory").
    fn name(&self) -> &str;

    // --- Identity ---

    async fn get_user(&self, user_id: &str) -> std::result::Result<Option<Identity>, MemoryError>;

    async fn add_user(&self, identity: &Identity) -> std::result::Result<Identity, MemoryError>;

    // --- Sessions ---

    async fn get_session(&self, session_id: &str) -> std::result::Result<Option<Session>, MemoryError>;

    async fn add_session(&self, session: &Session) -> std::result::Result<Session, MemoryError>;

    // --- Session memory ---

    async fn get_memory(&self, session_id: &str) -> std::result::Result<SessionMemory, MemoryError>;

    /// Store conversation records. With `return_context` the service answers
    /// with the refreshed context string.
    async fn add_memory(
        &self,
        session_id: &str,
        messages: &[MemoryMessage],
        return_context: bool,
    ) -> std::result::Result<Option<String>, MemoryError>;

    // --- Knowledge graph ---

    async fn graph_add(
        &self,
        user_id: &str,
        data_type: GraphDataType,
        data: &str,
    ) -> std::result::Result<serde_json::Value, MemoryError>;

    async fn graph_search(&self, user_id: &str, query: &str) -> std::result::Result<serde_json::Value, MemoryError>;

    async fn get_edge(&self, uuid: &str) -> std::result::Result<serde_json::Value, MemoryError>;

    async fn get_node(&self, uuid: &str) -> std::result::Result<serde_json::Value, MemoryError>;

    async fn get_user_edges(&self, user_id: &str) -> std::result::Result<serde_json::Value, MemoryError>;

    async fn get_user_nodes(&self, user_id: &str) -> std::result::Result<serde_json::Value, MemoryError>;

    /// Episodes for a user, optionally only the most recent `last_n`.
    async fn get_user_episodes(
        &self,
        user_id: &str,
        last_n: Option<u32>,
    ) -> std::result::Result<serde_json::Value, MemoryError>;
}
