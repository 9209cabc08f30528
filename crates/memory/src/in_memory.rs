//! In-memory memory service: useful for testing and offline sessions.
//!
//! Keeps users, sessions, session records and a flat knowledge graph in
//! process. Every graph add (and every stored conversation record) becomes
//! an episode plus one fact edge hanging off the user's node; search is a
//! case-insensitive keyword match over facts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memclaw_core::error::MemoryError;
use memclaw_core::identity::Identity;
use memclaw_core::memory::{GraphDataType, MemoryMessage, MemoryService, Session, SessionMemory};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// How many facts the session context summarizes.
const CONTEXT_FACTS: usize = 10;

#[derive(Debug, Clone, Serialize)]
struct Node {
    uuid: String,
    name: String,
    summary: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
struct Edge {
    uuid: String,
    fact: String,
    source_node_uuid: String,
    episodes: Vec<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
struct Episode {
    uuid: String,
    source: GraphDataType,
    content: String,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct UserGraph {
    user_node: Option<Node>,
    edges: Vec<Edge>,
    episodes: Vec<Episode>,
}

#[derive(Default)]
struct State {
    users: HashMap<String, Identity>,
    sessions: HashMap<String, Session>,
    records: HashMap<String, Vec<MemoryMessage>>,
    graphs: HashMap<String, UserGraph>,
}

impl State {
    fn graph_mut(&mut self, user_id: &str) -> &mut UserGraph {
        let graph = self.graphs.entry(user_id.to_string()).or_default();
        if graph.user_node.is_none() {
            graph.user_node = Some(Node {
                uuid: Uuid::new_v4().to_string(),
                name: user_id.to_string(),
                summary: format!("The user {user_id}"),
                created_at: Utc::now(),
            });
        }
        graph
    }

    fn add_episode(&mut self, user_id: &str, source: GraphDataType, content: &str) -> Episode {
        let graph = self.graph_mut(user_id);
        let now = Utc::now();
        let episode = Episode {
            uuid: Uuid::new_v4().to_string(),
            source,
            content: content.to_string(),
            created_at: now,
        };
        let source_node_uuid = graph
            .user_node
            .as_ref()
            .map(|n| n.uuid.clone())
            .unwrap_or_default();
        graph.edges.push(Edge {
            uuid: Uuid::new_v4().to_string(),
            fact: content.to_string(),
            source_node_uuid,
            episodes: vec![episode.uuid.clone()],
            created_at: now,
        });
        graph.episodes.push(episode.clone());
        episode
    }

    fn context_for(&self, user_id: &str) -> Option<String> {
        let graph = self.graphs.get(user_id)?;
        if graph.edges.is_empty() {
            return None;
        }
        let start = graph.edges.len().saturating_sub(CONTEXT_FACTS);
        let facts: Vec<String> = graph.edges[start..]
            .iter()
            .map(|e| format!("- {}", e.fact))
            .collect();
        Some(format!("FACTS:\n{}", facts.join("\n")))
    }
}

/// A memory service that keeps everything in process.
#[derive(Clone, Default)]
pub struct InMemoryService {
    state: Arc<RwLock<State>>,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored conversation records for a session, oldest first.
    pub async fn records(&self, session_id: &str) -> Vec<MemoryMessage> {
        self.state
            .read()
            .await
            .records
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value, MemoryError> {
    serde_json::to_value(value).map_err(|e| MemoryError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl MemoryService for InMemoryService {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<Identity>, MemoryError> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn add_user(&self, identity: &Identity) -> Result<Identity, MemoryError> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&identity.user_id) {
            return Err(MemoryError::Rejected {
                status_code: 400,
                message: format!("user {} already exists", identity.user_id),
            });
        }
        state.users.insert(identity.user_id.clone(), identity.clone());
        Ok(identity.clone())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, MemoryError> {
        Ok(self.state.read().await.sessions.get(session_id).cloned())
    }

    async fn add_session(&self, session: &Session) -> Result<Session, MemoryError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&session.user_id) {
            return Err(MemoryError::NotFound(format!("user {}", session.user_id)));
        }
        if state.sessions.contains_key(&session.session_id) {
            return Err(MemoryError::Rejected {
                status_code: 400,
                message: format!("session {} already exists", session.session_id),
            });
        }
        state.sessions.insert(session.session_id.clone(), session.clone());
        Ok(session.clone())
    }

    async fn get_memory(&self, session_id: &str) -> Result<SessionMemory, MemoryError> {
        let state = self.state.read().await;
        let session = state
            .sessions
            .get(session_id)
            .ok_or_else(|| MemoryError::NotFound(format!("session {session_id}")))?;
        Ok(SessionMemory {
            context: state.context_for(&session.user_id),
            messages: state.records.get(session_id).cloned().unwrap_or_default(),
        })
    }

    async fn add_memory(
        &self,
        session_id: &str,
        messages: &[MemoryMessage],
        return_context: bool,
    ) -> Result<Option<String>, MemoryError> {
        let mut state = self.state.write().await;
        let user_id = state
            .sessions
            .get(session_id)
            .map(|s| s.user_id.clone())
            .ok_or_else(|| MemoryError::NotFound(format!("session {session_id}")))?;

        for message in messages {
            state.add_episode(
                &user_id,
                GraphDataType::Message,
                &format!("{}: {}", message.role, message.content),
            );
        }
        state
            .records
            .entry(session_id.to_string())
            .or_default()
            .extend(messages.iter().cloned());

        Ok(if return_context {
            state.context_for(&user_id)
        } else {
            None
        })
    }

    async fn graph_add(
        &self,
        user_id: &str,
        data_type: GraphDataType,
        data: &str,
    ) -> Result<serde_json::Value, MemoryError> {
        if data.trim().is_empty() {
            return Err(MemoryError::Rejected {
                status_code: 400,
                message: "data must not be empty".into(),
            });
        }
        if data_type == GraphDataType::Json && serde_json::from_str::<serde_json::Value>(data).is_err() {
            return Err(MemoryError::Rejected {
                status_code: 400,
                message: "data is not valid JSON".into(),
            });
        }
        let episode = self.state.write().await.add_episode(user_id, data_type, data);
        to_json(&episode)
    }

    async fn graph_search(&self, user_id: &str, query: &str) -> Result<serde_json::Value, MemoryError> {
        let state = self.state.read().await;
        let needle = query.to_lowercase();
        let words: Vec<&str> = needle.split_whitespace().collect();

        let mut scored: Vec<(usize, &Edge)> = state
            .graphs
            .get(user_id)
            .map(|g| g.edges.iter().collect::<Vec<_>>())
            .unwrap_or_default()
            .into_iter()
            .map(|e| {
                let fact = e.fact.to_lowercase();
                (words.iter().filter(|w| fact.contains(**w)).count(), e)
            })
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let edges: Vec<&Edge> = scored.into_iter().map(|(_, e)| e).collect();
        Ok(serde_json::json!({ "edges": to_json(&edges)? }))
    }

    async fn get_edge(&self, uuid: &str) -> Result<serde_json::Value, MemoryError> {
        let state = self.state.read().await;
        let edge = state
            .graphs
            .values()
            .flat_map(|g| g.edges.iter())
            .find(|e| e.uuid == uuid)
            .ok_or_else(|| MemoryError::NotFound(format!("edge {uuid}")))?;
        to_json(edge)
    }

    async fn get_node(&self, uuid: &str) -> Result<serde_json::Value, MemoryError> {
        let state = self.state.read().await;
        let node = state
            .graphs
            .values()
            .filter_map(|g| g.user_node.as_ref())
            .find(|n| n.uuid == uuid)
            .ok_or_else(|| MemoryError::NotFound(format!("node {uuid}")))?;
        to_json(node)
    }

    async fn get_user_edges(&self, user_id: &str) -> Result<serde_json::Value, MemoryError> {
        let state = self.state.read().await;
        match state.graphs.get(user_id) {
            Some(graph) => to_json(&graph.edges),
            None => Ok(serde_json::json!([])),
        }
    }

    async fn get_user_nodes(&self, user_id: &str) -> Result<serde_json::Value, MemoryError> {
        let state = self.state.read().await;
        let nodes: Vec<&Node> = state
            .graphs
            .get(user_id)
            .and_then(|g| g.user_node.as_ref())
            .into_iter()
            .collect();
        to_json(&nodes)
    }

    async fn get_user_episodes(
        &self,
        user_id: &str,
        last_n: Option<u32>,
    ) -> Result<serde_json::Value, MemoryError> {
        let state = self.state.read().await;
        let episodes: &[Episode] = state
            .graphs
            .get(user_id)
            .map(|g| g.episodes.as_slice())
            .unwrap_or(&[]);
        let start = match last_n {
            Some(n) => episodes.len().saturating_sub(n as usize),
            None => 0,
        };
        Ok(serde_json::json!({ "episodes": to_json(&episodes[start..])? }))
    }
}
