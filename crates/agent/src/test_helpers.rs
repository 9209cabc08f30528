//! Shared test doubles for the loop and bootstrap tests.

use async_trait::async_trait;
use memclaw_core::error::{MemoryError, ProviderError, ToolError};
use memclaw_core::identity::Identity;
use memclaw_core::memory::{GraphDataType, MemoryMessage, MemoryService, Session, SessionMemory};
use memclaw_core::message::ContentBlock;
use memclaw_core::provider::{CompletionRequest, CompletionResponse, Provider, ToolDefinition, Usage};
use memclaw_core::tool::{ToolExecutor, ToolInvocation, ToolResult};
use memclaw_memory::InMemoryService;
use std::sync::Mutex;

/// A provider that returns a sequence of scripted responses and keeps
/// every request it was sent.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();
        if call >= responses.len() {
            panic!(
                "ScriptedProvider: no more responses (call #{call}, have {})",
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[call].clone())
    }
}

pub fn response(content: Vec<ContentBlock>) -> CompletionResponse {
    let stop_reason = if content.iter().any(ContentBlock::is_tool_use) {
        "tool_use"
    } else {
        "end_turn"
    };
    CompletionResponse {
        id: "msg_test".into(),
        model: "test-model".into(),
        content,
        stop_reason: Some(stop_reason.into()),
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
    }
}

pub fn text_response(text: &str) -> CompletionResponse {
    response(vec![ContentBlock::text(text)])
}

pub fn tool_use(id: &str, name: &str) -> ContentBlock {
    ContentBlock::tool_use(id, name, serde_json::json!({}))
}

/// An executor that records invocations and fails the ones named in `failing`.
pub struct ScriptedExecutor {
    definitions: Vec<ToolDefinition>,
    failing: Vec<String>,
    calls: Mutex<Vec<ToolInvocation>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::failing_on(&[])
    }

    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            definitions: vec![ToolDefinition {
                name: "graph_search".into(),
                description: "Search memory".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }],
            failing: names.iter().map(|n| n.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for ScriptedExecutor {
    fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    async fn execute(&self, invocation: &ToolInvocation) -> Result<ToolResult, ToolError> {
        self.calls.lock().unwrap().push(invocation.clone());
        if self.failing.contains(&invocation.name) {
            return Err(ToolError::Memory {
                tool_name: invocation.name.clone(),
                source: MemoryError::Network("connection reset".into()),
            });
        }
        Ok(ToolResult {
            invocation_id: invocation.id.clone(),
            payload: serde_json::json!({ "tool": invocation.name }),
        })
    }
}

/// Wraps [`InMemoryService`], logging each call and optionally failing
/// probes or creates.
#[derive(Default)]
pub struct CountingMemory {
    inner: InMemoryService,
    fail_probes: bool,
    fail_creates: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl CountingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failing_probes(mut self) -> Self {
        self.fail_probes = true;
        self
    }

    pub fn with_failing_creates(mut self) -> Self {
        self.fail_creates = true;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn records(&self, session_id: &str) -> Vec<MemoryMessage> {
        self.inner.records(session_id).await
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    fn log(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn probe_failure(&self) -> Result<(), MemoryError> {
        if self.fail_probes {
            Err(MemoryError::Network("probe timed out".into()))
        } else {
            Ok(())
        }
    }

    fn create_failure(&self) -> Result<(), MemoryError> {
        if self.fail_creates {
            Err(MemoryError::Rejected {
                status_code: 400,
                message: "bad request".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MemoryService for CountingMemory {
    fn name(&self) -> &str {
        "counting"
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<Identity>, MemoryError> {
        self.log("get_user");
        self.probe_failure()?;
        self.inner.get_user(user_id).await
    }

    async fn add_user(&self, identity: &Identity) -> Result<Identity, MemoryError> {
        self.log("add_user");
        self.create_failure()?;
        self.inner.add_user(identity).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, MemoryError> {
        self.log("get_session");
        self.probe_failure()?;
        self.inner.get_session(session_id).await
    }

    async fn add_session(&self, session: &Session) -> Result<Session, MemoryError> {
        self.log("add_session");
        self.create_failure()?;
        self.inner.add_session(session).await
    }

    async fn get_memory(&self, session_id: &str) -> Result<SessionMemory, MemoryError> {
        self.log("get_memory");
        self.inner.get_memory(session_id).await
    }

    async fn add_memory(
        &self,
        session_id: &str,
        messages: &[MemoryMessage],
        return_context: bool,
    ) -> Result<Option<String>, MemoryError> {
        self.log("add_memory");
        self.inner.add_memory(session_id, messages, return_context).await
    }

    async fn graph_add(
        &self,
        user_id: &str,
        data_type: GraphDataType,
        data: &str,
    ) -> Result<serde_json::Value, MemoryError> {
        self.log("graph_add");
        self.inner.graph_add(user_id, data_type, data).await
    }

    async fn graph_search(&self, user_id: &str, query: &str) -> Result<serde_json::Value, MemoryError> {
        self.log("graph_search");
        self.inner.graph_search(user_id, query).await
    }

    async fn get_edge(&self, uuid: &str) -> Result<serde_json::Value, MemoryError> {
        self.log("get_edge");
        self.inner.get_edge(uuid).await
    }

    async fn get_node(&self, uuid: &str) -> Result<serde_json::Value, MemoryError> {
        self.log("get_node");
        self.inner.get_node(uuid).await
    }

    async fn get_user_edges(&self, user_id: &str) -> Result<serde_json::Value, MemoryError> {
        self.log("get_user_edges");
        self.inner.get_user_edges(user_id).await
    }

    async fn get_user_nodes(&self, user_id: &str) -> Result<serde_json::Value, MemoryError> {
        self.log("get_user_nodes");
        self.inner.get_user_nodes(user_id).await
    }

    async fn get_user_episodes(
        &self,
        user_id: &str,
        last_n: Option<u32>,
    ) -> Result<serde_json::Value, MemoryError> {
        self.log("get_user_episodes");
        self.inner.get_user_episodes(user_id, last_n).await
    }
}
