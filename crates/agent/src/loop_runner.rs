//! The tool-calling conversation loop.

use memclaw_core::error::{MemoryError, Result, ToolError};
use memclaw_core::identity::SessionId;
use memclaw_core::memory::{MemoryMessage, MemoryService};
use memclaw_core::message::{ContentBlock, Transcript};
use memclaw_core::provider::{CompletionRequest, CompletionResponse, Provider};
use memclaw_core::tool::{ToolExecutor, ToolInvocation};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The answer given when a tool fails mid-round.
pub const RECOVERY_MESSAGE: &str =
    "I encountered an issue while processing the information. Let me try a different approach.";

/// The answer given when the round limit is hit before any text arrived.
pub const MAX_ROUNDS_MESSAGE: &str =
    "I've reached the maximum number of tool rounds for this message. Please try rephrasing or asking again.";

const PREAMBLE: &str = "You are a helpful AI assistant with access to long-term memory. \
Use your tools naturally when you need to check or store information.";

/// Build the system text, embedding the memory context when there is any.
pub fn system_preamble(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!(
            "{PREAMBLE}\nHere is relevant context from your memory:\n{context}"
        ),
        None => PREAMBLE.to_string(),
    }
}

/// How one batch of tool uses ended.
enum RoundOutcome {
    /// Every tool use has its result in the transcript
    Resolved,
    /// A tool failed and the rest of the batch was dropped
    Abandoned(ToolError),
}

/// Runs one user turn at a time against the completion service, the tool
/// executor and the memory service.
pub struct AgentLoop {
    /// Completion service
    provider: Arc<dyn Provider>,

    /// Tool catalog and executor
    tools: Arc<dyn ToolExecutor>,

    /// Long-term memory (context in, conversation records out)
    memory: Arc<dyn MemoryService>,

    /// Session this process writes to
    session_id: SessionId,

    model: String,
    max_tokens: u32,
    temperature: f32,

    /// Maximum tool rounds per turn
    max_rounds: u32,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolExecutor>,
        memory: Arc<dyn MemoryService>,
        session_id: SessionId,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            tools,
            memory,
            session_id,
            model: model.into(),
            max_tokens: 1024,
            temperature: 0.0,
            max_rounds: 25,
        }
    }

    /// Set the output token budget per completion.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of tool rounds per turn.
    pub fn with_max_rounds(mut self, max: u32) -> Self {
        self.max_rounds = max;
        self
    }

    /// Fetch the session's memory context. A session with nothing stored
    /// yet has no context.
    async fn memory_context(&self) -> Result<Option<String>> {
        match self.memory.get_memory(self.session_id.as_str()).await {
            Ok(memory) => Ok(memory.context),
            Err(MemoryError::NotFound(_)) => {
                debug!(session_id = %self.session_id, "No memory stored for session yet");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn complete(
        &self,
        system: &str,
        transcript: &Transcript,
        round: u32,
    ) -> Result<CompletionResponse> {
        debug_assert!(transcript.is_well_formed());

        let request = CompletionRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: self.tools.definitions().to_vec(),
            system: Some(system.to_string()),
            messages: transcript.clone(),
        };

        let response = self.provider.complete(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                round,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                total_tokens = usage.total(),
                "Completion usage"
            );
        }
        Ok(response)
    }

    /// Execute the tool uses of one response in emitted order, appending a
    /// result for each. Text blocks between them update `answer`.
    async fn run_tool_round(
        &self,
        content: &[ContentBlock],
        transcript: &mut Transcript,
        answer: &mut String,
    ) -> RoundOutcome {
        for block in content {
            match block {
                ContentBlock::Text { text } => *answer = text.clone(),
                ContentBlock::ToolUse { id, name, input } => {
                    let invocation = ToolInvocation {
                        id: id.clone(),
                        name: name.clone(),
                        arguments: input.clone(),
                    };
                    match self.tools.execute(&invocation).await {
                        Ok(result) => transcript.push_tool_result(invocation.id, result.to_content()),
                        Err(e) => return RoundOutcome::Abandoned(e),
                    }
                }
            }
        }
        RoundOutcome::Resolved
    }

    /// Process one user message and return the assistant's answer.
    ///
    /// On a clean finish the user message and the answer are written back to
    /// memory. A tool failure ends the turn with [`RECOVERY_MESSAGE`] and
    /// nothing is persisted.
    pub async fn run_turn(&self, user_message: &str) -> Result<String> {
        info!(session_id = %self.session_id, chars = user_message.len(), "Processing turn");

        let context = self.memory_context().await?;
        let system = system_preamble(context.as_deref());

        let mut transcript = Transcript::with_user_message(user_message);
        let mut answer = String::new();
        let mut round = 0;

        let mut response = self.complete(&system, &transcript, round).await?;

        while response.has_tool_use() {
            if round >= self.max_rounds {
                warn!(
                    session_id = %self.session_id,
                    rounds = round,
                    "Max tool rounds reached, ending turn"
                );
                if let Some(text) = response.text() {
                    answer = text;
                }
                if answer.is_empty() {
                    answer = MAX_ROUNDS_MESSAGE.to_string();
                }
                return Ok(answer);
            }
            round += 1;

            debug!(
                round,
                tool_uses = response.content.iter().filter(|b| b.is_tool_use()).count(),
                "Executing tool uses"
            );

            transcript.push_assistant(response.content.clone());
            let outcome = self
                .run_tool_round(&response.content, &mut transcript, &mut answer)
                .await;

            if let RoundOutcome::Abandoned(e) = outcome {
                warn!(
                    tool = e.tool_name(),
                    error = %e,
                    dangling = transcript.dangling_tool_uses().len(),
                    "Tool failed, abandoning the rest of the round"
                );
                return Ok(RECOVERY_MESSAGE.to_string());
            }

            response = self.complete(&system, &transcript, round).await?;
        }

        if let Some(text) = response.text() {
            answer = text;
        }

        self.persist(user_message, &answer).await?;

        info!(session_id = %self.session_id, rounds = round, "Turn complete");
        Ok(answer)
    }

    async fn persist(&self, user_message: &str, answer: &str) -> Result<()> {
        let records = [
            MemoryMessage::user(user_message),
            MemoryMessage::assistant(answer),
        ];
        let context = self
            .memory
            .add_memory(self.session_id.as_str(), &records, true)
            .await?;
        debug!(
            session_id = %self.session_id,
            context_chars = context.as_ref().map(String::len).unwrap_or(0),
            "Stored turn in memory"
        );
        Ok(())
    }
}
