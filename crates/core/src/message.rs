//! Transcript domain types.
//!
//! A [`Transcript`] is the ordered, append-only record of one user turn:
//! the user's text, each assistant reply (text and tool-use blocks in the
//! order the model emitted them), and the tool results that answer them.
//! It lives for a single turn; long-term continuity is the memory service's job.

use serde::{Deserialize, Serialize};

use crate::tool::ToolInvocation;

/// One block of assistant output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text
    Text { text: String },

    /// A request to invoke a tool
    ToolUse {
        /// Correlation token assigned by the completion service
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn tool_use(
        id: impl Into<String>,
        name: impl Into<String>,
        input: serde_json::Value,
    ) -> Self {
        Self::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn is_tool_use(&self) -> bool {
        matches!(self, Self::ToolUse { .. })
    }

    /// The invocation this block requests, if it is a tool-use block.
    pub fn as_invocation(&self) -> Option<ToolInvocation> {
        match self {
            Self::ToolUse { id, name, input } => Some(ToolInvocation {
                id: id.clone(),
                name: name.clone(),
                arguments: input.clone(),
            }),
            Self::Text { .. } => None,
        }
    }
}

/// Join every text block with newlines. `None` when there is no text block at all.
pub fn joined_text(blocks: &[ContentBlock]) -> Option<String> {
    let texts: Vec<&str> = blocks
        .iter()
        .filter_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            ContentBlock::ToolUse { .. } => None,
        })
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    /// The user's message
    UserText { text: String },

    /// A complete assistant reply, blocks in emitted order
    AssistantContent { blocks: Vec<ContentBlock> },

    /// The serialized outcome of one tool invocation
    ToolResult { tool_use_id: String, content: String },
}

/// The ordered message list of one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transcript seeded with the user's message.
    pub fn with_user_message(text: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push_user(text);
        transcript
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry::UserText { text: text.into() });
    }

    pub fn push_assistant(&mut self, blocks: Vec<ContentBlock>) {
        self.entries.push(TranscriptEntry::AssistantContent { blocks });
    }

    pub fn push_tool_result(&mut self, tool_use_id: impl Into<String>, content: impl Into<String>) {
        self.entries.push(TranscriptEntry::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Correlation tokens of tool-use blocks that have no later tool result.
    pub fn dangling_tool_uses(&self) -> Vec<&str> {
        let mut dangling = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            let TranscriptEntry::AssistantContent { blocks } = entry else {
                continue;
            };
            for block in blocks {
                if let ContentBlock::ToolUse { id, .. } = block {
                    if self.results_after(idx, id) == 0 {
                        dangling.push(id.as_str());
                    }
                }
            }
        }
        dangling
    }

    /// Every tool use is answered exactly once, and every result answers an
    /// earlier tool use.
    pub fn is_well_formed(&self) -> bool {
        let mut seen_uses: Vec<&str> = Vec::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            match entry {
                TranscriptEntry::AssistantContent { blocks } => {
                    for block in blocks {
                        if let ContentBlock::ToolUse { id, .. } = block {
                            if self.results_after(idx, id) != 1 {
                                return false;
                            }
                            seen_uses.push(id.as_str());
                        }
                    }
                }
                TranscriptEntry::ToolResult { tool_use_id, .. } => {
                    if !seen_uses.contains(&tool_use_id.as_str()) {
                        return false;
                    }
                }
                TranscriptEntry::UserText { .. } => {}
            }
        }
        true
    }

    fn results_after(&self, idx: usize, id: &str) -> usize {
        self.entries[idx + 1..]
            .iter()
            .filter(|e| matches!(e, TranscriptEntry::ToolResult { tool_use_id, .. } if tool_use_id == id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_reply(ids: &[&str]) -> Vec<ContentBlock> {
        let mut blocks = vec![ContentBlock::text("Let me check my memory.")];
        for id in ids {
            blocks.push(ContentBlock::tool_use(*id, "graph_search", serde_json::json!({"query": "pets"})));
        }
        blocks
    }

    #[test]
    fn seeded_transcript_is_well_formed() {
        let t = Transcript::with_user_message("Hello!");
        assert_eq!(t.len(), 1);
        assert!(t.is_well_formed());
        assert!(t.dangling_tool_uses().is_empty());
    }

    #[test]
    fn unanswered_tool_use_is_dangling() {
        let mut t = Transcript::with_user_message("What's my dog called?");
        t.push_assistant(tool_reply(&["toolu_1", "toolu_2"]));
        t.push_tool_result("toolu_1", "[]");

        assert_eq!(t.dangling_tool_uses(), vec!["toolu_2"]);
        assert!(!t.is_well_formed());

        t.push_tool_result("toolu_2", "[]");
        assert!(t.dangling_tool_uses().is_empty());
        assert!(t.is_well_formed());
    }

    #[test]
    fn duplicate_or_orphan_results_are_malformed() {
        let mut dup = Transcript::with_user_message("hi");
        dup.push_assistant(tool_reply(&["toolu_1"]));
        dup.push_tool_result("toolu_1", "a");
        dup.push_tool_result("toolu_1", "b");
        assert!(!dup.is_well_formed());

        let mut orphan = Transcript::with_user_message("hi");
        orphan.push_tool_result("toolu_9", "a");
        assert!(!orphan.is_well_formed());
    }

    #[test]
    fn joined_text_skips_tool_blocks() {
        let blocks = vec![
            ContentBlock::text("first"),
            ContentBlock::tool_use("toolu_1", "get_user_nodes", serde_json::json!({})),
            ContentBlock::text("second"),
        ];
        assert_eq!(joined_text(&blocks).as_deref(), Some("first\nsecond"));

        let only_tools = vec![ContentBlock::tool_use("toolu_1", "get_user_nodes", serde_json::json!({}))];
        assert!(joined_text(&only_tools).is_none());
    }

    #[test]
    fn content_block_wire_shape() {
        let block = ContentBlock::tool_use("toolu_abc", "get_node", serde_json::json!({"uuid": "n1"}));
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "tool_use");
        assert_eq!(json["id"], "toolu_abc");
        assert_eq!(json["input"]["uuid"], "n1");

        let invocation = block.as_invocation().unwrap();
        assert_eq!(invocation.id, "toolu_abc");
        assert_eq!(invocation.name, "get_node");
    }
}
