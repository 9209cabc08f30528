//! # memclaw Core
//!
//! Domain types, traits, and error definitions for the memclaw agent.
//! This crate has **no I/O**: it defines the domain model that the
//! provider, memory, tool and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator is a trait here:
//! - [`Provider`] for the completion service
//! - [`MemoryService`] for the long-term memory service
//! - [`ToolExecutor`] for turning tool-use blocks into memory calls
//!
//! Implementations live in their own crates, and tests swap in scripted ones.

pub mod error;
pub mod identity;
pub mod memory;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result, ToolError};
pub use identity::{Identity, SessionId};
pub use memory::{GraphDataType, MemoryMessage, MemoryService, RoleType, Session, SessionMemory};
pub use message::{ContentBlock, Transcript, TranscriptEntry};
pub use provider::{CompletionRequest, CompletionResponse, Provider, ToolDefinition, Usage};
pub use tool::{ToolExecutor, ToolInvocation, ToolResult};
