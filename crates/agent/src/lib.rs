//! The conversation loop: the heart of memclaw.
//!
//! Each user turn follows a **complete → act → complete** cycle:
//!
//! 1. **Recall** the session's memory context and build the system preamble
//! 2. **Send** the user message to the completion service with the tool catalog
//! 3. **If tool uses**: execute them in order, append one result per use,
//!    and ask for a follow-up completion
//! 4. **If text only**: that text is the answer
//! 5. **Persist** the user message and the answer back to memory
//!
//! The first failing tool ends the turn with a recovery message.
//! [`bootstrap::ensure_ready`] makes sure the user and session exist
//! before the first turn.

pub mod bootstrap;
pub mod loop_runner;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use bootstrap::ensure_ready;
pub use loop_runner::{AgentLoop, MAX_ROUNDS_MESSAGE, RECOVERY_MESSAGE};
