//! Completion service providers for memclaw.
//!
//! All providers implement the `memclaw_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
