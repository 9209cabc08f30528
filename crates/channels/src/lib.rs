//! Input channels for memclaw.
//!
//! Only one channel exists today: the interactive terminal ([`CliChannel`]),
//! which turns stdin into a stream of user messages.

pub mod cli;

pub use cli::{ChannelError, CliChannel, ShellLine};
