//! Memory service implementations for memclaw.

pub mod in_memory;
pub mod zep;

pub use in_memory::InMemoryService;
pub use zep::ZepClient;
