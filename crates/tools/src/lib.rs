//! Memory tools for memclaw.
//!
//! The model sees a fixed catalog of seven tools ([`registry`]). Each
//! tool-use block it emits is decoded into a [`MemoryTool`] and run
//! against the memory service by [`MemoryToolExecutor`].

pub mod executor;
pub mod memory_tool;
pub mod registry;

pub use executor::MemoryToolExecutor;
pub use memory_tool::MemoryTool;
pub use registry::tool_catalog;
