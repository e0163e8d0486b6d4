//! Native scripting
//!
//! Behaviors are plain Rust types implementing [`ScriptableBehavior`]. The
//! scene's [`ScriptHost`] owns their instances while Play runs; they reach
//! the registry only through the [`ScriptContext`] passed to each hook.

pub mod behavior;
pub mod commands;
pub mod context;
pub mod host;

pub use behavior::ScriptableBehavior;
pub use commands::{CommandQueue, DeferredEdit, SceneCommand};
pub use context::ScriptContext;
pub use host::ScriptHost;
