//! Dependency graph state.
//!
//! The orchestrator owns a [`GraphState`] and mutates it one transition at a
//! time. Everyone else reads [`GraphSnapshot`]s, which are plain immutable
//! copies and can be held across further transitions.

mod node;
mod progress;
mod state;

pub use node::{GraphNode, NodeStatus};
pub use progress::Progress;
pub use state::{GraphSnapshot, GraphState, StatusCounts};
