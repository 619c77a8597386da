//! Iterative summarization workflow.
//!
//! The engine alternates between asking the model and running the tools it
//! requests until a transcript is available. It then splits the transcript,
//! summarizes the first chunk and refines that summary with each following
//! chunk in order.

mod engine;
mod state;

pub use engine::{next_step, Engine, EngineConfig, Step, DEFAULT_STEP_LIMIT};
pub use state::WorkflowState;
