//! Configuration module for recap.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts, SummaryPrompts};
pub use settings::{
    ChunkingSettings, GeneralSettings, GenerationSettings, PromptSettings, SearchProvider,
    SearchSettings, ServerSettings, Settings, SpeechSettings, TranscriptSettings,
    WorkflowSettings,
};
