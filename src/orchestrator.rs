//! Query-to-summary orchestration.
//!
//! Seeds a workflow run from a user query, drives it to completion and turns
//! the final state into a [`SummaryResult`], optionally with synthesized audio.

use crate::config::Settings;
use crate::error::{RecapError, Result};
use crate::generation::{Message, Role};
use crate::speech::{OpenAISpeech, SpeechSynthesizer};
use crate::tools::{VideoInfo, FIND_VIDEO};
use crate::workflow::{Engine, EngineConfig, Step, WorkflowState};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    pub title: Option<String>,
    pub summary: String,
    pub video_link: Option<String>,
    pub audio_path: Option<PathBuf>,
}

impl SummaryResult {
    /// No video was found and nothing was summarized.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.video_link.is_none() && self.summary.is_empty()
    }
}

/// Entry point for summarizing a video query.
#[derive(Clone)]
pub struct Orchestrator {
    engine: Engine,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl Orchestrator {
    /// Build the engine and speech backend from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let engine = Engine::new(EngineConfig::from_settings(&settings)?);
        let speech = OpenAISpeech::with_config(&settings.speech, settings.audio_dir())?;

        Ok(Self::with_components(engine, Some(Arc::new(speech))))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(engine: Engine, speech: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { engine, speech }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Summarize the video best matching `query`.
    pub async fn run(&self, query: &str, wants_speech: bool) -> Result<SummaryResult> {
        self.run_observed(query, wants_speech, |_, _| {}).await
    }

    /// Like [`Orchestrator::run`], reporting each workflow step to `observer`.
    #[instrument(skip(self, observer))]
    pub async fn run_observed<F>(
        &self,
        query: &str,
        wants_speech: bool,
        observer: F,
    ) -> Result<SummaryResult>
    where
        F: FnMut(Step, &WorkflowState) + Send,
    {
        let query = query.trim();
        if query.is_empty() {
            return Err(RecapError::InvalidInput("Query must not be empty".to_string()));
        }

        let state = self.engine.initial_state(query);
        let state = self.engine.run_observed(state, observer).await?;

        let video = find_video_result(state.messages());
        let mut result = SummaryResult {
            title: video.as_ref().map(|v| v.title.clone()),
            video_link: video.map(|v| v.link),
            summary: state.summary().to_string(),
            audio_path: None,
        };

        if result.is_empty() {
            info!("No video found for query");
        }

        if wants_speech && !result.summary.is_empty() {
            result.audio_path = self.synthesize(&result.summary).await;
        }

        Ok(result)
    }

    async fn synthesize(&self, summary: &str) -> Option<PathBuf> {
        let Some(speech) = &self.speech else {
            warn!("Speech requested but no synthesizer is configured");
            return None;
        };

        match speech.synthesize(summary).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                None
            }
        }
    }
}

/// First `find_video` tool turn whose content is a video payload.
pub fn find_video_result(messages: &[Message]) -> Option<VideoInfo> {
    messages
        .iter()
        .filter(|m| m.role == Role::Tool && m.name.as_deref() == Some(FIND_VIDEO))
        .find_map(|m| serde_json::from_str::<VideoInfo>(&m.content).ok())
}
