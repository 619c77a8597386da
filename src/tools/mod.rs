//! Tools the agent can call while answering a query.
//!
//! Two tools are exposed to the model:
//!
//! - `find_video` searches for a video matching a title and replies with its
//!   `{title, link, video_id}` payload, or `null` when nothing matched.
//! - `fetch_transcript` downloads the captions of a video. A successful fetch
//!   does not go back to the model as text; it becomes a [`StatePatch`] the
//!   workflow applies to its state.
//!
//! Provider failures never escape the [`Toolbox`]: they are turned into reply
//! strings so the model can decide what to do next.

mod pool;
mod search;
mod transcript;

pub use pool::WorkerPool;
pub use search::{extract_video_id, SerpApiSearch, VideoSearch, YtDlpSearch};
pub use transcript::{TranscriptProvider, YtDlpTranscripts};

use crate::config::{SearchProvider, Settings};
use crate::error::{RecapError, Result};
use crate::generation::{ToolInvocation, ToolSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const FIND_VIDEO: &str = "find_video";
pub const FETCH_TRANSCRIPT: &str = "fetch_transcript";

/// Acknowledgement recorded when a transcript is added to the workflow state.
pub const TRANSCRIPT_ACK: &str = "Successfully added transcript to State";

/// A video located by `find_video`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub link: String,
    pub video_id: String,
}

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// Search for a video by title.
    FindVideo { title: String },

    /// Fetch the transcript of a video.
    FetchTranscript { video_id: String },
}

/// State change produced by a tool, applied by the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePatch {
    /// Full transcript text.
    pub transcript: String,
    /// Content of the tool turn appended alongside the transcript.
    pub acknowledgement: String,
}

/// Result of one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    /// Text for the model to read.
    Reply(String),
    /// State change for the engine to apply.
    Patch(StatePatch),
}

impl ToolOutput {
    /// Content of the tool turn this output produces.
    pub fn content(&self) -> &str {
        match self {
            ToolOutput::Reply(text) => text,
            ToolOutput::Patch(patch) => &patch.acknowledgement,
        }
    }
}

/// Parse a tool call from its name and JSON arguments.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| RecapError::InvalidInput(format!("Invalid tool arguments: {}", e)))?;

    let required = |key: &str| {
        args[key]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| RecapError::InvalidInput(format!("Missing '{}' argument", key)))
    };

    match name {
        FIND_VIDEO => Ok(ToolCall::FindVideo {
            title: required("title")?,
        }),
        FETCH_TRANSCRIPT => Ok(ToolCall::FetchTranscript {
            video_id: required("video_id")?,
        }),
        _ => Err(RecapError::InvalidInput(format!("Unknown tool: {}", name))),
    }
}

/// Function definitions offered to the model.
pub fn tool_definitions() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: FIND_VIDEO.to_string(),
            description: "Find a YouTube video matching a title or topic. \
                Returns the video's title, link and video_id, or null if nothing matched."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "The video title or topic to search for"
                    }
                },
                "required": ["title"]
            }),
        },
        ToolSpec {
            name: FETCH_TRANSCRIPT.to_string(),
            description: "Fetch the full transcript of a YouTube video and add it to the state \
                so it can be summarized. Call this after find_video with the returned video_id."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "video_id": {
                        "type": "string",
                        "description": "The YouTube video ID"
                    }
                },
                "required": ["video_id"]
            }),
        },
    ]
}

/// Tool implementations with the providers they call and the pool they run on.
#[derive(Clone)]
pub struct Toolbox {
    search: Arc<dyn VideoSearch>,
    transcripts: Arc<dyn TranscriptProvider>,
    pool: WorkerPool,
}

impl Toolbox {
    pub fn new(
        search: Arc<dyn VideoSearch>,
        transcripts: Arc<dyn TranscriptProvider>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            search,
            transcripts,
            pool,
        }
    }

    /// Build the configured providers.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let proxy = settings.transcript.resolved_proxy();
        let search: Arc<dyn VideoSearch> = match settings.search.provider {
            SearchProvider::SerpApi => {
                let api_key = settings.search.resolved_api_key().ok_or_else(|| {
                    RecapError::Config(
                        "SerpAPI key not set. Set SERPAPI_API_KEY or search.api_key, \
                        or use search.provider = \"ytdlp\""
                            .to_string(),
                    )
                })?;
                Arc::new(SerpApiSearch::new(&api_key, proxy.as_deref())?)
            }
            SearchProvider::YtDlp => Arc::new(YtDlpSearch::new().with_proxy(proxy.clone())),
        };
        let transcripts = Arc::new(
            YtDlpTranscripts::new(&settings.transcript.languages).with_proxy(proxy),
        );
        let pool = WorkerPool::new(settings.workflow.max_concurrent_tools);

        Ok(Self::new(search, transcripts, pool))
    }

    /// Execute one tool invocation. Never fails; errors become replies.
    #[instrument(skip(self, invocation), fields(tool = %invocation.name))]
    pub async fn execute(&self, invocation: &ToolInvocation) -> ToolOutput {
        let call = match parse_tool_call(&invocation.name, &invocation.arguments) {
            Ok(call) => call,
            Err(e) => {
                warn!("Rejected tool call: {}", e);
                return ToolOutput::Reply(format!("Failed to parse tool call: {}", e));
            }
        };

        match call {
            ToolCall::FindVideo { title } => self.find_video(title).await,
            ToolCall::FetchTranscript { video_id } => self.fetch_transcript(video_id).await,
        }
    }

    async fn find_video(&self, title: String) -> ToolOutput {
        let search = self.search.clone();
        let result = self
            .pool
            .run(async move { search.find_video(&title).await })
            .await
            .and_then(|r| r);

        match result {
            Ok(Some(video)) => match serde_json::to_string(&video) {
                Ok(json) => ToolOutput::Reply(json),
                Err(e) => ToolOutput::Reply(format!("Tool error: {}", e)),
            },
            Ok(None) => ToolOutput::Reply("null".to_string()),
            Err(e) => {
                warn!("find_video failed: {}", e);
                ToolOutput::Reply(format!("Tool error: {}", e))
            }
        }
    }

    async fn fetch_transcript(&self, video_id: String) -> ToolOutput {
        let transcripts = self.transcripts.clone();
        let result = self
            .pool
            .run(async move { transcripts.fetch_transcript(&video_id).await })
            .await
            .and_then(|r| r);

        match result {
            Ok(transcript) => {
                info!("Transcript fetched ({} chars)", transcript.chars().count());
                ToolOutput::Patch(StatePatch {
                    transcript,
                    acknowledgement: TRANSCRIPT_ACK.to_string(),
                })
            }
            Err(e) => {
                warn!("fetch_transcript failed: {}", e);
                ToolOutput::Reply(format!("Transcript not available: {}", e))
            }
        }
    }
}
