//! Scripted collaborators for driving the real engine without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use recap::chunking::TextSplitter;
use recap::config::Prompts;
use recap::generation::{Message, Role, TextGenerator, ToolInvocation, ToolSpec};
use recap::speech::SpeechSynthesizer;
use recap::tools::{
    Toolbox, TranscriptProvider, VideoInfo, VideoSearch, WorkerPool, FETCH_TRANSCRIPT, FIND_VIDEO,
};
use recap::workflow::{Engine, EngineConfig};
use recap::{RecapError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FINAL_ANSWER: &str = "Here is what I found.";

fn invocation(n: usize, name: &str, arguments: serde_json::Value) -> ToolInvocation {
    ToolInvocation {
        id: format!("call_{}", n),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

fn tool_turns<'a>(messages: &'a [Message], name: &'a str) -> impl Iterator<Item = &'a Message> {
    messages
        .iter()
        .filter(move |m| m.role == Role::Tool && m.name.as_deref() == Some(name))
}

/// Agent that searches with the user query, fetches the transcript of what it
/// found and then answers. Summarization prompts come back as `S[<prompt>]`.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub agent_calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    /// Fail every `generate` call.
    pub fail_generate: bool,
    /// Fail every `generate_with_tools` call.
    pub fail_agent: bool,
}

impl ScriptedGenerator {
    pub fn failing_generate() -> Self {
        Self {
            fail_generate: true,
            ..Default::default()
        }
    }

    pub fn failing_agent() -> Self {
        Self {
            fail_agent: true,
            ..Default::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if self.fail_generate {
            return Err(RecapError::Generation("quota exceeded".to_string()));
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("S[{}]", prompt))
    }

    async fn generate_with_tools(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<Message> {
        let n = self.agent_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_agent {
            return Err(RecapError::Generation("model unavailable".to_string()));
        }
        assert!(tools.iter().any(|t| t.name == FIND_VIDEO));

        let searched = tool_turns(messages, FIND_VIDEO).next().is_some();
        if !searched {
            let query = messages
                .iter()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            return Ok(Message::assistant_with_tools(
                "",
                vec![invocation(n, FIND_VIDEO, serde_json::json!({ "title": query }))],
            ));
        }

        let fetched = tool_turns(messages, FETCH_TRANSCRIPT).next().is_some();
        let found = tool_turns(messages, FIND_VIDEO)
            .find_map(|m| serde_json::from_str::<VideoInfo>(&m.content).ok());
        match (found, fetched) {
            (Some(video), false) => Ok(Message::assistant_with_tools(
                "",
                vec![invocation(
                    n,
                    FETCH_TRANSCRIPT,
                    serde_json::json!({ "video_id": video.video_id }),
                )],
            )),
            _ => Ok(Message::assistant(FINAL_ANSWER)),
        }
    }
}

/// Agent that never stops asking for a transcript.
#[derive(Default)]
pub struct LoopingGenerator {
    pub agent_calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for LoopingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("S[{}]", prompt))
    }

    async fn generate_with_tools(
        &self,
        _messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<Message> {
        let n = self.agent_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Message::assistant_with_tools(
            "",
            vec![invocation(
                n,
                FETCH_TRANSCRIPT,
                serde_json::json!({ "video_id": "missing" }),
            )],
        ))
    }
}

/// Agent that requests both tools in a single turn, then answers.
#[derive(Default)]
pub struct ParallelToolsGenerator;

#[async_trait]
impl TextGenerator for ParallelToolsGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("S[{}]", prompt))
    }

    async fn generate_with_tools(
        &self,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<Message> {
        if messages.iter().any(|m| m.role == Role::Tool) {
            return Ok(Message::assistant(FINAL_ANSWER));
        }
        Ok(Message::assistant_with_tools(
            "",
            vec![
                invocation(
                    1,
                    FETCH_TRANSCRIPT,
                    serde_json::json!({ "video_id": "AAAAAAAAAAA" }),
                ),
                invocation(2, FIND_VIDEO, serde_json::json!({ "title": "cats" })),
            ],
        ))
    }
}

/// Search returning a fixed video, or nothing.
pub struct MockSearch {
    pub video: Option<VideoInfo>,
    pub calls: AtomicUsize,
}

impl MockSearch {
    pub fn found() -> Self {
        Self {
            video: Some(cat_video()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            video: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VideoSearch for MockSearch {
    async fn find_video(&self, _query: &str) -> Result<Option<VideoInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.video.clone())
    }
}

pub fn cat_video() -> VideoInfo {
    VideoInfo {
        title: "Cats being cats".to_string(),
        link: "https://www.youtube.com/watch?v=AAAAAAAAAAA".to_string(),
        video_id: "AAAAAAAAAAA".to_string(),
    }
}

/// Caption provider returning fixed segments, or always failing.
pub struct MockTranscripts {
    pub segments: Option<Vec<String>>,
    pub calls: AtomicUsize,
}

impl MockTranscripts {
    pub fn with_segments(segments: &[&str]) -> Self {
        Self {
            segments: Some(segments.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            segments: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranscriptProvider for MockTranscripts {
    async fn fetch_segments(&self, video_id: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.segments
            .clone()
            .ok_or_else(|| RecapError::Transcript(format!("captions disabled for {}", video_id)))
    }
}

/// Speech backend that records what it was asked to say.
#[derive(Default)]
pub struct MockSpeech {
    pub texts: Mutex<Vec<String>>,
    pub fail: bool,
}

impl MockSpeech {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str) -> Result<PathBuf> {
        if self.fail {
            return Err(RecapError::Speech("voice unavailable".to_string()));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(PathBuf::from("/tmp/recap-test/summary.mp3"))
    }
}

/// Prompts with visible markers so tests can follow what each call saw.
pub fn marker_prompts() -> Prompts {
    let mut prompts = Prompts::default();
    prompts.agent.system = "You find and summarize videos.".to_string();
    prompts.summary.initial = "INIT<{{context}}>".to_string();
    prompts.summary.refine = "REFINE<{{existing_answer}}><{{context}}>".to_string();
    prompts
}

pub fn config(
    generator: Arc<dyn TextGenerator>,
    search: Arc<dyn VideoSearch>,
    transcripts: Arc<dyn TranscriptProvider>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> EngineConfig {
    let toolbox = Toolbox::new(search, transcripts, WorkerPool::new(4));
    let splitter = TextSplitter::new(chunk_size, chunk_overlap).unwrap();
    EngineConfig::new(generator, toolbox, splitter, marker_prompts())
}

pub fn engine(
    generator: Arc<dyn TextGenerator>,
    search: Arc<dyn VideoSearch>,
    transcripts: Arc<dyn TranscriptProvider>,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Engine {
    Engine::new(config(generator, search, transcripts, chunk_size, chunk_overlap))
}
