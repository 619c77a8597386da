//! Per-run workflow state.

use crate::error::{RecapError, Result};
use crate::generation::{Message, ToolInvocation};
use crate::tools::ToolOutput;

/// The record threaded through one run of the workflow.
///
/// Messages are append-only. `contents` is set once, by the chunking step,
/// and `index` only moves forward through it.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    messages: Vec<Message>,
    transcript: Option<String>,
    contents: Option<Vec<String>>,
    index: usize,
    summary: String,
}

impl WorkflowState {
    /// Seed a run with the system prompt and the user's query.
    pub fn new(system_prompt: &str, query: &str) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(query)],
            ..Default::default()
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn contents(&self) -> Option<&[String]> {
        self.contents.as_deref()
    }

    /// Number of chunks already folded into the summary.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Tool calls requested by the latest assistant turn, if it is the last message.
    pub fn pending_tool_calls(&self) -> &[ToolInvocation] {
        match self.messages.last() {
            Some(message) if message.requests_tools() => message.tool_calls.as_slice(),
            _ => &[],
        }
    }

    pub fn has_pending_tool_calls(&self) -> bool {
        !self.pending_tool_calls().is_empty()
    }

    /// Whether a non-empty transcript has been fetched.
    pub fn has_transcript(&self) -> bool {
        self.transcript.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn is_chunked(&self) -> bool {
        self.contents.is_some()
    }

    pub fn chunk_count(&self) -> usize {
        self.contents.as_ref().map_or(0, Vec::len)
    }

    /// Whether chunks remain to be folded into the summary.
    pub fn has_remaining_chunks(&self) -> bool {
        self.index < self.chunk_count()
    }

    /// Chunk at the cursor.
    pub(crate) fn next_chunk(&self) -> Option<&str> {
        self.contents
            .as_ref()
            .and_then(|contents| contents.get(self.index))
            .map(String::as_str)
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append the tool turn for `invocation`, applying any state patch it carries.
    pub(crate) fn apply_tool_output(&mut self, invocation: &ToolInvocation, output: ToolOutput) {
        match output {
            ToolOutput::Reply(text) => self.push(Message::tool(invocation, text)),
            ToolOutput::Patch(patch) => {
                self.transcript = Some(patch.transcript);
                self.push(Message::tool(invocation, patch.acknowledgement));
            }
        }
    }

    pub(crate) fn set_contents(&mut self, contents: Vec<String>) -> Result<()> {
        if self.contents.is_some() {
            return Err(RecapError::Workflow(
                "Transcript was already chunked in this run".to_string(),
            ));
        }
        self.contents = Some(contents);
        self.index = 0;
        Ok(())
    }

    /// Replace the summary after folding in the chunk at the cursor.
    pub(crate) fn record_summary(&mut self, summary: String) {
        self.summary = summary;
        self.index = (self.index + 1).min(self.chunk_count());
    }
}
