//! The summarization state machine.

use super::state::WorkflowState;
use crate::chunking::TextSplitter;
use crate::config::{Prompts, Settings};
use crate::error::{RecapError, Result};
use crate::generation::{OpenAIGenerator, TextGenerator};
use crate::tools::{tool_definitions, Toolbox};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default number of agent and tool steps allowed per run.
pub const DEFAULT_STEP_LIMIT: usize = 50;

/// Workflow nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Ask the model for the next turn.
    Agent,
    /// Run the tools requested by the last assistant turn.
    Tools,
    /// Split the transcript into chunks.
    Chunk,
    /// Summarize the first chunk.
    SummarizeInit,
    /// Fold the next chunk into the summary.
    Refine,
    Done,
}

impl Step {
    /// Whether executing this step is charged against the step limit.
    pub fn is_counted(self) -> bool {
        matches!(self, Step::Agent | Step::Tools)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Agent => "agent",
            Step::Tools => "tools",
            Step::Chunk => "chunk",
            Step::SummarizeInit => "summarize_init",
            Step::Refine => "refine",
            Step::Done => "done",
        };
        f.write_str(name)
    }
}

/// Decide the step that follows `step`, given the state it left behind.
pub fn next_step(step: Step, state: &WorkflowState) -> Step {
    match step {
        Step::Agent if state.has_pending_tool_calls() => Step::Tools,
        Step::Agent if state.has_transcript() && !state.is_chunked() => Step::Chunk,
        Step::Agent => Step::Done,
        Step::Tools => Step::Agent,
        Step::Chunk => Step::SummarizeInit,
        Step::SummarizeInit | Step::Refine if state.has_remaining_chunks() => Step::Refine,
        Step::SummarizeInit | Step::Refine => Step::Done,
        Step::Done => Step::Done,
    }
}

/// Everything a run needs besides its own state. Built once and shared.
pub struct EngineConfig {
    pub generator: Arc<dyn TextGenerator>,
    pub toolbox: Toolbox,
    pub splitter: TextSplitter,
    pub prompts: Prompts,
    pub step_limit: usize,
}

impl EngineConfig {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        toolbox: Toolbox,
        splitter: TextSplitter,
        prompts: Prompts,
    ) -> Self {
        Self {
            generator,
            toolbox,
            splitter,
            prompts,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    pub fn with_step_limit(mut self, step_limit: usize) -> Self {
        self.step_limit = step_limit;
        self
    }

    /// Build the configured OpenAI generator, search and transcript providers.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let generator = Arc::new(OpenAIGenerator::with_config(&settings.generation)?);
        let toolbox = Toolbox::from_settings(settings)?;
        let splitter = TextSplitter::from_settings(&settings.chunking)?;

        Ok(Self::new(generator, toolbox, splitter, prompts)
            .with_step_limit(settings.workflow.step_limit))
    }
}

/// Drives a [`WorkflowState`] from the user's query to a final summary.
#[derive(Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::shared(Arc::new(config))
    }

    pub fn shared(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh state for `query`, seeded with the agent system prompt.
    pub fn initial_state(&self, query: &str) -> WorkflowState {
        WorkflowState::new(&self.config.prompts.agent_system(), query)
    }

    /// Run the workflow to completion.
    pub async fn run(&self, state: WorkflowState) -> Result<WorkflowState> {
        self.run_observed(state, |_, _| {}).await
    }

    /// Run the workflow, calling `observer` after every executed step.
    pub async fn run_observed<F>(
        &self,
        mut state: WorkflowState,
        mut observer: F,
    ) -> Result<WorkflowState>
    where
        F: FnMut(Step, &WorkflowState) + Send,
    {
        let limit = self.config.step_limit;
        let mut used = 0;
        let mut step = Step::Agent;

        while step != Step::Done {
            if step.is_counted() {
                if used >= limit {
                    return Err(RecapError::StepBudgetExceeded { limit });
                }
                used += 1;
            }

            self.execute(step, &mut state).await?;
            observer(step, &state);
            step = next_step(step, &state);
        }

        info!(
            "Workflow finished after {} agent/tool steps ({} chunks summarized)",
            used,
            state.index()
        );
        Ok(state)
    }

    #[instrument(skip(self, step, state), fields(step = %step))]
    async fn execute(&self, step: Step, state: &mut WorkflowState) -> Result<()> {
        match step {
            Step::Agent => self.agent(state).await,
            Step::Tools => {
                self.tools(state).await;
                Ok(())
            }
            Step::Chunk => self.chunk(state),
            Step::SummarizeInit => self.summarize_init(state).await,
            Step::Refine => self.refine(state).await,
            Step::Done => Ok(()),
        }
    }

    async fn agent(&self, state: &mut WorkflowState) -> Result<()> {
        let reply = self
            .config
            .generator
            .generate_with_tools(state.messages(), &tool_definitions())
            .await?;

        if reply.requests_tools() {
            let names: Vec<&str> = reply.tool_calls.iter().map(|c| c.name.as_str()).collect();
            info!("Agent requested tools: {}", names.join(", "));
        } else {
            debug!("Agent replied without tool calls");
        }

        state.push(reply);
        Ok(())
    }

    /// Run every requested tool concurrently; record results in request order.
    async fn tools(&self, state: &mut WorkflowState) {
        let calls = state.pending_tool_calls().to_vec();
        let toolbox = &self.config.toolbox;

        let outputs = join_all(calls.iter().map(|call| toolbox.execute(call))).await;
        for (call, output) in calls.iter().zip(outputs) {
            state.apply_tool_output(call, output);
        }
    }

    fn chunk(&self, state: &mut WorkflowState) -> Result<()> {
        let transcript = state.transcript().unwrap_or_default();
        let contents = self.config.splitter.split(transcript);
        info!(
            "Split transcript ({} chars) into {} chunks",
            transcript.chars().count(),
            contents.len()
        );
        state.set_contents(contents)
    }

    async fn summarize_init(&self, state: &mut WorkflowState) -> Result<()> {
        let Some(chunk) = state.next_chunk() else {
            debug!("No chunks to summarize");
            return Ok(());
        };

        let prompt = self.config.prompts.initial_summary(chunk);
        let summary = self.config.generator.generate(&prompt).await?;
        state.record_summary(summary);
        info!("Summarized chunk 1/{}", state.chunk_count());
        Ok(())
    }

    async fn refine(&self, state: &mut WorkflowState) -> Result<()> {
        let Some(chunk) = state.next_chunk() else {
            return Ok(());
        };

        let prompt = self.config.prompts.refine_summary(state.summary(), chunk);
        let summary = self.config.generator.generate(&prompt).await?;
        state.record_summary(summary);
        info!("Refined summary with chunk {}/{}", state.index(), state.chunk_count());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{Message, ToolInvocation};
    use crate::tools::{StatePatch, ToolOutput};

    fn call(name: &str) -> ToolInvocation {
        ToolInvocation {
            id: "1".to_string(),
            name: name.to_string(),
            arguments: "{}".to_string(),
        }
    }

    fn with_transcript(text: &str) -> WorkflowState {
        let mut state = WorkflowState::new("", "cats");
        state.apply_tool_output(
            &call("fetch_transcript"),
            ToolOutput::Patch(StatePatch {
                transcript: text.to_string(),
                acknowledgement: "ok".to_string(),
            }),
        );
        state
    }

    #[test]
    fn test_agent_routes_to_tools_when_requested() {
        let mut state = WorkflowState::new("", "cats");
        state.push(Message::assistant_with_tools("", vec![call("find_video")]));
        assert_eq!(next_step(Step::Agent, &state), Step::Tools);
    }

    #[test]
    fn test_agent_routes_to_chunk_once_transcript_arrives() {
        let mut state = with_transcript("meow");
        state.push(Message::assistant("got it"));
        assert_eq!(next_step(Step::Agent, &state), Step::Chunk);

        state.set_contents(vec!["meow".to_string()]).unwrap();
        assert_eq!(next_step(Step::Agent, &state), Step::Done);
    }

    #[test]
    fn test_empty_transcript_is_not_chunked() {
        let mut state = with_transcript("");
        state.push(Message::assistant("nothing to read"));
        assert_eq!(next_step(Step::Agent, &state), Step::Done);
    }

    #[test]
    fn test_agent_without_tools_or_transcript_is_done() {
        let mut state = WorkflowState::new("", "cats");
        state.push(Message::assistant("no idea"));
        assert_eq!(next_step(Step::Agent, &state), Step::Done);
    }

    #[test]
    fn test_fixed_transitions() {
        let state = WorkflowState::new("", "cats");
        assert_eq!(next_step(Step::Tools, &state), Step::Agent);
        assert_eq!(next_step(Step::Chunk, &state), Step::SummarizeInit);
        assert_eq!(next_step(Step::Done, &state), Step::Done);
    }

    #[test]
    fn test_reduction_transitions_follow_index() {
        let mut state = with_transcript("a b");
        state.set_contents(vec!["a".to_string(), "b".to_string()]).unwrap();

        state.record_summary("s1".to_string());
        assert_eq!(next_step(Step::SummarizeInit, &state), Step::Refine);

        state.record_summary("s2".to_string());
        assert_eq!(next_step(Step::Refine, &state), Step::Done);
        assert_eq!(next_step(Step::SummarizeInit, &state), Step::Done);
    }

    #[test]
    fn test_only_agent_and_tools_are_counted() {
        assert!(Step::Agent.is_counted());
        assert!(Step::Tools.is_counted());
        assert!(!Step::Chunk.is_counted());
        assert!(!Step::Refine.is_counted());
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::SummarizeInit.to_string(), "summarize_init");
    }
}
