//! Prompt templates for recap.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"))
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    pub summary: SummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the tool-routing agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You help people who cannot watch a YouTube video understand what it is about.

You have two tools:
- 'find_video' searches YouTube and returns the title, link and video_id of the best match
- 'fetch_transcript' loads the transcript of a video by its video_id

Guidelines:
- Use 'find_video' first unless the user already gave you a video_id
- Then call 'fetch_transcript' with the video_id from the search result
- If a transcript is not available, you may try a different search once, otherwise explain briefly that no transcript could be found
- Once the transcript has been added, reply with a short confirmation; the summary is written separately"#
                .to_string(),
        }
    }
}

/// The initial/refine summarization template pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// Rendered with {{context}}.
    pub initial: String,
    /// Rendered with {{existing_answer}} and {{context}}.
    pub refine: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            initial: r#"You are summarizing a YouTube video for someone who cannot watch it.

Objective: write a well-structured, engaging and detailed summary of the segment below.

- Capture the key points, themes and emotions
- For story-driven videos (films, vlogs), highlight plot twists, character actions and motivations
- For educational or informational videos, focus on the main insights, lessons and takeaways
- Keep it concise yet descriptive, so the reader feels they watched the video
- Do not mention the word "transcript"

First segment of the video:
----------------
{{context}}
----------------

Write a concise but detailed summary of this content."#
                .to_string(),

            refine: r#"You are refining the summary of a YouTube video so it reads as engaging, structured and easy to follow.

Objective: merge the new segment into the existing summary, producing one refined version that reflects everything seen so far.

Guidelines:
- Keep the existing summary and the new segment coherent and flowing
- Include any key moments the new segment introduces
- For story-driven videos, deepen plot developments, character actions, emotional moments, setting, location and time
- For informational videos, sharpen the main ideas and lessons
- Stay concise but engaging, written in a warm narrative voice
- Do not mention the word "transcript"

Existing summary so far:
{{existing_answer}}

New segment:
{{context}}

Now write the refined summary."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are filled in a single pass over the template; inserted
    /// values are never scanned again. Unknown placeholders are left as-is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Agent system prompt with custom variables applied.
    pub fn agent_system(&self) -> String {
        self.render_with_custom(&self.agent.system, &HashMap::new())
    }

    /// Prompt for summarizing the first chunk.
    pub fn initial_summary(&self, context: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.to_string());
        self.render_with_custom(&self.summary.initial, &vars)
    }

    /// Prompt for folding `context` into `existing_answer`.
    pub fn refine_summary(&self, existing_answer: &str, context: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("existing_answer".to_string(), existing_answer.to_string());
        vars.insert("context".to_string(), context.to_string());
        self.render_with_custom(&self.summary.refine, &vars)
    }
}
