//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::workflow::Step;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(query: &str, speech: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Summarize, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'recap doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Looking for a matching video...");
    let progress = spinner.clone();

    let outcome = orchestrator
        .run_observed(query, speech, move |step, state| {
            let message = match step {
                Step::Agent if state.has_pending_tool_calls() => "Calling tools...".to_string(),
                Step::Agent | Step::Tools => "Thinking...".to_string(),
                Step::Chunk => format!("Split transcript into {} chunks", state.chunk_count()),
                Step::SummarizeInit | Step::Refine => format!(
                    "Summarizing ({}/{})...",
                    state.index(),
                    state.chunk_count()
                ),
                Step::Done => "Done".to_string(),
            };
            progress.set_message(message);
        })
        .await;
    spinner.finish_and_clear();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("Summarization failed: {}", e));
            return Err(e.into());
        }
    };

    if result.is_empty() {
        Output::warning(&format!("No video found for \"{}\".", query));
        return Ok(());
    }

    Output::header(result.title.as_deref().unwrap_or("Summary"));
    if let Some(link) = &result.video_link {
        Output::kv("Link", link);
    }
    println!();

    if result.summary.is_empty() {
        Output::warning("The video has no usable transcript, so nothing was summarized.");
    } else {
        Output::paragraph(&result.summary);
    }

    match (&result.audio_path, speech) {
        (Some(path), _) => {
            println!();
            Output::success(&format!("Audio saved to {}", path.display()));
        }
        (None, true) if !result.summary.is_empty() => {
            Output::warning("Speech synthesis failed; see logs with -v for details.");
        }
        _ => {}
    }

    Ok(())
}
