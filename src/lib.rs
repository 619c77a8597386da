//! recap - video query summarizer
//!
//! Finds the YouTube video that best matches a natural-language query,
//! fetches its transcript and reduces it to a narrative summary, optionally
//! rendered to speech.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `chunking` - Transcript splitting
//! - `tools` - `find_video` / `fetch_transcript` and their providers
//! - `generation` - Text generation abstraction and the OpenAI backend
//! - `workflow` - The agent / tools / chunk / summarize / refine state machine
//! - `speech` - Text-to-speech
//! - `orchestrator` - Query in, [`orchestrator::SummaryResult`] out
//!
//! # Example
//!
//! ```rust,no_run
//! use recap::config::Settings;
//! use recap::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator.run("how do transformers work", false).await?;
//!     println!("{}", result.summary);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod speech;
pub mod tools;
pub mod workflow;

pub use error::{RecapError, Result};
