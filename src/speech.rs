//! Text-to-speech rendering of finished summaries.

use crate::chunking::TextSplitter;
use crate::config::SpeechSettings;
use crate::error::{RecapError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Longest input the speech endpoint accepts per request, with some headroom.
const MAX_SPEECH_INPUT_CHARS: usize = 4000;

/// Trait for speech synthesis backends.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Render `text` to an audio file and return its path.
    async fn synthesize(&self, text: &str) -> Result<PathBuf>;
}

/// OpenAI speech endpoint, writing mp3 files into a directory.
pub struct OpenAISpeech {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
    audio_dir: PathBuf,
}

impl OpenAISpeech {
    pub fn with_config(settings: &SpeechSettings, audio_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: parse_model(&settings.model),
            voice: parse_voice(&settings.voice)?,
            audio_dir,
        })
    }

    pub fn audio_dir(&self) -> &PathBuf {
        &self.audio_dir
    }
}

fn parse_model(model: &str) -> SpeechModel {
    match model {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

fn parse_voice(voice: &str) -> Result<Voice> {
    match voice.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        other => Err(RecapError::Config(format!(
            "Unknown speech voice: {}. Use alloy, echo, fable, onyx, nova or shimmer",
            other
        ))),
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeech {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str) -> Result<PathBuf> {
        let pieces = TextSplitter::new(MAX_SPEECH_INPUT_CHARS, 0)?.split(text);
        if pieces.is_empty() {
            return Err(RecapError::Speech("Nothing to synthesize".to_string()));
        }

        let mut audio = Vec::new();
        for (i, piece) in pieces.iter().enumerate() {
            debug!("Synthesizing piece {}/{}", i + 1, pieces.len());
            let request = CreateSpeechRequestArgs::default()
                .input(piece.as_str())
                .model(self.model.clone())
                .voice(self.voice.clone())
                .response_format(SpeechResponseFormat::Mp3)
                .build()
                .map_err(|e| RecapError::Speech(e.to_string()))?;

            let response = self
                .client
                .audio()
                .speech(request)
                .await
                .map_err(|e| RecapError::Speech(e.to_string()))?;
            audio.extend_from_slice(&response.bytes);
        }

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let path = self.audio_dir.join(format!("{}.mp3", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, &audio).await?;

        info!("Wrote {} bytes of audio to {}", audio.len(), path.display());
        Ok(path)
    }
}
