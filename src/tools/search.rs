//! Video search providers for the `find_video` tool.

use super::VideoInfo;
use crate::error::{RecapError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{info, instrument, warn};

const SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

/// Trait for video search providers.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Return the best match for `query`, or `None` if the search had no results.
    async fn find_video(&self, query: &str) -> Result<Option<VideoInfo>>;
}

/// Extract a YouTube video ID from a watch link, short link or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(url) = url::Url::parse(input) {
        if let Some((_, v)) = url.query_pairs().find(|(key, _)| key == "v") {
            if !v.is_empty() {
                return Some(v.into_owned());
            }
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        if url.host_str().is_some_and(|h| h.ends_with("youtu.be")) {
            if let Some(id) = segments.first() {
                return Some(id.to_string());
            }
        }

        if let [kind, id, ..] = segments.as_slice() {
            if matches!(*kind, "shorts" | "embed" | "v" | "live") {
                return Some(id.to_string());
            }
        }
    }

    if bare_id_regex().is_match(input) {
        return Some(input.to_string());
    }

    // Last resort: whatever follows the final "v=".
    input
        .rsplit_once("v=")
        .map(|(_, rest)| rest.split('&').next().unwrap_or(rest).to_string())
        .filter(|id| !id.is_empty())
}

fn bare_id_regex() -> &'static Regex {
    static BARE_ID: OnceLock<Regex> = OnceLock::new();
    BARE_ID.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("Invalid regex"))
}

/// SerpAPI YouTube search.
pub struct SerpApiSearch {
    client: reqwest::Client,
    api_key: String,
}

impl SerpApiSearch {
    /// Build a client for `api_key`, optionally routing every request through `proxy`.
    pub fn new(api_key: &str, proxy: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| RecapError::Config(format!("Invalid proxy URL {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: api_key.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    video_results: Vec<SerpApiVideo>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpApiVideo {
    title: String,
    link: String,
}

/// Top video of a SerpAPI response; `None` if it has no derivable ID.
fn first_video(response: SerpApiResponse) -> Option<VideoInfo> {
    let video = response.video_results.into_iter().next()?;
    let video_id = extract_video_id(&video.link)?;
    Some(VideoInfo {
        title: video.title,
        link: video.link,
        video_id,
    })
}

#[async_trait]
impl VideoSearch for SerpApiSearch {
    #[instrument(skip(self))]
    async fn find_video(&self, query: &str) -> Result<Option<VideoInfo>> {
        info!("Searching YouTube via SerpAPI");

        let response = self
            .client
            .get(SERPAPI_ENDPOINT)
            .query(&[
                ("engine", "youtube"),
                ("search_query", query),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecapError::Search(format!(
                "SerpAPI returned {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        let body: SerpApiResponse = response.json().await?;
        if let Some(error) = &body.error {
            warn!("SerpAPI reported: {}", error);
        }

        let video = first_video(body);
        match &video {
            Some(v) => info!("Found video: {} ({})", v.title, v.video_id),
            None => warn!("No video results found"),
        }
        Ok(video)
    }
}

/// Search through `yt-dlp ytsearch1:`; needs no API key.
pub struct YtDlpSearch {
    proxy: Option<String>,
}

impl YtDlpSearch {
    pub fn new() -> Self {
        Self { proxy: None }
    }

    /// Route yt-dlp through `proxy`.
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    fn command_args(&self, query: &str) -> Vec<String> {
        let mut args: Vec<String> = ["--dump-json", "--flat-playlist", "--no-warnings"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        args.push(format!("ytsearch1:{}", query));
        args
    }
}

impl Default for YtDlpSearch {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the first entry of `yt-dlp --dump-json --flat-playlist` output.
fn parse_ytdlp_search(stdout: &str) -> Option<VideoInfo> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .find_map(|json| {
            let link = json["webpage_url"]
                .as_str()
                .or_else(|| json["url"].as_str())
                .map(|s| s.to_string())
                .or_else(|| {
                    json["id"]
                        .as_str()
                        .map(|id| format!("https://www.youtube.com/watch?v={}", id))
                })?;
            let video_id = json["id"]
                .as_str()
                .map(|s| s.to_string())
                .or_else(|| extract_video_id(&link))?;
            let title = json["title"].as_str().unwrap_or("Unknown Title").to_string();

            Some(VideoInfo {
                title,
                link,
                video_id,
            })
        })
}

#[async_trait]
impl VideoSearch for YtDlpSearch {
    #[instrument(skip(self))]
    async fn find_video(&self, query: &str) -> Result<Option<VideoInfo>> {
        info!("Searching YouTube via yt-dlp");

        let output = tokio::process::Command::new("yt-dlp")
            .args(self.command_args(query))
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RecapError::ToolNotFound("yt-dlp".to_string())
                } else {
                    RecapError::Search(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecapError::Search(format!("yt-dlp search failed: {}", stderr.trim())));
        }

        let video = parse_ytdlp_search(&String::from_utf8_lossy(&output.stdout));
        if video.is_none() {
            warn!("No video results found");
        }
        Ok(video)
    }
}
