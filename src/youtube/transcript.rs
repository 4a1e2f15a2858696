//! Video metadata and transcript retrieval.
//!
//! YouTube has no public transcript API; the watch page embeds a
//! `ytInitialPlayerResponse` JSON blob that carries the video details and
//! the caption track URLs. Fetching a track with `fmt=json3` yields the
//! transcript as timed events.

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse = ";

/// One timed piece of transcript text.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptItem {
    /// Seconds from the beginning of the video.
    pub start_ts: f64,
    pub duration: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub items: Vec<TranscriptItem>,
    pub language: String,
}

/// Everything exported about one video.
#[derive(Debug)]
pub struct VideoData {
    pub title: String,
    pub url: String,
    pub author: String,
    /// Length in seconds.
    pub length: f64,
    /// `YYYY-MM-DD`, when the page carries it.
    pub publish_date: Option<String>,
    pub keywords: Vec<String>,
    pub description: Option<String>,
    pub transcript: Transcript,
    pub summary: Option<Transcript>,
}

/// Extract the video id from any of the common YouTube URL shapes.
#[must_use]
pub fn extract_video_id(video_url: &str) -> Option<String> {
    let parsed = Url::parse(video_url).ok()?;
    let host = parsed.host_str()?;

    if host == "youtu.be" {
        return Some(parsed.path().trim_start_matches('/').to_string());
    }

    if host == "www.youtube.com" || host == "youtube.com" {
        if parsed.path() == "/watch" {
            return parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned());
        }
        if let Some(rest) = parsed.path().strip_prefix("/embed/") {
            return Some(rest.split('/').next().unwrap_or(rest).to_string());
        }
        if let Some(rest) = parsed.path().strip_prefix("/v/") {
            return Some(rest.split('/').next().unwrap_or(rest).to_string());
        }
    }

    None
}

// ── Player response types ─────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    video_details: VideoDetails,
    #[serde(default)]
    captions: Option<Captions>,
    #[serde(default)]
    microformat: Option<Microformat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetails {
    title: String,
    author: String,
    length_seconds: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    short_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: CaptionsRenderer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Microformat {
    player_microformat_renderer: MicroformatRenderer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MicroformatRenderer {
    #[serde(default)]
    publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: Option<u64>,
    #[serde(default)]
    segs: Option<Vec<Json3Segment>>,
}

#[derive(Debug, Default, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

// ── Client ────────────────────────────────────────────────────

/// Blocking client for the YouTube watch page and caption tracks.
pub struct VideoClient {
    http: Client,
}

impl VideoClient {
    /// # Errors
    ///
    /// `Error::Other` if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Fetch the video metadata and its transcript in `language`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidSource` for URLs that are not videos or videos with
    /// no captions, `Error::Fetch` for network failures.
    pub fn fetch(&self, video_url: &str, language: &str) -> Result<VideoData> {
        let video_id = extract_video_id(video_url).ok_or_else(|| {
            Error::InvalidSource(format!("'{video_url}' is not a youtube video url"))
        })?;

        let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
        debug!(url = %watch_url, "fetching youtube watch page");
        let html = self
            .http
            .get(&watch_url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| Error::Fetch(format!("cannot fetch {watch_url}: {e}")))?
            .text()
            .map_err(|e| Error::Fetch(format!("cannot read {watch_url}: {e}")))?;

        let player_json = extract_json_object(&html, PLAYER_RESPONSE_MARKER).ok_or_else(|| {
            Error::InvalidSource(format!(
                "no player data found for {video_id}; the video may be unavailable"
            ))
        })?;
        let player: PlayerResponse = serde_json::from_str(player_json)?;

        let transcript = self.fetch_transcript(&player, &video_id, language)?;

        let length = player.video_details.length_seconds.parse().unwrap_or(0.0);
        Ok(VideoData {
            title: player.video_details.title,
            url: video_url.to_string(),
            author: player.video_details.author,
            length,
            publish_date: player
                .microformat
                .map(|m| m.player_microformat_renderer)
                .and_then(|m| m.publish_date)
                // The date may carry a time component; only the date part
                // goes into the output.
                .map(|date| date.chars().take(10).collect()),
            keywords: player.video_details.keywords,
            description: player
                .video_details
                .short_description
                .filter(|d| !d.is_empty()),
            transcript,
            summary: None,
        })
    }

    fn fetch_transcript(
        &self,
        player: &PlayerResponse,
        video_id: &str,
        language: &str,
    ) -> Result<Transcript> {
        let tracks = player
            .captions
            .as_ref()
            .map(|c| c.player_captions_tracklist_renderer.caption_tracks.as_slice())
            .unwrap_or_default();

        let track = tracks
            .iter()
            .find(|t| t.language_code == language)
            .or_else(|| {
                tracks
                    .iter()
                    .find(|t| t.language_code.starts_with(language))
            })
            .ok_or_else(|| {
                Error::InvalidSource(format!(
                    "no '{language}' transcript available for {video_id}"
                ))
            })?;

        let track_url = format!("{}&fmt=json3", track.base_url);
        debug!(language = %track.language_code, "fetching caption track");
        let json3: Json3Transcript = self
            .http
            .get(&track_url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| Error::Fetch(format!("cannot fetch transcript: {e}")))?
            .json()
            .map_err(|e| Error::Fetch(format!("cannot decode transcript: {e}")))?;

        Ok(transcript_from_events(json3, &track.language_code))
    }
}

#[allow(clippy::cast_precision_loss)]
fn transcript_from_events(json3: Json3Transcript, language: &str) -> Transcript {
    let items = json3
        .events
        .into_iter()
        .filter_map(|event| {
            let segs = event.segs?;
            let raw: String = segs.into_iter().map(|s| s.utf8).collect();
            // Collapse whitespace runs (captions often embed newlines).
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(TranscriptItem {
                start_ts: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms.unwrap_or(0) as f64 / 1000.0,
                text,
            })
        })
        .collect();

    Transcript {
        items,
        language: language.to_string(),
    }
}

/// Find the JSON object assigned right after `marker` in a script blob, by
/// scanning balanced braces with string awareness.
fn extract_json_object<'a>(html: &'a str, marker: &str) -> Option<&'a str> {
    let start = html.find(marker)? + marker.len();
    let rest = &html[start..];
    if !rest.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in rest.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
