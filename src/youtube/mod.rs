//! YouTube video export.
//!
//! Fetches the watch page, pulls the caption track, optionally summarizes
//! it, and writes one Markdown file per video into the target directory.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::sync::file::atomic_write;
use crate::util::{format_duration, sanitize_file_stem};

mod summarize;
mod transcript;

pub use transcript::{Transcript, TranscriptItem, VideoClient, VideoData, extract_video_id};

/// Export one video to `{target}/{title}.md`.
///
/// The summary section is produced only when `with_summary` is set; with an
/// empty `youtube.model` it degrades to concatenated transcript windows.
///
/// # Errors
///
/// Fetch and parse failures from the watch page, plus I/O errors on the
/// target directory.
pub fn export(
    config: &Config,
    video_url: &str,
    target: &Path,
    with_transcript: bool,
    with_summary: bool,
) -> Result<()> {
    let client = VideoClient::new()?;
    let mut video = client.fetch(video_url, &config.youtube.language)?;

    if with_summary {
        video.summary = Some(summarize::summarize(&video.transcript, &config.youtube)?);
    }

    fs::create_dir_all(target)?;
    let file_name = format!("{}.md", sanitize_file_stem(&video.title));
    let path = target.join(&file_name);
    atomic_write(&path, &render_video(&video, with_transcript))?;

    info!(path = %path.display(), "exported video");
    Ok(())
}

/// Render the Markdown document for one video.
#[must_use]
pub fn render_video(video: &VideoData, with_transcript: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", video.title));
    out.push_str(&format!("- URL: {}\n", video.url));
    out.push_str(&format!("- Author: {}\n", video.author));
    out.push_str(&format!("- Length: {}\n", format_duration(video.length)));
    if let Some(date) = &video.publish_date {
        out.push_str(&format!("- Publish date: {date}\n"));
    }
    if !video.keywords.is_empty() {
        out.push_str(&format!("- Keywords: {}\n", video.keywords.join(", ")));
    }
    if let Some(description) = &video.description {
        out.push_str(&format!("\n**Description:**\n\n{description}\n"));
    }

    if let Some(summary) = &video.summary {
        out.push_str("\n## Summary\n");
        for item in &summary.items {
            out.push_str(&format!(
                "\n[{}]\n\n{}\n",
                format_duration(item.start_ts),
                item.text
            ));
        }
    }

    if with_transcript {
        out.push_str("\n## Transcript\n");
        for item in &video.transcript.items {
            out.push_str(&format!(
                "\n[{}]\n{}\n",
                format_duration(item.start_ts),
                item.text
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video() -> VideoData {
        VideoData {
            title: "Learning in Public".to_string(),
            url: "https://www.youtube.com/watch?v=2lAe1cqCOXo".to_string(),
            author: "Some Channel".to_string(),
            length: 754.0,
            publish_date: Some("2024-03-01".to_string()),
            keywords: vec!["learning".to_string(), "notes".to_string()],
            description: Some("A talk about notes.".to_string()),
            transcript: Transcript {
                items: vec![
                    TranscriptItem {
                        start_ts: 0.0,
                        duration: 4.0,
                        text: "Hello everyone".to_string(),
                    },
                    TranscriptItem {
                        start_ts: 65.0,
                        duration: 3.0,
                        text: "Let's begin".to_string(),
                    },
                ],
                language: "en".to_string(),
            },
            summary: None,
        }
    }

    #[test]
    fn test_render_metadata_and_transcript() {
        let rendered = render_video(&sample_video(), true);

        assert!(rendered.starts_with("# Learning in Public\n"));
        assert!(rendered.contains("- Length: 12:34\n"));
        assert!(rendered.contains("- Publish date: 2024-03-01\n"));
        assert!(rendered.contains("- Keywords: learning, notes\n"));
        assert!(rendered.contains("**Description:**\n\nA talk about notes.\n"));
        assert!(rendered.contains("## Transcript\n\n[0:00]\nHello everyone\n"));
        assert!(rendered.contains("\n[1:05]\nLet's begin\n"));
    }

    #[test]
    fn test_render_without_transcript_or_summary() {
        let rendered = render_video(&sample_video(), false);
        assert!(!rendered.contains("## Transcript"));
        assert!(!rendered.contains("## Summary"));
    }

    #[test]
    fn test_render_summary_section() {
        let mut video = sample_video();
        video.summary = Some(Transcript {
            items: vec![TranscriptItem {
                start_ts: 0.0,
                duration: 68.0,
                text: "An introduction.".to_string(),
            }],
            language: "en".to_string(),
        });

        let rendered = render_video(&video, false);
        assert!(rendered.contains("## Summary\n\n[0:00]\n\nAn introduction.\n"));
    }
}
