use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{ReelError, ReelResult};
use crate::transcript::segment::{Segment, normalize_segments};

/// Producer of timestamped speech segments for an audio or video input.
///
/// Implementations own whatever recognizer state they need (a loaded model, a client handle);
/// the pipeline borrows the transcriber for each call and never reaches for a global instance.
pub trait Transcriber {
    fn transcribe(&self, media: &Path) -> ReelResult<Vec<Segment>>;
}

/// On-disk transcript formats understood by [`TranscriptFile`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TranscriptFormat {
    /// `{"segments":[{"start":..,"end":..,"text":..}]}` or a bare array of segments.
    Json,
    /// SubRip cues.
    Srt,
}

impl TranscriptFormat {
    /// Guess the format from the file extension, falling back to content sniffing.
    pub fn detect(path: &Path, contents: &str) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("srt") => Self::Srt,
            Some("json") => Self::Json,
            _ => {
                let head = contents.trim_start();
                if head.starts_with('{') || head.starts_with('[') {
                    Self::Json
                } else {
                    Self::Srt
                }
            }
        }
    }
}

/// Transcriber backed by a transcript document produced ahead of time by an external recognizer.
///
/// The media path handed to [`Transcriber::transcribe`] is ignored; the document at `path`
/// already describes it.
#[derive(Clone, Debug)]
pub struct TranscriptFile {
    path: PathBuf,
}

impl TranscriptFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Transcriber for TranscriptFile {
    fn transcribe(&self, _media: &Path) -> ReelResult<Vec<Segment>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read transcript '{}'", self.path.display()))?;
        let segments = match TranscriptFormat::detect(&self.path, &contents) {
            TranscriptFormat::Json => parse_json_transcript(&contents)?,
            TranscriptFormat::Srt => parse_srt(&contents)?,
        };
        tracing::info!(
            path = %self.path.display(),
            segments = segments.len(),
            "loaded transcript"
        );
        Ok(segments)
    }
}

#[derive(serde::Deserialize)]
struct RawSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum RawTranscript {
    Wrapped { segments: Vec<RawSegment> },
    Bare(Vec<RawSegment>),
}

/// Parse recognizer JSON output. Entries that are not valid segments are skipped.
pub fn parse_json_transcript(json: &str) -> ReelResult<Vec<Segment>> {
    let raw: RawTranscript = serde_json::from_str(json)
        .map_err(|e| ReelError::serde(format!("transcript json: {e}")))?;
    let entries = match raw {
        RawTranscript::Wrapped { segments } => segments,
        RawTranscript::Bare(segments) => segments,
    };
    Ok(normalize_segments(
        entries.into_iter().map(|s| (s.start, s.end, s.text)),
    ))
}

/// Parse SubRip cues into segments. Multi-line cue text is joined with spaces.
pub fn parse_srt(input: &str) -> ReelResult<Vec<Segment>> {
    let mut raw = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        let index_line = line.trim().trim_start_matches('\u{feff}');
        if index_line.is_empty() {
            continue;
        }

        // The index line is optional in the wild.
        let times = if index_line.contains("-->") {
            index_line.to_string()
        } else {
            lines
                .next()
                .map(|l| l.trim().to_string())
                .ok_or_else(|| ReelError::serde("srt cue is missing a timestamp line"))?
        };

        let (start_raw, end_raw) = times
            .split_once("-->")
            .map(|(a, b)| (a.trim(), b.trim()))
            .ok_or_else(|| ReelError::serde(format!("srt timestamp line lacks '-->': {times}")))?;
        let start = parse_srt_timestamp(start_raw)?;
        let end = parse_srt_timestamp(end_raw)?;

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            text_lines.push(next.trim().to_string());
            lines.next();
        }

        raw.push((start, end, text_lines.join(" ")));
    }

    Ok(normalize_segments(raw))
}

fn parse_srt_timestamp(value: &str) -> ReelResult<f64> {
    let bad = || ReelError::serde(format!("invalid srt timestamp '{value}'"));

    let cleaned = value.trim().replace(',', ".");
    let (time_part, fractional) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), "0"));

    let mut hms = time_part.split(':');
    let hours: u64 = hms.next().and_then(|v| v.parse().ok()).ok_or_else(bad)?;
    let minutes: u64 = hms.next().and_then(|v| v.parse().ok()).ok_or_else(bad)?;
    let seconds: u64 = hms.next().and_then(|v| v.parse().ok()).ok_or_else(bad)?;
    if hms.next().is_some() {
        return Err(bad());
    }

    let mut millis_str: String = fractional.chars().take(3).collect();
    while millis_str.len() < 3 {
        millis_str.push('0');
    }
    let millis: u64 = millis_str.parse().map_err(|_| bad())?;

    let whole = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(bad)?;
    Ok(whole as f64 + millis as f64 / 1000.0)
}

#[cfg(test)]
#[path = "../../tests/unit/transcript/source.rs"]
mod tests;
