//! Timed caption segments and the providers that supply them.
//!
//! Transcripts are validated once at ingestion: segments with blank text or
//! unusable timestamps are dropped and the rest are ordered by start time, so
//! every consumer can rely on ascending `start_sec`.

use crate::error::PaceError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One caption cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    #[serde(rename = "start", alias = "startSec", alias = "start_sec")]
    pub start_sec: f64,
    #[serde(
        rename = "duration",
        alias = "dur",
        alias = "durationSec",
        alias = "duration_sec"
    )]
    pub duration_sec: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_sec: f64, duration_sec: f64) -> Self {
        Self {
            text: text.into(),
            start_sec,
            duration_sec,
        }
    }

    pub fn end_sec(&self) -> f64 {
        self.start_sec + self.duration_sec
    }

    fn is_usable(&self) -> bool {
        !self.text.trim().is_empty()
            && self.start_sec.is_finite()
            && self.start_sec >= 0.0
            && self.duration_sec.is_finite()
            && self.duration_sec >= 0.0
    }
}

/// An immutable, start-ordered sequence of segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    segments: Vec<TranscriptSegment>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TranscriptFile {
    Bare(Vec<TranscriptSegment>),
    Wrapped { segments: Vec<TranscriptSegment> },
}

impl Transcript {
    pub fn from_segments(segments: Vec<TranscriptSegment>) -> Self {
        let total = segments.len();
        let mut segments: Vec<TranscriptSegment> = segments
            .into_iter()
            .filter(TranscriptSegment::is_usable)
            .map(|mut seg| {
                seg.text = seg.text.trim().to_string();
                seg
            })
            .collect();
        if segments.len() < total {
            debug!(
                dropped = total - segments.len(),
                kept = segments.len(),
                "Dropped unusable transcript segments"
            );
        }
        // Stable so cues sharing a start time keep their source order.
        segments.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
        Self { segments }
    }

    /// Parse either a bare JSON array of segments or `{"segments": [...]}`.
    pub fn from_json(text: &str) -> Result<Self, PaceError> {
        let file: TranscriptFile =
            serde_json::from_str(text).map_err(|err| PaceError::MalformedTranscript {
                reason: err.to_string(),
            })?;
        let segments = match file {
            TranscriptFile::Bare(segments) => segments,
            TranscriptFile::Wrapped { segments } => segments,
        };
        Ok(Self::from_segments(segments))
    }

    pub fn segments(&self) -> &[TranscriptSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Latest end time across all cues.
    pub fn duration_secs(&self) -> f64 {
        self.segments
            .iter()
            .map(TranscriptSegment::end_sec)
            .fold(0.0, f64::max)
    }
}

/// Source of transcripts keyed by video id. Implementations may block.
pub trait TranscriptProvider: Send + Sync {
    fn fetch(&self, video_id: &str) -> Result<Transcript, PaceError>;
}

/// Reads `<root>/<video_id>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryTranscriptProvider {
    root: PathBuf,
}

impl DirectoryTranscriptProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TranscriptProvider for DirectoryTranscriptProvider {
    fn fetch(&self, video_id: &str) -> Result<Transcript, PaceError> {
        if video_id.is_empty() || video_id.contains(['/', '\\']) || video_id.starts_with('.') {
            return Err(PaceError::ProviderError {
                message: format!("invalid video id {video_id:?}"),
            });
        }
        let path = self.root.join(format!("{video_id}.json"));
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No transcript file for video");
                return Err(PaceError::NoTranscript {
                    video_id: video_id.to_string(),
                    detail: None,
                });
            }
            Err(err) => {
                warn!(path = %path.display(), "Failed to read transcript: {err}");
                return Err(PaceError::ProviderError {
                    message: err.to_string(),
                });
            }
        };
        let transcript = Transcript::from_json(&contents)?;
        debug!(
            video_id,
            segments = transcript.len(),
            "Loaded transcript from directory"
        );
        Ok(transcript)
    }
}
