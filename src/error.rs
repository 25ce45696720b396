//! Failure taxonomy for transcript acquisition and playback control.
//!
//! None of these are fatal: the orchestrator absorbs every variant into a
//! degraded session state and keeps monitoring.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PaceError {
    #[error("No transcript available for {video_id}{}", detail_suffix(.detail))]
    NoTranscript {
        video_id: String,
        detail: Option<String>,
    },

    #[error("No playback target available")]
    NoPlaybackTarget,

    #[error("Malformed transcript: {reason}")]
    MalformedTranscript { reason: String },

    #[error("Transcript provider failed: {message}")]
    ProviderError { message: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

impl PaceError {
    /// Collapse acquisition failures into the single "no transcript" kind the
    /// session records, keeping the original message for display.
    pub fn into_session_error(self, video_id: &str) -> PaceError {
        match self {
            PaceError::NoTranscript { .. } | PaceError::NoPlaybackTarget => self,
            PaceError::MalformedTranscript { reason } => PaceError::NoTranscript {
                video_id: video_id.to_string(),
                detail: Some(format!("malformed transcript: {reason}")),
            },
            PaceError::ProviderError { message } => PaceError::NoTranscript {
                video_id: video_id.to_string(),
                detail: Some(message),
            },
        }
    }
}
