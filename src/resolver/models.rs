// Common data models for the resolution pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::errors::{PipelineExhausted, StrategyFailure};

/// Uploader details as reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<String>,
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub url: Option<String>,
}

/// Engagement counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub play_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub share_count: Option<u64>,
}

/// Video or audio kind of a format entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Video,
    Audio,
}

/// Format details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFormat {
    pub url: Option<String>,
    pub kind: FormatKind,
    pub resolution: Option<String>,
    pub ext: Option<String>,
}

/// Descriptive data carried alongside a candidate; opaque to the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<Author>,
    pub thumbnail: Option<String>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub statistics: Option<Statistics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<MediaFormat>,
}

impl MediaMetadata {
    /// Duration as `M:SS` or `H:MM:SS`
    pub fn duration_label(&self) -> Option<String> {
        self.duration.map(|secs| format_duration(secs as u64))
    }
}

/// A resolvable media location produced by a strategy provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaCandidate {
    pub source_url: String,
    pub metadata: MediaMetadata,
    /// Identifier of the provider that produced this candidate
    pub provider_tag: String,
}

impl MediaCandidate {
    pub fn new(source_url: impl Into<String>, provider_tag: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            metadata: MediaMetadata::default(),
            provider_tag: provider_tag.into(),
        }
    }

    pub fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A still frame extracted for text detection
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSample {
    pub path: PathBuf,
    pub timestamp_seconds: f64,
}

/// Watermark verdict for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Clean,
    Marked,
    /// No frames could be inspected
    Inconclusive(String),
}

/// Exactly one of these per resolution call
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionResult {
    Accepted(MediaCandidate),
    /// Every strategy's last cause, in priority order
    Exhausted(Vec<StrategyFailure>),
}

impl ResolutionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn into_result(self) -> Result<MediaCandidate, PipelineExhausted> {
        match self {
            Self::Accepted(candidate) => Ok(candidate),
            Self::Exhausted(failures) => Err(PipelineExhausted { failures }),
        }
    }
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::FailureCause;

    #[test]
    fn test_duration_label() {
        let mut metadata = MediaMetadata::default();
        assert_eq!(metadata.duration_label(), None);

        metadata.duration = Some(75.4);
        assert_eq!(metadata.duration_label().as_deref(), Some("1:15"));

        metadata.duration = Some(3725.0);
        assert_eq!(metadata.duration_label().as_deref(), Some("1:02:05"));
    }

    #[test]
    fn test_into_result() {
        let accepted = ResolutionResult::Accepted(MediaCandidate::new("https://cdn/v.mp4", "yt-dlp"));
        assert_eq!(accepted.into_result().unwrap().source_url, "https://cdn/v.mp4");

        let exhausted = ResolutionResult::Exhausted(vec![StrategyFailure {
            provider: "yt-dlp".to_string(),
            cause: FailureCause::ValidationRejected { attempts: 1 },
        }]);
        let err = exhausted.into_result().unwrap_err();
        assert_eq!(err.failures.len(), 1);
    }
}
