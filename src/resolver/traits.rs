// Pipeline seams: providers, frame sampling, text recognition

use async_trait::async_trait;
use std::path::Path;

use super::errors::{ProviderError, RecognitionError};
use super::frames::FrameSet;
use super::models::MediaCandidate;

/// One way of extracting media for a URL
#[async_trait]
pub trait StrategyProvider: Send + Sync {
    /// Provider identifier, matched against the routing table
    fn name(&self) -> &'static str;

    /// Check if this provider can run at all (binary present, etc.)
    async fn is_available(&self) -> bool {
        true
    }

    /// Extract a media candidate from URL
    async fn fetch(&self, url: &str) -> Result<MediaCandidate, ProviderError>;
}

/// Produces still frames at the requested offsets.
///
/// Never fails: any problem yields an empty set. The returned frames are
/// removed when the set is dropped.
#[async_trait]
pub trait FrameSampling: Send + Sync {
    async fn sample(&self, media: &str, offsets: &[f64]) -> FrameSet;
}

/// Backend that turns an image into text
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    async fn recognize(&self, image: &Path) -> Result<String, RecognitionError>;
}
