// Watermark validator
//
// Samples a couple of early frames from the candidate, recognizes their text
// and looks for the forbidden marking. Sampling problems never reject a
// candidate: no frames means Inconclusive, and the caller decides.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::signature::WatermarkSignature;
use crate::resolver::models::{MediaCandidate, ValidationOutcome};
use crate::resolver::ocr::TextRecognizer;
use crate::resolver::traits::FrameSampling;

pub struct WatermarkValidator {
    sampler: Arc<dyn FrameSampling>,
    recognizer: TextRecognizer,
    offsets: Vec<f64>,
}

impl WatermarkValidator {
    pub fn new(sampler: Arc<dyn FrameSampling>, recognizer: TextRecognizer, offsets: Vec<f64>) -> Self {
        Self {
            sampler,
            recognizer,
            offsets,
        }
    }

    /// Inspect `candidate` for `signature`.
    ///
    /// Frames are deleted before this returns on every branch.
    pub async fn validate(
        &self,
        candidate: &MediaCandidate,
        signature: Option<&WatermarkSignature>,
        attempts_remaining: u32,
    ) -> ValidationOutcome {
        let Some(signature) = signature else {
            return ValidationOutcome::Clean;
        };

        let frames = self
            .sampler
            .sample(&candidate.source_url, &self.offsets)
            .await;

        if frames.is_empty() {
            warn!(
                provider = %candidate.provider_tag,
                "No frames sampled, watermark check inconclusive"
            );
            return ValidationOutcome::Inconclusive("no frames could be sampled".to_string());
        }

        let mut recognized = 0usize;
        let mut last_error = None;
        let mut marked = false;

        for frame in frames.iter() {
            match self.recognizer.recognize_normalized(&frame.path).await {
                Ok(text) => {
                    recognized += 1;
                    debug!(t = frame.timestamp_seconds, text = %text, "Frame text");
                    if signature.matches_normalized(&text) {
                        info!(
                            provider = %candidate.provider_tag,
                            t = frame.timestamp_seconds,
                            watermark = %signature.raw,
                            attempts_remaining,
                            "Watermark detected"
                        );
                        marked = true;
                        break;
                    }
                }
                Err(e) => {
                    warn!(path = %frame.path.display(), error = %e, "Frame recognition failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        frames.cleanup().await;

        if marked {
            ValidationOutcome::Marked
        } else if recognized == 0 {
            ValidationOutcome::Inconclusive(
                last_error.unwrap_or_else(|| "no frame could be recognized".to_string()),
            )
        } else {
            ValidationOutcome::Clean
        }
    }
}

impl std::fmt::Debug for WatermarkValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkValidator")
            .field("recognizer", &self.recognizer)
            .field("offsets", &self.offsets)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::errors::RecognitionError;
    use crate::resolver::frames::FrameSet;
    use crate::resolver::models::FrameSample;
    use crate::resolver::traits::RecognitionEngine;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    /// Writes one file per offset into `dir`; the file body is the text "seen" on it
    struct ScriptedSampler {
        dir: PathBuf,
        text: String,
    }

    #[async_trait]
    impl FrameSampling for ScriptedSampler {
        async fn sample(&self, _media: &str, offsets: &[f64]) -> FrameSet {
            let frames = offsets
                .iter()
                .enumerate()
                .map(|(i, ts)| {
                    let path = self.dir.join(format!("thumb-{}-{}.png", uuid::Uuid::new_v4(), i));
                    std::fs::write(&path, self.text.as_bytes()).unwrap();
                    FrameSample {
                        path,
                        timestamp_seconds: *ts,
                    }
                })
                .collect();
            FrameSet::new(frames)
        }
    }

    /// Reads the frame file back as its recognized text
    struct FileTextEngine;

    #[async_trait]
    impl RecognitionEngine for FileTextEngine {
        async fn recognize(&self, image: &Path) -> Result<String, RecognitionError> {
            tokio::fs::read_to_string(image)
                .await
                .map_err(|_| RecognitionError::MissingImage(image.to_path_buf()))
        }
    }

    struct BrokenEngine;

    #[async_trait]
    impl RecognitionEngine for BrokenEngine {
        async fn recognize(&self, _image: &Path) -> Result<String, RecognitionError> {
            Err(RecognitionError::Failed("garbled".to_string()))
        }
    }

    struct NoFrames;

    #[async_trait]
    impl FrameSampling for NoFrames {
        async fn sample(&self, _media: &str, _offsets: &[f64]) -> FrameSet {
            FrameSet::empty()
        }
    }

    fn file_text_recognizer() -> TextRecognizer {
        TextRecognizer::new(1, || {
            Box::pin(async { Ok(Arc::new(FileTextEngine) as Arc<dyn RecognitionEngine>) })
        })
    }

    fn validator(sampler: Arc<dyn FrameSampling>, recognizer: TextRecognizer) -> WatermarkValidator {
        WatermarkValidator::new(sampler, recognizer, vec![1.0, 2.0])
    }

    fn candidate() -> MediaCandidate {
        MediaCandidate::new("https://mirror.example/v.mp4", "tiktok-v2")
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_marked_on_noisy_text() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(
            Arc::new(ScriptedSampler {
                dir: dir.path().to_path_buf(),
                text: "s s s t i k . i o watermark".to_string(),
            }),
            file_text_recognizer(),
        );
        let sig = WatermarkSignature::new("ssstik.io").unwrap();

        assert_eq!(v.validate(&candidate(), Some(&sig), 1).await, ValidationOutcome::Marked);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_clean_frames() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(
            Arc::new(ScriptedSampler {
                dir: dir.path().to_path_buf(),
                text: "@creator original sound".to_string(),
            }),
            file_text_recognizer(),
        );
        let sig = WatermarkSignature::new("ssstik.io").unwrap();

        assert_eq!(v.validate(&candidate(), Some(&sig), 1).await, ValidationOutcome::Clean);
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_no_frames_is_inconclusive() {
        let v = validator(Arc::new(NoFrames), file_text_recognizer());
        let sig = WatermarkSignature::new("ssstik.io").unwrap();

        assert!(matches!(
            v.validate(&candidate(), Some(&sig), 1).await,
            ValidationOutcome::Inconclusive(_)
        ));
    }

    #[tokio::test]
    async fn test_recognition_failures_are_inconclusive() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(
            Arc::new(ScriptedSampler {
                dir: dir.path().to_path_buf(),
                text: "ssstik.io".to_string(),
            }),
            TextRecognizer::new(1, || {
                Box::pin(async { Ok(Arc::new(BrokenEngine) as Arc<dyn RecognitionEngine>) })
            }),
        );
        let sig = WatermarkSignature::new("ssstik.io").unwrap();

        assert!(matches!(
            v.validate(&candidate(), Some(&sig), 1).await,
            ValidationOutcome::Inconclusive(_)
        ));
        assert!(dir_is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_without_signature_skips_sampling() {
        let dir = tempfile::tempdir().unwrap();
        let v = validator(
            Arc::new(ScriptedSampler {
                dir: dir.path().to_path_buf(),
                text: "ssstik.io".to_string(),
            }),
            file_text_recognizer(),
        );

        assert_eq!(v.validate(&candidate(), None, 1).await, ValidationOutcome::Clean);
        assert!(!v.recognizer.is_initialized());
    }
}
