// Frame sampling - bounded prefix download + ffmpeg still extraction
//
// Remote media is never downloaded in full: only a byte prefix large enough
// to cover the requested offsets is fetched into a temporary file, which is
// removed as soon as extraction finishes.

mod fetch;
mod sampler;

pub use fetch::{fetch_prefix, prefix_budget};
pub use sampler::FfmpegFrameSampler;

use std::ops::Deref;
use std::path::PathBuf;

use super::models::FrameSample;
use super::utils::remove_quietly;

/// Frames owned for the duration of one validation call.
///
/// Files are deleted by `cleanup()` or, failing that, on drop.
#[derive(Debug, Default)]
pub struct FrameSet {
    frames: Vec<FrameSample>,
}

impl FrameSet {
    pub fn new(frames: Vec<FrameSample>) -> Self {
        Self { frames }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.frames.iter().map(|f| f.path.clone()).collect()
    }

    /// Drop slots whose file was never written
    pub fn retain_existing(mut self) -> Self {
        self.frames.retain(|f| f.path.exists());
        self
    }

    /// Delete every frame file now
    pub async fn cleanup(mut self) {
        for frame in self.frames.drain(..) {
            if let Err(e) = tokio::fs::remove_file(&frame.path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %frame.path.display(), error = %e, "Failed to delete frame");
                }
            }
        }
    }
}

impl Deref for FrameSet {
    type Target = [FrameSample];

    fn deref(&self) -> &Self::Target {
        &self.frames
    }
}

impl Drop for FrameSet {
    fn drop(&mut self) {
        for frame in &self.frames {
            remove_quietly(&frame.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_in(dir: &std::path::Path, name: &str, ts: f64) -> FrameSample {
        let path = dir.join(name);
        std::fs::write(&path, b"png").unwrap();
        FrameSample {
            path,
            timestamp_seconds: ts,
        }
    }

    #[test]
    fn test_drop_deletes_frames() {
        let dir = tempfile::tempdir().unwrap();
        let set = FrameSet::new(vec![
            frame_in(dir.path(), "a.png", 1.0),
            frame_in(dir.path(), "b.png", 2.0),
        ]);
        let paths = set.paths();
        assert_eq!(set.len(), 2);

        drop(set);
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[tokio::test]
    async fn test_cleanup_deletes_frames() {
        let dir = tempfile::tempdir().unwrap();
        let set = FrameSet::new(vec![frame_in(dir.path(), "a.png", 1.0)]);
        let paths = set.paths();

        set.cleanup().await;
        assert!(!paths[0].exists());
    }
}
