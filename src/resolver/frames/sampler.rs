// ffmpeg-backed frame sampler

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use super::fetch::{fetch_prefix, prefix_budget};
use super::FrameSet;
use crate::resolver::config::SamplerConfig;
use crate::resolver::errors::SamplerError;
use crate::resolver::models::FrameSample;
use crate::resolver::traits::FrameSampling;
use crate::resolver::utils::{find_binary, is_remote, run_output_with_timeout};

pub struct FfmpegFrameSampler {
    ffmpeg_path: String,
    client: reqwest::Client,
    config: SamplerConfig,
}

impl FfmpegFrameSampler {
    pub fn new(config: SamplerConfig) -> Self {
        let ffmpeg_path = find_binary("ffmpeg", config.ffmpeg_path.as_deref());

        let client = match reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to build HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            }
        };

        Self {
            ffmpeg_path,
            client,
            config,
        }
    }

    /// Arguments for one ffmpeg run producing one still per frame slot
    fn build_args(input: &Path, frames: &[FrameSample]) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
        ];

        for frame in frames {
            args.push("-ss".to_string());
            args.push(format!("{:.3}", frame.timestamp_seconds));
            // video only
            args.push("-an".to_string());
            args.push("-sn".to_string());
            args.push("-dn".to_string());
            args.push("-frames:v".to_string());
            args.push("1".to_string());
            args.push(frame.path.to_string_lossy().to_string());
        }

        args
    }

    async fn try_sample(&self, media: &str, offsets: &[f64]) -> Result<FrameSet, SamplerError> {
        let temp_dir = self.config.temp_dir();

        // The partial download lives exactly as long as this call.
        let (input, _partial) = if is_remote(media) {
            let partial = tempfile::Builder::new()
                .prefix("partial-")
                .suffix(".mp4")
                .tempfile_in(&temp_dir)?;
            let budget = prefix_budget(
                offsets,
                self.config.bytes_per_second,
                self.config.margin_seconds,
                self.config.max_prefix_bytes,
            );
            let secs = self.config.download_timeout_secs;

            timeout(
                Duration::from_secs(secs),
                fetch_prefix(&self.client, media, budget, partial.path()),
            )
            .await
            .map_err(|_| SamplerError::DownloadTimeout(secs))??;

            (partial.path().to_path_buf(), Some(partial))
        } else {
            let path = PathBuf::from(media);
            if !path.exists() {
                return Err(SamplerError::MissingInput(path));
            }
            (path, None)
        };

        let run_id = uuid::Uuid::new_v4();
        let frames = FrameSet::new(
            offsets
                .iter()
                .enumerate()
                .map(|(i, ts)| FrameSample {
                    path: temp_dir.join(format!("thumb-{}-{}.png", run_id, i)),
                    timestamp_seconds: *ts,
                })
                .collect(),
        );

        let args = Self::build_args(&input, &frames);
        let output =
            run_output_with_timeout(&self.ffmpeg_path, &args, self.config.extract_timeout_secs)
                .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SamplerError::Extraction(stderr));
        }

        Ok(frames.retain_existing())
    }
}

#[async_trait]
impl FrameSampling for FfmpegFrameSampler {
    async fn sample(&self, media: &str, offsets: &[f64]) -> FrameSet {
        if offsets.is_empty() {
            return FrameSet::empty();
        }

        match self.try_sample(media, offsets).await {
            Ok(frames) => {
                info!(frames = frames.len(), requested = offsets.len(), "Frames extracted");
                frames
            }
            Err(e) => {
                warn!(media, error = %e, "Frame sampling failed");
                FrameSet::empty()
            }
        }
    }
}
