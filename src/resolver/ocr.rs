// Text recognizer - lazily started, shared recognition engine
//
// Starting the engine is expensive, so one instance is created on first use
// and reused for every later call. Concurrent first calls race on a one-shot
// cell: exactly one of them runs the initializer, the rest wait for it.
// A semaphore bounds how many recognitions run at once (1 = serialized).

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{OnceCell, Semaphore};
use tracing::{debug, info};

use super::config::RecognizerConfig;
use super::errors::RecognitionError;
use super::traits::RecognitionEngine;
use super::utils::{binary_responds, find_binary, run_output_with_timeout};
use super::watermark::normalize_text;

type EngineInit =
    dyn Fn() -> BoxFuture<'static, Result<Arc<dyn RecognitionEngine>, RecognitionError>> + Send + Sync;

/// Cloneable handle to the shared recognition engine
#[derive(Clone)]
pub struct TextRecognizer {
    engine: Arc<OnceCell<Arc<dyn RecognitionEngine>>>,
    init: Arc<EngineInit>,
    permits: Arc<Semaphore>,
}

impl TextRecognizer {
    /// Handle whose engine is built by `init` on first use
    pub fn new<F>(max_concurrent: usize, init: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<Arc<dyn RecognitionEngine>, RecognitionError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            engine: Arc::new(OnceCell::new()),
            init: Arc::new(init),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Handle backed by the tesseract CLI
    pub fn tesseract(config: RecognizerConfig) -> Self {
        let max_concurrent = config.max_concurrent;
        Self::new(max_concurrent, move || {
            let config = config.clone();
            Box::pin(async move {
                let engine = TesseractEngine::start(config).await?;
                Ok(Arc::new(engine) as Arc<dyn RecognitionEngine>)
            })
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.initialized()
    }

    async fn engine(&self) -> Result<&Arc<dyn RecognitionEngine>, RecognitionError> {
        self.engine.get_or_try_init(|| (self.init)()).await
    }

    /// Raw recognized text for an image
    pub async fn recognize(&self, image: &Path) -> Result<String, RecognitionError> {
        let engine = self.engine().await?;
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| RecognitionError::Failed(e.to_string()))?;

        engine.recognize(image).await
    }

    /// Recognized text, lowercased with non-alphanumerics stripped
    pub async fn recognize_normalized(&self, image: &Path) -> Result<String, RecognitionError> {
        let text = self.recognize(image).await?;
        Ok(normalize_text(&text))
    }
}

impl std::fmt::Debug for TextRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRecognizer")
            .field("initialized", &self.is_initialized())
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

/// tesseract CLI engine
pub struct TesseractEngine {
    binary_path: String,
    config: RecognizerConfig,
}

impl TesseractEngine {
    /// Locate and probe the tesseract binary
    pub async fn start(config: RecognizerConfig) -> Result<Self, RecognitionError> {
        // `which` lookup blocks
        let explicit = config.tesseract_path.clone();
        let binary_path =
            tokio::task::spawn_blocking(move || find_binary("tesseract", explicit.as_deref()))
                .await
                .map_err(|e| RecognitionError::Init(e.to_string()))?;

        if !binary_responds(&binary_path, config.timeout_secs).await {
            return Err(RecognitionError::Init(format!(
                "tesseract not usable at {}",
                binary_path
            )));
        }

        info!(binary = %binary_path, language = %config.language, "Recognition engine started");
        Ok(Self {
            binary_path,
            config,
        })
    }

    fn build_args(&self, image: &Path) -> Vec<String> {
        let mut args = vec![
            image.to_string_lossy().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.config.language.clone(),
        ];

        if !self.config.char_whitelist.is_empty() {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={}", self.config.char_whitelist));
        }

        args
    }
}

#[async_trait]
impl RecognitionEngine for TesseractEngine {
    async fn recognize(&self, image: &Path) -> Result<String, RecognitionError> {
        if !tokio::fs::try_exists(image).await.unwrap_or(false) {
            return Err(RecognitionError::MissingImage(image.to_path_buf()));
        }

        let args = self.build_args(image);
        let output = run_output_with_timeout(&self.binary_path, &args, self.config.timeout_secs)
            .await
            .map_err(|e| RecognitionError::Failed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Failed(stderr.trim().to_string()));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!(image = %image.display(), chars = text.len(), "Recognized");
        Ok(text)
    }
}
