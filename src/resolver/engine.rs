// Resolution engine - ordered strategy cascade with watermark validation
//
// For each strategy of the platform, in priority order:
// 1. Provider failure -> record cause, next strategy (no retry here)
// 2. Success without validation -> accept
// 3. Validated strategies: Clean/Inconclusive accept, Marked re-invokes the
//    same provider until its attempt budget runs out, then next strategy
//
// The first acceptance short-circuits everything after it.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::attempt::StrategyState;
use super::config::{InconclusivePolicy, ResolverConfig};
use super::errors::{FailureCause, PipelineExhausted, StrategyFailure};
use super::frames::FfmpegFrameSampler;
use super::models::{MediaCandidate, ResolutionResult};
use super::ocr::TextRecognizer;
use super::platform::Platform;
use super::providers::YtDlpProvider;
use super::registry::ProviderRegistry;
use super::router::{PlatformRouter, Strategy};
use super::traits::StrategyProvider;
use super::watermark::{WatermarkSignature, WatermarkValidator};

pub struct ResolutionEngine {
    router: PlatformRouter,
    providers: ProviderRegistry,
    validator: WatermarkValidator,
    /// Computed once from the configured marking
    signature: Option<WatermarkSignature>,
    policy: InconclusivePolicy,
}

impl ResolutionEngine {
    /// Engine without a watermark; validated strategies accept every candidate
    pub fn new(router: PlatformRouter, providers: ProviderRegistry, validator: WatermarkValidator) -> Self {
        Self {
            router,
            providers,
            validator,
            signature: None,
            policy: InconclusivePolicy::default(),
        }
    }

    /// Engine with the built-in yt-dlp provider, ffmpeg sampler and tesseract recognizer.
    ///
    /// Platform-native providers are added with [`ResolutionEngine::with_provider`];
    /// strategies whose provider is missing are skipped as unavailable.
    pub fn from_config(config: ResolverConfig) -> Self {
        let providers =
            ProviderRegistry::new().with_provider(Arc::new(YtDlpProvider::new(config.ytdlp.clone())));
        let sampler = Arc::new(FfmpegFrameSampler::new(config.sampler.clone()));
        let recognizer = TextRecognizer::tesseract(config.recognizer.clone());
        let validator = WatermarkValidator::new(sampler, recognizer, config.sample_offsets.clone());

        Self::new(PlatformRouter::default(), providers, validator)
            .with_watermark(config.watermark.as_deref())
            .with_inconclusive_policy(config.inconclusive_policy)
    }

    /// Set the forbidden marking; `None` or a blank marking disables validation
    pub fn with_watermark(mut self, watermark: Option<&str>) -> Self {
        self.signature = watermark.and_then(WatermarkSignature::new);
        self
    }

    pub fn with_inconclusive_policy(mut self, policy: InconclusivePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn StrategyProvider>) -> Self {
        self.providers.add_provider(provider);
        self
    }

    pub fn with_router(mut self, router: PlatformRouter) -> Self {
        self.router = router;
        self
    }

    pub fn signature(&self) -> Option<&WatermarkSignature> {
        self.signature.as_ref()
    }

    /// Resolve `url` to an accepted candidate or the ordered list of failures
    #[instrument(skip(self, hint), fields(platform))]
    pub async fn resolve(&self, url: &str, hint: Option<Platform>) -> ResolutionResult {
        let platform = Platform::resolve(url, hint);
        tracing::Span::current().record("platform", platform.as_str());

        let strategies = self.router.route(platform);
        let mut failures = Vec::with_capacity(strategies.len());

        for strategy in &strategies {
            match self.run_strategy(url, strategy).await {
                Ok(candidate) => {
                    info!(
                        provider = strategy.provider,
                        source_url = %candidate.source_url,
                        "Candidate accepted"
                    );
                    return ResolutionResult::Accepted(candidate);
                }
                Err(cause) => {
                    warn!(provider = strategy.provider, cause = %cause, "Strategy failed");
                    failures.push(StrategyFailure {
                        provider: strategy.provider.to_string(),
                        cause,
                    });
                }
            }
        }

        error!(strategies = failures.len(), "All strategies failed");
        ResolutionResult::Exhausted(failures)
    }

    /// Caller-facing form: the accepted candidate or a single aggregated error
    pub async fn resolve_media(
        &self,
        url: &str,
        hint: Option<Platform>,
    ) -> Result<MediaCandidate, PipelineExhausted> {
        self.resolve(url, hint).await.into_result()
    }

    async fn run_strategy(&self, url: &str, strategy: &Strategy) -> Result<MediaCandidate, FailureCause> {
        let provider = self.providers.get(strategy.provider).ok_or_else(|| {
            FailureCause::ProviderUnavailable(format!("{} is not registered", strategy.provider))
        })?;
        if !provider.is_available().await {
            return Err(FailureCause::ProviderUnavailable(format!(
                "{} is not available",
                strategy.provider
            )));
        }

        let max_attempts = strategy.max_attempts.max(1);
        let mut state = StrategyState::start();

        loop {
            let remaining = state.attempts_remaining(max_attempts);
            state = match state {
                StrategyState::Pending { attempt } => {
                    debug!(provider = strategy.provider, attempt, max_attempts, "Invoking provider");
                    let result = provider.fetch(url).await;
                    StrategyState::Pending { attempt }.on_fetched(result, strategy.validate)
                }
                StrategyState::Validating { attempt, candidate } => {
                    let outcome = self
                        .validator
                        .validate(&candidate, self.signature.as_ref(), remaining)
                        .await;
                    debug!(provider = strategy.provider, attempt, ?outcome, "Validation finished");
                    StrategyState::Validating { attempt, candidate }.on_validated(
                        outcome,
                        max_attempts,
                        self.policy,
                    )
                }
                StrategyState::Accepted(candidate) => return Ok(candidate),
                terminal => {
                    return Err(terminal.failure_cause().unwrap_or_else(|| {
                        FailureCause::ProviderUnavailable(strategy.provider.to_string())
                    }))
                }
            };
        }
    }
}

impl std::fmt::Debug for ResolutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("router", &self.router)
            .field("providers", &self.providers)
            .field("validator", &self.validator)
            .field("signature", &self.signature)
            .field("policy", &self.policy)
            .finish()
    }
}
