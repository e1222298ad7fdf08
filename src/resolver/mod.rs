// Resolution pipeline - platform routing, strategy cascade, watermark validation

pub mod attempt;
pub mod config;
pub mod engine;
pub mod errors;
pub mod frames;
pub mod models;
pub mod ocr;
pub mod platform;
pub mod providers;
pub mod registry;
pub mod router;
pub mod traits;
pub mod utils;
pub mod watermark;

pub use config::{InconclusivePolicy, RecognizerConfig, ResolverConfig, SamplerConfig, YtDlpConfig};
pub use engine::ResolutionEngine;
pub use errors::{FailureCause, PipelineExhausted, ProviderError, StrategyFailure};
pub use models::{FrameSample, MediaCandidate, MediaMetadata, ResolutionResult, ValidationOutcome};
pub use platform::Platform;
pub use registry::ProviderRegistry;
pub use router::{PlatformRouter, Strategy};
pub use traits::{FrameSampling, RecognitionEngine, StrategyProvider};
