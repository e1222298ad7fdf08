pub mod logging;
pub mod resolver;

pub use resolver::{
    InconclusivePolicy, MediaCandidate, Platform, PipelineExhausted, ResolutionEngine,
    ResolutionResult, ResolverConfig,
};
