// Per-strategy attempt state machine
//
// Pending --fetch ok--> Validating --Clean--> Accepted
//    ^                      |
//    +------- Marked -------+ (attempts left)
//                           +--Marked, none left--> AttemptsExhausted
// Pending --fetch err--> Failed

use super::config::InconclusivePolicy;
use super::errors::{FailureCause, ProviderError};
use super::models::{MediaCandidate, ValidationOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyState {
    /// Provider is about to be invoked for `attempt` (1-based)
    Pending { attempt: u32 },
    /// Candidate from `attempt` awaits a watermark verdict
    Validating {
        attempt: u32,
        candidate: MediaCandidate,
    },
    Accepted(MediaCandidate),
    /// Watermark found on every attempt of the budget
    AttemptsExhausted { attempts: u32 },
    Failed(FailureCause),
}

impl StrategyState {
    pub fn start() -> Self {
        Self::Pending { attempt: 1 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Accepted(_) | Self::AttemptsExhausted { .. } | Self::Failed(_)
        )
    }

    /// Provider returned for the pending attempt
    pub fn on_fetched(self, result: Result<MediaCandidate, ProviderError>, validate: bool) -> Self {
        let attempt = match self {
            Self::Pending { attempt } => attempt,
            other => return other,
        };

        match result {
            Err(e) => Self::Failed(FailureCause::Provider(e)),
            Ok(candidate) if !validate => Self::Accepted(candidate),
            Ok(candidate) => Self::Validating { attempt, candidate },
        }
    }

    /// Watermark verdict for the validating attempt
    pub fn on_validated(
        self,
        outcome: ValidationOutcome,
        max_attempts: u32,
        policy: InconclusivePolicy,
    ) -> Self {
        let (attempt, candidate) = match self {
            Self::Validating { attempt, candidate } => (attempt, candidate),
            other => return other,
        };

        match outcome {
            ValidationOutcome::Clean => Self::Accepted(candidate),
            ValidationOutcome::Inconclusive(reason) => match policy {
                InconclusivePolicy::Accept => Self::Accepted(candidate),
                InconclusivePolicy::Escalate => {
                    Self::Failed(FailureCause::SamplingInconclusive(reason))
                }
            },
            ValidationOutcome::Marked if attempt < max_attempts => Self::Pending {
                attempt: attempt + 1,
            },
            ValidationOutcome::Marked => Self::AttemptsExhausted { attempts: attempt },
        }
    }

    /// Attempts left after the current one, for a budget of `max_attempts`
    pub fn attempts_remaining(&self, max_attempts: u32) -> u32 {
        match self {
            Self::Pending { attempt } | Self::Validating { attempt, .. } => {
                max_attempts.saturating_sub(*attempt)
            }
            _ => 0,
        }
    }

    /// Failure cause for a terminal non-accepted state
    pub fn failure_cause(&self) -> Option<FailureCause> {
        match self {
            Self::AttemptsExhausted { attempts } => Some(FailureCause::ValidationRejected {
                attempts: *attempts,
            }),
            Self::Failed(cause) => Some(cause.clone()),
            _ => None,
        }
    }
}
