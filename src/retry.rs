use tracing::warn;

use crate::completion::{Completion, CompletionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    FailFast,
}

/// Only transient upstream conditions are worth another attempt.
pub fn classify(err: &CompletionError) -> RetryDecision {
    match err {
        CompletionError::Timeout | CompletionError::RateLimited { .. } => RetryDecision::Retry,
        CompletionError::MissingApiKey
        | CompletionError::Status { .. }
        | CompletionError::Transport(_)
        | CompletionError::Decode(_) => RetryDecision::FailFast,
    }
}

/// Bounded number of total attempts per generation call, with no delay
/// between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs one generation call, repeating it while the failure classifies
    /// as retryable. The last error is returned once attempts run out.
    pub async fn complete(
        &self,
        completion: &dyn Completion,
        system: &str,
        prompt: &str,
    ) -> Result<String, CompletionError> {
        let mut attempt = 1;
        loop {
            match completion.complete(system, prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if classify(&err) == RetryDecision::FailFast || attempt >= self.max_attempts {
                        return Err(err);
                    }
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "generation attempt failed, retrying"
                    );
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}
