//! # Retrying Reads
//!
//! Reads a path that may not yet reflect a very recent write. A read moves
//! through three states:
//!
//! - `Attempting`: one request is in flight.
//! - `BackingOff`: a retryable signal was seen and budget remains; wait a
//!   jittered interval (or until cancelled) and attempt again.
//! - `Done`: a payload, a classified exhaustion error, or a non-retryable
//!   error passed through unchanged.
//!
//! Only two signals are retryable. A 404 means the object has not been
//! replicated to the serving node yet; a 412 means the read raced a concurrent
//! mutation. Exhausting the budget on the first yields [`Error::NotFound`], on
//! the second [`Error::RetriesExhausted`].

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::policy::RetryPolicy;
use crate::client::{LogicalRead, VaultResponse};
use crate::errors::{Error, Result};
use crate::observability::MetricsRecorder;

/// Retryable failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrySignal {
    /// The path is not visible on the serving node yet
    NotFound,
    /// The read raced a concurrent mutation
    Conflict,
}

impl RetrySignal {
    /// Classify an error. `None` means the error must not be retried.
    pub fn classify(error: &Error) -> Option<Self> {
        match error {
            Error::Api { status: 404, .. } => Some(Self::NotFound),
            Error::Api { status: 412, .. } => Some(Self::Conflict),
            _ => None,
        }
    }

    fn exhausted(self, path: &str, attempts: u32) -> Error {
        match self {
            Self::NotFound => Error::NotFound { path: path.to_string(), attempts },
            Self::Conflict => Error::RetriesExhausted { path: path.to_string(), attempts },
        }
    }

    fn outcome(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
        }
    }
}

/// A successful read and how many tries it took.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome<T> {
    pub payload: T,
    /// Tries made, counting the first
    pub attempts: u32,
}

impl<T> ReadOutcome<T> {
    /// Retries made after the first try.
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    pub fn into_payload(self) -> T {
        self.payload
    }
}

enum ReadState {
    Attempting { attempt: u32 },
    BackingOff { attempt: u32, signal: RetrySignal },
    Done(Result<(VaultResponse, u32)>),
}

/// Bounded retry wrapper around any [`LogicalRead`].
#[derive(Debug, Clone, Default)]
pub struct RetryingReader {
    policy: RetryPolicy,
    metrics: MetricsRecorder,
}

impl RetryingReader {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, metrics: MetricsRecorder::new() }
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Read `path` through `source` with this reader's policy and decode its
    /// `data` field into `T`.
    pub async fn read<S, T>(&self, source: &S, path: &str) -> Result<ReadOutcome<T>>
    where
        S: LogicalRead + ?Sized,
        T: DeserializeOwned,
    {
        self.read_with_policy(source, path, &self.policy).await
    }

    /// Like [`read`](Self::read) with a policy for this call only.
    pub async fn read_with_policy<S, T>(
        &self,
        source: &S,
        path: &str,
        policy: &RetryPolicy,
    ) -> Result<ReadOutcome<T>>
    where
        S: LogicalRead + ?Sized,
        T: DeserializeOwned,
    {
        self.read_cancellable(source, path, policy, &CancellationToken::new()).await
    }

    /// Like [`read_with_policy`](Self::read_with_policy), but `cancel` aborts
    /// the wait between attempts with [`Error::Cancelled`].
    ///
    /// The first attempt is always made. An in-flight request is not
    /// interrupted.
    pub async fn read_cancellable<S, T>(
        &self,
        source: &S,
        path: &str,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<ReadOutcome<T>>
    where
        S: LogicalRead + ?Sized,
        T: DeserializeOwned,
    {
        let (response, attempts) = self.run(source, path, policy, cancel).await?;
        let payload = response.decode(path)?;
        Ok(ReadOutcome { payload, attempts })
    }

    async fn run<S>(
        &self,
        source: &S,
        path: &str,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<(VaultResponse, u32)>
    where
        S: LogicalRead + ?Sized,
    {
        let budget = policy.attempt_budget();
        let mut state = ReadState::Attempting { attempt: 1 };

        loop {
            state = match state {
                ReadState::Attempting { attempt } => {
                    self.metrics.record_read_attempt();
                    self.attempt(source, path, attempt, budget).await
                }
                ReadState::BackingOff { attempt, signal } => {
                    let wait = policy.next_wait();
                    warn!(
                        path = %path,
                        signal = ?signal,
                        attempt,
                        max_attempts = budget,
                        wait_ms = wait.as_millis() as u64,
                        "Read raced replication, retrying"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            warn!(path = %path, attempts = attempt, "Retrying read cancelled");
                            self.metrics.record_read_outcome("cancelled");
                            ReadState::Done(Err(Error::Cancelled { path: path.to_string(), attempts: attempt }))
                        }
                        _ = tokio::time::sleep(wait) => ReadState::Attempting { attempt: attempt + 1 },
                    }
                }
                ReadState::Done(result) => return result,
            };
        }
    }

    async fn attempt<S>(&self, source: &S, path: &str, attempt: u32, budget: u32) -> ReadState
    where
        S: LogicalRead + ?Sized,
    {
        let error = match source.read(path).await {
            Ok(response) => {
                debug!(path = %path, attempts = attempt, "Read succeeded");
                self.metrics.record_read_outcome("success");
                return ReadState::Done(Ok((response, attempt)));
            }
            Err(error) => error,
        };

        match RetrySignal::classify(&error) {
            None => {
                self.metrics.record_read_outcome("failed");
                ReadState::Done(Err(error))
            }
            Some(signal) if attempt >= budget => {
                warn!(path = %path, signal = ?signal, attempts = attempt, "Read retry budget exhausted");
                self.metrics.record_read_outcome(signal.outcome());
                ReadState::Done(Err(signal.exhausted(path, attempt)))
            }
            Some(signal) => ReadState::BackingOff { attempt, signal },
        }
    }
}
