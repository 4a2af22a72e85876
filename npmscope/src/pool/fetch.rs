//! Fetch worker: one registry resolution run as an isolated pool task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::manifest::PackageManifest;
use crate::registry::{ManifestSource, RegistryError};

/// Default base delay between retries.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Cap on a single backoff delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Timeout and retry policy applied to every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Per-attempt time budget. `None` disables the timeout.
    pub timeout: Option<Duration>,
    /// Extra attempts after the first, for transient failures only.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each following one.
    pub retry_base_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            max_retries: 0,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

impl FetchPolicy {
    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.retry_base_delay
            .saturating_mul(factor)
            .min(MAX_RETRY_DELAY)
    }
}

/// A single `(name, specifier)` resolution with owned inputs.
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub name: String,
    pub spec: String,
    pub policy: FetchPolicy,
}

impl FetchTask {
    pub fn new(name: impl Into<String>, spec: impl Into<String>, policy: FetchPolicy) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            policy,
        }
    }

    /// Runs the fetch, retrying transient failures per the policy.
    pub async fn run<S: ManifestSource>(
        self,
        source: Arc<S>,
    ) -> Result<PackageManifest, RegistryError> {
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            match self.attempt(source.as_ref()).await {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        package = %self.name,
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient fetch failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => {
                    debug!(
                        package = %self.name,
                        spec = %self.spec,
                        ok = result.is_ok(),
                        attempts = attempt + 1,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Fetch finished"
                    );
                    return result;
                }
            }
        }
    }

    async fn attempt<S: ManifestSource>(
        &self,
        source: &S,
    ) -> Result<PackageManifest, RegistryError> {
        match self.policy.timeout {
            None => source.resolve(&self.name, &self.spec).await,
            Some(limit) => tokio::time::timeout(limit, source.resolve(&self.name, &self.spec))
                .await
                .unwrap_or_else(|_| {
                    Err(RegistryError::TimedOut {
                        name: self.name.clone(),
                        elapsed_ms: limit.as_millis() as u64,
                    })
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Source that replays scripted results and counts calls.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<PackageManifest, RegistryError>>>,
        calls: Mutex<usize>,
        latency: Option<Duration>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<PackageManifest, RegistryError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
                latency: None,
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    impl ManifestSource for ScriptedSource {
        async fn resolve(&self, name: &str, _spec: &str) -> Result<PackageManifest, RegistryError> {
            *self.calls.lock() += 1;
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            let next = self.script.lock().pop_front();
            next.unwrap_or_else(|| Ok(PackageManifest::new(name, "1.0.0")))
        }
    }

    fn network_error() -> RegistryError {
        RegistryError::Network {
            status: Some(503),
            message: "unavailable".to_string(),
        }
    }

    fn policy(max_retries: u32) -> FetchPolicy {
        FetchPolicy {
            timeout: None,
            max_retries,
            retry_base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_default_policy_fails_fast() {
        let policy = FetchPolicy::default();
        assert_eq!(policy.max_retries, 0);
        assert!(policy.timeout.is_none());
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = FetchPolicy {
            retry_base_delay: Duration::from_millis(100),
            ..FetchPolicy::default()
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
        assert_eq!(policy.backoff(40), MAX_RETRY_DELAY);
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let source = Arc::new(ScriptedSource::new(vec![]));
        let task = FetchTask::new("a", "^1.0.0", policy(3));

        let manifest = task.run(Arc::clone(&source)).await.unwrap();
        assert_eq!(manifest.name, "a");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let source = Arc::new(ScriptedSource::new(vec![Err(network_error())]));
        let task = FetchTask::new("a", "1.0.0", policy(0));

        assert!(task.run(Arc::clone(&source)).await.is_err());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retried() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(network_error()),
            Err(network_error()),
        ]));
        let task = FetchTask::new("a", "1.0.0", policy(2));

        assert!(task.run(Arc::clone(&source)).await.is_ok());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failures_not_retried() {
        let source = Arc::new(ScriptedSource::new(vec![Err(RegistryError::NotFound {
            name: "a".to_string(),
        })]));
        let task = FetchTask::new("a", "1.0.0", policy(5));

        let err = task.run(Arc::clone(&source)).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let mut source = ScriptedSource::new(vec![]);
        source.latency = Some(Duration::from_secs(60));
        let task = FetchTask::new(
            "slow",
            "1.0.0",
            FetchPolicy {
                timeout: Some(Duration::from_secs(5)),
                ..FetchPolicy::default()
            },
        );

        let err = task.run(Arc::new(source)).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::TimedOut {
                name: "slow".to_string(),
                elapsed_ms: 5000
            }
        );
    }
}
