use crate::domain::signals::RawSignal;
use crate::ingest::provider::JsonFetcher;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ATTEMPTS: u32 = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8_000);
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1_500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Per attempt.
    pub timeout: Duration,
    /// Fixed sleep between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            timeout: DEFAULT_TIMEOUT,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// Fetches `url` and parses it, retrying per `policy`.
///
/// Never fails: a timeout, transport error or a body `parse` rejects all
/// count as failed attempts, and once attempts run out `fallback` is
/// returned tagged as such.
pub async fn fetch_with_fallback<T, F>(
    fetcher: &dyn JsonFetcher,
    policy: &RetryPolicy,
    label: &'static str,
    url: &str,
    fallback: T,
    parse: F,
) -> RawSignal<T>
where
    F: Fn(&Value) -> Option<T>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let res = match tokio::time::timeout(policy.timeout, fetcher.get_json(url)).await {
            Ok(Ok(body)) => {
                parse(&body).ok_or_else(|| anyhow::anyhow!("{label} response has unexpected shape"))
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(anyhow::anyhow!(
                "{label} request timed out after {:?}",
                policy.timeout
            )),
        };

        match res {
            Ok(value) => return RawSignal::live(value),
            Err(err) if attempt < attempts => {
                let backoff = policy.backoff;
                tracing::warn!(signal = label, attempt, ?backoff, error = %err, "signal fetch failed; retrying");
                tokio::time::sleep(backoff).await;
            }
            Err(err) => {
                tracing::warn!(signal = label, attempt, error = %err, "signal unavailable; using fallback value");
                return RawSignal::fallback(fallback);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signals::SignalSource;
    use anyhow::Result;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays scripted responses; each entry is (delay, body or error).
    struct ScriptedFetcher {
        script: Mutex<Vec<(Duration, Option<Value>)>>,
        calls: AtomicU32,
    }

    impl ScriptedFetcher {
        fn new(mut script: Vec<(Duration, Option<Value>)>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl JsonFetcher for ScriptedFetcher {
        fn fetcher_name(&self) -> &'static str {
            "scripted"
        }

        async fn get_json(&self, _url: &str) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop();
            let (delay, body) = next.unwrap_or((Duration::ZERO, None));
            tokio::time::sleep(delay).await;
            body.ok_or_else(|| anyhow::anyhow!("scripted failure"))
        }
    }

    fn as_number(v: &Value) -> Option<f64> {
        v.get("n").and_then(Value::as_f64)
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_is_live() {
        let fetcher = ScriptedFetcher::new(vec![(Duration::ZERO, Some(json!({"n": 7})))]);
        let got = fetch_with_fallback(&fetcher, &RetryPolicy::default(), "test", "u", 0.0, as_number).await;
        assert_eq!(got.value, 7.0);
        assert_eq!(got.source, SignalSource::Live);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_once_then_succeeds_after_backoff() {
        let fetcher = ScriptedFetcher::new(vec![
            (Duration::ZERO, None),
            (Duration::ZERO, Some(json!({"n": 9}))),
        ]);
        let started = tokio::time::Instant::now();
        let got = fetch_with_fallback(&fetcher, &RetryPolicy::default(), "test", "u", 0.0, as_number).await;
        assert_eq!(got.value, 9.0);
        assert_eq!(got.source, SignalSource::Live);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= DEFAULT_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_exhaust_into_fallback() {
        let slow = Duration::from_secs(30);
        let fetcher = ScriptedFetcher::new(vec![
            (slow, Some(json!({"n": 1}))),
            (slow, Some(json!({"n": 1}))),
        ]);
        let started = tokio::time::Instant::now();
        let got = fetch_with_fallback(&fetcher, &RetryPolicy::default(), "test", "u", 50.0, as_number).await;
        assert_eq!(got.value, 50.0);
        assert_eq!(got.source, SignalSource::Fallback);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        // Two timeouts plus one backoff.
        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_TIMEOUT * 2 + DEFAULT_BACKOFF);
        assert!(elapsed < slow);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_body_counts_as_failure() {
        let fetcher = ScriptedFetcher::new(vec![
            (Duration::ZERO, Some(json!({"unexpected": true}))),
            (Duration::ZERO, Some(json!("garbage"))),
        ]);
        let got = fetch_with_fallback(&fetcher, &RetryPolicy::default(), "test", "u", 50.0, as_number).await;
        assert_eq!(got.source, SignalSource::Fallback);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let fetcher = ScriptedFetcher::new(vec![]);
        let policy = RetryPolicy {
            attempts: 0,
            ..RetryPolicy::default()
        };
        let got = fetch_with_fallback(&fetcher, &policy, "test", "u", 50.0, as_number).await;
        assert_eq!(got.source, SignalSource::Fallback);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
