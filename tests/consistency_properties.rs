//! Property tests for the token set and the retry budget

use async_trait::async_trait;
use http::{HeaderMap, HeaderValue};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use vaultline::observability::MetricsRecorder;
use vaultline::{
    ConsistencyStateStore, Error, LogicalRead, ReadOutcome, Result, RetryPolicy, RetryingReader,
    VaultResponse, VAULT_INDEX_HEADER,
};

fn response_with(tokens: &[String]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for token in tokens {
        headers.append(VAULT_INDEX_HEADER, HeaderValue::from_str(token).unwrap());
    }
    headers
}

fn stamped(store: &ConsistencyStateStore) -> Vec<String> {
    let mut request = HeaderMap::new();
    store.stamp(&mut request);
    request.get_all(VAULT_INDEX_HEADER).iter().map(|v| v.to_str().unwrap().to_string()).collect()
}

proptest! {
    #[test]
    fn prop_concurrent_observation_is_sorted_union(
        batches in prop::collection::vec(
            prop::collection::vec("v1:[a-c]{1,2}:[0-9]{1,3}:[0-9]{1,3}:", 0..6),
            1..8,
        )
    ) {
        let store = Arc::new(ConsistencyStateStore::new());

        let workers: Vec<_> = batches
            .iter()
            .cloned()
            .map(|batch| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for token in &batch {
                        store.observe(&response_with(std::slice::from_ref(token)));
                    }
                    store.observe(&response_with(&batch));
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let expected: Vec<String> = batches.iter().flatten().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        let snapshot: Vec<String> = store.snapshot().iter().map(|t| t.as_str().to_string()).collect();

        prop_assert_eq!(&snapshot, &expected);
        prop_assert_eq!(stamped(&store), expected);
    }

    #[test]
    fn prop_observation_order_does_not_matter(
        tokens in prop::collection::vec("[A-Za-z0-9:]{1,10}", 0..20),
        seed in any::<u64>(),
    ) {
        let forward = ConsistencyStateStore::new();
        for token in &tokens {
            forward.observe(&response_with(std::slice::from_ref(token)));
        }

        let mut shuffled = tokens.clone();
        let len = shuffled.len().max(1);
        shuffled.rotate_left((seed as usize) % len);
        shuffled.reverse();

        let backward = ConsistencyStateStore::new();
        backward.observe(&response_with(&shuffled));
        backward.observe(&response_with(&tokens));

        prop_assert_eq!(forward.snapshot(), backward.snapshot());
        prop_assert!(forward.len() <= tokens.len());
    }

    #[test]
    fn prop_reader_succeeds_on_nth_attempt(max_attempts in 1u32..8, succeed_on in 1u32..8) {
        let source = FailUntil::new(succeed_on);
        let reader = RetryingReader::new(RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO))
            .with_metrics(MetricsRecorder::disabled());

        let result: Result<ReadOutcome<serde_json::Value>> =
            tokio_test::block_on(reader.read(&source, "kv/prop"));

        if succeed_on <= max_attempts {
            let outcome = result.unwrap();
            prop_assert_eq!(outcome.retries(), succeed_on - 1);
            prop_assert_eq!(source.calls(), succeed_on);
        } else {
            let is_exhausted = matches!(result, Err(Error::NotFound { attempts, .. }) if attempts == max_attempts);
            prop_assert!(is_exhausted);
            prop_assert_eq!(source.calls(), max_attempts);
        }
    }
}

/// Answers 404 until the `succeed_on`-th call.
struct FailUntil {
    succeed_on: u32,
    calls: AtomicU32,
}

impl FailUntil {
    fn new(succeed_on: u32) -> Self {
        Self { succeed_on, calls: AtomicU32::new(0) }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogicalRead for FailUntil {
    async fn read(&self, path: &str) -> Result<VaultResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.succeed_on {
            Ok(VaultResponse { data: Some(serde_json::json!({"call": call})), ..Default::default() })
        } else {
            Err(Error::api(404, path, vec![]))
        }
    }
}
