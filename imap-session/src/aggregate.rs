//! Result aggregation: one fetch per selected identifier, merged into an
//! ordered snapshot and swapped in atomically.

use crate::published::Published;
use futures::future::{self, join_all, BoxFuture};
use futures::FutureExt;
use imap_core::{QueryKey, QueryResult};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Results keyed by query identifier, in selection order.
///
/// Identifiers whose fetch failed in the producing cycle are listed in
/// [`Aggregate::failed`] and have no entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<K> {
    entries: Vec<(K, QueryResult)>,
    failed: Vec<K>,
}

impl<K: QueryKey> Default for Aggregate<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<K: QueryKey> Aggregate<K> {
    pub fn new(entries: Vec<(K, QueryResult)>, failed: Vec<K>) -> Self {
        Self { entries, failed }
    }

    pub fn get(&self, key: &K) -> Option<&QueryResult> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, result)| result)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &QueryResult)> + '_ {
        self.entries.iter().map(|(k, result)| (*k, result))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failed(&self) -> &[K] {
        &self.failed
    }

    /// Features across every entry.
    pub fn feature_count(&self) -> usize {
        self.entries.iter().map(|(_, result)| result.len()).sum()
    }
}

/// Outcome of one fetch-and-merge cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport<K> {
    pub sequence: u64,
    /// False when a newer cycle started before this one finished.
    pub applied: bool,
    pub fetched: Vec<K>,
    pub failed: Vec<K>,
}

/// Runs fetch cycles for one selection set and publishes their aggregates.
///
/// Clones share state, so a cycle future stays valid after the aggregator
/// that started it is moved.
#[derive(Debug, Clone)]
pub struct ResultAggregator<K> {
    name: &'static str,
    published: Arc<Published<Aggregate<K>>>,
}

impl<K: QueryKey> ResultAggregator<K> {
    /// `name` only labels log lines.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            published: Arc::new(Published::new(Aggregate::default())),
        }
    }

    /// Current snapshot.
    pub fn current(&self) -> Arc<Aggregate<K>> {
        self.published.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Aggregate<K>>> {
        self.published.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.published.is_loading()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.published.subscribe_loading()
    }

    /// Publish an empty aggregate right away, invalidating any cycle still
    /// in flight.
    pub fn clear(&self) -> CycleReport<K> {
        let sequence = self.published.begin();
        self.published.publish(sequence, Aggregate::default());
        self.published.set_loading(sequence, false);
        debug!("{}: cleared at cycle {}", self.name, sequence);
        CycleReport {
            sequence,
            applied: true,
            fetched: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Start a cycle for `keys`.
    ///
    /// The sequence number is reserved and the loading flag raised before
    /// this returns; an empty `keys` clears synchronously. The returned
    /// future performs the fetches and must be awaited or spawned.
    pub fn run<F, Fut>(&self, keys: Vec<K>, fetch: F) -> BoxFuture<'static, CycleReport<K>>
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = imap_api::Result<QueryResult>> + Send + 'static,
    {
        if keys.is_empty() {
            return future::ready(self.clear()).boxed();
        }

        let sequence = self.published.begin();
        self.published.set_loading(sequence, true);
        debug!(
            "{}: cycle {} fetching {} queries",
            self.name,
            sequence,
            keys.len()
        );

        let name = self.name;
        let published = Arc::clone(&self.published);
        async move {
            let outcomes = join_all(keys.into_iter().map(|key| {
                let pending = fetch(key);
                async move { (key, pending.await) }
            }))
            .await;

            let mut entries = Vec::with_capacity(outcomes.len());
            let mut fetched = Vec::new();
            let mut failed = Vec::new();
            for (key, outcome) in outcomes {
                match outcome {
                    Ok(result) => {
                        fetched.push(key);
                        entries.push((key, result));
                    }
                    Err(e) => {
                        warn!("{}: fetch failed for query {}: {}", name, key, e);
                        failed.push(key);
                    }
                }
            }

            let applied = published.publish(sequence, Aggregate::new(entries, failed.clone()));
            if applied {
                published.set_loading(sequence, false);
                info!(
                    "{}: cycle {} applied, {} results, {} failed",
                    name,
                    sequence,
                    fetched.len(),
                    failed.len()
                );
            } else {
                debug!(
                    "{}: discarding cycle {}, cycle {} is newer",
                    name,
                    sequence,
                    published.latest_sequence()
                );
            }

            CycleReport {
                sequence,
                applied,
                fetched,
                failed,
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imap_api::ApiError;
    use imap_core::MainQueryId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn result_with(count: usize) -> QueryResult {
        let features: Vec<serde_json::Value> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "geometry": {"coordinates": [-35.0, -5.0]},
                    "properties": {"id_instalacao": format!("I{}", i), "query_id": 1}
                })
            })
            .collect();
        serde_json::from_value(serde_json::json!({ "features": features })).unwrap()
    }

    fn failure(key: MainQueryId) -> ApiError {
        ApiError::Backend {
            query: key.to_string(),
            message: "Query not found".into(),
        }
    }

    #[tokio::test]
    async fn entries_follow_key_order_and_skip_failures() {
        let aggregator = ResultAggregator::new("main");
        let report = aggregator
            .run(
                vec![MainQueryId(3), MainQueryId(1), MainQueryId(2)],
                |key| async move {
                    match key.0 {
                        1 => Err(failure(key)),
                        n => Ok(result_with(n as usize)),
                    }
                },
            )
            .await;

        assert!(report.applied);
        assert_eq!(report.fetched, vec![MainQueryId(3), MainQueryId(2)]);
        assert_eq!(report.failed, vec![MainQueryId(1)]);

        let current = aggregator.current();
        assert_eq!(current.keys().collect::<Vec<_>>(), vec![MainQueryId(3), MainQueryId(2)]);
        assert_eq!(current.failed(), &[MainQueryId(1)]);
        assert_eq!(current.feature_count(), 5);
        assert!(!aggregator.is_loading());
    }

    #[tokio::test]
    async fn total_failure_still_clears_loading() {
        let aggregator = ResultAggregator::new("main");
        let pending = aggregator.run(vec![MainQueryId(1)], |key| async move { Err(failure(key)) });
        assert!(aggregator.is_loading());

        let report = pending.await;
        assert!(report.applied);
        assert!(aggregator.current().is_empty());
        assert!(!aggregator.is_loading());
    }

    #[tokio::test]
    async fn empty_keys_clear_without_fetching() {
        let aggregator = ResultAggregator::new("main");
        aggregator
            .run(vec![MainQueryId(1)], |_| async { Ok(result_with(2)) })
            .await;
        assert_eq!(aggregator.current().len(), 1);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let pending = aggregator.run(Vec::new(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(result_with(1)) }
        });
        // cleared before the future is polled
        assert!(aggregator.current().is_empty());

        let report = pending.await;
        assert!(report.applied);
        assert!(report.fetched.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clear_invalidates_a_cycle_in_flight() {
        let aggregator = ResultAggregator::new("auxiliary");
        let pending = aggregator.run(vec![MainQueryId(1)], |_| async { Ok(result_with(1)) });
        aggregator.clear();

        let report = pending.await;
        assert!(!report.applied);
        assert!(aggregator.current().is_empty());
        assert!(!aggregator.is_loading());
    }
}
