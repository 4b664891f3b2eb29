//! Per-store detail resolution
//!
//! The tag filter needs the full detail record of every candidate store.
//! `DetailResolver` fans out one background fetch per store that has no
//! detail yet, consulting the `StoreCache` first, and delivers outcomes over
//! a tokio channel that the event loop drains without blocking.
//!
//! Every fetch is tagged with a generation number. Cancelling or re-issuing a
//! fetch for a store moves its generation forward and aborts the old task, so
//! a late response from a superseded request is recognised and dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cache::StoreCache;
use crate::data::{DetailSource, StoreDetail, StoreSummary};

/// Capacity of the result channel
const CHANNEL_CAPACITY: usize = 64;

/// Resolution state of one store's detail
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// A fetch is in flight
    Pending { attempt: u32 },
    /// Detail is available (from cache or network)
    Ready(StoreDetail),
    /// The last fetch failed; nothing is retried until asked
    Failed { attempt: u32, message: String },
}

/// Outcome of one background fetch
#[derive(Debug, Clone)]
pub struct ResolveMessage {
    pub store_id: String,
    pub generation: u64,
    pub attempt: u32,
    pub result: Result<StoreDetail, String>,
}

/// Orchestrates cache lookups and background detail fetches
pub struct DetailResolver {
    source: Arc<dyn DetailSource>,
    cache: Option<StoreCache>,
    states: HashMap<String, DetailState>,
    /// Generation of the request currently allowed to update each store
    generations: HashMap<String, u64>,
    next_generation: u64,
    tasks: HashMap<String, JoinHandle<()>>,
    sender: mpsc::Sender<ResolveMessage>,
    receiver: mpsc::Receiver<ResolveMessage>,
}

impl DetailResolver {
    /// Creates a resolver over a detail source and an optional cache
    pub fn new(source: Arc<dyn DetailSource>, cache: Option<StoreCache>) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        Self {
            source,
            cache,
            states: HashMap::new(),
            generations: HashMap::new(),
            next_generation: 0,
            tasks: HashMap::new(),
            sender,
            receiver,
        }
    }

    /// Resolves every store that has no detail state yet
    ///
    /// Cache hits become `Ready` immediately; misses start a background
    /// fetch. Stores that are pending, ready or failed are left alone.
    ///
    /// # Returns
    /// The number of network fetches started
    pub fn resolve_missing(&mut self, stores: &[StoreSummary]) -> usize {
        let mut started = 0;
        for store in stores {
            if self.states.contains_key(&store.id) {
                continue;
            }
            if self.adopt_cached(&store.id) {
                continue;
            }
            self.spawn_fetch(&store.id, 1);
            started += 1;
        }
        if started > 0 {
            tracing::debug!(started, "started detail fetches");
        }
        started
    }

    /// Re-fetches a store whose last fetch failed
    ///
    /// Returns false when the store is not in the failed state.
    pub fn retry(&mut self, store_id: &str) -> bool {
        let attempt = match self.states.get(store_id) {
            Some(DetailState::Failed { attempt, .. }) => attempt + 1,
            _ => return false,
        };
        tracing::info!(store_id, attempt, "retrying detail fetch");
        self.spawn_fetch(store_id, attempt);
        true
    }

    /// Cancels an in-flight fetch; its late result will be ignored
    ///
    /// The store returns to "no state" so a later `resolve_missing` can
    /// request it again. Returns false when nothing was in flight.
    pub fn cancel(&mut self, store_id: &str) -> bool {
        if !matches!(self.states.get(store_id), Some(DetailState::Pending { .. })) {
            return false;
        }
        self.invalidate(store_id);
        self.states.remove(store_id);
        tracing::debug!(store_id, "cancelled detail fetch");
        true
    }

    /// Concentrates on one store (opening its detail view)
    ///
    /// In-flight fetches for every other store are cancelled, then this
    /// store is resolved if it has no state yet.
    pub fn focus(&mut self, store_id: &str) {
        let others: Vec<String> = self
            .states
            .iter()
            .filter(|(id, state)| {
                id.as_str() != store_id && matches!(state, DetailState::Pending { .. })
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in others {
            self.cancel(&id);
        }

        if !self.states.contains_key(store_id) && !self.adopt_cached(store_id) {
            self.spawn_fetch(store_id, 1);
        }
    }

    /// Applies one fetch outcome
    ///
    /// # Returns
    /// `true` if state changed, `false` if the message was stale
    pub fn apply(&mut self, message: ResolveMessage) -> bool {
        let ResolveMessage {
            store_id,
            generation,
            attempt,
            result,
        } = message;

        if self.generations.get(&store_id) != Some(&generation) {
            tracing::debug!(%store_id, generation, "dropping stale detail result");
            return false;
        }
        self.generations.remove(&store_id);
        self.tasks.remove(&store_id);

        match result {
            Ok(detail) => {
                if let Some(cache) = &self.cache {
                    cache.set(&store_id, &detail);
                }
                self.states.insert(store_id, DetailState::Ready(detail));
            }
            Err(message) => {
                tracing::warn!(%store_id, attempt, error = %message, "detail fetch failed");
                self.states
                    .insert(store_id, DetailState::Failed { attempt, message });
            }
        }
        true
    }

    /// Applies every outcome already delivered, without waiting
    ///
    /// # Returns
    /// The number of messages that changed state
    pub fn drain(&mut self) -> usize {
        let mut changed = 0;
        while let Ok(message) = self.receiver.try_recv() {
            if self.apply(message) {
                changed += 1;
            }
        }
        changed
    }

    /// Waits for the next outcome and applies it
    pub async fn wait_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(message) => self.apply(message),
            None => false,
        }
    }

    /// Resolved detail for a store, if ready
    pub fn detail(&self, store_id: &str) -> Option<&StoreDetail> {
        match self.states.get(store_id) {
            Some(DetailState::Ready(detail)) => Some(detail),
            _ => None,
        }
    }

    /// Current state of a store, if any
    pub fn state(&self, store_id: &str) -> Option<&DetailState> {
        self.states.get(store_id)
    }

    /// Generation of the fetch currently in flight for a store
    pub fn generation(&self, store_id: &str) -> Option<u64> {
        self.generations.get(store_id).copied()
    }

    /// Number of fetches in flight
    pub fn pending_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| matches!(s, DetailState::Pending { .. }))
            .count()
    }

    /// Drops all state and aborts every in-flight fetch (new search)
    pub fn reset(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
        self.generations.clear();
        self.states.clear();
    }

    fn adopt_cached(&mut self, store_id: &str) -> bool {
        match self.cache.as_ref().and_then(|cache| cache.get(store_id)) {
            Some(detail) => {
                self.states
                    .insert(store_id.to_string(), DetailState::Ready(detail));
                true
            }
            None => false,
        }
    }

    fn invalidate(&mut self, store_id: &str) {
        self.generations.remove(store_id);
        if let Some(task) = self.tasks.remove(store_id) {
            task.abort();
        }
    }

    fn spawn_fetch(&mut self, store_id: &str, attempt: u32) {
        self.invalidate(store_id);
        self.next_generation += 1;
        let generation = self.next_generation;

        self.generations.insert(store_id.to_string(), generation);
        self.states
            .insert(store_id.to_string(), DetailState::Pending { attempt });

        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let id = store_id.to_string();
        let task = tokio::spawn(async move {
            let result = source
                .fetch_detail(&id)
                .await
                .map_err(|error| error.to_string());
            let _ = sender
                .send(ResolveMessage {
                    store_id: id,
                    generation,
                    attempt,
                    result,
                })
                .await;
        });
        self.tasks.insert(store_id.to_string(), task);
    }
}

impl Drop for DetailResolver {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}
