//! Debounced remote search
//!
//! Each query bumps a generation counter and aborts the previous pending task.
//! A task publishes its response only if its generation is still current when it
//! completes, so a slow response to an older query can never replace a newer one.

use crate::error::SearchError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use stepform_schema::FieldOption;
use tokio::task::JoinHandle;

/// Default debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Caller-supplied asynchronous option search
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Options matching `query`
    async fn search(&self, query: &str) -> Result<Vec<FieldOption>, SearchError>;
}

/// Published search state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSnapshot {
    /// Query of the latest request
    pub query: String,
    /// Options of the latest published response
    pub results: Vec<FieldOption>,
    /// A request is pending or in flight
    pub loading: bool,
    /// Failure of the latest published response
    pub error: Option<String>,
    /// Generation of the latest published response, 0 if none yet
    pub published: u64,
}

#[derive(Default)]
struct SearchState {
    snapshot: SearchSnapshot,
    current: u64,
}

/// Remote search bound to one combobox
pub struct RemoteSearch {
    provider: Arc<dyn SearchProvider>,
    debounce: Duration,
    state: Arc<Mutex<SearchState>>,
    pending: Option<JoinHandle<()>>,
}

impl fmt::Debug for RemoteSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteSearch")
            .field("debounce", &self.debounce)
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl RemoteSearch {
    /// Create with a debounce window
    #[must_use]
    pub fn new(provider: Arc<dyn SearchProvider>, debounce: Duration) -> Self {
        Self {
            provider,
            debounce,
            state: Arc::new(Mutex::new(SearchState::default())),
            pending: None,
        }
    }

    /// Issue a query, superseding any earlier one
    ///
    /// Must be called from within a tokio runtime.
    pub fn query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }

        let generation = {
            let mut state = self.state.lock();
            state.current += 1;
            state.snapshot.query.clone_from(&query);
            state.snapshot.loading = true;
            state.current
        };

        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let debounce = self.debounce;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if state.lock().current != generation {
                return;
            }

            let outcome = provider.search(&query).await;

            let mut state = state.lock();
            if state.current != generation {
                tracing::debug!(generation, current = state.current, "discarding stale search response");
                return;
            }
            let snapshot = &mut state.snapshot;
            match outcome {
                Ok(results) => {
                    snapshot.results = results;
                    snapshot.error = None;
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "remote search failed");
                    snapshot.error = Some(e.to_string());
                }
            }
            snapshot.loading = false;
            snapshot.published = generation;
        }));
    }

    /// Drop the pending request and reset loading state
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        let mut state = self.state.lock();
        state.current += 1;
        state.snapshot.loading = false;
    }

    /// Current published state
    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Debounce window
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Drop for RemoteSearch {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}
