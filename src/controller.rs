use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::watch;

use crate::debounce::{Debouncer, QUIESCENCE_WINDOW};
use crate::media::{ApiError, Category, FilterEdit, MovieSummary, Query};
use crate::tmdb::MetadataGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingPhase {
    #[default]
    Idle,
    Debouncing,
    Fetching,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingSnapshot {
    pub query: Query,
    pub movies: Vec<MovieSummary>,
    pub is_loading: bool,
    pub phase: ListingPhase,
}

impl ListingSnapshot {
    pub fn is_settled(&self) -> bool {
        matches!(
            self.phase,
            ListingPhase::Idle | ListingPhase::Loaded | ListingPhase::Failed
        )
    }
}

struct ListingState {
    query: Query,
    movies: Vec<MovieSummary>,
    phase: ListingPhase,
    // Bumped on every edit; a fired timer only issues if it still matches.
    edit_generation: u64,
    issued_seq: u64,
    // Responses below this sequence number were superseded by a later edit.
    accept_from: u64,
    debouncer: Debouncer,
}

impl ListingState {
    fn snapshot(&self) -> ListingSnapshot {
        ListingSnapshot {
            query: self.query.clone(),
            movies: self.movies.clone(),
            is_loading: self.phase == ListingPhase::Fetching,
            phase: self.phase,
        }
    }
}

struct Inner {
    gateway: Arc<dyn MetadataGateway>,
    state: Mutex<ListingState>,
    snapshots: watch::Sender<ListingSnapshot>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &ListingState) {
        self.snapshots.send_replace(state.snapshot());
    }

    fn fire(self: &Arc<Self>, generation: u64) {
        let (seq, query) = {
            let mut state = self.state();
            if state.edit_generation != generation {
                return;
            }
            state.issued_seq += 1;
            state.phase = ListingPhase::Fetching;
            self.publish(&state);
            (state.issued_seq, state.query.clone())
        };

        tracing::debug!(seq, ?query, "issuing listing query");
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = inner.gateway.fetch_movies(&query).await;
            inner.commit(seq, result);
        });
    }

    fn commit(&self, seq: u64, result: Result<Vec<MovieSummary>, ApiError>) {
        let mut state = self.state();
        if seq != state.issued_seq || seq < state.accept_from {
            tracing::warn!(
                seq,
                latest = state.issued_seq,
                "discarding stale listing response"
            );
            return;
        }

        match result {
            Ok(movies) => {
                tracing::debug!(seq, count = movies.len(), "listing query resolved");
                state.movies = movies;
                state.phase = ListingPhase::Loaded;
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "listing query failed, showing empty results");
                state.movies.clear();
                state.phase = ListingPhase::Failed;
            }
        }
        self.publish(&state);
    }
}

#[derive(Clone)]
pub struct QueryController {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for QueryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryController")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl QueryController {
    pub fn new(gateway: Arc<dyn MetadataGateway>) -> Self {
        Self::with_quiescence(gateway, QUIESCENCE_WINDOW)
    }

    pub fn with_quiescence(gateway: Arc<dyn MetadataGateway>, window: Duration) -> Self {
        let state = ListingState {
            query: Query::default(),
            movies: Vec::new(),
            phase: ListingPhase::Idle,
            edit_generation: 0,
            issued_seq: 0,
            accept_from: 0,
            debouncer: Debouncer::new(window),
        };
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                gateway,
                state: Mutex::new(state),
                snapshots,
            }),
        }
    }

    /// Installs results fetched before first paint for the default query.
    /// Ignored once any edit has been made, returning `false`.
    pub fn seed(&self, movies: Vec<MovieSummary>) -> bool {
        let mut state = self.inner.state();
        if state.phase != ListingPhase::Idle {
            tracing::debug!(phase = ?state.phase, "ignoring seed after first edit");
            return false;
        }
        state.movies = movies;
        state.phase = ListingPhase::Loaded;
        self.inner.publish(&state);
        true
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        self.edit(move |q| q.with_search_text(text));
    }

    pub fn set_filter(&self, edit: FilterEdit) {
        self.edit(move |q| q.with_filter(edit));
    }

    pub fn set_category(&self, category: Category) {
        self.edit(move |q| q.with_category(category));
    }

    pub fn set_page(&self, page: u32) {
        self.edit(move |q| q.with_page(page));
    }

    pub fn reset_filters(&self) {
        self.edit(|_| Query::default());
    }

    pub fn query(&self) -> Query {
        self.inner.state().query.clone()
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        self.inner.state().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingSnapshot> {
        self.inner.snapshots.subscribe()
    }

    fn edit(&self, apply: impl FnOnce(&Query) -> Query) {
        let mut state = self.inner.state();
        let next = apply(&state.query);
        state.query = next;
        state.edit_generation += 1;
        state.accept_from = state.issued_seq + 1;
        state.phase = ListingPhase::Debouncing;

        let generation = state.edit_generation;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        state.debouncer.schedule(move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire(generation);
            }
        });
        self.inner.publish(&state);
    }
}
