//! Paginated List Loader
//!
//! Loads one page of a resource kind at a time through a shared page cache.
//!
//! - A page that has not arrived yet is shown with the previous page's rows
//!   and `is_placeholder` set, never as an empty table.
//! - At most one fetch per cache key is in flight; repeated requests attach
//!   to it.
//! - Fetches run as spawned tasks; completion is reported on the
//!   [`LoaderEvent`] channel and nothing ever waits on the network.
//! - A successful mutation invalidates every cached page of its kind.
//!
//! "Is there a next page" is a heuristic: a full page implies more. The API
//! reports no total, so a collection that is an exact multiple of the page
//! size shows one extra, empty page.

use super::model::{ResourceKind, ResourceRecord};
use super::remote::{PageWindow, ResourceApi, PAGE_SIZE};
use crate::api::error::{ApiError, ApiResult};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::mpsc;

/// Cache key: one page of one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub page: u32,
}

impl CacheKey {
    /// Pages are 1-based; 0 is clamped to 1
    pub fn new(kind: ResourceKind, page: u32) -> Self {
        Self {
            kind,
            page: page.max(1),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?page={}", self.kind.key(), self.page)
    }
}

/// What a listing view renders for one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub page: u32,
    pub items: Vec<ResourceRecord>,
    /// Rows belong to a previously shown page; this page is still loading
    pub is_placeholder: bool,
    /// Nothing to show yet, first fetch still running
    pub is_pending: bool,
}

/// Full page means there is probably another one
pub fn has_next_page(state: &PageState, page_size: usize) -> bool {
    !state.is_placeholder && state.items.len() == page_size
}

/// "Previous" is disabled on the first page
pub fn can_go_previous(page: u32) -> bool {
    page > 1
}

#[derive(Debug, Clone, Default)]
struct CacheEntry {
    data: Option<Vec<ResourceRecord>>,
    in_flight: bool,
    stale: bool,
    error: Option<ApiError>,
    updated_at: Option<Instant>,
}

/// Why a fetch is being considered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// The view needs this page: fetch unless fresh data or a fetch exists
    Load,
    /// Warm the cache; a failed page is left alone until navigated to
    Prefetch,
    /// Refetch only stale data
    Revalidate,
}

impl CacheEntry {
    fn should_fetch(&self, mode: FetchMode) -> bool {
        if self.in_flight {
            return false;
        }
        match mode {
            FetchMode::Load => self.data.is_none() || self.stale,
            FetchMode::Prefetch => self.error.is_none() && (self.data.is_none() || self.stale),
            FetchMode::Revalidate => self.stale,
        }
    }
}

/// Process-wide page cache keyed by (kind, page).
///
/// Cloning shares the same store. Anyone may read; only the loader writes.
#[derive(Clone, Default)]
pub struct PageCache {
    entries: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
}

impl PageCache {
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn data(&self, key: CacheKey) -> Option<Vec<ResourceRecord>> {
        self.lock().get(&key).and_then(|entry| entry.data.clone())
    }

    pub fn contains(&self, key: CacheKey) -> bool {
        self.lock().contains_key(&key)
    }

    pub fn is_in_flight(&self, key: CacheKey) -> bool {
        self.lock().get(&key).is_some_and(|entry| entry.in_flight)
    }

    pub fn is_stale(&self, key: CacheKey) -> bool {
        self.lock().get(&key).is_some_and(|entry| entry.stale)
    }

    /// Error from the last fetch of this key, cleared by the next success
    pub fn error(&self, key: CacheKey) -> Option<ApiError> {
        self.lock().get(&key).and_then(|entry| entry.error.clone())
    }

    pub fn updated_at(&self, key: CacheKey) -> Option<Instant> {
        self.lock().get(&key).and_then(|entry| entry.updated_at)
    }

    /// Keys currently cached for a kind
    pub fn keys_for(&self, kind: ResourceKind) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self
            .lock()
            .keys()
            .filter(|key| key.kind == kind)
            .copied()
            .collect();
        keys.sort();
        keys
    }

    /// Check-and-set under one lock, so a key never gets two fetches
    fn begin_fetch(&self, key: CacheKey, mode: FetchMode) -> bool {
        let mut entries = self.lock();
        let entry = entries.entry(key).or_default();
        if !entry.should_fetch(mode) {
            return false;
        }
        entry.in_flight = true;
        entry.stale = false;
        true
    }

    fn finish_fetch(&self, key: CacheKey, result: ApiResult<Vec<ResourceRecord>>) {
        let mut entries = self.lock();
        let entry = entries.entry(key).or_default();
        entry.in_flight = false;
        match result {
            Ok(items) => {
                entry.data = Some(items);
                entry.error = None;
                entry.updated_at = Some(Instant::now());
            }
            Err(err) => {
                entry.error = Some(err);
            }
        }
    }

    /// Mark every page of a kind stale, including ones still in flight
    fn invalidate_kind(&self, kind: ResourceKind) -> usize {
        let mut entries = self.lock();
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.kind == kind {
                entry.stale = true;
                count += 1;
            }
        }
        count
    }
}

/// Future returned by a fetch thunk
pub type FetchFuture = BoxFuture<'static, ApiResult<Vec<ResourceRecord>>>;

/// Cache key plus the zero-argument call that fills it
pub struct QueryOptions {
    pub key: CacheKey,
    pub fetch: Box<dyn FnOnce() -> FetchFuture + Send>,
}

/// Completion notice for a background fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderEvent {
    PageLoaded(CacheKey),
    PageFailed(CacheKey),
}

impl LoaderEvent {
    pub fn key(&self) -> CacheKey {
        match self {
            Self::PageLoaded(key) | Self::PageFailed(key) => *key,
        }
    }
}

pub struct PageLoader {
    api: Arc<dyn ResourceApi>,
    cache: PageCache,
    page_size: usize,
    events: mpsc::UnboundedSender<LoaderEvent>,
    /// Rows last handed out per kind, reused as placeholder data
    last_shown: HashMap<ResourceKind, Vec<ResourceRecord>>,
}

impl PageLoader {
    pub fn new(api: Arc<dyn ResourceApi>) -> (Self, mpsc::UnboundedReceiver<LoaderEvent>) {
        Self::with_page_size(api, PAGE_SIZE)
    }

    pub fn with_page_size(
        api: Arc<dyn ResourceApi>,
        page_size: usize,
    ) -> (Self, mpsc::UnboundedReceiver<LoaderEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let loader = Self {
            api,
            cache: PageCache::default(),
            page_size: page_size.max(1),
            events,
            last_shown: HashMap::new(),
        };
        (loader, rx)
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Key and fetch thunk for one page. The page travels to the API as a
    /// skip/limit window.
    pub fn query_options(&self, kind: ResourceKind, page: u32) -> QueryOptions {
        let key = CacheKey::new(kind, page);
        let window = PageWindow::for_page(key.page, self.page_size);
        let api = Arc::clone(&self.api);

        QueryOptions {
            key,
            fetch: Box::new(move || Box::pin(async move { api.list(kind, window).await })),
        }
    }

    /// Start (or reuse) the query for a page and return what to show now
    pub fn load(&mut self, kind: ResourceKind, page: u32) -> PageState {
        self.start(CacheKey::new(kind, page), FetchMode::Load);
        self.state(kind, page)
    }

    /// What to show for a page right now, without starting anything
    pub fn state(&mut self, kind: ResourceKind, page: u32) -> PageState {
        let key = CacheKey::new(kind, page);

        if let Some(items) = self.cache.data(key) {
            self.last_shown.insert(kind, items.clone());
            return PageState {
                page: key.page,
                items,
                is_placeholder: false,
                is_pending: false,
            };
        }

        match self.last_shown.get(&kind) {
            Some(previous) => PageState {
                page: key.page,
                items: previous.clone(),
                is_placeholder: true,
                is_pending: false,
            },
            None => PageState {
                page: key.page,
                items: Vec::new(),
                is_placeholder: false,
                is_pending: self.cache.is_in_flight(key),
            },
        }
    }

    pub fn has_next_page(&self, state: &PageState) -> bool {
        has_next_page(state, self.page_size)
    }

    /// Warm the cache for a page. No-op when cached, in flight, or failed.
    pub fn prefetch(&self, kind: ResourceKind, page: u32) -> bool {
        self.start(CacheKey::new(kind, page), FetchMode::Prefetch)
    }

    /// Prefetch the page after `state` when it looks like one exists
    pub fn prefetch_next(&self, kind: ResourceKind, state: &PageState) -> bool {
        if !self.has_next_page(state) {
            return false;
        }
        self.prefetch(kind, state.page + 1)
    }

    /// Refetch a page only if it was invalidated
    pub fn revalidate(&self, kind: ResourceKind, page: u32) -> bool {
        self.start(CacheKey::new(kind, page), FetchMode::Revalidate)
    }

    /// Mark every cached page of a kind stale
    pub fn invalidate(&self, kind: ResourceKind) -> usize {
        let count = self.cache.invalidate_kind(kind);
        tracing::info!("Invalidated {} cached page(s) of {}", count, kind.key());
        count
    }

    fn start(&self, key: CacheKey, mode: FetchMode) -> bool {
        if !self.cache.begin_fetch(key, mode) {
            return false;
        }

        tracing::debug!("fetch {} ({:?})", key, mode);

        let QueryOptions { fetch, .. } = self.query_options(key.kind, key.page);
        let cache = self.cache.clone();
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = fetch().await;
            let event = match &result {
                Ok(items) => {
                    tracing::debug!("fetched {} ({} rows)", key, items.len());
                    LoaderEvent::PageLoaded(key)
                }
                Err(e) => {
                    tracing::warn!("fetch {} failed: {}", key, e);
                    LoaderEvent::PageFailed(key)
                }
            };
            cache.finish_fetch(key, result);
            // The UI may already be gone
            let _ = events.send(event);
        });

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::{questionnaires, FakeApi};

    const Q: ResourceKind = ResourceKind::Questionnaire;

    fn loader_with(api: &Arc<FakeApi>) -> (PageLoader, mpsc::UnboundedReceiver<LoaderEvent>) {
        PageLoader::new(Arc::clone(api) as Arc<dyn ResourceApi>)
    }

    #[test]
    fn test_cache_keys_discriminate_pages() {
        assert_eq!(CacheKey::new(Q, 2), CacheKey::new(Q, 2));
        assert_ne!(CacheKey::new(Q, 1), CacheKey::new(Q, 2));
        assert_ne!(CacheKey::new(Q, 1), CacheKey::new(ResourceKind::Mentor, 1));
        assert_eq!(CacheKey::new(Q, 3).to_string(), "questionnaires?page=3");
    }

    #[test]
    fn test_has_next_page_requires_full_real_page() {
        let mut state = PageState {
            page: 1,
            items: questionnaires(5),
            is_placeholder: false,
            is_pending: false,
        };
        assert!(has_next_page(&state, 5));

        state.is_placeholder = true;
        assert!(!has_next_page(&state, 5));

        state.is_placeholder = false;
        state.items.truncate(4);
        assert!(!has_next_page(&state, 5));
    }

    #[test]
    fn test_previous_disabled_on_first_page() {
        assert!(!can_go_previous(1));
        assert!(!can_go_previous(0));
        assert!(can_go_previous(2));
    }

    #[tokio::test]
    async fn test_first_load_is_pending_then_ready() {
        let api = Arc::new(FakeApi::new().with_records(Q, questionnaires(3)));
        let (mut loader, mut rx) = loader_with(&api);

        let state = loader.load(Q, 1);
        assert!(state.is_pending);
        assert!(state.items.is_empty());

        assert_eq!(rx.recv().await, Some(LoaderEvent::PageLoaded(CacheKey::new(Q, 1))));
        let state = loader.state(Q, 1);
        assert!(!state.is_pending);
        assert_eq!(state.items.len(), 3);
        assert!(!loader.has_next_page(&state));
    }

    #[tokio::test]
    async fn test_next_page_shows_previous_rows_as_placeholder() {
        let api = Arc::new(FakeApi::paused().with_records(Q, questionnaires(8)));
        let (mut loader, mut rx) = loader_with(&api);

        api.release(1);
        loader.load(Q, 1);
        rx.recv().await;
        let page1 = loader.state(Q, 1);
        assert_eq!(page1.items.len(), 5);
        assert!(loader.has_next_page(&page1));

        // Page 2 is held at the gate
        let page2 = loader.load(Q, 2);
        assert_eq!(page2.page, 2);
        assert!(page2.is_placeholder);
        assert_eq!(page2.items, page1.items);
        assert!(!loader.has_next_page(&page2));

        api.release(1);
        assert_eq!(rx.recv().await, Some(LoaderEvent::PageLoaded(CacheKey::new(Q, 2))));
        let page2 = loader.state(Q, 2);
        assert!(!page2.is_placeholder);
        assert_eq!(page2.items.len(), 3);
        assert_ne!(page2.items, page1.items);
    }

    #[tokio::test]
    async fn test_one_fetch_per_key_in_flight() {
        let api = Arc::new(FakeApi::paused().with_records(Q, questionnaires(5)));
        let (mut loader, mut rx) = loader_with(&api);

        loader.load(Q, 1);
        loader.load(Q, 1);
        assert!(!loader.prefetch(Q, 1));
        assert!(loader.cache().is_in_flight(CacheKey::new(Q, 1)));

        api.release(1);
        rx.recv().await;
        assert_eq!(api.list_call_count(), 1);

        // Fresh data is reused
        loader.load(Q, 1);
        assert_eq!(api.list_call_count(), 1);
    }

    #[tokio::test]
    async fn test_prefetch_is_idempotent() {
        let api = Arc::new(FakeApi::new().with_records(Q, questionnaires(12)));
        let (loader, mut rx) = loader_with(&api);

        assert!(loader.prefetch(Q, 2));
        assert!(!loader.prefetch(Q, 2));
        rx.recv().await;
        assert!(!loader.prefetch(Q, 2));
        assert_eq!(api.list_call_count(), 1);
    }

    #[tokio::test]
    async fn test_prefetch_next_only_after_full_page() {
        let api = Arc::new(FakeApi::new().with_records(Q, questionnaires(6)));
        let (mut loader, mut rx) = loader_with(&api);

        loader.load(Q, 1);
        rx.recv().await;
        let page1 = loader.state(Q, 1);
        assert!(loader.prefetch_next(Q, &page1));
        rx.recv().await;
        assert!(loader.cache().data(CacheKey::new(Q, 2)).is_some());

        let page2 = loader.load(Q, 2);
        assert!(!page2.is_placeholder);
        assert!(!loader.prefetch_next(Q, &page2));
    }

    #[tokio::test]
    async fn test_failed_prefetch_is_not_retried_until_navigation() {
        let api = Arc::new(FakeApi::new().with_records(Q, questionnaires(12)));
        api.fail_lists(true);
        let (mut loader, mut rx) = loader_with(&api);

        assert!(loader.prefetch(Q, 2));
        assert_eq!(rx.recv().await, Some(LoaderEvent::PageFailed(CacheKey::new(Q, 2))));
        assert!(loader.cache().error(CacheKey::new(Q, 2)).is_some());
        assert!(!loader.prefetch(Q, 2));
        assert_eq!(api.list_call_count(), 1);

        api.fail_lists(false);
        loader.load(Q, 2);
        assert_eq!(rx.recv().await, Some(LoaderEvent::PageLoaded(CacheKey::new(Q, 2))));
        assert_eq!(api.list_call_count(), 2);
        assert!(loader.cache().error(CacheKey::new(Q, 2)).is_none());
    }

    #[tokio::test]
    async fn test_invalidate_marks_every_page_of_kind_stale() {
        let api = Arc::new(
            FakeApi::new()
                .with_records(Q, questionnaires(12))
                .with_records(ResourceKind::Mentor, Vec::new()),
        );
        let (mut loader, mut rx) = loader_with(&api);

        loader.load(Q, 1);
        loader.load(Q, 2);
        loader.load(ResourceKind::Mentor, 1);
        for _ in 0..3 {
            rx.recv().await;
        }
        assert_eq!(api.list_call_count(), 3);

        assert_eq!(loader.invalidate(Q), 2);
        assert!(loader.cache().is_stale(CacheKey::new(Q, 1)));
        assert!(loader.cache().is_stale(CacheKey::new(Q, 2)));
        assert!(!loader.cache().is_stale(CacheKey::new(ResourceKind::Mentor, 1)));

        // Stale rows stay visible while the refetch runs
        let state = loader.load(Q, 2);
        assert!(!state.is_placeholder);
        assert_eq!(state.items.len(), 5);
        rx.recv().await;
        assert_eq!(api.list_call_count(), 4);
        assert!(!loader.cache().is_stale(CacheKey::new(Q, 2)));
    }

    #[tokio::test]
    async fn test_invalidate_during_flight_keeps_entry_stale() {
        let api = Arc::new(FakeApi::paused().with_records(Q, questionnaires(2)));
        let (mut loader, mut rx) = loader_with(&api);

        loader.load(Q, 1);
        loader.invalidate(Q);
        api.release(1);
        rx.recv().await;

        let key = CacheKey::new(Q, 1);
        assert!(loader.cache().data(key).is_some());
        assert!(loader.cache().is_stale(key));
        assert!(loader.revalidate(Q, 1));
        assert!(!loader.revalidate(Q, 1));
    }

    #[tokio::test]
    async fn test_query_options_threads_page_window() {
        let api = Arc::new(FakeApi::new().with_records(Q, questionnaires(7)));
        let (loader, _rx) = loader_with(&api);

        let options = loader.query_options(Q, 2);
        assert_eq!(options.key, CacheKey::new(Q, 2));
        let rows = (options.fetch)().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            api.list_calls().last().copied(),
            Some((Q, PageWindow { skip: 5, limit: 5 }))
        );
    }
}
