//! Catalog data sources
//!
//! A [`DataSource`] turns hovered text into a catalog lookup: it normalizes
//! the identifier, fetches the catalog page at most once per id, derives an
//! image URL and a tag list from it, and drives its own popover.
//!
//! Concrete catalogs only supply the id scheme, the URL and the two
//! extraction hooks; fetching, caching, single-flight and the popover
//! lifecycle are provided here on top of [`SourceState`].

pub mod cache;
pub mod popover;

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{FetchError, PreviewError, Result, StateError};
use crate::fetcher::{FetchOutcome, PendingFetch, RemoteFetcher};
use crate::types::{CatalogDocument, Point, PopoverContent, PopoverView};

pub use cache::{CacheRecord, LoadedRecord, SourceCache};
pub use popover::Popover;

/// Lock a mutex, recovering the data if a panicking holder poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The fetch a source will abort when its popover is hidden
#[derive(Debug)]
struct TrackedFetch {
    video_id: String,
    pending: PendingFetch,
}

/// What a cache lookup found
enum FetchSlot {
    Cached(LoadedRecord),
    Pending(PendingFetch),
}

/// Fetcher, cache and popover shared by every data source implementation.
#[derive(Debug)]
pub struct SourceState {
    name: &'static str,
    fetcher: RemoteFetcher,
    cache: SourceCache,
    current_request: Mutex<Option<TrackedFetch>>,
    popover: Mutex<Option<Popover>>,
}

impl SourceState {
    pub fn new(name: &'static str, fetcher: RemoteFetcher) -> Self {
        Self {
            name,
            fetcher,
            cache: SourceCache::new(),
            current_request: Mutex::new(None),
            popover: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Id of the fetch `hide_popover` would abort, if any
    pub fn current_fetch_id(&self) -> Option<u64> {
        lock(&self.current_request)
            .as_ref()
            .map(|tracked| tracked.pending.id())
    }

    /// Return the fulfilled record, join the in-flight fetch, or start one.
    fn begin_fetch(&self, video_id: &str, url: &str) -> FetchSlot {
        let mut records = self.cache.records();
        let record = records
            .entry(video_id.to_string())
            .or_insert_with(|| CacheRecord::new(video_id, url));

        if let Some(loaded) = record.loaded() {
            debug!(source = self.name, %video_id, "using cached data");
            return FetchSlot::Cached(loaded);
        }

        if let Some(pending) = &record.pending_request {
            debug!(source = self.name, %video_id, fetch_id = pending.id(), "joining in-flight request");
            return FetchSlot::Pending(pending.clone());
        }

        let pending = self.fetcher.fetch(&record.source_url);
        info!(source = self.name, %video_id, url = %record.source_url, fetch_id = pending.id(), "sending request");
        record.pending_request = Some(pending.clone());

        // Last writer wins: an older fetch stays in its own record's slot
        // but is no longer the one a hide aborts.
        *lock(&self.current_request) = Some(TrackedFetch {
            video_id: video_id.to_string(),
            pending: pending.clone(),
        });

        FetchSlot::Pending(pending)
    }

    /// Record the outcome of `pending` for `video_id`.
    fn finish_fetch(
        &self,
        video_id: &str,
        pending: &PendingFetch,
        outcome: FetchOutcome,
    ) -> std::result::Result<LoadedRecord, FetchError> {
        let result = {
            let mut records = self.cache.records();
            let record = records
                .entry(video_id.to_string())
                .or_insert_with(|| CacheRecord::new(video_id, pending.url()));
            record.clear_pending(pending.id());

            match outcome {
                Ok(response) => Ok(record.fulfil(response)),
                Err(reason) => Err(FetchError {
                    reason,
                    url: pending.url().to_string(),
                    video_id: video_id.to_string(),
                }),
            }
        };

        let mut current = lock(&self.current_request);
        if current
            .as_ref()
            .is_some_and(|tracked| tracked.pending.id() == pending.id())
        {
            *current = None;
        }

        result
    }

    /// Memoized value in `slot`, or the result of `extract` stored into it.
    ///
    /// The records lock is held from the memo check to the store, so
    /// concurrent callers extract at most once. `None` is not stored.
    fn derive<T: Clone>(
        &self,
        video_id: &str,
        slot: impl Fn(&mut CacheRecord) -> &mut Option<T>,
        extract: impl FnOnce(&CatalogDocument) -> Option<T>,
    ) -> std::result::Result<Option<T>, StateError> {
        let mut records = self.cache.records();
        let record = records
            .get_mut(video_id)
            .ok_or_else(|| StateError::NoRecord(video_id.to_string()))?;

        if !record.fulfilled {
            return Err(StateError::NotLoaded(video_id.to_string()));
        }
        if let Some(value) = slot(record).clone() {
            return Ok(Some(value));
        }
        let document = record
            .raw_document
            .as_ref()
            .ok_or_else(|| StateError::NotLoaded(video_id.to_string()))?;

        let value = extract(document);
        if let Some(value) = &value {
            *slot(record) = Some(value.clone());
        }
        Ok(value)
    }

    fn source_url_of(&self, video_id: &str) -> std::result::Result<String, StateError> {
        self.cache
            .records()
            .get(video_id)
            .map(|record| record.source_url.clone())
            .ok_or_else(|| StateError::NoRecord(video_id.to_string()))
    }

    fn open_popover(&self, video_id: &str) {
        lock(&self.popover)
            .get_or_insert_with(Popover::new)
            .open(video_id);
    }

    fn render_popover(&self, video_id: &str, content: PopoverContent) -> PopoverView {
        let mut popover = lock(&self.popover);
        let popover = popover.get_or_insert_with(Popover::new);
        if !popover.render(video_id, content) {
            debug!(source = self.name, %video_id, "discarding stale popover content");
        }
        popover.view(self.name)
    }

    fn hide(&self) {
        if let Some(popover) = lock(&self.popover).as_mut() {
            popover.hide();
        }

        let tracked = lock(&self.current_request).take();
        if let Some(tracked) = tracked {
            tracked.pending.abort();
            if let Some(record) = self.cache.records().get_mut(&tracked.video_id) {
                record.clear_pending(tracked.pending.id());
            }
        }
    }

    fn place(&self, point: Point) {
        if let Some(popover) = lock(&self.popover).as_mut() {
            popover.place(point);
        }
    }

    fn view(&self) -> Option<PopoverView> {
        lock(&self.popover)
            .as_ref()
            .map(|popover| popover.view(self.name))
    }
}

/// A catalog site that can preview hovered identifiers.
///
/// Implementors provide the id scheme, the catalog URL and the two
/// extraction hooks. Everything else has a default built on
/// [`SourceState`], which keeps these guarantees:
///
/// - one cache record per normalized id, never more than one fetch in
///   flight for it; concurrent callers share that fetch's outcome;
/// - image URL and tags are extracted at most once per record, after the
///   record is fulfilled;
/// - `show_popover` and `hide_popover` never fail.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Shared fetch/cache/popover state
    fn state(&self) -> &SourceState;

    /// Extract this catalog's canonical id from arbitrary text.
    fn normalize_id(&self, raw: &str) -> Option<String>;

    /// Catalog page URL for a normalized id
    fn source_url(&self, video_id: &str) -> String;

    /// Absolute preview image URL found in the catalog page.
    ///
    /// Runs with the cache locked; must not call back into this source.
    fn extract_image_url(&self, document: &CatalogDocument, video_id: &str) -> Option<String>;

    /// Tag names found in the catalog page, in page order. Same locking
    /// rule as [`extract_image_url`](Self::extract_image_url).
    fn extract_tags(&self, document: &CatalogDocument, video_id: &str) -> Vec<String>;

    fn name(&self) -> &'static str {
        self.state().name()
    }

    /// Normalized id, or an error naming the unrecognized text
    fn require_id(&self, raw: &str) -> Result<String> {
        self.normalize_id(raw)
            .ok_or_else(|| PreviewError::UnrecognizedId(raw.trim().to_string()))
    }

    /// Fetch the catalog page for `raw`, or return the cached one.
    ///
    /// # Errors
    /// - `PreviewError::UnrecognizedId` if `raw` has no id for this source (no request is made)
    /// - `PreviewError::Fetch` on non-2xx status, transport failure, timeout or cancellation
    async fn load_data(&self, raw: &str) -> Result<LoadedRecord> {
        let video_id = self.require_id(raw)?;
        let url = self.source_url(&video_id);
        let state = self.state();
        debug!(source = self.name(), %video_id, %url, "loading data");

        let pending = match state.begin_fetch(&video_id, &url) {
            FetchSlot::Cached(record) => return Ok(record),
            FetchSlot::Pending(pending) => pending,
        };

        let outcome = pending.outcome().await;
        state
            .finish_fetch(&video_id, &pending, outcome)
            .map_err(|error| {
                if error.is_cancelled() {
                    debug!(source = self.name(), %video_id, "request aborted");
                } else {
                    warn!(source = self.name(), %video_id, %error, "error fetching data");
                }
                PreviewError::from(error)
            })
    }

    /// Preview image URL, memoized after the first extraction.
    ///
    /// # Errors
    /// - `PreviewError::State` if the record is not loaded yet
    /// - `PreviewError::ElementNotFound` if the page has no preview image
    fn image_url(&self, raw: &str) -> Result<String> {
        let video_id = self.require_id(raw)?;
        self.state()
            .derive(
                &video_id,
                |record| &mut record.image_url,
                |document| self.extract_image_url(document, &video_id),
            )?
            .ok_or_else(|| PreviewError::ElementNotFound(format!("preview image for {video_id}")))
    }

    /// Tags, memoized after the first extraction.
    ///
    /// # Errors
    /// Returns `PreviewError::State` if the record is not loaded yet.
    fn tags(&self, raw: &str) -> Result<Vec<String>> {
        let video_id = self.require_id(raw)?;
        let tags = self.state().derive(
            &video_id,
            |record| &mut record.tags,
            |document| Some(self.extract_tags(document, &video_id)),
        )?;
        Ok(tags.unwrap_or_default())
    }

    /// Tags joined for display
    fn tags_text(&self, raw: &str) -> Result<String> {
        Ok(self.tags(raw)?.join(", "))
    }

    /// Catalog page URL of a looked-up id
    ///
    /// # Errors
    /// Returns `PreviewError::State` if the id was never looked up.
    fn link(&self, raw: &str) -> Result<String> {
        let video_id = self.require_id(raw)?;
        Ok(self.state().source_url_of(&video_id)?)
    }

    /// Everything the popover shows for `raw`, loading it first if needed.
    async fn preview_content(&self, raw: &str) -> Result<PopoverContent> {
        self.load_data(raw).await?;
        Ok(PopoverContent::Preview {
            image_url: self.image_url(raw)?,
            tags: self.tags_text(raw)?,
            link: self.link(raw)?,
        })
    }

    /// Show the popover for `raw`. Failures render as a "not found" message.
    async fn show_popover(&self, raw: &str) -> PopoverView {
        let target = raw.trim();
        self.state().open_popover(target);

        let content = match self.preview_content(target).await {
            Ok(content) => content,
            Err(error) => {
                debug!(source = self.name(), video_id = %target, %error, "showing not-found popover");
                PopoverContent::NotFound {
                    message: format!("Video ID: {target} not found"),
                }
            }
        };

        self.state().render_popover(target, content)
    }

    /// Hide the popover and abort this source's in-flight fetch, if any.
    fn hide_popover(&self) {
        self.state().hide();
    }

    /// Move the popover near `point`; does nothing before the first show.
    fn set_popover_position(&self, point: Point) {
        self.state().place(point);
    }

    /// Current popover snapshot, if the popover was ever shown
    fn popover(&self) -> Option<PopoverView> {
        self.state().view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchFailure;
    use crate::testing::{ScriptedTransport, Step};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const PAGE: &str = r#"<html><body>
        <img class="cover" src="/covers/42.jpg">
        <a href="/tag/one">One</a><a href="/other">Skip</a><a href="/tag/two">Two</a>
    </body></html>"#;

    /// Minimal source counting how often extraction runs
    struct CountingSource {
        state: SourceState,
        image_extractions: AtomicUsize,
        tag_extractions: AtomicUsize,
        extract_delay: Duration,
    }

    impl CountingSource {
        fn new(fetcher: RemoteFetcher) -> Self {
            Self {
                state: SourceState::new("counting", fetcher),
                image_extractions: AtomicUsize::new(0),
                tag_extractions: AtomicUsize::new(0),
                extract_delay: Duration::ZERO,
            }
        }

        fn with_extract_delay(mut self, delay: Duration) -> Self {
            self.extract_delay = delay;
            self
        }
    }

    impl DataSource for CountingSource {
        fn state(&self) -> &SourceState {
            &self.state
        }

        fn normalize_id(&self, raw: &str) -> Option<String> {
            let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
            (!digits.is_empty()).then_some(digits)
        }

        fn source_url(&self, video_id: &str) -> String {
            format!("https://catalog.test/items/{video_id}")
        }

        fn extract_image_url(&self, document: &CatalogDocument, _video_id: &str) -> Option<String> {
            self.image_extractions.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.extract_delay);
            let html = document.html();
            let selector = scraper::Selector::parse("img.cover").ok()?;
            let src = html.select(&selector).next()?.value().attr("src")?;
            document.resolve(src)
        }

        fn extract_tags(&self, document: &CatalogDocument, _video_id: &str) -> Vec<String> {
            self.tag_extractions.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.extract_delay);
            let html = document.html();
            let Ok(selector) = scraper::Selector::parse("a[href]") else {
                return Vec::new();
            };
            html.select(&selector)
                .filter(|a| a.value().attr("href").is_some_and(|h| h.starts_with("/tag/")))
                .map(|a| a.text().collect::<String>())
                .collect()
        }
    }

    fn source(steps: Vec<Step>) -> (Arc<CountingSource>, Arc<ScriptedTransport>) {
        let transport = ScriptedTransport::new(steps);
        (Arc::new(CountingSource::new(transport.fetcher())), transport)
    }

    #[tokio::test]
    async fn test_load_data_fetches_and_caches() {
        let (source, transport) = source(vec![Step::respond(200, PAGE)]);

        let record = source.load_data("item 42").await.unwrap();
        assert_eq!(record.normalized_id, "42");
        assert_eq!(record.source_url, "https://catalog.test/items/42");

        let again = source.load_data("42").await.unwrap();
        assert_eq!(again.document.body(), PAGE);
        assert_eq!(transport.calls(), 1);
        assert_eq!(source.state().cache().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_load_data_is_single_flight() {
        let (source, transport) = source(vec![
            Step::delayed(30, 200, PAGE),
            Step::respond(500, "unexpected second request"),
        ]);

        let (a, b) = tokio::join!(source.load_data("item 42"), source.load_data("42"));

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_waiters_share_failure() {
        let (source, transport) = source(vec![Step::delayed(30, 503, "busy")]);

        let (a, b) = tokio::join!(source.load_data("42"), source.load_data("42"));

        for result in [a, b] {
            match result {
                Err(PreviewError::Fetch(error)) => {
                    assert_eq!(error.reason, FetchFailure::Status(503));
                    assert_eq!(error.video_id, "42");
                }
                other => panic!("Expected fetch error, got {other:?}"),
            }
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_unrecognized_id_makes_no_request() {
        let (source, transport) = source(vec![Step::respond(200, PAGE)]);

        let result = source.load_data("no digits here").await;
        assert!(matches!(result, Err(PreviewError::UnrecognizedId(_))));

        let view = source.show_popover("no digits here").await;
        assert!(matches!(view.content, PopoverContent::NotFound { .. }));
        assert_eq!(transport.calls(), 0);
        assert!(source.state().cache().is_empty());
    }

    #[tokio::test]
    async fn test_accessors_before_load_are_state_errors() {
        let (source, _transport) = source(vec![Step::Hang]);

        assert!(matches!(
            source.image_url("42"),
            Err(PreviewError::State(StateError::NoRecord(_)))
        ));
        assert!(matches!(
            source.tags_text("42"),
            Err(PreviewError::State(StateError::NoRecord(_)))
        ));
        assert!(matches!(
            source.link("42"),
            Err(PreviewError::State(StateError::NoRecord(_)))
        ));
    }

    #[tokio::test]
    async fn test_accessors_on_pending_record_are_not_loaded() {
        let (source, _transport) = source(vec![Step::Hang]);

        let loader = Arc::clone(&source);
        let handle = tokio::spawn(async move { loader.load_data("42").await });
        while !source.state().cache().is_pending("42") {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            source.image_url("42"),
            Err(PreviewError::State(StateError::NotLoaded(_)))
        ));
        source.hide_popover();
        assert!(handle.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_derivations_are_memoized() {
        let (source, _transport) = source(vec![Step::respond(200, PAGE)]);
        source.load_data("42").await.unwrap();

        for _ in 0..3 {
            assert_eq!(
                source.image_url("42").unwrap(),
                "https://catalog.test/covers/42.jpg"
            );
            assert_eq!(source.tags_text("42").unwrap(), "One, Two");
        }

        assert_eq!(source.image_extractions.load(Ordering::SeqCst), 1);
        assert_eq!(source.tag_extractions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_derivations_extract_once() {
        let transport = ScriptedTransport::new(vec![Step::respond(200, PAGE)]);
        let source = Arc::new(
            CountingSource::new(transport.fetcher()).with_extract_delay(Duration::from_millis(100)),
        );
        source.load_data("42").await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let source = Arc::clone(&source);
                std::thread::spawn(move || {
                    (source.image_url("42").unwrap(), source.tags_text("42").unwrap())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.join().unwrap(),
                (
                    "https://catalog.test/covers/42.jpg".to_string(),
                    "One, Two".to_string()
                )
            );
        }
        assert_eq!(source.image_extractions.load(Ordering::SeqCst), 1);
        assert_eq!(source.tag_extractions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_image_is_not_memoized() {
        let (source, _transport) = source(vec![Step::respond(200, "<html><body></body></html>")]);
        source.load_data("42").await.unwrap();

        assert!(matches!(
            source.image_url("42"),
            Err(PreviewError::ElementNotFound(_))
        ));
        assert!(source.image_url("42").is_err());
        assert_eq!(source.image_extractions.load(Ordering::SeqCst), 2);
        assert_eq!(source.tags_text("42").unwrap(), "");
    }

    #[tokio::test]
    async fn test_failed_fetch_allows_retry() {
        let (source, transport) = source(vec![
            Step::respond(404, "missing"),
            Step::respond(200, PAGE),
        ]);

        assert!(source.load_data("42").await.is_err());
        assert!(!source.state().cache().is_fulfilled("42"));
        assert!(!source.state().cache().is_pending("42"));

        assert!(source.load_data("42").await.is_ok());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_show_popover_renders_preview() {
        let (source, _transport) = source(vec![Step::respond(200, PAGE)]);

        let view = source.show_popover(" item 42 ").await;
        assert!(view.visible);
        assert_eq!(view.position, Point::OFFSCREEN);
        assert_eq!(
            view.content,
            PopoverContent::Preview {
                image_url: "https://catalog.test/covers/42.jpg".to_string(),
                tags: "One, Two".to_string(),
                link: "https://catalog.test/items/42".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_show_popover_failure_renders_not_found() {
        let (source, _transport) = source(vec![Step::Fail(FetchFailure::Timeout)]);

        let view = source.show_popover("item 42").await;
        assert!(view.visible);
        assert_eq!(
            view.content,
            PopoverContent::NotFound {
                message: "Video ID: item 42 not found".to_string()
            }
        );
    }

    #[test]
    fn test_hide_and_position_without_popover_are_noops() {
        let (source, _transport) = source(Vec::new());

        source.hide_popover();
        source.set_popover_position(Point::new(10.0, 10.0));

        assert!(source.popover().is_none());
        assert_eq!(source.state().current_fetch_id(), None);
    }

    #[tokio::test]
    async fn test_set_popover_position_after_show() {
        let (source, _transport) = source(vec![Step::respond(200, PAGE)]);
        source.show_popover("42").await;

        source.set_popover_position(Point::new(50.0, 100.0));
        assert_eq!(source.popover().unwrap().position, Point::new(50.0, 130.0));

        source.hide_popover();
        assert!(!source.popover().unwrap().visible);
    }

    #[tokio::test]
    async fn test_hide_cancels_in_flight_fetch_and_next_show_refetches() {
        let (source, transport) = source(vec![Step::Hang, Step::respond(200, PAGE)]);

        let shower = Arc::clone(&source);
        let handle = tokio::spawn(async move { shower.show_popover("42").await });
        while transport.calls() == 0 {
            tokio::task::yield_now().await;
        }
        assert!(source.state().current_fetch_id().is_some());

        source.hide_popover();
        assert!(!source.state().cache().is_pending("42"));
        assert_eq!(source.state().current_fetch_id(), None);

        let cancelled = handle.await.unwrap();
        assert!(!cancelled.visible);
        assert!(matches!(cancelled.content, PopoverContent::NotFound { .. }));

        let view = source.show_popover("42").await;
        assert!(view.visible);
        assert!(matches!(view.content, PopoverContent::Preview { .. }));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_newer_fetch_replaces_tracked_request() {
        let (source, transport) = source(vec![
            Step::delayed(40, 200, PAGE),
            Step::delayed(10, 200, PAGE),
        ]);

        let first = Arc::clone(&source);
        let slow = tokio::spawn(async move { first.show_popover("1").await });
        while transport.calls() == 0 {
            tokio::task::yield_now().await;
        }
        let first_fetch = source.state().current_fetch_id();

        let latest = source.show_popover("2").await;
        assert_ne!(source.state().current_fetch_id(), first_fetch);
        assert_eq!(latest.video_id.as_deref(), Some("2"));

        let stale = slow.await.unwrap();
        assert_eq!(stale.video_id.as_deref(), Some("2"));
        assert_eq!(
            source.popover().unwrap().content,
            latest.content
        );
        assert!(source.state().cache().is_fulfilled("1"));
    }
}
