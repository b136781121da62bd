//! Fake collaborators that record how the pipeline used them.

use crate::cache::{CacheEntry, CacheStore, InMemoryCacheStore};
use crate::errors::{CacheError, RenderError, ResolveError};
use crate::render::{
    Application, DataContext, RenderedMarkup, Renderer, RouteResolver, ServerRenderContext,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A resolver backed by a fixed route table.
///
/// Unknown URLs resolve to [`ResolveError::NotFound`].
#[derive(Debug, Default)]
pub struct StaticResolver {
    routes: HashMap<String, DataContext>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl StaticResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.
    #[must_use]
    pub fn with_route(mut self, url: impl Into<String>, data: DataContext) -> Self {
        self.routes.insert(url.into(), data);
        self
    }

    /// Makes `url` fail with [`ResolveError::Failed`].
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, reason: impl Into<String>) -> Self {
        self.failures.insert(url.into(), reason.into());
        self
    }

    /// Returns the number of resolutions performed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the URLs resolved, in order.
    #[must_use]
    pub fn resolved_urls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RouteResolver for StaticResolver {
    async fn resolve(&self, url: &str) -> Result<DataContext, ResolveError> {
        self.calls.lock().push(url.to_string());

        if let Some(reason) = self.failures.get(url) {
            return Err(ResolveError::failed(url, reason.clone()));
        }
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| ResolveError::not_found(url))
    }
}

type RenderFn = dyn Fn(&Application, &mut ServerRenderContext, &DataContext, &str) -> Result<RenderedMarkup, RenderError>
    + Send
    + Sync;

/// A renderer driven by a closure.
pub struct FnRenderer {
    func: Box<RenderFn>,
    calls: AtomicUsize,
}

impl FnRenderer {
    /// Creates a renderer from a closure.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Application, &mut ServerRenderContext, &DataContext, &str) -> Result<RenderedMarkup, RenderError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            func: Box::new(func),
            calls: AtomicUsize::new(0),
        }
    }

    /// A renderer that always returns the same markup.
    #[must_use]
    pub fn static_markup(head: &str, body: &str) -> Self {
        let markup = RenderedMarkup::new(head, body);
        Self::new(move |_, _, _, _| Ok(markup.clone()))
    }

    /// A renderer that redirects every URL to `location`.
    #[must_use]
    pub fn redirecting(location: &str, permanent: bool) -> Self {
        let location = location.to_string();
        Self::new(move |_, ctx, _, _| {
            ctx.redirect(location.clone(), permanent);
            Ok(RenderedMarkup::default())
        })
    }

    /// A renderer that always fails.
    #[must_use]
    pub fn failing(reason: &str) -> Self {
        let reason = reason.to_string();
        Self::new(move |_, _, _, url| Err(RenderError::failed(url, reason.clone())))
    }

    /// Returns the number of renders performed.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for FnRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRenderer")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

impl Renderer for FnRenderer {
    fn render(
        &self,
        app: &Application,
        render_ctx: &mut ServerRenderContext,
        data: &DataContext,
        url: &str,
    ) -> Result<RenderedMarkup, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.func)(app, render_ctx, data, url)
    }
}

/// A cache store whose every operation fails.
#[derive(Debug, Default)]
pub struct FailingCacheStore {
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl FailingCacheStore {
    /// Creates a failing store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of reads attempted.
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Returns the number of writes attempted.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::unavailable("connection refused"))
    }

    async fn set(&self, _key: &str, _entry: CacheEntry, _ttl: Duration) -> Result<(), CacheError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::unavailable("connection refused"))
    }
}

/// A working in-memory store that records every write.
#[derive(Default)]
pub struct RecordingCacheStore {
    inner: InMemoryCacheStore,
    gets: AtomicUsize,
    writes: Mutex<Vec<(String, CacheEntry, Duration)>>,
}

impl RecordingCacheStore {
    /// Creates an empty recording store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of reads performed.
    #[must_use]
    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Returns every write, in order.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, CacheEntry, Duration)> {
        self.writes.lock().clone()
    }

    /// Returns the number of writes performed.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    /// Reads an entry without counting it as a pipeline read.
    pub async fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.inner.get(key).await.ok().flatten()
    }
}

impl fmt::Debug for RecordingCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingCacheStore")
            .field("gets", &self.get_count())
            .field("writes", &self.write_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for RecordingCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, entry: CacheEntry, ttl: Duration) -> Result<(), CacheError> {
        self.writes
            .lock()
            .push((key.to_string(), entry.clone(), ttl));
        self.inner.set(key, entry, ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DefaultRenderContextFactory;
    use crate::render::RenderContextFactory;
    use crate::testing::test_app;

    #[tokio::test]
    async fn test_static_resolver() {
        let resolver = StaticResolver::new()
            .with_route("/about", DataContext::for_route("about"))
            .with_failure("/flaky", "db down");

        assert!(resolver.resolve("/about").await.is_ok());
        assert!(resolver.resolve("/nope").await.unwrap_err().is_not_found());
        assert!(!resolver.resolve("/flaky").await.unwrap_err().is_not_found());
        assert_eq!(resolver.call_count(), 3);
    }

    #[test]
    fn test_resolver_records_urls() {
        let resolver = StaticResolver::new().with_route("/", DataContext::empty());

        tokio_test::assert_ok!(tokio_test::block_on(resolver.resolve("/")));
        tokio_test::assert_err!(tokio_test::block_on(resolver.resolve("/gone")));

        assert_eq!(resolver.resolved_urls(), vec!["/", "/gone"]);
    }

    #[test]
    fn test_fn_renderer_counts_calls() {
        let renderer = FnRenderer::static_markup("<h>", "<b>");
        let app = test_app();
        let mut ctx = DefaultRenderContextFactory.create("/");

        let markup = renderer.render(&app, &mut ctx, &DataContext::empty(), "/").unwrap();
        assert_eq!(markup, RenderedMarkup::new("<h>", "<b>"));
        assert_eq!(renderer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_recording_store() {
        let store = RecordingCacheStore::new();
        store
            .set("k", CacheEntry::NotFound, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(store.write_count(), 1);
        assert_eq!(store.peek("k").await, Some(CacheEntry::NotFound));
        assert_eq!(store.get_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = FailingCacheStore::new();
        assert!(store.get("k").await.is_err());
        assert!(store.set("k", CacheEntry::NotFound, Duration::from_secs(1)).await.is_err());
        assert_eq!(store.get_count(), 1);
        assert_eq!(store.set_count(), 1);
    }
}
