//! Post-login redirect resolution
//!
//! Decides where the browser goes after login. Checked in order:
//! 1. `redirectUrl` query parameter
//! 2. `appId` query parameter (editor of the fork of that application)
//! 3. `X-Redirect-Url`, `Origin` and `Referer` headers

mod context;
mod referer;

pub use context::RequestContext;
pub use referer::referer_origin;

use hyper::header::REFERER;
use std::sync::Arc;

use crate::logger;
use crate::store::{edit_page_url, AclPermission, ApplicationLookup};

pub const DEFAULT_REDIRECT_URL: &str = "/applications";
pub const REDIRECT_URL_HEADER: &str = "X-Redirect-Url";
pub const REDIRECT_URL_QUERY_PARAM: &str = "redirectUrl";
pub const FORK_APP_ID_QUERY_PARAM: &str = "appId";

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Computes the redirect URL for a request
#[derive(Clone)]
pub struct RedirectResolver {
    lookup: Arc<dyn ApplicationLookup>,
}

impl RedirectResolver {
    pub fn new(lookup: Arc<dyn ApplicationLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve the redirect URL. Never fails and never returns an empty string.
    pub async fn resolve(&self, ctx: &RequestContext) -> String {
        if let Some(redirect_url) = ctx.query(REDIRECT_URL_QUERY_PARAM) {
            let url = query_param_url(redirect_url, ctx.origin());
            logger::log_debug(&format!("[Redirect] redirectUrl parameter -> {url}"));
            return url;
        }

        if let Some(fork_app_id) = ctx.query(FORK_APP_ID_QUERY_PARAM) {
            let url = self.forked_app_url(fork_app_id, ctx.origin()).await;
            logger::log_debug(&format!("[Redirect] appId={fork_app_id} -> {url}"));
            return url;
        }

        let url = header_url(ctx);
        logger::log_debug(&format!("[Redirect] headers -> {url}"));
        url
    }

    /// Editor URL of the application forked from `fork_app_id`
    async fn forked_app_url(&self, fork_app_id: &str, origin: Option<&str>) -> String {
        let origin = origin.unwrap_or_default();
        let fallback = format!("{origin}{DEFAULT_REDIRECT_URL}");

        let Some(application) = self
            .lookup
            .find_by_cloned_from(fork_app_id, AclPermission::ReadApplications)
            .await
        else {
            return fallback;
        };

        match application.default_page_id() {
            Some(page_id) => edit_page_url(origin, &application.id, page_id),
            None => fallback,
        }
    }
}

/// Rule 1: explicit `redirectUrl`. Relative values are prefixed with the origin
/// by plain concatenation.
fn query_param_url(redirect_url: &str, origin: Option<&str>) -> String {
    if is_absolute(redirect_url) {
        return redirect_url.to_string();
    }

    let path = if redirect_url.is_empty() {
        DEFAULT_REDIRECT_URL
    } else {
        redirect_url
    };

    match origin {
        Some(origin) => format!("{origin}{path}"),
        None => path.to_string(),
    }
}

/// Rule 3: headers only
///
/// With an `Origin`, any non-absolute `X-Redirect-Url` collapses to
/// `Origin + /applications`. Without one, the header is used as-is, and when
/// it is missing the `Referer` origin is tried before the default path.
fn header_url(ctx: &RequestContext) -> String {
    let header_value = ctx.header(REDIRECT_URL_HEADER).filter(|v| !v.is_empty());

    if let Some(origin) = ctx.origin() {
        return match header_value {
            Some(url) if is_absolute(url) => url.to_string(),
            _ => format!("{origin}{DEFAULT_REDIRECT_URL}"),
        };
    }

    if let Some(url) = header_value {
        return url.to_string();
    }

    ctx.header(REFERER.as_str())
        .and_then(referer_origin)
        .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Application, ApplicationPage, InMemoryApplicationStore};
    use async_trait::async_trait;
    use hyper::header::{HeaderMap, HeaderValue};
    use hyper::Uri;
    use std::sync::Mutex;

    /// Lookup stub returning a fixed answer and recording its calls
    struct StubLookup {
        answer: fn() -> Option<Application>,
        calls: Mutex<Vec<(String, AclPermission)>>,
    }

    impl StubLookup {
        fn new(answer: fn() -> Option<Application>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ApplicationLookup for StubLookup {
        async fn find_by_cloned_from(
            &self,
            source_app_id: &str,
            permission: AclPermission,
        ) -> Option<Application> {
            self.calls
                .lock()
                .unwrap()
                .push((source_app_id.to_string(), permission));
            (self.answer)()
        }
    }

    fn nothing() -> Option<Application> {
        None
    }

    fn forked_app() -> Option<Application> {
        Some(Application {
            id: "fork-1".to_string(),
            cloned_from: Some("123".to_string()),
            pages: vec![
                ApplicationPage {
                    id: "p1".to_string(),
                    is_default: false,
                },
                ApplicationPage {
                    id: "p2".to_string(),
                    is_default: true,
                },
            ],
            permissions: vec![AclPermission::ReadApplications],
        })
    }

    fn forked_app_without_default() -> Option<Application> {
        let mut app = forked_app()?;
        for page in &mut app.pages {
            page.is_default = false;
        }
        Some(app)
    }

    fn forked_app_without_pages() -> Option<Application> {
        let mut app = forked_app()?;
        app.pages.clear();
        Some(app)
    }

    fn request(uri: &str, headers: &[(&'static str, &'static str)]) -> RequestContext {
        let uri: Uri = uri.parse().unwrap();
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(*name, HeaderValue::from_static(*value));
        }
        RequestContext::from_parts(&uri, &map)
    }

    fn resolver(answer: fn() -> Option<Application>) -> RedirectResolver {
        RedirectResolver::new(StubLookup::new(answer))
    }

    #[tokio::test]
    async fn test_relative_redirect_url_concatenated_with_origin() {
        let ctx = RequestContext::default()
            .with_query("redirectUrl", "foo")
            .with_header("Origin", "http://x.com");
        assert_eq!(resolver(nothing).resolve(&ctx).await, "http://x.comfoo");
    }

    #[tokio::test]
    async fn test_absolute_redirect_url_passes_through() {
        for url in ["http://evil.com", "https://a.com/x?y=1"] {
            let ctx = RequestContext::default()
                .with_query("redirectUrl", url)
                .with_header("Origin", "http://x.com");
            assert_eq!(resolver(nothing).resolve(&ctx).await, url);
        }
    }

    #[tokio::test]
    async fn test_empty_redirect_url() {
        let with_origin = RequestContext::default()
            .with_query("redirectUrl", "")
            .with_header("Origin", "http://x.com");
        assert_eq!(
            resolver(nothing).resolve(&with_origin).await,
            "http://x.com/applications"
        );

        let without_origin = RequestContext::default().with_query("redirectUrl", "");
        assert_eq!(
            resolver(nothing).resolve(&without_origin).await,
            "/applications"
        );
    }

    #[tokio::test]
    async fn test_redirect_url_wins_over_app_id() {
        let lookup = StubLookup::new(forked_app);
        let resolver = RedirectResolver::new(lookup.clone());
        let ctx = RequestContext::default()
            .with_query("redirectUrl", "https://a.com")
            .with_query("appId", "123");
        assert_eq!(resolver.resolve(&ctx).await, "https://a.com");
        assert!(lookup.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_app_id_selects_default_page() {
        let lookup = StubLookup::new(forked_app);
        let resolver = RedirectResolver::new(lookup.clone());
        let ctx = RequestContext::default()
            .with_query("appId", "123")
            .with_header("Origin", "http://x.com");
        assert_eq!(
            resolver.resolve(&ctx).await,
            "http://x.com/applications/fork-1/pages/p2/edit"
        );
        assert_eq!(
            *lookup.calls.lock().unwrap(),
            vec![("123".to_string(), AclPermission::ReadApplications)]
        );
    }

    #[tokio::test]
    async fn test_app_id_falls_back_to_first_page() {
        let ctx = RequestContext::default()
            .with_query("appId", "123")
            .with_header("Origin", "http://x.com");
        assert_eq!(
            resolver(forked_app_without_default).resolve(&ctx).await,
            "http://x.com/applications/fork-1/pages/p1/edit"
        );
    }

    #[tokio::test]
    async fn test_app_id_without_match_or_pages() {
        let ctx = RequestContext::default()
            .with_query("appId", "999")
            .with_header("Origin", "http://x.com");
        assert_eq!(
            resolver(nothing).resolve(&ctx).await,
            "http://x.com/applications"
        );
        assert_eq!(
            resolver(forked_app_without_pages).resolve(&ctx).await,
            "http://x.com/applications"
        );
    }

    #[tokio::test]
    async fn test_app_id_uses_last_of_several_forks() {
        let first = forked_app().unwrap();
        let mut second = first.clone();
        second.id = "fork-2".to_string();
        let store = InMemoryApplicationStore::new(&[first, second]);
        let resolver = RedirectResolver::new(Arc::new(store));

        let ctx = request(
            "/login/redirect?appId=123",
            &[("origin", "http://x.com")],
        );
        assert_eq!(
            resolver.resolve(&ctx).await,
            "http://x.com/applications/fork-2/pages/p2/edit"
        );
    }

    #[tokio::test]
    async fn test_bare_redirect_url_key_falls_through() {
        let ctx = request(
            "/login/redirect?redirectUrl",
            &[("x-redirect-url", "https://keep.me/home")],
        );
        assert_eq!(resolver(nothing).resolve(&ctx).await, "https://keep.me/home");
    }

    #[tokio::test]
    async fn test_bare_app_id_key_falls_through() {
        let lookup = StubLookup::new(forked_app);
        let resolver = RedirectResolver::new(lookup.clone());
        let ctx = request(
            "/login/redirect?appId",
            &[("referer", "http://ref.com:80/page")],
        );
        assert_eq!(resolver.resolve(&ctx).await, "http://ref.com:80");
        assert!(lookup.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_app_id_without_origin_is_relative() {
        let ctx = RequestContext::default().with_query("appId", "123");
        assert_eq!(
            resolver(forked_app).resolve(&ctx).await,
            "/applications/fork-1/pages/p2/edit"
        );
    }

    #[tokio::test]
    async fn test_relative_header_discarded_when_origin_set() {
        let ctx = RequestContext::default()
            .with_header("X-Redirect-Url", "/custom")
            .with_header("Origin", "http://x.com");
        assert_eq!(
            resolver(nothing).resolve(&ctx).await,
            "http://x.com/applications"
        );
    }

    #[tokio::test]
    async fn test_absolute_header_kept_when_origin_set() {
        let ctx = RequestContext::default()
            .with_header("X-Redirect-Url", "https://app.example.com/home")
            .with_header("Origin", "http://x.com");
        assert_eq!(
            resolver(nothing).resolve(&ctx).await,
            "https://app.example.com/home"
        );
    }

    #[tokio::test]
    async fn test_header_without_origin_used_as_is() {
        let ctx = RequestContext::default()
            .with_header("X-Redirect-Url", "/custom")
            .with_header("Referer", "http://ref.com/page");
        assert_eq!(resolver(nothing).resolve(&ctx).await, "/custom");
    }

    #[tokio::test]
    async fn test_origin_only() {
        let ctx = RequestContext::default().with_header("Origin", "http://x.com");
        assert_eq!(
            resolver(nothing).resolve(&ctx).await,
            "http://x.com/applications"
        );
    }

    #[tokio::test]
    async fn test_referer_origin_used() {
        let ctx = RequestContext::default().with_header("Referer", "http://ref.com/page");
        assert_eq!(resolver(nothing).resolve(&ctx).await, "http://ref.com");
    }

    #[tokio::test]
    async fn test_malformed_referer_uses_default() {
        let ctx = RequestContext::default().with_header("Referer", "not a url");
        assert_eq!(resolver(nothing).resolve(&ctx).await, "/applications");
    }

    #[tokio::test]
    async fn test_all_inputs_empty() {
        let ctx = RequestContext::default();
        assert_eq!(resolver(nothing).resolve(&ctx).await, "/applications");

        let blank = RequestContext::default()
            .with_header("Origin", "")
            .with_header("X-Redirect-Url", "")
            .with_header("Referer", "");
        assert_eq!(resolver(nothing).resolve(&blank).await, "/applications");
    }
}
