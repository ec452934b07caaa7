// src/server.rs

//! HTTP surface serving the published per-show feeds.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /` | HTML index of every show feed |
//! | `GET /{slug}.xml` | the feed document, `text/xml` |
//!
//! `HEAD` is answered like `GET`; other methods get 405.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use chrono::DateTime;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::models::ShowFeed;
use crate::storage::FeedRegistry;
use crate::utils::entities::escape_text;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<FeedRegistry>,
}

pub fn router(registry: Arc<FeedRegistry>) -> Router {
    Router::new()
        .route("/", get(index).fallback(method_not_allowed))
        .route("/{file}", get(show_feed).fallback(method_not_allowed))
        .with_state(AppState { registry })
}

/// Serve on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<FeedRegistry>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Listening on http://{addr}");
    }
    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn index(State(state): State<AppState>, method: Method) -> Html<String> {
    let slugs = state.registry.list_slugs();
    log::info!("{method} / 200 (index, {} shows)", slugs.len());
    Html(render_index(&slugs))
}

async fn show_feed(
    State(state): State<AppState>,
    Path(file): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let slug = file.strip_suffix(".xml").unwrap_or(&file);
    let (outcome, response) = render_feed(&state.registry, slug, &headers);
    log::info!("{method} /{file} {} ({outcome})", response.status().as_u16());
    response
}

async fn method_not_allowed(method: Method, uri: Uri) -> (StatusCode, &'static str) {
    log::info!("{method} {} 405 (method not allowed)", uri.path());
    (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
}

fn render_index(slugs: &[String]) -> String {
    let mut html = String::from("<html>\n<body>\n<ul>");
    for slug in slugs {
        let slug = escape_text(slug);
        html.push_str(&format!("\n\t<li><a href=\"/{slug}.xml\">{slug}</a></li>"));
    }
    html.push_str("\n</ul>\n</body>\n</html>\n");
    html
}

fn render_feed(registry: &FeedRegistry, slug: &str, headers: &HeaderMap) -> (&'static str, Response) {
    let Some(snapshot) = registry.snapshot() else {
        return (
            "no snapshot yet",
            (StatusCode::SERVICE_UNAVAILABLE, "service unavailable").into_response(),
        );
    };
    let Some(feed) = snapshot.get(slug) else {
        return ("feed not found", (StatusCode::NOT_FOUND, "not found").into_response());
    };

    let last_modified = feed.pub_date.format(HTTP_DATE).to_string();
    if is_not_modified(headers, feed) {
        let headers = [(ETAG, feed.etag.clone()), (LAST_MODIFIED, last_modified)];
        return ("not modified", (StatusCode::NOT_MODIFIED, headers).into_response());
    }

    let headers = [
        (CONTENT_TYPE, "text/xml".to_string()),
        (ETAG, feed.etag.clone()),
        (LAST_MODIFIED, last_modified),
    ];
    ("show feed", (headers, feed.data.clone()).into_response())
}

/// `If-None-Match` wins over `If-Modified-Since` when both are present.
fn is_not_modified(headers: &HeaderMap, feed: &ShowFeed) -> bool {
    if let Some(tags) = headers.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok()) {
        return tags.split(',').map(str::trim).any(|tag| {
            tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == feed.etag
        });
    }

    headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .is_some_and(|since| feed.pub_date.timestamp() <= since.timestamp())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::body::to_bytes;
    use axum::http::HeaderValue;
    use bytes::Bytes;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{Snapshot, SplitStats};

    fn feed(slug: &str) -> ShowFeed {
        ShowFeed {
            slug: slug.to_string(),
            title: slug.to_string(),
            pub_date: Utc.with_ymd_and_hms(2025, 4, 2, 5, 31, 2).unwrap(),
            etag: "\"abc\"".to_string(),
            episode_count: 1,
            data: Bytes::from(format!("<rss>{slug}</rss>")),
        }
    }

    fn registry(slugs: &[&str]) -> Arc<FeedRegistry> {
        let registry = Arc::new(FeedRegistry::new());
        let feeds: BTreeMap<_, _> = slugs.iter().map(|s| (s.to_string(), feed(s))).collect();
        registry.replace(Snapshot::new(feeds, SplitStats::default()));
        registry
    }

    async fn get_feed(registry: Arc<FeedRegistry>, file: &str, headers: HeaderMap) -> Response {
        show_feed(
            State(AppState { registry }),
            Path(file.to_string()),
            Method::GET,
            headers,
        )
        .await
    }

    #[tokio::test]
    async fn test_feed_before_first_snapshot() {
        let response = get_feed(Arc::new(FeedRegistry::new()), "bad-friends.xml", HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_feed() {
        let response = get_feed(registry(&["bad-friends"]), "nope.xml", HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serve_feed() {
        let response = get_feed(registry(&["bad-friends"]), "bad-friends.xml", HeaderMap::new()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/xml");
        assert_eq!(headers[ETAG], "\"abc\"");
        assert_eq!(headers[LAST_MODIFIED], "Wed, 02 Apr 2025 05:31:02 GMT");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, "<rss>bad-friends</rss>");
    }

    #[tokio::test]
    async fn test_serve_feed_without_extension() {
        let response = get_feed(registry(&["bad-friends"]), "bad-friends", HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_if_none_match() {
        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"zzz\", \"abc\""));
        let response = get_feed(registry(&["a"]), "a.xml", headers).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"zzz\""));
        let response = get_feed(registry(&["a"]), "a.xml", headers).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let mut headers = HeaderMap::new();
        headers.insert(IF_MODIFIED_SINCE, HeaderValue::from_static("Wed, 02 Apr 2025 05:31:02 GMT"));
        let response = get_feed(registry(&["a"]), "a.xml", headers).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let mut headers = HeaderMap::new();
        headers.insert(IF_MODIFIED_SINCE, HeaderValue::from_static("Tue, 01 Apr 2025 00:00:00 GMT"));
        let response = get_feed(registry(&["a"]), "a.xml", headers).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (status, body) = method_not_allowed(Method::POST, Uri::from_static("/a.xml")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, "method not allowed");
    }

    #[test]
    fn test_render_index() {
        let html = render_index(&["bad-friends".to_string(), "a<b".to_string()]);
        assert!(html.contains("<li><a href=\"/bad-friends.xml\">bad-friends</a></li>"));
        assert!(html.contains("<a href=\"/a&lt;b.xml\">a&lt;b</a>"));
        assert_eq!(render_index(&[]), "<html>\n<body>\n<ul>\n</ul>\n</body>\n</html>\n");
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, registry(&["y-chromes"]), async move {
            let _ = rx.await;
        }));

        let client = reqwest::Client::new();
        let index = client.get(format!("http://{addr}/")).send().await.unwrap();
        assert_eq!(index.status(), 200);
        assert!(index.text().await.unwrap().contains("/y-chromes.xml"));

        let feed = client.get(format!("http://{addr}/y-chromes.xml")).send().await.unwrap();
        assert_eq!(feed.status(), 200);
        assert_eq!(feed.text().await.unwrap(), "<rss>y-chromes</rss>");

        let post = client.post(format!("http://{addr}/y-chromes.xml")).send().await.unwrap();
        assert_eq!(post.status(), 405);

        let delete = client.delete(format!("http://{addr}/")).send().await.unwrap();
        assert_eq!(delete.status(), 405);

        let head = client.head(format!("http://{addr}/y-chromes.xml")).send().await.unwrap();
        assert_eq!(head.status(), 200);

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
