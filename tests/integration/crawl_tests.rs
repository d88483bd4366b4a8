//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small bisnis-style site and run full
//! sessions end-to-end over HTTP. Cancellation and timeout tests use an
//! in-memory transport whose later article requests never answer.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use warta::config::{Config, CrawlerConfig, HttpConfig, PolitenessConfig, RetryConfig};
use warta::crawler::{
    CategorySelector, Coordinator, CrawlRequest, FetchedPage, Transport, TransportError,
};
use warta::output::{write_session_json, ErrorKind, SessionSnapshot, SessionStatus};
use warta::state::FrontierState;
use warta::Site;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATE: &str = "2025-07-28";
const TEST_AGENT: &str = "WartaTest/1.0";

/// Creates a test configuration with no pacing and millisecond backoff
fn create_test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: 4,
            max_concurrent_frontiers: 2,
            queue_capacity: 16,
            max_consecutive_failures: 0,
            cancel_grace_ms: 100,
        },
        politeness: PolitenessConfig {
            min_request_spacing_ms: 0,
            max_in_flight_per_host: 8,
        },
        http: HttpConfig {
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
            user_agents: vec![TEST_AGENT.to_string()],
        },
        retry: RetryConfig {
            max_attempts: 3,
            initial_backoff_ms: 1,
            backoff_multiplier: 2,
        },
        ..Config::default()
    }
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn category_index() -> String {
    r#"<html><body><div class="indeks-kanal">
        <label class="indeks-radio"><input type="radio" name="kanal" onclick="location.href='/index?categoryId=43'"> Ekonomi</label>
    </div></body></html>"#
        .to_string()
}

fn listing(total_pages: u32, links: &[String]) -> String {
    let items: String = links
        .iter()
        .map(|l| format!(r#"<li><a class="artLink" href="{}">Judul</a></li>"#, l))
        .collect();
    format!(
        r#"<html><body><input type="hidden" id="total_page" value="{}"><ul>{}</ul></body></html>"#,
        total_pages, items
    )
}

fn article(title: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="detailsTitleCaption">{}</h1>
        <div class="detailsAttributeDates">Senin, 28 Juli 2025 | 10:15</div>
        <div class="detailsAuthor">
            <div class="detailsAuthorItem">Penulis : Annisa Nurul</div>
            <div class="detailsAuthorItem">Editor : Hendri Tri</div>
        </div>
        <article class="detailsContent">
            <p>Bisnis.com, JAKARTA - Nilai tukar rupiah ditutup menguat pada perdagangan hari ini.</p>
            <p>Baca Juga</p>
            <p>Indeks dolar AS terpantau melemah terhadap sejumlah mata uang utama dunia.</p>
        </article>
        </body></html>"#,
        title
    )
}

/// Mounts the category index and two hinted listing pages
async fn mount_site(server: &MockServer, page_one: &[String], page_two: &[String]) {
    // Listing mocks first: the index mock would match listing paths too
    Mock::given(method("GET"))
        .and(path("/index"))
        .and(query_param("categoryId", "43"))
        .and(query_param("page", "1"))
        .respond_with(html(listing(2, page_one)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/index"))
        .and(query_param("categoryId", "43"))
        .and(query_param("page", "2"))
        .respond_with(html(listing(2, page_two)))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/index"))
        .and(header("user-agent", TEST_AGENT))
        .respond_with(html(category_index()))
        .mount(server)
        .await;
}

async fn mount_article(server: &MockServer, id: u32, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/read/20250728/9/{}", id)))
        .respond_with(html(article(title)))
        .mount(server)
        .await;
}

fn article_url(server: &MockServer, id: u32) -> String {
    format!("{}/read/20250728/9/{}", server.uri(), id)
}

async fn run_session(server: &MockServer, request: CrawlRequest) -> SessionSnapshot {
    let adapter = Site::Bisnis
        .adapter(Some(&server.uri()))
        .expect("mock server URI is a valid base");
    Coordinator::new(create_test_config(), adapter)
        .expect("Failed to build coordinator")
        .run(request)
        .await
        .expect("Session failed")
}

#[tokio::test]
async fn test_full_crawl_two_pages() {
    let server = MockServer::start().await;
    mount_site(
        &server,
        &[article_url(&server, 1), article_url(&server, 2)],
        &[article_url(&server, 3), article_url(&server, 4)],
    )
    .await;
    for id in 1..=4 {
        mount_article(&server, id, &format!("Rupiah Menguat {}", id)).await;
    }

    let request = CrawlRequest::new(DATE)
        .with_categories(CategorySelector::Matching(vec!["Ekonomi".to_string()]));
    let snapshot = run_session(&server, request).await;

    assert_eq!(snapshot.metadata.status, SessionStatus::Completed);
    assert_eq!(snapshot.metadata.total_requested, 4);
    assert_eq!(snapshot.metadata.total_succeeded, 4);
    assert_eq!(snapshot.metadata.total_failed, 0);
    assert_eq!(snapshot.articles.len(), 4);
    assert!(snapshot.errors.is_empty());
    assert!(snapshot.discovery_errors.is_empty());

    assert_eq!(snapshot.categories_requested.len(), 1);
    assert_eq!(snapshot.categories_requested[0].id, "43");
    assert_eq!(snapshot.articles_in("43").count(), 4);

    let frontier = &snapshot.frontiers[0];
    assert_eq!(frontier.state, FrontierState::Exhausted);
    assert_eq!(frontier.pages_fetched, 2);
    assert_eq!(frontier.page_hint, Some(2));

    let article = &snapshot.articles[0];
    assert_eq!(article.author, "Annisa Nurul");
    assert_eq!(article.editor, "Hendri Tri");
    assert_eq!(article.content.len(), 2, "short paragraphs are dropped");
    assert!(article.extraction_warnings.contains("images"));
}

#[tokio::test]
async fn test_failed_articles_are_recorded_once() {
    let server = MockServer::start().await;
    mount_site(
        &server,
        &[article_url(&server, 1), article_url(&server, 2)],
        &[article_url(&server, 3)],
    )
    .await;
    mount_article(&server, 1, "Berhasil").await;

    Mock::given(method("GET"))
        .and(path("/read/20250728/9/2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/read/20250728/9/3"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let snapshot = run_session(&server, CrawlRequest::new(DATE)).await;

    assert_eq!(snapshot.metadata.total_requested, 3);
    assert_eq!(snapshot.articles.len(), 1);
    assert_eq!(snapshot.errors.len(), 2);

    let mut attempts: HashMap<String, u32> = HashMap::new();
    for error in &snapshot.errors {
        assert_eq!(error.error_kind, ErrorKind::Network);
        assert_eq!(error.category.id, "43");
        attempts.insert(error.url.clone(), error.attempts);
    }
    assert_eq!(attempts[&article_url(&server, 2)], 1);
    assert_eq!(attempts[&article_url(&server, 3)], 3);
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let server = MockServer::start().await;
    mount_site(
        &server,
        &[article_url(&server, 1), article_url(&server, 2)],
        &[
            format!("{}#komentar", article_url(&server, 1)),
            format!("{}/", article_url(&server, 2)),
        ],
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/read/20250728/9/1"))
        .respond_with(html(article("Satu")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/read/20250728/9/2"))
        .respond_with(html(article("Dua")))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = run_session(&server, CrawlRequest::new(DATE)).await;

    assert_eq!(snapshot.metadata.total_requested, 2);
    assert_eq!(snapshot.articles.len() + snapshot.errors.len(), 2);
    assert_eq!(snapshot.seen_urls.len(), 2);
}

#[tokio::test]
async fn test_unreachable_index_yields_discovery_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let snapshot = run_session(&server, CrawlRequest::new(DATE)).await;

    assert_eq!(snapshot.metadata.status, SessionStatus::Completed);
    assert_eq!(snapshot.metadata.total_requested, 0);
    assert_eq!(snapshot.discovery_errors.len(), 1);
    assert_eq!(snapshot.discovery_errors[0].error_kind, ErrorKind::Discovery);
    assert_eq!(snapshot.discovery_errors[0].attempts, 3);
}

#[tokio::test]
async fn test_list_categories_sends_user_agent() {
    let server = MockServer::start().await;
    mount_site(&server, &[], &[]).await;

    let adapter = Site::Bisnis.adapter(Some(&server.uri())).unwrap();
    let coordinator = Coordinator::new(create_test_config(), adapter).unwrap();
    let categories = coordinator.discover().await.unwrap();

    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Ekonomi");
    assert_eq!(categories[0].slug, "ekonomi");
}

#[tokio::test]
async fn test_session_export() {
    let server = MockServer::start().await;
    mount_site(&server, &[article_url(&server, 1)], &[]).await;
    mount_article(&server, 1, "Ekspor").await;

    let snapshot = run_session(&server, CrawlRequest::new(DATE)).await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("out").join("bisnis_2025-07-28.json");
    write_session_json(&snapshot, &file).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(json["metadata"]["totalRequested"], 1);
    assert_eq!(json["metadata"]["dateFilter"], DATE);
    assert_eq!(json["metadata"]["status"], "Completed");
    assert_eq!(json["articles"][0]["title"], "Ekspor");
    assert!(json["articles"][0]["scrapedAt"].is_string());
    assert!(json["discoveryErrors"].as_array().unwrap().is_empty());
}

/// Serves the bisnis index and one listing page from memory
///
/// Articles 1 and 2 answer at once; every other article never answers.
#[derive(Debug)]
struct StallingTransport {
    index: String,
    listing: String,
    answered: AtomicUsize,
    on_answered: Option<(usize, CancellationToken)>,
}

impl StallingTransport {
    fn new(cancel_after: Option<(usize, CancellationToken)>) -> Self {
        let links: Vec<String> = (1..=4)
            .map(|id| format!("http://stall.test/read/20250728/9/{}", id))
            .collect();
        Self {
            index: category_index(),
            listing: listing(1, &links),
            answered: AtomicUsize::new(0),
            on_answered: cancel_after,
        }
    }
}

#[async_trait]
impl Transport for StallingTransport {
    async fn get(&self, url: &str) -> Result<FetchedPage, TransportError> {
        let body = if url.contains("categoryId=43") {
            self.listing.clone()
        } else if url.ends_with("/index") {
            self.index.clone()
        } else if url.ends_with("/9/1") || url.ends_with("/9/2") {
            let answered = self.answered.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((after, token)) = &self.on_answered {
                if answered == *after {
                    token.cancel();
                }
            }
            article("Cepat")
        } else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        Ok(FetchedPage {
            final_url: url.to_string(),
            status: 200,
            body,
        })
    }
}

fn stall_adapter() -> Arc<dyn warta::SiteAdapter> {
    Site::Bisnis.adapter(Some("http://stall.test")).unwrap()
}

#[tokio::test]
async fn test_cancellation_keeps_completed_outcomes() {
    let token = CancellationToken::new();
    let cancel_link = token.clone();
    let transport = Arc::new(StallingTransport::new(Some((2, token))));

    let coordinator = Coordinator::with_transport(create_test_config(), stall_adapter(), transport);
    let session_token = coordinator.cancellation_token();
    tokio::spawn(async move {
        cancel_link.cancelled().await;
        session_token.cancel();
    });

    let snapshot = tokio::time::timeout(
        Duration::from_secs(10),
        coordinator.run(CrawlRequest::new(DATE)),
    )
    .await
    .expect("cancelled session must finish")
    .unwrap();

    let m = &snapshot.metadata;
    assert_eq!(m.status, SessionStatus::Cancelled);
    assert_eq!(snapshot.articles.len(), 2);
    assert!(snapshot.errors.is_empty());
    assert!(m.total_requested >= 2 && m.total_requested <= 4);
    assert_eq!(m.total_abandoned, m.total_requested - 2);
}

#[tokio::test]
async fn test_timeout_ends_session() {
    let transport = Arc::new(StallingTransport::new(None));
    let coordinator = Coordinator::with_transport(create_test_config(), stall_adapter(), transport);

    let request = CrawlRequest::new(DATE).with_timeout(Some(Duration::from_millis(300)));
    let snapshot = tokio::time::timeout(Duration::from_secs(10), coordinator.run(request))
        .await
        .expect("timed out session must finish")
        .unwrap();

    assert_eq!(snapshot.metadata.status, SessionStatus::TimedOut);
    assert_eq!(snapshot.articles.len(), 2);
    assert_eq!(snapshot.metadata.total_requested, 4);
    assert_eq!(snapshot.metadata.total_abandoned, 2);
}
