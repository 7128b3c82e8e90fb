//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use site_harvester::config::{Config, CrawlerConfig, FetcherConfig, OutputConfig};
use site_harvester::crawler::{run_crawl, CrawlRequest, CrawlSummary};
use site_harvester::output::CrawlSummaryResponse;
use site_harvester::storage::{
    ContentRef, MemoryRecordStore, RecordStore, RunStatus, SqliteRecordStore,
};
use site_harvester::HarvestError;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &Path, max_concurrent_pages: usize) -> Config {
    Config {
        fetcher: FetcherConfig {
            timeout_secs: 2,
            connect_timeout_secs: 1,
            user_agent: "TestBot/1.0".to_string(),
            ..FetcherConfig::default()
        },
        crawler: CrawlerConfig {
            max_concurrent_pages,
            ..CrawlerConfig::default()
        },
        output: OutputConfig {
            content_dir: dir.join("scraped_files").to_string_lossy().into_owned(),
            database_path: dir.join("harvest.db").to_string_lossy().into_owned(),
        },
    }
}

async fn mount_html(server: &MockServer, p: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(p))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

async fn crawl(config: &Config, seed: &str, max_pages: i64) -> CrawlSummary {
    let request = CrawlRequest::new(seed, Some(max_pages)).expect("valid request");
    run_crawl(
        config,
        "test",
        &request,
        MemoryRecordStore::new(),
        CancellationToken::new(),
    )
    .await
    .expect("crawl failed")
}

fn visited(summary: &CrawlSummary, base: &str) -> Vec<String> {
    summary
        .pages
        .iter()
        .map(|p| p.url.trim_start_matches(base).to_string())
        .collect()
}

fn stored_file(config: &Config, content_ref: &ContentRef) -> Vec<u8> {
    std::fs::read(Path::new(&config.output.content_dir).join(content_ref.as_str()))
        .expect("content file missing")
}

#[tokio::test]
async fn test_three_page_chain_visited_in_order() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 4);

    mount_html(&server, "/", r#"<body>Start <a href="/a">A</a></body>"#.into()).await;
    mount_html(&server, "/a", r#"<body>Middle <a href="/b">B</a></body>"#.into()).await;
    mount_html(&server, "/b", r#"<body>End</body>"#.into()).await;

    let summary = crawl(&config, &format!("{}/", base), 10).await;

    assert_eq!(summary.pages_visited, 3);
    assert_eq!(visited(&summary, &base), vec!["/", "/a", "/b"]);

    let text = stored_file(&config, &summary.pages[0].content_ref);
    assert_eq!(String::from_utf8(text).unwrap(), "Start A");
}

#[tokio::test]
async fn test_budget_stops_before_remaining_links() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 4);

    mount_html(
        &server,
        "/",
        r#"<body>
            <a href="/l1">1</a><a href="/l2">2</a><a href="/l3">3</a>
            <a href="/l4">4</a><a href="/l5">5</a>
        </body>"#
            .into(),
    )
    .await;
    mount_html(&server, "/l1", "<body>one</body>".into()).await;
    for p in ["/l2", "/l3", "/l4", "/l5"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_string("<body>never</body>"))
            .expect(0)
            .mount(&server)
            .await;
    }

    let summary = crawl(&config, &format!("{}/", base), 2).await;

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(visited(&summary, &base), vec!["/", "/l1"]);
}

#[tokio::test]
async fn test_unreachable_seed_returns_empty_summary() {
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 4);
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let summary = crawl(&config, &format!("http://127.0.0.1:{}/", port), 10).await;

    assert_eq!(summary.pages_visited, 0);
    let response = serde_json::to_value(CrawlSummaryResponse::from(&summary)).unwrap();
    assert_eq!(response, serde_json::json!({ "scraped_pages": 0, "data": [] }));
}

#[tokio::test]
async fn test_invalid_budget_rejected_before_any_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for bad in [0, -5, 101] {
        let result = CrawlRequest::new(&format!("{}/", server.uri()), Some(bad));
        assert!(matches!(result, Err(HarvestError::InvalidInput(_))));
    }
}

#[tokio::test]
async fn test_failed_page_reduces_count_by_one() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 2);

    mount_html(
        &server,
        "/",
        r#"<body><a href="/ok1">1</a><a href="/broken">2</a><a href="/ok2">3</a></body>"#.into(),
    )
    .await;
    mount_html(&server, "/ok1", "<body>ok one</body>".into()).await;
    mount_html(&server, "/ok2", "<body>ok two</body>".into()).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let summary = crawl(&config, &format!("{}/", base), 10).await;

    assert_eq!(summary.pages_visited, 3);
    assert_eq!(visited(&summary, &base), vec!["/", "/ok1", "/ok2"]);
}

#[tokio::test]
async fn test_failed_image_omitted_and_page_kept() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 4);
    let png = b"\x89PNG\r\n\x1a\nfake-png".to_vec();

    mount_html(
        &server,
        "/",
        r#"<body>Gallery <img src="/good.png"><img src="/gone.png"></body>"#.into(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/good.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png.clone())
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let summary = crawl(&config, &format!("{}/", base), 1).await;

    assert_eq!(summary.pages_visited, 1);
    let images = &summary.pages[0].images;
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].source_url, format!("{}/good.png", base));
    assert!(images[0].content_ref.as_str().ends_with(".png"));
    assert_eq!(stored_file(&config, &images[0].content_ref), png);
}

#[tokio::test]
async fn test_shared_image_stored_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 1);

    mount_html(
        &server,
        "/",
        r#"<body>Home <img src="/logo.gif"><a href="/about">About</a></body>"#.into(),
    )
    .await;
    mount_html(&server, "/about", r#"<body>About us <img src="/logo.gif"></body>"#.into()).await;
    Mock::given(method("GET"))
        .and(path("/logo.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"GIF89a-logo".to_vec()))
        .mount(&server)
        .await;

    let summary = crawl(&config, &format!("{}/", base), 10).await;

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(
        summary.pages[0].images[0].content_ref,
        summary.pages[1].images[0].content_ref
    );

    // two text files and one image
    let files = std::fs::read_dir(&config.output.content_dir).unwrap().count();
    assert_eq!(files, 3);
}

#[tokio::test]
async fn test_cross_domain_links_never_fetched() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 4);

    // Same port space, different host name
    let other_port = url::Url::parse(&other.uri()).unwrap().port().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<body>other</body>"))
        .expect(0)
        .mount(&other)
        .await;

    mount_html(
        &server,
        "/",
        format!(
            r#"<body><a href="http://localhost:{}/elsewhere">Elsewhere</a><a href="/local">Local</a></body>"#,
            other_port
        ),
    )
    .await;
    mount_html(&server, "/local", "<body>local</body>".into()).await;

    let summary = crawl(&config, &format!("{}/", base), 10).await;

    assert_eq!(visited(&summary, &base), vec!["/", "/local"]);
}

#[tokio::test]
async fn test_concurrent_batches_keep_bfs_order() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<body><a href="/a">a</a><a href="/b">b</a><a href="/c">c</a></body>"#.into(),
    )
    .await;
    mount_html(&server, "/a", r#"<body><a href="/d">d</a></body>"#.into()).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<body><a href="/e">e</a></body>"#, "text/html")
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    mount_html(&server, "/c", "<body>c</body>".into()).await;
    mount_html(&server, "/d", "<body>d</body>".into()).await;
    mount_html(&server, "/e", "<body>e</body>".into()).await;

    for concurrency in [1, 3] {
        let temp = TempDir::new().unwrap();
        let config = create_test_config(temp.path(), concurrency);
        let summary = crawl(&config, &format!("{}/", base), 10).await;
        assert_eq!(
            visited(&summary, &base),
            vec!["/", "/a", "/b", "/c", "/d", "/e"],
            "concurrency {}",
            concurrency
        );
    }
}

#[tokio::test]
async fn test_records_persisted_to_sqlite() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 2);

    mount_html(
        &server,
        "/",
        r#"<body>Home <img src="/pic.gif"><a href="/next">Next</a></body>"#.into(),
    )
    .await;
    mount_html(&server, "/next", "<body>Next page</body>".into()).await;
    Mock::given(method("GET"))
        .and(path("/pic.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"GIF89a-pic".to_vec()))
        .mount(&server)
        .await;

    let db_path = Path::new(&config.output.database_path).to_path_buf();
    let request = CrawlRequest::new(&format!("{}/", base), Some(5)).unwrap();
    let records = SqliteRecordStore::new(&db_path).unwrap();
    let summary = run_crawl(&config, "abc123", &request, records, CancellationToken::new())
        .await
        .unwrap();

    let records = SqliteRecordStore::new(&db_path).unwrap();
    assert_eq!(records.count_pages().unwrap(), 2);
    assert_eq!(records.count_images().unwrap(), 1);
    assert_eq!(records.pages_for_run(summary.run_id).unwrap(), summary.pages);

    let run = records.get_run(summary.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.pages_visited, 2);
    assert_eq!(run.config_hash, "abc123");
}

#[tokio::test]
async fn test_cancelled_before_start_fetches_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 1);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<body>never</body>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let request = CrawlRequest::new(&format!("{}/", base), Some(10)).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = run_crawl(&config, "test", &request, MemoryRecordStore::new(), cancel)
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.pages_visited, 0);
}

/// Seed linking to a slow page and to a page that must never be fetched
async fn mount_slow_chain(server: &MockServer, delay: Duration) {
    mount_html(
        server,
        "/",
        r#"<body>Home <a href="/slow">Slow</a><a href="/after">After</a></body>"#.into(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<body>Slow page</body>", "text/html")
                .set_delay(delay),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/after"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<body>after</body>", "text/html"))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cancel_mid_crawl_returns_pages_so_far() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 1);
    mount_slow_chain(&server, Duration::from_millis(800)).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let db_path = Path::new(&config.output.database_path).to_path_buf();
    let request = CrawlRequest::new(&format!("{}/", base), Some(10)).unwrap();
    let records = SqliteRecordStore::new(&db_path).unwrap();
    let summary = run_crawl(&config, "test", &request, records, cancel)
        .await
        .unwrap();

    // The in-flight page finishes, the queued one is never requested
    assert!(summary.cancelled);
    assert_eq!(visited(&summary, &base), vec!["/", "/slow"]);

    let records = SqliteRecordStore::new(&db_path).unwrap();
    let run = records.get_run(summary.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);
    assert_eq!(run.pages_visited, 2);
    assert_eq!(records.pages_for_run(summary.run_id).unwrap(), summary.pages);
}

#[tokio::test]
async fn test_crawl_timeout_cancels_run() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let mut config = create_test_config(temp.path(), 1);
    config.fetcher.timeout_secs = 5;
    config.crawler.crawl_timeout_secs = Some(1);
    mount_slow_chain(&server, Duration::from_millis(1500)).await;

    let summary = crawl(&config, &format!("{}/", base), 10).await;

    assert!(summary.cancelled);
    assert_eq!(visited(&summary, &base), vec!["/", "/slow"]);
}

#[tokio::test]
async fn test_non_html_pages_skipped_and_charset_respected() {
    let server = MockServer::start().await;
    let base = server.uri();
    let temp = TempDir::new().unwrap();
    let config = create_test_config(temp.path(), 2);

    mount_html(
        &server,
        "/",
        r#"<body><a href="/photo.jpg">Photo</a><a href="/latin">Latin</a></body>"#.into(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/photo.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, b'J', b'F', b'I', b'F'])
                .insert_header("content-type", "image/jpeg"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"<body>Caf\xe9 cr\xe8me</body>".to_vec())
                .insert_header("content-type", "text/html; charset=iso-8859-1"),
        )
        .mount(&server)
        .await;

    let summary = crawl(&config, &format!("{}/", base), 10).await;

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(visited(&summary, &base), vec!["/", "/latin"]);
    let text = stored_file(&config, &summary.pages[1].content_ref);
    assert_eq!(String::from_utf8(text).unwrap(), "Caf\u{e9} cr\u{e8}me");
}

#[tokio::test]
async fn test_unwritable_content_dir_is_fatal() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let mut config = create_test_config(temp.path(), 1);

    // A regular file where the content directory should be
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    config.output.content_dir = blocker.join("files").to_string_lossy().into_owned();

    let request = CrawlRequest::new(&format!("{}/", server.uri()), Some(1)).unwrap();
    let result = run_crawl(
        &config,
        "test",
        &request,
        MemoryRecordStore::new(),
        CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(HarvestError::Storage(_))));
}
