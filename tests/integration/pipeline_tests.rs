//! Integration tests for the harvest pipeline
//!
//! These tests use wiremock to create mock HTTP servers (and, for the
//! rotative strategy, a mock proxy) and test fetching and the full
//! harvest cycle end-to-end.

use chart_harvest::config::{parse_config, Config, StrategyKind};
use chart_harvest::crawler::{Fetcher, Harvester, RecordingPause};
use chart_harvest::output::{load_statistics, CsvSink, SqliteSink};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, extra_scraper: &str, extra_sections: &str) -> Config {
    parse_config(&format!(
        r#"
[scraper]
target-url = "{base_url}/chart/top/"
base-url = "{base_url}"
timeout-seconds = 5
delay-min = 0.0
delay-max = 0.0
{extra_scraper}

[cookies]
session-id = "143-4325845"

{extra_sections}
"#
    ))
    .expect("test config should parse")
}

fn chart_page(edges: &str) -> String {
    format!(
        r#"<html><head><script id="__NEXT_DATA__" type="application/json">
        {{"props":{{"pageProps":{{"pageData":{{"chartTitles":{{"edges":{}}}}}}}}}}}
        </script></head><body><h1>Top 250</h1></body></html>"#,
        edges
    )
}

fn edge(id: &str, title: &str, year: u32) -> String {
    format!(
        r#"{{"node":{{"id":"{id}","titleText":{{"text":"{title}"}},"releaseYear":{{"year":{year}}},
        "ratingsSummary":{{"aggregateRating":9.0}},"runtime":{{"seconds":7200}}}}}}"#
    )
}

fn detail_page(metascore: &str, actors: &[&str]) -> String {
    let cast: String = actors
        .iter()
        .map(|name| format!(r#"<a class="sc-10bde568-1 jBmamV" href="/name/nm0/">{}</a>"#, name))
        .collect();
    format!(
        r#"<html><body>
        <span class="sc-9fe7b0ef-0 hDuMnh metacritic-score-box">{}</span>
        <div class="sc-10bde568-7 bhMzVl">{}</div>
        </body></html>"#,
        metascore, cast
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_standard_fetch_sends_headers_and_cookies() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri(), "retries = 1", "");

    Mock::given(method("GET"))
        .and(path("/chart/top/"))
        .and(header("cookie", "session-id=143-4325845"))
        .and(header_exists("accept-language"))
        .and(header_exists("user-agent"))
        .respond_with(html(chart_page("[]")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut fetcher = Fetcher::from_config(&config, Arc::new(RecordingPause::new())).unwrap();
    let page = fetcher
        .fetch(&config.scraper.target_url)
        .await
        .expect("fetch should succeed");

    assert_eq!(page.raw.status, 200);
    assert!(page.raw.body.contains("Top 250"));
    assert_eq!(
        page.raw.content_type.as_deref(),
        Some("text/html; charset=utf-8")
    );
}

#[tokio::test]
async fn test_exhausted_retries_return_failure_after_backoff() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri(), "retries = 4", "");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(4)
        .mount(&mock_server)
        .await;

    let pause = Arc::new(RecordingPause::new());
    let mut fetcher = Fetcher::from_config(&config, pause.clone()).unwrap();
    let failure = fetcher
        .fetch(&config.scraper.target_url)
        .await
        .expect_err("every attempt fails");

    assert_eq!(failure.attempts, 4);
    assert!(failure.last_error.contains("500"));
    assert_eq!(
        pause.waits(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_secs(2)
        ]
    );
}

#[tokio::test]
async fn test_fetch_with_overrides_retries_and_cookies() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri(), "retries = 4", "");

    Mock::given(method("GET"))
        .and(header("cookie", "lc-main=en_US"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let pause = Arc::new(RecordingPause::new());
    let mut fetcher = Fetcher::from_config(&config, pause.clone()).unwrap();
    let cookies: BTreeMap<String, String> = [("lc-main".to_string(), "en_US".to_string())]
        .into_iter()
        .collect();

    let result = fetcher
        .fetch_with(&config.scraper.target_url, Some(&cookies), Some(2))
        .await;

    assert!(result.is_err());
    assert_eq!(pause.waits(), vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn test_rotative_fetch_moves_to_next_proxy() {
    let proxy_server = MockServer::start().await;

    // Requests arrive at the proxy in absolute form, so match on method only
    Mock::given(method("GET"))
        .respond_with(html(chart_page("[]")))
        .expect(1)
        .mount(&proxy_server)
        .await;

    let config = create_test_config(
        "http://chart.invalid",
        &format!(
            r#"strategy = "rotative"
retries = 3
proxies = ["http://127.0.0.1:1", "{}"]"#,
            proxy_server.uri()
        ),
        "",
    );

    let pause = Arc::new(RecordingPause::new());
    let mut fetcher = Fetcher::from_config(&config, pause.clone()).unwrap();
    assert_eq!(fetcher.strategy(), StrategyKind::Rotative);

    let page = fetcher
        .fetch(&config.scraper.target_url)
        .await
        .expect("second proxy should succeed");

    assert_eq!(page.raw.status, 200);
    assert_eq!(pause.waits(), vec![Duration::from_secs(1)]);

    let pool = fetcher.proxy_pool().unwrap();
    assert!(pool.entries().iter().all(|entry| entry.used));
    assert_eq!(pool.reset_count(), 1);
}

#[tokio::test]
async fn test_rotative_single_proxy_resets_when_exhausted() {
    let config = create_test_config(
        "http://chart.invalid",
        r#"strategy = "rotative"
retries = 3
proxies = ["http://127.0.0.1:1"]"#,
        "",
    );

    let mut fetcher = Fetcher::from_config(&config, Arc::new(RecordingPause::new())).unwrap();
    let result = fetcher.fetch(&config.scraper.target_url).await;

    assert!(result.is_err());
    // One reset at the start of the fetch, then one per exhausted selection
    assert_eq!(fetcher.proxy_pool().unwrap().reset_count(), 3);
}

#[tokio::test]
async fn test_full_harvest_to_csv_and_sqlite() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("out").join("movies.csv");
    let db_path = dir.path().join("movies.db");

    let config = create_test_config(&mock_server.uri(), "max-movies = 2\nretries = 2", "");

    let edges = format!(
        "[{},{},{}]",
        edge("tt0111161", "The Shawshank Redemption", 1994),
        edge("tt0068646", "The Godfather", 1972),
        edge("tt0468569", "The Dark Knight", 2008)
    );
    Mock::given(method("GET"))
        .and(path("/chart/top/"))
        .respond_with(html(chart_page(&edges)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/title/tt0111161/"))
        .respond_with(html(detail_page("82", &["Tim Robbins", "Morgan Freeman"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/title/tt0068646/"))
        .respond_with(html(detail_page("100", &["Marlon Brando", "Al Pacino"])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/title/tt0468569/"))
        .respond_with(html(detail_page("84", &["Christian Bale"])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut harvester = Harvester::new(config, Arc::new(RecordingPause::new()))
        .unwrap()
        .with_sink(Box::new(CsvSink::new(&csv_path)))
        .with_sink(Box::new(SqliteSink::open(&db_path).unwrap()));

    let report = harvester.run().await;

    let titles: Vec<&str> = report.movies.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["The Shawshank Redemption", "The Godfather"]);
    assert_eq!(report.movies[0].metascore.as_deref(), Some("82"));
    assert_eq!(report.movies[0].actors, vec!["Tim Robbins", "Morgan Freeman"]);
    assert_eq!(report.movies[1].duration_minutes, Some(120));
    assert_eq!(report.sinks.len(), 2);
    assert!(report.sinks.iter().all(|outcome| outcome.success));

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.contains("Marlon Brando|Al Pacino"));

    let stats = load_statistics(&SqliteSink::open(&db_path).unwrap()).unwrap();
    assert_eq!(stats.movies, 2);
    assert_eq!(stats.actors, 4);
    assert_eq!(stats.relations, 4);
}

#[tokio::test]
async fn test_failed_detail_fetch_keeps_list_fields() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri(), "retries = 1", "");

    Mock::given(method("GET"))
        .and(path("/chart/top/"))
        .respond_with(html(chart_page(&format!(
            "[{}]",
            edge("tt0050083", "12 Angry Men", 1957)
        ))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/title/tt0050083/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let mut harvester = Harvester::new(config, Arc::new(RecordingPause::new())).unwrap();
    let report = harvester.run().await;

    assert_eq!(report.movies.len(), 1);
    assert_eq!(report.movies[0].year, "1957");
    assert!(report.movies[0].actors.is_empty());
    assert!(report.movies[0].metascore.is_none());
}

#[tokio::test]
async fn test_sinks_from_output_section() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("movies.db");

    let config = create_test_config(
        &mock_server.uri(),
        "retries = 1",
        &format!("[output]\nsqlite-path = {:?}", db_path.display().to_string()),
    );

    Mock::given(method("GET"))
        .and(path("/chart/top/"))
        .respond_with(html(chart_page(&format!(
            "[{}]",
            edge("tt0110912", "Pulp Fiction", 1994)
        ))))
        .mount(&mock_server)
        .await;

    let mut harvester = Harvester::from_config(config).await.unwrap();
    let report = harvester.run().await;

    assert_eq!(report.sinks.len(), 1);
    assert_eq!(report.sinks[0].sink, "sqlite");
    assert!(report.sinks[0].success);
}

#[tokio::test]
async fn test_missing_structured_data_yields_no_movies() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri(), "retries = 1", "");

    Mock::given(method("GET"))
        .and(path("/chart/top/"))
        .respond_with(html("<html><body>Redesigned</body></html>".to_string()))
        .mount(&mock_server)
        .await;

    let mut harvester = Harvester::new(config, Arc::new(RecordingPause::new())).unwrap();
    let report = harvester.run().await;

    assert!(report.movies.is_empty());
    assert!(report.sinks.is_empty());
}
