//! Integration tests for `fetch_trends` using wiremock HTTP mocks.

use marketmind_trends::{fetch_trends, TrendsConfig, TrendsError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed(titles: &[&str]) -> String {
    let items: String = titles
        .iter()
        .map(|t| format!("<item><title>{t}</title><description>{t} explained</description></item>"))
        .collect();
    format!(r#"<?xml version="1.0"?><rss version="2.0"><channel>{items}</channel></rss>"#)
}

fn config(base_url: &str, topics: &[&str], limit: usize) -> TrendsConfig {
    TrendsConfig {
        topics: topics.iter().map(ToString::to_string).collect(),
        limit,
        base_url: base_url.to_string(),
        ..TrendsConfig::default()
    }
}

#[tokio::test]
async fn merges_top_stories_and_topic_feeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss"))
        .and(query_param("hl", "en-US"))
        .and(query_param("gl", "US"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
            "Pancake Record Set",
            "Marathon Dog Finishes Race",
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rss/headlines/section/topic/TECHNOLOGY"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed(&[
            "Robot Learns To Juggle",
            "Pancake Record Set",
        ])))
        .mount(&server)
        .await;

    let trends = fetch_trends(&config(&server.uri(), &["TECHNOLOGY"], 10))
        .await
        .expect("feeds should parse");

    let titles: Vec<_> = trends.iter().map(|t| t.trend_title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Pancake Record Set",
            "Robot Learns To Juggle",
            "Marathon Dog Finishes Race"
        ]
    );
    assert_eq!(trends[0].trend_category, "Top Stories");
    assert_eq!(trends[1].trend_category, "Technology");
    assert_eq!(trends[2].trend_id, "3");
    assert_eq!(trends[1].trend_description, "Robot Learns To Juggle explained");
}

#[tokio::test]
async fn failing_topic_feed_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed(&["Only Story"])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rss/headlines/section/topic/WORLD"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let trends = fetch_trends(&config(&server.uri(), &["WORLD"], 10))
        .await
        .unwrap();
    assert_eq!(trends.len(), 1);
    assert_eq!(trends[0].trend_title, "Only Story");
}

#[tokio::test]
async fn all_feeds_failing_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = fetch_trends(&config(&server.uri(), &["WORLD"], 10))
        .await
        .unwrap_err();
    assert!(matches!(err, TrendsError::AllFeedsFailed { attempted: 2 }));
}
