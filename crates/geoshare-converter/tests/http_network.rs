//! Integration tests for `HttpNetwork` against a local `wiremock` server.

use reqwest::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use geoshare_converter::{HttpNetwork, Network, NetworkError};

const TEST_UA: &str = "geoshare-test/0.1";

fn test_network() -> HttpNetwork {
    HttpNetwork::new(5, 5, TEST_UA).expect("failed to build test HttpNetwork")
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{p}", server.uri())).unwrap()
}

// ---------------------------------------------------------------------------
// head_lookup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn head_lookup_returns_location_of_302() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/AbC123"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "https://www.google.com/maps/@52.5,13.2,11z"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = test_network().head_lookup(&url(&server, "/AbC123")).await;

    assert_eq!(
        result.unwrap().as_str(),
        "https://www.google.com/maps/@52.5,13.2,11z"
    );
}

#[tokio::test]
async fn head_lookup_resolves_relative_location() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/AbC123"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/maps/place/Louvre"))
        .mount(&server)
        .await;

    let result = test_network().head_lookup(&url(&server, "/AbC123")).await;

    assert_eq!(result.unwrap(), url(&server, "/maps/place/Louvre"));
}

#[tokio::test]
async fn head_lookup_rejects_non_302_statuses() {
    for status in [200_u16, 301, 404] {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/AbC123"))
            .respond_with(
                ResponseTemplate::new(status).insert_header("Location", "https://example.com/"),
            )
            .mount(&server)
            .await;

        let result = test_network().head_lookup(&url(&server, "/AbC123")).await;

        assert!(
            matches!(result, Err(NetworkError::UnexpectedStatus { status: s, .. }) if s == status),
            "status {status}: got {result:?}"
        );
    }
}

#[tokio::test]
async fn head_lookup_without_location_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/AbC123"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;

    let result = test_network().head_lookup(&url(&server, "/AbC123")).await;

    assert!(
        matches!(result, Err(NetworkError::MissingLocation { .. })),
        "got {result:?}"
    );
}

// ---------------------------------------------------------------------------
// fetch_body
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_body_returns_page_and_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/place/Louvre"))
        .and(header("user-agent", TEST_UA))
        .respond_with(ResponseTemplate::new(200).set_body_string("[null,null,48.86,2.33]"))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_network()
        .fetch_body(&url(&server, "/maps/place/Louvre"))
        .await;

    assert_eq!(result.unwrap(), "[null,null,48.86,2.33]");
}

#[tokio::test]
async fn fetch_body_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&server)
        .await;

    let result = test_network().fetch_body(&url(&server, "/old")).await;

    assert_eq!(result.unwrap(), "moved here");
}

#[tokio::test]
async fn fetch_body_rejects_non_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = test_network().fetch_body(&url(&server, "/missing")).await;

    assert!(
        matches!(result, Err(NetworkError::UnexpectedStatus { status: 404, .. })),
        "got {result:?}"
    );
}
