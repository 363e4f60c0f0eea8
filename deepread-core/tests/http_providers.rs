//! Integration tests for the HTTP provider clients against local axum servers.

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::IntoResponse;
use deepread_core::config::{GenerationConfig, ReaderConfig, SearchConfig, SearchResponseFormat};
use deepread_core::error::{ProviderError, ProviderKind};
use deepread_core::providers::{
    GenerationProvider, HttpReaderProvider, HttpSearchProvider, OpenAiGenerationProvider,
    ReaderProvider, SearchProvider,
};
use deepread_core::types::{ChatMessage, CompletionRequest};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Recorded {
    method: Method,
    uri: String,
    headers: HeaderMap,
    body: String,
}

struct Stub {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    requests: Mutex<Vec<Recorded>>,
}

impl Stub {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn only_request(&self) -> Recorded {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.into_iter().next().unwrap()
    }
}

async fn handle(
    State(stub): State<Arc<Stub>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    stub.requests.lock().unwrap().push(Recorded {
        method,
        uri: uri.to_string(),
        headers,
        body,
    });
    (
        stub.status,
        [(header::CONTENT_TYPE, stub.content_type)],
        stub.body.clone(),
    )
}

/// Serve one canned response for every request; returns the base URL.
async fn spawn_stub(status: StatusCode, content_type: &'static str, body: &str) -> (String, Arc<Stub>) {
    let stub = Arc::new(Stub {
        status,
        content_type,
        body: body.to_string(),
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new().fallback(handle).with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), stub)
}

fn header_value<'a>(request: &'a Recorded, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|v| v.to_str().ok())
}

fn search_config(base_url: &str) -> SearchConfig {
    SearchConfig {
        base_url: base_url.to_string(),
        api_key: Some("jina-test".into()),
        ..Default::default()
    }
}

const SEARCH_LISTING: &str = "\
[1] Title: Rust async book
[1] URL Source: https://rust-lang.github.io/async-book/
[1] Description: Asynchronous programming in Rust
[1] Date: 2024-05-01

[2] Title: Tokio tutorial
[2] URL Source: https://tokio.rs/tokio/tutorial
";

// --- search ---

#[tokio::test]
async fn test_search_sends_expected_request() {
    let (base, stub) = spawn_stub(StatusCode::OK, "text/plain", SEARCH_LISTING).await;
    let provider = HttpSearchProvider::new(&search_config(&base)).unwrap();

    let results = provider.search("rust async").await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Rust async book");
    assert_eq!(results[0].published_date.as_deref(), Some("2024-05-01"));
    assert_eq!(results[1].description, "No description available");

    let request = stub.only_request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.uri, "/rust%20async");
    assert_eq!(header_value(&request, "authorization"), Some("Bearer jina-test"));
    assert_eq!(header_value(&request, "x-respond-with"), Some("no-content"));
    assert_ne!(header_value(&request, "accept"), Some("application/json"));
    assert!(header_value(&request, "user-agent").unwrap().starts_with("deepread/"));
}

#[tokio::test]
async fn test_search_json_format() {
    let body = serde_json::json!({
        "code": 200,
        "data": [
            {"title": "Structured", "url": "https://example.com/s", "content": "Short content"},
            {"title": "", "url": "https://example.com/untitled"},
            {"title": "No link"}
        ]
    })
    .to_string();
    let (base, stub) = spawn_stub(StatusCode::OK, "application/json", &body).await;
    let mut config = search_config(&base);
    config.response_format = SearchResponseFormat::Json;
    let provider = HttpSearchProvider::new(&config).unwrap();

    let results = provider.search("structured").await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].description, "Short content...");
    assert_eq!(results[1].title, "Untitled");
    assert_eq!(results[1].description, "No description available");
    assert_eq!(
        header_value(&stub.only_request(), "accept"),
        Some("application/json")
    );
}

#[tokio::test]
async fn test_search_error_status() {
    let (base, _stub) = spawn_stub(StatusCode::TOO_MANY_REQUESTS, "text/plain", "slow down").await;
    let provider = HttpSearchProvider::new(&search_config(&base)).unwrap();

    match provider.search("rust").await {
        Err(ProviderError::Transport {
            provider,
            status,
            reason,
        }) => {
            assert_eq!(provider, ProviderKind::Search);
            assert_eq!(status, 429);
            assert_eq!(reason, "Too Many Requests");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_without_key_omits_authorization() {
    let (base, stub) = spawn_stub(StatusCode::OK, "text/plain", "").await;
    let config = SearchConfig {
        base_url: base,
        api_key_env: "DEEPREAD_TEST_UNSET_JINA_KEY".into(),
        ..Default::default()
    };
    let provider = HttpSearchProvider::new(&config).unwrap();

    let results = provider.search("nothing").await.unwrap();
    assert!(results.is_empty());
    assert!(header_value(&stub.only_request(), "authorization").is_none());
}

#[tokio::test]
async fn test_search_unreachable_host() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = HttpSearchProvider::new(&search_config(&format!("http://{addr}"))).unwrap();
    let err = provider.search("rust").await.unwrap_err();
    assert!(matches!(err, ProviderError::Request { .. }));
    assert!(!err.is_transport());
}

// --- reader ---

#[tokio::test]
async fn test_reader_strips_headers() {
    let page = "Title: Understanding Ownership\n\
URL Source: https://doc.rust-lang.org/book/ch04-00.html\n\
Published Time: 2024-02-10\n\
Markdown Content:\n\
Ownership is Rust's most unique feature.\n\
\n\
It enables memory safety without a garbage collector.";
    let (base, stub) = spawn_stub(StatusCode::OK, "text/plain", page).await;
    let provider = HttpReaderProvider::new(&ReaderConfig {
        base_url: base,
        api_key: Some("jina-test".into()),
        ..Default::default()
    })
    .unwrap();

    let doc = provider
        .read("https://doc.rust-lang.org/book/ch04-00.html")
        .await
        .unwrap();

    assert_eq!(doc.title, "Understanding Ownership");
    assert_eq!(doc.url, "https://doc.rust-lang.org/book/ch04-00.html");
    assert_eq!(doc.published_time.as_deref(), Some("2024-02-10"));
    assert_eq!(
        doc.body,
        "Ownership is Rust's most unique feature.\n\nIt enables memory safety without a garbage collector."
    );

    let request = stub.only_request();
    assert_eq!(request.uri, "/https://doc.rust-lang.org/book/ch04-00.html");
    assert_eq!(header_value(&request, "authorization"), Some("Bearer jina-test"));
}

#[tokio::test]
async fn test_reader_error_status() {
    let (base, _stub) = spawn_stub(StatusCode::BAD_GATEWAY, "text/plain", "upstream down").await;
    let provider = HttpReaderProvider::new(&ReaderConfig {
        base_url: base,
        ..Default::default()
    })
    .unwrap();

    match provider.read("https://example.com/a").await {
        Err(ProviderError::Transport {
            provider, status, ..
        }) => {
            assert_eq!(provider, ProviderKind::Reader);
            assert_eq!(status, 502);
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reader_rejects_relative_url_without_request() {
    let (base, stub) = spawn_stub(StatusCode::OK, "text/plain", "Title: x").await;
    let provider = HttpReaderProvider::new(&ReaderConfig {
        base_url: base,
        ..Default::default()
    })
    .unwrap();

    let err = provider.read("/just/a/path").await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidUrl { .. }));
    assert!(stub.requests().is_empty());
}

// --- generation ---

fn completion_request() -> CompletionRequest {
    CompletionRequest {
        messages: vec![ChatMessage::system("You are terse."), ChatMessage::user("Summarize.")],
        temperature: 0.3,
        max_tokens: Some(4000),
        model: None,
    }
}

#[tokio::test]
async fn test_generation_round_trip() {
    let body = serde_json::json!({
        "id": "chatcmpl-1",
        "model": "gpt-4-0613",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "1. EXECUTIVE SUMMARY\nDone."},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 42, "completion_tokens": 7}
    })
    .to_string();
    let (base, stub) = spawn_stub(StatusCode::OK, "application/json", &body).await;
    let provider = OpenAiGenerationProvider::new(&GenerationConfig {
        base_url: format!("{base}/v1"),
        ..Default::default()
    })
    .unwrap();

    let response = provider
        .complete(completion_request(), "sk-test")
        .await
        .unwrap();

    assert_eq!(response.text, "1. EXECUTIVE SUMMARY\nDone.");
    assert_eq!(response.model, "gpt-4-0613");
    assert_eq!(response.usage.total(), 49);

    let request = stub.only_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.uri, "/v1/chat/completions");
    assert_eq!(header_value(&request, "authorization"), Some("Bearer sk-test"));
    let sent: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(sent["model"], "gpt-4");
    assert_eq!(sent["max_tokens"], 4000);
    assert_eq!(sent["messages"][0]["role"], "system");
    assert_eq!(sent["messages"][1]["content"], "Summarize.");
}

#[tokio::test]
async fn test_generation_error_status() {
    let (base, _stub) = spawn_stub(
        StatusCode::UNAUTHORIZED,
        "application/json",
        r#"{"error":{"message":"Incorrect API key provided"}}"#,
    )
    .await;
    let provider = OpenAiGenerationProvider::new(&GenerationConfig {
        base_url: base,
        ..Default::default()
    })
    .unwrap();

    let err = provider
        .complete(completion_request(), "sk-wrong")
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.to_string(), "generation provider returned 401 Unauthorized");
}

#[tokio::test]
async fn test_generation_malformed_body() {
    let (base, _stub) = spawn_stub(StatusCode::OK, "application/json", "<html>oops</html>").await;
    let provider = OpenAiGenerationProvider::new(&GenerationConfig {
        base_url: base,
        ..Default::default()
    })
    .unwrap();

    let err = provider
        .complete(completion_request(), "sk-test")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::ResponseParse { .. }));
}
