//! Wire-level checks for the HTTP clients against a one-shot local server.

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use proutgpt::ai::{ChatBackend, CompletionRequest, GatewayClient, HttpBackend, OllamaClient, VisitorCounter};
use proutgpt::error::ChatError;

/// Tests talk to 127.0.0.1 directly, whatever proxy the environment sets
fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Accepts one connection, answers with `status` and `body`, and hands back
/// the raw request it received.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{addr}"), handle)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn split_request(raw: &str) -> (String, Value) {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body).unwrap()
    };
    (head.to_lowercase(), body)
}

#[tokio::test]
async fn ollama_generate_posts_non_streaming_json() {
    let (url, server) = serve_once("200 OK", r#"{"response":"voici une blague","done":true}"#).await;

    let reply = OllamaClient::with_client(client(), &url).query("proutgpt:latest", "blague?").await.unwrap();
    assert_eq!(reply, "voici une blague");

    let (head, body) = split_request(&server.await.unwrap());
    assert!(head.starts_with("post /api/generate http/1.1"), "{head}");
    assert!(head.contains("content-type: application/json"));
    assert_eq!(body, json!({"model": "proutgpt:latest", "prompt": "blague?", "stream": false}));
}

#[tokio::test]
async fn ollama_tags_lists_model_names() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"models":[{"name":"a","size":1},{"name":"b","size":2}]}"#,
    )
    .await;

    let models = OllamaClient::with_client(client(), &url).list_models().await.unwrap();
    assert_eq!(models, vec!["a", "b"]);

    let (head, _) = split_request(&server.await.unwrap());
    assert!(head.starts_with("get /api/tags http/1.1"), "{head}");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (url, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;

    let err = OllamaClient::with_client(client(), &url).query("m", "p").await.unwrap_err();
    match err {
        ChatError::Status { status, .. } => assert_eq!(status.as_u16(), 500),
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let (url, _server) = serve_once("200 OK", r#"{"text":"wrong field"}"#).await;

    let err = GatewayClient::with_client(client(), &format!("{url}/generate"))
        .query("m1", "blague?")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn gateway_posts_prompt_and_model() {
    let (url, server) = serve_once("200 OK", r#"{"response":"pouet"}"#).await;

    let reply = GatewayClient::with_client(client(), &format!("{url}/api/hosted/generate"))
        .query("m1", "blague?")
        .await
        .unwrap();
    assert_eq!(reply, "pouet");

    let (head, body) = split_request(&server.await.unwrap());
    assert!(head.starts_with("post /api/hosted/generate http/1.1"), "{head}");
    assert!(head.contains("content-type: application/json"));
    assert_eq!(body, json!({"prompt": "blague?", "model": "m1"}));
}

#[tokio::test]
async fn visitor_counter_reads_value() {
    let (url, server) = serve_once("200 OK", r#"{"value":1337}"#).await;

    let count = VisitorCounter::with_client(client(), &format!("{url}/hit/proutgpt/visits")).hit().await.unwrap();
    assert_eq!(count, Some(1337));

    let (head, _) = split_request(&server.await.unwrap());
    assert!(head.starts_with("get /hit/proutgpt/visits http/1.1"), "{head}");
}

#[tokio::test]
async fn http_backend_routes_local_requests_to_the_server_address() {
    let (url, server) = serve_once("200 OK", r#"{"response":"local"}"#).await;
    let backend = HttpBackend::with_client(client(), "http://127.0.0.1:9/unused", "http://127.0.0.1:9/unused");

    let reply = backend
        .complete(&CompletionRequest::Local {
            server_address: url,
            model: "llama3.2:latest".to_string(),
            prompt: "salut".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(reply, "local");

    let (head, body) = split_request(&server.await.unwrap());
    assert!(head.starts_with("post /api/generate"), "{head}");
    assert_eq!(body["model"], "llama3.2:latest");
}
