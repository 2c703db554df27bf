//! Failure paths of the HTTP loader and the OpenAI provider against a local
//! socket standing in for the remote side.
#![cfg(any(feature = "http", feature = "openai"))]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Accepts connections and never answers them.
async fn silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// Reads one request (headers plus `Content-Length` body).
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= head_end + 4 + body_len {
            return;
        }
    }
}

/// Answers every request with `status` and a JSON `body`.
async fn canned_server(status: &'static str, body: String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let body = body.clone();
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

#[cfg(feature = "http")]
mod http_loader {
    use super::*;
    use clause_rag::{
        DocumentLoader, HttpDocumentLoader, LocatorLoader, RagConfig, RagError,
    };

    #[tokio::test]
    async fn unanswered_fetch_times_out() {
        let addr = silent_server().await;
        let loader = HttpDocumentLoader::new(Duration::from_millis(200), 100);

        let err = loader.load(&format!("http://{addr}/policy.pdf")).await.unwrap_err();
        assert!(matches!(err, RagError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_error() {
        let addr = canned_server("404 Not Found", String::new()).await;
        let loader = HttpDocumentLoader::new(Duration::from_secs(5), 100);

        let err = loader.load(&format!("http://{addr}/missing.pdf")).await.unwrap_err();
        match err {
            RagError::FetchError { message, .. } => assert!(message.contains("404"), "{message}"),
            other => panic!("expected FetchError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn body_is_cut_to_the_character_budget() {
        let addr = canned_server("200 OK", "x".repeat(10_000)).await;
        let loader = HttpDocumentLoader::new(Duration::from_secs(5), 12);

        let document = loader.load(&format!("http://{addr}/policy.txt")).await.unwrap();
        assert_eq!(document.text, "x".repeat(12));
    }

    #[tokio::test]
    async fn padded_url_reaches_the_server() {
        let addr = canned_server("404 Not Found", String::new()).await;
        let loader = LocatorLoader::from_config(&RagConfig::default());

        let err = loader.load(&format!("  http://{addr}/policy.pdf ")).await.unwrap_err();
        match err {
            RagError::FetchError { locator, message } => {
                assert_eq!(locator, format!("http://{addr}/policy.pdf"));
                assert!(message.contains("404"), "{message}");
            }
            other => panic!("expected FetchError, got {other:?}"),
        }
    }
}

#[cfg(feature = "openai")]
mod openai_provider {
    use super::*;
    use clause_rag::openai::OpenAIEmbeddingProvider;
    use clause_rag::{EmbeddingProvider, RagError};
    use serde_json::json;

    fn provider(addr: SocketAddr, dimension: usize) -> OpenAIEmbeddingProvider {
        OpenAIEmbeddingProvider::new("test-key")
            .unwrap()
            .with_endpoint(format!("http://{addr}/v1/embeddings"))
            .with_dimension(dimension)
    }

    #[tokio::test]
    async fn fewer_vectors_than_texts_is_a_count_mismatch() {
        let body = json!({ "data": [{ "index": 0, "embedding": [0.1, 0.2, 0.3, 0.4] }] });
        let addr = canned_server("200 OK", body.to_string()).await;

        let err = provider(addr, 4).embed(&["first", "second"]).await.unwrap_err();
        assert!(
            matches!(err, RagError::EmbeddingCountMismatch { expected: 2, actual: 1, .. }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn short_vector_is_a_dimension_mismatch() {
        let body = json!({ "data": [{ "index": 0, "embedding": [0.1, 0.2, 0.3] }] });
        let addr = canned_server("200 OK", body.to_string()).await;

        let err = provider(addr, 4).embed(&["only"]).await.unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 4, actual: 3 }), "got {err:?}");
    }

    #[tokio::test]
    async fn api_error_is_reported_as_unavailable() {
        let body = json!({ "error": { "message": "rate limited" } });
        let addr = canned_server("429 Too Many Requests", body.to_string()).await;

        let err = provider(addr, 4).embed(&["only"]).await.unwrap_err();
        match err {
            RagError::EmbeddingUnavailable { provider, message } => {
                assert_eq!(provider, "openai");
                assert!(message.contains("rate limited"), "{message}");
            }
            other => panic!("expected EmbeddingUnavailable, got {other:?}"),
        }
    }
}
