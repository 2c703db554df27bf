use std::path::PathBuf;

use clause_server::{
    AppState, ServerConfig, app_router, config::EmbeddingBackend, protocol::RunResponse,
};
use serde_json::{Value, json};

/// Per-process directory the test server may read local documents from.
fn document_root() -> PathBuf {
    let root = std::env::temp_dir().join(format!("clause-server-docs-{}", std::process::id()));
    std::fs::create_dir_all(&root).expect("create document root");
    root
}

async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
    let mut config = ServerConfig {
        embedding: EmbeddingBackend::Hashing { dimension: 384 },
        ..ServerConfig::default()
    };
    config.rag.document_root = Some(document_root());
    spawn_with(config).await
}

async fn spawn_with(config: ServerConfig) -> (String, tokio::task::JoinHandle<()>) {
    let state = AppState::from_config(&config).expect("app state");
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    (format!("http://{}", addr), handle)
}

async fn write_document(name: &str, text: &str) -> PathBuf {
    let path = document_root().join(format!("{name}.txt"));
    tokio::fs::write(&path, text).await.expect("write test document");
    path
}

async fn run(base: &str, documents: &str, questions: &[&str]) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api/v1/hackrx/run", base))
        .json(&json!({ "documents": documents, "questions": questions }))
        .send()
        .await
        .expect("run response")
}

fn parse_answers(body: &RunResponse) -> Vec<Value> {
    body.answers
        .iter()
        .map(|a| serde_json::from_str(a).expect("answer is json"))
        .collect()
}

#[tokio::test]
async fn health_reports_ok() {
    let (base, handle) = spawn_server().await;

    let response = reqwest::get(format!("{}/health", base)).await.expect("health response");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("health json");
    assert_eq!(body["status"], "ok");

    handle.abort();
}

#[tokio::test]
async fn answers_every_question_in_order() {
    let (base, handle) = spawn_server().await;
    let path = write_document(
        "policy",
        "Cataract surgery has a 2-year waiting period. Cosmetic procedures are never covered.",
    )
    .await;

    let questions = [
        "Is cataract surgery covered after 1-month?",
        "Is knee replacement covered?",
        "Are cosmetic procedures covered?",
    ];
    let response = run(&base, &path.display().to_string(), &questions).await;
    assert!(response.status().is_success());

    let body: RunResponse = response.json().await.expect("run json");
    let answers = parse_answers(&body);
    assert_eq!(answers.len(), questions.len());
    assert_eq!(answers[0]["decision"], "Rejected");
    assert_eq!(answers[1]["decision"], "Approved");
    assert_eq!(answers[1]["amount"], "₹50,000");
    assert_eq!(answers[2]["decision"], "Rejected");
    assert!(answers.iter().all(|a| a["fallback"] == false));
    assert!(answers[0]["source"].as_str().unwrap().starts_with("Cataract surgery"));

    let _ = tokio::fs::remove_file(&path).await;
    handle.abort();
}

#[tokio::test]
async fn unreachable_document_is_answered_from_flagged_fallback() {
    let (base, handle) = spawn_server().await;

    let response = run(&base, "http://127.0.0.1:1/policy.pdf", &["Is cataract covered?", "Dental?"]).await;
    assert!(response.status().is_success());

    let body: RunResponse = response.json().await.expect("run json");
    let answers = parse_answers(&body);
    assert_eq!(answers.len(), 2);
    assert!(answers.iter().all(|a| a["fallback"] == true));
    assert!(answers[0]["source"].as_str().unwrap().starts_with("Sample fallback policy text."));

    handle.abort();
}

#[tokio::test]
async fn empty_document_still_answers_each_question() {
    let (base, handle) = spawn_server().await;
    let path = write_document("empty", "").await;

    let response = run(&base, &path.display().to_string(), &["Anything?", "Something?"]).await;
    assert!(response.status().is_success());

    let body: RunResponse = response.json().await.expect("run json");
    let answers = parse_answers(&body);
    assert_eq!(answers.len(), 2);
    assert!(answers.iter().all(|a| a["decision"] == "Undetermined"));

    let _ = tokio::fs::remove_file(&path).await;
    handle.abort();
}

#[tokio::test]
async fn malformed_request_is_a_client_error() {
    let (base, handle) = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/v1/hackrx/run", base))
        .json(&json!({ "questions": ["missing documents"] }))
        .send()
        .await
        .expect("run response");
    assert!(response.status().is_client_error());

    handle.abort();
}

#[tokio::test]
async fn files_outside_the_document_root_are_never_served() {
    let (base, handle) = spawn_server().await;

    let response = run(&base, "/etc/passwd", &["root"]).await;
    assert!(response.status().is_success());

    let body: RunResponse = response.json().await.expect("run json");
    let answers = parse_answers(&body);
    assert_eq!(answers[0]["fallback"], true);
    assert!(answers[0]["source"].as_str().unwrap().starts_with("Sample fallback policy text."));

    handle.abort();
}

#[tokio::test]
async fn local_files_need_a_configured_root() {
    let config = ServerConfig {
        embedding: EmbeddingBackend::Hashing { dimension: 384 },
        ..ServerConfig::default()
    };
    let (base, handle) = spawn_with(config).await;
    let path = write_document("unrooted", "Dental cleaning is covered twice a year.").await;

    let response = run(&base, &path.display().to_string(), &["Is dental covered?"]).await;
    let body: RunResponse = response.json().await.expect("run json");
    let answers = parse_answers(&body);
    assert_eq!(answers[0]["fallback"], true);

    let _ = tokio::fs::remove_file(&path).await;
    handle.abort();
}
