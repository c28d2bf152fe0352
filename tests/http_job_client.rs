//! HTTP job client tests against a mock translation server.

use futures_util::StreamExt;
use serde_json::json;
use subtrans::client::{HttpJobClient, JobBackend};
use subtrans::config::ServerConfig;
use subtrans::error::SubtransError;
use subtrans::session::{NoProgress, TranslationSession};
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORIGINAL: &str = "1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n2\r\n00:00:03,000 --> 00:00:04,000\r\nGoodbye\r\n\r\n";

fn sse_delta(content: &str) -> String {
    format!("data: {}\n\n", json!({ "choices": [{ "delta": { "content": content } }] }))
}

fn translation_events() -> String {
    let mut body = String::from("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    body.push_str(&sse_delta("[\"1\\n00:00:01,000 --> 00:00:02,000\\nHo"));
    body.push_str(&sse_delta("la\\n\\n\", \"2\\n00:00:03,000 --> 00:00:04,000\\nAdios\\n\\n\""));
    body.push_str(&sse_delta("]"));
    body.push_str("data: [DONE]\n\n");
    body
}

fn client_for(server: &MockServer) -> HttpJobClient {
    let config = ServerConfig {
        endpoint: format!("{}/", server.uri()),
        request_timeout_secs: 10,
    };
    HttpJobClient::new(&config).unwrap()
}

async fn mount_job(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "id": job_id })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(translation_events(), "text/event-stream"))
        .mount(server)
        .await;
}

async fn mount_content(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/content"))
        .and(body_string(json!({ "id": job_id }).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(ORIGINAL))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_submit_job_streams_reassembled_blocks() {
    let server = MockServer::start().await;
    mount_job(&server, "job-1").await;

    let client = client_for(&server);
    let mut stream = client.submit_job("job-1").await.unwrap();

    let mut chunks = Vec::new();
    while let Some(item) = stream.next().await {
        chunks.push(String::from_utf8(item.unwrap().to_vec()).unwrap());
    }

    assert_eq!(
        chunks,
        vec![
            "1\n00:00:01,000 --> 00:00:02,000\nHola\n\n".to_string(),
            "2\n00:00:03,000 --> 00:00:04,000\nAdios\n\n".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_fetch_content_returns_raw_text() {
    let server = MockServer::start().await;
    mount_content(&server, "job-1").await;

    let client = client_for(&server);
    assert_eq!(client.fetch_content("job-1").await.unwrap(), ORIGINAL);
}

#[tokio::test]
async fn test_non_success_status_is_a_job_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.submit_job("job-1").await.err().unwrap();
    match err {
        SubtransError::Job(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("upstream exploded"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_session_translates_job_end_to_end() {
    let server = MockServer::start().await;
    mount_job(&server, "job-9").await;
    mount_content(&server, "job-9").await;

    let session = TranslationSession::new(Box::new(client_for(&server)), Box::new(NoProgress));
    let outcome = session.run("job-9").await.unwrap();

    assert_eq!(
        outcome.srt,
        "1\n00:00:01,000 --> 00:00:02,000\nHola\n\n2\n00:00:03,000 --> 00:00:04,000\nAdios\n\n"
    );
    assert_eq!(
        outcome.pairs(),
        vec![(Some("Hello"), "Hola"), (Some("Goodbye"), "Adios")]
    );
}
