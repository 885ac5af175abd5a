//! Gemini client tests against a mock HTTP server.
//!
//! Covers request formatting, structured-payload parsing, error mapping,
//! image extraction, and SSE stream consumption.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::GeminiConfig;
use crate::core::gemini::client::create_chat_session;
use crate::core::gemini::{CampaignRequest, GeminiClient, GeminiError, ImageSize, Tone};

const TEST_KEY: &str = "AIzaTestKey";

fn test_cfg(server: &MockServer) -> GeminiConfig {
    GeminiConfig {
        base_url: server.uri(),
        ..GeminiConfig::default()
    }
}

fn text_body(payload: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": payload }] }
        }]
    })
}

fn boots_request() -> CampaignRequest {
    CampaignRequest::new("Summer boots sale", "hikers", Tone::Exciting)
}

// =============================================================================
// Campaign text generation
// =============================================================================

#[tokio::test]
async fn test_generate_text_parses_structured_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:generateContent"))
        .and(header("x-goog-api-key", TEST_KEY))
        .and(body_string_contains("Summer boots sale"))
        .and(body_string_contains("Target Audience: hikers."))
        .and(body_string_contains("Tone: Exciting."))
        .and(body_string_contains("responseSchema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body(
            r#"{"subjectLines":["A","B","C"],"bodyCopy":"**Hi**","imagePrompt":"boots in mountains"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(TEST_KEY, &test_cfg(&server));
    let copy = client
        .generate_campaign_text(&boots_request())
        .await
        .expect("campaign copy");

    assert_eq!(copy.subject_lines, vec!["A", "B", "C"]);
    assert_eq!(copy.body_copy, "**Hi**");
    assert_eq!(copy.image_prompt, "boots in mountains");
}

#[tokio::test]
async fn test_generate_text_rejects_unparseable_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body("not json at all")))
        .mount(&server)
        .await;

    let client = GeminiClient::new(TEST_KEY, &test_cfg(&server));
    let result = client.generate_campaign_text(&boots_request()).await;
    assert!(matches!(result, Err(GeminiError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_generate_text_rejects_missing_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = GeminiClient::new(TEST_KEY, &test_cfg(&server));
    let result = client.generate_campaign_text(&boots_request()).await;
    assert!(matches!(result, Err(GeminiError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_generate_text_rejects_empty_subject_lines() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_body(
            r#"{"subjectLines":[],"bodyCopy":"**Hi**","imagePrompt":"boots"}"#,
        )))
        .mount(&server)
        .await;

    let client = GeminiClient::new(TEST_KEY, &test_cfg(&server));
    let result = client.generate_campaign_text(&boots_request()).await;
    assert!(matches!(result, Err(GeminiError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_generate_text_maps_credential_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:generateContent"))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(TEST_KEY, &test_cfg(&server));
    let error = client
        .generate_campaign_text(&boots_request())
        .await
        .expect_err("auth error");
    assert!(matches!(error, GeminiError::Auth(_)));
    assert!(error.is_credential_failure());
}

#[tokio::test]
async fn test_generate_text_maps_service_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(TEST_KEY, &test_cfg(&server));
    let error = client
        .generate_campaign_text(&boots_request())
        .await
        .expect_err("api error");
    assert!(matches!(error, GeminiError::Api { status: 503, .. }));
    assert!(!error.is_credential_failure());
}

// =============================================================================
// Campaign image generation
// =============================================================================

#[tokio::test]
async fn test_generate_image_extracts_inline_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-image-preview:generateContent"))
        .and(header("x-goog-api-key", TEST_KEY))
        .and(body_string_contains("boots in mountains"))
        .and(body_string_contains("2K"))
        .and(body_string_contains("4:3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your visual" },
                        { "inlineData": { "mimeType": "image/png", "data": "aGVsbG8=" } }
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(TEST_KEY, &test_cfg(&server));
    let image = client
        .generate_campaign_image("boots in mountains", ImageSize::TwoK)
        .await
        .expect("image");

    assert_eq!(image.size, ImageSize::TwoK);
    assert_eq!(image.decode().expect("decode"), b"hello");
}

#[tokio::test]
async fn test_generate_image_without_inline_part() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-image-preview:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "no image today" }] }
            }]
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(TEST_KEY, &test_cfg(&server));
    let result = client
        .generate_campaign_image("boots in mountains", ImageSize::OneK)
        .await;
    assert!(matches!(result, Err(GeminiError::NoImageReturned)));
}

// =============================================================================
// Chat streaming
// =============================================================================

fn sse_fragment(text: &str) -> String {
    format!(
        "data: {}\n\n",
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] }
            }]
        })
    )
}

#[tokio::test]
async fn test_chat_stream_delivers_fragments_in_order() {
    let server = MockServer::start().await;
    let sse_body = format!(
        "{}{}{}",
        sse_fragment("Hel"),
        sse_fragment("lo wor"),
        sse_fragment("ld")
    );
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", TEST_KEY))
        .and(body_string_contains("systemInstruction"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let session = create_chat_session(&test_cfg(&server), "You are a helpful assistant.");
    let mut rx = session
        .send_streamed(TEST_KEY, "Hello?")
        .await
        .expect("stream");

    let mut fragments = Vec::new();
    while let Some(item) = rx.recv().await {
        fragments.push(item.expect("fragment"));
    }

    assert_eq!(fragments, vec!["Hel", "lo wor", "ld"]);
    assert_eq!(fragments.concat(), "Hello world");

    // The exchange was committed to the session history on clean completion
    assert_eq!(session.history_len().await, 2);
}

#[tokio::test]
async fn test_chat_stream_carries_history_forward() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_fragment("Sure!"), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let session = create_chat_session(&test_cfg(&server), "persona");

    let mut rx = session.send_streamed(TEST_KEY, "first").await.expect("stream");
    while rx.recv().await.is_some() {}
    assert_eq!(session.history_len().await, 2);

    let mut rx = session.send_streamed(TEST_KEY, "second").await.expect("stream");
    while rx.recv().await.is_some() {}
    assert_eq!(session.history_len().await, 4);
}

#[tokio::test]
async fn test_chat_stream_rejected_key_fails_fast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-3-pro-preview:streamGenerateContent"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bad key"))
        .mount(&server)
        .await;

    let session = create_chat_session(&test_cfg(&server), "persona");
    let error = session
        .send_streamed(TEST_KEY, "Hello?")
        .await
        .expect_err("auth error");
    assert!(error.is_credential_failure());

    // A failed send never pollutes the session context
    assert_eq!(session.history_len().await, 0);
}
