//! HTTP adapter tests against a local mock server.

use questvoice_core::{
    CostLedgerPort, GenerationError, SpeechRequestId, SynthesisPort, SynthesisRequest,
};
use questvoice_synth::{HttpCostLedger, HttpSynthesisClient, LedgerClientConfig, SynthClientConfig};
use wiremock::matchers::{bearer_token, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MP3: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00frames";

fn speech() -> SynthesisRequest {
    SynthesisRequest {
        text: "The gate opens.".into(),
        voice_id: "narrator".into(),
        model_id: "tts-1".into(),
    }
}

fn synth_client(server: &MockServer) -> HttpSynthesisClient {
    HttpSynthesisClient::new(
        &SynthClientConfig::new(format!("{}/v1/speech", server.uri())).with_token("sk-test"),
    )
    .unwrap()
}

// ── Synthesis ──────────────────────────────────────────────────────

#[tokio::test]
async fn synthesis_returns_audio_clip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/speech"))
        .and(bearer_token("sk-test"))
        .and(body_json(serde_json::json!({
            "text": "The gate opens.",
            "voiceId": "narrator",
            "modelId": "tts-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(MP3, "audio/mpeg"))
        .expect(1)
        .mount(&server)
        .await;

    let clip = synth_client(&server).synthesize(&speech()).await.unwrap();

    assert_eq!(clip.bytes.as_ref(), MP3);
    assert_eq!(clip.content_type, "audio/mpeg");
}

#[tokio::test]
async fn synthesis_error_status_surfaces_json_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(serde_json::json!({ "error": "Too many requests" })),
        )
        .mount(&server)
        .await;

    let err = synth_client(&server).synthesize(&speech()).await.unwrap_err();

    assert_eq!(
        err,
        GenerationError::Endpoint {
            status: 429,
            message: "Too many requests".into()
        }
    );
}

#[tokio::test]
async fn synthesis_error_without_body_uses_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = synth_client(&server).synthesize(&speech()).await.unwrap_err();

    assert_eq!(
        err,
        GenerationError::Endpoint {
            status: 503,
            message: "Service Unavailable".into()
        }
    );
}

#[tokio::test]
async fn synthesis_rejects_non_audio_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "error": "voice not found" })),
        )
        .mount(&server)
        .await;

    let err = synth_client(&server).synthesize(&speech()).await.unwrap_err();

    assert!(matches!(err, GenerationError::NotAudio { content_type } if content_type.contains("json")));
}

#[tokio::test]
async fn synthesis_network_failure() {
    let server = MockServer::start().await;
    let client = synth_client(&server);
    drop(server);

    let err = client.synthesize(&speech()).await.unwrap_err();

    assert!(matches!(err, GenerationError::Network(_)));
}

#[test]
fn synthesis_invalid_endpoint() {
    let err = HttpSynthesisClient::new(&SynthClientConfig::new("not a url")).unwrap_err();
    assert!(matches!(err, GenerationError::Network(_)));
}

// ── Cost ledger ────────────────────────────────────────────────────

#[tokio::test]
async fn ledger_posts_idempotent_deduction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/credits/deduct"))
        .and(header("Idempotency-Key", "msg-3-abc"))
        .and(body_json(serde_json::json!({ "requestId": "msg-3-abc", "units": 1 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ledger =
        HttpCostLedger::new(&LedgerClientConfig::new(format!("{}/credits/deduct", server.uri())))
            .unwrap();

    ledger.deduct(&SpeechRequestId::new("msg-3-abc")).await.unwrap();
}

#[tokio::test]
async fn ledger_rejection_is_deduction_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(402)
                .set_body_json(serde_json::json!({ "error": "Insufficient credits" })),
        )
        .mount(&server)
        .await;

    let ledger = HttpCostLedger::new(&LedgerClientConfig::new(server.uri())).unwrap();
    let err = ledger.deduct(&SpeechRequestId::new("msg-1")).await.unwrap_err();

    assert_eq!(
        err,
        GenerationError::CostDeduction("Insufficient credits".into())
    );
}
