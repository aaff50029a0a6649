//! End-to-end replay against a mock synthesis endpoint, rendering to files.

use std::path::PathBuf;
use std::time::Duration;

use questvoice_cli::{CliConfig, bootstrap, handlers};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MP3: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00frames";

const CRYPT: &str = r#"{
    "storyId": "crypt-01",
    "fresh": true,
    "messages": [
        { "position": 0, "author": "user", "content": "Begin." },
        { "position": 1, "author": "system", "content": "You wake in a **crypt**." },
        { "position": 2, "author": "user", "content": "I light a torch." },
        { "position": 3, "author": "system", "content": "Shadows flee. [[roll perception]]" }
    ]
}"#;

fn config(server: &MockServer, out_dir: PathBuf) -> CliConfig {
    CliConfig {
        endpoint: Some(format!("{}/speak", server.uri())),
        token: None,
        ledger_url: Some(format!("{}/deduct", server.uri())),
        ledger_token: None,
        settings_path: None,
        voice: None,
        out_dir,
        speaker: false,
    }
}

fn clip_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn story_autoplays_opener_and_latest() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/speak"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(MP3, "audio/mpeg"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/deduct"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let transcript = dir.path().join("crypt.json");
    std::fs::write(&transcript, CRYPT).unwrap();
    let out_dir = dir.path().join("clips");

    let ctx = bootstrap(&config(&server, out_dir.clone())).unwrap();
    tokio::time::timeout(
        Duration::from_secs(10),
        handlers::story::execute(&ctx, &transcript, Duration::ZERO),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(clip_count(&out_dir), 2);
    assert_eq!(ctx.session.engine().last_error(), None);
}

#[tokio::test]
async fn speak_reports_endpoint_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/speak"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": "engine offline" })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&server, dir.path().join("clips"));
    config.settings_path = Some(dir.path().join("fast.json"));
    std::fs::write(
        dir.path().join("fast.json"),
        r#"{"max_attempts": 1, "drain_delay_ms": 50}"#,
    )
    .unwrap();

    let ctx = bootstrap(&config).unwrap();
    let err = tokio::time::timeout(
        Duration::from_secs(10),
        handlers::speak::execute(&ctx, "The gate opens."),
    )
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.to_string().contains("engine offline"), "{err}");
    assert_eq!(clip_count(&dir.path().join("clips")), 0);
}
