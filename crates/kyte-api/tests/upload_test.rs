//! Upload route integration tests.
//!
//! Run with: `cargo test -p kyte-api --test upload_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use helpers::doubles::{DeriveBehavior, FakeDeriver, FakeStore, FAKE_PLACEHOLDER};
use helpers::{fixtures, setup_test_app};
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use std::time::Duration;

const UPLOAD: &str = "/api/images/upload";

fn form(data: Vec<u8>, filename: &str, mime: &str, is_avatar: Option<&str>) -> MultipartForm {
    let part = Part::bytes(Bytes::from(data))
        .file_name(filename.to_string())
        .mime_type(mime.to_string());
    let form = MultipartForm::new().add_part("file", part);
    match is_avatar {
        Some(flag) => form.add_text("isAvatar", flag.to_string()),
        None => form,
    }
}

async fn upload(client: &TestServer, form: MultipartForm) -> (u16, Value) {
    let response = client.post(UPLOAD).multipart(form).await;
    (response.status_code().as_u16(), response.json::<Value>())
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_without_network_calls() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (status, body) = upload(
        app.client(),
        form(fixtures::blob(12 * 1024 * 1024), "big.jpg", "image/jpeg", None),
    )
    .await;

    assert_eq!(status, 413);
    assert_eq!(body, json!({ "error": "file too large" }));
    assert_eq!(app.store.acquires(), 0);
    assert_eq!(app.store.transmits(), 0);
    assert_eq!(app.deriver.call_count(), 0);
}

#[tokio::test]
async fn test_file_just_over_ceiling_is_rejected_by_validator() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (status, body) = upload(
        app.client(),
        form(fixtures::blob(10 * 1024 * 1024 + 1), "edge.png", "image/png", Some("true")),
    )
    .await;

    assert_eq!(status, 413);
    assert_eq!(body, json!({ "error": "file too large" }));
    assert_eq!(app.store.acquires(), 0);
}

#[tokio::test]
async fn test_unsupported_media_type_is_rejected_without_network_calls() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (status, body) = upload(
        app.client(),
        form(b"hello".to_vec(), "notes.txt", "text/plain", None),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "unsupported media type" }));
    assert_eq!(app.store.acquires(), 0);
}

#[tokio::test]
async fn test_empty_file_is_rejected() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (status, body) = upload(app.client(), form(Vec::new(), "a.png", "image/png", None)).await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "empty file" }));
    assert_eq!(app.store.acquires(), 0);
}

#[tokio::test]
async fn test_avatar_upload_returns_url_and_placeholder() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (status, body) = upload(
        app.client(),
        form(
            fixtures::create_padded_png(2 * 1024 * 1024),
            "me.png",
            "image/png",
            Some("true"),
        ),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "imageURL": "https://imagedelivery.net/test-hash/img-0/public",
            "blurpfp": FAKE_PLACEHOLDER,
        })
    );
    assert_eq!(app.store.acquires(), 1);
    assert_eq!(app.store.transmits(), 1);
    assert_eq!(app.deriver.call_count(), 1);
}

#[tokio::test]
async fn test_non_avatar_upload_has_no_placeholder() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (status, body) = upload(
        app.client(),
        form(fixtures::create_test_webp(32, 16), "banner.webp", "image/webp", Some("false")),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body["imageURL"].as_str().unwrap().starts_with("https://"));
    assert!(body.get("blurpfp").is_none());
    assert!(body.get("error").is_none());
    assert_eq!(app.deriver.call_count(), 0);
}

#[tokio::test]
async fn test_missing_avatar_flag_defaults_to_false() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (status, body) = upload(
        app.client(),
        form(fixtures::create_test_jpeg(8, 8), "a.jpg", "image/jpeg", None),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body.get("blurpfp").is_none());
    assert_eq!(app.deriver.call_count(), 0);
}

#[tokio::test]
async fn test_acquire_rejection_skips_transmit() {
    let app = setup_test_app(
        &[],
        FakeStore::rejecting(
            403,
            "Cloudflare Images permission denied - check the API token permissions",
        ),
        FakeDeriver::succeeding(),
    );

    let (status, body) = upload(
        app.client(),
        form(fixtures::create_test_png(4, 4), "a.png", "image/png", Some("true")),
    )
    .await;

    assert_eq!(status, 403);
    assert_eq!(
        body,
        json!({ "error": "Cloudflare Images permission denied - check the API token permissions" })
    );
    assert_eq!(app.store.acquires(), 1);
    assert_eq!(app.store.transmits(), 0);
    assert_eq!(app.deriver.call_count(), 0);
}

#[tokio::test]
async fn test_acquire_failure_other_than_permission_is_bad_gateway() {
    let app = setup_test_app(
        &[],
        FakeStore::rejecting(500, "Cloudflare API Error: Internal error"),
        FakeDeriver::succeeding(),
    );

    let (status, body) = upload(
        app.client(),
        form(fixtures::create_test_png(4, 4), "a.png", "image/png", None),
    )
    .await;

    assert_eq!(status, 502);
    assert_eq!(body["error"], "Cloudflare API Error: Internal error");
    assert_eq!(app.store.transmits(), 0);
}

#[tokio::test]
async fn test_derive_failure_keeps_stored_image() {
    let app = setup_test_app(
        &[],
        FakeStore::default(),
        FakeDeriver::new(DeriveBehavior::Fail),
    );

    let (status, body) = upload(
        app.client(),
        form(fixtures::create_test_png(16, 16), "me.png", "image/png", Some("1")),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body["imageURL"].as_str().is_some());
    assert_eq!(body["blurpfp"], "");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_slow_derive_is_bounded() {
    let app = setup_test_app(
        &[("DERIVE_TIMEOUT_MS", "100")],
        FakeStore::default(),
        FakeDeriver::new(DeriveBehavior::Slow(Duration::from_secs(5))),
    );

    let started = std::time::Instant::now();
    let (status, body) = upload(
        app.client(),
        form(fixtures::create_test_png(16, 16), "me.png", "image/png", Some("true")),
    )
    .await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(status, 200);
    assert!(body["imageURL"].as_str().is_some());
    assert_eq!(body["blurpfp"], "");
}

#[tokio::test]
async fn test_each_upload_gets_its_own_target() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (_, first) = upload(
        app.client(),
        form(fixtures::create_test_png(4, 4), "a.png", "image/png", None),
    )
    .await;
    let (_, second) = upload(
        app.client(),
        form(fixtures::create_test_png(4, 4), "a.png", "image/png", None),
    )
    .await;

    assert_ne!(first["imageURL"], second["imageURL"]);
    let targets = app.store.targets();
    assert_eq!(targets.len(), 2);
    assert_ne!(targets[0], targets[1]);
    assert_eq!(app.store.acquires(), 2);
}

#[tokio::test]
async fn test_missing_file_field_is_bad_request() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let form = MultipartForm::new().add_text("isAvatar", "true");
    let (status, body) = upload(app.client(), form).await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "No file provided" }));
    assert_eq!(app.store.acquires(), 0);
}

#[tokio::test]
async fn test_invalid_avatar_flag_is_bad_request() {
    let app = setup_test_app(&[], FakeStore::default(), FakeDeriver::succeeding());

    let (status, body) = upload(
        app.client(),
        form(fixtures::create_test_png(4, 4), "a.png", "image/png", Some("maybe")),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body, json!({ "error": "isAvatar must be true or false" }));
}

#[tokio::test]
async fn test_upload_through_cloudflare_contract() {
    let mut server = Server::new_async().await;
    let upload_url = format!("{}/upload/abc", server.url());

    let acquire = server
        .mock("POST", "/accounts/acc/images/v2/direct_upload")
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "result": { "uploadURL": upload_url, "id": "abc" },
                "errors": []
            })
            .to_string(),
        )
        .create_async()
        .await;
    let transmit = server
        .mock("POST", "/upload/abc")
        .match_body(Matcher::Regex("banner.jpg".to_string()))
        .with_status(200)
        .with_body(
            json!({
                "success": true,
                "result": {
                    "id": "abc",
                    "variants": ["https://imagedelivery.net/hash/abc/public"]
                },
                "errors": []
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = helpers::setup_app_against_provider(&server.url(), &[]);
    let (status, body) = upload(
        &client,
        form(fixtures::create_test_jpeg(8, 8), "banner.jpg", "image/jpeg", None),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({ "imageURL": "https://imagedelivery.net/hash/abc/public" })
    );
    acquire.assert_async().await;
    transmit.assert_async().await;
}
