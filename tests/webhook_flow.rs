//! End-to-end webhook flow: signed deliveries in, platform API calls out.

use std::sync::Arc;

use axum::Router;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use linecrab::api::MessagingApi;
use linecrab::dispatcher::Dispatcher;
use linecrab::media::MediaStore;
use linecrab::server::{AppState, build_router};
use linecrab::webhook::signature;

const SECRET: &str = "integration-secret";

struct Harness {
    app: Router,
    platform: MockServer,
    static_root: TempDir,
}

async fn harness() -> Harness {
    let platform = MockServer::start().await;
    let static_root = TempDir::new().expect("static root");
    let media = MediaStore::open(static_root.path().join("tmp")).expect("media store");
    let api = MessagingApi::new("integration-token")
        .with_base_urls(platform.uri(), platform.uri());
    let state = AppState::new(SECRET, Arc::new(Dispatcher::new(api, media)));
    let app = build_router(state, static_root.path());
    Harness {
        app,
        platform,
        static_root,
    }
}

fn signed_callback(body: &Value) -> Request<axum::body::Body> {
    let bytes = serde_json::to_vec(body).expect("serialize body");
    let sig = signature::sign(SECRET, &bytes);
    Request::builder()
        .method("POST")
        .uri("/callback")
        .header("host", "bot.example.com")
        .header("x-line-signature", sig)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(bytes))
        .expect("build request")
}

fn message_event(reply_token: &str, message: Value) -> Value {
    json!({
        "destination": "U0000",
        "events": [{
            "type": "message",
            "replyToken": reply_token,
            "timestamp": 1625665242211u64,
            "source": {"type": "user", "userId": "U1234"},
            "message": message
        }]
    })
}

async fn reply_bodies(platform: &MockServer) -> Vec<Value> {
    platform
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|req| req.url.path() == "/v2/bot/message/reply")
        .map(|req| serde_json::from_slice(&req.body).expect("reply body"))
        .collect()
}

#[tokio::test]
async fn profile_command_replies_name_then_status() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/v2/bot/profile/U1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": "U1234",
            "displayName": "Brown",
            "statusMessage": "hello world"
        })))
        .expect(1)
        .mount(&h.platform)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&h.platform)
        .await;

    let body = message_event(
        "token-profile",
        json!({"type": "text", "id": "m-1", "text": "profile"}),
    );
    let resp = h.app.oneshot(signed_callback(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let replies = reply_bodies(&h.platform).await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["replyToken"], "token-profile");
    assert_eq!(
        replies[0]["messages"],
        json!([
            {"type": "text", "text": "Display name: Brown"},
            {"type": "text", "text": "Status message: hello world"}
        ])
    );
}

#[tokio::test]
async fn broadcast_date_command_reports_delivery_count() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/v2/bot/message/delivery/broadcast"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ready", "success": 3})),
        )
        .expect(1)
        .mount(&h.platform)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&h.platform)
        .await;

    let body = message_event(
        "token-bc",
        json!({"type": "text", "id": "m-1", "text": "broadcast 20190505"}),
    );
    let resp = h.app.oneshot(signed_callback(&body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let replies = reply_bodies(&h.platform).await;
    let texts: Vec<&str> = replies[0]["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(
        texts,
        vec![
            "Number of sent broadcast messages: 20190505",
            "status: ready",
            "success: 3"
        ]
    );
}

#[tokio::test]
async fn tampered_body_is_rejected_without_side_effects() {
    let h = harness().await;

    let body = message_event(
        "token-x",
        json!({"type": "text", "id": "m-1", "text": "push"}),
    );
    let bytes = serde_json::to_vec(&body).unwrap();
    let sig = signature::sign(SECRET, &bytes);

    // Flip one byte after signing.
    let mut tampered = bytes;
    tampered[10] ^= 0x01;
    let req = Request::builder()
        .method("POST")
        .uri("/callback")
        .header("host", "bot.example.com")
        .header("x-line-signature", sig)
        .body(axum::body::Body::from(tampered))
        .unwrap();

    let resp = h.app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(
        h.platform
            .received_requests()
            .await
            .unwrap_or_default()
            .is_empty()
    );
}

#[tokio::test]
async fn saved_media_is_served_back_from_the_reply_url() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/v2/bot/message/m-99/content"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .mount(&h.platform)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&h.platform)
        .await;

    let body = message_event("token-img", json!({"type": "image", "id": "m-99"}));
    let resp = h
        .app
        .clone()
        .oneshot(signed_callback(&body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // The reply's second message carries the public URL; fetch its path from
    // the same router and expect the stored bytes back.
    let replies = reply_bodies(&h.platform).await;
    let url = replies[0]["messages"][1]["text"].as_str().unwrap();
    let path_only = url
        .strip_prefix("http://bot.example.com")
        .expect("URL points at this host");
    assert!(path_only.starts_with("/static/tmp/"));

    let req = Request::builder()
        .method("GET")
        .uri(path_only)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = h.app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let served = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
    assert_eq!(&served[..], &[0xFF, 0xD8, 0xFF, 0xE0]);
}

#[tokio::test]
async fn concurrent_media_deliveries_store_distinct_files() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&h.platform)
        .await;
    for i in 0..8 {
        Mock::given(method("GET"))
            .and(path(format!("/v2/bot/message/m-{i}/content")))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(format!("content-{i}").into_bytes()),
            )
            .mount(&h.platform)
            .await;
    }

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = h.app.clone();
        let body = message_event(
            &format!("token-{i}"),
            json!({"type": "image", "id": format!("m-{i}")}),
        );
        handles.push(tokio::spawn(async move {
            app.oneshot(signed_callback(&body)).await.unwrap().status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let stored: Vec<String> = std::fs::read_dir(h.static_root.path().join("tmp"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(stored.len(), 8, "each delivery stored exactly one file");
    let unique: std::collections::HashSet<&String> = stored.iter().collect();
    assert_eq!(unique.len(), 8, "no generated name collided");
}
