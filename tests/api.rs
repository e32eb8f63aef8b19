use std::{sync::Arc, time::Duration};

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Request, StatusCode},
    Router,
};
use futures::{Stream, StreamExt};
use serde_json::{json, Value};
use tokio::time::timeout;
use tower::ServiceExt;

use notification_timer::{
    api::create_router,
    services::{MemoryCapability, NotificationTemplate, PermissionState},
    state::AppState,
    TimerSession,
};

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    capability: Arc<MemoryCapability>,
}

impl TestApp {
    async fn spawn(capability: MemoryCapability) -> Self {
        let capability = Arc::new(capability);
        let state = Arc::new(
            AppState::initialize(
                capability.clone(),
                NotificationTemplate::default(),
                TimerSession::new(10, "stand up".to_string()),
                "127.0.0.1".to_string(),
                20554,
            )
            .await,
        );
        Self {
            router: create_router(Arc::clone(&state)),
            state,
            capability,
        }
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            json!(null)
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

/// Reads server-sent events off a response body
struct EventReader<S> {
    body: S,
    buffer: String,
}

impl<S, E> EventReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Debug,
{
    fn new(body: S) -> Self {
        Self {
            body,
            buffer: String::new(),
        }
    }

    /// Next named event and its JSON payload. Keep-alive comments are skipped.
    async fn next(&mut self) -> (String, Value) {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                let mut name = String::new();
                let mut data = String::new();
                for line in frame.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        name = v.trim().to_string();
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data.push_str(v.trim());
                    }
                }
                if data.is_empty() {
                    continue;
                }
                return (name, serde_json::from_str(&data).unwrap());
            }

            let chunk = timeout(Duration::from_secs(5), self.body.next())
                .await
                .expect("no event within five seconds")
                .expect("event stream ended")
                .unwrap();
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }

    /// Skip events until one satisfies `matches`
    async fn until(&mut self, matches: impl Fn(&Value) -> bool) -> (String, Value) {
        loop {
            let (name, data) = self.next().await;
            if matches(&data) {
                return (name, data);
            }
        }
    }
}

#[tokio::test]
async fn status_stream_pushes_session_changes() {
    let app = TestApp::spawn(MemoryCapability::granted()).await;

    let request = Request::builder()
        .uri("/status/stream")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let mut events = EventReader::new(response.into_body().into_data_stream());

    let (name, first) = events.next().await;
    assert_eq!(name, "session");
    assert_eq!(first["state"], "idle");
    assert_eq!(first["dispatch_count"], 0);
    assert_eq!(first["remaining_display"], "0:00");

    let (status, _) = app.request("POST", "/notify", None).await;
    assert_eq!(status, StatusCode::OK);
    let (name, notified) = events.until(|s| s["dispatch_count"] == 1).await;
    assert_eq!(name, "session");
    assert!(notified["last_dispatch_at"].is_string());

    let (status, _) = app.request("POST", "/count/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    let (name, reset) = events.until(|s| s["dispatch_count"] == 0).await;
    assert_eq!(name, "session");
    assert_eq!(reset["state"], "idle");
}

#[tokio::test]
async fn health_and_status() {
    let app = TestApp::spawn(MemoryCapability::granted()).await;

    let (status, body) = app.request("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.request("GET", "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    let session = &body["session"];
    assert_eq!(session["supported"], true);
    assert_eq!(session["permission"], "granted");
    assert_eq!(session["state"], "idle");
    assert_eq!(session["interval_seconds"], 10);
    assert_eq!(session["message"], "stand up");
    assert_eq!(session["dispatch_count"], 0);
    assert_eq!(session["remaining_display"], "0:00");
    assert_eq!(body["port"], 20554);
}

#[tokio::test]
async fn start_notify_reset_stop() {
    let app = TestApp::spawn(MemoryCapability::granted()).await;

    let (status, body) = app.request("POST", "/timer/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["state"], "running");
    assert_eq!(body["session"]["dispatch_count"], 1);
    assert_eq!(body["session"]["remaining_seconds"], 10);
    assert_eq!(body["session"]["remaining_display"], "0:10");

    let (status, _) = app.request("POST", "/timer/start", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.request("POST", "/notify", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["dispatch_count"], 2);

    let (status, body) = app.request("POST", "/count/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["dispatch_count"], 0);
    assert_eq!(body["session"]["state"], "running");

    let (status, body) = app.request("POST", "/timer/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["state"], "idle");
    assert_eq!(body["session"]["remaining_seconds"], 0);

    let (status, _) = app.request("POST", "/timer/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.state.timers_armed().await);

    let shown = app.capability.shown();
    assert_eq!(shown.len(), 2);
    assert!(shown.iter().all(|n| n.body == "stand up"));
}

#[tokio::test]
async fn settings_are_clamped_and_locked_while_running() {
    let app = TestApp::spawn(MemoryCapability::granted()).await;

    let (status, body) = app
        .request("PUT", "/settings", Some(json!({"interval": 1, "message": "drink water"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["interval_seconds"], 5);
    assert_eq!(body["session"]["message"], "drink water");

    let (_, body) = app
        .request("PUT", "/settings", Some(json!({"interval": "not a number"})))
        .await;
    assert_eq!(body["session"]["interval_seconds"], 5);

    let (_, body) = app
        .request("PUT", "/settings", Some(json!({"interval": 1000})))
        .await;
    assert_eq!(body["session"]["interval_seconds"], 300);
    assert_eq!(body["session"]["message"], "drink water");

    app.request("POST", "/timer/start", None).await;
    let (status, body) = app
        .request("PUT", "/settings", Some(json!({"interval": 60})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
    assert_eq!(body["session"]["interval_seconds"], 300);

    app.state.teardown().await;
}

#[tokio::test]
async fn denied_permission_blocks_start_and_notify() {
    let app = TestApp::spawn(MemoryCapability::answering(PermissionState::Denied)).await;

    let (status, body) = app.request("POST", "/notify", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["session"]["permission"], "default");

    let (status, body) = app.request("POST", "/timer/start", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["status"], "error");
    assert_eq!(body["session"]["state"], "idle");
    assert_eq!(body["session"]["permission"], "denied");
    assert_eq!(body["session"]["dispatch_count"], 0);
    assert!(body["message"].as_str().unwrap().contains("denied"));

    assert!(app.capability.shown().is_empty());
    assert_eq!(app.capability.prompt_count(), 1);
}

#[tokio::test]
async fn permission_request_then_start() {
    let app = TestApp::spawn(MemoryCapability::answering(PermissionState::Granted)).await;

    let (status, body) = app.request("POST", "/permission", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["permission"], "granted");

    let (status, body) = app.request("POST", "/timer/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["dispatch_count"], 1);
    assert_eq!(app.capability.prompt_count(), 1);

    app.state.teardown().await;
}

#[tokio::test]
async fn unsupported_capability_is_reported() {
    let app = TestApp::spawn(MemoryCapability::unsupported()).await;

    for (method, path) in [
        ("POST", "/permission"),
        ("POST", "/timer/start"),
        ("POST", "/notify"),
    ] {
        let (status, body) = app.request(method, path, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{method} {path}");
        assert_eq!(body["session"]["supported"], false);
    }
}
