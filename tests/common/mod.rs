#![allow(dead_code)]

use actix_web::{web, App, HttpRequest, HttpResponse};
use coach_relay::middleware::{error_handler, Cors, Logging};
use coach_relay::service::relay::RelayService;
use coach_relay::utils::config::{ChatDefaults, CorsConfig, UpstreamConfig};
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_MODEL: &str = "coach-test-model";
pub const TEST_KEY: &str = "test-key";

/// Streamed reply split the way a network might deliver it: mid-line and
/// mid-character.
pub const SSE_CHUNKS: [&[u8]; 4] = [
    b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\ndata: {\"choices\":[{\"del",
    b"ta\":{\"content\":\"Hi\"}}]}\n\n",
    b"data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"\xe4\xbd",
    b"\xa0\"}}]}\n\ndata: [DONE]\n\n",
];

pub fn sse_body() -> Vec<u8> {
    SSE_CHUNKS.concat()
}

pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "cmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

/// What the fake upstream saw.
#[derive(Clone, Default)]
pub struct Recorded {
    pub hits: Arc<AtomicUsize>,
    pub bodies: Arc<Mutex<Vec<Value>>>,
    pub authorization: Arc<Mutex<Vec<String>>>,
}

impl Recorded {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Value {
        self.bodies.lock().unwrap().last().cloned().unwrap_or(Value::Null)
    }

    fn record(&self, req: &HttpRequest, body: &Value) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().unwrap().push(body.clone());
        let auth = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.authorization.lock().unwrap().push(auth);
    }
}

async fn completions(req: HttpRequest, body: web::Json<Value>, seen: web::Data<Recorded>) -> HttpResponse {
    seen.record(&req, &body);
    if body.0["stream"] == json!(true) {
        let chunks = SSE_CHUNKS
            .into_iter()
            .map(|chunk| Ok::<_, actix_web::Error>(web::Bytes::from_static(chunk)));
        HttpResponse::Ok().content_type("text/event-stream").streaming(stream::iter(chunks))
    } else {
        HttpResponse::Ok().json(completion_body("Hello from upstream"))
    }
}

async fn limited(req: HttpRequest, body: web::Json<Value>, seen: web::Data<Recorded>) -> HttpResponse {
    seen.record(&req, &body);
    HttpResponse::TooManyRequests().json(json!({"error": {"message": "slow down"}}))
}

async fn slow(req: HttpRequest, body: web::Json<Value>, seen: web::Data<Recorded>) -> HttpResponse {
    seen.record(&req, &body);
    actix_web::rt::time::sleep(Duration::from_secs(3)).await;
    HttpResponse::Ok().json(completion_body("too late"))
}

async fn stall(req: HttpRequest, body: web::Json<Value>, seen: web::Data<Recorded>) -> HttpResponse {
    seen.record(&req, &body);
    let first = stream::iter([Ok::<_, actix_web::Error>(web::Bytes::from_static(STALLED_FRAME))]);
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .streaming(first.chain(stream::pending()))
}

/// Only frame sent by `/stall` before it goes quiet.
pub const STALLED_FRAME: &[u8] = b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n";

/// Starts a fake chat-completion API with `/complete`, `/limited`, `/slow`
/// and `/stall`.
pub fn start_upstream() -> (actix_test::TestServer, Recorded) {
    let seen = Recorded::default();
    let data = seen.clone();
    let server = actix_test::start(move || {
        App::new()
            .app_data(web::Data::new(data.clone()))
            .route("/complete", web::post().to(completions))
            .route("/limited", web::post().to(limited))
            .route("/slow", web::post().to(slow))
            .route("/stall", web::post().to(stall))
    });
    (server, seen)
}

pub fn upstream_config(api_url: String, timeout_secs: u64) -> UpstreamConfig {
    UpstreamConfig {
        api_url: Some(api_url),
        model: Some(TEST_MODEL.to_string()),
        api_key: Some(TEST_KEY.to_string()),
        timeout_secs,
    }
}

pub fn relay_for(api_url: String, timeout_secs: u64) -> RelayService {
    RelayService::new(&upstream_config(api_url, timeout_secs), &ChatDefaults::default())
        .expect("complete upstream config")
}

/// Starts the relay itself in front of `upstream_url`, with the same
/// middleware stack as the server binary.
pub fn start_relay(upstream_url: String) -> actix_test::TestServer {
    let relay = web::Data::new(relay_for(upstream_url, 5));
    let cors = Cors::from_config(&CorsConfig::default()).expect("default cors config");
    actix_test::start(move || {
        App::new()
            .app_data(relay.clone())
            .wrap(error_handler())
            .wrap(cors.clone())
            .wrap(Logging)
            .configure(coach_relay::routes::configure)
    })
}
