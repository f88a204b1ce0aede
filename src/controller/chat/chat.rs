use crate::entities::RelayedChatRequest;
use crate::error::AppError;
use crate::middleware::RequestId;
use crate::service::relay::{RelayBody, RelayService};
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

/// `POST /chat`: validates the caller's body and relays it upstream.
///
/// The body is read as raw bytes so that unparseable input is reported
/// through [`AppError::InvalidRequest`] without touching the upstream API.
pub async fn relay_chat(
    req: HttpRequest,
    relay: web::Data<RelayService>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let request_id = RequestId::of(&req).0;
    let start_time = Utc::now();

    let request: RelayedChatRequest = serde_json::from_slice(&body).map_err(|e| {
        log::warn!("[{}] Rejecting malformed chat body: {}", request_id, e);
        AppError::InvalidRequest(e.to_string())
    })?;

    if request.messages.is_empty() {
        log::warn!("[{}] Empty messages field in request", request_id);
        return Err(AppError::InvalidRequest("messages field cannot be empty".to_string()));
    }

    log::info!(
        "[{}] Relaying {} messages to {} (stream={:?}, temperature={:?})",
        request_id,
        request.messages.len(),
        relay.model(),
        request.stream,
        request.temperature
    );

    let reply = relay.forward(&request).await.map_err(|e| {
        let duration = Utc::now() - start_time;
        log::error!(
            "[{}] Upstream request failed after {}ms: {}",
            request_id,
            duration.num_milliseconds(),
            e
        );
        e
    })?;

    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let duration = Utc::now() - start_time;
    log::info!(
        "[{}] Upstream answered {} in {}ms",
        request_id,
        status.as_u16(),
        duration.num_milliseconds()
    );

    let mut builder = HttpResponse::build(status);
    if let Some(content_type) = reply.content_type.as_deref() {
        builder.insert_header((header::CONTENT_TYPE, content_type));
    }

    Ok(match reply.body {
        RelayBody::Stream(stream) => builder.streaming(stream),
        RelayBody::Full(bytes) => builder.body(bytes),
    })
}

/// Fallback for every other method/path combination.
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound)
}
