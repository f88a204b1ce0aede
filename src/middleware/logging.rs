use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage, HttpRequest};
use chrono::Utc;
use futures::future::{ok, Ready};
use std::future::Future;
use std::pin::Pin;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Per-request identifier shared by the access log and handler log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Id assigned by [`Logging`], or a fresh one when the middleware is absent.
    pub fn of(req: &HttpRequest) -> Self {
        req.extensions().get::<RequestId>().copied().unwrap_or_else(|| RequestId(Uuid::new_v4()))
    }
}

/// Tags every request with a [`RequestId`], echoes it in `x-request-id` and
/// logs `METHOD path status from peer - Nms` once the response head is ready.
/// For streamed relays that is when upstream headers arrive, not the end of
/// the body.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use coach_relay::middleware::Logging;
///
/// App::new()
///     .wrap(Logging);
/// ```
pub struct Logging;

impl<S, B> Transform<S, ServiceRequest> for Logging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = LoggingMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(LoggingMiddleware { service })
    }
}

pub struct LoggingMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for LoggingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let id = RequestId(Uuid::new_v4());
        req.extensions_mut().insert(id);

        let started = Utc::now();
        let line = format!("[{}] {} {}", id.0, req.method(), req.path());
        let peer = req.connection_info().peer_addr().unwrap_or("-").to_string();

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            if let Ok(value) = HeaderValue::from_str(&id.0.to_string()) {
                res.headers_mut().insert(REQUEST_ID_HEADER, value);
            }

            let status = res.status();
            let millis = (Utc::now() - started).num_milliseconds();
            if status.is_server_error() {
                log::warn!("{} {} from {} - {}ms", line, status.as_u16(), peer, millis);
            } else {
                log::info!("{} {} from {} - {}ms", line, status.as_u16(), peer, millis);
            }
            Ok(res)
        })
    }
}
