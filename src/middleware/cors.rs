use crate::error::{AppError, Result};
use crate::utils::config::CorsConfig;
use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use actix_web::http::Method;
use actix_web::{Error, HttpResponse};
use futures::future::{ok, Ready};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Stamps permissive cross-origin headers on every response and answers
/// any `OPTIONS` preflight with `204 No Content` without reaching the routes.
///
/// # Examples
/// ```rust
/// use actix_web::App;
/// use coach_relay::middleware::Cors;
/// use coach_relay::utils::config::CorsConfig;
///
/// let cors = Cors::from_config(&CorsConfig::default()).unwrap();
/// let app = App::new().wrap(cors);
/// ```
#[derive(Clone)]
pub struct Cors {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl Cors {
    pub fn from_config(config: &CorsConfig) -> Result<Self> {
        let origin = HeaderValue::from_str(&config.allowed_origin).map_err(|e| {
            AppError::Config(format!("invalid allowed_origin {:?}: {}", config.allowed_origin, e))
        })?;

        let headers = vec![
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin),
            (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOWED_METHODS)),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOWED_HEADERS)),
            (header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(config.max_age)),
            (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true")),
        ];

        Ok(Self { headers: Arc::new(headers) })
    }
}

fn stamp(headers: &[(HeaderName, HeaderValue)], target: &mut HeaderMap) {
    for (name, value) in headers {
        target.insert(name.clone(), value.clone());
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsMiddleware<S>;
    type InitError = ();
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CorsMiddleware { service, headers: self.headers.clone() })
    }
}

pub struct CorsMiddleware<S> {
    service: S,
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl<S, B> Service<ServiceRequest> for CorsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>>>>;

    fn poll_ready(
        &self,
        ctx: &mut core::task::Context<'_>,
    ) -> core::task::Poll<std::result::Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let headers = self.headers.clone();

        // Preflight never reaches the routes
        if req.method() == Method::OPTIONS {
            log::debug!("Answering preflight for {}", req.path());
            let mut response = HttpResponse::NoContent().finish();
            stamp(&headers, response.headers_mut());
            return Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) });
        }

        let fut = self.service.call(req);

        Box::pin(async move {
            let mut res = fut.await?;
            stamp(&headers, res.headers_mut());
            Ok(res.map_into_left_body())
        })
    }
}
