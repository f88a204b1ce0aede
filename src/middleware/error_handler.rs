use crate::error::AppError;
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::ResponseError,
    http::StatusCode,
    Error as ActixError,
};
use std::{future::Future, pin::Pin};

impl From<&ActixError> for AppError {
    fn from(err: &ActixError) -> Self {
        let status = err.as_response_error().status_code();
        let detail = err.to_string();
        let context = format!("Status: {}, Error: {}", status, detail);

        log::error!("{}", t!("logs.error_occurred", context = context));
        classify(status, detail)
    }
}

/// Maps a framework status onto the relay's error kinds.
fn classify(status: StatusCode, detail: String) -> AppError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => AppError::NotFound,
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => AppError::Timeout(detail),
        status if status.is_client_error() => AppError::InvalidRequest(detail),
        status => {
            log::debug!("Unmatched framework error {}: {}", status, detail);
            AppError::Generic(format!("Unexpected error occurred: {}", detail))
        }
    }
}

/// Rewrites framework-generated failures (extractor errors, payload limits,
/// middleware errors) into the relay's JSON error body. Responses produced
/// from an [`AppError`] pass through untouched.
pub struct ErrorHandlerMiddleware;

impl<S, B> Transform<S, ServiceRequest> for ErrorHandlerMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = ActixError;
    type Transform = ErrorHandlerService<S>;
    type InitError = ();
    type Future = Pin<Box<dyn Future<Output = Result<Self::Transform, Self::InitError>>>>;

    fn new_transform(&self, service: S) -> Self::Future {
        Box::pin(async move { Ok(ErrorHandlerService { service }) })
    }
}

pub struct ErrorHandlerService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ErrorHandlerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = ActixError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Routing needs sole ownership of the request, so only its head is kept
        let method = req.method().clone();
        let uri = req.uri().clone();
        let fut = self.service.call(req);

        Box::pin(async move {
            match fut.await {
                Ok(res) => {
                    // Errors raised as AppError already carry the JSON body
                    let foreign = res
                        .response()
                        .error()
                        .filter(|err| err.as_error::<AppError>().is_none())
                        .map(AppError::from);

                    Ok(match foreign {
                        Some(app_error) => {
                            log::debug!("Rewriting framework error for {} {}", method, uri);
                            res.into_response(app_error.error_response())
                        }
                        None => res.map_into_boxed_body(),
                    })
                }
                Err(err) => {
                    log::error!("Request failed: {} {}: {:?}", method, uri, err);
                    Err(AppError::from(&err).into())
                }
            }
        })
    }
}

pub fn error_handler() -> ErrorHandlerMiddleware {
    ErrorHandlerMiddleware
}
