//! Upstream forwarding for the relay endpoint.
//!
//! The relay attaches the bearer credential and model identifier, forwards the
//! caller's `stream` flag unchanged and hands the upstream body back either as
//! a live byte stream or as one complete buffer.

use crate::entities::{ChatRequest, UpstreamRequest};
use crate::error::{AppError, Result};
use crate::utils::config::{ChatDefaults, UpstreamConfig};
use actix_web::web::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::time::Duration;

/// Body handed back to the caller.
pub enum RelayBody {
    /// Upstream bytes, passed through chunk by chunk as they arrive.
    Stream(BoxStream<'static, Result<Bytes>>),
    /// Complete upstream body.
    Full(Bytes),
}

pub struct RelayReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: RelayBody,
}

/// Resolved parameters for one upstream call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelayParams {
    pub temperature: f32,
    pub stream: bool,
}

impl RelayParams {
    pub fn resolve<M>(request: &ChatRequest<M>, defaults: &ChatDefaults) -> Self {
        Self {
            temperature: request.temperature.unwrap_or(defaults.temperature),
            stream: request.stream.unwrap_or(defaults.stream),
        }
    }
}

pub struct RelayService {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
    defaults: ChatDefaults,
}

impl RelayService {
    pub fn new(upstream: &UpstreamConfig, defaults: &ChatDefaults) -> Result<Self> {
        upstream.validate()?;
        let timeout = upstream.timeout();

        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: upstream.api_url.clone().unwrap_or_default(),
            model: upstream.model.clone().unwrap_or_default(),
            api_key: upstream.api_key.clone().unwrap_or_default(),
            timeout,
            defaults: defaults.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Forwards one chat request upstream.
    ///
    /// The timeout ceiling covers the wait for response headers, the whole
    /// body when not streaming, and every gap between streamed chunks.
    pub async fn forward<M: Serialize>(&self, request: &ChatRequest<M>) -> Result<RelayReply> {
        let params = RelayParams::resolve(request, &self.defaults);
        let body = UpstreamRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: params.temperature,
            stream: params.stream,
        };

        let send = self
            .http
            .post(&self.api_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| AppError::Timeout(format!("no upstream response within {:?}", self.timeout)))??;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        log::debug!(
            "Upstream answered {} ({}) stream={}",
            status,
            content_type.as_deref().unwrap_or("no content-type"),
            params.stream
        );

        let body = if params.stream {
            RelayBody::Stream(idle_limited(response, self.timeout))
        } else {
            let bytes = tokio::time::timeout(self.timeout, response.bytes())
                .await
                .map_err(|_| {
                    AppError::Timeout(format!("upstream body not complete within {:?}", self.timeout))
                })??;
            RelayBody::Full(bytes)
        };

        Ok(RelayReply { status, content_type, body })
    }
}

/// Passes upstream chunks through, ending the stream with an error when the
/// upstream stalls longer than `idle` between chunks.
fn idle_limited(response: reqwest::Response, idle: Duration) -> BoxStream<'static, Result<Bytes>> {
    let upstream = response.bytes_stream().boxed();

    stream::unfold(Some(upstream), move |state| async move {
        let mut upstream = state?;
        match tokio::time::timeout(idle, upstream.next()).await {
            Ok(Some(Ok(bytes))) => Some((Ok(bytes), Some(upstream))),
            Ok(Some(Err(err))) => {
                log::error!("Upstream stream failed: {}", err);
                Some((Err(AppError::from(err)), None))
            }
            Ok(None) => None,
            Err(_) => {
                log::error!("Upstream stream stalled for {:?}", idle);
                Some((Err(AppError::Timeout(format!("upstream idle for {:?}", idle))), None))
            }
        }
    })
    .boxed()
}
