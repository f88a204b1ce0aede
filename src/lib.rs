//! Coach Relay
//!
//! A same-origin relay for an LLM-backed life coach chat, together with the
//! streaming client, conversation controller and voice adapters that talk to it.
//!
//! # Modules
//! - `controller`: Handles HTTP requests on the relay
//! - `entities`: Chat messages, requests and completion payloads
//! - `error`: Relay error type and its JSON rendering
//! - `middleware`: CORS, error rewriting and request logging
//! - `routes`: Relay endpoint wiring
//! - `service`: Upstream forwarding
//! - `client`: Streaming chat client and SSE decoding
//! - `conversation`: Session context driving a transcript
//! - `voice`: Speech input/output adapters
//! - `utils`: Configuration and startup helpers
//!
//! # Examples
//! ```no_run
//! use actix_web::{web, App, HttpServer};
//! use coach_relay::routes::route::configure;
//! use coach_relay::service::relay::RelayService;
//! use coach_relay::utils::config::{ChatDefaults, UpstreamConfig};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let upstream = UpstreamConfig::from_env()?;
//!     let relay = web::Data::new(RelayService::new(&upstream, &ChatDefaults::default())?);
//!     HttpServer::new(move || App::new().app_data(relay.clone()).configure(configure))
//!         .bind("127.0.0.1:3000")?
//!         .run()
//!         .await
//! }
//! ```

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en");

pub mod client;
pub mod controller;
pub mod conversation;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod service;
pub mod utils;
pub mod voice;

pub use entities::*;
pub use error::*;
pub use utils::*;
