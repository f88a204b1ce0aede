use crate::controller::chat::{not_found, relay_chat};
use actix_web::web;

pub const CHAT_PATH: &str = "/chat";

pub fn chat_routes() -> actix_web::Resource {
    web::resource(CHAT_PATH)
        .route(web::post().to(relay_chat))
        .default_service(web::to(not_found))
}

/// Registers the relay endpoint. Expects a `web::Data<RelayService>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(chat_routes()).default_service(web::to(not_found));
}
