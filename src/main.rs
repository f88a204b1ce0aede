use actix_web::{web, App, HttpServer};
use anyhow::Context;

use coach_relay::middleware::{error_handler, Cors, Logging};
use coach_relay::routes;
use coach_relay::service::relay::RelayService;
use coach_relay::utils::init;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration and start logging
    let config = init::init()
        .await
        .context("Failed to initialize application")
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    let relay = web::Data::new(RelayService::new(&config.upstream, &config.chat.defaults)?);
    let cors = Cors::from_config(&config.cors)?;

    let host = config.server.host.clone();
    let port = config.server.port;
    let shutdown_timeout = config.server.shutdown_timeout;
    let payload_limit = config.server.payload_limit;

    log::info!("{}", init::server_banner(&host, port));

    HttpServer::new(move || {
        App::new()
            .app_data(relay.clone())
            .app_data(web::PayloadConfig::new(payload_limit))
            .wrap(error_handler())
            .wrap(cors.clone())
            .wrap(Logging)
            .configure(routes::configure)
    })
    .client_request_timeout(std::time::Duration::from_secs(30))
    .bind((host, port))?
    .shutdown_timeout(shutdown_timeout) // graceful shutdown window
    .run()
    .await
}

