use crate::utils::config::{AppConfig, DEFAULT_CONFIG_PATH};
use log::info;
use log4rs;
use std::sync::Arc;

pub const LOG_CONFIG_PATH: &str = "config/log4rs.yml";
pub const CONFIG_PATH_ENV: &str = "COACH_RELAY_CONFIG";

pub async fn init() -> crate::error::Result<Arc<AppConfig>> {
    // Logging
    init_logging(LOG_CONFIG_PATH)?;

    // Application config
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load(&config_path)?;
    info!("{}", t!("logs.config_loaded", path = config_path));

    // Localization
    set_locale(&config.locale);

    info!(
        "{}",
        t!(
            "logs.relay_target",
            model = config.upstream.model.as_deref().unwrap_or_default(),
            url = config.upstream.api_url.as_deref().unwrap_or_default()
        )
    );

    Ok(Arc::new(config))
}

pub fn init_logging(path: &str) -> crate::error::Result<()> {
    log4rs::init_file(path, Default::default())?;
    Ok(())
}

/// Selects the locale for user-visible messages. Unknown locales fall back to English.
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

pub fn server_banner(host: &str, port: u16) -> String {
    t!("logs.server_starting", addr = format!("{}:{}", host, port)).to_string()
}
