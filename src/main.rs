use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use course_agent_server::{
    app_state::AppState,
    config::Config,
    middleware::RequestIdMiddleware,
    server::{cors, routes},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    for name in config.missing_credentials() {
        log::warn!("{} is not set; dependent features will use fallbacks", name);
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    let state = AppState::new(config).map_err(std::io::Error::other)?;
    let state = Arc::new(state);

    log::info!("Starting course agent server on {}:{}", host, port);
    log::info!(
        "Models: primary={}, fast={}",
        state.config.llm_model,
        state.config.llm_fast_model
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(cors(&state.config))
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .configure(routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
