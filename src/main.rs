use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};

use jimeng_proxy::config::Config;
use jimeng_proxy::{AppState, routes, volc};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jimeng_proxy=debug,actix_web=info".into()),
        )
        .init();

    let config = Config::from_env();
    let port = config.port;

    tracing::info!("jimeng-proxy starting");
    if config.credentials().is_none() {
        tracing::warn!("  *** VOLC_ACCESS_KEY / VOLC_SECRET_KEY missing: every generate request will fail ***");
    }
    tracing::info!("  Vendor: {}", config.volc_api_url);
    tracing::info!("  Model: {} ({} {})", volc::REQ_KEY, volc::ACTION, volc::API_VERSION);
    match config.volc_timeout {
        Some(timeout) => tracing::info!("  Vendor timeout: {:?}", timeout),
        None => tracing::info!("  Vendor timeout: none"),
    }

    let state = web::Data::new(AppState::new(config));

    tracing::info!("Listening on 0.0.0.0:{}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await?;

    tracing::info!("Shutting down");

    Ok(())
}
