use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::AppState;
use crate::handler;
use crate::volc;

async fn info_text(state: web::Data<AppState>) -> HttpResponse {
    let mut out = String::new();
    out.push_str("jimeng-proxy\n");
    out.push_str(&format!("version: {}\n", env!("CARGO_PKG_VERSION")));
    out.push_str(&format!("vendor: {}\n", state.config.volc_api_url));
    out.push_str(&format!(
        "model: {} ({} {} / {} {})\n",
        volc::REQ_KEY,
        volc::ACTION,
        volc::API_VERSION,
        volc::SERVICE,
        volc::REGION
    ));
    out.push_str(&format!(
        "credentials: {}\n",
        if state.config.credentials().is_some() { "configured" } else { "missing" }
    ));
    out.push_str("\n--- endpoints ---\n\n");
    out.push_str("  POST /api/generate\n");
    out.push_str("    body: {\"prompt\": \"<text>\"}\n");
    out.push_str("    returns the raw Volcengine response on success\n");
    out.push_str("\n  GET /api/health\n");
    HttpResponse::Ok().content_type("text/plain").body(out)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    credentials: bool,
}

async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        credentials: state.config.credentials().is_some(),
    })
}

/// Register every route. Shared by the server binary and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(info_text))
        .route("/api/health", web::get().to(health))
        .service(
            web::resource("/api/generate")
                .route(web::post().to(handler::handle_generate))
                .default_service(web::to(handler::method_not_allowed)),
        );
}
