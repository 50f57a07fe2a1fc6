use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::volc::{self, VendorBody, VendorError, VolcClient};

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub prompt: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct FailureResponse {
    error: String,
    details: String,
}

fn error_json(status: StatusCode, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse { error: message })
}

/// Extract a usable prompt from a raw request body.
/// Missing, non-string, empty and whitespace-only prompts are all rejected.
pub fn parse_prompt(body: &[u8]) -> Option<String> {
    let request: GenerateRequest = serde_json::from_slice(body).ok()?;
    request.prompt.filter(|p| !p.trim().is_empty())
}

pub async fn method_not_allowed() -> HttpResponse {
    error_json(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub async fn handle_generate(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    match handle_generate_inner(&state, &body).await {
        Ok(resp) => resp,
        Err(resp) => resp,
    }
}

async fn handle_generate_inner(
    state: &AppState,
    body: &[u8],
) -> Result<HttpResponse, HttpResponse> {
    let prompt = parse_prompt(body)
        .ok_or_else(|| error_json(StatusCode::BAD_REQUEST, "Prompt is required"))?;

    let credentials = state.config.credentials().ok_or_else(|| {
        tracing::error!("VOLC_ACCESS_KEY / VOLC_SECRET_KEY are not configured");
        error_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error: Missing API keys",
        )
    })?;

    let request_id = uuid::Uuid::new_v4().simple().to_string();
    let request_id = &request_id[..8];

    tracing::info!("[{}] Calling Volcengine API with prompt: {}", request_id, prompt);

    let client = VolcClient::new(
        state.http_client.clone(),
        credentials,
        &state.config.volc_api_url,
    );

    let result = client
        .generate(&prompt)
        .await
        .map_err(|e| vendor_error_response(request_id, e))?;

    tracing::info!("[{}] Volcengine API response: {}", request_id, result);

    if let Some(code) = volc::response_code(&result) {
        if code != volc::SUCCESS_CODE {
            // relayed as-is; the client decides what it can render
            tracing::warn!("[{}] Volcengine returned in-band code {}", request_id, code);
        }
    }

    Ok(HttpResponse::Ok().json(result))
}

fn vendor_error_response(request_id: &str, err: VendorError) -> HttpResponse {
    match err {
        VendorError::Status { status, body } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            match body {
                VendorBody::Json(json) => {
                    tracing::error!("[{}] API error {}: {}", request_id, status, json);
                    HttpResponse::build(status).json(json)
                }
                VendorBody::Text(text) => {
                    tracing::error!("[{}] API error {}: {}", request_id, status, text);
                    HttpResponse::build(status)
                        .content_type("text/plain")
                        .body(text)
                }
            }
        }
        other => {
            tracing::error!("[{}] API error: {:?}", request_id, other);
            HttpResponse::InternalServerError().json(FailureResponse {
                error: other.to_string(),
                details: format!("{:?}", other),
            })
        }
    }
}
