use std::sync::Arc;

use actix_web::{get, web, HttpResponse};

use crate::app_state::AppState;

fn presence(is_set: bool) -> &'static str {
    if is_set {
        "SET"
    } else {
        "MISSING"
    }
}

fn loaded(is_loaded: bool) -> &'static str {
    if is_loaded {
        "LOADED"
    } else {
        "NOT_LOADED"
    }
}

#[get("/health")]
pub async fn health_check(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let config = &state.config;
    let llm_ready = config.llm_api_key.is_some();
    let youtube_ready = config.youtube_api_key.is_some();

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": {
            "llmApiKey": presence(llm_ready),
            "youtubeApiKey": presence(youtube_ready),
            "searchApi": presence(config.search_configured()),
            "models": {
                "primary": config.llm_model,
                "fast": config.llm_fast_model
            },
            "components": {
                "courseGenerator": loaded(llm_ready),
                "videoRecommendation": loaded(llm_ready && youtube_ready)
            }
        }
    }))
}

#[get("/health/live")]
pub async fn health_check_live() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
