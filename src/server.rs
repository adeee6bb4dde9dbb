use actix_cors::Cors;
use actix_web::{error::InternalError, http::header, web, HttpResponse};

use crate::{
    config::Config, errors::AppError, handlers, models::dto::response::CourseErrorResponse,
};

/// Transcripts are large; keep well above a long video's text.
const JSON_BODY_LIMIT: usize = 4 * 1024 * 1024;

const GENERATE_COURSE_PATH: &str = "/generate-course";

/// Unreadable bodies are 400s. Course requests get the error document shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, req| {
            log::warn!("Rejected request body for {}: {}", req.path(), err);
            let app_error = AppError::ValidationError(err.to_string());
            if req.path() != GENERATE_COURSE_PATH {
                return app_error.into();
            }
            let document = CourseErrorResponse::new("", "", &app_error);
            InternalError::from_response(err, HttpResponse::BadRequest().json(document)).into()
        })
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(handlers::generate_course)
        .service(handlers::recommend_videos)
        .service(handlers::health_check)
        .service(handlers::health_check_live);
}

pub fn cors(config: &Config) -> Cors {
    config
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers(vec![header::HeaderName::from_static("x-request-id")])
        .supports_credentials()
        .max_age(3600)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app_state::AppState,
        middleware::RequestIdMiddleware,
        services::{
            llm_client::MockLanguageModel, web_search::MockWebSearch,
            youtube_client::MockVideoCatalog,
        },
    };
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn test_state() -> Arc<AppState> {
        let mut model = MockLanguageModel::new();
        model.expect_complete().times(0);
        Arc::new(AppState::from_parts(
            Config::test_config(),
            Arc::new(model),
            Arc::new(MockLanguageModel::new()),
            Arc::new(MockVideoCatalog::new()),
            Arc::new(MockWebSearch::new()),
        ))
    }

    #[actix_web::test]
    async fn test_unreadable_course_body_returns_error_document() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(routes),
        )
        .await;

        for payload in ["{\"video_id\": ", r#"{"video_id": "abc", "video_title": "T"}"#] {
            let req = test::TestRequest::post()
                .uri("/generate-course")
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .set_payload(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["videoId"], "");
            assert_eq!(body["title"], "Error");
            assert_eq!(body["courseItems"], serde_json::json!([]));
            assert!(body["error"].as_str().is_some_and(|e| e.contains("Validation")));
            assert!(body["metadata"]["overviewText"].is_string());
        }
    }

    #[actix_web::test]
    async fn test_unreadable_recommendation_body_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend-videos")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("[1, 2")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[actix_web::test]
    async fn test_routes_with_cors_and_request_id() {
        let config = Config::test_config();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_state()))
                .wrap(cors(&config))
                .wrap(RequestIdMiddleware)
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/health/live")
            .insert_header((header::ORIGIN, "http://localhost:3000"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:3000")
        );
    }
}
