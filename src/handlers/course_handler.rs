use std::sync::Arc;

use actix_web::{post, web, HttpResponse, ResponseError};

use crate::{
    app_state::AppState,
    models::dto::{
        request::GenerateCourseRequest,
        response::{ConnectionProbeResponse, CourseErrorResponse},
    },
};

#[post("/generate-course")]
pub async fn generate_course(
    state: web::Data<Arc<AppState>>,
    request: web::Json<GenerateCourseRequest>,
) -> HttpResponse {
    let request = request.into_inner();
    if request.is_connection_probe() {
        log::info!("Connection probe received");
        return HttpResponse::Ok().json(ConnectionProbeResponse::from(&request));
    }

    match state.course_service.generate_course(&request).await {
        Ok(document) => HttpResponse::Ok().json(document),
        Err(err) => {
            log::error!("Course generation failed for {}: {}", request.video_id, err);
            HttpResponse::build(err.status_code()).json(CourseErrorResponse::new(
                &request.video_id,
                &request.video_title,
                &err,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        errors::AppError,
        services::{
            llm_client::MockLanguageModel, web_search::MockWebSearch,
            youtube_client::MockVideoCatalog,
        },
        test_utils::{fixtures, test_helpers::assert_error_status},
    };
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    fn state_with_model(model: MockLanguageModel) -> Arc<AppState> {
        let mut search = MockWebSearch::new();
        search.expect_search().returning(|_, _| Ok(Vec::new()));
        Arc::new(AppState::from_parts(
            Config::test_config(),
            Arc::new(model),
            Arc::new(MockLanguageModel::new()),
            Arc::new(MockVideoCatalog::new()),
            Arc::new(search),
        ))
    }

    fn request_body() -> Value {
        json!({
            "video_id": "abc123",
            "video_title": "Rust Ownership Explained",
            "video_description": "Ownership in depth",
            "transcript": "00:00 Welcome",
            "video_data": { "thumbnail": "https://i.ytimg.com/vi/abc123/hqdefault.jpg" }
        })
    }

    #[actix_web::test]
    async fn test_generate_course_success() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .times(1)
            .returning(|_| Ok(fixtures::model_reply()));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_model(model)))
                .service(generate_course),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate-course")
            .set_json(request_body())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["videoId"], "abc123");
        assert_eq!(body["title"], "Mastering Ownership");
        assert_eq!(body["image"], "https://i.ytimg.com/vi/abc123/hqdefault.jpg");
        assert_eq!(body["courseItems"][0]["type"], "section");
    }

    #[actix_web::test]
    async fn test_connection_probe_skips_model() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().times(0);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_model(model)))
                .service(generate_course),
        )
        .await;

        let mut body = request_body();
        body["video_id"] = json!("test_connection");
        let req = test::TestRequest::post()
            .uri("/generate-course")
            .set_json(body)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "success");
        assert_eq!(body["videoId"], "test_connection");
        assert_eq!(body["courseItems"], json!([]));
    }

    #[actix_web::test]
    async fn test_model_failure_returns_error_document() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Ok("no json here".to_string()));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_model(model)))
                .service(generate_course),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate-course")
            .set_json(request_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["videoId"], "abc123");
        assert_eq!(body["title"], "Rust Ownership Explained");
        assert!(body["error"].as_str().is_some_and(|e| e.contains("Malformed")));
        assert_eq!(body["courseItems"], json!([]));
    }

    #[actix_web::test]
    async fn test_empty_video_id_is_bad_request() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().times(0);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_model(model)))
                .service(generate_course),
        )
        .await;

        let mut body = request_body();
        body["video_id"] = json!("");
        body["video_title"] = json!("");
        let req = test::TestRequest::post()
            .uri("/generate-course")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["title"], "Error");
    }

    #[actix_web::test]
    async fn test_rate_limit_exhaustion_is_server_error() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .times(3)
            .returning(|_| Err(AppError::RateLimited("429 quota".into())));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with_model(model)))
                .service(generate_course),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate-course")
            .set_json(request_body())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_error_status(resp.status());
    }
}
