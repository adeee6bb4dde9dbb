use std::sync::Arc;

use actix_web::{post, web, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    models::dto::{request::RecommendVideosRequest, response::RecommendationsResponse},
};

#[post("/recommend-videos")]
pub async fn recommend_videos(
    state: web::Data<Arc<AppState>>,
    request: web::Json<RecommendVideosRequest>,
) -> Result<HttpResponse, AppError> {
    let recommendations = state
        .recommendation_service
        .recommend(&request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(RecommendationsResponse { recommendations }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        services::{
            llm_client::MockLanguageModel, web_search::MockWebSearch,
            youtube_client::MockVideoCatalog,
        },
        test_utils::fixtures::{search_item, video_item},
    };
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    fn state(fast_model: MockLanguageModel, catalog: MockVideoCatalog) -> Arc<AppState> {
        Arc::new(AppState::from_parts(
            Config::test_config(),
            Arc::new(MockLanguageModel::new()),
            Arc::new(fast_model),
            Arc::new(catalog),
            Arc::new(MockWebSearch::new()),
        ))
    }

    #[actix_web::test]
    async fn test_recommend_videos_success() {
        let mut model = MockLanguageModel::new();
        model
            .expect_complete()
            .returning(|_| Ok(r#"[{"videoId": "v1", "relevanceScore": 8.5, "benefit": "Learn Go"}]"#.to_string()));
        let mut catalog = MockVideoCatalog::new();
        catalog
            .expect_search_videos()
            .returning(|_| Ok(vec![search_item("v1", "Go in one hour")]));
        catalog
            .expect_video_details()
            .returning(|_| Ok(vec![video_item("v1", "Go in one hour", 2_500_000)]));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(model, catalog)))
                .service(recommend_videos),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend-videos")
            .set_json(json!({ "query": "golang", "knowledgeLevel": "Intermediate" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let first = &body["recommendations"][0];
        assert_eq!(first["videoId"], "v1");
        assert_eq!(first["relevanceScore"], 8.5);
        assert_eq!(first["views"], "2.5M");
        assert_eq!(first["benefit"], "Learn Go");
    }

    #[actix_web::test]
    async fn test_recommend_videos_rejects_empty_query() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(
                    MockLanguageModel::new(),
                    MockVideoCatalog::new(),
                )))
                .service(recommend_videos),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend-videos")
            .set_json(json!({ "query": "" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
