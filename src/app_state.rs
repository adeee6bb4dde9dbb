use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    services::{
        llm_client::{LanguageModel, OpenAiLanguageModel},
        web_search::{HttpWebSearch, WebSearch},
        youtube_client::{VideoCatalog, YoutubeApiClient},
        CourseService, RecommendationService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub course_service: Arc<CourseService>,
    pub recommendation_service: Arc<RecommendationService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let primary_model = Arc::new(OpenAiLanguageModel::new(&config, config.llm_model.as_str()));
        let fast_model = Arc::new(OpenAiLanguageModel::new(
            &config,
            config.llm_fast_model.as_str(),
        ));
        let catalog = Arc::new(YoutubeApiClient::new(&config)?);
        let search = Arc::new(HttpWebSearch::new(&config)?);

        Ok(Self::from_parts(
            config,
            primary_model,
            fast_model,
            catalog,
            search,
        ))
    }

    /// Wires the services from already-built clients.
    pub fn from_parts(
        config: Config,
        primary_model: Arc<dyn LanguageModel>,
        fast_model: Arc<dyn LanguageModel>,
        catalog: Arc<dyn VideoCatalog>,
        search: Arc<dyn WebSearch>,
    ) -> Self {
        let retry_policy = config.retry_policy();
        let course_service = Arc::new(CourseService::new(primary_model, search, retry_policy));
        let recommendation_service = Arc::new(RecommendationService::new(
            fast_model,
            catalog,
            retry_policy,
        ));

        Self {
            course_service,
            recommendation_service,
            config: Arc::new(config),
        }
    }
}
