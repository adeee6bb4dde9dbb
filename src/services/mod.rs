pub mod course_service;
pub mod formatting;
pub mod llm_client;
pub mod recommendation_service;
pub mod reconciler;
pub mod retry;
pub mod web_search;
pub mod youtube_client;

pub use course_service::CourseService;
pub use recommendation_service::RecommendationService;
