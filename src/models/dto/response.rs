use serde::Serialize;

use crate::{
    errors::AppError,
    models::{domain::VideoRecommendation, dto::request::GenerateCourseRequest},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewOnly {
    pub overview_text: String,
}

/// Document-shaped failure payload so callers can still render a page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseErrorResponse {
    pub error: String,
    pub video_id: String,
    pub title: String,
    pub metadata: OverviewOnly,
    pub course_items: Vec<serde_json::Value>,
}

impl CourseErrorResponse {
    pub fn new(video_id: &str, video_title: &str, err: &AppError) -> Self {
        let title = if video_title.trim().is_empty() {
            "Error".to_string()
        } else {
            video_title.to_string()
        };
        Self {
            error: format!("Failed to generate course: {}", err),
            video_id: video_id.to_string(),
            title,
            metadata: OverviewOnly {
                overview_text: format!("Error: {}", err),
            },
            course_items: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProbeResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub video_id: String,
    pub title: String,
    pub description: &'static str,
    pub metadata: OverviewOnly,
    pub course_items: Vec<serde_json::Value>,
}

impl From<&GenerateCourseRequest> for ConnectionProbeResponse {
    fn from(request: &GenerateCourseRequest) -> Self {
        Self {
            status: "success",
            message: "Connection test successful",
            video_id: request.video_id.clone(),
            title: request.video_title.clone(),
            description: "Test connection successful",
            metadata: OverviewOnly {
                overview_text: "This is a test response to verify connectivity.".to_string(),
            },
            course_items: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<VideoRecommendation>,
}
