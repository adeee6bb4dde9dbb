use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

/// `video_id` value used by clients to probe connectivity without a model call.
pub const CONNECTION_PROBE_VIDEO_ID: &str = "test_connection";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateCourseRequest {
    #[validate(length(min = 1, max = 64))]
    pub video_id: String,

    pub video_title: String,

    #[serde(default)]
    pub video_description: String,

    pub transcript: String,

    #[serde(default)]
    pub video_data: Map<String, Value>,
}

impl GenerateCourseRequest {
    pub fn is_connection_probe(&self) -> bool {
        self.video_id == CONNECTION_PROBE_VIDEO_ID
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecommendVideosRequest {
    #[validate(length(min = 1, max = 500))]
    pub query: String,

    #[serde(default = "default_knowledge_level")]
    pub knowledge_level: String,

    #[serde(default)]
    pub preferred_channels: Vec<String>,

    #[serde(default)]
    pub additional_context: String,

    #[serde(default = "default_video_length")]
    pub video_length: String,
}

fn default_knowledge_level() -> String {
    "Beginner".to_string()
}

fn default_video_length() -> String {
    "Any".to_string()
}
