use crate::{
    models::dto::request::{GenerateCourseRequest, RecommendVideosRequest},
    services::youtube_client::{
        ContentDetails, SearchItem, SearchItemId, Snippet, Statistics, Thumbnail, Thumbnails,
        VideoItem,
    },
};

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use serde_json::{json, Map, Value};

    pub fn video_data() -> Map<String, Value> {
        match json!({
            "thumbnail": "https://i.ytimg.com/vi/abc123/hqdefault.jpg",
            "channel": "Ferris Talks",
            "duration": "PT42M10S"
        }) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Creates a standard course generation request
    pub fn generate_request() -> GenerateCourseRequest {
        GenerateCourseRequest {
            video_id: "abc123".to_string(),
            video_title: "Rust Ownership Explained".to_string(),
            video_description: "Chapters:\n00:00 Intro\n05:00 Borrowing".to_string(),
            transcript: "00:00 Welcome\n05:00 Borrowing rules".to_string(),
            video_data: video_data(),
        }
    }

    /// A model reply wrapped in prose and code fences, missing `videoId`.
    pub fn model_reply() -> String {
        let document = json!({
            "title": "Mastering Ownership",
            "description": "A short course on Rust ownership.",
            "metadata": {
                "overviewText": "Learn how ownership and borrowing work.",
                "difficulty": "Beginner",
                "tags": ["rust", "ownership"]
            },
            "courseItems": [
                {
                    "type": "section",
                    "title": "Basics",
                    "lessons": [
                        { "title": "Intro", "startTime": 0, "keyPoints": ["moves"] },
                        { "title": "Borrowing", "startTime": "05:00" }
                    ]
                },
                { "type": "assessment_placeholder", "assessmentType": "project" }
            ],
            "resources": [
                { "title": "The Rust Book", "url": "https://doc.rust-lang.org/book/", "type": "documentation" },
                { "title": "Link", "url": "https://github.com/rust-lang/rustlings" }
            ]
        });
        format!("Here is your course:\n```json\n{}\n```\nEnjoy!", document)
    }

    pub fn recommend_request(query: &str) -> RecommendVideosRequest {
        RecommendVideosRequest {
            query: query.to_string(),
            knowledge_level: "Beginner".to_string(),
            preferred_channels: Vec::new(),
            additional_context: String::new(),
            video_length: "Any".to_string(),
        }
    }

    pub fn snippet(title: &str) -> Snippet {
        Snippet {
            title: Some(title.to_string()),
            channel_title: Some("Test Channel".to_string()),
            description: Some(format!("About {}", title)),
            published_at: Some("2024-03-01T00:00:00Z".to_string()),
            thumbnails: Thumbnails {
                high: Some(Thumbnail {
                    url: format!("https://i.ytimg.com/vi/{}/hq.jpg", title.len()),
                }),
                medium: None,
                default: None,
            },
        }
    }

    pub fn search_item(video_id: &str, title: &str) -> SearchItem {
        SearchItem {
            id: SearchItemId {
                video_id: Some(video_id.to_string()),
                channel_id: None,
            },
            snippet: snippet(title),
        }
    }

    pub fn video_item(video_id: &str, title: &str, views: u64) -> VideoItem {
        VideoItem {
            id: video_id.to_string(),
            snippet: snippet(title),
            content_details: ContentDetails {
                duration: Some("PT12M5S".to_string()),
            },
            statistics: Statistics {
                view_count: Some(views.to_string()),
            },
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::services::reconciler::extract_json_object;

    #[test]
    fn test_fixtures_generate_request() {
        let request = generate_request();
        assert_eq!(request.video_id, "abc123");
        assert!(request.video_data.contains_key("thumbnail"));
    }

    #[test]
    fn test_fixtures_model_reply_is_extractable() {
        let document = extract_json_object(&model_reply()).expect("fixture should extract");
        assert_eq!(document["title"], "Mastering Ownership");
        assert!(!document.contains_key("videoId"));
    }

    #[test]
    fn test_fixtures_video_item() {
        let item = video_item("v1", "Rust", 1500);
        assert_eq!(item.statistics.view_count.as_deref(), Some("1500"));
        assert_eq!(search_item("v1", "Rust").id.video_id.as_deref(), Some("v1"));
    }
}
