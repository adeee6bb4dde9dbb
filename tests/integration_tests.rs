use course_agent_server::{
    errors::AppError,
    models::domain::{CourseDocument, CourseItem},
    services::reconciler::{reconcile, ReconcileContext},
};
use serde_json::{json, Map, Value};

fn video_data() -> Map<String, Value> {
    let mut data = Map::new();
    data.insert(
        "details".to_string(),
        json!({ "thumbnail": "https://i.ytimg.com/vi/xyz/maxresdefault.jpg" }),
    );
    data
}

fn context(video_data: &Map<String, Value>) -> ReconcileContext<'_> {
    ReconcileContext {
        video_id: "xyz",
        video_title: "Flutter in 100 Seconds",
        video_description: "Build apps fast",
        video_data,
    }
}

#[actix_web::test]
async fn test_reconcile_through_public_api() {
    let data = video_data();
    let raw = r#"Sure thing!
```json
{
  "title": "",
  "metadata": { "difficulty": "Beginner" },
  "courseItems": [
    { "type": "section", "title": "Widgets", "lessons": [{ "title": "Stateless", "startTime": "1:05" }] },
    { "type": "assessment_placeholder", "assessmentType": "quiz" },
    { "type": "mystery" }
  ],
  "resources": [{ "name": "Flutter docs", "url": "https://docs.flutter.dev" }]
}
```"#;

    let document = reconcile(raw, &context(&data)).expect("reply should reconcile");

    assert_eq!(document.video_id, "xyz");
    assert_eq!(document.title, "Flutter in 100 Seconds");
    assert_eq!(document.description, "Build apps fast");
    assert_eq!(
        document.image.as_deref(),
        Some("https://i.ytimg.com/vi/xyz/maxresdefault.jpg")
    );
    assert_eq!(document.metadata.difficulty.as_deref(), Some("Beginner"));
    assert_eq!(document.course_items.len(), 2);
    match &document.course_items[0] {
        CourseItem::Section(section) => {
            assert_eq!(section.lessons[0].start_time, Some(65.0));
        }
        other => panic!("expected a section, got {:?}", other),
    }
    assert_eq!(document.resources[0].title, "Flutter docs");
    assert_eq!(document.resources[0].description, "No description provided.");
}

#[actix_web::test]
async fn test_reconciled_document_round_trips() {
    let data = video_data();
    let first = reconcile(
        r#"{"title": "T", "description": "D", "resources": [{"url": "https://a.dev/guide"}]}"#,
        &context(&data),
    )
    .expect("reply should reconcile");

    let serialized = serde_json::to_string(&first).expect("document should serialize");
    let second = reconcile(&serialized, &context(&data)).expect("output should reconcile");
    assert_eq!(first, second);

    let parsed: CourseDocument =
        serde_json::from_str(&serialized).expect("document should deserialize");
    assert_eq!(parsed, first);
}

#[actix_web::test]
async fn test_unparsable_reply_maps_to_malformed_error() {
    let data = video_data();
    let err = reconcile("{ not json }", &context(&data)).expect_err("reply should fail");
    let app_error = AppError::from(err);

    assert!(matches!(app_error, AppError::MalformedResponse(_)));
    assert_eq!(app_error.error_code(), "MALFORMED_RESPONSE");
}

#[cfg(test)]
mod sync_tests {
    use course_agent_server::errors::AppError;

    #[test]
    fn test_provider_messages_are_classified() {
        assert!(matches!(
            AppError::from_provider_message("HTTP 429 Too Many Requests"),
            AppError::RateLimited(_)
        ));
        assert!(matches!(
            AppError::from_provider_message("connection reset"),
            AppError::Upstream(_)
        ));
    }
}
