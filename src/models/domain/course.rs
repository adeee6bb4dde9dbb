use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A generated learning-course outline for a single video.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    pub title: String,
    /// Brief course description.
    pub description: String,
    pub video_id: String,
    pub image: Option<String>,
    pub metadata: CourseMetadata,
    pub course_items: Vec<CourseItem>,
    pub resources: Vec<Resource>,
    pub creator_resources: Vec<Resource>,
    pub creator_socials: Vec<Map<String, Value>>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseMetadata {
    pub overview_text: String,
    pub difficulty: Option<String>,
    pub duration: Option<String>,
    pub prerequisites: Vec<String>,
    pub objectives: Vec<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub sources: Vec<Map<String, Value>>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "type")]
pub enum CourseItem {
    #[serde(rename = "section")]
    Section(Section),
    #[serde(rename = "assessment_placeholder")]
    AssessmentPlaceholder {
        #[serde(rename = "assessmentType")]
        assessment_type: AssessmentType,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Section {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_lessons")]
    #[schemars(with = "Vec<Lesson>")]
    pub lessons: Vec<Lesson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Offset into the video, in seconds.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_seconds"
    )]
    #[schemars(with = "Option<f64>")]
    pub start_time: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string_list"
    )]
    #[schemars(with = "Option<Vec<String>>")]
    pub key_points: Option<Vec<String>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    Quiz,
    Assignment,
    Test,
    Project,
}

/// A link attached to a course. Every field is displayable as-is.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Resource {
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

fn lenient_lessons<'de, D>(deserializer: D) -> Result<Vec<Lesson>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Lesson>(item) {
            Ok(lesson) => Some(lesson),
            Err(err) => {
                log::warn!("Dropping unreadable lesson: {}", err);
                None
            }
        })
        .collect())
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(seconds_from_value))
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items.iter().filter_map(text_from_value).collect()),
        _ => None,
    })
}

/// Reads a timestamp given as seconds, a numeric string, or `MM:SS` / `HH:MM:SS`.
pub fn seconds_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|s| s.is_finite() && *s >= 0.0),
        Value::String(s) => parse_clock(s.trim()),
        _ => None,
    }
}

fn parse_clock(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    if !text.contains(':') {
        return text.parse::<f64>().ok().filter(|s| s.is_finite() && *s >= 0.0);
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    parts.iter().try_fold(0.0, |total, part| {
        let value = part.trim().parse::<f64>().ok().filter(|v| *v >= 0.0)?;
        Some(total * 60.0 + value)
    })
}

/// Renders scalar JSON as text; containers and null have no text form.
pub fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
