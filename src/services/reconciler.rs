//! Turns raw model output into a schema-complete [`CourseDocument`].
//!
//! Reconciliation runs in three passes over the model's JSON object:
//! extraction, field backfill from the request context, and resource
//! normalization. Only extraction can fail; every other anomaly is fixed in
//! place and logged.

use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    models::{
        domain::{
            course::text_from_value, CourseDocument, CourseItem, CourseMetadata, Resource,
        },
        dto::request::GenerateCourseRequest,
    },
    services::formatting::truncate_chars,
};

const EXCERPT_CHARS: usize = 200;

const GENERIC_TITLES: &[&str] = &["resource", "link", "url"];
const GENERIC_DESCRIPTIONS: &[&str] = &[
    "no description provided.",
    "no description available.",
    "none",
];
const GENERIC_TYPES: &[&str] = &["link", "other"];

pub const DEFAULT_RESOURCE_DESCRIPTION: &str = "No description provided.";
pub const DEFAULT_RESOURCE_TYPE: &str = "Link";

const SCALAR_METADATA_FIELDS: &[&str] = &["difficulty", "duration", "category"];
const LIST_METADATA_FIELDS: &[&str] = &["prerequisites", "objectives", "tags", "sources"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (excerpt: {excerpt:?})")]
pub struct MalformedResponseError {
    pub reason: String,
    pub excerpt: String,
}

impl MalformedResponseError {
    pub fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            excerpt: truncate_chars(raw, EXCERPT_CHARS).to_string(),
        }
    }
}

/// What the caller already knows about the video.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    pub video_id: &'a str,
    pub video_title: &'a str,
    pub video_description: &'a str,
    pub video_data: &'a Map<String, Value>,
}

impl<'a> ReconcileContext<'a> {
    /// Ground-truth thumbnail, from `thumbnail` or `details.thumbnail`.
    pub fn thumbnail(&self) -> Option<&'a str> {
        let direct = self.video_data.get("thumbnail").and_then(Value::as_str);
        let nested = || {
            self.video_data
                .get("details")
                .and_then(|details| details.get("thumbnail"))
                .and_then(Value::as_str)
        };
        direct
            .filter(|t| !t.trim().is_empty())
            .or_else(|| nested().filter(|t| !t.trim().is_empty()))
    }
}

impl<'a> From<&'a GenerateCourseRequest> for ReconcileContext<'a> {
    fn from(request: &'a GenerateCourseRequest) -> Self {
        Self {
            video_id: &request.video_id,
            video_title: &request.video_title,
            video_description: &request.video_description,
            video_data: &request.video_data,
        }
    }
}

pub fn reconcile(
    raw_text: &str,
    context: &ReconcileContext<'_>,
) -> Result<CourseDocument, MalformedResponseError> {
    let mut document = extract_json_object(raw_text)?;
    backfill_fields(&mut document, context);
    Ok(into_course_document(document))
}

/// Removes a leading fence with its language tag, and a trailing fence.
/// Content sharing the opening fence's line is kept.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

pub fn extract_json_object(raw_text: &str) -> Result<Map<String, Value>, MalformedResponseError> {
    let text = strip_code_fences(raw_text);
    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(MalformedResponseError::new(
                "no JSON object found in model response",
                raw_text,
            ))
        }
    };

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(MalformedResponseError::new(
            "model response is not a JSON object",
            raw_text,
        )),
        Err(err) => Err(MalformedResponseError::new(
            format!("invalid JSON in model response: {}", err),
            raw_text,
        )),
    }
}

/// Fills every top-level and metadata field the document shape requires.
/// Values that are already usable are left alone, except `image`, which
/// always follows the request's ground-truth thumbnail when there is one.
pub fn backfill_fields(document: &mut Map<String, Value>, context: &ReconcileContext<'_>) {
    if !has_text(document.get("videoId")) {
        document.insert("videoId".into(), Value::from(context.video_id));
    }
    if !has_text(document.get("title")) {
        document.insert("title".into(), Value::from(context.video_title));
    }
    if !has_text(document.get("description")) {
        document.insert("description".into(), Value::from(context.video_description));
    }

    match context.thumbnail() {
        Some(thumbnail) => {
            if let Some(Value::String(existing)) = document.get("image") {
                if existing != thumbnail {
                    log::debug!("Replacing model-supplied image with the video thumbnail");
                }
            }
            document.insert("image".into(), Value::from(thumbnail));
        }
        None => {
            if !has_text(document.get("image")) {
                document.insert("image".into(), Value::Null);
            }
        }
    }

    if !document.get("metadata").is_some_and(Value::is_object) {
        if document.contains_key("metadata") {
            log::warn!("Model returned non-object metadata, replacing it");
        }
        document.insert("metadata".into(), Value::Object(Map::new()));
    }
    let overview_fallback = document.get("description").cloned().unwrap_or(Value::Null);
    if let Some(Value::Object(metadata)) = document.get_mut("metadata") {
        if !has_text(metadata.get("overviewText")) {
            metadata.insert("overviewText".into(), overview_fallback);
        }
        for field in SCALAR_METADATA_FIELDS {
            metadata.entry(*field).or_insert(Value::Null);
        }
        for field in LIST_METADATA_FIELDS {
            metadata
                .entry(*field)
                .or_insert_with(|| Value::Array(Vec::new()));
        }
    }

    for field in ["courseItems", "creatorSocials", "resources", "creatorResources"] {
        if !document.get(field).is_some_and(Value::is_array) {
            if document.contains_key(field) {
                log::warn!("Model returned non-list {}, replacing it", field);
            }
            document.insert(field.into(), Value::Array(Vec::new()));
        }
    }
}

pub fn normalize_resources(entries: &[Value]) -> Vec<Resource> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            Value::Object(fields) => Some(normalize_resource(fields, index + 1)),
            other => {
                log::warn!("Dropping non-object resource entry {}: {}", index + 1, other);
                None
            }
        })
        .collect()
}

/// `position` is the entry's 1-based place in the raw list.
pub fn normalize_resource(entry: &Map<String, Value>, position: usize) -> Resource {
    let url = entry
        .get("url")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let title = non_generic_text(entry.get("title"), GENERIC_TITLES)
        .or_else(|| non_generic_text(entry.get("name"), GENERIC_TITLES))
        .or_else(|| title_from_url(&url))
        .unwrap_or_else(|| {
            if url.is_empty() {
                format!("Resource {}", position)
            } else {
                format!("Link {}", position)
            }
        });

    let description = non_generic_text(entry.get("description"), GENERIC_DESCRIPTIONS)
        .unwrap_or_else(|| DEFAULT_RESOURCE_DESCRIPTION.to_string());
    let resource_type = non_generic_text(entry.get("type"), GENERIC_TYPES)
        .unwrap_or_else(|| DEFAULT_RESOURCE_TYPE.to_string());
    let category = entry
        .get("category")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Resource {
        url,
        title,
        description,
        resource_type,
        category,
    }
}

/// Last non-empty path segment, else the capitalized registrable domain label.
fn title_from_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    let parsed = Url::parse(url)
        .or_else(|_| Url::parse(&format!("https://{}", url)))
        .ok()?;

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .filter(|s| !is_generic(s, GENERIC_TITLES));
    if segment.is_some() {
        return segment;
    }

    let host = parsed.host_str()?;
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return None;
    }
    Some(capitalize(labels[labels.len() - 2])).filter(|label| !is_generic(label, GENERIC_TITLES))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn non_generic_text(value: Option<&Value>, denylist: &[&str]) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty() && !is_generic(text, denylist))
        .map(str::to_string)
}

fn is_generic(text: &str, denylist: &[&str]) -> bool {
    denylist.iter().any(|generic| text.eq_ignore_ascii_case(generic))
}

fn has_text(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.trim().is_empty())
}

fn into_course_document(mut document: Map<String, Value>) -> CourseDocument {
    let metadata = match document.remove("metadata") {
        Some(Value::Object(metadata)) => metadata_from_map(&metadata),
        _ => CourseMetadata::default(),
    };

    let course_items = take_array(&mut document, "courseItems")
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| course_item_from_value(index + 1, item))
        .collect();

    CourseDocument {
        title: take_text(&mut document, "title"),
        description: take_text(&mut document, "description"),
        video_id: take_text(&mut document, "videoId"),
        image: document
            .remove("image")
            .and_then(|image| image.as_str().map(str::to_string)),
        metadata,
        course_items,
        resources: normalize_resources(&take_array(&mut document, "resources")),
        creator_resources: normalize_resources(&take_array(&mut document, "creatorResources")),
        creator_socials: objects_only(take_array(&mut document, "creatorSocials")),
    }
}

fn course_item_from_value(position: usize, value: Value) -> Option<CourseItem> {
    let Value::Object(mut item) = value else {
        log::warn!("Dropping non-object course item {}", position);
        return None;
    };
    if !item.contains_key("type") && item.contains_key("lessons") {
        item.insert("type".into(), Value::from("section"));
    }

    match serde_json::from_value::<CourseItem>(Value::Object(item)) {
        Ok(course_item) => Some(course_item),
        Err(err) => {
            log::warn!("Dropping unreadable course item {}: {}", position, err);
            None
        }
    }
}

fn metadata_from_map(metadata: &Map<String, Value>) -> CourseMetadata {
    CourseMetadata {
        overview_text: metadata
            .get("overviewText")
            .and_then(text_from_value)
            .unwrap_or_default(),
        difficulty: optional_text(metadata, "difficulty"),
        duration: optional_text(metadata, "duration"),
        prerequisites: text_list(metadata, "prerequisites"),
        objectives: text_list(metadata, "objectives"),
        category: optional_text(metadata, "category"),
        tags: text_list(metadata, "tags"),
        sources: objects_only(match metadata.get("sources") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        }),
    }
}

fn optional_text(metadata: &Map<String, Value>, field: &str) -> Option<String> {
    let value = metadata.get(field)?;
    let text = text_from_value(value);
    if text.is_none() && !value.is_null() {
        log::warn!("Ignoring non-scalar metadata.{}", field);
    }
    text
}

fn text_list(metadata: &Map<String, Value>, field: &str) -> Vec<String> {
    match metadata.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(text_from_value).collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.clone()],
        _ => Vec::new(),
    }
}

fn take_text(document: &mut Map<String, Value>, field: &str) -> String {
    document
        .remove(field)
        .as_ref()
        .and_then(text_from_value)
        .unwrap_or_default()
}

fn take_array(document: &mut Map<String, Value>, field: &str) -> Vec<Value> {
    match document.remove(field) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn objects_only(items: Vec<Value>) -> Vec<Map<String, Value>> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(object) => Some(object),
            _ => None,
        })
        .collect()
}
