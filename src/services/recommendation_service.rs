use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use validator::Validate;

use crate::{
    constants::prompts::{PromptTemplate, SEARCH_QUERY_PROMPT, VIDEO_ANALYSIS_PROMPT},
    errors::{AppError, AppResult},
    models::{
        domain::{VideoRecommendation, VideoSummary},
        dto::request::RecommendVideosRequest,
    },
    services::{
        formatting::{
            format_duration, format_publish_date, format_views, parse_view_count, truncate_chars,
        },
        llm_client::LanguageModel,
        reconciler::strip_code_fences,
        retry::{retry_with_backoff, RetryDisposition, RetryPolicy},
        youtube_client::{SearchItem, VideoCatalog, VideoItem, VideoSearchQuery},
    },
};

const RESULTS_PER_QUERY: u32 = 3;
const RETRY_RESULTS: u32 = 5;
const FALLBACK_RESULTS: u32 = 10;
const MAX_FORMATTED_VIDEOS: usize = 5;
const MAX_ANALYZED_VIDEOS: usize = 3;
const MAX_RECOMMENDATIONS: usize = 5;
const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

const EDUCATIONAL_TERMS: &[&str] = &[
    "tutorial",
    "course",
    "learn",
    "guide",
    "introduction",
    "explained",
    "basics",
];

static LEVEL_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)for (beginners|intermediates|advanced)")
        .expect("LEVEL_PHRASE is a valid regex pattern")
});
static FORMAT_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)step by step|tutorial|course|lesson")
        .expect("FORMAT_WORDS is a valid regex pattern")
});

#[derive(Debug, Error)]
enum AnalysisError {
    #[error("analysis timed out after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Model(#[from] AppError),
}

impl AnalysisError {
    /// A timed-out analysis falls through to keyword ranking right away.
    fn retry_disposition(&self) -> RetryDisposition {
        match self {
            AnalysisError::TimedOut(_) => RetryDisposition::Permanent,
            AnalysisError::Model(err) => err.retry_disposition(),
        }
    }
}

pub struct RecommendationService {
    model: Arc<dyn LanguageModel>,
    catalog: Arc<dyn VideoCatalog>,
    retry_policy: RetryPolicy,
    analysis_timeout: Duration,
}

impl RecommendationService {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        catalog: Arc<dyn VideoCatalog>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            model,
            catalog,
            retry_policy,
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
        }
    }

    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    /// Recommends videos for a learning goal. Only invalid input is an error;
    /// every downstream failure degrades to a fallback list.
    pub async fn recommend(
        &self,
        request: &RecommendVideosRequest,
    ) -> AppResult<Vec<VideoRecommendation>> {
        request.validate()?;
        if request.query.trim().is_empty() {
            return Err(AppError::ValidationError("query must not be blank".to_string()));
        }

        log::info!(
            "Recommending videos for '{}' ({})",
            request.query,
            request.knowledge_level
        );
        match self.find_recommendations(request).await {
            Ok(recommendations) => Ok(recommendations),
            Err(err) => {
                log::error!("Recommendation failed, returning canned results: {}", err);
                Ok(canned_recommendations(request))
            }
        }
    }

    async fn find_recommendations(
        &self,
        request: &RecommendVideosRequest,
    ) -> AppResult<Vec<VideoRecommendation>> {
        let queries = self.search_queries(request).await;
        log::info!("Searching with {} queries: {:?}", queries.len(), queries);

        let mut hits = self.search_all(request, &queries).await;
        if hits.is_empty() {
            log::warn!("No videos found in initial search");
            hits = self.fallback_search(request).await;
        }
        if hits.is_empty() {
            log::warn!("All searches came back empty, returning canned results");
            return Ok(canned_recommendations(request));
        }

        let details = self.fetch_details(&hits).await;
        let current_year = chrono::Utc::now().year();
        let videos: Vec<VideoSummary> = hits
            .iter()
            .filter_map(|hit| hit.id.video_id.as_ref())
            .take(MAX_FORMATTED_VIDEOS)
            .filter_map(|video_id| details.get(video_id))
            .map(|item| summarize(item, current_year))
            .collect();
        if videos.is_empty() {
            return Ok(canned_recommendations(request));
        }

        let shortlist = shortlist(videos, &request.query, MAX_ANALYZED_VIDEOS);
        if let Some(recommendations) = self.analyze(request, &shortlist).await? {
            return Ok(recommendations);
        }

        log::warn!("Using keyword ranking for {} videos", shortlist.len());
        Ok(keyword_ranking(&shortlist, request))
    }

    async fn search_queries(&self, request: &RecommendVideosRequest) -> Vec<String> {
        let direct_query = format!(
            "{} {} tutorial course lesson",
            request.query, request.knowledge_level
        );

        let prompt = match PromptTemplate::new(SEARCH_QUERY_PROMPT)
            .with("query", request.query.as_str())
            .with("knowledge_level", request.knowledge_level.as_str())
            .with("additional_context", additional_context(request))
            .render()
        {
            Ok(prompt) => prompt,
            Err(err) => {
                log::warn!("Search query prompt failed to render: {}", err);
                return vec![direct_query];
            }
        };

        let reply = retry_with_backoff(
            &self.retry_policy,
            "search query generation",
            AppError::retry_disposition,
            || self.model.complete(&prompt),
        )
        .await;

        match reply.map(|text| parse_query_list(&text)) {
            Ok(Some(queries)) => queries,
            Ok(None) => {
                log::warn!("Unusable search query reply, using direct query");
                vec![direct_query]
            }
            Err(err) => {
                log::warn!("Search query generation failed: {}", err);
                vec![direct_query]
            }
        }
    }

    async fn search_all(
        &self,
        request: &RecommendVideosRequest,
        queries: &[String],
    ) -> Vec<SearchItem> {
        let duration = duration_filter(&request.video_length);
        let mut collector = HitCollector::default();

        for query in queries {
            let base = VideoSearchQuery::new(query.as_str(), RESULTS_PER_QUERY)
                .high_quality()
                .with_duration(duration);

            for channel in &request.preferred_channels {
                match self.search_channel(&base, channel).await {
                    Ok(items) => collector.extend(items),
                    Err(err) => log::warn!("Failed to search channel {}: {}", channel, err),
                }
            }

            match self.catalog.search_videos(&base).await {
                Ok(items) => collector.extend(items),
                Err(err) => {
                    log::warn!("Search for '{}' failed: {}", query, err);
                    let retry = VideoSearchQuery::new(
                        format!("{} tutorial lesson", request.query),
                        RETRY_RESULTS,
                    )
                    .with_duration(duration);
                    match self.catalog.search_videos(&retry).await {
                        Ok(items) => collector.extend(items),
                        Err(err) => log::warn!("Retry search failed: {}", err),
                    }
                }
            }
        }
        collector.into_hits()
    }

    async fn search_channel(
        &self,
        base: &VideoSearchQuery,
        channel: &str,
    ) -> AppResult<Vec<SearchItem>> {
        match self.catalog.find_channel_id(channel).await? {
            Some(channel_id) => {
                self.catalog
                    .search_videos(&base.clone().in_channel(channel_id))
                    .await
            }
            None => {
                log::info!("No channel found for {}", channel);
                Ok(Vec::new())
            }
        }
    }

    async fn fallback_search(&self, request: &RecommendVideosRequest) -> Vec<SearchItem> {
        let generic = generic_query(&request.query);
        let mut attempts = Vec::new();
        if !generic.is_empty() {
            attempts.push(generic.clone());
        }
        let topic = generic
            .split_whitespace()
            .next()
            .or_else(|| request.query.split_whitespace().next());
        if let Some(topic) = topic {
            attempts.push(format!("{} tutorial", topic));
        }

        for attempt in attempts {
            log::info!("Trying fallback search '{}'", attempt);
            let query = VideoSearchQuery::new(attempt.as_str(), FALLBACK_RESULTS);
            match self.catalog.search_videos(&query).await {
                Ok(items) => {
                    let mut collector = HitCollector::default();
                    collector.extend(items);
                    let hits = collector.into_hits();
                    if !hits.is_empty() {
                        return hits;
                    }
                }
                Err(err) => log::warn!("Fallback search '{}' failed: {}", attempt, err),
            }
        }
        Vec::new()
    }

    async fn fetch_details(&self, hits: &[SearchItem]) -> HashMap<String, VideoItem> {
        let ids: Vec<String> = hits
            .iter()
            .filter_map(|hit| hit.id.video_id.clone())
            .collect();

        let details = match self.catalog.video_details(&ids).await {
            Ok(items) => Ok(items),
            Err(err) => {
                log::warn!("Video details request failed, retrying: {}", err);
                self.catalog.video_details(&ids).await
            }
        };

        match details {
            Ok(items) => items.into_iter().map(|item| (item.id.clone(), item)).collect(),
            Err(err) => {
                log::warn!("Using search snippets as video details: {}", err);
                hits.iter()
                    .filter_map(VideoItem::from_search_item)
                    .map(|item| (item.id.clone(), item))
                    .collect()
            }
        }
    }

    /// `Ok(None)` means the model gave nothing usable and keyword ranking applies.
    async fn analyze(
        &self,
        request: &RecommendVideosRequest,
        videos: &[VideoSummary],
    ) -> AppResult<Option<Vec<VideoRecommendation>>> {
        let listing = videos
            .iter()
            .enumerate()
            .map(|(index, video)| {
                format!(
                    "Video {}: ID={} | Title={} | Duration={}",
                    index + 1,
                    video.video_id,
                    video.title,
                    video.duration
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = PromptTemplate::new(VIDEO_ANALYSIS_PROMPT)
            .with("query", request.query.as_str())
            .with("knowledge_level", request.knowledge_level.as_str())
            .with("videos", listing)
            .render()?;

        let timeout = self.analysis_timeout;
        let model = &self.model;
        let prompt = prompt.as_str();
        let reply = retry_with_backoff(
            &self.retry_policy,
            "video analysis",
            AnalysisError::retry_disposition,
            || async move {
                match tokio::time::timeout(timeout, model.complete(prompt)).await {
                    Ok(result) => result.map_err(AnalysisError::from),
                    Err(_) => Err(AnalysisError::TimedOut(timeout)),
                }
            },
        )
        .await;

        match reply {
            Ok(text) => {
                log::debug!("Analysis reply: {}", truncate_chars(&text, 200));
                let parsed = parse_analysis(&text, videos, &request.query);
                if parsed.is_none() {
                    log::warn!("Analysis reply had no usable recommendations");
                }
                Ok(parsed)
            }
            Err(err) => {
                log::warn!("Video analysis failed: {}", err);
                Ok(None)
            }
        }
    }
}

/// Search hits de-duplicated by video id, in first-seen order.
#[derive(Default)]
struct HitCollector {
    seen: HashSet<String>,
    hits: Vec<SearchItem>,
}

impl HitCollector {
    fn extend(&mut self, items: Vec<SearchItem>) {
        for item in items {
            let Some(video_id) = item.id.video_id.clone() else {
                continue;
            };
            if self.seen.insert(video_id) {
                self.hits.push(item);
            }
        }
    }

    fn into_hits(self) -> Vec<SearchItem> {
        self.hits
    }
}

fn additional_context(request: &RecommendVideosRequest) -> String {
    let context = request.additional_context.trim();
    if context.is_empty() {
        "None provided".to_string()
    } else {
        context.to_string()
    }
}

/// Maps the requested length onto YouTube's `videoDuration` buckets.
pub fn duration_filter(video_length: &str) -> Option<&'static str> {
    let lowered = video_length.trim().to_lowercase();
    if lowered.starts_with("short") {
        Some("short")
    } else if lowered.starts_with("medium") {
        Some("medium")
    } else if lowered.starts_with("long") {
        Some("long")
    } else {
        None
    }
}

/// The learning goal with level phrases and format words removed.
pub fn generic_query(query: &str) -> String {
    let without_level = LEVEL_PHRASE.replace_all(query, "");
    let without_format = FORMAT_WORDS.replace_all(&without_level, "");
    without_format.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reads a JSON array of query strings, tolerating fences and prose.
pub fn parse_query_list(text: &str) -> Option<Vec<String>> {
    let text = strip_code_fences(text);
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end <= start {
        return None;
    }
    let values: Vec<Value> = serde_json::from_str(&text[start..=end]).ok()?;
    let queries: Vec<String> = values
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|query| !query.is_empty())
        .map(str::to_string)
        .collect();
    (!queries.is_empty()).then_some(queries)
}

/// Merges the model's scores with the known videos. Accepts a bare array or
/// an object with a `recommendations` array; entries for unknown ids are dropped.
pub fn parse_analysis(
    text: &str,
    videos: &[VideoSummary],
    query: &str,
) -> Option<Vec<VideoRecommendation>> {
    let value = analysis_value(strip_code_fences(text))?;
    let entries = match &value {
        Value::Array(entries) => entries,
        Value::Object(object) => object.get("recommendations")?.as_array()?,
        _ => return None,
    };

    let by_id: HashMap<&str, &VideoSummary> = videos
        .iter()
        .map(|video| (video.video_id.as_str(), video))
        .collect();
    let mut seen = HashSet::new();
    let mut recommendations: Vec<VideoRecommendation> = entries
        .iter()
        .filter_map(|entry| {
            let video_id = entry.get("videoId")?.as_str()?;
            let video = by_id.get(video_id)?;
            if !seen.insert(video_id) {
                return None;
            }
            let score = entry
                .get("relevanceScore")
                .and_then(|score| {
                    score
                        .as_f64()
                        .or_else(|| score.as_str().and_then(|s| s.trim().parse().ok()))
                })
                .filter(|score: &f64| score.is_finite())
                .unwrap_or(5.0);
            let benefit = entry
                .get("benefit")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|benefit| !benefit.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Video about {}.", query));
            Some(video.recommend(score, benefit))
        })
        .collect();

    if recommendations.is_empty() {
        return None;
    }
    recommendations.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    Some(recommendations)
}

fn analysis_value(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text.trim()) {
        return Some(value);
    }
    [('[', ']'), ('{', '}')].into_iter().find_map(|(open, close)| {
        let start = text.find(open)?;
        let end = text.rfind(close)?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&text[start..=end]).ok()
    })
}

fn summarize(item: &VideoItem, current_year: i32) -> VideoSummary {
    let snippet = &item.snippet;
    VideoSummary {
        video_id: item.id.clone(),
        title: snippet
            .title
            .clone()
            .unwrap_or_else(|| "Unknown Title".to_string()),
        channel_name: snippet
            .channel_title
            .clone()
            .unwrap_or_else(|| "Unknown Channel".to_string()),
        thumbnail: snippet.thumbnails.best_url(),
        duration: format_duration(item.content_details.duration.as_deref().unwrap_or_default()),
        views: format_views(item.statistics.view_count.as_deref().unwrap_or("0")),
        publish_date: format_publish_date(snippet.published_at.as_deref(), current_year),
        description: truncate_chars(snippet.description.as_deref().unwrap_or_default(), 500)
            .to_string(),
    }
}

fn matching_terms(title_lower: &str, query_lower: &str) -> usize {
    query_lower
        .split_whitespace()
        .filter(|term| title_lower.contains(term))
        .count()
}

/// Keeps the `limit` videos whose titles best match the query, ties broken by views.
fn shortlist(mut videos: Vec<VideoSummary>, query: &str, limit: usize) -> Vec<VideoSummary> {
    if videos.len() <= limit {
        return videos;
    }
    let query_lower = query.to_lowercase();
    let score = |video: &VideoSummary| {
        let title_lower = video.title.to_lowercase();
        let exact = if title_lower.contains(&query_lower) { 5 } else { 0 };
        matching_terms(&title_lower, &query_lower) + exact
    };
    videos.sort_by(|a, b| {
        score(b)
            .cmp(&score(a))
            .then_with(|| parse_view_count(&b.views).cmp(&parse_view_count(&a.views)))
    });
    videos.truncate(limit);
    videos
}

fn level_terms(knowledge_level: &str) -> &'static [&'static str] {
    match knowledge_level {
        "Beginner" => &["beginner", "basic", "introduction", "start", "fundamental"],
        "Intermediate" => &["intermediate", "advanced", "improve", "enhance"],
        "Advanced" => &["advanced", "expert", "professional", "mastery"],
        _ => &[],
    }
}

pub fn keyword_score(title: &str, query: &str, knowledge_level: &str) -> f64 {
    let title_lower = title.to_lowercase();
    let query_lower = query.to_lowercase();

    let title_match = (2.0 + matching_terms(&title_lower, &query_lower) as f64 * 0.5).min(5.0);
    let phrase_bonus = if title_lower.contains(&query_lower) { 2.0 } else { 0.0 };
    let educational_bonus = if EDUCATIONAL_TERMS.iter().any(|t| title_lower.contains(t)) {
        1.0
    } else {
        0.0
    };
    let level_bonus = if level_terms(knowledge_level)
        .iter()
        .any(|t| title_lower.contains(t))
    {
        1.0
    } else {
        0.0
    };

    (title_match + phrase_bonus + educational_bonus + level_bonus).min(10.0)
}

fn keyword_benefit(score: f64, topic: &str) -> String {
    if score >= 8.0 {
        format!("Learn advanced {} concepts with practical examples", topic)
    } else if score >= 6.0 {
        format!(
            "Master the fundamentals of {} through step-by-step instruction",
            topic
        )
    } else {
        format!("Understand basic {} principles for beginners", topic)
    }
}

fn main_topic(query: &str) -> &str {
    query.split_whitespace().next().unwrap_or("topic")
}

pub fn keyword_ranking(
    videos: &[VideoSummary],
    request: &RecommendVideosRequest,
) -> Vec<VideoRecommendation> {
    let topic = main_topic(&request.query);
    let mut ranked: Vec<VideoRecommendation> = videos
        .iter()
        .map(|video| {
            let score = keyword_score(&video.title, &request.query, &request.knowledge_level);
            video.recommend(score, keyword_benefit(score, topic))
        })
        .collect();
    ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    ranked.truncate(MAX_RECOMMENDATIONS);
    ranked
}

/// Placeholder results for when the catalog cannot be reached at all.
pub fn canned_recommendations(request: &RecommendVideosRequest) -> Vec<VideoRecommendation> {
    let topic = main_topic(&request.query);
    vec![
        VideoRecommendation {
            video_id: "dQw4w9WgXcQ".to_string(),
            title: format!("Learn {} - Step-by-Step Tutorial", request.query),
            channel_name: "Educational Channel".to_string(),
            thumbnail: "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_string(),
            duration: "10:30".to_string(),
            views: "1.2M".to_string(),
            publish_date: "2 years ago".to_string(),
            relevance_score: 9.5,
            benefit: format!(
                "Learn essential {} concepts through hands-on exercises and real-world examples",
                topic
            ),
        },
        VideoRecommendation {
            video_id: "9bZkp7q19f0".to_string(),
            title: format!(
                "{} Masterclass for {}s",
                request.query, request.knowledge_level
            ),
            channel_name: "Expert Academy".to_string(),
            thumbnail: "https://i.ytimg.com/vi/9bZkp7q19f0/maxresdefault.jpg".to_string(),
            duration: "15:45".to_string(),
            views: "3.4M".to_string(),
            publish_date: "1 year ago".to_string(),
            relevance_score: 8.7,
            benefit: format!(
                "Master advanced {} techniques with practical projects and in-depth explanations",
                topic
            ),
        },
    ]
}
