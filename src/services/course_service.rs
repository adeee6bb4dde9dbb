use std::sync::Arc;

use validator::Validate;

use crate::{
    constants::prompts::{PromptTemplate, COURSE_GENERATION_PROMPT},
    errors::{AppError, AppResult},
    models::{domain::CourseDocument, dto::request::GenerateCourseRequest},
    services::{
        formatting::truncate_chars,
        llm_client::LanguageModel,
        reconciler::{reconcile, ReconcileContext},
        retry::{retry_with_backoff, RetryPolicy},
        web_search::{SearchHit, WebSearch},
    },
};

const MAX_TRANSCRIPT_CHARS: usize = 30_000;
const MAX_RESOURCE_CANDIDATES: usize = 5;

pub struct CourseService {
    model: Arc<dyn LanguageModel>,
    search: Arc<dyn WebSearch>,
    retry_policy: RetryPolicy,
    schema: String,
}

impl CourseService {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        search: Arc<dyn WebSearch>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            model,
            search,
            retry_policy,
            schema: course_schema(),
        }
    }

    pub fn model_name(&self) -> String {
        self.model.model_name()
    }

    pub async fn generate_course(
        &self,
        request: &GenerateCourseRequest,
    ) -> AppResult<CourseDocument> {
        request.validate()?;
        log::info!(
            "Generating course for video {} ({})",
            request.video_id,
            request.video_title
        );

        let candidates = self.resource_candidates(&request.video_title).await;
        let prompt = self.render_prompt(request, &candidates)?;

        let raw = retry_with_backoff(
            &self.retry_policy,
            "course generation",
            AppError::retry_disposition,
            || self.model.complete(&prompt),
        )
        .await?;
        log::debug!("Raw course reply: {}", truncate_chars(&raw, 500));

        let document = reconcile(&raw, &ReconcileContext::from(request)).map_err(|err| {
            log::warn!("Could not reconcile reply for {}: {}", request.video_id, err);
            AppError::from(err)
        })?;

        log::info!(
            "Course for {} has {} items and {} resources",
            document.video_id,
            document.course_items.len(),
            document.resources.len()
        );
        Ok(document)
    }

    /// Search failures only cost the prompt its candidate list.
    async fn resource_candidates(&self, video_title: &str) -> Vec<SearchHit> {
        let query = format!("{} tutorial documentation", video_title);
        match self.search.search(&query, MAX_RESOURCE_CANDIDATES).await {
            Ok(hits) => hits,
            Err(err) => {
                log::warn!("Resource search skipped: {}", err);
                Vec::new()
            }
        }
    }

    fn render_prompt(
        &self,
        request: &GenerateCourseRequest,
        candidates: &[SearchHit],
    ) -> AppResult<String> {
        PromptTemplate::new(COURSE_GENERATION_PROMPT)
            .with("video_id", request.video_id.as_str())
            .with("video_title", request.video_title.as_str())
            .with("video_description", request.video_description.as_str())
            .with(
                "video_metadata",
                serde_json::to_string_pretty(&request.video_data)?,
            )
            .with("resource_candidates", render_candidates(candidates))
            .with("schema", self.schema.as_str())
            .with(
                "transcript",
                truncate_chars(&request.transcript, MAX_TRANSCRIPT_CHARS),
            )
            .render()
    }
}

fn course_schema() -> String {
    let schema = schemars::schema_for!(CourseDocument);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|err| {
        log::warn!("Course schema could not be serialized: {}", err);
        String::new()
    })
}

fn render_candidates(candidates: &[SearchHit]) -> String {
    if candidates.is_empty() {
        return "None found.".to_string();
    }
    candidates
        .iter()
        .map(|hit| {
            let title = if hit.title.is_empty() {
                hit.url.as_str()
            } else {
                hit.title.as_str()
            };
            if hit.snippet.is_empty() {
                format!("- {}: {}", title, hit.url)
            } else {
                format!("- {}: {}\n  {}", title, hit.url, hit.snippet)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
