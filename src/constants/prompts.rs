use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{AppError, AppResult};

static SLOT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([a-z_]+)\s*\}\}").expect("SLOT_PATTERN is a valid regex pattern")
});

/// A prompt with `{{name}}` slots filled in at request time.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: &'static str,
    values: BTreeMap<&'static str, String>,
}

impl PromptTemplate {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, slot: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(slot, value.into());
        self
    }

    pub fn slots(&self) -> Vec<&'static str> {
        let mut slots: Vec<&'static str> = SLOT_PATTERN
            .captures_iter(self.template)
            .filter_map(|captures| captures.get(1).map(|m| m.as_str()))
            .collect();
        slots.sort_unstable();
        slots.dedup();
        slots
    }

    /// Fails if any slot in the template has no value.
    pub fn render(&self) -> AppResult<String> {
        let missing: Vec<&'static str> = self
            .slots()
            .into_iter()
            .filter(|slot| !self.values.contains_key(*slot))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::InternalError(format!(
                "prompt slots left unfilled: {}",
                missing.join(", ")
            )));
        }

        // Single pass, so values that themselves contain `{{...}}` stay literal.
        let rendered = SLOT_PATTERN.replace_all(self.template, |captures: &regex::Captures| {
            let slot = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            self.values.get(slot).cloned().unwrap_or_default()
        });
        Ok(rendered.trim().to_string())
    }
}

pub const COURSE_GENERATION_PROMPT: &str = r#"
You are a course structuring assistant that turns a YouTube video into a complete learning course, expressed as JSON.

## RULES

1. Output ONLY a single JSON object. No introduction, no explanation, no closing remarks.
2. Use the video title and description as input, but write your own concise course `title` and brief `description`.
3. Fill `metadata` completely: overviewText, difficulty, duration, prerequisites, objectives, category, tags, sources.
4. `courseItems` holds 2-7 items of type "section", in video order, each with lessons that carry `startTime` in seconds taken from the transcript timestamps. Use the video's chapters when the description lists them. Place items of type "assessment_placeholder" (assessmentType one of "quiz", "assignment", "test", "project") after the sections they assess; the last item MUST be a "project" placeholder.
5. `resources` holds 3-10 useful links. Every resource needs a specific `title`, the exact `url`, a one-sentence `description`, a `type` (documentation, tutorial, article, video, code, blog, tool, book) and a `category` ("video" when mentioned in the video, "supplementary" for further reading, "practice" for interactive platforms). Never use placeholder titles such as "Link" or "Resource".
6. `creatorResources` lists links the creator promotes in the description (courses, repositories, merch). `creatorSocials` lists the creator's social profiles as objects with `platform` and `url`.
7. Do not invent an `image`; it is supplied separately.

## VIDEO

Video ID: {{video_id}}
Video Title: {{video_title}}
Video Description:
{{video_description}}

Video Metadata (JSON):
{{video_metadata}}

## CANDIDATE RESOURCES FROM WEB SEARCH

{{resource_candidates}}

## OUTPUT JSON SCHEMA

{{schema}}

## TIMESTAMPED TRANSCRIPT (MM:SS, then the text segment)

---
{{transcript}}
---

Output only the final JSON object.
"#;

pub const SEARCH_QUERY_PROMPT: &str = r#"
As an educational content curator, analyze the following learning goal and create an optimized YouTube search query.

Learning Goal: "{{query}}"
Knowledge Level: {{knowledge_level}}
Additional Context: {{additional_context}}

First identify the core concepts, the progression of topics appropriate for the {{knowledge_level}} level, practical applications, and common obstacles learners face.

Then write 1 highly specific search query that:
- matches the {{knowledge_level}} skill level
- targets high-quality educational content with clear learning outcomes
- includes a term such as "tutorial", "course" or "lesson"
- focuses on practical skills related to the learning goal

Return ONLY a valid JSON array of strings containing the query, nothing else.
Example: ["complete python for beginners tutorial step by step"]
"#;

pub const VIDEO_ANALYSIS_PROMPT: &str = r#"
Analyze these YouTube videos for the learning goal "{{query}}" (Level: {{knowledge_level}}).

Prefer videos that match the knowledge level, teach relevant skills, have structured content, and include practical examples.

Return ONLY a JSON array, one entry per video:
[
  {"videoId": "abc123", "relevanceScore": 8.5, "benefit": "Learn the core principles of X with step-by-step tutorials"}
]
relevanceScore is a number from 1.0 to 10.0.

Videos to analyze:
{{videos}}
"#;
