use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecommendation {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub thumbnail: String,
    pub duration: String,
    pub views: String,
    pub publish_date: String,
    /// Between 1.0 and 10.0.
    pub relevance_score: f64,
    pub benefit: String,
}

/// A video after its catalog details were formatted for display.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSummary {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub thumbnail: String,
    pub duration: String,
    pub views: String,
    pub publish_date: String,
    pub description: String,
}

impl VideoSummary {
    pub fn recommend(&self, relevance_score: f64, benefit: impl Into<String>) -> VideoRecommendation {
        VideoRecommendation {
            video_id: self.video_id.clone(),
            title: self.title.clone(),
            channel_name: self.channel_name.clone(),
            thumbnail: self.thumbnail.clone(),
            duration: self.duration.clone(),
            views: self.views.clone(),
            publish_date: self.publish_date.clone(),
            relevance_score: relevance_score.clamp(1.0, 10.0),
            benefit: benefit.into(),
        }
    }
}
