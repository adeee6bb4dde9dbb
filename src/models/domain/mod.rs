pub mod course;
pub mod recommendation;
pub use course::{CourseDocument, CourseItem, CourseMetadata, Lesson, Resource, Section};
pub use recommendation::{VideoRecommendation, VideoSummary};
