pub mod course_handler;
pub mod health_handler;
pub mod recommendation_handler;

pub use course_handler::generate_course;
pub use health_handler::{health_check, health_check_live};
pub use recommendation_handler::recommend_videos;
