pub mod courses;
pub mod discussions;
pub mod feed;
pub mod grades;
pub mod health;
pub mod study_plan;
