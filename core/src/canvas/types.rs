use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A course the user is enrolled in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
}

impl Course {
    /// Best human-readable label Canvas gave us for this course.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.course_code.clone())
            .unwrap_or_else(|| format!("course {}", self.id))
    }
}

/// An assignment, optionally carrying the user's own submission when the
/// accessor asked Canvas to include it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Assignment {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unlock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lock_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub submission_types: Vec<String>,
    #[serde(default)]
    pub course_id: u64,
    #[serde(default)]
    pub assignment_group_id: Option<u64>,
    #[serde(default)]
    pub has_submitted_submissions: Option<bool>,
    #[serde(default)]
    pub graded_submissions_exist: Option<bool>,
    #[serde(default)]
    pub submission: Option<Submission>,
}

/// The user's submission on one assignment. Canvas sends `null` for most
/// fields on placeholder submissions, so everything is optional here and
/// the predicates below define the semantics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Submission {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub workflow_state: String,
    #[serde(default)]
    pub late: Option<bool>,
    #[serde(default)]
    pub missing: Option<bool>,
    #[serde(default)]
    pub excused: Option<bool>,
}

impl Submission {
    pub fn is_excused(&self) -> bool {
        self.excused.unwrap_or(false)
    }

    /// Graded iff a real score is present and the submission was not excused.
    /// Excused work contributes to neither earned nor possible points.
    pub fn is_graded(&self) -> bool {
        self.score.is_some() && !self.is_excused()
    }

    /// Turned-in or already scored work drops out of the study plan.
    pub fn is_turned_in(&self) -> bool {
        matches!(self.workflow_state.as_str(), "submitted" | "graded") || self.score.is_some()
    }
}

/// An assignment group with its grading weight (0–100). Weights across a
/// course should sum to 100 but frequently don't mid-semester; the grade
/// engine tolerates any sum.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentGroup {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub group_weight: Option<f64>,
    #[serde(default)]
    pub rules: Option<serde_json::Value>,
}

impl AssignmentGroup {
    pub fn weight(&self) -> f64 {
        self.group_weight.unwrap_or(0.0)
    }
}

/// One enrollment role in one course. A user can hold several; only
/// `StudentEnrollment` carries the grades we care about.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Enrollment {
    #[serde(default)]
    pub course_id: u64,
    #[serde(default)]
    pub user_id: u64,
    #[serde(rename = "type")]
    pub role: String,
    #[serde(default)]
    pub grades: Option<EnrollmentGrades>,
}

/// Canvas's own computed scores for an enrollment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentGrades {
    #[serde(default)]
    pub current_score: Option<f64>,
    #[serde(default)]
    pub current_grade: Option<String>,
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub final_grade: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscussionTopic {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DiscussionEntry {
    pub id: u64,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl DiscussionEntry {
    /// An entry counts as authored by `user_id` only while it still exists;
    /// a deleted entry must not mark its topic as answered.
    pub fn is_authored_by(&self, user_id: u64) -> bool {
        self.user_id == Some(user_id) && !self.deleted
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Announcement {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub context_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CalendarEvent {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub context_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CanvasFile {
    pub id: u64,
    pub display_name: String,
    // Canvas really does hyphenate this one field.
    #[serde(default, rename = "content-type")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub primary_email: Option<String>,
    #[serde(default)]
    pub login_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_display_name_falls_back_to_code_then_id() {
        let mut course = Course {
            id: 42,
            name: Some("Linear Algebra".to_string()),
            course_code: Some("MATH-220".to_string()),
            start_at: None,
            end_at: None,
        };
        assert_eq!(course.display_name(), "Linear Algebra");

        course.name = None;
        assert_eq!(course.display_name(), "MATH-220");

        course.course_code = None;
        assert_eq!(course.display_name(), "course 42");
    }

    #[test]
    fn excused_submission_is_not_graded() {
        let submission = Submission {
            score: Some(10.0),
            grade: None,
            submitted_at: None,
            workflow_state: "graded".to_string(),
            late: None,
            missing: None,
            excused: Some(true),
        };
        assert!(!submission.is_graded());
        assert!(submission.is_excused());
    }

    #[test]
    fn deleted_entry_does_not_count_as_authored() {
        let entry = DiscussionEntry {
            id: 1,
            user_id: Some(7),
            deleted: true,
            message: None,
            created_at: None,
        };
        assert!(!entry.is_authored_by(7));
    }

    #[test]
    fn submission_with_null_fields_deserializes() {
        let submission: Submission = serde_json::from_str(
            r#"{"score": null, "grade": null, "workflow_state": "unsubmitted", "excused": null}"#,
        )
        .unwrap();
        assert!(!submission.is_graded());
        assert!(!submission.is_turned_in());
    }
}
