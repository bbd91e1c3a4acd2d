//! Weighted-grade analysis for one course: per-group breakdowns, the
//! current overall grade, and what it takes to reach each letter grade.

use serde::Serialize;
use utoipa::ToSchema;

use crate::canvas::CanvasClient;
use crate::canvas::types::{Assignment, AssignmentGroup, EnrollmentGrades};
use crate::error::CanvasError;
use crate::schedule::round1;

/// Letter-grade thresholds for target projections, highest first.
pub const GRADE_TARGETS: [(f64, &str); 4] = [(90.0, "A"), (80.0, "B"), (70.0, "C"), (60.0, "D")];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GroupBreakdown {
    pub id: u64,
    pub name: String,
    pub weight: f64,
    pub earned_points: f64,
    pub possible_points: f64,
    pub ungraded_points: f64,
    /// `None` until at least one assignment in the group is graded — no
    /// graded work is "undefined", not zero.
    pub current_percentage: Option<f64>,
    pub graded_count: usize,
    pub ungraded_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TargetProjection {
    pub target: f64,
    pub letter: String,
    /// Average score needed on the ungraded remainder; `None` when the
    /// outcome is already fully determined.
    pub needed: Option<f64>,
    pub achievable: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GradeReport {
    /// Group breakdowns in position order.
    pub groups: Vec<GroupBreakdown>,
    pub current_overall_grade: Option<f64>,
    /// Σ of the group weights that actually contributed graded work.
    pub weight_used: f64,
    /// `100 - weight_used`, surfaced raw — misconfigured group weights can
    /// push it negative and callers deserve to see that.
    pub remaining_weight: f64,
    pub target_projections: Vec<TargetProjection>,
}

/// A course's grade report plus Canvas's own enrollment scores for
/// cross-checking, when the enrollment probe succeeded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseGradeSummary {
    pub course_id: u64,
    pub report: GradeReport,
    pub enrollment_grades: Option<EnrollmentGrades>,
}

/// Fold one course's assignment groups and submission-bearing assignments
/// into a grade report. Pure: same snapshot in, same report out.
pub fn analyze_course_grades(
    groups: &[AssignmentGroup],
    assignments: &[Assignment],
) -> GradeReport {
    let mut sorted_groups: Vec<&AssignmentGroup> = groups.iter().collect();
    sorted_groups.sort_by_key(|group| group.position);

    let mut breakdowns = Vec::with_capacity(sorted_groups.len());
    let mut weighted_sum = 0.0;
    let mut weight_used = 0.0;

    for group in sorted_groups {
        let mut earned = 0.0;
        let mut possible = 0.0;
        let mut ungraded = 0.0;
        let mut graded_count = 0;
        let mut ungraded_count = 0;

        let members = assignments
            .iter()
            .filter(|assignment| assignment.assignment_group_id == Some(group.id));

        for assignment in members {
            let graded_score = assignment
                .submission
                .as_ref()
                .filter(|submission| submission.is_graded())
                .and_then(|submission| submission.score);

            match graded_score {
                Some(score) => {
                    earned += score;
                    possible += assignment.points_possible.unwrap_or(0.0);
                    graded_count += 1;
                }
                None => {
                    ungraded += assignment.points_possible.unwrap_or(0.0);
                    ungraded_count += 1;
                }
            }
        }

        let current_percentage = (possible > 0.0).then(|| earned / possible * 100.0);
        let weight = group.weight();

        // Only groups with graded work and a positive weight carry into the
        // overall average; the rest contribute nothing to the denominator.
        if let Some(pct) = current_percentage {
            if weight > 0.0 {
                weighted_sum += pct * weight;
                weight_used += weight;
            }
        }

        breakdowns.push(GroupBreakdown {
            id: group.id,
            name: group.name.clone(),
            weight,
            earned_points: earned,
            possible_points: possible,
            ungraded_points: ungraded,
            current_percentage,
            graded_count,
            ungraded_count,
        });
    }

    let current_overall_grade = (weight_used > 0.0).then(|| weighted_sum / weight_used);
    let remaining_weight = 100.0 - weight_used;

    let target_projections = GRADE_TARGETS
        .iter()
        .map(|&(target, letter)| {
            project_target(
                target,
                letter,
                weighted_sum,
                weight_used,
                remaining_weight,
                current_overall_grade,
            )
        })
        .collect();

    GradeReport {
        groups: breakdowns,
        current_overall_grade,
        weight_used,
        remaining_weight,
        target_projections,
    }
}

/// "What average score on the ungraded remainder reaches this final grade",
/// with the remainder treated as one evenly earned block of weight.
fn project_target(
    target: f64,
    letter: &str,
    weighted_sum: f64,
    weight_used: f64,
    remaining_weight: f64,
    current_overall_grade: Option<f64>,
) -> TargetProjection {
    if remaining_weight <= 0.0 || weight_used == 0.0 {
        return TargetProjection {
            target,
            letter: letter.to_string(),
            needed: None,
            achievable: current_overall_grade.is_some_and(|grade| grade >= target),
        };
    }

    let needed = round1((target * 100.0 - weighted_sum) / remaining_weight);
    TargetProjection {
        target,
        letter: letter.to_string(),
        needed: Some(needed),
        achievable: (0.0..=100.0).contains(&needed),
    }
}

/// Fetch one course's groups and assignments jointly and fold them into a
/// grade report. Both fetches are primary data: either failure propagates.
/// The enrollment probe is best-effort and degrades to `None`.
pub async fn course_grade_report(
    client: &CanvasClient,
    course_id: u64,
) -> Result<CourseGradeSummary, CanvasError> {
    let (groups, assignments) = tokio::try_join!(
        client.fetch_assignment_groups(course_id),
        client.fetch_course_assignments(course_id),
    )?;

    let report = analyze_course_grades(&groups, &assignments);
    let enrollment_grades = client
        .fetch_user_enrollment(course_id)
        .await
        .and_then(|enrollment| enrollment.grades);

    Ok(CourseGradeSummary {
        course_id,
        report,
        enrollment_grades,
    })
}

#[cfg(test)]
mod tests {
    use super::{GRADE_TARGETS, analyze_course_grades};
    use crate::canvas::types::{Assignment, AssignmentGroup, Submission};

    fn group(id: u64, name: &str, position: i32, weight: f64) -> AssignmentGroup {
        AssignmentGroup {
            id,
            name: name.to_string(),
            position,
            group_weight: Some(weight),
            rules: None,
        }
    }

    fn assignment(id: u64, group_id: u64, points: f64, score: Option<f64>) -> Assignment {
        Assignment {
            id,
            name: format!("assignment {id}"),
            description: None,
            due_at: None,
            unlock_at: None,
            lock_at: None,
            points_possible: Some(points),
            submission_types: vec!["online_upload".to_string()],
            course_id: 1,
            assignment_group_id: Some(group_id),
            has_submitted_submissions: None,
            graded_submissions_exist: None,
            submission: score.map(|value| Submission {
                score: Some(value),
                grade: None,
                submitted_at: None,
                workflow_state: "graded".to_string(),
                late: None,
                missing: None,
                excused: None,
            }),
        }
    }

    #[test]
    fn group_with_no_graded_work_has_undefined_percentage() {
        let groups = vec![group(1, "Homework", 1, 40.0)];
        let assignments = vec![assignment(10, 1, 100.0, None)];

        let report = analyze_course_grades(&groups, &assignments);

        assert_eq!(report.groups[0].current_percentage, None);
        assert_eq!(report.groups[0].ungraded_points, 100.0);
        assert_eq!(report.weight_used, 0.0);
        assert_eq!(report.current_overall_grade, None);
        // Nothing graded: projections degrade and nothing is achievable yet.
        for projection in &report.target_projections {
            assert_eq!(projection.needed, None);
            assert!(!projection.achievable);
        }
    }

    #[test]
    fn worked_example_homework_and_exams() {
        let groups = vec![group(1, "Homework", 1, 40.0), group(2, "Exams", 2, 60.0)];
        let assignments = vec![
            assignment(10, 1, 100.0, Some(80.0)),
            assignment(20, 2, 50.0, Some(45.0)),
        ];

        let report = analyze_course_grades(&groups, &assignments);

        assert_eq!(report.groups[0].current_percentage, Some(80.0));
        assert_eq!(report.groups[1].current_percentage, Some(90.0));
        assert_eq!(report.current_overall_grade, Some(86.0));
        assert_eq!(report.weight_used, 100.0);
        assert_eq!(report.remaining_weight, 0.0);

        // Fully determined: target 90 is out of reach, target 80 is already met.
        let ninety = &report.target_projections[0];
        assert_eq!(ninety.target, 90.0);
        assert_eq!(ninety.needed, None);
        assert!(!ninety.achievable);

        let eighty = &report.target_projections[1];
        assert_eq!(eighty.needed, None);
        assert!(eighty.achievable);
    }

    #[test]
    fn projection_spreads_target_over_remaining_weight() {
        // Homework (40%) graded at 80%; Exams (60%) entirely ungraded.
        let groups = vec![group(1, "Homework", 1, 40.0), group(2, "Exams", 2, 60.0)];
        let assignments = vec![
            assignment(10, 1, 100.0, Some(80.0)),
            assignment(20, 2, 50.0, None),
        ];

        let report = analyze_course_grades(&groups, &assignments);

        assert_eq!(report.weight_used, 40.0);
        assert_eq!(report.remaining_weight, 60.0);
        assert_eq!(report.current_overall_grade, Some(80.0));

        // needed for 90: (9000 - 3200) / 60 = 96.7 (one decimal)
        let ninety = &report.target_projections[0];
        assert_eq!(ninety.needed, Some(96.7));
        assert!(ninety.achievable);

        // needed for 60: (6000 - 3200) / 60 = 46.7
        let sixty = &report.target_projections[3];
        assert_eq!(sixty.needed, Some(46.7));
        assert!(sixty.achievable);
    }

    #[test]
    fn excused_submission_counts_as_ungraded_everywhere() {
        let groups = vec![group(1, "Homework", 1, 100.0)];
        let mut excused = assignment(10, 1, 50.0, Some(0.0));
        if let Some(submission) = excused.submission.as_mut() {
            submission.excused = Some(true);
        }
        let assignments = vec![excused, assignment(11, 1, 100.0, Some(90.0))];

        let report = analyze_course_grades(&groups, &assignments);
        let breakdown = &report.groups[0];

        assert_eq!(breakdown.earned_points, 90.0);
        assert_eq!(breakdown.possible_points, 100.0);
        assert_eq!(breakdown.ungraded_points, 50.0);
        assert_eq!(breakdown.graded_count, 1);
        assert_eq!(breakdown.ungraded_count, 1);
    }

    #[test]
    fn unweighted_groups_yield_no_overall_grade() {
        let groups = vec![group(1, "Everything", 1, 0.0)];
        let assignments = vec![assignment(10, 1, 100.0, Some(95.0))];

        let report = analyze_course_grades(&groups, &assignments);

        assert_eq!(report.groups[0].current_percentage, Some(95.0));
        assert_eq!(report.weight_used, 0.0);
        assert_eq!(report.current_overall_grade, None);
    }

    #[test]
    fn groups_are_reported_in_position_order() {
        let groups = vec![group(2, "Exams", 2, 60.0), group(1, "Homework", 1, 40.0)];
        let report = analyze_course_grades(&groups, &[]);
        assert_eq!(report.groups[0].name, "Homework");
        assert_eq!(report.groups[1].name, "Exams");
    }

    #[test]
    fn targets_cover_the_four_letter_grades() {
        assert_eq!(GRADE_TARGETS.len(), 4);
        assert_eq!(GRADE_TARGETS[0], (90.0, "A"));
        assert_eq!(GRADE_TARGETS[3], (60.0, "D"));
    }
}
