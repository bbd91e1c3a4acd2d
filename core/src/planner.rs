//! Urgency/impact-ranked study plan across every active course.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::canvas::types::{Assignment, AssignmentGroup, Course};
use crate::canvas::{CanvasClient, or_empty};
use crate::error::CanvasError;
use crate::schedule::{WorkStatus, classify_due, days_until_due, round1};

const URGENCY_SHARE: f64 = 0.6;
const IMPACT_SHARE: f64 = 0.4;

/// One course's raw inputs to the planner.
#[derive(Debug, Clone)]
pub struct CourseWorkload {
    pub course_id: u64,
    pub course_name: String,
    pub assignments: Vec<Assignment>,
    pub groups: Vec<AssignmentGroup>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanItem {
    pub assignment_id: u64,
    pub course_id: u64,
    pub course_name: String,
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub days_until_due: Option<i64>,
    pub status: WorkStatus,
    pub points_possible: Option<f64>,
    /// 100 flat when overdue, decaying by 10 per day out, 0 with no due date.
    pub urgency_score: f64,
    /// This assignment's share of its group's points, scaled by group weight.
    pub impact_score: f64,
    pub priority_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PlanSummary {
    pub total: usize,
    pub overdue: usize,
    pub urgent: usize,
    pub upcoming: usize,
    pub later: usize,
    pub no_due_date: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudyPlan {
    pub items: Vec<PlanItem>,
    pub summary: PlanSummary,
}

/// Rank every outstanding assignment across the given courses. Pure given
/// the snapshots and "now".
pub fn build_study_plan(workloads: &[CourseWorkload], now: DateTime<Utc>) -> StudyPlan {
    let mut items = Vec::new();

    for workload in workloads {
        // group id -> (weight, total points across every assignment in the
        // group, graded or not)
        let mut group_points: HashMap<u64, (f64, f64)> = workload
            .groups
            .iter()
            .map(|group| (group.id, (group.weight(), 0.0)))
            .collect();
        for assignment in &workload.assignments {
            if let Some(entry) = assignment
                .assignment_group_id
                .and_then(|group_id| group_points.get_mut(&group_id))
            {
                entry.1 += assignment.points_possible.unwrap_or(0.0);
            }
        }

        for assignment in &workload.assignments {
            if assignment
                .submission
                .as_ref()
                .is_some_and(|submission| submission.is_turned_in())
            {
                continue;
            }

            let days = assignment.due_at.map(|due| days_until_due(due, now));
            let status = classify_due(days);

            let urgency = match days {
                None => 0.0,
                Some(days) if days < 0 => 100.0,
                Some(days) => (100.0 - days as f64 * 10.0).max(0.0),
            };

            let impact = assignment
                .assignment_group_id
                .and_then(|group_id| group_points.get(&group_id))
                .map(|&(weight, total_points)| {
                    if total_points > 0.0 {
                        assignment.points_possible.unwrap_or(0.0) / total_points * weight
                    } else {
                        0.0
                    }
                })
                .unwrap_or(0.0);

            let priority = URGENCY_SHARE * urgency + IMPACT_SHARE * impact;

            items.push(PlanItem {
                assignment_id: assignment.id,
                course_id: workload.course_id,
                course_name: workload.course_name.clone(),
                name: assignment.name.clone(),
                due_at: assignment.due_at,
                days_until_due: days,
                status,
                points_possible: assignment.points_possible,
                urgency_score: round1(urgency),
                impact_score: round1(impact),
                priority_score: round1(priority),
            });
        }
    }

    // Two-key sort: overdue always outranks score, then priority descending.
    items.sort_by(|a, b| {
        let a_overdue = a.status == WorkStatus::Overdue;
        let b_overdue = b.status == WorkStatus::Overdue;
        b_overdue.cmp(&a_overdue).then_with(|| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });

    let mut summary = PlanSummary {
        total: items.len(),
        ..Default::default()
    };
    for item in &items {
        match item.status {
            WorkStatus::Overdue => summary.overdue += 1,
            WorkStatus::Urgent => summary.urgent += 1,
            WorkStatus::Upcoming => summary.upcoming += 1,
            WorkStatus::Later => summary.later += 1,
            WorkStatus::NoDueDate => summary.no_due_date += 1,
        }
    }

    StudyPlan { items, summary }
}

/// Assemble the cross-course study plan. The course list is primary data
/// and propagates failure; each course's assignment and group fetches
/// degrade to empty so one broken course cannot sink the plan.
pub async fn study_plan(
    client: &CanvasClient,
    now: DateTime<Utc>,
) -> Result<StudyPlan, CanvasError> {
    let courses = client.fetch_courses().await?;
    let workloads = fetch_workloads(client, &courses).await;
    Ok(build_study_plan(&workloads, now))
}

async fn fetch_workloads(client: &CanvasClient, courses: &[Course]) -> Vec<CourseWorkload> {
    let mut handles = Vec::with_capacity(courses.len());
    for course in courses {
        let client = client.clone();
        let course_id = course.id;
        handles.push(tokio::spawn(async move {
            tokio::join!(
                client.fetch_course_assignments(course_id),
                client.fetch_assignment_groups(course_id),
            )
        }));
    }

    let mut workloads = Vec::with_capacity(courses.len());
    for (course, handle) in courses.iter().zip(handles) {
        let (assignments, groups) = match handle.await {
            Ok(results) => results,
            Err(join_err) => {
                tracing::warn!(
                    course_id = course.id,
                    error = %join_err,
                    "course workload task failed"
                );
                continue;
            }
        };
        workloads.push(CourseWorkload {
            course_id: course.id,
            course_name: course.display_name(),
            assignments: or_empty(assignments, "assignments", course.id),
            groups: or_empty(groups, "assignment groups", course.id),
        });
    }
    workloads
}
