//! Discussion participation tracking: which published threads still have
//! no post from the user, and how soon they are due.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::canvas::types::{DiscussionEntry, DiscussionTopic};
use crate::canvas::{CanvasClient, or_empty};
use crate::error::CanvasError;
use crate::schedule::{WorkStatus, classify_due, days_until_due};

/// One course's topics, each paired with its full entry list.
#[derive(Debug, Clone)]
pub struct CourseDiscussions {
    pub course_id: u64,
    pub course_name: String,
    pub topics: Vec<TopicWithEntries>,
}

#[derive(Debug, Clone)]
pub struct TopicWithEntries {
    pub topic: DiscussionTopic,
    pub entries: Vec<DiscussionEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnansweredTopic {
    pub topic_id: u64,
    pub course_id: u64,
    pub course_name: String,
    pub title: String,
    pub html_url: String,
    pub due_at: Option<DateTime<Utc>>,
    pub days_until_due: Option<i64>,
    pub status: WorkStatus,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DiscussionSummary {
    /// Published topics considered across all courses.
    pub total_topics: usize,
    pub unanswered: usize,
    pub urgent: usize,
    pub overdue: usize,
    /// The user's surviving (non-deleted) posts across all topics.
    pub posts_by_user: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiscussionInsights {
    pub unanswered: Vec<UnansweredTopic>,
    pub summary: DiscussionSummary,
}

/// Cross-reference every published topic against the user's own entries.
/// A topic whose only post from the user was deleted is still unanswered.
pub fn build_discussion_insights(
    courses: &[CourseDiscussions],
    user_id: u64,
    now: DateTime<Utc>,
) -> DiscussionInsights {
    let mut unanswered = Vec::new();
    let mut summary = DiscussionSummary::default();

    for course in courses {
        for thread in &course.topics {
            if !thread.topic.published {
                continue;
            }
            summary.total_topics += 1;

            let own_posts = thread
                .entries
                .iter()
                .filter(|entry| entry.is_authored_by(user_id))
                .count();
            summary.posts_by_user += own_posts;
            if own_posts > 0 {
                continue;
            }

            let days = thread.topic.due_at.map(|due| days_until_due(due, now));
            let status = classify_due(days);
            match status {
                WorkStatus::Overdue => summary.overdue += 1,
                WorkStatus::Urgent => summary.urgent += 1,
                _ => {}
            }

            unanswered.push(UnansweredTopic {
                topic_id: thread.topic.id,
                course_id: course.course_id,
                course_name: course.course_name.clone(),
                title: thread.topic.title.clone(),
                html_url: thread.topic.html_url.clone(),
                due_at: thread.topic.due_at,
                days_until_due: days,
                status,
            });
        }
    }

    // Overdue first, then soonest due next; topics without a due date sink
    // to the end. (The study plan sorts by priority descending instead —
    // the two orderings are intentionally different.)
    unanswered.sort_by(|a, b| {
        let a_overdue = a.status == WorkStatus::Overdue;
        let b_overdue = b.status == WorkStatus::Overdue;
        b_overdue.cmp(&a_overdue).then_with(|| {
            let a_days = a.days_until_due.unwrap_or(i64::MAX);
            let b_days = b.days_until_due.unwrap_or(i64::MAX);
            a_days.cmp(&b_days)
        })
    });

    summary.unanswered = unanswered.len();

    DiscussionInsights {
        unanswered,
        summary,
    }
}

/// Assemble discussion insights across every active course. The profile
/// and course list are primary data; topic and entry fetches are secondary
/// and degrade to empty per unit.
pub async fn discussion_insights(
    client: &CanvasClient,
    now: DateTime<Utc>,
) -> Result<DiscussionInsights, CanvasError> {
    let (profile, courses) =
        tokio::try_join!(client.fetch_user_profile(), client.fetch_courses())?;

    let mut handles = Vec::with_capacity(courses.len());
    for course in &courses {
        let client = client.clone();
        let course_id = course.id;
        handles.push(tokio::spawn(async move {
            let topics = or_empty(
                client.fetch_discussion_topics(course_id).await,
                "discussion topics",
                course_id,
            );

            let mut threads = Vec::with_capacity(topics.len());
            for topic in topics {
                // Unpublished topics never surface; skip the entries call.
                if !topic.published {
                    continue;
                }
                let entries = or_empty(
                    client.fetch_discussion_entries(course_id, topic.id).await,
                    "discussion entries",
                    topic.id,
                );
                threads.push(TopicWithEntries { topic, entries });
            }
            threads
        }));
    }

    let mut course_discussions = Vec::with_capacity(courses.len());
    for (course, handle) in courses.iter().zip(handles) {
        let topics = match handle.await {
            Ok(threads) => threads,
            Err(join_err) => {
                tracing::warn!(
                    course_id = course.id,
                    error = %join_err,
                    "discussion fetch task failed"
                );
                Vec::new()
            }
        };
        course_discussions.push(CourseDiscussions {
            course_id: course.id,
            course_name: course.display_name(),
            topics,
        });
    }

    Ok(build_discussion_insights(
        &course_discussions,
        profile.id,
        now,
    ))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::{CourseDiscussions, TopicWithEntries, build_discussion_insights};
    use crate::canvas::types::{DiscussionEntry, DiscussionTopic};
    use crate::schedule::WorkStatus;

    const ME: u64 = 7;

    fn topic(id: u64, published: bool, due: Option<DateTime<Utc>>) -> DiscussionTopic {
        DiscussionTopic {
            id,
            title: format!("topic {id}"),
            due_at: due,
            posted_at: None,
            published,
            html_url: format!("https://canvas.test/topics/{id}"),
        }
    }

    fn entry(id: u64, user_id: u64, deleted: bool) -> DiscussionEntry {
        DiscussionEntry {
            id,
            user_id: Some(user_id),
            deleted,
            message: None,
            created_at: None,
        }
    }

    fn course(topics: Vec<TopicWithEntries>) -> CourseDiscussions {
        CourseDiscussions {
            course_id: 1,
            course_name: "Chemistry".to_string(),
            topics,
        }
    }

    #[test]
    fn topic_with_only_a_deleted_own_entry_is_unanswered() {
        let now = Utc::now();
        let courses = vec![course(vec![TopicWithEntries {
            topic: topic(1, true, None),
            entries: vec![entry(100, ME, true)],
        }])];

        let insights = build_discussion_insights(&courses, ME, now);

        assert_eq!(insights.summary.unanswered, 1);
        assert_eq!(insights.summary.posts_by_user, 0);
        assert_eq!(insights.unanswered[0].topic_id, 1);
    }

    #[test]
    fn answered_topics_are_excluded_but_counted() {
        let now = Utc::now();
        let courses = vec![course(vec![
            TopicWithEntries {
                topic: topic(1, true, None),
                entries: vec![entry(100, ME, false), entry(101, ME, false)],
            },
            TopicWithEntries {
                topic: topic(2, true, None),
                entries: vec![entry(102, 99, false)],
            },
        ])];

        let insights = build_discussion_insights(&courses, ME, now);

        assert_eq!(insights.summary.total_topics, 2);
        assert_eq!(insights.summary.unanswered, 1);
        assert_eq!(insights.summary.posts_by_user, 2);
        assert_eq!(insights.unanswered[0].topic_id, 2);
    }

    #[test]
    fn unpublished_topics_are_invisible() {
        let now = Utc::now();
        let courses = vec![course(vec![TopicWithEntries {
            topic: topic(1, false, None),
            entries: vec![],
        }])];

        let insights = build_discussion_insights(&courses, ME, now);

        assert_eq!(insights.summary.total_topics, 0);
        assert_eq!(insights.summary.unanswered, 0);
    }

    #[test]
    fn sorted_overdue_first_then_soonest_due() {
        let now = Utc::now();
        let courses = vec![course(vec![
            TopicWithEntries {
                topic: topic(1, true, Some(now + Duration::days(6))),
                entries: vec![],
            },
            TopicWithEntries {
                topic: topic(2, true, None),
                entries: vec![],
            },
            TopicWithEntries {
                topic: topic(3, true, Some(now - Duration::days(2))),
                entries: vec![],
            },
            TopicWithEntries {
                topic: topic(4, true, Some(now + Duration::days(1))),
                entries: vec![],
            },
        ])];

        let insights = build_discussion_insights(&courses, ME, now);

        let order: Vec<u64> = insights.unanswered.iter().map(|t| t.topic_id).collect();
        assert_eq!(order, vec![3, 4, 1, 2]);
        assert_eq!(insights.unanswered[0].status, WorkStatus::Overdue);
        assert_eq!(insights.summary.overdue, 1);
        assert_eq!(insights.summary.urgent, 1);
    }
}
