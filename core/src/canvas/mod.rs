//! Typed access to the Canvas REST API: one client, one accessor per
//! resource kind, pagination handled underneath.

mod link;
pub mod types;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::CanvasError;
use types::{
    Announcement, Assignment, AssignmentGroup, CalendarEvent, CanvasFile, Course, DiscussionEntry,
    DiscussionTopic, Enrollment, UserProfile,
};

/// Per-call Canvas credentials. Sourcing (env, stored config, session
/// lookup) is the caller's concern; the core only consumes them.
#[derive(Debug, Clone)]
pub struct CanvasCredentials {
    pub base_url: String,
    pub access_token: String,
}

const PER_PAGE: u32 = 50;

/// Hard stop for pathological pagination. Canvas terminates the
/// `rel="next"` chain on its own; this cap is a guard on top of that.
const MAX_PAGES: usize = 50;

/// A bearer-token-authenticated Canvas API client rooted at
/// `{base_url}/api/v1`. Cloning is cheap; fan-out clones freely.
#[derive(Clone)]
pub struct CanvasClient {
    http: reqwest::Client,
    api_root: String,
    access_token: String,
}

impl CanvasClient {
    pub fn new(credentials: &CanvasCredentials) -> Result<Self, CanvasError> {
        let api_root = api_root(&credentials.base_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            api_root,
            access_token: credentials.access_token.clone(),
        })
    }

    /// Walk every page of a collection endpoint, preserving page order.
    ///
    /// Iterative by design: the cursor is the `rel="next"` URL from the
    /// previous response. A non-success status on any page aborts the
    /// whole fetch; there are no retries and no backoff.
    async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        first_url: String,
    ) -> Result<Vec<T>, CanvasError> {
        let mut items = Vec::new();
        let mut next_url = Some(first_url);
        let mut pages = 0usize;

        while let Some(url) = next_url.take() {
            if pages == MAX_PAGES {
                tracing::warn!(%url, "pagination cap of {MAX_PAGES} pages reached, truncating");
                break;
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.access_token)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(CanvasError::Upstream {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
                    url,
                });
            }

            // The Link header must be read before the body consumes the response.
            next_url = response
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(link::next_page_url);

            let page: Vec<T> = response.json().await?;
            items.extend(page);
            pages += 1;
        }

        Ok(items)
    }

    /// GET a single-object endpoint (Canvas uses these for `/users/self`).
    async fn fetch_one<T: DeserializeOwned>(&self, url: String) -> Result<T, CanvasError> {
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CanvasError::Upstream {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
                url,
            });
        }

        Ok(response.json().await?)
    }

    pub async fn fetch_user_profile(&self) -> Result<UserProfile, CanvasError> {
        self.fetch_one(format!("{}/users/self", self.api_root)).await
    }

    pub async fn fetch_courses(&self) -> Result<Vec<Course>, CanvasError> {
        self.fetch_all_pages(format!(
            "{}/courses?enrollment_state=active&per_page={PER_PAGE}",
            self.api_root
        ))
        .await
    }

    /// Assignments for one course, each carrying the user's own submission.
    pub async fn fetch_course_assignments(
        &self,
        course_id: u64,
    ) -> Result<Vec<Assignment>, CanvasError> {
        self.fetch_all_pages(format!(
            "{}/courses/{course_id}/assignments?include[]=submission&per_page={PER_PAGE}",
            self.api_root
        ))
        .await
    }

    /// Assignments across every given course, fetched concurrently.
    ///
    /// A failure on any single course is swallowed to "zero assignments for
    /// that course" so one broken or archived course cannot abort the
    /// aggregate. Result order follows the input course order.
    pub async fn fetch_all_assignments(&self, courses: &[Course]) -> Vec<Assignment> {
        let mut handles = Vec::with_capacity(courses.len());
        for course in courses {
            let client = self.clone();
            let course_id = course.id;
            handles.push(tokio::spawn(async move {
                client.fetch_course_assignments(course_id).await
            }));
        }

        let mut assignments = Vec::new();
        for (course, handle) in courses.iter().zip(handles) {
            match handle.await {
                Ok(result) => assignments.extend(or_empty(result, "assignments", course.id)),
                Err(join_err) => {
                    tracing::warn!(
                        course_id = course.id,
                        error = %join_err,
                        "assignment fetch task failed"
                    );
                }
            }
        }
        assignments
    }

    pub async fn fetch_assignment_groups(
        &self,
        course_id: u64,
    ) -> Result<Vec<AssignmentGroup>, CanvasError> {
        self.fetch_all_pages(format!(
            "{}/courses/{course_id}/assignment_groups?per_page={PER_PAGE}",
            self.api_root
        ))
        .await
    }

    /// The user's student enrollment in one course, if any.
    ///
    /// `None` covers both "no student enrollment" and "endpoint refused"
    /// (permissions vary per institution); callers treat it as "no grade
    /// data available", never as an error.
    pub async fn fetch_user_enrollment(&self, course_id: u64) -> Option<Enrollment> {
        let result: Result<Vec<Enrollment>, CanvasError> = self
            .fetch_all_pages(format!(
                "{}/courses/{course_id}/enrollments?user_id=self&per_page={PER_PAGE}",
                self.api_root
            ))
            .await;

        match result {
            Ok(enrollments) => enrollments
                .into_iter()
                .find(|enrollment| enrollment.role == "StudentEnrollment"),
            Err(err) => {
                tracing::warn!(course_id, error = %err, "enrollment lookup failed");
                None
            }
        }
    }

    pub async fn fetch_discussion_topics(
        &self,
        course_id: u64,
    ) -> Result<Vec<DiscussionTopic>, CanvasError> {
        self.fetch_all_pages(format!(
            "{}/courses/{course_id}/discussion_topics?per_page={PER_PAGE}",
            self.api_root
        ))
        .await
    }

    pub async fn fetch_discussion_entries(
        &self,
        course_id: u64,
        topic_id: u64,
    ) -> Result<Vec<DiscussionEntry>, CanvasError> {
        self.fetch_all_pages(format!(
            "{}/courses/{course_id}/discussion_topics/{topic_id}/entries?per_page={PER_PAGE}",
            self.api_root
        ))
        .await
    }

    pub async fn fetch_course_files(&self, course_id: u64) -> Result<Vec<CanvasFile>, CanvasError> {
        self.fetch_all_pages(format!(
            "{}/courses/{course_id}/files?per_page={PER_PAGE}",
            self.api_root
        ))
        .await
    }

    pub async fn fetch_calendar_events(&self) -> Result<Vec<CalendarEvent>, CanvasError> {
        self.fetch_all_pages(format!(
            "{}/calendar_events?type=event&per_page={PER_PAGE}",
            self.api_root
        ))
        .await
    }

    /// Announcements require explicit course contexts; an empty course list
    /// short-circuits to an empty result without a network call.
    pub async fn fetch_announcements(
        &self,
        courses: &[Course],
    ) -> Result<Vec<Announcement>, CanvasError> {
        if courses.is_empty() {
            return Ok(Vec::new());
        }
        let context_codes: String = courses
            .iter()
            .map(|course| format!("context_codes[]=course_{}", course.id))
            .collect::<Vec<_>>()
            .join("&");
        self.fetch_all_pages(format!(
            "{}/announcements?{context_codes}&per_page={PER_PAGE}",
            self.api_root
        ))
        .await
    }
}

/// The partial-failure policy for secondary fan-out branches, in one place:
/// a per-unit error degrades to an empty result instead of failing the
/// whole aggregate.
pub(crate) fn or_empty<T>(
    result: Result<Vec<T>, CanvasError>,
    resource: &str,
    unit_id: u64,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(
                resource,
                unit_id,
                error = %err,
                "secondary fetch failed, continuing with empty result"
            );
            Vec::new()
        }
    }
}

/// Normalize a user-supplied base URL and derive the API root.
/// Accepts bare hosts ("school.instructure.com") and trailing slashes.
fn api_root(base_url: &str) -> Result<String, CanvasError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(CanvasError::InvalidBaseUrl(base_url.to_string()));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let stripped = with_scheme.trim_end_matches('/');
    let parsed =
        Url::parse(stripped).map_err(|_| CanvasError::InvalidBaseUrl(base_url.to_string()))?;
    if parsed.host_str().is_none() {
        return Err(CanvasError::InvalidBaseUrl(base_url.to_string()));
    }
    Ok(format!("{stripped}/api/v1"))
}
