use httpmock::prelude::*;
use serde_json::json;

use tassel_core::canvas::{CanvasClient, CanvasCredentials};
use tassel_core::canvas::types::Course;
use tassel_core::error::CanvasError;

fn client_for(server: &MockServer) -> CanvasClient {
    CanvasClient::new(&CanvasCredentials {
        base_url: server.base_url(),
        access_token: "test-token".to_string(),
    })
    .unwrap()
}

fn course_json(id: u64, code: &str) -> serde_json::Value {
    json!({ "id": id, "name": format!("Course {id}"), "course_code": code })
}

#[tokio::test]
async fn pagination_walks_every_next_link_in_order() {
    let server = MockServer::start();

    let page1 = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/courses")
            .query_param("enrollment_state", "active")
            .header("authorization", "Bearer test-token");
        then.status(200)
            .header(
                "Link",
                format!(
                    "<{}>; rel=\"next\", <{}>; rel=\"last\"",
                    server.url("/api/v1/courses?page=2"),
                    server.url("/api/v1/courses?page=3")
                ),
            )
            .json_body(json!([course_json(1, "A-101"), course_json(2, "A-102")]));
    });
    let page2 = server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses").query_param("page", "2");
        then.status(200)
            .header(
                "Link",
                format!("<{}>; rel=\"next\"", server.url("/api/v1/courses?page=3")),
            )
            .json_body(json!([course_json(3, "B-201"), course_json(4, "B-202")]));
    });
    let page3 = server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses").query_param("page", "3");
        then.status(200).json_body(json!([course_json(5, "C-301")]));
    });

    let courses = client_for(&server).fetch_courses().await.unwrap();

    let ids: Vec<u64> = courses.iter().map(|course| course.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    // Exactly one call per page — nothing beyond the linked chain.
    page1.assert();
    page2.assert();
    page3.assert();
}

#[tokio::test]
async fn pagination_terminates_without_a_next_relation() {
    let server = MockServer::start();

    let only_page = server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses");
        then.status(200)
            .header(
                "Link",
                format!("<{}>; rel=\"last\"", server.url("/api/v1/courses?page=1")),
            )
            .json_body(json!([course_json(1, "A-101")]));
    });

    let courses = client_for(&server).fetch_courses().await.unwrap();

    assert_eq!(courses.len(), 1);
    only_page.assert();
}

#[tokio::test]
async fn non_success_status_aborts_the_fetch() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses");
        then.status(403);
    });

    let err = client_for(&server).fetch_courses().await.unwrap_err();

    match err {
        CanvasError::Upstream { status, status_text, .. } => {
            assert_eq!(status, 403);
            assert_eq!(status_text, "Forbidden");
        }
        other => panic!("expected Upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn all_assignments_survives_one_broken_course() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses/1/assignments");
        then.status(200).json_body(json!([
            { "id": 11, "name": "Essay", "course_id": 1, "points_possible": 20.0 }
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses/2/assignments");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses/3/assignments");
        then.status(200).json_body(json!([
            { "id": 31, "name": "Lab report", "course_id": 3, "points_possible": 50.0 }
        ]));
    });

    let courses: Vec<Course> = [1, 2, 3]
        .into_iter()
        .map(|id| Course {
            id,
            name: None,
            course_code: None,
            start_at: None,
            end_at: None,
        })
        .collect();

    let assignments = client_for(&server).fetch_all_assignments(&courses).await;

    let ids: Vec<u64> = assignments.iter().map(|assignment| assignment.id).collect();
    assert_eq!(ids, vec![11, 31]);
}

#[tokio::test]
async fn enrollment_lookup_picks_the_student_role() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses/1/enrollments");
        then.status(200).json_body(json!([
            { "id": 1, "course_id": 1, "user_id": 7, "type": "TaEnrollment" },
            {
                "id": 2, "course_id": 1, "user_id": 7, "type": "StudentEnrollment",
                "grades": { "current_score": 91.3, "current_grade": "A-" }
            }
        ]));
    });

    let enrollment = client_for(&server).fetch_user_enrollment(1).await.unwrap();

    assert_eq!(enrollment.role, "StudentEnrollment");
    let grades = enrollment.grades.unwrap();
    assert_eq!(grades.current_score, Some(91.3));
}

#[tokio::test]
async fn enrollment_lookup_degrades_to_none_on_error() {
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/v1/courses/1/enrollments");
        then.status(401);
    });

    assert!(client_for(&server).fetch_user_enrollment(1).await.is_none());
}

#[tokio::test]
async fn user_profile_is_a_single_object_endpoint() {
    let server = MockServer::start();

    let profile_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/users/self")
            .header("authorization", "Bearer test-token");
        then.status(200).json_body(json!({
            "id": 7, "name": "Sam Tran", "primary_email": "sam@example.edu"
        }));
    });

    let profile = client_for(&server).fetch_user_profile().await.unwrap();

    assert_eq!(profile.id, 7);
    assert_eq!(profile.name, "Sam Tran");
    profile_mock.assert();
}

#[tokio::test]
async fn announcements_build_context_codes_from_courses() {
    let server = MockServer::start();

    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v1/announcements")
            .query_param("context_codes[]", "course_1");
        then.status(200).json_body(json!([
            { "id": 5, "title": "Midterm moved", "context_code": "course_1" }
        ]));
    });

    let courses = vec![Course {
        id: 1,
        name: None,
        course_code: None,
        start_at: None,
        end_at: None,
    }];

    let announcements = client_for(&server)
        .fetch_announcements(&courses)
        .await
        .unwrap();

    assert_eq!(announcements.len(), 1);
    assert_eq!(announcements[0].title, "Midterm moved");
    mock.assert();

    // No courses, no network call.
    let none = client_for(&server).fetch_announcements(&[]).await.unwrap();
    assert!(none.is_empty());
}
