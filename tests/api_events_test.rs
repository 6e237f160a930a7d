//! Integration tests for the events API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{body_to_json, test_app};

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/json")
            .header("x-actor-id", "recruiter@x.com")
            .header("x-actor-name", "Robin Recruiter")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn patch(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("PATCH")
            .header("content-type", "application/json")
            .header("x-actor-id", "recruiter@x.com")
            .header("x-actor-name", "Robin Recruiter")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("DELETE")
            .header("x-actor-id", "recruiter@x.com")
            .header("x-actor-name", "Robin Recruiter")
            .body(Body::empty())
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn interview_body() -> serde_json::Value {
        serde_json::json!({
            "title": "Phone screen",
            "type": "interview",
            "startTime": "2025-06-03T10:00:00Z",
            "endTime": "2025-06-03T11:00:00Z",
            "attendees": [
                {"attendeeType": "employee", "attendeeId": "emp-1",
                 "name": "Ann Lee", "email": "ann@x.com"},
                {"attendeeType": "candidate",
                 "name": "Casey Doe", "email": "casey@mail.com"}
            ]
        })
    }

    /// Tests event creation returns the stored event
    #[tokio::test]
    #[serial]
    async fn it_creates_an_event() {
        let t = test_app().await;

        let response = t
            .app
            .oneshot(post("/api/events", interview_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let event = body_to_json(response.into_body()).await;
        assert_eq!(event["title"], "Phone screen");
        assert_eq!(event["status"], "scheduled");
        assert_eq!(event["attendees"].as_array().unwrap().len(), 2);
        assert_eq!(event["attendees"][0]["email"], "ann@x.com");
    }

    /// Tests mutation without identity headers is rejected
    #[tokio::test]
    #[serial]
    async fn it_returns_403_without_actor_headers() {
        let t = test_app().await;

        let request = Request::builder()
            .uri("/api/events")
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(interview_body().to_string()))
            .unwrap();
        let response = t.app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    /// Tests validation of an empty title
    #[tokio::test]
    #[serial]
    async fn it_returns_400_for_empty_title() {
        let t = test_app().await;

        let mut body = interview_body();
        body["title"] = serde_json::json!("   ");
        let response = t.app.oneshot(post("/api/events", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Tests validation of inverted times
    #[tokio::test]
    #[serial]
    async fn it_returns_400_for_inverted_times() {
        let t = test_app().await;

        let mut body = interview_body();
        body["startTime"] = serde_json::json!("2025-06-03T12:00:00Z");
        let response = t.app.oneshot(post("/api/events", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Tests fetching an unknown event
    #[tokio::test]
    #[serial]
    async fn it_returns_404_for_missing_event() {
        let t = test_app().await;

        let response = t.app.oneshot(get("/api/events/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Tests a patch without an attendee list keeps the existing set
    #[tokio::test]
    #[serial]
    async fn it_preserves_attendees_on_partial_update() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(post("/api/events", interview_body()))
            .await
            .unwrap();
        let event = body_to_json(response.into_body()).await;
        let id = event["id"].as_str().unwrap();

        let response = t
            .app
            .oneshot(patch(
                &format!("/api/events/{}", id),
                serde_json::json!({"title": "Phone screen (rescheduled)"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_to_json(response.into_body()).await;
        assert_eq!(updated["title"], "Phone screen (rescheduled)");
        assert_eq!(updated["attendees"].as_array().unwrap().len(), 2);
    }

    /// Tests a patch with an attendee list replaces the set wholesale
    #[tokio::test]
    #[serial]
    async fn it_replaces_attendees_when_a_list_is_supplied() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(post("/api/events", interview_body()))
            .await
            .unwrap();
        let event = body_to_json(response.into_body()).await;
        let id = event["id"].as_str().unwrap();

        let response = t
            .app
            .oneshot(patch(
                &format!("/api/events/{}", id),
                serde_json::json!({"attendees": [
                    {"attendeeType": "employee", "attendeeId": "emp-2",
                     "name": "Bo Chen", "email": "bo@x.com"}
                ]}),
            ))
            .await
            .unwrap();

        let updated = body_to_json(response.into_body()).await;
        let attendees = updated["attendees"].as_array().unwrap();
        assert_eq!(attendees.len(), 1);
        assert_eq!(attendees[0]["email"], "bo@x.com");
    }

    /// Tests cancellation is a soft delete and terminal
    #[tokio::test]
    #[serial]
    async fn it_cancels_an_event_once() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(post("/api/events", interview_body()))
            .await
            .unwrap();
        let event = body_to_json(response.into_body()).await;
        let id = event["id"].as_str().unwrap().to_string();

        let response = t
            .app
            .clone()
            .oneshot(delete(&format!("/api/events/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cancelled = body_to_json(response.into_body()).await;
        assert_eq!(cancelled["status"], "cancelled");
        assert_eq!(cancelled["attendees"].as_array().unwrap().len(), 2);

        // The row is still readable and a second cancel conflicts
        let response = t
            .app
            .clone()
            .oneshot(get(&format!("/api/events/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = t
            .app
            .oneshot(delete(&format!("/api/events/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    /// Tests the audit trail endpoint records the lifecycle
    #[tokio::test]
    #[serial]
    async fn it_exposes_the_audit_trail() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(post("/api/events", interview_body()))
            .await
            .unwrap();
        let event = body_to_json(response.into_body()).await;
        let id = event["id"].as_str().unwrap().to_string();

        t.app
            .clone()
            .oneshot(patch(
                &format!("/api/events/{}", id),
                serde_json::json!({"location": "Room 4"}),
            ))
            .await
            .unwrap();
        t.app
            .clone()
            .oneshot(delete(&format!("/api/events/{}", id)))
            .await
            .unwrap();

        let response = t
            .app
            .oneshot(get(&format!("/api/events/{}/audit", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let trail = body_to_json(response.into_body()).await;
        let actions: Vec<&str> = trail
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["action"].as_str().unwrap())
            .collect();
        assert_eq!(actions, vec!["created", "updated", "cancelled"]);
        assert_eq!(trail[0]["actorName"], "Robin Recruiter");
    }

    /// Tests list filtering by type and status
    #[tokio::test]
    #[serial]
    async fn it_lists_events_with_filters() {
        let t = test_app().await;

        t.app
            .clone()
            .oneshot(post("/api/events", interview_body()))
            .await
            .unwrap();
        let mut other = interview_body();
        other["title"] = serde_json::json!("Team offsite");
        other["type"] = serde_json::json!("other");
        t.app
            .clone()
            .oneshot(post("/api/events", other))
            .await
            .unwrap();

        let response = t
            .app
            .oneshot(get("/api/events?type=interview"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let events = body_to_json(response.into_body()).await;
        let events = events.as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["title"], "Phone screen");
    }
}
