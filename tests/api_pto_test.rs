//! Integration tests for the PTO API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serial_test::serial;
    use tower::util::ServiceExt;

    use crate::test_utils::{TestApp, body_to_json, seed_employee, test_app};

    fn post_as(actor: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("POST")
            .header("content-type", "application/json")
            .header("x-actor-id", actor)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn seeded_app() -> TestApp {
        let t = test_app().await;
        seed_employee(&t.db, "mgr-1", "Morgan Manager", None, 20.0).await;
        seed_employee(&t.db, "emp-1", "Ann Lee", Some("mgr-1"), 10.0).await;
        t
    }

    /// Submit a pending three business day request (Mon-Wed)
    async fn submit_request(t: &TestApp) -> serde_json::Value {
        let response = t
            .app
            .clone()
            .oneshot(post_as(
                "emp-1",
                "/api/pto",
                serde_json::json!({
                    "employeeId": "emp-1",
                    "startDate": "2025-06-02",
                    "endDate": "2025-06-04",
                    "reason": "vacation"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_to_json(response.into_body()).await
    }

    async fn balance_of(t: &TestApp, employee_id: &str) -> f64 {
        let response = t
            .app
            .clone()
            .oneshot(get(&format!("/api/pto/balance/{}", employee_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_to_json(response.into_body()).await["ptoBalance"]
            .as_f64()
            .unwrap()
    }

    /// Tests submission stays pending and never moves the balance
    #[tokio::test]
    #[serial]
    async fn it_submits_a_pending_request() {
        let t = seeded_app().await;

        let request = submit_request(&t).await;
        assert_eq!(request["status"], "pending");
        assert_eq!(request["daysRequested"], 3.0);
        assert_eq!(request["managerId"], "mgr-1");
        assert_eq!(request["ptoBalanceBefore"], 10.0);
        assert_eq!(request["ptoBalanceAfter"], 7.0);

        assert_eq!(balance_of(&t, "emp-1").await, 10.0);
    }

    /// Tests a request over the balance fails and changes nothing
    #[tokio::test]
    #[serial]
    async fn it_rejects_requests_over_the_balance() {
        let t = test_app().await;
        seed_employee(&t.db, "mgr-1", "Morgan Manager", None, 20.0).await;
        seed_employee(&t.db, "emp-1", "Ann Lee", Some("mgr-1"), 5.0).await;

        // 2025-06-02 through 2025-06-09 = 6 business days
        let response = t
            .app
            .clone()
            .oneshot(post_as(
                "emp-1",
                "/api/pto",
                serde_json::json!({
                    "employeeId": "emp-1",
                    "startDate": "2025-06-02",
                    "endDate": "2025-06-09"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(balance_of(&t, "emp-1").await, 5.0);
    }

    /// Tests submission for an unknown employee
    #[tokio::test]
    #[serial]
    async fn it_returns_404_for_unknown_employee() {
        let t = test_app().await;

        let response = t
            .app
            .oneshot(post_as(
                "ghost",
                "/api/pto",
                serde_json::json!({
                    "employeeId": "ghost",
                    "startDate": "2025-06-02",
                    "endDate": "2025-06-04"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Tests approval debits the balance and links a calendar event
    #[tokio::test]
    #[serial]
    async fn it_approves_and_creates_the_calendar_event() {
        let t = seeded_app().await;
        let request = submit_request(&t).await;
        let id = request["id"].as_str().unwrap();

        let response = t
            .app
            .clone()
            .oneshot(post_as(
                "mgr-1",
                &format!("/api/pto/{}/approve", id),
                serde_json::json!({"comment": "enjoy"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let approved = body_to_json(response.into_body()).await;
        assert_eq!(approved["status"], "approved");
        assert_eq!(approved["managerComment"], "enjoy");
        assert_eq!(balance_of(&t, "emp-1").await, 7.0);

        let event_id = approved["calendarEventId"].as_str().unwrap();
        let response = t
            .app
            .oneshot(get(&format!("/api/events/{}", event_id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let event = body_to_json(response.into_body()).await;
        assert_eq!(event["type"], "pto");
        assert_eq!(event["status"], "approved");
        assert_eq!(event["allDay"], true);
        assert_eq!(event["attendees"][0]["email"], "emp-1@x.com");
    }

    /// Tests only the assigned manager may approve
    #[tokio::test]
    #[serial]
    async fn it_returns_403_when_a_non_manager_approves() {
        let t = seeded_app().await;
        let request = submit_request(&t).await;
        let id = request["id"].as_str().unwrap();

        let response = t
            .app
            .clone()
            .oneshot(post_as(
                "someone-else",
                &format!("/api/pto/{}/approve", id),
                serde_json::json!({}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(balance_of(&t, "emp-1").await, 10.0);

        let response = t
            .app
            .oneshot(get(&format!("/api/pto/{}", id)))
            .await
            .unwrap();
        let unchanged = body_to_json(response.into_body()).await;
        assert_eq!(unchanged["status"], "pending");
    }

    /// Tests a second approval conflicts instead of double-debiting
    #[tokio::test]
    #[serial]
    async fn it_returns_409_for_a_second_approval() {
        let t = seeded_app().await;
        let request = submit_request(&t).await;
        let id = request["id"].as_str().unwrap();

        let uri = format!("/api/pto/{}/approve", id);
        let response = t
            .app
            .clone()
            .oneshot(post_as("mgr-1", &uri, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = t
            .app
            .clone()
            .oneshot(post_as("mgr-1", &uri, serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(balance_of(&t, "emp-1").await, 7.0, "debited exactly once");
    }

    /// Tests rejection leaves the balance alone
    #[tokio::test]
    #[serial]
    async fn it_rejects_without_touching_the_balance() {
        let t = seeded_app().await;
        let request = submit_request(&t).await;
        let id = request["id"].as_str().unwrap();

        let response = t
            .app
            .clone()
            .oneshot(post_as(
                "mgr-1",
                &format!("/api/pto/{}/reject", id),
                serde_json::json!({"comment": "coverage gap"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let rejected = body_to_json(response.into_body()).await;
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(balance_of(&t, "emp-1").await, 10.0);
    }

    /// Tests cancellation after approval restores the balance and
    /// cancels the linked event
    #[tokio::test]
    #[serial]
    async fn it_restores_the_balance_on_cancel_after_approval() {
        let t = seeded_app().await;
        let request = submit_request(&t).await;
        let id = request["id"].as_str().unwrap();

        let response = t
            .app
            .clone()
            .oneshot(post_as(
                "mgr-1",
                &format!("/api/pto/{}/approve", id),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        let approved = body_to_json(response.into_body()).await;
        let event_id = approved["calendarEventId"].as_str().unwrap().to_string();
        assert_eq!(balance_of(&t, "emp-1").await, 7.0);

        let response = t
            .app
            .clone()
            .oneshot(post_as(
                "emp-1",
                &format!("/api/pto/{}/cancel", id),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cancelled = body_to_json(response.into_body()).await;
        assert_eq!(cancelled["status"], "cancelled");
        assert_eq!(
            balance_of(&t, "emp-1").await,
            10.0,
            "balance returns to its pre-submit value"
        );

        let response = t
            .app
            .oneshot(get(&format!("/api/events/{}", event_id)))
            .await
            .unwrap();
        let event = body_to_json(response.into_body()).await;
        assert_eq!(event["status"], "cancelled");
    }

    /// Tests a third party cannot cancel someone else's request
    #[tokio::test]
    #[serial]
    async fn it_returns_403_when_a_stranger_cancels() {
        let t = seeded_app().await;
        let request = submit_request(&t).await;
        let id = request["id"].as_str().unwrap();

        let response = t
            .app
            .oneshot(post_as(
                "someone-else",
                &format!("/api/pto/{}/cancel", id),
                serde_json::json!({}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    /// Tests list filtering and the audit trail endpoint
    #[tokio::test]
    #[serial]
    async fn it_lists_requests_and_exposes_the_audit_trail() {
        let t = seeded_app().await;
        let request = submit_request(&t).await;
        let id = request["id"].as_str().unwrap();

        t.app
            .clone()
            .oneshot(post_as(
                "mgr-1",
                &format!("/api/pto/{}/approve", id),
                serde_json::json!({"comment": "ok"}),
            ))
            .await
            .unwrap();

        let response = t
            .app
            .clone()
            .oneshot(get("/api/pto?employeeId=emp-1&status=approved"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let requests = body_to_json(response.into_body()).await;
        assert_eq!(requests.as_array().unwrap().len(), 1);

        let response = t
            .app
            .oneshot(get(&format!("/api/pto/{}/audit", id)))
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
        assert_eq!(actions, vec!["submitted", "approved"]);
    }

    /// Tests a half-day request consumes an hour fraction
    #[tokio::test]
    #[serial]
    async fn it_computes_hour_fractions_for_partial_days() {
        let t = seeded_app().await;

        let response = t
            .app
            .oneshot(post_as(
                "emp-1",
                "/api/pto",
                serde_json::json!({
                    "employeeId": "emp-1",
                    "startDate": "2025-06-03",
                    "endDate": "2025-06-03",
                    "isFullDay": false,
                    "startTime": "09:00:00",
                    "endTime": "13:00:00"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let request = body_to_json(response.into_body()).await;
        assert_eq!(request["daysRequested"], 0.5);
    }
}
