//! Test utilities for integration tests
use std::fs;
use std::sync::{Arc, RwLock};

use axum::Router;
use axum::body::Body;
use tempfile::TempDir;
use tokio_rusqlite::Connection;

use staffhq::api::AppState;
use staffhq::api::app;
use staffhq::core::AppConfig;
use staffhq::core::db::{async_db, initialize_db, seed_business_hours};
use staffhq::pto::Employee;
use staffhq::pto::db::insert_employee;

/// A running test application plus direct database access for seeding
/// fixtures. Holding the temp dir keeps the database directory alive
/// for the duration of the test.
pub struct TestApp {
    pub app: Router,
    #[allow(dead_code)]
    pub db: Connection,
    _dir: TempDir,
}

#[allow(dead_code)]
pub async fn test_app() -> TestApp {
    test_app_with_delivery(None).await
}

/// Build the app against a temporary database, optionally pointing
/// the outbox at a delivery endpoint.
pub async fn test_app_with_delivery(delivery_url: Option<String>) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = dir.path().join("db");
    fs::create_dir_all(&db_path).expect("Failed to create db directory");
    let db_path_str = db_path.to_str().unwrap();

    let db = async_db(db_path_str)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to initialize db");
        seed_business_hours(conn).expect("Failed to seed business hours");
        Ok(())
    })
    .await
    .unwrap();

    let app_config = AppConfig {
        storage_path: dir.path().display().to_string(),
        db_path: db_path_str.to_string(),
        delivery_url,
        delivery_timeout_secs: 2,
    };
    let app_state = AppState::new(db.clone(), app_config);
    TestApp {
        app: app(Arc::new(RwLock::new(app_state))),
        db,
        _dir: dir,
    }
}

#[allow(dead_code)]
pub async fn seed_employee(
    db: &Connection,
    id: &str,
    name: &str,
    manager_id: Option<&str>,
    pto_balance: f64,
) {
    insert_employee(
        db,
        &Employee {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@x.com", id),
            department: "Engineering".to_string(),
            manager_id: manager_id.map(str::to_string),
            pto_balance,
        },
    )
    .await
    .expect("Failed to seed employee");
}

#[allow(dead_code)]
pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).expect("response body was not JSON")
}
