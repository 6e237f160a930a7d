use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    /// Webhook relay for outbound notifications. When unset,
    /// notifications are queued but never dispatched.
    pub delivery_url: Option<String>,
    /// Upper bound on a single outbound delivery attempt in seconds.
    pub delivery_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("STAFFHQ_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/db", storage_path);
        let delivery_url = env::var("STAFFHQ_DELIVERY_URL").ok();
        let delivery_timeout_secs = env::var("STAFFHQ_DELIVERY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        Self {
            storage_path,
            db_path,
            delivery_url,
            delivery_timeout_secs,
        }
    }
}
