use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::EngineError;

/// Lifecycle: `pending -> approved | rejected`, and
/// `pending | approved -> cancelled`. Rejected and cancelled are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PtoStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl PtoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PtoStatus::Pending => "pending",
            PtoStatus::Approved => "approved",
            PtoStatus::Rejected => "rejected",
            PtoStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "pending" => Ok(PtoStatus::Pending),
            "approved" => Ok(PtoStatus::Approved),
            "rejected" => Ok(PtoStatus::Rejected),
            "cancelled" => Ok(PtoStatus::Cancelled),
            other => Err(EngineError::Validation(format!(
                "unknown PTO status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PtoRequest {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_full_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub status: PtoStatus,
    pub manager_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_comment: Option<String>,
    pub department: String,
    pub days_requested: f64,
    /// Balance snapshots. Provisional while the request is pending;
    /// made actual at approval time.
    pub pto_balance_before: f64,
    pub pto_balance_after: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPtoRequest {
    pub employee_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_full_day")]
    pub is_full_day: bool,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub reason: Option<String>,
    /// Overrides the employee's assigned manager when set.
    #[serde(default)]
    pub manager_id: Option<String>,
}

fn default_full_day() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    pub pto_balance: f64,
}
