//! Public types for the PTO API
use serde::{Deserialize, Serialize};

pub use crate::core::audit::AuditEntry;
pub use crate::pto::{Employee, NewPtoRequest, PtoRequest, PtoStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PtoListQuery {
    pub employee_id: Option<String>,
    pub status: Option<PtoStatus>,
    pub department: Option<String>,
}

/// Optional manager comment carried by approve/reject calls.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub employee_id: String,
    pub pto_balance: f64,
}
