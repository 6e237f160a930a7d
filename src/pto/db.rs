//! Read paths and row mapping for PTO requests and employees. All
//! state transitions live in the ledger.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde_json::Value;
use tokio_rusqlite::Connection;

use super::models::{Employee, PtoRequest, PtoStatus};
use crate::core::audit::{AuditEntry, audit_from_row};
use crate::core::db::{column_utc, format_utc, invalid_column, parse_hhmm};
use crate::core::{Actor, EngineError};

pub(crate) const REQUEST_COLUMNS: &str = "id, employee_id, employee_name, start_date, end_date, \
     is_full_day, start_time, end_time, reason, status, manager_id, manager_comment, \
     department, days_requested, pto_balance_before, pto_balance_after, calendar_event_id, \
     created_at, updated_at";

pub(crate) fn request_from_row(row: &rusqlite::Row) -> rusqlite::Result<PtoRequest> {
    let start_date: String = row.get(3)?;
    let end_date: String = row.get(4)?;
    let start_time: Option<String> = row.get(6)?;
    let end_time: Option<String> = row.get(7)?;
    let status: String = row.get(9)?;
    Ok(PtoRequest {
        id: row.get(0)?,
        employee_id: row.get(1)?,
        employee_name: row.get(2)?,
        start_date: start_date.parse().map_err(|e| invalid_column(3, e))?,
        end_date: end_date.parse().map_err(|e| invalid_column(4, e))?,
        is_full_day: row.get(5)?,
        start_time: start_time
            .map(|s| parse_hhmm(&s).map_err(|e| invalid_column(6, e)))
            .transpose()?,
        end_time: end_time
            .map(|s| parse_hhmm(&s).map_err(|e| invalid_column(7, e)))
            .transpose()?,
        reason: row.get(8)?,
        status: PtoStatus::parse(&status).map_err(|e| invalid_column(9, e))?,
        manager_id: row.get(10)?,
        manager_comment: row.get(11)?,
        department: row.get(12)?,
        days_requested: row.get(13)?,
        pto_balance_before: row.get(14)?,
        pto_balance_after: row.get(15)?,
        calendar_event_id: row.get(16)?,
        created_at: column_utc(row, 17)?,
        updated_at: column_utc(row, 18)?,
    })
}

pub(crate) fn get_request_inner(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<PtoRequest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM pto_request WHERE id = ?1",
        REQUEST_COLUMNS
    ))?;
    stmt.query_row(params![id], request_from_row).optional()
}

pub(crate) fn get_employee_inner(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<Employee>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, department, manager_id, pto_balance
         FROM employee WHERE id = ?1",
    )?;
    stmt.query_row(params![id], |row| {
        Ok(Employee {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            department: row.get(3)?,
            manager_id: row.get(4)?,
            pto_balance: row.get(5)?,
        })
    })
    .optional()
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn record_pto_audit(
    conn: &rusqlite::Connection,
    request_id: &str,
    actor: &Actor,
    action: &str,
    before: Option<&Value>,
    after: Option<&Value>,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO pto_audit
         (request_id, actor_id, actor_name, action, before_state, after_state, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            request_id,
            actor.id,
            actor.name,
            action,
            before.map(Value::to_string),
            after.map(Value::to_string),
            notes,
            format_utc(&now),
        ],
    )?;
    Ok(())
}

pub async fn get_request(db: &Connection, id: &str) -> Result<PtoRequest> {
    let id = id.to_string();
    let result = db
        .call(move |conn| {
            let request = get_request_inner(conn, &id).map(|request| {
                request.ok_or_else(|| EngineError::NotFound(format!("PTO request {}", id)))
            });
            Ok(request?)
        })
        .await?;
    Ok(result?)
}

pub async fn list_requests(
    db: &Connection,
    employee_id: Option<String>,
    status: Option<PtoStatus>,
    department: Option<String>,
) -> Result<Vec<PtoRequest>> {
    let requests = db
        .call(move |conn| {
            let mut sql = format!("SELECT {} FROM pto_request WHERE 1=1", REQUEST_COLUMNS);
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            if let Some(employee_id) = employee_id {
                sql.push_str(" AND employee_id = ?");
                args.push(Box::new(employee_id));
            }
            if let Some(status) = status {
                sql.push_str(" AND status = ?");
                args.push(Box::new(status.as_str().to_string()));
            }
            if let Some(department) = department {
                sql.push_str(" AND department = ?");
                args.push(Box::new(department));
            }
            sql.push_str(" ORDER BY start_date, id");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                    request_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(requests)
}

pub async fn get_employee(db: &Connection, id: &str) -> Result<Employee> {
    let id = id.to_string();
    let result = db
        .call(move |conn| {
            let employee = get_employee_inner(conn, &id).map(|employee| {
                employee.ok_or_else(|| EngineError::NotFound(format!("employee {}", id)))
            });
            Ok(employee?)
        })
        .await?;
    Ok(result?)
}

/// Register an employee row. Balance administration beyond the ledger
/// is out of scope, so this is used by setup and fixtures only.
pub async fn insert_employee(db: &Connection, employee: &Employee) -> Result<()> {
    let employee = employee.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO employee
             (id, name, email, department, manager_id, pto_balance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                employee.id,
                employee.name,
                employee.email,
                employee.department,
                employee.manager_id,
                employee.pto_balance,
            ],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// Audit trail for one request, oldest first.
pub async fn request_audit(db: &Connection, request_id: &str) -> Result<Vec<AuditEntry>> {
    let request_id = request_id.to_string();
    let result = db
        .call(move |conn| {
            if get_request_inner(conn, &request_id)?.is_none() {
                return Ok(Err(EngineError::NotFound(format!(
                    "PTO request {}",
                    request_id
                ))));
            }
            let mut stmt = conn.prepare(
                "SELECT id, request_id, actor_id, actor_name, action, before_state, after_state,
                 notes, created_at
                 FROM pto_audit WHERE request_id = ?1 ORDER BY id",
            )?;
            let entries = stmt
                .query_map(params![request_id], audit_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Ok(entries))
        })
        .await?;
    Ok(result?)
}
