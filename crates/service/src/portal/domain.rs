use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered principal, regular or administrator.
///
/// `complaints` is a snapshot of the owner index taken when the account was read;
/// it is never stored alongside the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: u64,
    pub secret_code: String,
    pub name: String,
    pub email: String,
    pub complaints: Vec<Record>,
    pub is_admin: bool,
}

/// Authenticated caller as seen by authorisation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: u64,
    pub is_admin: bool,
}

/// Submitted complaint with a one-way open/resolved lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub title: String,
    pub summary: String,
    pub rating: u8,
    pub user_id: u64,
    /// Owner name copied at submission time.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_name: String,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Registration input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
}

/// Any request that only carries the caller's secret code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretCodeInput {
    pub secret_code: String,
}

/// Complaint submission input. `rating` stays wide so out-of-range values reach validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitComplaintInput {
    pub secret_code: String,
    pub title: String,
    pub summary: String,
    pub rating: i64,
}

/// Input for requests addressing a single complaint (view, resolve)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplaintRefInput {
    pub secret_code: String,
    pub complaint_id: i64,
}
