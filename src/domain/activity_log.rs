use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::empty_string_as_none;

/// Audit-trail retention window enforced by the bulk clear operation.
pub const RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub description: Option<String>,
    pub status: LogStatus,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    #[default]
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(LogStatus::Success),
            "error" => Some(LogStatus::Error),
            _ => None,
        }
    }
}

/// Insert-shape for an audit entry.
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub user_id: Option<Uuid>,
    pub action: String,
    pub description: Option<String>,
    pub status: LogStatus,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// The student behind a log entry, joined in for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogActor {
    pub id: Uuid,
    pub full_name: String,
    pub reg_number: String,
    pub email: String,
}

/// A log row together with its (possibly deleted) actor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    #[serde(flatten)]
    pub log: ActivityLog,
    pub user: Option<LogActor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityLogPage {
    pub logs: Vec<ActivityLogEntry>,
    pub users: Vec<LogActor>,
    pub pagination: super::PageMeta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearLogsResult {
    pub deleted_count: u64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityLogQuery {
    pub page: i64,
    pub limit: i64,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub action: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub status: Option<LogStatus>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub user_id: Option<Uuid>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Default for ActivityLogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            search: None,
            action: None,
            status: None,
            user_id: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl ActivityLogQuery {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}
