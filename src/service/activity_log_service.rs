use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    domain::{
        ActivityLogPage, ActivityLogQuery, ClearLogsResult, LogStatus, NewActivityLog, PageMeta,
        Student, RETENTION_DAYS,
    },
    error::Result,
    repository::ActivityLogRepository,
    service::RequestMeta,
};

pub struct ActivityLogService {
    logs: Arc<dyn ActivityLogRepository>,
}

impl ActivityLogService {
    pub fn new(logs: Arc<dyn ActivityLogRepository>) -> Self {
        Self { logs }
    }

    pub async fn list(&self, query: &ActivityLogQuery) -> Result<ActivityLogPage> {
        let (logs, total, users) = tokio::try_join!(
            self.logs.list(query),
            self.logs.count(query),
            self.logs.actors()
        )?;

        Ok(ActivityLogPage {
            logs,
            users,
            pagination: PageMeta::new(query.page(), query.limit(), total),
        })
    }

    /// Bulk purge of entries older than the retention window. The purge
    /// itself is recorded, so the trail never silently loses its tail.
    pub async fn clear_old(&self, admin: &Student, meta: RequestMeta) -> Result<ClearLogsResult> {
        let cutoff = Utc::now() - Duration::days(RETENTION_DAYS);
        let deleted_count = self.logs.delete_older_than(cutoff).await?;

        let message = format!("Cleared {} logs older than {} days", deleted_count, RETENTION_DAYS);
        self.logs
            .create(NewActivityLog {
                user_id: Some(admin.id),
                action: "CLEAR_LOGS".to_string(),
                description: Some(message.clone()),
                status: LogStatus::Success,
                ip: meta.ip,
                user_agent: meta.user_agent,
            })
            .await?;

        Ok(ClearLogsResult {
            deleted_count,
            message,
        })
    }
}
