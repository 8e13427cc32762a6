use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{ActivityLog, ActivityLogEntry, ActivityLogQuery, LogActor, LogStatus, NewActivityLog},
    error::{AppError, Result},
    repository::{like_pattern, ActivityLogRepository},
};

#[derive(FromRow)]
struct LogRow {
    id: String,
    user_id: Option<String>,
    action: String,
    description: Option<String>,
    status: String,
    ip: Option<String>,
    user_agent: Option<String>,
    created_at: NaiveDateTime,
    actor_name: Option<String>,
    actor_reg_number: Option<String>,
    actor_email: Option<String>,
}

pub struct SqliteActivityLogRepository {
    pool: SqlitePool,
}

impl SqliteActivityLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: LogRow) -> Result<ActivityLogEntry> {
        let user_id = row
            .user_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user = match (user_id, row.actor_name, row.actor_reg_number, row.actor_email) {
            (Some(id), Some(full_name), Some(reg_number), Some(email)) => Some(LogActor {
                id,
                full_name,
                reg_number,
                email,
            }),
            _ => None,
        };

        Ok(ActivityLogEntry {
            log: ActivityLog {
                id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
                user_id,
                action: row.action,
                description: row.description,
                status: LogStatus::parse(&row.status).ok_or_else(|| {
                    AppError::Database(format!("Invalid log status: {}", row.status))
                })?,
                ip: row.ip,
                user_agent: row.user_agent,
                created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            },
            user,
        })
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &ActivityLogQuery) {
        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            qb.push(" AND (l.action LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR l.description LIKE ");
            qb.push_bind(pattern);
            qb.push(" ESCAPE '\\')");
        }
        if let Some(action) = &query.action {
            qb.push(" AND l.action = ");
            qb.push_bind(action.clone());
        }
        if let Some(status) = query.status {
            qb.push(" AND l.status = ");
            qb.push_bind(status.as_str());
        }
        if let Some(user_id) = query.user_id {
            qb.push(" AND l.user_id = ");
            qb.push_bind(user_id.to_string());
        }
        if let Some(start) = query.start_date {
            qb.push(" AND l.created_at >= ");
            qb.push_bind(start.naive_utc());
        }
        if let Some(end) = query.end_date {
            qb.push(" AND l.created_at <= ");
            qb.push_bind(end.naive_utc());
        }
    }
}

#[async_trait]
impl ActivityLogRepository for SqliteActivityLogRepository {
    async fn create(&self, entry: NewActivityLog) -> Result<ActivityLog> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO activity_logs (id, user_id, action, description, status, ip, user_agent, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(entry.user_id.map(|u| u.to_string()))
        .bind(&entry.action)
        .bind(&entry.description)
        .bind(entry.status.as_str())
        .bind(&entry.ip)
        .bind(&entry.user_agent)
        .bind(now.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(ActivityLog {
            id,
            user_id: entry.user_id,
            action: entry.action,
            description: entry.description,
            status: entry.status,
            ip: entry.ip,
            user_agent: entry.user_agent,
            created_at: now,
        })
    }

    async fn list(&self, query: &ActivityLogQuery) -> Result<Vec<ActivityLogEntry>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT l.id, l.user_id, l.action, l.description, l.status, l.ip,
                   l.user_agent, l.created_at,
                   s.full_name AS actor_name,
                   s.reg_number AS actor_reg_number,
                   s.email AS actor_email
            FROM activity_logs l
            LEFT JOIN students s ON s.id = l.user_id
            WHERE 1=1
            "#,
        );
        Self::push_filters(&mut qb, query);
        qb.push(" ORDER BY l.created_at DESC");
        qb.push(" LIMIT ");
        qb.push_bind(query.limit());
        qb.push(" OFFSET ");
        qb.push_bind(query.offset());

        let rows = qb.build_query_as::<LogRow>().fetch_all(&self.pool).await?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }

    async fn count(&self, query: &ActivityLogQuery) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM activity_logs l WHERE 1=1");
        Self::push_filters(&mut qb, query);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM activity_logs WHERE created_at < ?")
            .bind(cutoff.naive_utc())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn actors(&self) -> Result<Vec<LogActor>> {
        let rows = sqlx::query_as::<_, (String, String, String, String)>(
            r#"
            SELECT DISTINCT s.id, s.full_name, s.reg_number, s.email
            FROM activity_logs l
            JOIN students s ON s.id = l.user_id
            ORDER BY s.full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, full_name, reg_number, email)| {
                Ok(LogActor {
                    id: Uuid::parse_str(&id).map_err(|e| AppError::Database(e.to_string()))?,
                    full_name,
                    reg_number,
                    email,
                })
            })
            .collect()
    }
}
