use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        Announcement, AnnouncementCategory, AnnouncementPriority, AnnouncementQuery,
        AnnouncementSortField, AnnouncementStats, CategoryStat,
    },
    error::{AppError, Result},
    repository::{like_pattern, AnnouncementRepository},
};

const COLUMNS: &str = "id, title, content, category, priority, published_at, expires_at, \
                       is_active, created_by, tags, attachments, views, created_at, updated_at";

/// Ranks priorities so urgent outranks high; plain text sort would not.
const PRIORITY_RANK: &str =
    "CASE priority WHEN 'urgent' THEN 3 WHEN 'high' THEN 2 WHEN 'medium' THEN 1 ELSE 0 END";

#[derive(FromRow)]
struct AnnouncementRow {
    id: String,
    title: String,
    content: String,
    category: String,
    priority: String,
    published_at: NaiveDateTime,
    expires_at: NaiveDateTime,
    is_active: i32,
    created_by: String,
    tags: String,
    attachments: String,
    views: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteAnnouncementRepository {
    pool: SqlitePool,
}

impl SqliteAnnouncementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_announcement(row: AnnouncementRow) -> Result<Announcement> {
        Ok(Announcement {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            content: row.content,
            category: AnnouncementCategory::parse(&row.category).ok_or_else(|| {
                AppError::Database(format!("Invalid announcement category: {}", row.category))
            })?,
            priority: AnnouncementPriority::parse(&row.priority).ok_or_else(|| {
                AppError::Database(format!("Invalid announcement priority: {}", row.priority))
            })?,
            published_at: DateTime::from_naive_utc_and_offset(row.published_at, Utc),
            expires_at: DateTime::from_naive_utc_and_offset(row.expires_at, Utc),
            is_active: row.is_active != 0,
            created_by: Uuid::parse_str(&row.created_by)
                .map_err(|e| AppError::Database(e.to_string()))?,
            tags: serde_json::from_str(&row.tags)
                .map_err(|e| AppError::Database(format!("Invalid tags payload: {}", e)))?,
            attachments: serde_json::from_str(&row.attachments)
                .map_err(|e| AppError::Database(format!("Invalid attachments payload: {}", e)))?,
            views: row.views,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &AnnouncementQuery) {
        // Expiry is enforced here, at query time; nothing sweeps expired rows.
        qb.push(" AND expires_at > ");
        qb.push_bind(Utc::now().naive_utc());

        if let Some(is_active) = query.is_active {
            qb.push(" AND is_active = ");
            qb.push_bind(if is_active { 1i32 } else { 0i32 });
        }
        if let Some(category) = query.category {
            qb.push(" AND category = ");
            qb.push_bind(category.as_str());
        }
        if let Some(priority) = query.priority {
            qb.push(" AND priority = ");
            qb.push_bind(priority.as_str());
        }
        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            qb.push(" AND (title LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR content LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR tags LIKE ");
            qb.push_bind(pattern);
            qb.push(" ESCAPE '\\')");
        }
    }

    fn order_expr(sort_by: AnnouncementSortField) -> &'static str {
        match sort_by {
            AnnouncementSortField::PublishedAt => "published_at",
            AnnouncementSortField::CreatedAt => "created_at",
            AnnouncementSortField::Priority => PRIORITY_RANK,
            AnnouncementSortField::Views => "views",
            AnnouncementSortField::Title => "title",
        }
    }
}

#[async_trait]
impl AnnouncementRepository for SqliteAnnouncementRepository {
    async fn create(&self, announcement: Announcement) -> Result<Announcement> {
        let now = Utc::now().naive_utc();
        let tags = serde_json::to_string(&announcement.tags)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let attachments = serde_json::to_string(&announcement.attachments)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO announcements (
                id, title, content, category, priority, published_at, expires_at,
                is_active, created_by, tags, attachments, views, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(announcement.id.to_string())
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.category.as_str())
        .bind(announcement.priority.as_str())
        .bind(announcement.published_at.naive_utc())
        .bind(announcement.expires_at.naive_utc())
        .bind(if announcement.is_active { 1i32 } else { 0i32 })
        .bind(announcement.created_by.to_string())
        .bind(tags)
        .bind(attachments)
        .bind(announcement.views)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(announcement.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created announcement".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>> {
        let row = sqlx::query_as::<_, AnnouncementRow>(&format!(
            "SELECT {} FROM announcements WHERE id = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_announcement(r)?)),
            None => Ok(None),
        }
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE announcements SET views = views + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self, query: &AnnouncementQuery) -> Result<Vec<Announcement>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM announcements WHERE 1=1",
            COLUMNS
        ));
        Self::push_filters(&mut qb, query);
        qb.push(format!(
            " ORDER BY {} {}",
            Self::order_expr(query.sort_by),
            query.sort_order.as_sql()
        ));
        qb.push(" LIMIT ");
        qb.push_bind(query.limit());
        qb.push(" OFFSET ");
        qb.push_bind(query.offset());

        let rows = qb
            .build_query_as::<AnnouncementRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_announcement).collect()
    }

    async fn count(&self, query: &AnnouncementQuery) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM announcements WHERE 1=1");
        Self::push_filters(&mut qb, query);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn mark_read(&self, announcement_id: Uuid, student_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO announcement_reads (announcement_id, student_id, read_at) VALUES (?, ?, ?)",
        )
        .bind(announcement_id.to_string())
        .bind(student_id.to_string())
        .bind(Utc::now().naive_utc())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.increment_views(announcement_id).await?;
        Ok(true)
    }

    async fn dashboard(
        &self,
        viewer: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Announcement>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM announcements WHERE is_active = 1 AND expires_at > ",
            COLUMNS
        ));
        qb.push_bind(Utc::now().naive_utc());

        if unread_only {
            qb.push(
                " AND id NOT IN (SELECT announcement_id FROM announcement_reads WHERE student_id = ",
            );
            qb.push_bind(viewer.to_string());
            qb.push(")");
        }

        qb.push(format!(" ORDER BY {} DESC, published_at DESC", PRIORITY_RANK));
        qb.push(" LIMIT ");
        qb.push_bind(limit);

        let rows = qb
            .build_query_as::<AnnouncementRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_announcement).collect()
    }

    async fn recent(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Announcement>> {
        let rows = sqlx::query_as::<_, AnnouncementRow>(&format!(
            r#"
            SELECT {} FROM announcements
            WHERE is_active = 1 AND published_at >= ? AND expires_at > ?
            ORDER BY published_at DESC
            LIMIT ?
            "#,
            COLUMNS
        ))
        .bind(since.naive_utc())
        .bind(Utc::now().naive_utc())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_announcement).collect()
    }

    async fn update(&self, id: Uuid, announcement: Announcement) -> Result<Announcement> {
        let now = Utc::now().naive_utc();
        let tags = serde_json::to_string(&announcement.tags)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let attachments = serde_json::to_string(&announcement.attachments)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE announcements
            SET title = ?, content = ?, category = ?, priority = ?,
                published_at = ?, expires_at = ?, is_active = ?,
                tags = ?, attachments = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&announcement.title)
        .bind(&announcement.content)
        .bind(announcement.category.as_str())
        .bind(announcement.priority.as_str())
        .bind(announcement.published_at.naive_utc())
        .bind(announcement.expires_at.naive_utc())
        .bind(if announcement.is_active { 1i32 } else { 0i32 })
        .bind(tags)
        .bind(attachments)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Announcement not found".to_string())
        })
    }

    async fn soft_delete(&self, id: Uuid) -> Result<Announcement> {
        sqlx::query("UPDATE announcements SET is_active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Announcement not found".to_string())
        })
    }

    async fn stats(&self) -> Result<AnnouncementStats> {
        let now = Utc::now().naive_utc();

        let rows = sqlx::query_as::<_, (String, i64, i64)>(
            r#"
            SELECT category,
                   COUNT(*) AS count,
                   COALESCE(SUM(CASE WHEN priority = 'urgent' THEN 1 ELSE 0 END), 0) AS urgent
            FROM announcements
            WHERE is_active = 1 AND expires_at > ?
            GROUP BY category
            ORDER BY count DESC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let mut stats = Vec::with_capacity(rows.len());
        let mut total = 0;
        for (category, count, urgent) in rows {
            total += count;
            stats.push(CategoryStat {
                category: AnnouncementCategory::parse(&category).ok_or_else(|| {
                    AppError::Database(format!("Invalid announcement category: {}", category))
                })?,
                count,
                urgent,
            });
        }

        Ok(AnnouncementStats { stats, total })
    }
}
