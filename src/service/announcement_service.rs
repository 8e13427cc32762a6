use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    domain::{
        Announcement, AnnouncementPage, AnnouncementQuery, AnnouncementStats,
        CreateAnnouncementRequest, PageMeta, Student, UpdateAnnouncementRequest,
        DEFAULT_EXPIRY_DAYS,
    },
    error::{AppError, Result},
    repository::AnnouncementRepository,
};

/// "Recent" for the public landing page means published within this window.
const RECENT_WINDOW_DAYS: i64 = 7;

pub struct AnnouncementService {
    announcements: Arc<dyn AnnouncementRepository>,
}

impl AnnouncementService {
    pub fn new(announcements: Arc<dyn AnnouncementRepository>) -> Self {
        Self { announcements }
    }

    pub async fn create(
        &self,
        author: &Student,
        request: CreateAnnouncementRequest,
    ) -> Result<Announcement> {
        let now = Utc::now();
        let announcement = Announcement {
            id: Uuid::new_v4(),
            title: request.title,
            content: request.content,
            category: request.category,
            priority: request.priority,
            published_at: now,
            expires_at: request
                .expires_at
                .unwrap_or_else(|| now + Duration::days(DEFAULT_EXPIRY_DAYS)),
            is_active: true,
            created_by: author.id,
            tags: request.tags,
            attachments: request.attachments,
            views: 0,
            created_at: now,
            updated_at: now,
        };

        self.announcements.create(announcement).await
    }

    /// Paged listing. Non-admins only ever see active announcements and,
    /// as a side effect, everything the page returned is marked read for
    /// them (bumping the view counter once per user).
    pub async fn list(&self, viewer: &Student, mut query: AnnouncementQuery) -> Result<AnnouncementPage> {
        if !viewer.is_admin() {
            query.is_active = Some(true);
        }

        let (announcements, total) = tokio::try_join!(
            self.announcements.list(&query),
            self.announcements.count(&query)
        )?;

        for announcement in &announcements {
            self.announcements.mark_read(announcement.id, viewer.id).await?;
        }

        Ok(AnnouncementPage {
            announcements,
            pagination: PageMeta::new(query.page(), query.limit(), total),
        })
    }

    /// Direct lookup ignores `is_active` so soft-deleted records stay
    /// reachable by id.
    pub async fn get(&self, id: Uuid, increment_view: bool) -> Result<Announcement> {
        let mut announcement = self
            .announcements
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        if increment_view {
            self.announcements.increment_views(id).await?;
            announcement.views += 1;
        }

        Ok(announcement)
    }

    pub async fn update(
        &self,
        actor: &Student,
        id: Uuid,
        request: UpdateAnnouncementRequest,
    ) -> Result<Announcement> {
        let mut announcement = self
            .announcements
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        if announcement.created_by != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "You are not authorized to update this announcement".to_string(),
            ));
        }

        if let Some(title) = request.title {
            announcement.title = title;
        }
        if let Some(content) = request.content {
            announcement.content = content;
        }
        if let Some(category) = request.category {
            announcement.category = category;
        }
        if let Some(priority) = request.priority {
            announcement.priority = priority;
        }
        if let Some(expires_at) = request.expires_at {
            announcement.expires_at = expires_at;
        }
        if let Some(tags) = request.tags {
            announcement.tags = tags;
        }
        if let Some(attachments) = request.attachments {
            announcement.attachments = attachments;
        }

        self.announcements.update(id, announcement).await
    }

    /// Soft delete: the record stays, flagged inactive.
    pub async fn delete(&self, actor: &Student, id: Uuid) -> Result<Announcement> {
        let announcement = self
            .announcements
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Announcement not found".to_string()))?;

        if announcement.created_by != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "You are not authorized to delete this announcement".to_string(),
            ));
        }

        self.announcements.soft_delete(id).await
    }

    /// Dashboard feed: urgent first, newest first; non-admins only see what
    /// they have not read yet.
    pub async fn dashboard(&self, viewer: &Student, limit: i64) -> Result<Vec<Announcement>> {
        self.announcements
            .dashboard(viewer.id, !viewer.is_admin(), limit)
            .await
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Announcement>> {
        let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        self.announcements.recent(since, limit).await
    }

    pub async fn stats(&self) -> Result<AnnouncementStats> {
        self.announcements.stats().await
    }
}
