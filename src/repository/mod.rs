use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod activity_log_repository;
pub mod announcement_repository;
pub mod payment_repository;
pub mod student_repository;

pub use activity_log_repository::SqliteActivityLogRepository;
pub use announcement_repository::SqliteAnnouncementRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use student_repository::SqliteStudentRepository;

/// Insert-shape for a student row; the password arrives pre-hashed.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub reg_number: String,
    pub password_hash: String,
    pub role: Role,
}

/// A reset-token lookup hit: the matching student plus the stored expiry.
#[derive(Debug, Clone)]
pub struct ResetTokenMatch {
    pub student: Student,
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn create(&self, record: NewStudent) -> Result<Student>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Student>>;
    /// Single combined uniqueness probe across email/phone/regNumber.
    async fn find_duplicate(
        &self,
        email: &str,
        phone: &str,
        reg_number: &str,
    ) -> Result<Option<Student>>;
    async fn password_hash_by_email(&self, email: &str) -> Result<Option<String>>;
    async fn list(&self, query: &StudentQuery) -> Result<Vec<Student>>;
    async fn count(&self, query: &StudentQuery) -> Result<i64>;
    async fn update(&self, id: Uuid, update: UpdateStudentRequest) -> Result<Student>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;
    async fn clear_reset_token(&self, id: Uuid) -> Result<()>;
    async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<ResetTokenMatch>>;
    /// Replaces the password and consumes any outstanding reset token.
    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()>;
    async fn stats(&self) -> Result<StudentStats>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, payment: Payment) -> Result<Payment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>>;
    /// The caller's pending payment that is still inside its claim window.
    async fn find_live_pending(&self, user_id: Uuid) -> Result<Option<Payment>>;
    /// Applies the on-save expiry rule: pending rows past expires_at flip to
    /// cancelled. Returns how many were cancelled.
    async fn cancel_expired_for_user(&self, user_id: Uuid) -> Result<u64>;
    async fn update_status(&self, id: Uuid, status: PaymentStatus) -> Result<Payment>;
}

#[async_trait]
pub trait AnnouncementRepository: Send + Sync {
    async fn create(&self, announcement: Announcement) -> Result<Announcement>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Announcement>>;
    async fn increment_views(&self, id: Uuid) -> Result<()>;
    async fn list(&self, query: &AnnouncementQuery) -> Result<Vec<Announcement>>;
    async fn count(&self, query: &AnnouncementQuery) -> Result<i64>;
    /// Records that a student has seen an announcement; bumps the view
    /// counter only on the first time. Returns whether it was newly marked.
    async fn mark_read(&self, announcement_id: Uuid, student_id: Uuid) -> Result<bool>;
    async fn dashboard(&self, viewer: Uuid, unread_only: bool, limit: i64)
        -> Result<Vec<Announcement>>;
    async fn recent(&self, since: DateTime<Utc>, limit: i64) -> Result<Vec<Announcement>>;
    async fn update(&self, id: Uuid, announcement: Announcement) -> Result<Announcement>;
    async fn soft_delete(&self, id: Uuid) -> Result<Announcement>;
    async fn stats(&self) -> Result<AnnouncementStats>;
}

#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn create(&self, entry: NewActivityLog) -> Result<ActivityLog>;
    async fn list(&self, query: &ActivityLogQuery) -> Result<Vec<ActivityLogEntry>>;
    async fn count(&self, query: &ActivityLogQuery) -> Result<i64>;
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64>;
    /// Distinct students that appear in the log, for the admin filter UI.
    async fn actors(&self) -> Result<Vec<LogActor>>;
}

/// `LIKE` pattern for a case-insensitive substring match, with the wildcard
/// characters in the needle escaped (pair with `ESCAPE '\'`).
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("a%b_c"), "%a\\%b\\_c%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
