pub mod activity_log_service;
pub mod announcement_service;
pub mod auth_service;
pub mod payment_service;
pub mod student_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtConfig;
use crate::config::Settings;
use crate::domain::NewActivityLog;
use crate::mail::Mailer;
use crate::repository::{
    ActivityLogRepository, AnnouncementRepository, PaymentRepository,
    SqliteActivityLogRepository, SqliteAnnouncementRepository, SqlitePaymentRepository,
    SqliteStudentRepository, StudentRepository,
};

pub use activity_log_service::ActivityLogService;
pub use announcement_service::AnnouncementService;
pub use auth_service::AuthService;
pub use payment_service::PaymentService;
pub use student_service::StudentService;

/// Request metadata carried into audit entries.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

pub struct ServiceContext {
    pub student_repo: Arc<dyn StudentRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub announcement_repo: Arc<dyn AnnouncementRepository>,
    pub activity_log_repo: Arc<dyn ActivityLogRepository>,
    pub auth_service: Arc<AuthService>,
    pub student_service: Arc<StudentService>,
    pub payment_service: Arc<PaymentService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub activity_log_service: Arc<ActivityLogService>,
    pub jwt: Arc<JwtConfig>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool, settings: &Settings, mailer: Arc<dyn Mailer>) -> Self {
        let student_repo: Arc<dyn StudentRepository> =
            Arc::new(SqliteStudentRepository::new(db_pool.clone()));
        let payment_repo: Arc<dyn PaymentRepository> =
            Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
        let announcement_repo: Arc<dyn AnnouncementRepository> =
            Arc::new(SqliteAnnouncementRepository::new(db_pool.clone()));
        let activity_log_repo: Arc<dyn ActivityLogRepository> =
            Arc::new(SqliteActivityLogRepository::new(db_pool.clone()));

        let jwt = Arc::new(JwtConfig::new(
            &settings.auth.jwt_secret,
            settings.auth.token_expiry_hours,
        ));

        let auth_service = Arc::new(AuthService::new(
            student_repo.clone(),
            activity_log_repo.clone(),
            mailer.clone(),
            jwt.clone(),
            settings.server.client_url.clone(),
        ));
        let student_service = Arc::new(StudentService::new(
            student_repo.clone(),
            payment_repo.clone(),
            activity_log_repo.clone(),
            mailer.clone(),
            settings.server.client_url.clone(),
        ));
        let payment_service = Arc::new(PaymentService::new(
            payment_repo.clone(),
            activity_log_repo.clone(),
            mailer.clone(),
            settings.mail.admin_email.clone(),
        ));
        let announcement_service = Arc::new(AnnouncementService::new(announcement_repo.clone()));
        let activity_log_service = Arc::new(ActivityLogService::new(activity_log_repo.clone()));

        Self {
            student_repo,
            payment_repo,
            announcement_repo,
            activity_log_repo,
            auth_service,
            student_service,
            payment_service,
            announcement_service,
            activity_log_service,
            jwt,
            db_pool,
        }
    }
}

/// Audit inserts are best-effort: never fail the request they describe.
pub(crate) async fn record_activity(
    repo: &Arc<dyn ActivityLogRepository>,
    entry: NewActivityLog,
) {
    if let Err(e) = repo.create(entry).await {
        tracing::warn!("Failed to record activity log: {}", e);
    }
}
