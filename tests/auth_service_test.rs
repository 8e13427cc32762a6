use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use udass_api::{
    auth::{self, JwtConfig},
    domain::RegisterRequest,
    error::{AppError, Result},
    mail::Mailer,
    repository::{
        ActivityLogRepository, SqliteActivityLogRepository, SqliteStudentRepository,
        StudentRepository,
    },
    service::{AuthService, RequestMeta},
};

/// Captures outgoing mail instead of sending it.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }
}

struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<()> {
        Err(AppError::Internal("smtp down".to_string()))
    }
}

struct TestContext {
    pool: SqlitePool,
    students: Arc<dyn StudentRepository>,
    mailer: Arc<RecordingMailer>,
    jwt: Arc<JwtConfig>,
    service: AuthService,
}

async fn setup() -> anyhow::Result<TestContext> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let students: Arc<dyn StudentRepository> =
        Arc::new(SqliteStudentRepository::new(pool.clone()));
    let activity_logs: Arc<dyn ActivityLogRepository> =
        Arc::new(SqliteActivityLogRepository::new(pool.clone()));
    let mailer = Arc::new(RecordingMailer::default());
    let jwt = Arc::new(JwtConfig::new("test-secret", 24));

    let service = AuthService::new(
        students.clone(),
        activity_logs,
        mailer.clone(),
        jwt.clone(),
        "http://localhost:5173".to_string(),
    );

    Ok(TestContext {
        pool,
        students,
        mailer,
        jwt,
        service,
    })
}

fn register_request(email: &str, phone: &str, reg_number: &str) -> RegisterRequest {
    RegisterRequest {
        full_name: "Jane Doe".to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        reg_number: reg_number.to_string(),
        password: "secret1".to_string(),
    }
}

#[tokio::test]
async fn test_register_then_login_roundtrip() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let student = ctx
        .service
        .register(
            register_request("jane@example.com", "+255712345678", "T24-03-16678"),
            RequestMeta::default(),
        )
        .await?;

    let (logged_in, token) = ctx.service.login("jane@example.com", "secret1").await?;
    assert_eq!(logged_in.id, student.id);

    // The issued token resolves back to the same student, the way the auth
    // middleware consumes it.
    assert_eq!(ctx.jwt.verify(&token)?, student.id);

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_duplicates_naming_the_field() -> anyhow::Result<()> {
    let ctx = setup().await?;

    ctx.service
        .register(
            register_request("jane@example.com", "+255712345678", "T24-03-16678"),
            RequestMeta::default(),
        )
        .await?;

    let err = ctx
        .service
        .register(
            register_request("jane@example.com", "+255712345679", "T24-03-16679"),
            RequestMeta::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Email already in use"));

    let err = ctx
        .service
        .register(
            register_request("other@example.com", "+255712345678", "T24-03-16679"),
            RequestMeta::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Phone number already in use"));

    let err = ctx
        .service
        .register(
            register_request("other@example.com", "+255712345679", "T24-03-16678"),
            RequestMeta::default(),
        )
        .await
        .unwrap_err();
    assert!(
        matches!(err, AppError::BadRequest(ref m) if m == "Registration number already exists")
    );

    Ok(())
}

#[tokio::test]
async fn test_login_failures() -> anyhow::Result<()> {
    let ctx = setup().await?;

    ctx.service
        .register(
            register_request("jane@example.com", "+255712345678", "T24-03-16678"),
            RequestMeta::default(),
        )
        .await?;

    let err = ctx
        .service
        .login("unknown@example.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = ctx
        .service
        .login("jane@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    Ok(())
}

#[tokio::test]
async fn test_password_reset_flow_consumes_token() -> anyhow::Result<()> {
    let ctx = setup().await?;

    ctx.service
        .register(
            register_request("jane@example.com", "+255712345678", "T24-03-16678"),
            RequestMeta::default(),
        )
        .await?;

    ctx.service.forgot_password("jane@example.com").await?;

    // The raw token only exists inside the emailed link.
    let token = {
        let sent = ctx.mailer.sent.lock().unwrap();
        let (to, subject, html) = sent.last().unwrap();
        assert_eq!(to, "jane@example.com");
        assert_eq!(subject, "Reset Password");
        html.split("/reset-password/")
            .nth(1)
            .unwrap()
            .split('<')
            .next()
            .unwrap()
            .trim()
            .to_string()
    };

    ctx.service.reset_password(&token, "new-password").await?;

    // New password works, old one does not.
    assert!(ctx.service.login("jane@example.com", "new-password").await.is_ok());
    assert!(ctx.service.login("jane@example.com", "secret1").await.is_err());

    // A consumed token cannot be replayed.
    let err = ctx
        .service
        .reset_password(&token, "another-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_expired_reset_token_is_rejected() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let student = ctx
        .service
        .register(
            register_request("jane@example.com", "+255712345678", "T24-03-16678"),
            RequestMeta::default(),
        )
        .await?;

    let token = auth::generate_reset_token();
    ctx.students
        .set_reset_token(student.id, &token.hashed, Utc::now() - Duration::minutes(5))
        .await?;

    let err = ctx
        .service
        .reset_password(&token.raw, "new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("expired")));

    // The stale token was consumed in the process.
    let err = ctx
        .service
        .reset_password(&token.raw, "new-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_failed_reset_email_leaves_no_live_token() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let student = ctx
        .service
        .register(
            register_request("jane@example.com", "+255712345678", "T24-03-16678"),
            RequestMeta::default(),
        )
        .await?;

    let activity_logs: Arc<dyn ActivityLogRepository> =
        Arc::new(SqliteActivityLogRepository::new(ctx.pool.clone()));
    let broken = AuthService::new(
        ctx.students.clone(),
        activity_logs,
        Arc::new(FailingMailer),
        ctx.jwt.clone(),
        "http://localhost:5173".to_string(),
    );

    let err = broken.forgot_password("jane@example.com").await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)));

    let stored: Option<String> =
        sqlx::query_scalar("SELECT password_reset_token FROM students WHERE id = ?")
            .bind(student.id.to_string())
            .fetch_one(&ctx.pool)
            .await?;
    assert!(stored.is_none());

    Ok(())
}
