use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;

use udass_api::{
    domain::{ActivityLogQuery, Role, UpdateStudentRequest},
    error::Result,
    mail::Mailer,
    repository::{
        ActivityLogRepository, NewStudent, PaymentRepository, SqliteActivityLogRepository,
        SqlitePaymentRepository, SqliteStudentRepository, StudentRepository,
    },
    service::{RequestMeta, StudentService},
};

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, _html: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn test_activation_email_fires_only_on_false_to_true() -> anyhow::Result<()> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let students: Arc<dyn StudentRepository> =
        Arc::new(SqliteStudentRepository::new(pool.clone()));
    let payments: Arc<dyn PaymentRepository> =
        Arc::new(SqlitePaymentRepository::new(pool.clone()));
    let activity_logs: Arc<dyn ActivityLogRepository> =
        Arc::new(SqliteActivityLogRepository::new(pool.clone()));
    let mailer = Arc::new(RecordingMailer::default());

    let service = StudentService::new(
        students.clone(),
        payments,
        activity_logs.clone(),
        mailer.clone(),
        "http://localhost:5173".to_string(),
    );

    let student = students
        .create(NewStudent {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "+255712345678".to_string(),
            reg_number: "T24-03-16678".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::Student,
        })
        .await?;

    let activate = || UpdateStudentRequest {
        is_membership_active: Some(true),
        ..Default::default()
    };
    let deactivate = || UpdateStudentRequest {
        is_membership_active: Some(false),
        ..Default::default()
    };

    // false -> true: exactly one activation email
    service
        .update(student.id, activate(), RequestMeta::default())
        .await?;
    {
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "jane@example.com");
        assert_eq!(sent[0].1, "Welcome to UDASS - Account Activated");
    }

    // true -> true: no email
    service
        .update(student.id, activate(), RequestMeta::default())
        .await?;
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);

    // true -> false: no email
    service
        .update(student.id, deactivate(), RequestMeta::default())
        .await?;
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);

    // An unrelated edit while inactive sends nothing either
    service
        .update(
            student.id,
            UpdateStudentRequest {
                full_name: Some("Jane D.".to_string()),
                ..Default::default()
            },
            RequestMeta::default(),
        )
        .await?;
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);

    // A second false -> true transition is a new approval and mails again
    service
        .update(student.id, activate(), RequestMeta::default())
        .await?;
    assert_eq!(mailer.sent.lock().unwrap().len(), 2);

    // Each approval left an audit entry
    let logs = activity_logs
        .list(&ActivityLogQuery {
            action: Some("MEMBER_ACTIVATED".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(logs.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_stats_counts_active_unexpired_memberships() -> anyhow::Result<()> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let students: Arc<dyn StudentRepository> =
        Arc::new(SqliteStudentRepository::new(pool.clone()));

    for n in 0..3u32 {
        students
            .create(NewStudent {
                full_name: format!("Student {}", n),
                email: format!("student{}@example.com", n),
                phone: format!("+2557{:08}", 10_000_000 + n),
                reg_number: format!("T24-03-{:05}", 10_000 + n),
                password_hash: "not-a-real-hash".to_string(),
                role: Role::Student,
            })
            .await?;
    }

    let all = students.list(&Default::default()).await?;

    // One active with a future expiry, one active but already lapsed
    students
        .update(
            all[0].id,
            UpdateStudentRequest {
                is_membership_active: Some(true),
                membership_expiry: Some(chrono::Utc::now() + chrono::Duration::days(180)),
                ..Default::default()
            },
        )
        .await?;
    students
        .update(
            all[1].id,
            UpdateStudentRequest {
                is_membership_active: Some(true),
                membership_expiry: Some(chrono::Utc::now() - chrono::Duration::days(1)),
                ..Default::default()
            },
        )
        .await?;

    let stats = students.stats().await?;
    assert_eq!(stats.total_students, 3);
    assert_eq!(stats.paid_this_year, 1);

    Ok(())
}
