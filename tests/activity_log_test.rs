use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use udass_api::{
    domain::{ActivityLogQuery, LogStatus, NewActivityLog, Role, Student},
    repository::{
        ActivityLogRepository, NewStudent, SqliteActivityLogRepository,
        SqliteStudentRepository, StudentRepository,
    },
    service::{ActivityLogService, RequestMeta},
};

struct TestContext {
    pool: SqlitePool,
    logs: Arc<dyn ActivityLogRepository>,
    service: ActivityLogService,
    admin: Student,
}

async fn setup() -> anyhow::Result<TestContext> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let students = SqliteStudentRepository::new(pool.clone());
    let logs: Arc<dyn ActivityLogRepository> =
        Arc::new(SqliteActivityLogRepository::new(pool.clone()));
    let service = ActivityLogService::new(logs.clone());

    let admin = students
        .create(NewStudent {
            full_name: "Admin User".to_string(),
            email: "admin@example.com".to_string(),
            phone: "+255710000001".to_string(),
            reg_number: "T20-01-00001".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::Admin,
        })
        .await?;

    Ok(TestContext {
        pool,
        logs,
        service,
        admin,
    })
}

fn entry(user: &Student, action: &str, description: &str) -> NewActivityLog {
    NewActivityLog {
        user_id: Some(user.id),
        action: action.to_string(),
        description: Some(description.to_string()),
        status: LogStatus::Success,
        ip: Some("127.0.0.1".to_string()),
        user_agent: Some("tests".to_string()),
    }
}

#[tokio::test]
async fn test_clear_removes_only_old_entries_and_logs_the_purge() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let old_a = ctx.logs.create(entry(&ctx.admin, "LOGIN", "old login")).await?;
    let old_b = ctx.logs.create(entry(&ctx.admin, "LOGIN", "older login")).await?;
    ctx.logs
        .create(entry(&ctx.admin, "PAYMENT_REQUEST", "fresh entry"))
        .await?;

    // Age two entries past the 30-day retention window
    for (id, days) in [(old_a.id, 31), (old_b.id, 45)] {
        sqlx::query("UPDATE activity_logs SET created_at = ? WHERE id = ?")
            .bind((Utc::now() - Duration::days(days)).naive_utc())
            .bind(id.to_string())
            .execute(&ctx.pool)
            .await?;
    }

    let result = ctx
        .service
        .clear_old(&ctx.admin, RequestMeta::default())
        .await?;
    assert_eq!(result.deleted_count, 2);
    assert!(result.message.contains("Cleared 2 logs"));

    // What remains: the fresh entry plus exactly one purge record
    let page = ctx.service.list(&ActivityLogQuery::default()).await?;
    assert_eq!(page.pagination.total_items, 2);

    let purges: Vec<_> = page
        .logs
        .iter()
        .filter(|e| e.log.action == "CLEAR_LOGS")
        .collect();
    assert_eq!(purges.len(), 1);
    assert_eq!(purges[0].log.user_id, Some(ctx.admin.id));
    assert_eq!(
        purges[0].log.description.as_deref(),
        Some("Cleared 2 logs older than 30 days")
    );

    Ok(())
}

#[tokio::test]
async fn test_list_filters_and_pagination() -> anyhow::Result<()> {
    let ctx = setup().await?;

    ctx.logs.create(entry(&ctx.admin, "LOGIN", "signed in")).await?;
    ctx.logs
        .create(entry(&ctx.admin, "PAYMENT_REQUEST", "requested approval"))
        .await?;
    ctx.logs
        .create(NewActivityLog {
            status: LogStatus::Error,
            ..entry(&ctx.admin, "LOGIN", "bad password")
        })
        .await?;

    // Exact action filter
    let page = ctx
        .service
        .list(&ActivityLogQuery {
            action: Some("PAYMENT_REQUEST".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(page.logs.len(), 1);
    assert_eq!(page.pagination.total_items, 1);

    // Substring search over descriptions
    let page = ctx
        .service
        .list(&ActivityLogQuery {
            search: Some("password".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(page.logs.len(), 1);

    // Status filter
    let page = ctx
        .service
        .list(&ActivityLogQuery {
            status: Some(LogStatus::Error),
            ..Default::default()
        })
        .await?;
    assert_eq!(page.logs.len(), 1);

    // The joined actor comes back with the entry, and the distinct user set
    // is reported alongside
    let page = ctx.service.list(&ActivityLogQuery::default()).await?;
    assert_eq!(page.pagination.total_items, 3);
    assert_eq!(page.users.len(), 1);
    assert_eq!(page.users[0].id, ctx.admin.id);
    let actor = page.logs[0].user.as_ref().unwrap();
    assert_eq!(actor.email, "admin@example.com");

    // Pagination envelope
    let page = ctx
        .service
        .list(&ActivityLogQuery {
            limit: 2,
            page: 2,
            ..Default::default()
        })
        .await?;
    assert_eq!(page.logs.len(), 1);
    assert_eq!(page.pagination.total_pages, 2);
    assert_eq!(page.pagination.items_per_page, 2);

    Ok(())
}

#[tokio::test]
async fn test_date_range_filter() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let old = ctx.logs.create(entry(&ctx.admin, "LOGIN", "old")).await?;
    ctx.logs.create(entry(&ctx.admin, "LOGIN", "new")).await?;

    sqlx::query("UPDATE activity_logs SET created_at = ? WHERE id = ?")
        .bind((Utc::now() - Duration::days(10)).naive_utc())
        .bind(old.id.to_string())
        .execute(&ctx.pool)
        .await?;

    let page = ctx
        .service
        .list(&ActivityLogQuery {
            start_date: Some(Utc::now() - Duration::days(1)),
            ..Default::default()
        })
        .await?;
    assert_eq!(page.logs.len(), 1);
    assert_eq!(page.logs[0].log.description.as_deref(), Some("new"));

    let page = ctx
        .service
        .list(&ActivityLogQuery {
            end_date: Some(Utc::now() - Duration::days(1)),
            ..Default::default()
        })
        .await?;
    assert_eq!(page.logs.len(), 1);
    assert_eq!(page.logs[0].log.description.as_deref(), Some("old"));

    Ok(())
}
