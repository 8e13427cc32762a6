use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use udass_api::{
    domain::{
        AnnouncementCategory, AnnouncementPriority, AnnouncementQuery,
        CreateAnnouncementRequest, Role, Student, UpdateAnnouncementRequest,
    },
    error::AppError,
    repository::{
        AnnouncementRepository, NewStudent, SqliteAnnouncementRepository,
        SqliteStudentRepository, StudentRepository,
    },
    service::AnnouncementService,
};

struct TestContext {
    pool: SqlitePool,
    service: AnnouncementService,
    admin: Student,
    member: Student,
}

async fn setup() -> anyhow::Result<TestContext> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let students = SqliteStudentRepository::new(pool.clone());
    let announcements: Arc<dyn AnnouncementRepository> =
        Arc::new(SqliteAnnouncementRepository::new(pool.clone()));
    let service = AnnouncementService::new(announcements);

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

    let member = students
        .create(NewStudent {
            full_name: "Member User".to_string(),
            email: "member@example.com".to_string(),
            phone: "+255710000002".to_string(),
            reg_number: "T24-01-00002".to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: Role::Student,
        })
        .await?;

    Ok(TestContext {
        pool,
        service,
        admin,
        member,
    })
}

fn create_request(title: &str, priority: AnnouncementPriority) -> CreateAnnouncementRequest {
    CreateAnnouncementRequest {
        title: title.to_string(),
        content: format!("{} body", title),
        category: AnnouncementCategory::General,
        priority,
        expires_at: None,
        tags: vec!["general".to_string()],
        attachments: vec![],
    }
}

#[tokio::test]
async fn test_soft_delete_hides_from_listings_but_not_direct_lookup() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let announcement = ctx
        .service
        .create(&ctx.admin, create_request("Meeting", AnnouncementPriority::Medium))
        .await?;

    let deleted = ctx.service.delete(&ctx.admin, announcement.id).await?;
    assert!(!deleted.is_active);

    // Default member listing no longer returns it
    let page = ctx
        .service
        .list(&ctx.member, AnnouncementQuery::default())
        .await?;
    assert!(page.announcements.is_empty());
    assert_eq!(page.pagination.total_items, 0);

    // Direct id lookup still works
    let found = ctx.service.get(announcement.id, false).await?;
    assert_eq!(found.id, announcement.id);
    assert!(!found.is_active);

    Ok(())
}

#[tokio::test]
async fn test_expired_announcements_drop_out_of_listings_at_query_time() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let mut request = create_request("Old news", AnnouncementPriority::Low);
    request.expires_at = Some(Utc::now() - Duration::days(1));
    let expired = ctx.service.create(&ctx.admin, request).await?;

    ctx.service
        .create(&ctx.admin, create_request("Fresh news", AnnouncementPriority::Low))
        .await?;

    let page = ctx
        .service
        .list(&ctx.member, AnnouncementQuery::default())
        .await?;
    assert_eq!(page.announcements.len(), 1);
    assert_eq!(page.announcements[0].title, "Fresh news");
    assert_eq!(page.pagination.total_items, 1);

    // No sweeper ran; the row is simply filtered out
    assert!(ctx.service.get(expired.id, false).await?.is_expired());

    Ok(())
}

#[tokio::test]
async fn test_listing_marks_read_and_bumps_views_once_per_user() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let announcement = ctx
        .service
        .create(&ctx.admin, create_request("Meeting", AnnouncementPriority::Medium))
        .await?;

    ctx.service
        .list(&ctx.member, AnnouncementQuery::default())
        .await?;
    assert_eq!(ctx.service.get(announcement.id, false).await?.views, 1);

    // A second listing by the same member does not double-count
    ctx.service
        .list(&ctx.member, AnnouncementQuery::default())
        .await?;
    assert_eq!(ctx.service.get(announcement.id, false).await?.views, 1);

    // The member's dashboard now hides it; an admin still sees everything
    let member_feed = ctx.service.dashboard(&ctx.member, 10).await?;
    assert!(member_feed.is_empty());

    let admin_feed = ctx.service.dashboard(&ctx.admin, 10).await?;
    assert_eq!(admin_feed.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_dashboard_orders_by_priority_rank_then_recency() -> anyhow::Result<()> {
    let ctx = setup().await?;

    ctx.service
        .create(&ctx.admin, create_request("Routine", AnnouncementPriority::Medium))
        .await?;
    ctx.service
        .create(&ctx.admin, create_request("Important", AnnouncementPriority::High))
        .await?;
    ctx.service
        .create(&ctx.admin, create_request("Evacuate", AnnouncementPriority::Urgent))
        .await?;

    let feed = ctx.service.dashboard(&ctx.admin, 10).await?;
    let titles: Vec<_> = feed.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Evacuate", "Important", "Routine"]);

    Ok(())
}

#[tokio::test]
async fn test_recent_only_includes_last_seven_days() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let old = ctx
        .service
        .create(&ctx.admin, create_request("Old", AnnouncementPriority::Low))
        .await?;
    ctx.service
        .create(&ctx.admin, create_request("New", AnnouncementPriority::Low))
        .await?;

    sqlx::query("UPDATE announcements SET published_at = ? WHERE id = ?")
        .bind((Utc::now() - Duration::days(10)).naive_utc())
        .bind(old.id.to_string())
        .execute(&ctx.pool)
        .await?;

    let recent = ctx.service.recent(5).await?;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].title, "New");

    Ok(())
}

#[tokio::test]
async fn test_admin_can_list_inactive_and_filter_by_category() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let mut request = create_request("Fees due", AnnouncementPriority::High);
    request.category = AnnouncementCategory::Payment;
    let payment_notice = ctx.service.create(&ctx.admin, request).await?;

    ctx.service
        .create(&ctx.admin, create_request("Other", AnnouncementPriority::Low))
        .await?;
    ctx.service.delete(&ctx.admin, payment_notice.id).await?;

    // Member listing is forced to active-only even if the flag is passed
    let sneaky = AnnouncementQuery {
        is_active: Some(false),
        ..Default::default()
    };
    let page = ctx.service.list(&ctx.member, sneaky).await?;
    assert_eq!(page.announcements.len(), 1);

    // Admins see soft-deleted rows when they ask for them
    let page = ctx
        .service
        .list(
            &ctx.admin,
            AnnouncementQuery {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(page.announcements.len(), 1);
    assert_eq!(page.announcements[0].id, payment_notice.id);

    // Category filter
    let page = ctx
        .service
        .list(
            &ctx.admin,
            AnnouncementQuery {
                category: Some(AnnouncementCategory::Payment),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(page.announcements.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_update_guards_and_merges() -> anyhow::Result<()> {
    let ctx = setup().await?;

    let announcement = ctx
        .service
        .create(&ctx.admin, create_request("Draft", AnnouncementPriority::Low))
        .await?;

    // A non-author, non-admin member may not touch it
    let err = ctx
        .service
        .update(
            &ctx.member,
            announcement.id,
            UpdateAnnouncementRequest {
                title: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let updated = ctx
        .service
        .update(
            &ctx.admin,
            announcement.id,
            UpdateAnnouncementRequest {
                title: Some("Final".to_string()),
                priority: Some(AnnouncementPriority::Urgent),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.priority, AnnouncementPriority::Urgent);
    // Unspecified fields survive
    assert_eq!(updated.content, "Draft body");
    assert_eq!(updated.tags, vec!["general".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_stats_groups_by_category_with_urgent_counts() -> anyhow::Result<()> {
    let ctx = setup().await?;

    ctx.service
        .create(&ctx.admin, create_request("A", AnnouncementPriority::Urgent))
        .await?;
    ctx.service
        .create(&ctx.admin, create_request("B", AnnouncementPriority::Low))
        .await?;

    let mut request = create_request("C", AnnouncementPriority::Medium);
    request.category = AnnouncementCategory::Event;
    ctx.service.create(&ctx.admin, request).await?;

    let stats = ctx.service.stats().await?;
    assert_eq!(stats.total, 3);

    let general = stats
        .stats
        .iter()
        .find(|s| s.category == AnnouncementCategory::General)
        .unwrap();
    assert_eq!(general.count, 2);
    assert_eq!(general.urgent, 1);

    let event = stats
        .stats
        .iter()
        .find(|s| s.category == AnnouncementCategory::Event)
        .unwrap();
    assert_eq!(event.count, 1);
    assert_eq!(event.urgent, 0);

    Ok(())
}
