use chrono::{Duration, Utc};
use clap::Parser;
use fake::{faker::name::en::Name, Fake};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use udass_api::{
    auth,
    domain::{
        Announcement, AnnouncementCategory, AnnouncementPriority, Role, UpdateStudentRequest,
    },
    repository::{
        AnnouncementRepository, NewStudent, SqliteAnnouncementRepository,
        SqliteStudentRepository, StudentRepository,
    },
};

#[derive(Parser)]
#[command(about = "Seed the development database with sample data")]
struct Args {
    /// Number of regular students to create
    #[arg(long, default_value_t = 20)]
    count: usize,

    /// Database URL (falls back to DATABASE_URL, then sqlite://udass.db)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://udass.db".to_string());

    println!("Seeding {}...", database_url);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let students = SqliteStudentRepository::new(pool.clone());
    let announcements = SqliteAnnouncementRepository::new(pool.clone());

    let password_hash = auth::hash_password("password123")?;

    // Admin account
    let admin = students
        .create(NewStudent {
            full_name: "Admin User".to_string(),
            email: "admin@udass.co.tz".to_string(),
            phone: "+255710000001".to_string(),
            reg_number: "T20-01-00001".to_string(),
            password_hash: password_hash.clone(),
            role: Role::Admin,
        })
        .await?;
    students
        .update(
            admin.id,
            UpdateStudentRequest {
                is_membership_active: Some(true),
                membership_expiry: Some(Utc::now() + Duration::days(365)),
                ..Default::default()
            },
        )
        .await?;
    println!("  created admin (admin@udass.co.tz / password123)");

    // Regular students; every third one gets an active membership
    for i in 0..args.count {
        let full_name: String = Name().fake();
        let student = students
            .create(NewStudent {
                full_name,
                email: format!("student{:03}@example.com", i + 1),
                phone: format!("+2557{:08}", 10_000_000 + i as u64),
                reg_number: format!("T24-{:02}-{:05}", (i % 12) + 1, 10_000 + i),
                password_hash: password_hash.clone(),
                role: Role::Student,
            })
            .await?;

        if i % 3 == 0 {
            students
                .update(
                    student.id,
                    UpdateStudentRequest {
                        is_membership_active: Some(true),
                        membership_expiry: Some(Utc::now() + Duration::days(365)),
                        ..Default::default()
                    },
                )
                .await?;
        }
    }
    println!("  created {} students", args.count);

    // A few announcements so the dashboard is not empty
    let now = Utc::now();
    let samples = [
        (
            "Welcome to the new semester",
            "Registration for association activities is now open.",
            AnnouncementCategory::General,
            AnnouncementPriority::Medium,
        ),
        (
            "Membership fees due",
            "Please submit your membership fee of 2000 TZS before the end of the month.",
            AnnouncementCategory::Payment,
            AnnouncementPriority::High,
        ),
        (
            "Annual general meeting",
            "The AGM takes place next Friday in the main lecture hall.",
            AnnouncementCategory::Event,
            AnnouncementPriority::Urgent,
        ),
    ];

    for (title, content, category, priority) in samples {
        announcements
            .create(Announcement {
                id: Uuid::new_v4(),
                title: title.to_string(),
                content: content.to_string(),
                category,
                priority,
                published_at: now,
                expires_at: now + Duration::days(30),
                is_active: true,
                created_by: admin.id,
                tags: vec![],
                attachments: vec![],
                views: 0,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("  created {} announcements", samples.len());

    println!("Done.");
    Ok(())
}
