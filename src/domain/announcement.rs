use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{empty_string_as_none, optional_bool_param, SortOrder};

/// Default lifetime of an announcement when no expiry is given.
pub const DEFAULT_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: AnnouncementCategory,
    pub priority: AnnouncementPriority,
    pub published_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub tags: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Announcement {
    /// Expiry is evaluated at read time; nothing sweeps expired rows.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Published within the last 24 hours.
    pub fn is_new(&self) -> bool {
        self.published_at > Utc::now() - Duration::hours(24)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    pub size: Option<i64>,
    pub mimetype: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementCategory {
    #[default]
    General,
    Event,
    Payment,
    Emergency,
    Academic,
    Other,
}

impl AnnouncementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementCategory::General => "general",
            AnnouncementCategory::Event => "event",
            AnnouncementCategory::Payment => "payment",
            AnnouncementCategory::Emergency => "emergency",
            AnnouncementCategory::Academic => "academic",
            AnnouncementCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general" => Some(AnnouncementCategory::General),
            "event" => Some(AnnouncementCategory::Event),
            "payment" => Some(AnnouncementCategory::Payment),
            "emergency" => Some(AnnouncementCategory::Emergency),
            "academic" => Some(AnnouncementCategory::Academic),
            "other" => Some(AnnouncementCategory::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl AnnouncementPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementPriority::Low => "low",
            AnnouncementPriority::Medium => "medium",
            AnnouncementPriority::High => "high",
            AnnouncementPriority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(AnnouncementPriority::Low),
            "medium" => Some(AnnouncementPriority::Medium),
            "high" => Some(AnnouncementPriority::High),
            "urgent" => Some(AnnouncementPriority::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required and must be at most 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Content is required and must be at most 5000 characters"))]
    pub content: String,

    #[serde(default)]
    pub category: AnnouncementCategory,

    #[serde(default)]
    pub priority: AnnouncementPriority,

    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be at most 200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Content must be at most 5000 characters"))]
    pub content: Option<String>,

    pub category: Option<AnnouncementCategory>,
    pub priority: Option<AnnouncementPriority>,
    pub expires_at: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
    pub attachments: Option<Vec<Attachment>>,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AnnouncementSortField {
    #[default]
    PublishedAt,
    CreatedAt,
    Priority,
    Views,
    Title,
}

/// Listing parameters; non-admin callers have `is_active` forced to true by
/// the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnouncementQuery {
    pub page: i64,
    pub limit: i64,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub category: Option<AnnouncementCategory>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub priority: Option<AnnouncementPriority>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
    pub sort_by: AnnouncementSortField,
    pub sort_order: SortOrder,
    #[serde(deserialize_with = "optional_bool_param")]
    pub is_active: Option<bool>,
}

impl Default for AnnouncementQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            category: None,
            priority: None,
            search: None,
            sort_by: AnnouncementSortField::default(),
            sort_order: SortOrder::default(),
            is_active: None,
        }
    }
}

impl AnnouncementQuery {
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category: AnnouncementCategory,
    pub count: i64,
    pub urgent: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementStats {
    pub stats: Vec<CategoryStat>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementPage {
    pub announcements: Vec<Announcement>,
    pub pagination: super::PageMeta,
}
