use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{empty_string_as_none, SortOrder};

lazy_static! {
    /// Tanzanian mobile numbers: +255 or 0 prefix, 6/7 network code.
    pub static ref PHONE_RE: Regex = Regex::new(r"^(\+255|0)[67]\d{8}$").unwrap();
    /// Registration numbers like T24-03-16678 or E25-01-12345.
    pub static ref REG_NUMBER_RE: Regex = Regex::new(r"^[TE]\d{2}-\d{2}-\d{5}$").unwrap();
}

/// A registered member of the association. The password hash and reset-token
/// fields live only in the persistence layer and never leave it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub reg_number: String,
    pub role: Role,
    pub is_membership_active: bool,
    pub membership_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Self-service registration payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(regex(
        path = *PHONE_RE,
        message = "Please provide a valid Tanzanian phone number (e.g. +255712345678)"
    ))]
    pub phone: String,

    #[validate(regex(
        path = *REG_NUMBER_RE,
        message = "Invalid registration number. Must be like T24-03-16678 or E25-01-12345"
    ))]
    pub reg_number: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl RegisterRequest {
    /// Canonicalize before validating: emails are stored lowercase and
    /// registration numbers uppercase.
    pub fn normalize(&mut self) {
        self.full_name = self.full_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self.phone.trim().to_string();
        self.reg_number = self.reg_number.trim().to_uppercase();
    }
}

/// Admin-created member record; unlike [`RegisterRequest`] it may set a role.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    #[validate(regex(
        path = *PHONE_RE,
        message = "Please provide a valid Tanzanian phone number (e.g. +255712345678)"
    ))]
    pub phone: String,

    #[validate(regex(
        path = *REG_NUMBER_RE,
        message = "Invalid registration number. Must be like T24-03-16678 or E25-01-12345"
    ))]
    pub reg_number: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: Option<Role>,
}

impl CreateStudentRequest {
    pub fn normalize(&mut self) {
        self.full_name = self.full_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self.phone.trim().to_string();
        self.reg_number = self.reg_number.trim().to_uppercase();
    }
}

/// Partial update applied by admins through PATCH /students/:id.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: Option<String>,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    #[validate(regex(
        path = *PHONE_RE,
        message = "Please provide a valid Tanzanian phone number (e.g. +255712345678)"
    ))]
    pub phone: Option<String>,

    #[validate(regex(
        path = *REG_NUMBER_RE,
        message = "Invalid registration number. Must be like T24-03-16678 or E25-01-12345"
    ))]
    pub reg_number: Option<String>,

    pub role: Option<Role>,
    pub is_membership_active: Option<bool>,
    pub membership_expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MembershipFilter {
    Active,
    Expired,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StudentSortField {
    #[default]
    CreatedAt,
    FullName,
    RegNumber,
    Email,
    MembershipExpiry,
}

impl StudentSortField {
    pub fn as_column(&self) -> &'static str {
        match self {
            StudentSortField::CreatedAt => "created_at",
            StudentSortField::FullName => "full_name",
            StudentSortField::RegNumber => "reg_number",
            StudentSortField::Email => "email",
            StudentSortField::MembershipExpiry => "membership_expiry",
        }
    }
}

/// Explicit listing parameters with documented defaults; every field is
/// optional on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentQuery {
    pub page: i64,
    pub limit: i64,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
    #[serde(deserialize_with = "empty_string_as_none")]
    pub membership: Option<MembershipFilter>,
    pub sort_by: StudentSortField,
    pub sort_order: SortOrder,
}

impl Default for StudentQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            membership: None,
            sort_by: StudentSortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl StudentQuery {
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
pub struct StudentStats {
    pub total_students: i64,
    pub paid_this_year: i64,
}

/// A student plus their payment rows, as returned by detail endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: Student,
    pub payment_history: Vec<super::Payment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPageMeta {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_students: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentPage {
    pub students: Vec<Student>,
    pub pagination: StudentPageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_RE.is_match("+255712345678"));
        assert!(PHONE_RE.is_match("0612345678"));
        assert!(!PHONE_RE.is_match("+255812345678"));
        assert!(!PHONE_RE.is_match("071234567"));
    }

    #[test]
    fn test_reg_number_pattern() {
        assert!(REG_NUMBER_RE.is_match("T24-03-16678"));
        assert!(REG_NUMBER_RE.is_match("E25-01-12345"));
        assert!(!REG_NUMBER_RE.is_match("X24-03-16678"));
        assert!(!REG_NUMBER_RE.is_match("T24-03-1667"));
    }

    #[test]
    fn test_register_normalize() {
        let mut req = RegisterRequest {
            full_name: "  Jane Doe ".to_string(),
            email: "Jane@Example.COM".to_string(),
            phone: "+255712345678".to_string(),
            reg_number: "t24-03-16678".to_string(),
            password: "secret1".to_string(),
        };
        req.normalize();
        assert_eq!(req.email, "jane@example.com");
        assert_eq!(req.reg_number, "T24-03-16678");
        assert!(req.validate().is_ok());
    }
}
