use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::student::PHONE_RE;

/// Membership fee in whole TZS.
pub const MEMBERSHIP_FEE: i64 = 2000;
/// How long a pending request stays claimable before it is auto-cancelled.
pub const PENDING_TTL_MINUTES: i64 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub currency: String,
    pub phone: String,
    pub provider: PaymentProvider,
    pub transaction_id: Option<String>,
    pub reference: String,
    pub status: PaymentStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// A pending payment past its claim window counts as expired even before
    /// the cancelling write lands.
    pub fn is_expired(&self) -> bool {
        self.status == PaymentStatus::Pending && Utc::now() > self.expires_at
    }

    /// Time from creation to completion, when completed.
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at.map(|done| done - self.created_at)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Initiated,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Initiated => "initiated",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "initiated" => Some(PaymentStatus::Initiated),
            "processing" => Some(PaymentStatus::Processing),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Mpesa,
    TigoPesa,
    AirtelMoney,
    HaloPesa,
    Manual,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Mpesa => "mpesa",
            PaymentProvider::TigoPesa => "tigopesa",
            PaymentProvider::AirtelMoney => "airtelmoney",
            PaymentProvider::HaloPesa => "halopesa",
            PaymentProvider::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mpesa" => Some(PaymentProvider::Mpesa),
            "tigopesa" => Some(PaymentProvider::TigoPesa),
            "airtelmoney" => Some(PaymentProvider::AirtelMoney),
            "halopesa" => Some(PaymentProvider::HaloPesa),
            "manual" => Some(PaymentProvider::Manual),
            _ => None,
        }
    }
}

/// Member-submitted claim that a membership fee was paid by mobile money.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentApprovalRequest {
    #[validate(regex(
        path = *PHONE_RE,
        message = "Please provide a valid Tanzanian phone number (e.g. +255712345678)"
    ))]
    pub phone_used: String,
    pub transaction_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired_only_for_stale_pending() {
        let base = Payment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount: MEMBERSHIP_FEE,
            currency: "TZS".to_string(),
            phone: "+255712345678".to_string(),
            provider: PaymentProvider::Manual,
            transaction_id: None,
            reference: "REQ_1".to_string(),
            status: PaymentStatus::Pending,
            completed_at: None,
            expires_at: Utc::now() - Duration::minutes(1),
            created_at: Utc::now() - Duration::minutes(20),
            updated_at: Utc::now() - Duration::minutes(20),
        };
        assert!(base.is_expired());

        let live = Payment {
            expires_at: Utc::now() + Duration::minutes(10),
            ..base.clone()
        };
        assert!(!live.is_expired());

        let completed = Payment {
            status: PaymentStatus::Completed,
            ..base
        };
        assert!(!completed.is_expired());
    }
}
