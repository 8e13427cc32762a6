use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    domain::{
        LogStatus, NewActivityLog, Payment, PaymentApprovalRequest, PaymentProvider,
        PaymentStatus, Student, MEMBERSHIP_FEE, PENDING_TTL_MINUTES,
    },
    error::{AppError, Result},
    mail::{templates, Mailer},
    repository::{ActivityLogRepository, PaymentRepository},
    service::{record_activity, RequestMeta},
};

pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    activity_logs: Arc<dyn ActivityLogRepository>,
    mailer: Arc<dyn Mailer>,
    admin_email: String,
}

impl PaymentService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        activity_logs: Arc<dyn ActivityLogRepository>,
        mailer: Arc<dyn Mailer>,
        admin_email: String,
    ) -> Self {
        Self {
            payments,
            activity_logs,
            mailer,
            admin_email,
        }
    }

    /// Records a manual membership-fee claim for later admin approval. There
    /// is no gateway verification; approval happens through the member-update
    /// endpoint.
    pub async fn request_approval(
        &self,
        student: &Student,
        request: PaymentApprovalRequest,
        meta: RequestMeta,
    ) -> Result<Payment> {
        // Writes are the only place the 15-minute claim window is enforced:
        // stale pending rows flip to cancelled before the duplicate check.
        let cancelled = self.payments.cancel_expired_for_user(student.id).await?;
        if cancelled > 0 {
            tracing::debug!(count = cancelled, "cancelled stale pending payment requests");
        }

        if self.payments.find_live_pending(student.id).await?.is_some() {
            return Err(AppError::BadRequest(
                "You already have a pending request. Please wait for Admin approval.".to_string(),
            ));
        }

        let now = Utc::now();
        let now_ms = now.timestamp_millis();
        let transaction_id = request
            .transaction_id
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("MANUAL_{}", now_ms));

        let payment = self
            .payments
            .create(Payment {
                id: Uuid::new_v4(),
                user_id: student.id,
                amount: MEMBERSHIP_FEE,
                currency: "TZS".to_string(),
                phone: request.phone_used.clone(),
                provider: PaymentProvider::Manual,
                transaction_id: Some(transaction_id),
                reference: format!("REQ_{}", now_ms),
                status: PaymentStatus::Pending,
                completed_at: None,
                expires_at: now + Duration::minutes(PENDING_TTL_MINUTES),
                created_at: now,
                updated_at: now,
            })
            .await?;

        let html = templates::payment_request_received(&student.full_name, &request.phone_used);
        self.mailer
            .send(&student.email, "UDASS Membership Request Received", &html)
            .await?;

        let html = templates::admin_payment_notification(
            &student.full_name,
            &student.reg_number,
            &request.phone_used,
            payment.transaction_id.as_deref().unwrap_or("N/A"),
        );
        self.mailer
            .send(&self.admin_email, "Action Required: New Payment", &html)
            .await?;

        record_activity(
            &self.activity_logs,
            NewActivityLog {
                user_id: Some(student.id),
                action: "PAYMENT_REQUEST".to_string(),
                description: Some("Requested manual membership approval".to_string()),
                status: LogStatus::Success,
                ip: meta.ip,
                user_agent: meta.user_agent,
            },
        )
        .await;

        Ok(payment)
    }

    pub async fn history(&self, user_id: Uuid) -> Result<Vec<Payment>> {
        self.payments.list_by_user(user_id).await
    }
}
