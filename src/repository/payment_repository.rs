use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Payment, PaymentProvider, PaymentStatus},
    error::{AppError, Result},
    repository::PaymentRepository,
};

const COLUMNS: &str = "id, user_id, amount, currency, phone, provider, transaction_id, \
                       reference, status, completed_at, expires_at, created_at, updated_at";

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    user_id: String,
    amount: i64,
    currency: String,
    phone: String,
    provider: String,
    transaction_id: Option<String>,
    reference: String,
    status: String,
    completed_at: Option<NaiveDateTime>,
    expires_at: NaiveDateTime,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            amount: row.amount,
            currency: row.currency,
            phone: row.phone,
            provider: PaymentProvider::parse(&row.provider).ok_or_else(|| {
                AppError::Database(format!("Invalid payment provider: {}", row.provider))
            })?,
            transaction_id: row.transaction_id,
            reference: row.reference,
            status: PaymentStatus::parse(&row.status).ok_or_else(|| {
                AppError::Database(format!("Invalid payment status: {}", row.status))
            })?,
            completed_at: row
                .completed_at
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            expires_at: DateTime::from_naive_utc_and_offset(row.expires_at, Utc),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, payment: Payment) -> Result<Payment> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, amount, currency, phone, provider, transaction_id,
                reference, status, completed_at, expires_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(payment.user_id.to_string())
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.phone)
        .bind(payment.provider.as_str())
        .bind(&payment.transaction_id)
        .bind(&payment.reference)
        .bind(payment.status.as_str())
        .bind(payment.completed_at.map(|dt| dt.naive_utc()))
        .bind(payment.expires_at.naive_utc())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(payment.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created payment".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE user_id = ? ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn find_live_pending(&self, user_id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {} FROM payments WHERE user_id = ? AND status = 'pending' AND expires_at > ? LIMIT 1",
            COLUMNS
        ))
        .bind(user_id.to_string())
        .bind(Utc::now().naive_utc())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn cancel_expired_for_user(&self, user_id: Uuid) -> Result<u64> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'cancelled', updated_at = ?
            WHERE user_id = ? AND status = 'pending' AND expires_at <= ?
            "#,
        )
        .bind(now)
        .bind(user_id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn update_status(&self, id: Uuid, status: PaymentStatus) -> Result<Payment> {
        let now = Utc::now().naive_utc();
        let completed_at = if status == PaymentStatus::Completed {
            Some(now)
        } else {
            None
        };

        sqlx::query(
            r#"
            UPDATE payments
            SET status = ?,
                completed_at = COALESCE(?, completed_at),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(completed_at)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::NotFound("Payment not found".to_string())
        })
    }
}
