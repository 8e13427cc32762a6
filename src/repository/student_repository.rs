use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{MembershipFilter, Role, Student, StudentQuery, StudentStats, UpdateStudentRequest},
    error::{AppError, Result},
    repository::{like_pattern, NewStudent, ResetTokenMatch, StudentRepository},
};

const COLUMNS: &str = "id, full_name, email, phone, reg_number, role, is_membership_active, \
                       membership_expiry, created_at, updated_at";

// Database row struct that matches the SQLite schema
#[derive(FromRow)]
struct StudentRow {
    id: String,
    full_name: String,
    email: String,
    phone: String,
    reg_number: String,
    role: String,
    is_membership_active: i32,
    membership_expiry: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteStudentRepository {
    pool: SqlitePool,
}

impl SqliteStudentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_student(row: StudentRow) -> Result<Student> {
        Ok(Student {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            reg_number: row.reg_number,
            role: Role::parse(&row.role)
                .ok_or_else(|| AppError::Database(format!("Invalid role: {}", row.role)))?,
            is_membership_active: row.is_membership_active != 0,
            membership_expiry: row
                .membership_expiry
                .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &StudentQuery) {
        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            qb.push(" AND (full_name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR reg_number LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" ESCAPE '\\' OR email LIKE ");
            qb.push_bind(pattern);
            qb.push(" ESCAPE '\\')");
        }
        match query.membership {
            Some(MembershipFilter::Active) => {
                qb.push(" AND is_membership_active = 1");
            }
            Some(MembershipFilter::Expired) => {
                qb.push(" AND is_membership_active = 0");
            }
            None => {}
        }
    }
}

#[async_trait]
impl StudentRepository for SqliteStudentRepository {
    async fn create(&self, record: NewStudent) -> Result<Student> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO students (
                id, full_name, email, phone, reg_number, password_hash,
                role, is_membership_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(&record.full_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.reg_number)
        .bind(&record.password_hash)
        .bind(record.role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created student".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students WHERE id = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_student(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students WHERE email = ?",
            COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_student(r)?)),
            None => Ok(None),
        }
    }

    async fn find_duplicate(
        &self,
        email: &str,
        phone: &str,
        reg_number: &str,
    ) -> Result<Option<Student>> {
        let row = sqlx::query_as::<_, StudentRow>(&format!(
            "SELECT {} FROM students WHERE email = ? OR phone = ? OR reg_number = ? LIMIT 1",
            COLUMNS
        ))
        .bind(email)
        .bind(phone)
        .bind(reg_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_student(r)?)),
            None => Ok(None),
        }
    }

    async fn password_hash_by_email(&self, email: &str) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM students WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }

    async fn list(&self, query: &StudentQuery) -> Result<Vec<Student>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM students WHERE 1=1",
            COLUMNS
        ));
        Self::push_filters(&mut qb, query);
        qb.push(format!(
            " ORDER BY {} {}",
            query.sort_by.as_column(),
            query.sort_order.as_sql()
        ));
        qb.push(" LIMIT ");
        qb.push_bind(query.limit());
        qb.push(" OFFSET ");
        qb.push_bind(query.offset());

        let rows = qb
            .build_query_as::<StudentRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_student).collect()
    }

    async fn count(&self, query: &StudentQuery) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM students WHERE 1=1");
        Self::push_filters(&mut qb, query);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn update(&self, id: Uuid, update: UpdateStudentRequest) -> Result<Student> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        let now = Utc::now().naive_utc();
        let role_str = update.role.map(|r| r.as_str());
        let active_int = update.is_membership_active.map(|b| if b { 1i32 } else { 0i32 });
        let expiry_naive = update.membership_expiry.map(|dt| dt.naive_utc());

        sqlx::query(
            r#"
            UPDATE students
            SET full_name = COALESCE(?, full_name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                reg_number = COALESCE(?, reg_number),
                role = COALESCE(?, role),
                is_membership_active = COALESCE(?, is_membership_active),
                membership_expiry = COALESCE(?, membership_expiry),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.reg_number)
        .bind(role_str)
        .bind(active_int)
        .bind(expiry_naive)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated student".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM students WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE students
            SET password_reset_token = ?,
                password_reset_expires_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(token_hash)
        .bind(expires_at.naive_utc())
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_reset_token(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE students
            SET password_reset_token = NULL,
                password_reset_expires_at = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> Result<Option<ResetTokenMatch>> {
        let row = sqlx::query_as::<_, (String, Option<NaiveDateTime>)>(
            "SELECT id, password_reset_expires_at FROM students WHERE password_reset_token = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, expires_at)) = row else {
            return Ok(None);
        };

        let id = Uuid::parse_str(&id).map_err(|e| AppError::Database(e.to_string()))?;
        let student = self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Reset token references a missing student".to_string())
        })?;

        Ok(Some(ResetTokenMatch {
            student,
            expires_at: expires_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        }))
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE students
            SET password_hash = ?,
                password_reset_token = NULL,
                password_reset_expires_at = NULL,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn stats(&self) -> Result<StudentStats> {
        let total_students = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;

        let paid_this_year = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM students WHERE is_membership_active = 1 AND membership_expiry >= ?",
        )
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;

        Ok(StudentStats {
            total_students,
            paid_this_year,
        })
    }
}
