use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth,
    domain::{
        CreateStudentRequest, LogStatus, NewActivityLog, Role, Student, StudentDetail,
        StudentPage, StudentPageMeta, StudentQuery, StudentStats, UpdateStudentRequest,
    },
    error::{AppError, Result},
    mail::{templates, Mailer},
    repository::{ActivityLogRepository, NewStudent, PaymentRepository, StudentRepository},
    service::{record_activity, RequestMeta},
};

pub struct StudentService {
    students: Arc<dyn StudentRepository>,
    payments: Arc<dyn PaymentRepository>,
    activity_logs: Arc<dyn ActivityLogRepository>,
    mailer: Arc<dyn Mailer>,
    client_url: String,
}

impl StudentService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        payments: Arc<dyn PaymentRepository>,
        activity_logs: Arc<dyn ActivityLogRepository>,
        mailer: Arc<dyn Mailer>,
        client_url: String,
    ) -> Self {
        Self {
            students,
            payments,
            activity_logs,
            mailer,
            client_url,
        }
    }

    /// Admin-created record. Uniqueness is left to the database's unique
    /// indexes; a violation surfaces as a 400 naming the field.
    pub async fn create(&self, request: CreateStudentRequest) -> Result<Student> {
        let password_hash = auth::hash_password(&request.password)?;
        let CreateStudentRequest {
            full_name,
            email,
            phone,
            reg_number,
            role,
            ..
        } = request;

        self.students
            .create(NewStudent {
                full_name,
                email,
                phone,
                reg_number,
                password_hash,
                role: role.unwrap_or(Role::Student),
            })
            .await
    }

    pub async fn list(&self, query: &StudentQuery) -> Result<StudentPage> {
        let (students, total) =
            tokio::try_join!(self.students.list(query), self.students.count(query))?;

        let limit = query.limit();
        let page = query.page();
        Ok(StudentPage {
            students,
            pagination: StudentPageMeta {
                current_page: page,
                total_pages: (total + limit - 1) / limit,
                total_students: total,
                has_next: page * limit < total,
                has_prev: page > 1,
            },
        })
    }

    pub async fn get_with_history(&self, id: Uuid) -> Result<StudentDetail> {
        let student = self
            .students
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        let payment_history = self.payments.list_by_user(id).await?;

        Ok(StudentDetail {
            student,
            payment_history,
        })
    }

    /// Partial update. A false→true flip of `isMembershipActive` is the
    /// manual payment-approval step and triggers exactly one activation
    /// email; any other transition sends nothing.
    pub async fn update(
        &self,
        id: Uuid,
        mut update: UpdateStudentRequest,
        meta: RequestMeta,
    ) -> Result<Student> {
        if let Some(email) = update.email.take() {
            update.email = Some(email.trim().to_lowercase());
        }
        if let Some(reg_number) = update.reg_number.take() {
            update.reg_number = Some(reg_number.trim().to_uppercase());
        }

        let old = self
            .students
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        let updated = self.students.update(id, update).await?;

        if !old.is_membership_active && updated.is_membership_active {
            let dashboard_url = format!("{}/dashboard", self.client_url);
            let html = templates::membership_activated(&updated.full_name, &dashboard_url);
            self.mailer
                .send(&updated.email, "Welcome to UDASS - Account Activated", &html)
                .await?;

            record_activity(
                &self.activity_logs,
                NewActivityLog {
                    user_id: Some(updated.id),
                    action: "MEMBER_ACTIVATED".to_string(),
                    description: Some(format!("Membership activated for {}", updated.reg_number)),
                    status: LogStatus::Success,
                    ip: meta.ip,
                    user_agent: meta.user_agent,
                },
            )
            .await;
        }

        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.students.delete(id).await? {
            return Err(AppError::NotFound("Student not found".to_string()));
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<StudentStats> {
        self.students.stats().await
    }
}
