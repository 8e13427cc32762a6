use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{
    auth::{self, JwtConfig},
    domain::{LogStatus, NewActivityLog, RegisterRequest, Role, Student},
    error::{AppError, Result},
    mail::{templates, Mailer},
    repository::{ActivityLogRepository, NewStudent, StudentRepository},
    service::{record_activity, RequestMeta},
};

/// Password-reset links stay valid for one hour.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

pub struct AuthService {
    students: Arc<dyn StudentRepository>,
    activity_logs: Arc<dyn ActivityLogRepository>,
    mailer: Arc<dyn Mailer>,
    jwt: Arc<JwtConfig>,
    client_url: String,
}

impl AuthService {
    pub fn new(
        students: Arc<dyn StudentRepository>,
        activity_logs: Arc<dyn ActivityLogRepository>,
        mailer: Arc<dyn Mailer>,
        jwt: Arc<JwtConfig>,
        client_url: String,
    ) -> Self {
        Self {
            students,
            activity_logs,
            mailer,
            jwt,
            client_url,
        }
    }

    pub async fn register(&self, request: RegisterRequest, meta: RequestMeta) -> Result<Student> {
        // One combined probe across the three unique fields, then name the
        // specific offender.
        if let Some(existing) = self
            .students
            .find_duplicate(&request.email, &request.phone, &request.reg_number)
            .await?
        {
            if existing.email == request.email {
                return Err(AppError::BadRequest("Email already in use".to_string()));
            }
            if existing.phone == request.phone {
                return Err(AppError::BadRequest("Phone number already in use".to_string()));
            }
            return Err(AppError::BadRequest(
                "Registration number already exists".to_string(),
            ));
        }

        let password_hash = auth::hash_password(&request.password)?;
        let RegisterRequest {
            full_name,
            email,
            phone,
            reg_number,
            ..
        } = request;

        let student = self
            .students
            .create(NewStudent {
                full_name,
                email,
                phone,
                reg_number,
                password_hash,
                role: Role::Student,
            })
            .await?;

        record_activity(
            &self.activity_logs,
            NewActivityLog {
                user_id: Some(student.id),
                action: "REGISTER".to_string(),
                description: Some(format!("{} registered", student.reg_number)),
                status: LogStatus::Success,
                ip: meta.ip,
                user_agent: meta.user_agent,
            },
        )
        .await;

        Ok(student)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(Student, String)> {
        let student = self
            .students
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        let hash = self
            .students
            .password_hash_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        if !auth::verify_password(password, &hash)? {
            return Err(AppError::Unauthorized(
                "Incorrect email or password".to_string(),
            ));
        }

        let token = self.jwt.issue(student.id)?;

        Ok((student, token))
    }

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let student = self
            .students
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found with that email".to_string()))?;

        let token = auth::generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.students
            .set_reset_token(student.id, &token.hashed, expires_at)
            .await?;

        let reset_url = format!("{}/reset-password/{}", self.client_url, token.raw);
        let html = templates::password_reset(&student.full_name, &reset_url);

        if let Err(e) = self.mailer.send(&student.email, "Reset Password", &html).await {
            // The link never reached the user; leave no live token behind.
            let _ = self.students.clear_reset_token(student.id).await;
            return Err(e);
        }

        Ok(())
    }

    pub async fn reset_password(&self, raw_token: &str, new_password: &str) -> Result<()> {
        let token_hash = auth::hash_reset_token(raw_token);
        let matched = self
            .students
            .find_by_reset_token(&token_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        let expired = matched
            .expires_at
            .map(|at| at < Utc::now())
            .unwrap_or(true);
        if expired {
            self.students.clear_reset_token(matched.student.id).await?;
            return Err(AppError::BadRequest("Reset token has expired".to_string()));
        }

        let password_hash = auth::hash_password(new_password)?;
        self.students
            .set_password(matched.student.id, &password_hash)
            .await?;

        Ok(())
    }
}
