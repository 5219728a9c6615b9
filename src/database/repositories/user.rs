//! User repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::database::connection::is_unique_violation;
use crate::models::user::{User, CreateUserRequest};
use crate::utils::errors::EventifyError;

const USER_COLUMNS: &str = "id, display_name, email, role, student_id, session, department, phone, bio, avatar_url, profile_complete, password_hash, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    ///
    /// The email is unique case-insensitively; a clash maps to
    /// `DuplicateAccount` and nothing is written.
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, EventifyError> {
        let now = Utc::now();
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, display_name, email, role, student_id, session, phone, profile_complete, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&request.display_name)
        .bind(&request.email)
        .bind(request.role.as_str())
        .bind(&request.student_id)
        .bind(&request.session)
        .bind(&request.phone)
        .bind(request.profile_complete)
        .bind(&request.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(EventifyError::DuplicateAccount {
                email: request.email,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, EventifyError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find user by email, ignoring case
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, EventifyError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Write back all editable profile fields of `user`
    pub async fn update_profile(&self, user: &User) -> Result<User, EventifyError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET display_name = $2,
                student_id = $3,
                session = $4,
                department = $5,
                phone = $6,
                bio = $7,
                avatar_url = $8,
                profile_complete = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.display_name)
        .bind(&user.student_id)
        .bind(&user.session)
        .bind(&user.department)
        .bind(&user.phone)
        .bind(&user.bio)
        .bind(&user.avatar_url)
        .bind(user.profile_complete)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EventifyError::UserNotFound { user_id: user.id })?;

        Ok(updated)
    }

    /// Replace the stored password hash
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), EventifyError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EventifyError::UserNotFound { user_id: id });
        }

        Ok(())
    }

    /// Delete a user and release every seat they held
    ///
    /// Registration and attendee rows cascade with the user row; the
    /// counters of the affected events are decremented in the same
    /// transaction.
    pub async fn delete(&self, id: Uuid) -> Result<u64, EventifyError> {
        let mut tx = self.pool.begin().await?;

        let released = sqlx::query(
            r#"
            UPDATE events
            SET attendee_count = GREATEST(attendee_count - 1, 0), updated_at = NOW()
            WHERE id IN (SELECT event_id FROM registrations WHERE user_id = $1)
            "#
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(EventifyError::UserNotFound { user_id: id });
        }

        tx.commit().await?;
        Ok(released)
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, EventifyError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
