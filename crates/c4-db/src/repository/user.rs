//! # User Repository
//!
//! Users are created lazily the first time an email is seen. Creating again
//! with the same email (any casing) returns the stored row untouched.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use c4_core::validation::{validate_email, validate_required};
use c4_core::{NewUser, User};

const USER_COLUMNS: &str = "id, full_name, email, phone, company, created_at, updated_at";

/// Repository for the user directory.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Registers a user, or returns the existing user with that email.
    ///
    /// The email is trimmed and lower-cased before lookup and storage.
    /// Two concurrent registrations of one email both end up with the same
    /// row: the loser of the insert race reads the winner's.
    pub async fn create_or_get(&self, user: &NewUser) -> DbResult<User> {
        let email = validate_email(&user.email)?;
        let full_name = validate_required("fullName", Some(&user.full_name))?;

        if let Some(existing) = self.find_by_email(&email).await? {
            return Ok(existing);
        }

        debug!(email = %email, "Registering user");

        let now = Utc::now();
        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (full_name, email, phone, company, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&full_name)
        .bind(&email)
        .bind(user.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()))
        .bind(user.company.as_deref().map(str::trim).filter(|c| !c.is_empty()))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(user) => Ok(user),
            None => self
                .find_by_email(&email)
                .await?
                .ok_or_else(|| DbError::not_found("User", &email)),
        }
    }

    /// Looks a user up by (already normalized) email.
    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Gets a user by id.
    pub async fn get(&self, id: i64) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// All users, newest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            full_name: name.to_string(),
            email: email.to_string(),
            phone: Some("012 345 678".to_string()),
            company: None,
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_email() {
        let db = test_db().await;
        let user = db.users().create_or_get(&new_user(" Ana Lee ", " Ana@Example.com")).await.unwrap();

        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.full_name, "Ana Lee");
        assert_eq!(db.users().get(user.id).await.unwrap().email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_repeat_returns_existing_unchanged() {
        let db = test_db().await;
        let first = db.users().create_or_get(&new_user("Ana", "ana@example.com")).await.unwrap();
        let second = db
            .users()
            .create_or_get(&new_user("Someone Else", "ANA@EXAMPLE.COM"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.full_name, "Ana");
        assert_eq!(db.users().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_requires_email_and_name() {
        let db = test_db().await;
        assert!(matches!(
            db.users().create_or_get(&new_user("Ana", "")).await,
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            db.users().create_or_get(&new_user("  ", "a@b.co")).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = test_db().await;
        assert!(matches!(db.users().get(1).await, Err(DbError::NotFound { .. })));
    }
}
