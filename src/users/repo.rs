use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User};

/// Name of the UNIQUE constraint on `users.phone_number`.
pub const PHONE_UNIQUE_CONSTRAINT: &str = "users_phone_number_key";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("phone number already exists")]
    PhoneTaken,

    #[error("user store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> StoreResult<User>;
    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>>;
    async fn find_by_external_id(&self, user_id: Uuid) -> StoreResult<Option<User>>;
    async fn count_by_phone(&self, phone: &str) -> StoreResult<i64>;
    async fn update_login_stats(
        &self,
        id: i64,
        attempts: i64,
        last_login: OffsetDateTime,
    ) -> StoreResult<()>;
    async fn update_profile(&self, id: i64, full_name: &str, phone: &str) -> StoreResult<()>;
}

/// Logs the driver error and folds it into the store taxonomy.
fn store_error(op: &'static str, e: sqlx::Error) -> StoreError {
    let phone_taken = e
        .as_database_error()
        .map(|db| db.is_unique_violation() && db.constraint() == Some(PHONE_UNIQUE_CONSTRAINT))
        .unwrap_or(false);
    if phone_taken {
        return StoreError::PhoneTaken;
    }
    error!(error = %e, op, "user store query failed");
    StoreError::Unavailable(e)
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, full_name, phone_number, password,
                               successful_login_attempts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, $5, $5)
            RETURNING id, user_id, full_name, phone_number, password,
                      successful_login_attempts, last_login, created_at, updated_at
            "#,
        )
        .bind(user.user_id)
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(&user.password)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_error("insert", e))
    }

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_id, full_name, phone_number, password,
                   successful_login_attempts, last_login, created_at, updated_at
            FROM users
            WHERE phone_number = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_by_phone", e))
    }

    async fn find_by_external_id(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, user_id, full_name, phone_number, password,
                   successful_login_attempts, last_login, created_at, updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error("find_by_external_id", e))
    }

    async fn count_by_phone(&self, phone: &str) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT count(id) FROM users WHERE phone_number = $1")
            .bind(phone)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error("count_by_phone", e))
    }

    async fn update_login_stats(
        &self,
        id: i64,
        attempts: i64,
        last_login: OffsetDateTime,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET successful_login_attempts = $1, last_login = $2, updated_at = now()
             WHERE id = $3
            "#,
        )
        .bind(attempts)
        .bind(last_login)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("update_login_stats", e))?;
        Ok(())
    }

    async fn update_profile(&self, id: i64, full_name: &str, phone: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET full_name = $1, phone_number = $2, updated_at = now()
             WHERE id = $3
            "#,
        )
        .bind(full_name)
        .bind(phone)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| store_error("update_profile", e))?;
        Ok(())
    }
}
