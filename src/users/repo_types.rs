use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Row of the `users` table.
///
/// `id` is internal and never leaves the service; `user_id` is what clients
/// and token subjects see. `password` holds the Argon2 PHC string.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
    pub successful_login_attempts: i64,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Everything `insert` needs; the store assigns `id`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
    pub created_at: OffsetDateTime,
}
