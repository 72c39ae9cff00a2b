//! In-process `UserStore` used by the handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo::{StoreError, StoreResult, UserStore};
use crate::users::repo_types::{NewUser, User};

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.rows.lock().expect("store lock").len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut rows = self.rows.lock().expect("store lock");
        if rows.iter().any(|u| u.phone_number == user.phone_number) {
            return Err(StoreError::PhoneTaken);
        }
        let row = User {
            id: rows.len() as i64 + 1,
            user_id: user.user_id,
            full_name: user.full_name,
            phone_number: user.phone_number,
            password: user.password,
            successful_login_attempts: 0,
            last_login: None,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_phone(&self, phone: &str) -> StoreResult<Option<User>> {
        let rows = self.rows.lock().expect("store lock");
        Ok(rows.iter().find(|u| u.phone_number == phone).cloned())
    }

    async fn find_by_external_id(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let rows = self.rows.lock().expect("store lock");
        Ok(rows.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn count_by_phone(&self, phone: &str) -> StoreResult<i64> {
        let rows = self.rows.lock().expect("store lock");
        Ok(rows.iter().filter(|u| u.phone_number == phone).count() as i64)
    }

    async fn update_login_stats(
        &self,
        id: i64,
        attempts: i64,
        last_login: OffsetDateTime,
    ) -> StoreResult<()> {
        let mut rows = self.rows.lock().expect("store lock");
        if let Some(u) = rows.iter_mut().find(|u| u.id == id) {
            u.successful_login_attempts = attempts;
            u.last_login = Some(last_login);
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn update_profile(&self, id: i64, full_name: &str, phone: &str) -> StoreResult<()> {
        let mut rows = self.rows.lock().expect("store lock");
        if rows.iter().any(|u| u.id != id && u.phone_number == phone) {
            return Err(StoreError::PhoneTaken);
        }
        if let Some(u) = rows.iter_mut().find(|u| u.id == id) {
            u.full_name = full_name.to_string();
            u.phone_number = phone.to_string();
            u.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }
}
