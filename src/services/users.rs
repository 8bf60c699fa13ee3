//! User management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{NewUser, UpdateUser, User},
    repository::CatalogStore,
};

#[derive(Clone)]
pub struct UsersService {
    store: Arc<dyn CatalogStore>,
}

impl UsersService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.store.get_user(id).await
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        self.store.list_users().await
    }

    pub async fn create_user(&self, user: NewUser) -> AppResult<User> {
        user.validate()?;
        let created = self.store.insert_user(&user).await?;
        tracing::info!(id = created.id, "User created");
        Ok(created)
    }

    pub async fn update_user(&self, id: i32, user: UpdateUser) -> AppResult<User> {
        user.validate()?;
        self.store.update_user(id, &user).await
    }

    /// Delete a user. Their lend records are kept.
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.store.delete_user(id).await?;
        tracing::info!(id, "User deleted");
        Ok(())
    }
}
