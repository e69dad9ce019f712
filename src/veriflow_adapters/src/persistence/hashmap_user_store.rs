use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use veriflow_core::{Email, User, UserId, UserStore, UserStoreError};

#[derive(Default, Clone)]
pub struct HashMapUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl HashMapUserStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for HashMapUserStore {
    async fn save_user(&self, user: User) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        users.insert(user.id().clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserStoreError> {
        let users = self.users.read().await;
        users.get(id).cloned().ok_or(UserStoreError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<User, UserStoreError> {
        let users = self.users.read().await;
        users
            .values()
            .find(|user| user.email() == email)
            .cloned()
            .ok_or(UserStoreError::UserNotFound)
    }
}
