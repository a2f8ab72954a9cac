use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

#[derive(Debug, Default)]
pub struct MemoryUserRepo {
    by_email: DashMap<String, UserRecord>,
    ids: DashSet<UserId>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(
        &self,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        match self.by_email.entry(email.to_owned()) {
            Entry::Occupied(_) => Err(AuthError::UserExists),
            Entry::Vacant(vacant) => {
                vacant.insert(UserRecord {
                    user_id,
                    email: email.to_owned(),
                    password_hash: password_hash.to_owned(),
                    created_at: Utc::now(),
                });
                self.ids.insert(user_id);
                Ok(())
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.by_email.get(email).map(|r| r.value().clone()))
    }

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.ids.contains(&user_id))
    }
}
