use crate::user::model::{UpdateOutcome, User};
use crate::user::repository::{ensure_mutable, StoreResult, UserRepository};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local document store
///
/// Keeps the same schemaless documents as the PostgreSQL store, in insertion
/// order. Used by tests and by local runs with `ACCOUNTS_STORE=memory`.
#[derive(Default)]
pub struct InMemoryUserRepository {
    documents: RwLock<Vec<(Uuid, Value)>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> StoreResult<Uuid> {
        self.documents
            .write()
            .await
            .push((user.id, user.to_document()));
        Ok(user.id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|(_, document)| document.get("userEmail").and_then(Value::as_str) == Some(email))
            .map(|(id, document)| User::from_document(*id, document.clone()))
            .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|(stored_id, _)| *stored_id == id)
            .map(|(id, document)| User::from_document(*id, document.clone()))
            .transpose()
    }

    async fn list_all(&self) -> StoreResult<Vec<User>> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .map(|(id, document)| User::from_document(*id, document.clone()))
            .collect()
    }

    async fn update_field(&self, id: Uuid, key: &str, value: &str) -> StoreResult<UpdateOutcome> {
        ensure_mutable(key)?;

        let mut documents = self.documents.write().await;
        let Some((_, document)) = documents.iter_mut().find(|(stored_id, _)| *stored_id == id)
        else {
            return Ok(UpdateOutcome::default());
        };

        let new_value = Value::String(value.to_string());
        let modified = document.get(key) != Some(&new_value);
        if modified {
            if let Value::Object(fields) = document {
                fields.insert(key.to_string(), new_value);
            }
        }

        Ok(UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_by_id(&self, id: Uuid) -> StoreResult<u64> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|(stored_id, _)| *stored_id != id);
        Ok((before - documents.len()) as u64)
    }
}
