use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::EmailObject;

#[derive(Clone, PartialEq, Eq)]
pub struct SubmittedDocument {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SubmittedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmittedDocument")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: Uuid,
    pub document: SubmittedDocument,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("A document is already registered for {0}")]
    AlreadyRegistered(EmailObject),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// Registration backend for the protected action.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(
        &self,
        email: &EmailObject,
        document: SubmittedDocument,
    ) -> Result<Uuid, DocumentStoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<EmailObject, StoredDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, email: &EmailObject) -> Option<StoredDocument> {
        self.documents.read().await.get(email).cloned()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    #[tracing::instrument(name = "Store document", skip(self))]
    async fn store(
        &self,
        email: &EmailObject,
        document: SubmittedDocument,
    ) -> Result<Uuid, DocumentStoreError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(email) {
            return Err(DocumentStoreError::AlreadyRegistered(email.clone()));
        }
        let id = Uuid::new_v4();
        documents.insert(
            email.clone(),
            StoredDocument {
                id,
                document,
                stored_at: Utc::now(),
            },
        );
        Ok(id)
    }
}
