use super::{
    models::{File, User},
    DocumentStore, DocumentStoreError, SessionStore, SessionStoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// In-process session store. Entries expire lazily: an expired token is
/// removed the next time it is looked up.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, (Uuid, DateTime<Utc>)>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn is_alive(&self) -> bool {
        true
    }

    async fn put(
        &self,
        token: &str,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<(), SessionStoreError> {
        let expires_at = Utc::now() + ttl;
        self.sessions
            .write()
            .insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Uuid>, SessionStoreError> {
        let expired = {
            let sessions = self.sessions.read();
            match sessions.get(token) {
                Some((user_id, expires_at)) if Utc::now() < *expires_at => {
                    return Ok(Some(*user_id));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.sessions.write().remove(token);
        }

        Ok(None)
    }

    async fn delete(&self, token: &str) -> Result<Option<Uuid>, SessionStoreError> {
        let removed = self.sessions.write().remove(token);

        Ok(removed.and_then(|(user_id, expires_at)| {
            if Utc::now() < expires_at {
                Some(user_id)
            } else {
                None
            }
        }))
    }
}

#[derive(Default)]
struct Documents {
    users: Vec<User>,
    files: Vec<File>,
    file_index: HashMap<Uuid, usize>,
}

/// In-process document store. Records are kept in insertion order so that
/// offset pagination is deterministic.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<Documents>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn is_alive(&self) -> bool {
        true
    }

    async fn insert_user(&self, user: User) -> Result<(), DocumentStoreError> {
        self.documents.write().users.push(user);
        Ok(())
    }

    async fn user_by_id(&self, user_id: Uuid) -> Result<Option<User>, DocumentStoreError> {
        let documents = self.documents.read();
        let user = documents.users.iter().find(|user| user.id == user_id);
        Ok(user.cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, DocumentStoreError> {
        let documents = self.documents.read();
        let user = documents.users.iter().find(|user| user.email == email);
        Ok(user.cloned())
    }

    async fn count_users(&self) -> Result<u64, DocumentStoreError> {
        Ok(self.documents.read().users.len() as u64)
    }

    async fn insert_file(&self, file: File) -> Result<(), DocumentStoreError> {
        let mut documents = self.documents.write();
        let index = documents.files.len();
        documents.file_index.insert(file.id, index);
        documents.files.push(file);
        Ok(())
    }

    async fn file_by_id(&self, file_id: Uuid) -> Result<Option<File>, DocumentStoreError> {
        let documents = self.documents.read();
        let file = documents
            .file_index
            .get(&file_id)
            .map(|&index| documents.files[index].clone());
        Ok(file)
    }

    async fn files_by_parent(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<File>, DocumentStoreError> {
        let documents = self.documents.read();
        let files = documents
            .files
            .iter()
            .filter(|file| file.owner_id == owner_id && file.parent_id == parent_id)
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();
        Ok(files)
    }

    async fn set_file_visibility(
        &self,
        file_id: Uuid,
        is_public: bool,
    ) -> Result<Option<File>, DocumentStoreError> {
        let mut documents = self.documents.write();
        let index = match documents.file_index.get(&file_id) {
            Some(&index) => index,
            None => return Ok(None),
        };

        documents.files[index].is_public = is_public;
        Ok(Some(documents.files[index].clone()))
    }

    async fn count_files(&self) -> Result<u64, DocumentStoreError> {
        Ok(self.documents.read().files.len() as u64)
    }
}
