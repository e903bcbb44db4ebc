//! In-memory document store for tests and ephemeral embedding.
//!
//! Implements the same seams as the redb-backed [`super::Storage`], plus a
//! few inspection hooks: a write counter, injectable save failures, and raw
//! record access for staging exact store states.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::auth::credentials;
use crate::error::{Error, Result};
use crate::models::{Diagram, Edge, Node, Role, User};
use crate::storage::{DiagramStore, UserDirectory};

#[derive(Default)]
pub struct MemoryStore {
    diagrams: Mutex<HashMap<String, Diagram>>,
    users: Mutex<HashMap<String, (User, String)>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of content writes accepted so far (create and share excluded).
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent `save_diagram` fail, for exercising the
    /// save-error path.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Write a record directly, bypassing ownership checks and counters.
    /// Tests use this to stage store states, including stale replays.
    pub fn put_record(&self, diagram: Diagram) {
        self.diagrams
            .lock()
            .expect("diagram map lock")
            .insert(diagram.id.clone(), diagram);
    }

    pub fn record(&self, id: &str) -> Option<Diagram> {
        self.diagrams.lock().expect("diagram map lock").get(id).cloned()
    }
}

#[async_trait]
impl DiagramStore for MemoryStore {
    async fn create_diagram(&self, owner_id: &str) -> Result<String> {
        let diagram = Diagram::new(owner_id);
        let id = diagram.id.clone();
        self.put_record(diagram);
        Ok(id)
    }

    async fn get_diagram(&self, id: &str) -> Result<Option<Diagram>> {
        Ok(self.record(id))
    }

    async fn save_diagram(
        &self,
        id: &str,
        owner_id: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected save failure".to_string()));
        }
        let mut diagrams = self.diagrams.lock().expect("diagram map lock");
        let diagram = diagrams.get_mut(id).ok_or(Error::NotFound)?;
        if diagram.owner_id != owner_id {
            return Err(Error::PermissionDenied);
        }
        diagram.nodes = nodes.to_vec();
        diagram.edges = edges.to_vec();
        diagram.updated_at = Some(Utc::now());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn share_diagram(&self, id: &str, target_uid: &str, role: Role) -> Result<()> {
        let mut diagrams = self.diagrams.lock().expect("diagram map lock");
        let diagram = diagrams.get_mut(id).ok_or(Error::NotFound)?;
        diagram.shared_with.insert(target_uid.to_string(), role);
        diagram.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn list_diagrams(&self, owner_id: &str) -> Result<Vec<Diagram>> {
        let diagrams = self.diagrams.lock().expect("diagram map lock");
        Ok(diagrams
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete_diagram(&self, id: &str) -> Result<()> {
        let mut diagrams = self.diagrams.lock().expect("diagram map lock");
        diagrams.remove(id).map(|_| ()).ok_or(Error::NotFound)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create_user(&self, email: &str, password: &str, role: Role) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::Storage("Email must not be empty".to_string()));
        }
        let hash = credentials::hash_password(password)?;
        let mut users = self.users.lock().expect("user map lock");
        if users.values().any(|(u, _)| u.email.eq_ignore_ascii_case(email)) {
            return Err(Error::Storage(format!("An account already exists for {email}")));
        }
        let user = User {
            uid: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
        };
        users.insert(user.uid.clone(), (user.clone(), hash));
        Ok(user)
    }

    async fn get_user(&self, uid: &str) -> Result<Option<User>> {
        let users = self.users.lock().expect("user map lock");
        Ok(users.get(uid).map(|(u, _)| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let needle = email.trim();
        let users = self.users.lock().expect("user map lock");
        Ok(users
            .values()
            .find(|(u, _)| u.email.eq_ignore_ascii_case(needle))
            .map(|(u, _)| u.clone()))
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let needle = email.trim();
        let users = self.users.lock().expect("user map lock");
        Ok(users
            .values()
            .find(|(u, hash)| {
                u.email.eq_ignore_ascii_case(needle) && credentials::verify_password(password, hash)
            })
            .map(|(u, _)| u.clone()))
    }
}
