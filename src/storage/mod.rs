//! Persistence layer: document-store seams plus the redb-backed default.
//!
//! The traits model a hosted document store the way the rest of the app
//! consumes one. Writes are single-document and last-write-wins; nothing
//! here does optimistic locking.

pub mod diagram;
pub mod memory;
pub mod user;

pub use diagram::DiagramStorage;
pub use memory::MemoryStore;
pub use user::{UserRecord, UserStorage};

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use redb::Database;

use crate::error::{self, Error};
use crate::models::{Diagram, Edge, Node, Role, User};

/// Document store for diagrams.
#[async_trait]
pub trait DiagramStore: Send + Sync {
    /// Create an empty diagram owned by `owner_id`, returning its id.
    async fn create_diagram(&self, owner_id: &str) -> error::Result<String>;

    /// Fetch one diagram. `Ok(None)` when the id does not resolve.
    async fn get_diagram(&self, id: &str) -> error::Result<Option<Diagram>>;

    /// Overwrite graph content. The sharing map and ownership of the stored
    /// record are preserved; a caller claiming the wrong owner is rejected.
    async fn save_diagram(
        &self,
        id: &str,
        owner_id: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> error::Result<()>;

    /// Grant `role` to `target_uid`. Read-modify-write of the whole sharing
    /// map with no version check, so two concurrent grants can race and the
    /// later write wins. Known limitation.
    async fn share_diagram(&self, id: &str, target_uid: &str, role: Role) -> error::Result<()>;

    /// Diagrams owned by `owner_id`. Shared-with-me listing is a separate
    /// concern and deliberately not offered here.
    async fn list_diagrams(&self, owner_id: &str) -> error::Result<Vec<Diagram>>;

    /// Remove a diagram outright.
    async fn delete_diagram(&self, id: &str) -> error::Result<()>;
}

/// Account backend: profiles, email lookup and credential checks.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Provision an account. Fails when the email is already taken.
    async fn create_user(&self, email: &str, password: &str, role: Role) -> error::Result<User>;

    async fn get_user(&self, uid: &str) -> error::Result<Option<User>>;

    /// Exact-address lookup (case-insensitive local part, like any mail
    /// system in practice). `Ok(None)` when no account matches.
    async fn find_by_email(&self, email: &str) -> error::Result<Option<User>>;

    /// `Ok(None)` on unknown email or wrong password; the two are never
    /// distinguished.
    async fn verify_credentials(&self, email: &str, password: &str)
    -> error::Result<Option<User>>;
}

/// redb-backed storage aggregate, one table per collection.
pub struct Storage {
    pub diagrams: DiagramStorage,
    pub users: UserStorage,
}

impl Storage {
    pub fn new(db_path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(db_path)?);
        let diagrams = DiagramStorage::new(db.clone())?;
        let users = UserStorage::new(db)?;
        Ok(Self { diagrams, users })
    }
}

#[async_trait]
impl DiagramStore for Storage {
    async fn create_diagram(&self, owner_id: &str) -> error::Result<String> {
        let diagram = Diagram::new(owner_id);
        self.diagrams.put(&diagram)?;
        Ok(diagram.id)
    }

    async fn get_diagram(&self, id: &str) -> error::Result<Option<Diagram>> {
        Ok(self.diagrams.get(id)?)
    }

    async fn save_diagram(
        &self,
        id: &str,
        owner_id: &str,
        nodes: &[Node],
        edges: &[Edge],
    ) -> error::Result<()> {
        let mut diagram = self.diagrams.get(id)?.ok_or(Error::NotFound)?;
        if diagram.owner_id != owner_id {
            // The store's own write rule, independent of the caller's gate.
            return Err(Error::PermissionDenied);
        }
        diagram.nodes = nodes.to_vec();
        diagram.edges = edges.to_vec();
        diagram.updated_at = Some(Utc::now());
        self.diagrams.put(&diagram)?;
        Ok(())
    }

    async fn share_diagram(&self, id: &str, target_uid: &str, role: Role) -> error::Result<()> {
        let mut diagram = self.diagrams.get(id)?.ok_or(Error::NotFound)?;
        diagram.shared_with.insert(target_uid.to_string(), role);
        diagram.updated_at = Some(Utc::now());
        self.diagrams.put(&diagram)?;
        Ok(())
    }

    async fn list_diagrams(&self, owner_id: &str) -> error::Result<Vec<Diagram>> {
        let mut diagrams = self.diagrams.list()?;
        diagrams.retain(|d| d.owner_id == owner_id);
        Ok(diagrams)
    }

    async fn delete_diagram(&self, id: &str) -> error::Result<()> {
        if !self.diagrams.delete(id)? {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for Storage {
    async fn create_user(&self, email: &str, password: &str, role: Role) -> error::Result<User> {
        Ok(self.users.create(email, password, role)?)
    }

    async fn get_user(&self, uid: &str) -> error::Result<Option<User>> {
        Ok(self.users.get(uid)?.map(|r| r.profile()))
    }

    async fn find_by_email(&self, email: &str) -> error::Result<Option<User>> {
        Ok(self.users.find_by_email(email)?.map(|r| r.profile()))
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> error::Result<Option<User>> {
        Ok(self.users.verify_credentials(email, password)?)
    }
}
