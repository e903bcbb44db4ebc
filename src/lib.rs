pub mod api;
pub mod auth;
pub mod error;
pub mod models;
pub mod notify;
pub mod paths;
pub mod permissions;
pub mod services;
pub mod session;
pub mod storage;

pub use error::{Error, Result};
pub use models::*;

use std::sync::Arc;

use auth::AuthService;
use notify::Notifier;
use session::{EditorSession, SessionLoad};
use storage::{DiagramStore, MemoryStore, Storage, UserDirectory};

/// Core application state shared between the HTTP server and embedded
/// editor shells.
pub struct AppCore {
    pub store: Arc<dyn DiagramStore>,
    pub users: Arc<dyn UserDirectory>,
    pub auth: Arc<AuthService>,
    pub notifier: Notifier,
}

impl AppCore {
    /// Open (or create) the redb database at `db_path` and wire everything
    /// on top of it.
    pub fn new(db_path: &str) -> anyhow::Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);
        Ok(Self::assemble(storage.clone(), storage))
    }

    /// Fully in-memory core, used by tests and throwaway embeddings.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::assemble(store.clone(), store)
    }

    fn assemble(store: Arc<dyn DiagramStore>, users: Arc<dyn UserDirectory>) -> Self {
        let auth = Arc::new(AuthService::new(users.clone()));
        auth.start();
        Self {
            store,
            users,
            auth,
            notifier: Notifier::new(),
        }
    }

    /// Open an editor session for `diagram_id` under the current auth
    /// state. The session keeps watching auth for its whole lifetime.
    pub async fn open_diagram(&self, diagram_id: &str) -> Result<SessionLoad> {
        EditorSession::open(
            diagram_id,
            self.auth.subscribe(),
            self.store.clone(),
            self.users.clone(),
            self.notifier.clone(),
        )
        .await
    }
}
