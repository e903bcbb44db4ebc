//! Page-lifetime editor sessions.
//!
//! An [`EditorSession`] wraps one open diagram: the local working copy,
//! the live auth state, the debounced auto-saver, and the capability gate
//! every mutation goes through. Opening is itself gated; a refused open
//! never constructs a session.

pub mod autosave;

pub use autosave::AUTO_SAVE_DELAY;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::auth::AuthState;
use crate::error::{Error, Result};
use crate::models::{Diagram, Edge, GraphChange, Node, Role};
use crate::notify::Notifier;
use crate::permissions::Capabilities;
use crate::storage::{DiagramStore, UserDirectory};
use autosave::Autosaver;

pub const DASHBOARD_ROUTE: &str = "/";

/// Grace period before a refused view is sent away, long enough to read
/// the notice explaining why.
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

/// Where a refused load sends the user, and after how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: &'static str,
    pub after: Duration,
}

impl Redirect {
    fn to_dashboard() -> Self {
        Self {
            to: DASHBOARD_ROUTE,
            after: REDIRECT_DELAY,
        }
    }
}

/// Outcome of opening a diagram.
pub enum SessionLoad {
    Ready(EditorSession),
    /// The id does not resolve. Terminal for this view.
    NotFound(Redirect),
    /// The current user holds no grant on this diagram. Terminal.
    Denied(Redirect),
}

/// What a rendering surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasView {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Whether mutation affordances should be offered at all. The gate
    /// still re-checks every mutation regardless.
    pub editable: bool,
}

pub struct EditorSession {
    diagram: Arc<Mutex<Diagram>>,
    auth: watch::Receiver<AuthState>,
    store: Arc<dyn DiagramStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Notifier,
    autosaver: Autosaver,
}

impl EditorSession {
    /// Load `diagram_id` and gate on view access. The auth receiver stays
    /// live for the whole session, so a later sign-out or revocation is
    /// seen by the very next capability check.
    pub async fn open(
        diagram_id: &str,
        auth: watch::Receiver<AuthState>,
        store: Arc<dyn DiagramStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Notifier,
    ) -> Result<SessionLoad> {
        let diagram = match store.get_diagram(diagram_id).await {
            Ok(Some(diagram)) => diagram,
            Ok(None) => {
                notifier.error(Error::NotFound.to_string());
                return Ok(SessionLoad::NotFound(Redirect::to_dashboard()));
            }
            Err(err) => {
                notifier.error(err.to_string());
                return Err(err);
            }
        };

        let caps = Capabilities::resolve(auth.borrow().user(), Some(&diagram));
        if !caps.has_access {
            warn!("refused to open {}: no access", diagram_id);
            notifier.error(Error::PermissionDenied.to_string());
            return Ok(SessionLoad::Denied(Redirect::to_dashboard()));
        }

        info!("opened {} ({:?})", diagram_id, caps.role);
        Ok(SessionLoad::Ready(Self::start(
            diagram,
            auth,
            store,
            users,
            notifier,
            AUTO_SAVE_DELAY,
        )))
    }

    pub(crate) fn start(
        diagram: Diagram,
        auth: watch::Receiver<AuthState>,
        store: Arc<dyn DiagramStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Notifier,
        autosave_delay: Duration,
    ) -> Self {
        let diagram = Arc::new(Mutex::new(diagram));
        let autosaver = Autosaver::spawn(
            diagram.clone(),
            auth.clone(),
            store.clone(),
            notifier.clone(),
            autosave_delay,
        );
        Self {
            diagram,
            auth,
            store,
            users,
            notifier,
            autosaver,
        }
    }

    pub fn diagram_id(&self) -> String {
        self.diagram.lock().expect("diagram lock").id.clone()
    }

    /// Current capability set, re-derived from live auth state and the
    /// working copy. Never cached.
    pub fn capabilities(&self) -> Capabilities {
        let diagram = self.diagram.lock().expect("diagram lock");
        Capabilities::resolve(self.auth.borrow().user(), Some(&diagram))
    }

    pub fn view(&self) -> CanvasView {
        let diagram = self.diagram.lock().expect("diagram lock");
        let caps = Capabilities::resolve(self.auth.borrow().user(), Some(&diagram));
        CanvasView {
            nodes: diagram.nodes.clone(),
            edges: diagram.edges.clone(),
            editable: caps.is_editor,
        }
    }

    /// Apply one change from the rendering surface. Editor-gated: on
    /// denial nothing mutates, no save is armed, and a notice explains.
    pub fn apply(&self, change: GraphChange) -> Result<()> {
        let mut diagram = self.diagram.lock().expect("diagram lock");
        let caps = Capabilities::resolve(self.auth.borrow().user(), Some(&diagram));
        if !caps.is_editor {
            drop(diagram);
            self.notifier.error(Error::PermissionDenied.to_string());
            return Err(Error::PermissionDenied);
        }

        let changed = diagram.apply(change);
        drop(diagram);
        if changed {
            self.autosaver.touch();
        }
        Ok(())
    }

    /// Owner-only: grant `role` to the account behind `email`.
    pub async fn share(&self, email: &str, role: Role) -> Result<()> {
        let (caps, diagram_id) = {
            let diagram = self.diagram.lock().expect("diagram lock");
            let caps = Capabilities::resolve(self.auth.borrow().user(), Some(&diagram));
            (caps, diagram.id.clone())
        };
        if !caps.is_owner {
            self.notifier.error(Error::PermissionDenied.to_string());
            return Err(Error::PermissionDenied);
        }

        let email = email.trim();
        if email.is_empty() {
            self.notifier.warning("Please enter an email address");
            return Ok(());
        }

        let target = match self.users.find_by_email(email).await {
            Ok(Some(target)) => target,
            Ok(None) => {
                self.notifier.error(Error::UserNotFound.to_string());
                return Err(Error::UserNotFound);
            }
            Err(err) => {
                self.notifier.error(err.to_string());
                return Err(err);
            }
        };

        if let Err(err) = self.store.share_diagram(&diagram_id, &target.uid, role).await {
            self.notifier.error(err.to_string());
            return Err(err);
        }

        // Mirror the grant into the working copy so the next capability
        // check sees it without a refetch.
        self.diagram
            .lock()
            .expect("diagram lock")
            .shared_with
            .insert(target.uid.clone(), role);

        info!("shared {} with {} as {}", diagram_id, target.email, role);
        self.notifier
            .success(format!("Diagram shared successfully with {email} as {role}!"));
        Ok(())
    }

    /// Stop the auto-saver. A write already dispatched still completes;
    /// a pending quiet window is discarded.
    pub fn close(self) {
        self.autosaver.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Node, Position, User};
    use crate::notify::ToastKind;
    use crate::storage::MemoryStore;
    use tokio::time::sleep;

    const DELAY: Duration = Duration::from_millis(50);

    struct Rig {
        store: Arc<MemoryStore>,
        auth_tx: watch::Sender<AuthState>,
        notifier: Notifier,
        diagram_id: String,
        owner: User,
        editor: User,
        viewer: User,
    }

    async fn rig() -> Rig {
        let store = Arc::new(MemoryStore::new());
        let owner = store
            .create_user("owner@example.com", "pw", Role::Editor)
            .await
            .expect("owner");
        let editor = store
            .create_user("editor@example.com", "pw", Role::Editor)
            .await
            .expect("editor");
        let viewer = store
            .create_user("viewer@example.com", "pw", Role::Viewer)
            .await
            .expect("viewer");

        let mut record = Diagram::new(&owner.uid);
        record.shared_with.insert(editor.uid.clone(), Role::Editor);
        record.shared_with.insert(viewer.uid.clone(), Role::Viewer);
        let diagram_id = record.id.clone();
        store.put_record(record);

        let (auth_tx, _) = watch::channel(AuthState::SignedOut);
        Rig {
            store,
            auth_tx,
            notifier: Notifier::new(),
            diagram_id,
            owner,
            editor,
            viewer,
        }
    }

    impl Rig {
        fn sign_in(&self, user: &User) {
            self.auth_tx.send_replace(AuthState::SignedIn(user.clone()));
        }

        async fn open(&self) -> Result<SessionLoad> {
            EditorSession::open(
                &self.diagram_id,
                self.auth_tx.subscribe(),
                self.store.clone(),
                self.store.clone(),
                self.notifier.clone(),
            )
            .await
        }

        fn session(&self) -> EditorSession {
            let record = self.store.record(&self.diagram_id).expect("record");
            EditorSession::start(
                record,
                self.auth_tx.subscribe(),
                self.store.clone(),
                self.store.clone(),
                self.notifier.clone(),
                DELAY,
            )
        }
    }

    fn add_node(label: &str) -> GraphChange {
        GraphChange::NodeAdded {
            node: Node::new(label, Position { x: 10.0, y: 20.0 }),
        }
    }

    #[tokio::test]
    async fn test_open_unknown_id_redirects_home() {
        let rig = rig().await;
        rig.sign_in(&rig.owner);
        let mut toasts = rig.notifier.subscribe();

        let load = EditorSession::open(
            "dg_missing",
            rig.auth_tx.subscribe(),
            rig.store.clone(),
            rig.store.clone(),
            rig.notifier.clone(),
        )
        .await
        .expect("open");

        match load {
            SessionLoad::NotFound(redirect) => {
                assert_eq!(redirect.to, DASHBOARD_ROUTE);
                assert_eq!(redirect.after, REDIRECT_DELAY);
            }
            _ => panic!("expected NotFound"),
        }
        let toast = toasts.recv().await.expect("toast");
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "The requested resource was not found.");
    }

    #[tokio::test]
    async fn test_open_denied_without_grant() {
        let rig = rig().await;
        let stranger = rig
            .store
            .create_user("stranger@example.com", "pw", Role::Editor)
            .await
            .expect("stranger");
        rig.sign_in(&stranger);
        let mut toasts = rig.notifier.subscribe();

        match rig.open().await.expect("open") {
            SessionLoad::Denied(redirect) => assert_eq!(redirect.to, DASHBOARD_ROUTE),
            _ => panic!("expected Denied"),
        }
        assert_eq!(
            toasts.recv().await.expect("toast").message,
            "You don't have permission to perform this action."
        );
    }

    #[tokio::test]
    async fn test_open_denied_when_signed_out() {
        let rig = rig().await;
        match rig.open().await.expect("open") {
            SessionLoad::Denied(_) => {}
            _ => panic!("expected Denied"),
        }
    }

    #[tokio::test]
    async fn test_open_ready_for_each_grant_tier() {
        let rig = rig().await;
        for user in [&rig.owner, &rig.editor, &rig.viewer] {
            rig.sign_in(user);
            match rig.open().await.expect("open") {
                SessionLoad::Ready(session) => session.close(),
                _ => panic!("expected Ready for {}", user.email),
            }
        }
    }

    #[tokio::test]
    async fn test_viewer_mutation_is_refused_without_a_write() {
        let rig = rig().await;
        rig.sign_in(&rig.viewer);
        let session = rig.session();
        let mut toasts = rig.notifier.subscribe();

        let err = session
            .apply(GraphChange::EdgeConnected {
                edge: Edge::between("a", "b"),
            })
            .expect_err("viewer must be refused");
        assert_eq!(err, Error::PermissionDenied);

        let view = session.view();
        assert!(!view.editable);
        assert!(view.edges.is_empty());
        assert_eq!(
            toasts.recv().await.expect("toast").message,
            "You don't have permission to perform this action."
        );

        sleep(Duration::from_millis(150)).await;
        assert_eq!(rig.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_editor_burst_persists_once() {
        let rig = rig().await;
        rig.sign_in(&rig.editor);
        let session = rig.session();

        session.apply(add_node("a")).expect("apply");
        session.apply(add_node("b")).expect("apply");
        session
            .apply(GraphChange::NodeRenamed {
                id: session.view().nodes[0].id.clone(),
                label: "renamed".to_string(),
            })
            .expect("apply");

        sleep(Duration::from_millis(200)).await;
        assert_eq!(rig.store.save_count(), 1);

        let stored = rig.store.record(&rig.diagram_id).expect("record");
        assert_eq!(stored.nodes.len(), 2);
        assert_eq!(stored.nodes[0].label, "renamed");
        // The sharing map survives a content save.
        assert_eq!(stored.shared_with.len(), 2);
    }

    #[tokio::test]
    async fn test_sign_out_revokes_a_live_session() {
        let rig = rig().await;
        rig.sign_in(&rig.owner);
        let session = rig.session();
        session.apply(add_node("before")).expect("apply");

        rig.auth_tx.send_replace(AuthState::SignedOut);
        let err = session.apply(add_node("after")).expect_err("must be refused");
        assert_eq!(err, Error::PermissionDenied);
        assert!(session.capabilities().role.is_none());
        assert_eq!(session.view().nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_owner_shares_by_email() {
        let rig = rig().await;
        let guest = rig
            .store
            .create_user("guest@example.com", "pw", Role::Viewer)
            .await
            .expect("guest");
        rig.sign_in(&rig.owner);
        let session = rig.session();
        let mut toasts = rig.notifier.subscribe();

        session.share("guest@example.com", Role::Viewer).await.expect("share");

        let stored = rig.store.record(&rig.diagram_id).expect("record");
        assert_eq!(stored.shared_with.get(&guest.uid), Some(&Role::Viewer));
        assert_eq!(
            toasts.recv().await.expect("toast").message,
            "Diagram shared successfully with guest@example.com as viewer!"
        );
    }

    #[tokio::test]
    async fn test_share_is_owner_only() {
        let rig = rig().await;
        rig.sign_in(&rig.editor);
        let session = rig.session();

        let err = session
            .share("guest@example.com", Role::Editor)
            .await
            .expect_err("editors must not share");
        assert_eq!(err, Error::PermissionDenied);

        let stored = rig.store.record(&rig.diagram_id).expect("record");
        assert_eq!(stored.shared_with.len(), 2);
    }

    #[tokio::test]
    async fn test_share_unknown_email() {
        let rig = rig().await;
        rig.sign_in(&rig.owner);
        let session = rig.session();
        let mut toasts = rig.notifier.subscribe();

        let err = session
            .share("ghost@example.com", Role::Viewer)
            .await
            .expect_err("unknown email");
        assert_eq!(err, Error::UserNotFound);
        assert_eq!(
            toasts.recv().await.expect("toast").message,
            "User not found with that email."
        );
    }

    #[tokio::test]
    async fn test_share_blank_email_is_a_noop() {
        let rig = rig().await;
        rig.sign_in(&rig.owner);
        let session = rig.session();
        let mut toasts = rig.notifier.subscribe();

        session.share("   ", Role::Viewer).await.expect("noop");

        let toast = toasts.recv().await.expect("toast");
        assert_eq!(toast.kind, ToastKind::Warning);
        assert_eq!(toast.message, "Please enter an email address");
        assert_eq!(rig.store.record(&rig.diagram_id).expect("record").shared_with.len(), 2);
    }

    #[tokio::test]
    async fn test_sequential_shares_accumulate() {
        let rig = rig().await;
        let a = rig
            .store
            .create_user("a@example.com", "pw", Role::Viewer)
            .await
            .expect("a");
        let b = rig
            .store
            .create_user("b@example.com", "pw", Role::Viewer)
            .await
            .expect("b");
        rig.sign_in(&rig.owner);
        let session = rig.session();

        session.share("a@example.com", Role::Editor).await.expect("share a");
        session.share("b@example.com", Role::Viewer).await.expect("share b");

        let stored = rig.store.record(&rig.diagram_id).expect("record");
        assert_eq!(stored.shared_with.get(&a.uid), Some(&Role::Editor));
        assert_eq!(stored.shared_with.get(&b.uid), Some(&Role::Viewer));
    }

    #[tokio::test]
    async fn test_granted_capability_applies_without_reopen() {
        let rig = rig().await;
        let guest = rig
            .store
            .create_user("guest@example.com", "pw", Role::Editor)
            .await
            .expect("guest");
        rig.sign_in(&rig.owner);
        let session = rig.session();
        session.share("guest@example.com", Role::Editor).await.expect("share");

        // Same working copy, different signed-in identity: the mirrored
        // grant is already visible to the gate.
        rig.sign_in(&guest);
        assert!(session.capabilities().is_editor);
        session.apply(add_node("by guest")).expect("guest edits");
    }
}
