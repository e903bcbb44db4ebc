//! Request-scoped diagram operations shared by the HTTP handlers and any
//! embedding shell.
//!
//! Every call takes the acting user explicitly and consults the capability
//! resolver before touching the store. A denied call returns
//! `PermissionDenied` and performs no write.

use std::sync::Arc;

use tracing::info;

use crate::AppCore;
use crate::error::{Error, Result};
use crate::models::{Diagram, Edge, Node, Role, User};
use crate::permissions::Capabilities;

pub async fn list_diagrams(core: &Arc<AppCore>, user: &User) -> Result<Vec<Diagram>> {
    core.store.list_diagrams(&user.uid).await
}

pub async fn create_diagram(core: &Arc<AppCore>, user: &User) -> Result<String> {
    let id = core.store.create_diagram(&user.uid).await?;
    info!("{} created {}", user.email, id);
    Ok(id)
}

/// Fetch for viewing. Gated on `has_access`, the same rule a hosted store
/// would enforce on reads.
pub async fn fetch_diagram(core: &Arc<AppCore>, user: &User, id: &str) -> Result<Diagram> {
    let diagram = core.store.get_diagram(id).await?.ok_or(Error::NotFound)?;
    let caps = Capabilities::resolve(Some(user), Some(&diagram));
    if !caps.has_access {
        return Err(Error::PermissionDenied);
    }
    Ok(diagram)
}

/// Replace graph content. Gated on `is_editor`; ownership and the sharing
/// map of the stored record are untouched.
pub async fn save_diagram(
    core: &Arc<AppCore>,
    user: &User,
    id: &str,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
) -> Result<()> {
    let diagram = core.store.get_diagram(id).await?.ok_or(Error::NotFound)?;
    let caps = Capabilities::resolve(Some(user), Some(&diagram));
    if !caps.is_editor {
        return Err(Error::PermissionDenied);
    }
    core.store
        .save_diagram(id, &diagram.owner_id, &nodes, &edges)
        .await
}

/// Grant `role` to the account behind `email`. Owner-only. Returns the
/// resolved account so callers can name it in their confirmation.
pub async fn share_diagram(
    core: &Arc<AppCore>,
    user: &User,
    id: &str,
    email: &str,
    role: Role,
) -> Result<User> {
    let diagram = core.store.get_diagram(id).await?.ok_or(Error::NotFound)?;
    let caps = Capabilities::resolve(Some(user), Some(&diagram));
    if !caps.is_owner {
        return Err(Error::PermissionDenied);
    }

    let target = core
        .users
        .find_by_email(email.trim())
        .await?
        .ok_or(Error::UserNotFound)?;
    core.store.share_diagram(id, &target.uid, role).await?;
    info!("{} shared {} with {} as {}", user.email, id, target.email, role);
    Ok(target)
}

/// Owner-only, terminal.
pub async fn delete_diagram(core: &Arc<AppCore>, user: &User, id: &str) -> Result<()> {
    let diagram = core.store.get_diagram(id).await?.ok_or(Error::NotFound)?;
    let caps = Capabilities::resolve(Some(user), Some(&diagram));
    if !caps.is_owner {
        return Err(Error::PermissionDenied);
    }
    core.store.delete_diagram(id).await?;
    info!("{} deleted {}", user.email, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use crate::storage::UserDirectory;

    async fn core_with_users() -> (Arc<AppCore>, User, User, User) {
        let core = Arc::new(AppCore::in_memory());
        let owner = core
            .users
            .create_user("owner@example.com", "pw", Role::Editor)
            .await
            .expect("owner");
        let editor = core
            .users
            .create_user("editor@example.com", "pw", Role::Editor)
            .await
            .expect("editor");
        let viewer = core
            .users
            .create_user("viewer@example.com", "pw", Role::Viewer)
            .await
            .expect("viewer");
        (core, owner, editor, viewer)
    }

    #[tokio::test]
    async fn test_listing_is_owner_scoped() {
        let (core, owner, editor, _) = core_with_users().await;
        let mine = create_diagram(&core, &owner).await.expect("create");
        create_diagram(&core, &editor).await.expect("create");

        let listed = list_diagrams(&core, &owner).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine);
    }

    #[tokio::test]
    async fn test_fetch_requires_a_grant() {
        let (core, owner, _, viewer) = core_with_users().await;
        let id = create_diagram(&core, &owner).await.expect("create");

        let err = fetch_diagram(&core, &viewer, &id).await.expect_err("no grant yet");
        assert_eq!(err, Error::PermissionDenied);

        share_diagram(&core, &owner, &id, "viewer@example.com", Role::Viewer)
            .await
            .expect("share");
        let fetched = fetch_diagram(&core, &viewer, &id).await.expect("fetch");
        assert_eq!(fetched.id, id);

        let err = fetch_diagram(&core, &owner, "dg_missing")
            .await
            .expect_err("missing");
        assert_eq!(err, Error::NotFound);
    }

    #[tokio::test]
    async fn test_save_gate_by_role() {
        let (core, owner, editor, viewer) = core_with_users().await;
        let id = create_diagram(&core, &owner).await.expect("create");
        share_diagram(&core, &owner, &id, "editor@example.com", Role::Editor)
            .await
            .expect("share");
        share_diagram(&core, &owner, &id, "viewer@example.com", Role::Viewer)
            .await
            .expect("share");

        let nodes = vec![Node::new("a", Position { x: 0.0, y: 0.0 })];
        save_diagram(&core, &editor, &id, nodes.clone(), vec![])
            .await
            .expect("editor saves");

        let err = save_diagram(&core, &viewer, &id, nodes, vec![])
            .await
            .expect_err("viewer refused");
        assert_eq!(err, Error::PermissionDenied);

        // The refused save left the editor's version in place.
        let diagram = fetch_diagram(&core, &owner, &id).await.expect("fetch");
        assert_eq!(diagram.nodes.len(), 1);
        assert_eq!(diagram.shared_with.len(), 2);
    }

    #[tokio::test]
    async fn test_share_gate_is_owner_only() {
        let (core, owner, editor, _) = core_with_users().await;
        let id = create_diagram(&core, &owner).await.expect("create");
        share_diagram(&core, &owner, &id, "editor@example.com", Role::Editor)
            .await
            .expect("share");

        let err = share_diagram(&core, &editor, &id, "viewer@example.com", Role::Viewer)
            .await
            .expect_err("editor cannot share");
        assert_eq!(err, Error::PermissionDenied);

        let err = share_diagram(&core, &owner, &id, "ghost@example.com", Role::Viewer)
            .await
            .expect_err("unknown email");
        assert_eq!(err, Error::UserNotFound);
    }

    #[tokio::test]
    async fn test_delete_gate_is_owner_only() {
        let (core, owner, editor, _) = core_with_users().await;
        let id = create_diagram(&core, &owner).await.expect("create");
        share_diagram(&core, &owner, &id, "editor@example.com", Role::Editor)
            .await
            .expect("share");

        let err = delete_diagram(&core, &editor, &id).await.expect_err("not owner");
        assert_eq!(err, Error::PermissionDenied);

        delete_diagram(&core, &owner, &id).await.expect("owner deletes");
        let err = fetch_diagram(&core, &owner, &id).await.expect_err("gone");
        assert_eq!(err, Error::NotFound);
    }
}
