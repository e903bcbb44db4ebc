//! Capability resolution: per-diagram sets and the account-level guard.
//!
//! A [`Capabilities`] set is derived on demand from the pair (signed-in
//! user, diagram record) and is never stored, so a sharing change or a
//! sign-out can't leave a stale grant behind. Resolution is pure and
//! total: absent or inconsistent input degrades to the no-access set
//! instead of failing. [`role_allowed`] covers the surfaces that have no
//! diagram to resolve against.

use crate::models::{Diagram, Role, User};

/// What one user may do with one diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// The user is the diagram's owner. Implies editor capability.
    pub is_owner: bool,
    /// The user may mutate nodes and edges.
    pub is_editor: bool,
    /// The user holds an explicit read-only grant.
    pub is_viewer: bool,
    /// The user may see the diagram at all.
    pub has_access: bool,
    /// Effective role, `None` when the user has no access.
    pub role: Option<Role>,
}

impl Capabilities {
    /// The no-access set: every flag false, no role.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Resolve the capability set for `user` on `diagram`.
    ///
    /// Ownership is checked first and grants editor capability outright,
    /// even against an inconsistent self-entry in the sharing map. For
    /// everyone else the sharing map decides: the uid appearing as a key
    /// grants access, and the stored role picks the tier. Exactly one of
    /// `is_editor` / `is_viewer` is set whenever `role` is present.
    #[must_use]
    pub fn resolve(user: Option<&User>, diagram: Option<&Diagram>) -> Self {
        let (Some(user), Some(diagram)) = (user, diagram) else {
            return Self::none();
        };

        let is_owner = diagram.owner_id == user.uid;
        let shared_role = diagram.shared_with.get(&user.uid).copied();

        let role = if is_owner { Some(Role::Editor) } else { shared_role };

        Self {
            is_owner,
            is_editor: role == Some(Role::Editor),
            is_viewer: role == Some(Role::Viewer),
            has_access: is_owner || shared_role.is_some(),
            role,
        }
    }
}

/// Coarse guard on the account's default role, for surfaces that are not
/// tied to any one diagram (dashboard, account pages). Signed-out or a
/// default role outside `allowed` is denied. Anything diagram-scoped goes
/// through [`Capabilities::resolve`] instead.
#[must_use]
pub fn role_allowed(user: Option<&User>, allowed: &[Role]) -> bool {
    user.is_some_and(|user| allowed.contains(&user.role))
}
