//! Bearer session tokens for the HTTP surface.
//!
//! Tokens are opaque, issued at login and held in memory only; a restart
//! signs everyone out. Only the SHA-256 of a token is kept, never the
//! token itself.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::models::User;

#[derive(Debug, Default)]
pub struct SessionTokens {
    sessions_by_hash: RwLock<HashMap<String, User>>,
}

impl SessionTokens {
    pub fn new() -> Self {
        Self {
            sessions_by_hash: RwLock::new(HashMap::new()),
        }
    }

    /// Mint a token for `user`. The raw value is returned exactly once.
    pub fn issue(&self, user: &User) -> String {
        let token = format!("fbs_{}", Uuid::new_v4().simple());
        self.sessions_by_hash
            .write()
            .expect("session token lock")
            .insert(hash_token(&token), user.clone());
        token
    }

    /// Resolve a presented token to its signed-in user.
    pub fn resolve(&self, token: &str) -> Option<User> {
        self.sessions_by_hash
            .read()
            .expect("session token lock")
            .get(&hash_token(token))
            .cloned()
    }

    /// Drop the session behind `token`. Unknown tokens report false.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions_by_hash
            .write()
            .expect("session token lock")
            .remove(&hash_token(token))
            .is_some()
    }
}

fn hash_token(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}
