//! Account records, one redb table keyed by uid.
//!
//! Stores the profile plus the credential hash. Only the profile half ever
//! crosses the [`super::UserDirectory`] seam.

use anyhow::Result;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::credentials;
use crate::models::{Role, User};

const USER_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn profile(&self) -> User {
        User {
            uid: self.uid.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

pub struct UserStorage {
    db: Arc<Database>,
}

impl UserStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USER_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Provision an account. Emails are unique, compared case-insensitively.
    pub fn create(&self, email: &str, password: &str, role: Role) -> Result<User> {
        let email = email.trim();
        if email.is_empty() {
            anyhow::bail!("Email must not be empty");
        }
        if self.find_by_email(email)?.is_some() {
            anyhow::bail!("An account already exists for {}", email);
        }

        let record = UserRecord {
            uid: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
            password_hash: credentials::hash_password(password)?,
            created_at: Utc::now(),
        };
        self.put(&record)?;
        Ok(record.profile())
    }

    pub fn get(&self, uid: &str) -> Result<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USER_TABLE)?;
        match table.get(uid)? {
            Some(data) => Ok(Some(serde_json::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Full scan. Account counts are small enough that an email index has
    /// not been worth a second table.
    pub fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let needle = email.trim();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USER_TABLE)?;
        for entry in table.iter()? {
            let (_, data) = entry?;
            let record: UserRecord = serde_json::from_slice(data.value())?;
            if record.email.eq_ignore_ascii_case(needle) {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// `Ok(None)` covers both unknown email and wrong password.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        match self.find_by_email(email)? {
            Some(record) if credentials::verify_password(password, &record.password_hash) => {
                Ok(Some(record.profile()))
            }
            _ => Ok(None),
        }
    }

    fn put(&self, record: &UserRecord) -> Result<()> {
        let data = serde_json::to_vec(record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(USER_TABLE)?;
            table.insert(record.uid.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(dir: &tempfile::TempDir) -> UserStorage {
        let path = dir.path().join("users.db");
        let db = Database::create(path).expect("db should open");
        UserStorage::new(Arc::new(db)).expect("table should init")
    }

    #[test]
    fn test_create_trims_and_uniques_email() {
        let dir = tempdir().expect("tempdir");
        let storage = open(&dir);

        let user = storage
            .create("  bob@example.com ", "pw", Role::Viewer)
            .expect("create");
        assert_eq!(user.email, "bob@example.com");
        assert_eq!(user.role, Role::Viewer);

        assert!(storage.create("BOB@example.com", "pw", Role::Editor).is_err());
        assert!(storage.create("", "pw", Role::Editor).is_err());
    }

    #[test]
    fn test_profile_hides_credentials() {
        let dir = tempdir().expect("tempdir");
        let storage = open(&dir);

        let user = storage.create("bob@example.com", "pw", Role::Editor).expect("create");
        let record = storage.get(&user.uid).expect("get").expect("exists");
        assert!(!record.password_hash.is_empty());

        let json = serde_json::to_string(&record.profile()).expect("serialize");
        assert!(!json.contains("password"));
    }

    #[test]
    fn test_verify_credentials_paths() {
        let dir = tempdir().expect("tempdir");
        let storage = open(&dir);
        storage.create("bob@example.com", "pw", Role::Editor).expect("create");

        assert!(storage
            .verify_credentials("bob@example.com", "pw")
            .expect("verify")
            .is_some());
        assert!(storage
            .verify_credentials("bob@example.com", "nope")
            .expect("verify")
            .is_none());
        assert!(storage
            .verify_credentials("ghost@example.com", "pw")
            .expect("verify")
            .is_none());
    }
}
