//! User store
//!
//! Accounts are soft-deleted: [`UserStore::deactivate`] flips `active` and
//! keeps the directory. The password-reset code is a short-lived side file
//! (`otp.json`) written and consumed under the account's write lock.

use crate::fsutil::{read_optional, remove_optional, write_atomic};
use crate::store::EntityStore;
use crate::user_codec::UserCodec;
use chrono::{DateTime, Duration, Utc};
use quire_core::{
    Error, EventSink, NullEventSink, OneTimePassword, Result, Role, Slug, StoreEvent, User,
};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One-time-password file name
pub const OTP_FILE: &str = "otp.json";

/// Outcome of [`UserStore::verify_otp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    /// Code matched; the record has been consumed
    Valid,
    /// Code did not match; the record is kept
    Invalid,
    /// Record had expired; it has been deleted
    Expired,
    /// No record was issued
    Missing,
}

/// Store of [`User`] directories
#[derive(Clone)]
pub struct UserStore {
    inner: EntityStore<UserCodec>,
    events: Arc<dyn EventSink>,
}

impl UserStore {
    /// Open (creating if needed) the user root
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_entities(EntityStore::open(root)?))
    }

    /// Wrap an already opened entity store
    pub fn from_entities(inner: EntityStore<UserCodec>) -> Self {
        Self {
            inner,
            events: Arc::new(NullEventSink),
        }
    }

    /// Send committed events to `sink`
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// The underlying generic store
    pub fn entities(&self) -> &EntityStore<UserCodec> {
        &self.inner
    }

    /// All accounts, active or not, by username
    pub fn list(&self) -> Result<Vec<User>> {
        self.inner.list()
    }

    /// Active accounts only
    pub fn list_active(&self) -> Result<Vec<User>> {
        self.inner.list_where(|u| u.active)
    }

    /// Look up an account, ignoring case
    pub fn get(&self, username: &Slug) -> Result<Option<User>> {
        self.inner.get(username)
    }

    /// Look up an account by email, ignoring case
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim();
        Ok(self
            .inner
            .list_where(|u| u.email.trim().eq_ignore_ascii_case(email))?
            .into_iter()
            .next())
    }

    /// Create a new account directory
    pub fn create(&self, user: &User) -> Result<()> {
        self.inner.create(user)?;
        info!(username = %user.username, role = %user.role, "user created");
        self.events.emit(&StoreEvent::UserCreated {
            username: user.username.clone(),
        });
        Ok(())
    }

    /// Replace a stored account
    pub fn update(&self, user: &User) -> Result<bool> {
        self.inner.update(user)
    }

    /// Locked read-modify-write cycle on one account
    pub fn modify<T, F>(&self, username: &Slug, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut User) -> Result<T>,
    {
        self.inner.modify(username, f)
    }

    /// Soft delete; `false` if the account was already inactive
    pub fn deactivate(&self, username: &Slug) -> Result<bool> {
        let changed = self
            .inner
            .modify(username, |user| Ok(std::mem::replace(&mut user.active, false)))?
            .ok_or_else(|| not_found(username))?;
        if changed {
            info!(username = %username, "user deactivated");
        }
        Ok(changed)
    }

    /// Change the role; `false` if it already was `role`
    pub fn set_role(&self, username: &Slug, role: Role) -> Result<bool> {
        self.inner
            .modify(username, |user| Ok(std::mem::replace(&mut user.role, role) != role))?
            .ok_or_else(|| not_found(username))
    }

    /// Remove the account directory entirely
    pub fn purge(&self, username: &Slug) -> Result<bool> {
        self.inner.delete(username)
    }

    /// Issue a password-reset code valid for `ttl`, replacing any earlier one
    pub fn issue_otp(
        &self,
        username: &Slug,
        code: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<OneTimePassword> {
        if code.is_empty() {
            return Err(Error::InvalidInput("one-time password is empty".into()));
        }
        let otp = OneTimePassword {
            code: code.to_string(),
            expires_at: now + ttl,
        };
        let bytes = serde_json::to_vec_pretty(&otp)?;
        self.inner
            .with_locked(username, |_, dir| {
                write_atomic(&dir.join(OTP_FILE), &bytes)?;
                Ok(())
            })?
            .ok_or_else(|| not_found(username))?;
        debug!(username = %username, expires_at = %otp.expires_at, "one-time password issued");
        Ok(otp)
    }

    /// Check a password-reset code
    ///
    /// The record is deleted on success and on expiry, and kept on mismatch.
    pub fn verify_otp(&self, username: &Slug, code: &str, now: DateTime<Utc>) -> Result<OtpCheck> {
        self.inner
            .with_locked(username, |_, dir| {
                let path = dir.join(OTP_FILE);
                let Some(text) = read_optional(&path)? else {
                    return Ok(OtpCheck::Missing);
                };
                let otp: OneTimePassword = match serde_json::from_str(&text) {
                    Ok(otp) => otp,
                    Err(e) => {
                        warn!(username = %username, error = %e, "discarding unreadable one-time password");
                        remove_optional(&path)?;
                        return Ok(OtpCheck::Missing);
                    }
                };
                if otp.is_expired(now) {
                    remove_optional(&path)?;
                    return Ok(OtpCheck::Expired);
                }
                if !same_code(&otp.code, code) {
                    return Ok(OtpCheck::Invalid);
                }
                remove_optional(&path)?;
                Ok(OtpCheck::Valid)
            })?
            .ok_or_else(|| not_found(username))
    }

    /// Drop any outstanding password-reset code
    pub fn clear_otp(&self, username: &Slug) -> Result<bool> {
        self.inner
            .with_locked(username, |_, dir| Ok(remove_optional(&dir.join(OTP_FILE))?))?
            .ok_or_else(|| not_found(username))
    }
}

impl fmt::Debug for UserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserStore")
            .field("root", &self.inner.root())
            .finish()
    }
}

// Compares every byte regardless of where the first mismatch is.
fn same_code(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn not_found(username: &Slug) -> Error {
    Error::NotFound(format!("user {}", username))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_concurrency::KeyedLocks;

    fn slug(s: &str) -> Slug {
        Slug::new(s).unwrap()
    }

    fn setup() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let entities = EntityStore::with_locks(dir.path(), Arc::new(KeyedLocks::new())).unwrap();
        let store = UserStore::from_entities(entities);
        store
            .create(&User::new(
                slug("alice"),
                "Alice@Example.com",
                "hash",
                Role::Author,
                Utc::now(),
            ))
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_find_by_email_ignores_case() {
        let (_dir, store) = setup();
        let user = store.find_by_email("alice@example.COM").unwrap().unwrap();
        assert_eq!(user.username, slug("alice"));
        assert!(store.find_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_deactivate_is_soft() {
        let (dir, store) = setup();
        assert!(store.deactivate(&slug("alice")).unwrap());
        assert!(!store.deactivate(&slug("alice")).unwrap());

        assert!(dir.path().join("alice").is_dir());
        assert!(!store.get(&slug("alice")).unwrap().unwrap().active);
        assert!(store.list_active().unwrap().is_empty());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_set_role() {
        let (_dir, store) = setup();
        assert!(store.set_role(&slug("alice"), Role::Admin).unwrap());
        assert!(!store.set_role(&slug("alice"), Role::Admin).unwrap());
        assert!(store.get(&slug("alice")).unwrap().unwrap().is_admin());
        assert!(store
            .set_role(&slug("ghost"), Role::Admin)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_otp_lifecycle() {
        let (dir, store) = setup();
        let now = Utc::now();
        let user = slug("alice");
        let otp_path = dir.path().join("alice").join(OTP_FILE);

        assert_eq!(store.verify_otp(&user, "123456", now).unwrap(), OtpCheck::Missing);

        store.issue_otp(&user, "123456", Duration::minutes(10), now).unwrap();
        assert_eq!(store.verify_otp(&user, "000000", now).unwrap(), OtpCheck::Invalid);
        assert!(otp_path.exists(), "mismatch keeps the record");

        assert_eq!(store.verify_otp(&user, "123456", now).unwrap(), OtpCheck::Valid);
        assert!(!otp_path.exists(), "success consumes the record");

        store.issue_otp(&user, "654321", Duration::minutes(10), now).unwrap();
        let later = now + Duration::minutes(11);
        assert_eq!(store.verify_otp(&user, "654321", later).unwrap(), OtpCheck::Expired);
        assert!(!otp_path.exists(), "expiry deletes the record");
    }

    #[test]
    fn test_otp_file_does_not_change_profile() {
        let (_dir, store) = setup();
        let before = store.get(&slug("alice")).unwrap().unwrap();
        store
            .issue_otp(&slug("alice"), "1", Duration::minutes(1), Utc::now())
            .unwrap();
        assert_eq!(store.get(&slug("alice")).unwrap().unwrap(), before);
        assert!(store.clear_otp(&slug("alice")).unwrap());
        assert!(!store.clear_otp(&slug("alice")).unwrap());
    }
}
