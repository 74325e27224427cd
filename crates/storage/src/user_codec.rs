//! User codec
//!
//! An account directory is valid iff it holds `profile.json`. The transient
//! one-time-password record lives beside it in `otp.json` and is managed by
//! [`UserStore`](crate::UserStore), not by this codec.

use crate::codec::{dir_slug, EntityCodec};
use crate::document::MetaDocument;
use crate::fsutil::{modified_time, read_optional, write_atomic};
use crate::post_codec::put;
use chrono::{DateTime, Utc};
use quire_core::{Error, Result, Role, Slug, User};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::path::Path;

/// Profile file name
pub const PROFILE_FILE: &str = "profile.json";

const USERNAME: &[&str] = &["username", "Username", "userName", "UserName"];
const EMAIL: &[&str] = &["email", "Email"];
const PASSWORD_HASH: &[&str] = &["passwordHash", "PasswordHash", "password_hash"];
const ROLE: &[&str] = &["role", "Role"];
const ACTIVE: &[&str] = &["active", "Active", "isActive", "IsActive"];
const CREATED_AT: &[&str] = &["createdAt", "CreatedAt", "created_at"];
const BIO: &[&str] = &["bio", "Bio"];
const PROFILE_PICTURE: &[&str] = &["profilePicture", "ProfilePicture", "profilePictureUrl"];

/// Codec for [`User`] directories
#[derive(Debug, Default, Clone, Copy)]
pub struct UserCodec;

impl UserCodec {
    /// Parse a user from the profile document
    ///
    /// `fallback_time` stands in for a missing creation timestamp.
    pub fn from_profile(
        username: Slug,
        text: &str,
        fallback_time: DateTime<Utc>,
    ) -> Result<User> {
        let id = username.as_str();
        let doc = MetaDocument::parse(id, text)?;

        let email = doc
            .string(EMAIL)?
            .ok_or_else(|| Error::corrupt(id, "missing email"))?;
        let password_hash = doc
            .string(PASSWORD_HASH)?
            .ok_or_else(|| Error::corrupt(id, "missing password hash"))?;

        Ok(User {
            email,
            password_hash,
            role: doc.role(ROLE)?.unwrap_or_default(),
            active: doc.boolean(ACTIVE)?.unwrap_or(true),
            created_at: doc.timestamp(CREATED_AT)?.unwrap_or(fallback_time),
            bio: doc.string(BIO)?.filter(|s| !s.is_empty()),
            profile_picture: doc.string(PROFILE_PICTURE)?.filter(|s| !s.is_empty()),
            username,
        })
    }

    /// Serialize the profile document with canonical keys only
    pub fn profile_bytes(user: &User) -> Result<Vec<u8>> {
        let mut fields = Map::new();
        put(&mut fields, USERNAME, &user.username)?;
        put(&mut fields, EMAIL, &user.email)?;
        put(&mut fields, PASSWORD_HASH, &user.password_hash)?;
        put(&mut fields, ROLE, user.role.as_str())?;
        put(&mut fields, ACTIVE, &user.active)?;
        put(&mut fields, CREATED_AT, &user.created_at)?;
        put(&mut fields, BIO, &user.bio)?;
        put(&mut fields, PROFILE_PICTURE, &user.profile_picture)?;
        Ok(serde_json::to_vec_pretty(&Value::Object(fields))?)
    }
}

impl EntityCodec for UserCodec {
    type Entity = User;

    const KIND: &'static str = "user";

    fn id(entity: &User) -> &Slug {
        &entity.username
    }

    fn decode(dir: &Path) -> Result<Option<User>> {
        let path = dir.join(PROFILE_FILE);
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        let username = dir_slug(dir)?;
        let fallback_time = modified_time(&path)?;
        UserCodec::from_profile(username, &text, fallback_time).map(Some)
    }

    fn encode(user: &User, dir: &Path) -> Result<()> {
        let bytes = UserCodec::profile_bytes(user)?;
        write_atomic(&dir.join(PROFILE_FILE), &bytes)?;
        Ok(())
    }

    fn order(a: &User, b: &User) -> Ordering {
        a.username.cmp(&b.username)
    }
}
