//! Ownership checks
//!
//! The caller identity comes from the authentication layer and is trusted.
//! These checks only decide whether that identity may touch an entity.

use quire_core::{Caller, Error, Post, Result, Slug};

/// Allow the post's author and admins
pub fn ensure_can_modify(caller: &Caller, post: &Post) -> Result<()> {
    if caller.is_admin() || caller.username == post.author {
        return Ok(());
    }
    Err(Error::Unauthorized(format!(
        "{} may not modify post {} by {}",
        caller.username, post.slug, post.author
    )))
}

/// Allow the account owner and admins
pub fn ensure_can_manage_user(caller: &Caller, username: &Slug) -> Result<()> {
    if caller.is_admin() || &caller.username == username {
        return Ok(());
    }
    Err(Error::Unauthorized(format!(
        "{} may not manage account {}",
        caller.username, username
    )))
}
