//! Key layout in the cache/session store.
//!
//! ```text
//! user:<username>          identity snapshot (identity cache)
//! refresh_token:<token>    active refresh token marker
//! blacklisted:<token>      revoked refresh token marker
//! ```

/// Key holding the cached identity snapshot for `username`.
pub fn user_key(username: &str) -> String {
    format!("user:{username}")
}

/// Key marking `token` as an active (issued, not consumed) refresh token.
pub fn refresh_token_key(token: &str) -> String {
    format!("refresh_token:{token}")
}

/// Key marking `token` as revoked.
pub fn blacklisted_token_key(token: &str) -> String {
    format!("blacklisted:{token}")
}

/// Shorten a token for log output. Never log a bearer token in full.
pub fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(10) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}
