//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Backend credentials
//!
//! Credentials arrive already decrypted. They are immutable once built and
//! never printed: `Debug` redacts every secret.

use sha2::{Digest, Sha256};
use std::fmt;

/// Username/password or token pair
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Username and password (also used for access key id / secret key pairs)
    UsernamePassword { username: String, password: String },

    /// Bearer/API token
    Token(String),
}

impl Credential {
    pub fn username_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential::UsernamePassword {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Credential::Token(token.into())
    }

    /// Identity used to key connection handles: the username, or a digest of
    /// the token. Never contains a secret.
    pub fn identity(&self) -> String {
        match self {
            Credential::UsernamePassword { username, .. } => format!("user:{}", username),
            Credential::Token(token) => format!("token:{}", short_digest(&[token.as_str()])),
        }
    }

    /// Digest over the full credential, secrets included. Changes whenever
    /// any part of the credential changes.
    pub fn fingerprint(&self) -> String {
        match self {
            Credential::UsernamePassword { username, password } => {
                short_digest(&["password", username.as_str(), password.as_str()])
            }
            Credential::Token(token) => short_digest(&["token", token.as_str()]),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credential::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

/// First 16 hex characters of the SHA-256 over the NUL-joined parts
pub(crate) fn short_digest(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let cred = Credential::username_password("cassandra", "hunter2");
        let rendered = format!("{:?}", cred);
        assert!(rendered.contains("cassandra"));
        assert!(!rendered.contains("hunter2"));

        let token = Credential::token("sf-secret-token");
        assert!(!format!("{:?}", token).contains("sf-secret-token"));
    }

    #[test]
    fn test_identity_excludes_secret() {
        let token = Credential::token("abc123");
        assert!(token.identity().starts_with("token:"));
        assert!(!token.identity().contains("abc123"));
        assert_eq!(
            Credential::username_password("u", "p").identity(),
            "user:u"
        );
    }

    #[test]
    fn test_fingerprint_tracks_password_changes() {
        let a = Credential::username_password("u", "old");
        let b = Credential::username_password("u", "new");
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }
}
