//! Credential, role, and session record shapes.

use serde::{Deserialize, Serialize};

/// Role granted to freshly signed-up accounts.
pub const ROLE_USER: &str = "user";

/// Role granted to bootstrapped administrator accounts.
pub const ROLE_ADMIN: &str = "admin";

/// A credential record as persisted in the `local_users` collection.
///
/// The `password_hash` never crosses the crate boundary; public
/// operations return [`PublicUser`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalUser {
    /// Unique identifier, stamped by the store.
    #[serde(default)]
    pub id: String,
    /// Login email; unique case-insensitively, enforced at sign-up.
    pub email: String,
    /// `base64(salt):base64(hash)` PBKDF2 string.
    pub password_hash: String,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
    /// Optional avatar image URL.
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Stamped by the store on create.
    #[serde(default)]
    pub created_at: String,
    /// Stamped by the store on every write.
    #[serde(default)]
    pub updated_at: String,
}

impl LocalUser {
    /// The externally visible shape of this record.
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

/// A credential record with the hash stripped — the only user shape
/// returned by the public API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A role assignment in the `local_user_roles` collection.
///
/// More than one record may exist per user; the first match wins on
/// lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalUserRole {
    #[serde(default)]
    pub id: String,
    /// The user this role belongs to.
    pub user_id: String,
    /// Role name, e.g. [`ROLE_USER`] or [`ROLE_ADMIN`].
    pub role: String,
    #[serde(default)]
    pub created_at: String,
}

/// The active session, held as a single reserved value rather than a
/// collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The signed-in user, hash already stripped.
    pub user: PublicUser,
    /// Opaque bearer token for this session.
    pub access_token: String,
    /// Expiry as epoch milliseconds.
    pub expires_at: i64,
}

impl Session {
    /// Whether this session's expiry has passed.
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp_millis() >= self.expires_at
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_projection_drops_the_hash() {
        let user = LocalUser {
            id: "u-1".into(),
            email: "a@b.id".into(),
            password_hash: "salt:hash".into(),
            full_name: "Ahmad".into(),
            avatar_url: None,
            created_at: "t0".into(),
            updated_at: "t0".into(),
        };

        let public = user.public();
        assert_eq!(public.id, "u-1");
        assert_eq!(public.email, "a@b.id");

        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn session_expiry_is_a_strict_time_check() {
        let user = PublicUser {
            id: "u-1".into(),
            email: "a@b.id".into(),
            full_name: String::new(),
            avatar_url: None,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let live = Session {
            user: user.clone(),
            access_token: "t".into(),
            expires_at: chrono::Utc::now().timestamp_millis() + 60_000,
        };
        assert!(!live.is_expired());

        let stale = Session {
            user,
            access_token: "t".into(),
            expires_at: chrono::Utc::now().timestamp_millis() - 1,
        };
        assert!(stale.is_expired());
    }
}
