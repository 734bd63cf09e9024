//! High-level session and credential service.
//!
//! [`AuthService`] owns the credential and role collections plus the
//! reserved session value, and is the primary entry point for sign-up,
//! sign-in, and the application-start credential bootstrap. It is
//! constructed over a [`StoreContext`] once at startup and shared by
//! cloning.
//!
//! Session lifecycle: absent → (sign-in) → active → (expiry elapsed or
//! sign-out) → absent. Expiry is lazy: a stale session is deleted the
//! next time it is read, never by a background timer.

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument, warn};

use magang_store::{Collection, StoreContext, iso_now, names};

use crate::error::{AuthError, AuthResult};
use crate::password;
use crate::types::{LocalUser, LocalUserRole, PublicUser, ROLE_ADMIN, ROLE_USER, Session};

/// Session time-to-live: 24 hours, in milliseconds.
pub const SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Reserved value name for the persisted session. Lives in the same
/// versioned namespace as the collections but is not one of them.
pub const SESSION_KEY: &str = "auth_session";

/// An administrator account guaranteed to exist after bootstrap.
#[derive(Debug, Clone, Copy)]
pub struct DefaultAdmin {
    pub email: &'static str,
    pub password: &'static str,
    pub full_name: &'static str,
}

/// Accounts provisioned by [`AuthService::initialize_default_admin`].
/// Local bootstrap credentials; operators change them after first
/// sign-in.
pub const DEFAULT_ADMINS: &[DefaultAdmin] = &[
    DefaultAdmin {
        email: "admin@magang.id",
        password: "admin#magang",
        full_name: "Administrator",
    },
    DefaultAdmin {
        email: "direktur@magang.id",
        password: "direktur#magang",
        full_name: "Direktur",
    },
];

// ═══════════════════════════════════════════════════════════════════════
//  AuthService
// ═══════════════════════════════════════════════════════════════════════

/// Sign-up / sign-in / session management over the embedded store.
#[derive(Clone)]
pub struct AuthService {
    ctx: StoreContext,
    users: Collection<LocalUser>,
    roles: Collection<LocalUserRole>,
}

impl AuthService {
    /// Create the service over `ctx`.
    pub fn new(ctx: StoreContext) -> Self {
        let users = ctx.collection(names::LOCAL_USERS);
        let roles = ctx.collection(names::LOCAL_USER_ROLES);
        Self { ctx, users, roles }
    }

    fn find_by_email(&self, email: &str) -> Option<LocalUser> {
        self.users
            .query(|user| user.email.eq_ignore_ascii_case(email))
            .into_iter()
            .next()
    }

    // ── registration & authentication ────────────────────────────────

    /// Register a new account.
    ///
    /// Fails with [`AuthError::DuplicateEmail`] when a credential record
    /// already exists for `email` (case-insensitive). On success the
    /// account gets a hashed password and a default `"user"` role; no
    /// session is created — the caller signs in separately.
    #[instrument(skip(self, password))]
    pub fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> AuthResult<PublicUser> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidArgument("email must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidArgument(
                "password must not be empty".into(),
            ));
        }
        if self.find_by_email(email).is_some() {
            return Err(AuthError::DuplicateEmail {
                email: email.to_string(),
            });
        }

        let record = LocalUser {
            id: String::new(),
            email: email.to_string(),
            password_hash: password::hash(password)?,
            full_name: full_name.unwrap_or_default().to_string(),
            avatar_url: None,
            created_at: String::new(),
            updated_at: String::new(),
        };
        let created = self
            .users
            .create(&record)
            .ok_or_else(|| AuthError::Storage("credential record could not be stored".into()))?;

        self.roles.create(&LocalUserRole {
            id: String::new(),
            user_id: created.id.clone(),
            role: ROLE_USER.to_string(),
            created_at: String::new(),
        });

        info!(user_id = %created.id, "account registered");
        Ok(created.public())
    }

    /// Authenticate and open a fresh 24-hour session.
    ///
    /// Unknown email and wrong password both fail with the same
    /// [`AuthError::InvalidCredentials`].
    #[instrument(skip(self, password))]
    pub fn sign_in(&self, email: &str, password: &str) -> AuthResult<PublicUser> {
        let Some(user) = self.find_by_email(email.trim()) else {
            return Err(AuthError::InvalidCredentials);
        };
        if !password::verify(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session {
            user: user.public(),
            access_token: StoreContext::generate_id(),
            expires_at: Utc::now().timestamp_millis() + SESSION_TTL_MS,
        };
        self.ctx.write_value(SESSION_KEY, &session);

        info!(user_id = %session.user.id, "signed in");
        Ok(session.user)
    }

    /// Clear the session unconditionally. Safe to call with none active.
    pub fn sign_out(&self) {
        self.ctx.remove_value(SESSION_KEY);
        debug!("session cleared");
    }

    /// The active session, or `None`.
    ///
    /// A stored session past its expiry is deleted here before `None`
    /// is returned (lazy expiry).
    pub fn session(&self) -> Option<Session> {
        let session: Session = self.ctx.read_value(SESSION_KEY)?;
        if session.is_expired() {
            debug!(user_id = %session.user.id, "session expired, removing");
            self.ctx.remove_value(SESSION_KEY);
            return None;
        }
        Some(session)
    }

    // ── roles ────────────────────────────────────────────────────────

    /// The authoritative role for `user_id`: the first matching
    /// assignment record, if any.
    pub fn user_role(&self, user_id: &str) -> Option<String> {
        self.roles
            .get_one_by_field("user_id", user_id)
            .map(|record| record.role)
    }

    /// Upsert the role for `user_id`: overwrite the first assignment
    /// record when one exists, create one otherwise.
    #[instrument(skip(self))]
    pub fn set_user_role(&self, user_id: &str, role: &str) -> Option<LocalUserRole> {
        match self.roles.get_one_by_field("user_id", user_id) {
            Some(existing) => self.roles.update(&existing.id, json!({ "role": role })),
            None => self.roles.create(&LocalUserRole {
                id: String::new(),
                user_id: user_id.to_string(),
                role: role.to_string(),
                created_at: String::new(),
            }),
        }
    }

    // ── account maintenance ──────────────────────────────────────────

    /// Delete the credential record and every role assignment for
    /// `user_id`. Revokes the active session when it belongs to that
    /// user. Returns whether a credential record was deleted.
    #[instrument(skip(self))]
    pub fn delete_user(&self, user_id: &str) -> bool {
        let removed = self.users.delete(user_id);

        for record in self.roles.query(|role| role.user_id == user_id) {
            self.roles.delete(&record.id);
        }

        if let Some(session) = self.session()
            && session.user.id == user_id
        {
            self.sign_out();
            info!(user_id, "active session revoked for deleted user");
        }

        removed
    }

    /// Replace the stored password hash. Returns whether a credential
    /// record matched.
    #[instrument(skip(self, new_password))]
    pub fn change_password(&self, user_id: &str, new_password: &str) -> AuthResult<bool> {
        if new_password.is_empty() {
            return Err(AuthError::InvalidArgument(
                "password must not be empty".into(),
            ));
        }
        let hash = password::hash(new_password)?;
        Ok(self
            .users
            .update(user_id, json!({ "password_hash": hash }))
            .is_some())
    }

    /// Update display name and/or avatar URL; fields left `None` are
    /// untouched. `None` result when no record matches.
    #[instrument(skip(self))]
    pub fn update_profile(
        &self,
        user_id: &str,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Option<PublicUser> {
        let mut patch = Map::new();
        if let Some(full_name) = full_name {
            patch.insert("full_name".into(), json!(full_name));
        }
        if let Some(avatar_url) = avatar_url {
            patch.insert("avatar_url".into(), json!(avatar_url));
        }
        if patch.is_empty() {
            return self.users.get_by_id(user_id).map(|user| user.public());
        }

        self.users
            .update(user_id, Value::Object(patch))
            .map(|user| user.public())
    }

    /// Every account, hash stripped, newest first.
    pub fn list_users(&self) -> Vec<PublicUser> {
        self.users
            .get_all()
            .into_iter()
            .map(|user| user.public())
            .collect()
    }

    /// Number of credential records.
    pub fn count_users(&self) -> usize {
        self.users.count()
    }

    // ── bootstrap ────────────────────────────────────────────────────

    /// Guarantee that every [`DEFAULT_ADMINS`] account exists, with role
    /// `admin`. Idempotent: accounts whose email is already present are
    /// left untouched, and the collections are written once at the end
    /// only when something was added. Returns how many accounts were
    /// created.
    #[instrument(skip(self))]
    pub fn initialize_default_admin(&self) -> AuthResult<usize> {
        let mut users = self.users.get_all();
        let mut roles = self.roles.get_all();
        let mut created = 0usize;

        for admin in DEFAULT_ADMINS {
            let present = users
                .iter()
                .any(|user| user.email.eq_ignore_ascii_case(admin.email));
            if present {
                continue;
            }

            let user_id = StoreContext::generate_id();
            let now = iso_now();
            users.push(LocalUser {
                id: user_id.clone(),
                email: admin.email.to_string(),
                password_hash: password::hash(admin.password)?,
                full_name: admin.full_name.to_string(),
                avatar_url: None,
                created_at: now.clone(),
                updated_at: now.clone(),
            });
            roles.push(LocalUserRole {
                id: StoreContext::generate_id(),
                user_id,
                role: ROLE_ADMIN.to_string(),
                created_at: now,
            });
            created += 1;
        }

        if created > 0 {
            self.users.set_all(&users);
            self.roles.set_all(&roles);
            info!(created, "default administrator accounts provisioned");
        } else {
            debug!("default administrator accounts already present");
        }
        Ok(created)
    }

    /// Application-start entry point: runs the credential bootstrap.
    /// Reference-data seeding happens elsewhere, after this returns.
    pub fn bootstrap(&self) -> AuthResult<usize> {
        info!("running credential bootstrap");
        let created = self.initialize_default_admin()?;
        if created > 0 {
            warn!(
                created,
                "bootstrap credentials are in use, change them after first sign-in"
            );
        }
        Ok(created)
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(StoreContext::builder().build())
    }

    #[test]
    fn sign_up_then_sign_in() {
        let auth = service();

        let user = auth
            .sign_up("ahmad@contoh.id", "rahasia-123", Some("Ahmad"))
            .unwrap();
        assert_eq!(user.email, "ahmad@contoh.id");
        assert_eq!(user.full_name, "Ahmad");
        assert!(!user.id.is_empty());

        // Sign-up does not open a session.
        assert!(auth.session().is_none());

        let signed_in = auth.sign_in("ahmad@contoh.id", "rahasia-123").unwrap();
        assert_eq!(signed_in.id, user.id);

        let session = auth.session().unwrap();
        assert_eq!(session.user.email, "ahmad@contoh.id");
        assert!(!session.access_token.is_empty());
        assert!(session.expires_at > Utc::now().timestamp_millis());
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let auth = service();
        auth.sign_up("Ahmad@Contoh.id", "rahasia-123", None).unwrap();

        let before = auth.count_users();
        let result = auth.sign_up("ahmad@contoh.id", "lain-456", None);
        assert!(matches!(result, Err(AuthError::DuplicateEmail { .. })));
        assert_eq!(auth.count_users(), before);
    }

    #[test]
    fn sign_in_failures_are_indistinguishable() {
        let auth = service();
        auth.sign_up("ahmad@contoh.id", "rahasia-123", None).unwrap();

        let unknown = auth.sign_in("tidak-ada@contoh.id", "rahasia-123");
        let wrong = auth.sign_in("ahmad@contoh.id", "salah");

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(auth.session().is_none());
    }

    #[test]
    fn empty_inputs_are_rejected_at_sign_up() {
        let auth = service();
        assert!(matches!(
            auth.sign_up("", "rahasia", None),
            Err(AuthError::InvalidArgument(_))
        ));
        assert!(matches!(
            auth.sign_up("a@b.id", "", None),
            Err(AuthError::InvalidArgument(_))
        ));
    }

    #[test]
    fn sign_out_is_idempotent() {
        let auth = service();
        auth.sign_out();

        auth.sign_up("ahmad@contoh.id", "rahasia-123", None).unwrap();
        auth.sign_in("ahmad@contoh.id", "rahasia-123").unwrap();
        assert!(auth.session().is_some());

        auth.sign_out();
        assert!(auth.session().is_none());
        auth.sign_out();
    }

    #[test]
    fn expired_session_is_lazily_removed() {
        let auth = service();
        auth.sign_up("ahmad@contoh.id", "rahasia-123", None).unwrap();
        auth.sign_in("ahmad@contoh.id", "rahasia-123").unwrap();

        // Age the stored session past its expiry.
        let mut session: Session = auth.ctx.read_value(SESSION_KEY).unwrap();
        session.expires_at = Utc::now().timestamp_millis() - 1;
        auth.ctx.write_value(SESSION_KEY, &session);

        assert!(auth.session().is_none());
        // The stale value was deleted, not just hidden.
        assert!(auth.ctx.read_value::<Session>(SESSION_KEY).is_none());
    }

    #[test]
    fn sign_up_assigns_the_default_role() {
        let auth = service();
        let user = auth.sign_up("ahmad@contoh.id", "rahasia-123", None).unwrap();
        assert_eq!(auth.user_role(&user.id).as_deref(), Some(ROLE_USER));
    }

    #[test]
    fn set_user_role_upserts() {
        let auth = service();
        let user = auth.sign_up("ahmad@contoh.id", "rahasia-123", None).unwrap();

        auth.set_user_role(&user.id, ROLE_ADMIN).unwrap();
        assert_eq!(auth.user_role(&user.id).as_deref(), Some(ROLE_ADMIN));

        // Overwrites rather than piling up records.
        assert_eq!(auth.roles.query(|r| r.user_id == user.id).len(), 1);

        // Creates from nothing for an unknown user id.
        auth.set_user_role("u-missing", "staf").unwrap();
        assert_eq!(auth.user_role("u-missing").as_deref(), Some("staf"));
    }

    #[test]
    fn delete_user_cascades_roles_and_revokes_the_session() {
        let auth = service();
        let user = auth.sign_up("ahmad@contoh.id", "rahasia-123", None).unwrap();
        auth.sign_in("ahmad@contoh.id", "rahasia-123").unwrap();

        assert!(auth.delete_user(&user.id));
        assert!(auth.list_users().is_empty());
        assert!(auth.user_role(&user.id).is_none());
        assert!(auth.session().is_none());

        // Second delete finds nothing.
        assert!(!auth.delete_user(&user.id));
    }

    #[test]
    fn delete_user_leaves_another_users_session_alone() {
        let auth = service();
        let target = auth.sign_up("target@contoh.id", "rahasia-123", None).unwrap();
        auth.sign_up("aktif@contoh.id", "rahasia-456", None).unwrap();
        auth.sign_in("aktif@contoh.id", "rahasia-456").unwrap();

        assert!(auth.delete_user(&target.id));
        let session = auth.session().unwrap();
        assert_eq!(session.user.email, "aktif@contoh.id");
    }

    #[test]
    fn change_password_swaps_the_accepted_secret() {
        let auth = service();
        let user = auth.sign_up("ahmad@contoh.id", "lama-123", None).unwrap();

        assert!(auth.change_password(&user.id, "baru-456").unwrap());

        assert!(matches!(
            auth.sign_in("ahmad@contoh.id", "lama-123"),
            Err(AuthError::InvalidCredentials)
        ));
        auth.sign_in("ahmad@contoh.id", "baru-456").unwrap();

        // Unknown user id reports false, empty password is invalid.
        assert!(!auth.change_password("u-missing", "x-1234").unwrap());
        assert!(auth.change_password(&user.id, "").is_err());
    }

    #[test]
    fn update_profile_patches_only_given_fields() {
        let auth = service();
        let user = auth
            .sign_up("ahmad@contoh.id", "rahasia-123", Some("Ahmad"))
            .unwrap();

        let updated = auth
            .update_profile(&user.id, None, Some("https://cdn.contoh.id/a.png"))
            .unwrap();
        assert_eq!(updated.full_name, "Ahmad");
        assert_eq!(
            updated.avatar_url.as_deref(),
            Some("https://cdn.contoh.id/a.png")
        );

        // No fields given: current record, unchanged.
        let same = auth.update_profile(&user.id, None, None).unwrap();
        assert_eq!(same.updated_at, updated.updated_at);

        assert!(auth.update_profile("u-missing", Some("X"), None).is_none());
    }

    #[test]
    fn list_users_never_exposes_hashes() {
        let auth = service();
        auth.sign_up("ahmad@contoh.id", "rahasia-123", None).unwrap();

        let listed = auth.list_users();
        assert_eq!(listed.len(), 1);
        let json = serde_json::to_value(&listed).unwrap();
        assert!(json[0].get("password_hash").is_none());
    }

    #[test]
    fn initialize_default_admin_is_idempotent() {
        let auth = service();

        let first = auth.initialize_default_admin().unwrap();
        assert_eq!(first, DEFAULT_ADMINS.len());
        let after_first = auth.count_users();

        let second = auth.initialize_default_admin().unwrap();
        assert_eq!(second, 0);
        assert_eq!(auth.count_users(), after_first);
    }

    #[test]
    fn default_admins_can_sign_in_with_the_admin_role() {
        let auth = service();
        auth.bootstrap().unwrap();

        let admin = &DEFAULT_ADMINS[0];
        let user = auth.sign_in(admin.email, admin.password).unwrap();
        assert_eq!(auth.user_role(&user.id).as_deref(), Some(ROLE_ADMIN));
    }

    #[test]
    fn bootstrap_fills_gaps_left_by_partial_presence() {
        let auth = service();
        // One of the fixed accounts already exists (different password).
        auth.sign_up(DEFAULT_ADMINS[0].email, "sudah-ada", None).unwrap();

        let created = auth.initialize_default_admin().unwrap();
        assert_eq!(created, DEFAULT_ADMINS.len() - 1);

        // The pre-existing account was left untouched.
        auth.sign_in(DEFAULT_ADMINS[0].email, "sudah-ada").unwrap();
    }
}
