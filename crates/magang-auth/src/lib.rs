//! # magang-auth
//!
//! Session and credential subsystem for the magang back office,
//! layered on the embedded store in `magang-store`.
//!
//! Manages credential records (`local_users`), role assignments
//! (`local_user_roles`), and a single reserved session value with a
//! 24-hour time-to-live and lazy expiry. An idempotent bootstrap
//! guarantees the fixed administrator accounts exist at application
//! start.
//!
//! ## Quick start
//!
//! ```
//! use magang_auth::AuthService;
//! use magang_store::StoreContext;
//!
//! let auth = AuthService::new(StoreContext::builder().build());
//! auth.bootstrap().expect("credential bootstrap");
//!
//! let user = auth.sign_up("ahmad@contoh.id", "rahasia-123", Some("Ahmad"))
//!     .expect("fresh email");
//! auth.sign_in("ahmad@contoh.id", "rahasia-123").expect("valid credentials");
//! assert_eq!(auth.session().unwrap().user.id, user.id);
//! ```
//!
//! Business failures (duplicate email, bad credentials) come back as
//! [`AuthError`] values for inline rendering; nothing here panics or
//! aborts the application.

pub mod error;
mod password;
pub mod service;
pub mod types;

// ── re-exports ───────────────────────────────────────────────────────

pub use error::{AuthError, AuthResult};
pub use service::{AuthService, DEFAULT_ADMINS, DefaultAdmin, SESSION_KEY, SESSION_TTL_MS};
pub use types::{LocalUser, LocalUserRole, PublicUser, ROLE_ADMIN, ROLE_USER, Session};
