//! Error types for the auth crate.
//!
//! Credential and session failures are ordinary values returned to the
//! caller — the UI renders them inline — so every operation surfaces
//! them through [`AuthResult`] rather than panicking. A record that is
//! simply absent is an `Option`/`bool`, not an error.

/// Unified error type for the session and credential subsystem.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Sign-up attempted with an email that already has a credential
    /// record (compared case-insensitively).
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The email that collided.
        email: String,
    },

    /// Unknown email or wrong password. Deliberately one variant for
    /// both so callers cannot tell which check failed.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Malformed input (empty email, empty password).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Password hashing failed (e.g. the system RNG was unavailable).
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The credential record could not be written or read back.
    #[error("credential storage failed: {0}")]
    Storage(String),
}

/// Convenience alias used throughout this crate.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
