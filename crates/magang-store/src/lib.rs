//! # magang-store
//!
//! Embedded local data store for the magang back office.
//!
//! Persists ~40 named collections as versioned JSON envelopes in a
//! synchronous string-keyed medium, with stamped CRUD, a typed
//! collection factory, and in-process change notification so the UI
//! layer can re-render on writes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Collection<T>  (typed CRUD per entity kind) │
//! ├──────────────────────────────────────────────┤
//! │  StoreContext   (envelopes, stamping,        │
//! │                  namespacing, ChangeBus)     │
//! ├──────────────────────────────────────────────┤
//! │  Medium         (MemoryMedium | SqliteMedium)│
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```
//! use magang_store::{StoreContext, names};
//! use serde_json::json;
//!
//! let ctx = StoreContext::builder().build();
//! let siswa = ctx.create(names::SISWA, json!({"nama": "Ahmad"}));
//! assert!(ctx.find(names::SISWA, siswa["id"].as_str().unwrap()).is_some());
//! ```
//!
//! Not a transactional database: there is no multi-key atomicity and no
//! isolation between concurrent writers sharing one medium (the later
//! full-snapshot write wins). Filtering is a linear scan; workable at
//! the hundreds-to-low-thousands of records this application holds per
//! collection.

pub mod bus;
pub mod collection;
pub mod context;
pub mod error;
pub mod medium;
pub mod names;

// ── re-exports ───────────────────────────────────────────────────────

pub use bus::{ChangeEvent, Subscription};
pub use collection::Collection;
pub use context::{Envelope, SCHEMA_VERSION, StoreContext, StoreContextBuilder, iso_now};
pub use error::{StoreError, StoreResult};
pub use medium::{Medium, MemoryMedium, SqliteMedium};
