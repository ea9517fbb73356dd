//! Curator Core
//!
//! Domain types, the storage boundary, and storage error handling shared by
//! every Curator crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `Credential`, `PlaylistRef`, `ActionRecord`, etc.
//! - **Repository Traits**: one trait per persisted concern, bundled by `Repositories`
//! - **Error Handling**: the tagged `StoreError` and `StoreResult` types
//!
//! # Example
//!
//! ```rust
//! use curator_core::types::{ActionKind, UserId};
//!
//! let user = UserId::new(7);
//! assert_eq!(user.get(), 7);
//! assert_eq!(ActionKind::Like.as_str(), "like");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod storage;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use storage::{
    ActionRepository, ApprovedPlaylistRepository, ExportCursorRepository, Repositories,
    TargetPlaylistRepository, UserRepository,
};
pub use types::{
    ActionKind, ActionRecord, ActionStats, Credential, NewActionRecord, NewPlaylistRef, NewUser,
    PlaylistRef, User, UserId, UserUpdate,
};
