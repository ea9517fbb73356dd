//! Core domain types for Curator

mod action;
mod ids;
mod playlist;
mod user;

pub use action::{ActionKind, ActionRecord, ActionStats, NewActionRecord};
pub use ids::UserId;
pub use playlist::{NewPlaylistRef, PlaylistRef};
pub use user::{Credential, NewUser, User, UserUpdate};
