//! Curator Spotify Client
//!
//! The outbound mediation layer between the curator and the Spotify Web API.
//!
//! # Features
//!
//! - Per-user access token refresh, lazy on expiry and forced on 401
//! - A single fetcher with explicit retry policies for rate limiting
//! - Read-through caches with request coalescing and stale fallback
//! - Authorization-code login helpers
//!
//! All state is held by [`SpotifyClient`]; clone it into request handlers.

pub mod cache;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod oauth;
pub mod token;
pub mod types;

pub use cache::{CacheTtls, CatalogCache, ReadThroughCache};
pub use client::SpotifyClient;
pub use error::{Result, SpotifyError};
pub use fetcher::{ApiRequest, Fetcher, RetryPolicy};
pub use oauth::OAuthClient;
pub use token::TokenManager;
pub use types::{
    PlaybackContext, PlaybackState, PlaylistSummary, SpotifyConfig, TokenResponse, TrackItem,
    UserProfile,
};
