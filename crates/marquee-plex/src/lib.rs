//! Plex Media Server as a session source.

pub mod client;
pub mod error;
pub mod types;

pub use client::PlexClient;
pub use error::PlexError;
