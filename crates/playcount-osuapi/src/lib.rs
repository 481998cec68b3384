//! Minimal osu! API v2 client used by the playcount tracker.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DEFAULT_BASE_URL, OsuClient, OsuClientBuilder};
pub use error::OsuApiError;
pub use types::{Beatmap, Beatmapset, MapsetKind, User};
