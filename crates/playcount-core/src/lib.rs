//! Statistics tracking core for osu! mappers.
//!
//! Fresh user data arrives as a [`UserCard`]; the [`coordinator`] reconciles
//! it with the stored rows inside one unit of work, appending a new
//! observation to every statistics history it touches. The [`Tracker`] drives
//! that for every followed user in a polling pass.

pub mod card;
pub mod coordinator;
pub mod entities;
pub mod error;
pub mod resolver;
pub mod stats;
pub mod tracker;

pub use card::{BeatmapSnapshot, MapsetSnapshot, UserCard, UserSnapshot};
pub use coordinator::{CardCommand, CardOutcome, Tally};
pub use entities::{
    Access, Beatmap, EntityKind, Following, Mapset, RankStatus, Record, Store, TrackRun,
    UnitOfWork, User,
};
pub use error::{CoreError, FetchError, Result};
pub use stats::{Snapshot, StatsHistory};
pub use tracker::{TrackReport, Tracker, UserFetcher};
