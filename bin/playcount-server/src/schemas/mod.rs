//! Request and response bodies.
//!
//! Command bodies keep the field names existing clients send (`ID`,
//! `AvatarURL`, PascalCase mapset and beatmap fields). Responses are
//! snake_case and render statistics histories as nested objects.

pub mod admin;
pub mod mapset;
pub mod track;
pub mod user;
pub mod user_card;

use playcount_core::{CoreError, EntityKind, StatsHistory};

/// Decode a stored history for a response body.
pub(crate) fn history(kind: EntityKind, id: i64, raw: &str) -> Result<StatsHistory, CoreError> {
    StatsHistory::parse(raw).map_err(|source| CoreError::MalformedHistory { kind, id, source })
}
