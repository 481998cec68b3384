use thiserror::Error;

use crate::entities::EntityKind;
use crate::stats::HistoryError;

/// Opaque transport/API failure reported by a [`crate::tracker::UserFetcher`].
pub type FetchError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the tracking core.
///
/// Every variant that concerns a stored entity carries its kind and ID so the
/// failing record can be identified from the message alone.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("user '{0}' not found")]
    UnknownUsername(String),

    /// A create-path command hit a row that is already stored.
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: EntityKind, id: i64 },

    #[error("malformed statistics history for {kind} {id}: {source}")]
    MalformedHistory {
        kind: EntityKind,
        id: i64,
        #[source]
        source: HistoryError,
    },

    #[error("failed to fetch user {user_id} from the osu! API: {source}")]
    ExternalFetch {
        user_id: i64,
        #[source]
        source: FetchError,
    },

    #[error("no followed users present in the database")]
    EmptyFollowList,

    /// A polling pass aborted while storing the data of `user_id`.
    #[error("failed to track user {user_id}: {source}")]
    Track {
        user_id: i64,
        #[source]
        source: Box<CoreError>,
    },

    #[error("a tracking pass is already running")]
    TrackInProgress,

    #[error("write attempted on a read-only unit of work")]
    ReadOnly,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl CoreError {
    /// Attach the entity identity to a history failure.
    pub(crate) fn history(kind: EntityKind, id: i64, source: HistoryError) -> Self {
        CoreError::MalformedHistory { kind, id, source }
    }

    /// The innermost error, looking through [`CoreError::Track`] wrappers.
    pub fn root(&self) -> &CoreError {
        match self {
            CoreError::Track { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
