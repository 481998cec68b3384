use chrono::{DateTime, Utc};
use playcount_core::{CardOutcome, Tally, TrackReport};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LastTrackResponse {
    /// `null` until the first pass completes.
    pub tracked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct TallyResponse {
    pub created: usize,
    pub updated: usize,
}

impl From<Tally> for TallyResponse {
    fn from(t: Tally) -> Self {
        Self {
            created: t.created,
            updated: t.updated,
        }
    }
}

/// Rows written by a command or a tracking pass.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct OutcomeResponse {
    pub users: TallyResponse,
    pub mapsets: TallyResponse,
    pub beatmaps: TallyResponse,
}

impl From<CardOutcome> for OutcomeResponse {
    fn from(o: CardOutcome) -> Self {
        Self {
            users: o.users.into(),
            mapsets: o.mapsets.into(),
            beatmaps: o.beatmaps.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackReportResponse {
    pub accounts: usize,
    pub outcome: OutcomeResponse,
    pub finished_at: DateTime<Utc>,
}

impl From<TrackReport> for TrackReportResponse {
    fn from(r: TrackReport) -> Self {
        Self {
            accounts: r.accounts,
            outcome: r.outcome.into(),
            finished_at: r.finished_at,
        }
    }
}
