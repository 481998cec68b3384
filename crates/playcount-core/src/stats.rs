//! Append-only statistics histories.
//!
//! A history is persisted as a JSON object keyed by RFC 3339 observation
//! timestamps, each value being an object of integer counters:
//!
//! ```json
//! {"2023-12-24T12:00:00Z": {"play_count": 52, "favourite_count": 2}}
//! ```
//!
//! [`append`] is the only way a new observation enters a persisted history.
//! Keys that are already present are never removed or rewritten; a key read
//! from storage is written back with its original spelling.

use std::collections::btree_map::{BTreeMap, Entry};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while reading or writing a persisted history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The stored text is not a timestamp → counters object.
    #[error("malformed statistics history: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to encode statistics history: {0}")]
    Encode(#[source] serde_json::Error),
}

/// One observation of named counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, i64>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style counter insertion.
    pub fn with(mut self, counter: impl Into<String>, value: i64) -> Self {
        self.0.insert(counter.into(), value);
        self
    }

    pub fn get(&self, counter: &str) -> Option<i64> {
        self.0.get(counter).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

/// Time-ordered observations of a single entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsHistory {
    entries: BTreeMap<DateTime<Utc>, Snapshot>,
    /// Stored spelling of keys that came from persisted text.
    keys: BTreeMap<DateTime<Utc>, String>,
}

impl StatsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding exactly one observation.
    pub fn first(observed_at: DateTime<Utc>, snapshot: Snapshot) -> Self {
        let mut history = Self::new();
        history.insert(observed_at, snapshot);
        history
    }

    /// Parse the persisted form. Empty text and JSON `null` are an empty
    /// history.
    pub fn parse(raw: &str) -> Result<Self, HistoryError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::new());
        }
        let parsed: Option<Self> = serde_json::from_str(raw).map_err(HistoryError::Malformed)?;
        Ok(parsed.unwrap_or_default())
    }

    /// Record `snapshot` under `observed_at`.
    ///
    /// Returns `false` and leaves the history untouched when the timestamp
    /// is already present.
    pub fn insert(&mut self, observed_at: DateTime<Utc>, snapshot: Snapshot) -> bool {
        match self.entries.entry(observed_at) {
            Entry::Vacant(slot) => {
                slot.insert(snapshot);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, observed_at: &DateTime<Utc>) -> Option<&Snapshot> {
        self.entries.get(observed_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Observations in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&DateTime<Utc>, &Snapshot)> {
        self.entries.iter()
    }

    /// The most recent observation, if any.
    pub fn latest(&self) -> Option<(&DateTime<Utc>, &Snapshot)> {
        self.entries.last_key_value()
    }

    /// Encode into the persisted JSON form.
    pub fn to_json(&self) -> Result<String, HistoryError> {
        serde_json::to_string(self).map_err(HistoryError::Encode)
    }
}

/// Merge a new observation into a persisted history.
///
/// Every entry of `existing` is carried over unchanged. If `observed_at` is
/// already a key, the stored observation wins and `snapshot` is discarded.
pub fn append(
    existing: &str,
    observed_at: DateTime<Utc>,
    snapshot: Snapshot,
) -> Result<StatsHistory, HistoryError> {
    let mut history = StatsHistory::parse(existing)?;
    history.insert(observed_at, snapshot);
    Ok(history)
}

/// Observation timestamps are kept at whole-second precision.
pub fn observation_time(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(0)
}

fn format_key(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl Serialize for StatsHistory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(at, snapshot)| {
            let key = self.keys.get(at).cloned().unwrap_or_else(|| format_key(at));
            (key, snapshot)
        }))
    }
}

impl<'de> Deserialize<'de> for StatsHistory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Snapshot>::deserialize(deserializer)?;
        let mut entries = BTreeMap::new();
        let mut keys = BTreeMap::new();
        for (key, snapshot) in raw {
            let at = DateTime::parse_from_rfc3339(&key)
                .map_err(|e| de::Error::custom(format_args!("invalid timestamp key {key:?}: {e}")))?
                .with_timezone(&Utc);
            // Two spellings of the same instant would otherwise collapse into one.
            if entries.insert(at, snapshot).is_some() {
                return Err(de::Error::custom(format_args!("duplicate timestamp key {key:?}")));
            }
            keys.insert(at, key);
        }
        Ok(StatsHistory { entries, keys })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
