//! Persistence layer.
//!
//! [`Store`] owns the SQLite pool and hands out [`UnitOfWork`] handles. A
//! handle wraps one transaction: repository calls take it by `&mut`, and
//! nothing is persisted unless [`UnitOfWork::commit`] is reached. Dropping a
//! handle (early `?` return, cancelled future) rolls the transaction back.
//!
//! Users, mapsets and beatmaps implement [`Record`], which gives the
//! reconciliation code one generic `exists / get / create / update` surface
//! over all three tables.

pub mod beatmap;
pub mod dao;
pub mod following;
pub mod mapset;
pub mod track;
pub mod user;

pub use dao::{Beatmap, Following, Mapset, TrackRun, User};

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{CoreError, Result};

/// The kinds of stored rows errors can refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    User,
    Mapset,
    Beatmap,
    Following,
}

/// Ranked-state of a mapset or beatmap, as reported by the osu! API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RankStatus {
    Graveyard,
    Wip,
    Pending,
    Ranked,
    Approved,
    Qualified,
    Loved,
}

/// A tracked row that carries a statistics history.
///
/// The SQL lives with each implementation; [`UnitOfWork`] wraps it with
/// access checks and error mapping.
pub trait Record: Sized + Send + Sync + Unpin + 'static {
    const KIND: EntityKind;

    fn id(&self) -> i64;

    /// Persisted statistics history (JSON text).
    fn stats(&self) -> &str;

    fn set_stats(&mut self, stats: String);

    fn created_at(&self) -> DateTime<Utc>;

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

    fn exists_in(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> impl Future<Output = std::result::Result<bool, sqlx::Error>> + Send;

    fn fetch_from(
        conn: &mut SqliteConnection,
        id: i64,
    ) -> impl Future<Output = std::result::Result<Option<Self>, sqlx::Error>> + Send;

    fn insert_into(
        &self,
        conn: &mut SqliteConnection,
    ) -> impl Future<Output = std::result::Result<(), sqlx::Error>> + Send;

    fn update_in(
        &self,
        conn: &mut SqliteConnection,
    ) -> impl Future<Output = std::result::Result<u64, sqlx::Error>> + Send;
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// SQLite-backed storage for tracked users.
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://playcount.db"`
    /// or `"sqlite::memory:"` for tests. In-memory databases are pinned to a
    /// single connection so every handle sees the same data.
    pub async fn connect(url: &str) -> Result<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Begin a unit of work that only reads.
    pub async fn read_only(&self) -> Result<UnitOfWork<'static>> {
        Ok(UnitOfWork {
            tx: self.pool.begin().await?,
            access: Access::ReadOnly,
        })
    }

    /// Begin a unit of work that may write. Changes are kept only if
    /// [`UnitOfWork::commit`] is called.
    ///
    /// The write lock is taken up front, so two writers queue on the busy
    /// timeout instead of failing when one upgrades its read.
    pub async fn read_write(&self) -> Result<UnitOfWork<'static>> {
        Ok(UnitOfWork {
            tx: self.pool.begin_with("BEGIN IMMEDIATE").await?,
            access: Access::ReadWrite,
        })
    }
}

// ── UnitOfWork ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// One transaction scoped to the handle's lifetime.
#[derive(Debug)]
pub struct UnitOfWork<'c> {
    tx: Transaction<'c, Sqlite>,
    access: Access,
}

impl UnitOfWork<'_> {
    pub fn access(&self) -> Access {
        self.access
    }

    /// Persist every write made through this handle.
    ///
    /// A read-only handle has nothing to persist and is simply closed.
    pub async fn commit(self) -> Result<()> {
        match self.access {
            Access::ReadWrite => self.tx.commit().await?,
            Access::ReadOnly => self.tx.rollback().await?,
        }
        Ok(())
    }

    /// Discard every write made through this handle.
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Raw connection for entity queries. Writers must call
    /// [`ensure_writable`](Self::ensure_writable) first.
    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        match self.access {
            Access::ReadWrite => Ok(()),
            Access::ReadOnly => Err(CoreError::ReadOnly),
        }
    }

    pub async fn exists<R: Record>(&mut self, id: i64) -> Result<bool> {
        Ok(R::exists_in(&mut self.tx, id).await?)
    }

    /// Load a record, failing with [`CoreError::NotFound`] when absent.
    pub async fn get<R: Record>(&mut self, id: i64) -> Result<R> {
        R::fetch_from(&mut self.tx, id)
            .await?
            .ok_or(CoreError::NotFound { kind: R::KIND, id })
    }

    /// Insert a new record. A taken primary key is reported as
    /// [`CoreError::AlreadyExists`].
    pub async fn create<R: Record>(&mut self, record: &R) -> Result<()> {
        self.ensure_writable()?;
        record
            .insert_into(&mut self.tx)
            .await
            .map_err(|e| unique_violation(e, R::KIND, record.id()))
    }

    /// Overwrite a stored record. Fails with [`CoreError::NotFound`] when no
    /// row was touched.
    pub async fn update<R: Record>(&mut self, record: &R) -> Result<()> {
        self.ensure_writable()?;
        match record.update_in(&mut self.tx).await? {
            0 => Err(CoreError::NotFound {
                kind: R::KIND,
                id: record.id(),
            }),
            _ => Ok(()),
        }
    }
}

pub(crate) fn unique_violation(e: sqlx::Error, kind: EntityKind, id: i64) -> CoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CoreError::AlreadyExists { kind, id }
        }
        _ => CoreError::Database(e),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
