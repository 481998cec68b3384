//! Create-or-update routing.
//!
//! Existence is checked before anything is written; there is no "try update,
//! fall back to create". The decision itself is [`Resolution::decide`], a
//! pure function, so the branch can be tested without a store.

use crate::entities::{Record, UnitOfWork};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<R> {
    /// No stored row: `incoming` is written as a new record.
    Create(R),
    /// A stored row exists and `incoming` is merged into it.
    Update { existing: R, incoming: R },
}

impl<R> Resolution<R> {
    pub fn decide(existing: Option<R>, incoming: R) -> Self {
        match existing {
            None => Resolution::Create(incoming),
            Some(existing) => Resolution::Update { existing, incoming },
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Resolution::Create(_))
    }
}

/// Look `incoming` up in the current unit of work and decide which path it
/// takes.
pub async fn resolve<R: Record>(uow: &mut UnitOfWork<'_>, incoming: R) -> Result<Resolution<R>> {
    let existing = if uow.exists::<R>(incoming.id()).await? {
        Some(uow.get::<R>(incoming.id()).await?)
    } else {
        None
    };
    Ok(Resolution::decide(existing, incoming))
}
