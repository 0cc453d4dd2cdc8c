//! Scoped in-memory mutation with persist-or-restore
//!
//! [`mutate`] is the single-record analogue of a transaction: the block changes
//! the target in memory, and either the whole change survives (and is persisted
//! when asked) or none of it does.

use super::engine::{self, Conversion};
use super::model::Model;
use super::record::Record;
use crate::core::{DatabaseError, DatabaseObject, Result};
use async_trait::async_trait;

/// Something that can write its current state back to its row
#[async_trait]
pub trait Persist: Clone + Send + Sync {
    /// Update the stored row from the in-memory state
    async fn persist(&mut self, db: &dyn DatabaseObject) -> Result<()>;
}

#[async_trait]
impl Persist for Record {
    async fn persist(&mut self, db: &dyn DatabaseObject) -> Result<()> {
        engine::update(db, self, Conversion::Typed).await.map(|_| ())
    }
}

#[async_trait]
impl<M: Model> Persist for M {
    async fn persist(&mut self, db: &dyn DatabaseObject) -> Result<()> {
        self.update(db).await.map(|_| ())
    }
}

/// Run `block` against `target`, restoring the prior state if it fails
///
/// With `persist` set, a successful block is followed by an update; if that
/// update fails the prior state is restored too. The error is returned
/// unchanged in both cases.
///
/// # Example
///
/// ```ignore
/// mutate(&db, &mut basket, true, |basket| {
///     basket.fruits.push(Fruit::Apple);
///     Ok::<_, DatabaseError>(())
/// })
/// .await?;
/// ```
pub async fn mutate<R, T, E, F>(
    db: &dyn DatabaseObject,
    target: &mut R,
    persist: bool,
    block: F,
) -> std::result::Result<T, E>
where
    R: Persist,
    F: FnOnce(&mut R) -> std::result::Result<T, E> + Send,
    E: From<DatabaseError>,
{
    let snapshot = target.clone();

    let output = match block(target) {
        Ok(output) => output,
        Err(e) => {
            *target = snapshot;
            return Err(e);
        }
    };

    if persist {
        if let Err(e) = target.persist(db).await {
            tracing::debug!(error = %e, "persist failed, restoring previous state");
            *target = snapshot;
            return Err(e.into());
        }
    }
    Ok(output)
}
