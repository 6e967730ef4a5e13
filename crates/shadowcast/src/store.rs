//! Single-slot repositories for the latest configuration and scene.
//!
//! Each `get` / `upsert` is atomic on its own; a `get` followed by an
//! `upsert` is not. The context is checked before the lock is touched so a
//! cancelled request never waits on, or writes through, the lock.

use parking_lot::RwLock;

use crate::config::Configuration;
use crate::ctx::Ctx;
use crate::error::Result;
use crate::scene::Scene;

/// Key-less store holding at most one value; last write wins.
pub trait Repository<T>: Send + Sync {
    /// Current value, `None` before the first upsert.
    fn get(&self, ctx: &Ctx) -> Result<Option<T>>;

    /// Replace the stored value and return what is now stored.
    fn upsert(&self, ctx: &Ctx, value: T) -> Result<T>;
}

pub type SceneRepository = dyn Repository<Scene>;
pub type ConfigRepository = dyn Repository<Configuration>;

/// In-memory repository guarded by a reader/writer lock.
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    slot: RwLock<Option<T>>,
}

impl<T> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> Repository<T> for InMemoryRepository<T> {
    fn get(&self, ctx: &Ctx) -> Result<Option<T>> {
        ctx.check()?;
        Ok(self.slot.read().clone())
    }

    fn upsert(&self, ctx: &Ctx, value: T) -> Result<T> {
        ctx.check()?;
        let mut slot = self.slot.write();
        *slot = Some(value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::polygon::Polygon;
    use crate::vector::point;

    fn config() -> Configuration {
        Configuration::new(
            800.0,
            500.0,
            point(250.0, 300.0),
            vec![Polygon::new(vec![
                point(600.0, 200.0),
                point(646.0, 133.0),
                point(646.0, 261.0),
            ])],
        )
    }

    #[test]
    fn upsert_then_get() {
        let repo = InMemoryRepository::new();
        let ctx = Ctx::background();
        assert_eq!(repo.get(&ctx), Ok(None));
        let stored = repo.upsert(&ctx, config()).unwrap();
        assert_eq!(stored, config());
        assert_eq!(repo.get(&ctx), Ok(Some(config())));
    }

    #[test]
    fn last_write_wins() {
        let repo = InMemoryRepository::new();
        let ctx = Ctx::background();
        repo.upsert(&ctx, config()).unwrap();
        let mut other = config();
        other.light = point(10.0, 10.0);
        repo.upsert(&ctx, other.clone()).unwrap();
        assert_eq!(repo.get(&ctx).unwrap(), Some(other));
    }

    #[test]
    fn cancelled_context_is_rejected_before_any_access() {
        let repo: InMemoryRepository<Configuration> = InMemoryRepository::new();
        let ctx = Ctx::background();
        ctx.cancel();
        assert_eq!(repo.upsert(&ctx, config()), Err(Error::Cancelled));
        assert_eq!(repo.get(&ctx), Err(Error::Cancelled));
        assert_eq!(repo.get(&Ctx::background()), Ok(None));
    }

    #[test]
    fn usable_as_trait_object() {
        let repo: Box<ConfigRepository> = Box::new(InMemoryRepository::new());
        let ctx = Ctx::background();
        repo.upsert(&ctx, config()).unwrap();
        assert!(repo.get(&ctx).unwrap().is_some());
    }
}
