use crate::{
    domain::{Identity, Pass, PassId},
    ports::database::{DatabasePort, Error},
};
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Mutex, PoisonError},
};

#[derive(Clone, Debug)]
pub struct MemoryDatabase {
    passes: Arc<Mutex<HashMap<PassId, Pass>>>,
}

#[async_trait::async_trait]
impl DatabasePort for MemoryDatabase {
    async fn find_by_identity(&self, identity: &Identity) -> Result<Vec<Pass>, Error> {
        let passes = self
            .passes
            .lock()?
            .values()
            .filter(|pass| identity.matches(pass))
            .cloned()
            .collect();

        Ok(passes)
    }

    async fn find_by_id(&self, pass_id: PassId) -> Result<Option<Pass>, Error> {
        Ok(self.passes.lock()?.get(&pass_id).cloned())
    }

    async fn save(&self, mut pass: Pass) -> Result<Pass, Error> {
        match self.passes.lock()?.entry(pass.id) {
            // Pass already exists
            Entry::Occupied(mut entry) => {
                let stored = entry.get_mut();
                // Reject the write if someone else saved since `pass` was read
                if stored.version != pass.version {
                    return Err(Error::VersionConflict {
                        pass_id: pass.id,
                        expected: pass.version,
                        actual: stored.version,
                    });
                }
                pass.version += 1;
                *stored = pass.clone();
            }
            // New pass
            Entry::Vacant(entry) => {
                if pass.version != 0 {
                    return Err(Error::VersionConflict {
                        pass_id: pass.id,
                        expected: pass.version,
                        actual: 0,
                    });
                }
                pass.version = 1;
                entry.insert(pass.clone());
            }
        }

        Ok(pass)
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self {
            passes: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
