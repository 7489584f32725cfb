use crate::domain::{Identity, Pass, PassId};

#[mockall::automock]
#[async_trait::async_trait]
pub trait DatabasePort: Send + Sync {
    /// Every pass owned by either identity key, in no particular order
    async fn find_by_identity(&self, identity: &Identity) -> Result<Vec<Pass>, Error>;
    async fn find_by_id(&self, pass_id: PassId) -> Result<Option<Pass>, Error>;
    /// Insert or update a pass
    ///
    /// The stored version must match `pass.version`, otherwise the save is rejected with
    /// [`Error::VersionConflict`]. On success the returned pass carries the new version.
    async fn save(&self, pass: Pass) -> Result<Pass, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another writer updated the pass since it was read
    #[error("pass {pass_id} was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        pass_id: PassId,
        expected: u64,
        actual: u64,
    },

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
