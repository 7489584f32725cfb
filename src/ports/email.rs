use crate::domain::notification::{NotificationRequest, TemplateKind};

#[mockall::automock]
#[async_trait::async_trait]
pub trait EmailPort: Send + Sync {
    /// Send one email rendered from the given template
    ///
    /// Returns `Ok(false)` when the provider declined the message.
    async fn send(&self, kind: TemplateKind, payload: &NotificationRequest) -> Result<bool, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provider refused the message, e.g. an invalid recipient
    #[error("email rejected: {0}")]
    Rejected(String),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
