use tracing::{info, warn};

use crate::{
    domain::notification::{NotificationRequest, TemplateKind},
    ports::email::{EmailPort, Error},
};

/// Email transport that writes messages to the log instead of sending them
///
/// Used for local development, where no mail provider is configured.
#[derive(Clone, Debug)]
pub struct ConsoleEmail {
    from_address: String,
}

impl ConsoleEmail {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

#[async_trait::async_trait]
impl EmailPort for ConsoleEmail {
    async fn send(&self, kind: TemplateKind, payload: &NotificationRequest) -> Result<bool, Error> {
        let to = payload.recipient();
        // A real provider would bounce these
        if !to.contains('@') {
            warn!(to = %to, template = kind.as_str(), "declining email to invalid address");
            return Ok(false);
        }

        info!(
            from = %self.from_address,
            to = %to,
            template = kind.as_str(),
            subject = %payload.subject(),
            "email (console transport)\n{}",
            payload.body()
        );

        Ok(true)
    }
}
