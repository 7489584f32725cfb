use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    domain::notification::NotificationRequest,
    ports::{database::DatabasePort, email::EmailPort},
};
use tower::Service;
use tracing::{error, info, warn};

use super::{DomainLogic, Error};

/// Dispatch one validated notification
///
/// Responds with `true` if the transport accepted the email. Transport errors, rejections and
/// timeouts all come back as `false`; nothing is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendNotificationRequest {
    pub notification: NotificationRequest,
}

impl From<NotificationRequest> for SendNotificationRequest {
    fn from(notification: NotificationRequest) -> Self {
        Self { notification }
    }
}

impl<D, E> Service<SendNotificationRequest> for DomainLogic<D, E>
where
    D: DatabasePort + ?Sized + 'static,
    E: EmailPort + ?Sized + 'static,
{
    type Response = bool;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SendNotificationRequest) -> Self::Future {
        let email = self.email.clone();
        let limit = self.settings.port_timeout;
        Box::pin(async move {
            let notification = req.notification;
            let kind = notification.kind();
            let to = notification.recipient();

            let sent = match tokio::time::timeout(limit, email.send(kind, &notification)).await {
                Ok(Ok(true)) => {
                    info!(template = kind.as_str(), to = %to, "notification sent");
                    true
                }
                Ok(Ok(false)) => {
                    warn!(template = kind.as_str(), to = %to, "notification declined by transport");
                    false
                }
                Ok(Err(err)) => {
                    error!(template = kind.as_str(), to = %to, "notification failed: {err}");
                    false
                }
                Err(_) => {
                    error!(template = kind.as_str(), to = %to, timeout = ?limit, "notification timed out");
                    false
                }
            };

            Ok(sent)
        })
    }
}
