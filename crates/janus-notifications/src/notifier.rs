//! The notification collaborator boundary.
//!
//! The broker never talks to a mail server itself; it hands rendered
//! messages to a [`Notifier`]. Delivery is best-effort with respect to state
//! changes: a failed send must never roll back an already-persisted key or
//! deadline.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::NotificationError;

/// Rendered message content produced by the template renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: Option<String>,
    pub body: String,
}

/// Sends rendered notifications to an address.
///
/// Implementations are external collaborators (SMTP relay, webhook, ...).
/// The broker ships a tracing-backed adapter and an in-memory adapter for
/// tests.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a notification built from the named template.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or delivery fails. Callers treat the
    /// error as best-effort: it is logged and swallowed, never propagated
    /// into the state change that triggered the notification.
    async fn send(
        &self,
        address: &str,
        template_id: &str,
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<(), NotificationError>;
}
