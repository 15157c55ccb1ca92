//! In-memory notification adapter for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::NotificationError;
use crate::notifier::Notifier;
use crate::templates::TemplateRenderer;

/// A notification captured by [`MemoryNotifier`].
#[derive(Debug, Clone)]
pub struct RecordedNotification {
    pub address: String,
    pub template_id: String,
    pub variables: HashMap<String, serde_json::Value>,
    pub body: String,
}

/// Notifier that records every send for later inspection.
pub struct MemoryNotifier {
    renderer: TemplateRenderer,
    sent: Mutex<Vec<RecordedNotification>>,
    fail_sends: bool,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            renderer: TemplateRenderer::with_defaults(),
            sent: Mutex::new(Vec::new()),
            fail_sends: false,
        }
    }

    /// Creates a notifier whose sends always fail, for testing the
    /// best-effort delivery contract.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            renderer: TemplateRenderer::with_defaults(),
            sent: Mutex::new(Vec::new()),
            fail_sends: true,
        }
    }

    /// Returns a copy of everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<RecordedNotification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    /// Returns the number of captured notifications.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("notifier mutex poisoned").len()
    }
}

impl Default for MemoryNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(
        &self,
        address: &str,
        template_id: &str,
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<(), NotificationError> {
        if self.fail_sends {
            return Err(NotificationError::SendFailed("delivery refused".into()));
        }
        let rendered = self.renderer.render(template_id, variables)?;
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(RecordedNotification {
                address: address.to_string(),
                template_id: template_id.to_string(),
                variables: variables.clone(),
                body: rendered.body,
            });
        Ok(())
    }
}
