//! Tracing-backed notification adapter.
//!
//! Renders the template and emits the result as a structured log event.
//! Useful as a default when no delivery channel is configured.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::NotificationError;
use crate::notifier::Notifier;
use crate::templates::TemplateRenderer;

/// Notifier that logs rendered messages instead of delivering them.
pub struct TracingNotifier {
    renderer: TemplateRenderer,
}

impl TracingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            renderer: TemplateRenderer::with_defaults(),
        }
    }

    #[must_use]
    pub fn with_renderer(renderer: TemplateRenderer) -> Self {
        Self { renderer }
    }
}

impl Default for TracingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(
        &self,
        address: &str,
        template_id: &str,
        variables: &HashMap<String, serde_json::Value>,
    ) -> Result<(), NotificationError> {
        let rendered = self.renderer.render(template_id, variables)?;
        tracing::info!(
            address = %address,
            template = %template_id,
            subject = rendered.subject.as_deref().unwrap_or(""),
            "notification dispatched"
        );
        Ok(())
    }
}
