use std::collections::HashMap;

use crate::error::NotificationError;
use crate::notifier::RenderedMessage;

/// Well-known template id for account confirmation messages.
pub const TEMPLATE_CONFIRMATION: &str = "confirmation";

/// Well-known template id for password reset messages.
pub const TEMPLATE_RESET: &str = "reset";

/// Simple template renderer using {{variable}} syntax
pub struct TemplateRenderer {
    templates: HashMap<String, Template>,
}

#[derive(Debug, Clone)]
pub struct Template {
    pub id: String,
    pub subject: Option<String>,
    pub body: String,
}

impl Template {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: None,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Creates a renderer preloaded with the broker's built-in templates.
    pub fn with_defaults() -> Self {
        let mut renderer = Self::new();
        renderer.register(
            Template::new(
                TEMPLATE_CONFIRMATION,
                "Hello {{username}}, confirm your account with key {{key}} before {{deadline}}.",
            )
            .with_subject("Confirm your account"),
        );
        renderer.register(
            Template::new(
                TEMPLATE_RESET,
                "Hello {{username}}, reset your password with key {{key}} before {{deadline}}.",
            )
            .with_subject("Reset your password"),
        );
        renderer
    }

    pub fn register(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, template_id: &str) -> Option<&Template> {
        self.templates.get(template_id)
    }

    pub fn render(
        &self,
        template_id: &str,
        data: &HashMap<String, serde_json::Value>,
    ) -> Result<RenderedMessage, NotificationError> {
        let template = self
            .templates
            .get(template_id)
            .ok_or(NotificationError::TemplateNotFound(template_id.to_string()))?;

        let subject = template
            .subject
            .as_ref()
            .map(|s| self.render_string(s, data));
        let body = self.render_string(&template.body, data);

        Ok(RenderedMessage { subject, body })
    }

    fn render_string(&self, template: &str, data: &HashMap<String, serde_json::Value>) -> String {
        let mut result = template.to_string();

        for (key, value) in data {
            let placeholder = format!("{{{{{}}}}}", key);
            let replacement = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Null => String::new(),
                _ => value.to_string(),
            };
            result = result.replace(&placeholder, &replacement);
        }

        result
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::json!(v)))
            .collect()
    }

    #[test]
    fn test_render_substitutes_variables() {
        let renderer = TemplateRenderer::with_defaults();
        let rendered = renderer
            .render(
                TEMPLATE_RESET,
                &vars(&[
                    ("username", "alice"),
                    ("key", "k-123"),
                    ("deadline", "2026-01-01"),
                ]),
            )
            .unwrap();

        assert_eq!(rendered.subject.as_deref(), Some("Reset your password"));
        assert!(rendered.body.contains("alice"));
        assert!(rendered.body.contains("k-123"));
        assert!(!rendered.body.contains("{{"));
    }

    #[test]
    fn test_render_unknown_template() {
        let renderer = TemplateRenderer::new();
        let err = renderer.render("nope", &HashMap::new()).unwrap_err();
        assert!(matches!(err, NotificationError::TemplateNotFound(_)));
    }

    #[test]
    fn test_register_custom_template() {
        let mut renderer = TemplateRenderer::new();
        renderer.register(Template::new("welcome", "Welcome {{username}}!"));
        let rendered = renderer
            .render("welcome", &vars(&[("username", "bob")]))
            .unwrap();
        assert_eq!(rendered.body, "Welcome bob!");
        assert!(rendered.subject.is_none());
    }
}
