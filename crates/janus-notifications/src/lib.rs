//! # janus-notifications
//!
//! Best-effort notification collaborator for the Janus identity broker.
//!
//! The broker triggers out-of-band messages (confirmation keys, reset keys)
//! through the [`Notifier`] trait. Delivery is fire-and-forget relative to
//! state mutation: the security property "key exists with a deadline" must
//! hold even if delivery fails.

pub mod adapters;
pub mod error;
pub mod notifier;
pub mod templates;

pub use adapters::{MemoryNotifier, RecordedNotification, TracingNotifier};
pub use error::NotificationError;
pub use notifier::{Notifier, RenderedMessage};
pub use templates::{TEMPLATE_CONFIRMATION, TEMPLATE_RESET, Template, TemplateRenderer};
