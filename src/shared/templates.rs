//! Notification message templates (Jinja2 syntax via minijinja).
//!
//! Templates live in `templates/notifications/` and are compiled into the
//! binary. Each message has a `.title.jinja` and a `.body.jinja` part.

use minijinja::Environment;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const TEMPLATES: &[(&str, &str)] = &[
    (
        "overdue_reminder.title.jinja",
        include_str!("../../templates/notifications/overdue_reminder.title.jinja"),
    ),
    (
        "overdue_reminder.body.jinja",
        include_str!("../../templates/notifications/overdue_reminder.body.jinja"),
    ),
    (
        "document_uploaded.title.jinja",
        include_str!("../../templates/notifications/document_uploaded.title.jinja"),
    ),
    (
        "document_uploaded.body.jinja",
        include_str!("../../templates/notifications/document_uploaded.body.jinja"),
    ),
    (
        "status_changed.title.jinja",
        include_str!("../../templates/notifications/status_changed.title.jinja"),
    ),
    (
        "status_changed.body.jinja",
        include_str!("../../templates/notifications/status_changed.body.jinja"),
    ),
];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

/// Message kinds with a template pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTemplate {
    OverdueReminder,
    DocumentUploaded,
    StatusChanged,
}

impl MessageTemplate {
    fn stem(&self) -> &'static str {
        match self {
            MessageTemplate::OverdueReminder => "overdue_reminder",
            MessageTemplate::DocumentUploaded => "document_uploaded",
            MessageTemplate::StatusChanged => "status_changed",
        }
    }
}

/// A rendered title/body pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub title: String,
    pub body: String,
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        }
    }
    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

fn render_part<S: Serialize>(name: &str, ctx: &S) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(name)
        .map_err(|_| TemplateError::NotFound(name.to_string()))?;

    template
        .render(ctx)
        .map(|rendered| rendered.trim().to_string())
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

/// Render the title and body of a message.
///
/// # Example
/// ```ignore
/// let message = render_message(
///     MessageTemplate::OverdueReminder,
///     &minijinja::context! { type_name => "Passport", student_name => "Ana" },
/// )?;
/// ```
pub fn render_message<S: Serialize>(
    template: MessageTemplate,
    ctx: &S,
) -> Result<RenderedMessage, TemplateError> {
    let stem = template.stem();
    Ok(RenderedMessage {
        title: render_part(&format!("{}.title.jinja", stem), ctx)?,
        body: render_part(&format!("{}.body.jinja", stem), ctx)?,
    })
}
