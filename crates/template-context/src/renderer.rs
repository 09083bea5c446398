//! The rendering pipeline backing §4.B step 1's `(template, context) →
//! artifact` contract. Template authoring and a full rendering engine are
//! out of scope (§1); this is the minimal pipeline that makes the contract
//! callable.

use handlebars::Handlebars;
use serde_json::Value;
use thiserror::Error;
use ticket_store::NotificationTemplate;

use crate::context::RenderContext;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("template produced invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// The three rendered artifacts the dispatcher produces per notification.
/// Any field that renders to empty is treated as absent — the channel that
/// would have used it falls back to its own built-in default format.
#[derive(Debug, Clone, Default)]
pub struct RenderedArtifacts {
    pub card: Option<Value>,
    pub email: Option<(String, String)>,
    pub sms: Option<String>,
}

impl RenderedArtifacts {
    fn is_blank(s: &str) -> bool {
        s.trim().is_empty()
    }
}

/// Renders a `(template, context)` pair into the three artifact slots.
pub trait TemplateRenderer: Send + Sync {
    fn render(
        &self,
        template: Option<&NotificationTemplate>,
        context: &RenderContext,
    ) -> Result<RenderedArtifacts, RenderError>;
}

/// Handlebars-backed renderer with a built-in fallback format used when no
/// template is bound to the project, or when a template field is absent.
pub struct HandlebarsRenderer {
    engine: Handlebars<'static>,
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        let mut engine = Handlebars::new();
        engine.set_strict_mode(false);
        Self { engine }
    }
}

impl HandlebarsRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn render_str(&self, template: &str, context: &RenderContext) -> Result<String, RenderError> {
        Ok(self.engine.render_template(template, context)?)
    }

    fn built_in_card(context: &RenderContext) -> Value {
        serde_json::json!({
            "title": context.ticket.title,
            "severity": context.ticket.severity,
            "description": context.ticket.description,
            "notification_label": context.notification_label,
            "ack_url": context.ack_url,
            "detail_url": context.detail_url,
        })
    }

    fn built_in_email(context: &RenderContext) -> (String, String) {
        let subject = format!("[{}] {}", context.ticket.severity, context.ticket.title);
        let body = format!(
            "{}\n\n{}\n\nAcknowledge: {}\nDetails: {}",
            context.ticket.title, context.ticket.description, context.ack_url, context.detail_url
        );
        (subject, body)
    }

    fn built_in_sms(context: &RenderContext) -> String {
        format!(
            "[{}] {} {}",
            context.ticket.severity, context.ticket.title, context.ack_url
        )
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(
        &self,
        template: Option<&NotificationTemplate>,
        context: &RenderContext,
    ) -> Result<RenderedArtifacts, RenderError> {
        let Some(template) = template else {
            return Ok(RenderedArtifacts {
                card: Some(Self::built_in_card(context)),
                email: Some(Self::built_in_email(context)),
                sms: Some(Self::built_in_sms(context)),
            });
        };

        let card = match &template.card_template {
            Some(src) if !RenderedArtifacts::is_blank(src) => {
                let rendered = self.render_str(src, context)?;
                if RenderedArtifacts::is_blank(&rendered) {
                    None
                } else {
                    Some(serde_json::from_str(&rendered)?)
                }
            }
            _ => None,
        }
        .or_else(|| Some(Self::built_in_card(context)));

        let email_subject = template
            .email_subject_template
            .as_deref()
            .filter(|s| !RenderedArtifacts::is_blank(s))
            .map(|src| self.render_str(src, context))
            .transpose()?;
        let email_body = template
            .email_body_template
            .as_deref()
            .filter(|s| !RenderedArtifacts::is_blank(s))
            .map(|src| self.render_str(src, context))
            .transpose()?;
        let email = match (email_subject, email_body) {
            (Some(subject), Some(body))
                if !RenderedArtifacts::is_blank(&subject) && !RenderedArtifacts::is_blank(&body) =>
            {
                Some((subject, body))
            }
            _ => Some(Self::built_in_email(context)),
        };

        let sms = match &template.sms_template {
            Some(src) if !RenderedArtifacts::is_blank(src) => {
                let rendered = self.render_str(src, context)?;
                if RenderedArtifacts::is_blank(&rendered) {
                    Some(Self::built_in_sms(context))
                } else {
                    Some(rendered)
                }
            }
            _ => Some(Self::built_in_sms(context)),
        };

        Ok(RenderedArtifacts { card, email, sms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{build_context, RenderFlags};
    use std::collections::HashMap;
    use ticket_store::Ticket;
    use uuid::Uuid;

    fn context() -> RenderContext {
        let ticket = Ticket::new(
            Uuid::new_v4(),
            "custom",
            serde_json::json!({}),
            None,
            HashMap::new(),
            "disk full",
            "95% used",
            "critical",
        );
        build_context(&ticket, None, RenderFlags::default(), Some(1), "", "http://localhost:5032")
    }

    #[test]
    fn falls_back_to_built_in_format_with_no_template() {
        let renderer = HandlebarsRenderer::new();
        let artifacts = renderer.render(None, &context()).unwrap();
        assert!(artifacts.card.is_some());
        assert!(artifacts.email.is_some());
        assert!(artifacts.sms.is_some());
        assert!(artifacts.sms.unwrap().contains("disk full"));
    }

    #[test]
    fn renders_template_fields_when_present() {
        let renderer = HandlebarsRenderer::new();
        let now = chrono::Utc::now();
        let template = NotificationTemplate {
            id: Uuid::new_v4(),
            name: "t".into(),
            is_default: true,
            card_template: None,
            email_subject_template: Some("Alert: {{ticket.title}}".into()),
            email_body_template: Some("Body: {{ticket.description}}".into()),
            sms_template: Some("SMS {{ticket.title}}".into()),
            created_at: now,
            updated_at: now,
        };
        let artifacts = renderer.render(Some(&template), &context()).unwrap();
        let (subject, body) = artifacts.email.unwrap();
        assert_eq!(subject, "Alert: disk full");
        assert_eq!(body, "Body: 95% used");
        assert_eq!(artifacts.sms.unwrap(), "SMS disk full");
    }
}
