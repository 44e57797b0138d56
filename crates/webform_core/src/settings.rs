//! Form level settings and email handlers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Legacy per-form settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyFormSettings {
    /// 1 when the form accepts submissions
    pub status: i64,
    pub confirmation: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationType {
    Page,
    Inline,
    Url,
    UrlMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFormSettings {
    pub status: FormStatus,
    pub confirmation_type: ConfirmationType,
    pub confirmation_message: String,
}

const REDIRECT_CONFIRMATION: &str = "<confirmation>";
const REDIRECT_NONE: &str = "<none>";

pub fn map_form_settings(legacy: &LegacyFormSettings) -> TargetFormSettings {
    let status = if legacy.status == 1 {
        FormStatus::Open
    } else {
        FormStatus::Closed
    };

    let redirect = legacy.redirect_url.as_str();
    let confirmation_type = if redirect == REDIRECT_NONE {
        ConfirmationType::Inline
    } else if redirect != REDIRECT_CONFIRMATION && !legacy.confirmation.is_empty() {
        ConfirmationType::UrlMessage
    } else if redirect != REDIRECT_CONFIRMATION {
        ConfirmationType::Url
    } else {
        ConfirmationType::Page
    };

    TargetFormSettings {
        status,
        confirmation_type,
        confirmation_message: legacy.confirmation.clone(),
    }
}

/// Legacy email notification row.
///
/// `email`, `from_name` and `from_address` hold either a literal value or
/// the id of a component whose submitted value should be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEmailTemplate {
    pub eid: i64,
    pub email: String,
    pub subject: String,
    pub from_name: String,
    pub from_address: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailHandler {
    pub handler_id: String,
    pub to_mail: String,
    pub from_name: String,
    pub from_mail: String,
    pub subject: String,
    pub body: String,
}

/// Build one email handler per legacy template, in template order.
///
/// `component_keys` maps legacy component ids to field keys so component
/// references become submission value tokens.
pub fn map_email_handlers(
    templates: &[LegacyEmailTemplate],
    component_keys: &BTreeMap<i64, String>,
) -> Vec<EmailHandler> {
    templates
        .iter()
        .enumerate()
        .map(|(index, template)| EmailHandler {
            handler_id: if index == 0 {
                "email".to_string()
            } else {
                format!("email_{index}")
            },
            to_mail: component_reference(&template.email, component_keys),
            from_name: component_reference(&template.from_name, component_keys),
            from_mail: component_reference(&template.from_address, component_keys),
            subject: template.subject.clone(),
            body: template
                .template
                .replace("submission:value", "webform_submission:value"),
        })
        .collect()
}

fn component_reference(value: &str, component_keys: &BTreeMap<i64, String>) -> String {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|cid| component_keys.get(&cid))
        .map_or_else(
            || value.to_string(),
            |key| format!("[webform_submission:values:{key}:raw]"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(status: i64, confirmation: &str, redirect: &str) -> TargetFormSettings {
        map_form_settings(&LegacyFormSettings {
            status,
            confirmation: confirmation.into(),
            redirect_url: redirect.into(),
        })
    }

    #[test]
    fn test_status() {
        assert_eq!(settings(1, "", "<confirmation>").status, FormStatus::Open);
        assert_eq!(settings(0, "", "<confirmation>").status, FormStatus::Closed);
    }

    #[test]
    fn test_confirmation_type() {
        assert_eq!(
            settings(1, "Thanks", "<confirmation>").confirmation_type,
            ConfirmationType::Page
        );
        assert_eq!(
            settings(1, "Thanks", "https://example.org/done").confirmation_type,
            ConfirmationType::UrlMessage
        );
        assert_eq!(
            settings(1, "", "https://example.org/done").confirmation_type,
            ConfirmationType::Url
        );
        assert_eq!(settings(1, "Thanks", "<none>").confirmation_type, ConfirmationType::Inline);
        assert_eq!(settings(1, "", "<none>").confirmation_type, ConfirmationType::Inline);
        assert_eq!(settings(1, "Thanks", "<none>").confirmation_message, "Thanks");
    }

    #[test]
    fn test_email_handlers() {
        let keys = BTreeMap::from([(4, "email_address".to_string()), (5, "name".to_string())]);
        let templates = vec![
            LegacyEmailTemplate {
                eid: 1,
                email: "4".into(),
                subject: "New entry".into(),
                from_name: "5".into(),
                from_address: "noreply@example.org".into(),
                template: "Value: [submission:values:name]".into(),
            },
            LegacyEmailTemplate {
                eid: 3,
                email: "admin@example.org".into(),
                subject: "Copy".into(),
                from_name: "Site".into(),
                from_address: "99".into(),
                template: "default".into(),
            },
        ];

        let handlers = map_email_handlers(&templates, &keys);
        assert_eq!(handlers.len(), 2);
        assert_eq!(handlers[0].handler_id, "email");
        assert_eq!(handlers[0].to_mail, "[webform_submission:values:email_address:raw]");
        assert_eq!(handlers[0].from_name, "[webform_submission:values:name:raw]");
        assert_eq!(handlers[0].from_mail, "noreply@example.org");
        assert_eq!(handlers[0].body, "Value: [webform_submission:values:name]");

        assert_eq!(handlers[1].handler_id, "email_1");
        assert_eq!(handlers[1].to_mail, "admin@example.org");
        // Unknown component ids are kept literally
        assert_eq!(handlers[1].from_mail, "99");
    }
}
