//! Per-type mapping of legacy field records to target field definitions.
//!
//! Every record first gets the base mapping (label, identity type, required,
//! token-rewritten default, description); its legacy type then selects
//! exactly one override rule.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::DecodeError;
use crate::models::{LegacyFieldRecord, TargetFieldDefinition, TargetType};
use crate::payload::{decode_extra, ExtraOptions};

/// 12-hour clock, hour without leading zero, AM/PM.
pub const TIME_FORMAT: &str = "g:i A";

pub const PREV_BUTTON_LABEL: &str = "Prev";
pub const NEXT_BUTTON_LABEL: &str = "Next";

/// Legacy placeholder tokens and their target equivalents.
const TOKEN_REWRITES: &[(&str, &str)] = &[
    ("%username", "[current-user:display-name]"),
    ("[current-user:name]", "[current-user:display-name]"),
    ("%useremail", "[current-user:mail]"),
    ("[current-user:profile-location]", "[current-user:field_location]"),
    ("[current-user:profile-title]", "[current-user:field_title]"),
    ("%title", "[webform_submission:source-entity:title]"),
    ("[node:title]", "[webform_submission:source-entity:title]"),
];

/// Rewrite a whole value that is exactly one known legacy token.
///
/// This is a lookup, not a parser: values that merely contain a token are
/// passed through unchanged.
pub fn token_rewrite(value: &str) -> String {
    TOKEN_REWRITES
        .iter()
        .find(|(legacy, _)| *legacy == value)
        .map_or_else(|| value.to_string(), |(_, target)| (*target).to_string())
}

/// A mapped field.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedField {
    pub definition: TargetFieldDefinition,
    /// Grid sub-element keys produced by more than one question. The last
    /// question is kept.
    pub collisions: Vec<String>,
}

/// Map one legacy field record, decoding its extra payload.
pub fn map_field(record: &LegacyFieldRecord) -> Result<MappedField, DecodeError> {
    let extra = decode_extra(&record.extra_payload)?;
    Ok(map_with_extra(record, &extra))
}

/// Map one legacy field record with an already decoded payload.
pub fn map_with_extra(record: &LegacyFieldRecord, extra: &ExtraOptions) -> MappedField {
    let mut definition = TargetFieldDefinition {
        key: record.key.clone(),
        label: record.display_name.clone(),
        target_type: TargetType::from(record.field_type.as_str()),
        required: record.is_required,
        default_value: Some(token_rewrite(&record.default_value)),
        description: extra.description().into_owned(),
        properties: Map::new(),
        children: IndexMap::new(),
    };
    let mut collisions = Vec::new();

    match record.field_type.as_str() {
        "select" => map_select(&mut definition, extra),
        "file" => definition.target_type = TargetType::ManagedFile,
        "time" => {
            definition.target_type = TargetType::Time;
            definition
                .properties
                .insert("time_format".into(), json!(TIME_FORMAT));
        }
        "markup" => {
            definition.target_type = TargetType::Markup;
            definition
                .properties
                .insert("admin_title".into(), json!(definition.label));
            definition
                .properties
                .insert("markup".into(), json!(record.default_value));
            definition.default_value = None;
        }
        "pagebreak" => {
            definition.target_type = TargetType::WizardPage;
            let properties = &mut definition.properties;
            properties.insert("open".into(), json!(true));
            properties.insert("prev_button_label".into(), json!(PREV_BUTTON_LABEL));
            properties.insert("next_button_label".into(), json!(NEXT_BUTTON_LABEL));
        }
        "grid" => collisions = map_grid(&mut definition, extra),
        _ => {}
    }

    MappedField {
        definition,
        collisions,
    }
}

/// Radios, checkboxes or select depending on item count and list flags.
pub fn select_type(extra: &ExtraOptions) -> TargetType {
    let count = nonempty_lines(&extra.items()).count();
    let multiple = extra.multiple();
    let aslist = extra.aslist();

    if (count == 1 && multiple) || (!multiple && !aslist) {
        TargetType::Radios
    } else if count > 1 && multiple && !aslist {
        TargetType::Checkboxes
    } else {
        TargetType::Select
    }
}

fn map_select(definition: &mut TargetFieldDefinition, extra: &ExtraOptions) {
    definition.target_type = select_type(extra);
    definition
        .properties
        .insert("options".into(), Value::Object(parse_options(&extra.items())));
    if definition.target_type == TargetType::Select && extra.multiple() {
        definition.properties.insert("multiple".into(), json!(true));
    }
}

/// Parse `key|label` option lines. Plain lines are both key and label,
/// `<Group>` header lines are dropped.
pub fn parse_options(items: &str) -> Map<String, Value> {
    let mut options = Map::new();
    for line in nonempty_lines(items) {
        let line = line.trim();
        if line.starts_with('<') && line.ends_with('>') {
            continue;
        }
        match line.split_once('|') {
            Some((key, label)) => options.insert(key.trim().to_string(), json!(label.trim())),
            None => options.insert(line.to_string(), json!(line)),
        };
    }
    options
}

/// Expand a grid into one radios sub-element per question, returning the
/// keys that more than one question mapped to.
fn map_grid(definition: &mut TargetFieldDefinition, extra: &ExtraOptions) -> Vec<String> {
    definition.target_type = TargetType::CustomComposite;
    for flag in [
        "allow_multiple",
        "multiple_header",
        "multiple_sorting",
        "multiple_operations",
    ] {
        definition.properties.insert(flag.into(), json!(false));
    }

    let options: Map<String, Value> = nonempty_lines(&extra.options())
        .map(|value| (value.clone(), Value::String(value)))
        .collect();

    let mut elements = Map::new();
    let mut collisions = Vec::new();
    for question in nonempty_lines(&extra.questions()) {
        let key = element_key(&question);
        let element = json!({
            "type": TargetType::Radios.as_str(),
            "label": question,
            "options": options,
        });
        // Last write wins; the collision is surfaced, not repaired.
        if elements.insert(key.clone(), element).is_some() {
            collisions.push(key);
        }
    }
    definition
        .properties
        .insert("element".into(), Value::Object(elements));
    collisions
}

/// Derive a sub-element key from a grid question.
///
/// Trims, keeps ASCII letters, digits and spaces, lower-cases and turns
/// spaces into underscores: `"Rate 1-5!"` becomes `"rate_15"`.
pub fn element_key(question: &str) -> String {
    question
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .to_lowercase()
        .replace(' ', "_")
}

/// Lines of a newline delimited legacy list with CRs stripped and blank
/// lines dropped.
pub(crate) fn nonempty_lines(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split('\n')
        .map(|line| line.replace('\r', ""))
        .filter(|line| !line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(field_type: &str, extra: &str) -> LegacyFieldRecord {
        LegacyFieldRecord {
            legacy_id: 1,
            parent_legacy_id: 0,
            key: "field_1".into(),
            display_name: "Field one".into(),
            field_type: field_type.into(),
            is_required: true,
            default_value: String::new(),
            weight: 0,
            extra_payload: extra.as_bytes().to_vec(),
        }
    }

    fn select(items: &str, multiple: bool, aslist: bool) -> TargetType {
        let extra = ExtraOptions::from_map(
            json!({"items": items, "multiple": multiple, "aslist": aslist})
                .as_object()
                .cloned()
                .unwrap(),
        );
        select_type(&extra)
    }

    #[test]
    fn test_select_disambiguation() {
        assert_eq!(select("a", true, false), TargetType::Radios);
        assert_eq!(select("a", true, true), TargetType::Radios);
        assert_eq!(select("a\nb", false, false), TargetType::Radios);
        assert_eq!(select("", false, false), TargetType::Radios);
        assert_eq!(select("a\nb", true, false), TargetType::Checkboxes);
        assert_eq!(select("a\r\nb\r\n", true, false), TargetType::Checkboxes);
        assert_eq!(select("a\nb", true, true), TargetType::Select);
        assert_eq!(select("a\nb", false, true), TargetType::Select);
        assert_eq!(select("", true, false), TargetType::Select);
    }

    #[test]
    fn test_blank_item_lines_do_not_count() {
        assert_eq!(select("a\n\n\r\n", true, false), TargetType::Radios);
    }

    #[test]
    fn test_select_options_and_multiple_flag() {
        let definition = map_field(&record(
            "select",
            r#"{"items": "<Fruit>\nap|Apple\r\npear\n", "multiple": 1, "aslist": 1}"#,
        ))
        .unwrap()
        .definition;
        assert_eq!(definition.target_type, TargetType::Select);
        assert_eq!(
            definition.property("options"),
            Some(&json!({"ap": "Apple", "pear": "pear"}))
        );
        assert_eq!(definition.property("multiple"), Some(&json!(true)));
    }

    #[test]
    fn test_base_mapping() {
        let mut legacy = record("textfield", r#"{"description": "Your name"}"#);
        legacy.default_value = "%username".into();
        let mapped = map_field(&legacy).unwrap();
        assert!(mapped.collisions.is_empty());

        let definition = mapped.definition;
        assert_eq!(definition.key, "field_1");
        assert_eq!(definition.label, "Field one");
        assert_eq!(definition.target_type, TargetType::Other("textfield".into()));
        assert!(definition.required);
        assert_eq!(
            definition.default_value.as_deref(),
            Some("[current-user:display-name]")
        );
        assert_eq!(definition.description, "Your name");
        assert!(definition.properties.is_empty());
    }

    #[test]
    fn test_token_rewrite_is_exact() {
        assert_eq!(token_rewrite("[node:title]"), "[webform_submission:source-entity:title]");
        assert_eq!(token_rewrite("[current-user:profile-location]"), "[current-user:field_location]");
        assert_eq!(token_rewrite("Hello %username"), "Hello %username");
        assert_eq!(token_rewrite(""), "");
    }

    #[test]
    fn test_file_and_time() {
        let file = map_field(&record("file", "")).unwrap().definition;
        assert_eq!(file.target_type, TargetType::ManagedFile);

        let time = map_field(&record("time", "")).unwrap().definition;
        assert_eq!(time.target_type, TargetType::Time);
        assert_eq!(time.property("time_format"), Some(&json!("g:i A")));
    }

    #[test]
    fn test_markup_clears_default_and_sets_admin_title() {
        let mut legacy = record("markup", "");
        legacy.default_value = "<p>Thanks for %title</p>".into();
        let definition = map_field(&legacy).unwrap().definition;

        assert_eq!(definition.target_type, TargetType::Markup);
        assert_eq!(definition.default_value, None);
        assert_eq!(definition.property("admin_title"), Some(&json!("Field one")));
        assert_eq!(
            definition.property("markup"),
            Some(&json!("<p>Thanks for %title</p>"))
        );
    }

    #[test]
    fn test_pagebreak() {
        let definition = map_field(&record("pagebreak", "")).unwrap().definition;
        assert_eq!(definition.target_type, TargetType::WizardPage);
        assert_eq!(definition.property("open"), Some(&json!(true)));
        assert_eq!(definition.property("prev_button_label"), Some(&json!("Prev")));
        assert_eq!(definition.property("next_button_label"), Some(&json!("Next")));
    }

    #[test]
    fn test_element_key() {
        assert_eq!(element_key("How was it?"), "how_was_it");
        assert_eq!(element_key("Rate 1-5!"), "rate_15");
        assert_eq!(element_key("  Clean?  "), "clean");
        assert_eq!(element_key("Ünïcode stays out"), "ncode_stays_out");
    }

    #[test]
    fn test_grid_expansion() {
        let mapped = map_field(&record(
            "grid",
            r#"{"options": "Yes\r\nNo\r\n", "questions": "Clean?\r\nFast?"}"#,
        ))
        .unwrap();
        assert!(mapped.collisions.is_empty());

        let definition = mapped.definition;
        assert_eq!(definition.target_type, TargetType::CustomComposite);
        assert_eq!(definition.property("allow_multiple"), Some(&json!(false)));
        assert_eq!(definition.property("multiple_operations"), Some(&json!(false)));
        assert_eq!(
            definition.property("element"),
            Some(&json!({
                "clean": {"type": "radios", "label": "Clean?", "options": {"Yes": "Yes", "No": "No"}},
                "fast": {"type": "radios", "label": "Fast?", "options": {"Yes": "Yes", "No": "No"}},
            }))
        );
    }

    #[test]
    fn test_grid_key_collision_last_wins() {
        let mapped = map_field(&record(
            "grid",
            r#"{"options": "1", "questions": "Clean?\nclean!"}"#,
        ))
        .unwrap();
        assert_eq!(mapped.collisions, vec!["clean".to_string()]);

        let elements = mapped
            .definition
            .property("element")
            .and_then(Value::as_object)
            .unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements["clean"]["label"], json!("clean!"));
    }

    #[test]
    fn test_undecodable_payload() {
        let err = map_field(&record("select", "a:1:{")).unwrap_err();
        assert!(err.message.contains("unexpected end"));
    }
}
