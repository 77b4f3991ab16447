//! Form definitions handed to the host for rendering, and input parsing.
//!
//! Input arrives as a JSON object keyed by field name. Unknown keys are
//! rejected and missing optional keys take the field default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use enocean_core::constants::{CONF_NAME, CONF_URL, CONF_USE_ADDON, DEFAULT_USE_ADDON};
use enocean_core::{Error, Result};

use crate::step::FlowStep;

/// User-supplied form values.
pub type UserInput = Map<String, Value>;

/// Type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Boolean,
}

/// One field of a form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl FieldSchema {
    /// Required string field with a default value.
    pub fn required_string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::String,
            required: true,
            default: Some(Value::String(default.into())),
        }
    }

    /// Optional boolean field with a default value.
    pub fn optional_bool(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Boolean,
            required: false,
            default: Some(Value::Bool(default)),
        }
    }
}

/// Request to render a form for a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRequest {
    pub step_id: FlowStep,
    pub fields: Vec<FieldSchema>,
    pub errors: BTreeMap<String, String>,
    pub description_placeholders: BTreeMap<String, String>,
}

impl FormRequest {
    pub fn new(step_id: FlowStep, fields: Vec<FieldSchema>) -> Self {
        Self {
            step_id,
            fields,
            errors: BTreeMap::new(),
            description_placeholders: BTreeMap::new(),
        }
    }

    /// Attach an error code to a field.
    pub fn with_error(mut self, field: impl Into<String>, code: impl Into<String>) -> Self {
        self.errors.insert(field.into(), code.into());
        self
    }

    /// Attach a description placeholder.
    pub fn with_placeholder(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.description_placeholders
            .insert(key.into(), value.into());
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Default value of a field, if the field exists and has one.
    pub fn default_of(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(|f| f.default.as_ref())
    }
}

/// Manual step form, prefilled with `default_url`.
pub fn manual_form(default_url: &str) -> FormRequest {
    FormRequest::new(
        FlowStep::Manual,
        vec![FieldSchema::required_string(CONF_URL, default_url)],
    )
}

/// Supervisor add-on offer form.
pub fn on_supervisor_form() -> FormRequest {
    FormRequest::new(
        FlowStep::OnSupervisor,
        vec![FieldSchema::optional_bool(CONF_USE_ADDON, DEFAULT_USE_ADDON)],
    )
}

/// USB confirmation form, no fields, showing the device title.
pub fn usb_confirm_form(title: Option<&str>) -> FormRequest {
    let form = FormRequest::new(FlowStep::UsbConfirm, Vec::new());
    match title {
        Some(title) => form.with_placeholder(CONF_NAME, title),
        None => form,
    }
}

/// Fail on any key not listed in `allowed`.
pub(crate) fn reject_unknown_fields(input: &UserInput, allowed: &[&str]) -> Result<()> {
    match input.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(Error::invalid_input(key.as_str(), "unexpected field")),
        None => Ok(()),
    }
}

/// Read an optional string field.
pub(crate) fn optional_str<'a>(input: &'a UserInput, key: &str) -> Result<Option<&'a str>> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(Error::invalid_input(
            key,
            format!("expected a string, got {other}"),
        )),
    }
}

/// Read an optional boolean field.
pub(crate) fn optional_bool(input: &UserInput, key: &str) -> Result<Option<bool>> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(Error::invalid_input(
            key,
            format!("expected a boolean, got {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> UserInput {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    #[test]
    fn test_manual_form_defaults() {
        let form = manual_form("ws://localhost:3000");
        assert_eq!(form.step_id, FlowStep::Manual);
        assert_eq!(form.fields.len(), 1);

        let field = form.field(CONF_URL).unwrap();
        assert_eq!(field.kind, FieldKind::String);
        assert!(field.required);
        assert_eq!(form.default_of(CONF_URL), Some(&json!("ws://localhost:3000")));
        assert!(form.errors.is_empty());
    }

    #[test]
    fn test_on_supervisor_form_defaults_to_addon() {
        let form = on_supervisor_form();
        let field = form.field(CONF_USE_ADDON).unwrap();
        assert_eq!(field.kind, FieldKind::Boolean);
        assert!(!field.required);
        assert_eq!(form.default_of(CONF_USE_ADDON), Some(&json!(true)));
    }

    #[test]
    fn test_usb_confirm_form_placeholder() {
        let form = usb_confirm_form(Some("USB 300"));
        assert!(form.fields.is_empty());
        assert_eq!(
            form.description_placeholders.get(CONF_NAME).map(String::as_str),
            Some("USB 300")
        );
        assert!(usb_confirm_form(None).description_placeholders.is_empty());
    }

    #[test]
    fn test_form_serialization_shape() {
        let form = manual_form("ws://localhost:3000").with_error(CONF_URL, "invalid_url");
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["step_id"], "manual");
        assert_eq!(json["fields"][0]["kind"], "string");
        assert_eq!(json["errors"]["url"], "invalid_url");
    }

    #[test]
    fn test_optional_str() {
        let values = input(json!({"url": "ws://x", "n": null, "bad": 3}));
        assert_eq!(optional_str(&values, "url").unwrap(), Some("ws://x"));
        assert_eq!(optional_str(&values, "n").unwrap(), None);
        assert_eq!(optional_str(&values, "missing").unwrap(), None);
        assert!(matches!(
            optional_str(&values, "bad"),
            Err(Error::InvalidInput { field, .. }) if field == "bad"
        ));
    }

    #[test]
    fn test_optional_bool() {
        let values = input(json!({"a": true, "b": false, "bad": "yes"}));
        assert_eq!(optional_bool(&values, "a").unwrap(), Some(true));
        assert_eq!(optional_bool(&values, "b").unwrap(), Some(false));
        assert_eq!(optional_bool(&values, "missing").unwrap(), None);
        assert!(optional_bool(&values, "bad").is_err());
    }

    #[test]
    fn test_reject_unknown_fields() {
        let values = input(json!({"url": "ws://x", "extra": 1}));
        assert!(reject_unknown_fields(&values, &[CONF_URL, "extra"]).is_ok());
        assert!(matches!(
            reject_unknown_fields(&values, &[CONF_URL]),
            Err(Error::InvalidInput { field, .. }) if field == "extra"
        ));
    }
}
