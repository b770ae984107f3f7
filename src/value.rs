//! Values, variable definitions and the resolution rules that turn them into
//! the text a template shows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoercionWarning, DefinitionError};
use crate::sanitize::sanitize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
    Null,
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Number(_) => true,
            Value::Null => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Empty string or empty list: set, but with nothing in it.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Text form of the value; lists are joined with `format`.
    pub fn to_text(&self, format: ListFormat) -> String {
        self.render_with(format, |s| s.to_string())
    }

    /// Like [`Value::to_text`] with every string sanitized before joining.
    pub fn to_display(&self, format: ListFormat) -> String {
        self.render_with(format, sanitize)
    }

    fn render_with(&self, format: ListFormat, escape: fn(&str) -> String) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => escape(s),
            Value::List(items) => format.join(items.iter().map(|item| escape(item))),
            Value::Null => String::new(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(str::to_string).collect())
    }
}

/// How a list is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListFormat {
    #[default]
    Comma,
    Newline,
    Numbered,
    Bullet,
}

impl ListFormat {
    pub fn join(self, items: impl Iterator<Item = String>) -> String {
        match self {
            ListFormat::Comma => items.collect::<Vec<_>>().join(", "),
            ListFormat::Newline => items.collect::<Vec<_>>().join("\n"),
            ListFormat::Numbered => items
                .enumerate()
                .map(|(i, item)| format!("{}. {}", i + 1, item))
                .collect::<Vec<_>>()
                .join("\n"),
            ListFormat::Bullet => items
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Shorthand for joining plain strings with a format.
pub fn format_list(items: &[String], format: ListFormat) -> String {
    format.join(items.iter().cloned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableType {
    #[default]
    Text,
    Textarea,
    Select,
    Number,
    Slider,
    Array,
    MultiSelect,
}

impl VariableType {
    pub fn is_list(self) -> bool {
        matches!(self, VariableType::Array | VariableType::MultiSelect)
    }
}

/// A declared placeholder, as authored in a prompt's front matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    pub key: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: VariableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ListFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

pub const MAX_KEY_LEN: usize = 50;

impl VariableDefinition {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: VariableType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            default: None,
            format: None,
            options: None,
        }
    }

    pub fn text(key: impl Into<String>) -> Self {
        let key = key.into();
        let label = key.clone();
        Self::new(key, label, VariableType::Text)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_format(mut self, format: ListFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Check the key against `[A-Za-z0-9_-]{1,50}`.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let valid = !self.key.is_empty()
            && self.key.len() <= MAX_KEY_LEN
            && self
                .key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(DefinitionError::InvalidKey(self.key.clone()))
        }
    }

    fn fallback(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }
}

/// Values supplied for one render call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueContext {
    values: HashMap<String, Value>,
}

impl ValueContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ValueContext {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Where a variable's shown text comes from. Purely for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayState {
    HasExplicitValue,
    UsingDefault,
    UnresolvedPlaceholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    /// The value that was picked, context or default.
    pub raw: Option<&'a Value>,
    /// Formatted text used by comparisons. `None` when unresolved.
    pub text: Option<String>,
    /// Formatted and sanitized text used for output. `None` when unresolved.
    pub display: Option<String>,
    pub state: DisplayState,
    /// The context holds a value for the key, even an empty one.
    pub is_explicitly_set: bool,
    /// The definition carries a default to fall back on.
    pub has_default_fallback: bool,
    pub warning: Option<CoercionWarning>,
}

impl<'a> Resolution<'a> {
    pub fn is_truthy(&self) -> bool {
        self.raw.is_some_and(Value::is_truthy)
    }

    /// Output text, or `placeholder` when nothing resolved.
    pub fn output<'s>(&'s self, placeholder: &'s str) -> &'s str {
        self.display.as_deref().unwrap_or(placeholder)
    }
}

/// Looks keys up in a context, falling back to definition defaults.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    context: &'a ValueContext,
    definitions: HashMap<&'a str, &'a VariableDefinition>,
}

impl<'a> Resolver<'a> {
    pub fn new(context: &'a ValueContext, definitions: &'a [VariableDefinition]) -> Self {
        let mut by_key = HashMap::with_capacity(definitions.len());
        for def in definitions {
            // first definition of a key wins
            by_key.entry(def.key.as_str()).or_insert(def);
        }
        Self {
            context,
            definitions: by_key,
        }
    }

    pub fn definition(&self, key: &str) -> Option<&'a VariableDefinition> {
        self.definitions.get(key).copied()
    }

    pub fn resolve(&self, key: &str) -> Resolution<'a> {
        let def = self.definition(key);
        let fallback = def.and_then(VariableDefinition::fallback);

        let (raw, state) = match self.context.get(key).filter(|v| !v.is_null()) {
            Some(value) => (value, DisplayState::HasExplicitValue),
            None => match fallback {
                Some(value) => (value, DisplayState::UsingDefault),
                None => {
                    return Resolution {
                        raw: None,
                        text: None,
                        display: None,
                        state: DisplayState::UnresolvedPlaceholder,
                        is_explicitly_set: false,
                        has_default_fallback: false,
                        warning: None,
                    }
                }
            },
        };

        let format = def.and_then(|d| d.format).unwrap_or_default();
        let warning = def.and_then(|d| shape_warning(key, d.kind, raw));

        Resolution {
            raw: Some(raw),
            text: Some(raw.to_text(format)),
            display: Some(raw.to_display(format)),
            state,
            is_explicitly_set: state == DisplayState::HasExplicitValue,
            has_default_fallback: fallback.is_some(),
            warning,
        }
    }
}

fn shape_warning(key: &str, kind: VariableType, value: &Value) -> Option<CoercionWarning> {
    match (kind.is_list(), value) {
        (false, Value::List(_)) => Some(CoercionWarning::ListAsScalar {
            key: key.to_string(),
        }),
        (true, Value::List(_)) => None,
        (true, v) if !v.is_empty() => Some(CoercionWarning::ScalarAsList {
            key: key.to_string(),
        }),
        _ => None,
    }
}

/// Resolve one key without keeping a [`Resolver`] around.
pub fn resolve<'a>(
    key: &str,
    context: &'a ValueContext,
    definitions: &'a [VariableDefinition],
) -> Resolution<'a> {
    Resolver::new(context, definitions).resolve(key)
}
