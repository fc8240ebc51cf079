use reqwest::multipart::Form;
use serde_json::{Map, Value};

/// Ordered set of form fields for a POST body.
///
/// Empty values are dropped on insert, the upstream API treats a present but
/// empty field differently from a missing one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    fields: Vec<(String, String)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.fields.push((name.to_string(), value));
        }
        self
    }

    pub fn opt_field(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    /// Build from an arbitrary JSON object, as sent by the generic proxy.
    ///
    /// Strings are taken as-is, numbers and booleans are stringified, `null`
    /// and nested values are skipped.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        map.iter().fold(Self::new(), |acc, (k, v)| match v {
            Value::String(s) => acc.field(k, s.as_str()),
            Value::Number(n) => acc.field(k, n.to_string()),
            Value::Bool(b) => acc.field(k, b.to_string()),
            _ => acc,
        })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::new(), |acc, (k, v)| acc.field(k, v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_multipart(self) -> Form {
        self.fields
            .into_iter()
            .fold(Form::new(), |form, (k, v)| form.text(k, v))
    }
}
