// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Declarative validation of JSON documents.
//!
//! A `Schema` is an ordered list of `Field`s, each describing the JSON type a property must have,
//! whether it must be present, and an ordered list of checks on its value.  Validation is
//! fail-fast: the first violated rule is reported and nothing else is inspected.
//!
//! For every document, the rules are evaluated in this order:
//!
//! 1.  The document must be a JSON object.
//! 1.  The document must not contain properties that the schema does not declare.
//! 1.  Each field, in declaration order, is checked for presence, then for its JSON type, then
//!     against each of its checks in declaration order.  Required strings must also be
//!     non-empty, which is verified after all other checks.

use serde_json::{Number, Value};
use time::OffsetDateTime;

/// Name used in messages that refer to the document as a whole.
const ROOT: &str = "this";

/// Returns the length of `s` in UTF-16 code units, which is how string lengths are measured.
fn length(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Returns true for the characters that a trimmed string cannot start nor end with: whitespace
/// and line terminators, including the byte order mark but excluding the next line control.
fn is_trimmable(c: char) -> bool {
    c == '\u{FEFF}' || (c.is_whitespace() && c != '\u{85}')
}

/// Renders a number with the shortest representation, dropping the fraction of integral values.
fn print_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
        _ => n.to_string(),
    }
}

/// Renders a scalar `value` bare, with strings wrapped in double quotes but not escaped.
fn print_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => print_number(n),
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Replaces every scalar nested in `value` with its bare rendering as a string.
fn stringify_scalars(value: &Value) -> Value {
    match value {
        Value::Array(elements) => Value::Array(elements.iter().map(stringify_scalars).collect()),
        Value::Object(properties) => Value::Object(
            properties.iter().map(|(k, v)| (k.clone(), stringify_scalars(v))).collect(),
        ),
        scalar => Value::String(print_scalar(scalar)),
    }
}

/// Renders `value` for a type mismatch message.
///
/// Scalars are rendered bare.  Arrays and objects are rendered as JSON indented by two spaces in
/// which every nested scalar appears as the string of its bare rendering.
fn print_value(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => {
            let value = stringify_scalars(value);
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
        }
        scalar => print_scalar(scalar),
    }
}

/// A validation failure: the first rule that a document did not satisfy.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct SchemaError {
    /// Name of the offending field, or `this` when the failure concerns the whole document.
    pub path: String,

    /// Human-readable description of the violated rule.
    pub message: String,
}

impl SchemaError {
    /// Creates a new error for `path` whose message is `detail` prefixed by the path.
    fn new<P: Into<String>, D: AsRef<str>>(path: P, detail: D) -> Self {
        let path = path.into();
        let message = format!("{} {}", path, detail.as_ref());
        Self { path, message }
    }
}

/// Result type for this module.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Whether a field must be present in the document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Presence {
    /// The field must be present, not null and, for strings, not empty.
    Required,

    /// The field may be absent but, if present, must not be null.
    Optional,
}

/// JSON types that a field can hold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Kind {
    /// A JSON `true` or `false`.
    Boolean,

    /// Any JSON number, integral or not.
    Number,

    /// A JSON string.
    String,
}

impl Kind {
    /// Returns the name of the kind as used in error messages.
    fn name(self) -> &'static str {
        match self {
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
        }
    }

    /// Returns true if `value` is of this kind.
    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::Boolean => value.is_boolean(),
            Kind::Number => value.is_number(),
            Kind::String => value.is_string(),
        }
    }
}

/// Upper bound for numeric fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bound {
    /// A constant bound.
    Fixed(f64),

    /// The calendar year of the validation time plus the given number of years.
    YearsFromNow(i32),
}

impl Bound {
    /// Computes the bound value relative to `now`.
    fn resolve(self, now: OffsetDateTime) -> f64 {
        match self {
            Bound::Fixed(value) => value,
            Bound::YearsFromNow(delta) => f64::from(now.year() + delta),
        }
    }
}

/// A single rule on the value of a field that already has the right kind.
#[derive(Clone, Debug)]
enum Check {
    /// The string must not change when lowercased.
    Lowercase,

    /// The string must not change when uppercased.
    Uppercase,

    /// The string must have at most this many UTF-16 code units.
    MaxLength(usize),

    /// The string must have exactly this many UTF-16 code units.
    ExactLength(usize),

    /// The string must not have leading nor trailing whitespace.
    Trimmed,

    /// Every character of the string must satisfy the predicate.
    Charset {
        /// Predicate that each character must satisfy.
        accept: fn(&char) -> bool,

        /// Message to report when a character is rejected.
        message: &'static str,
    },

    /// The number must be less than or equal to the bound.
    AtMost(Bound),
}

impl Check {
    /// Evaluates the check against `value`, returning the failure detail if any.
    fn evaluate(&self, value: &Value, now: OffsetDateTime) -> Option<String> {
        match (self, value) {
            (Check::Lowercase, Value::String(s)) if s.to_lowercase() != *s => {
                Some("must be a lowercase string".to_owned())
            }
            (Check::Uppercase, Value::String(s)) if s.to_uppercase() != *s => {
                Some("must be a upper case string".to_owned())
            }
            (Check::MaxLength(max), Value::String(s)) if length(s) > *max => {
                Some(format!("must be at most {} characters", max))
            }
            (Check::ExactLength(len), Value::String(s)) if length(s) != *len => {
                Some(format!("must be exactly {} characters", len))
            }
            (Check::Trimmed, Value::String(s)) if s.trim_matches(is_trimmable) != s.as_str() => {
                Some("must be a trimmed string".to_owned())
            }
            (Check::Charset { accept, message }, Value::String(s))
                if !s.chars().all(|c| accept(&c)) =>
            {
                Some((*message).to_owned())
            }
            (Check::AtMost(bound), Value::Number(n)) => {
                let max = bound.resolve(now);
                match n.as_f64() {
                    Some(n) if n <= max => None,
                    _ => Some(format!("must be less than or equal to {}", max)),
                }
            }
            _ => None,
        }
    }
}

/// Declaration of a single property in a `Schema`.
#[derive(Clone, Debug)]
#[must_use]
pub struct Field {
    /// Name of the property in the JSON document.
    name: &'static str,

    /// JSON type that the property must have.
    kind: Kind,

    /// Whether the property must be present.
    presence: Presence,

    /// Checks to apply to the value, in order.
    checks: Vec<Check>,
}

impl Field {
    /// Creates a new field named `name` of the given `kind`.
    pub fn new(name: &'static str, kind: Kind, presence: Presence) -> Self {
        Self { name, kind, presence, checks: vec![] }
    }

    /// Creates a new string field named `name`.
    pub fn string(name: &'static str, presence: Presence) -> Self {
        Self::new(name, Kind::String, presence)
    }

    /// Creates a new boolean field named `name`.
    pub fn boolean(name: &'static str, presence: Presence) -> Self {
        Self::new(name, Kind::Boolean, presence)
    }

    /// Creates a new number field named `name`.
    pub fn number(name: &'static str, presence: Presence) -> Self {
        Self::new(name, Kind::Number, presence)
    }

    /// Returns the name of the field.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Requires the string to be in lowercase.
    pub fn lowercase(mut self) -> Self {
        self.checks.push(Check::Lowercase);
        self
    }

    /// Requires the string to be in uppercase.
    pub fn uppercase(mut self) -> Self {
        self.checks.push(Check::Uppercase);
        self
    }

    /// Requires the string to be at most `max` characters long.
    pub fn max_length(mut self, max: usize) -> Self {
        self.checks.push(Check::MaxLength(max));
        self
    }

    /// Requires the string to be exactly `len` characters long.
    pub fn exact_length(mut self, len: usize) -> Self {
        self.checks.push(Check::ExactLength(len));
        self
    }

    /// Requires the string to have no leading nor trailing whitespace.
    pub fn trimmed(mut self) -> Self {
        self.checks.push(Check::Trimmed);
        self
    }

    /// Requires every character of the string to satisfy `accept`, reporting `message` otherwise.
    pub fn charset(mut self, accept: fn(&char) -> bool, message: &'static str) -> Self {
        self.checks.push(Check::Charset { accept, message });
        self
    }

    /// Requires the number to be less than or equal to `bound`.
    pub fn at_most(mut self, bound: Bound) -> Self {
        self.checks.push(Check::AtMost(bound));
        self
    }

    /// Validates the property `value`, which is `None` if the property is absent.
    fn validate(&self, value: Option<&Value>, now: OffsetDateTime) -> SchemaResult<()> {
        let value = match (value, self.presence) {
            (None, Presence::Optional) => return Ok(()),
            (None | Some(Value::Null), Presence::Required) => {
                return Err(SchemaError::new(self.name, "is a required field"));
            }
            (Some(Value::Null), Presence::Optional) => {
                return Err(SchemaError::new(self.name, "cannot be null"));
            }
            (Some(value), _) => value,
        };

        if !self.kind.matches(value) {
            return Err(SchemaError::new(
                self.name,
                format!(
                    "must be a `{}` type, but the final value was: `{}`.",
                    self.kind.name(),
                    print_value(value)
                ),
            ));
        }

        for check in &self.checks {
            if let Some(detail) = check.evaluate(value, now) {
                return Err(SchemaError::new(self.name, detail));
            }
        }

        if self.presence == Presence::Required && value.as_str().is_some_and(str::is_empty) {
            return Err(SchemaError::new(self.name, "is a required field"));
        }

        Ok(())
    }
}

/// An ordered collection of field declarations that JSON documents must satisfy.
#[derive(Clone, Debug)]
pub struct Schema {
    /// Declared fields in evaluation order.
    fields: Vec<Field>,
}

impl Schema {
    /// Creates a new schema from its `fields`, which are evaluated in the given order.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Returns the declared fields in evaluation order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Validates `document` against the schema.  Bounds relative to the current date are
    /// computed from `now`.
    pub fn validate(&self, document: &Value, now: OffsetDateTime) -> SchemaResult<()> {
        let Value::Object(properties) = document else {
            return Err(SchemaError::new(
                ROOT,
                format!(
                    "must be a `object` type, but the final value was: `{}`.",
                    print_value(document)
                ),
            ));
        };

        let unknown = properties
            .keys()
            .filter(|key| !self.fields.iter().any(|field| field.name == key.as_str()))
            .map(String::as_str)
            .collect::<Vec<&str>>();
        if !unknown.is_empty() {
            return Err(SchemaError {
                path: ROOT.to_owned(),
                message: format!("unknown property: {}", unknown.join(", ")),
            });
        }

        for field in &self.fields {
            field.validate(properties.get(field.name), now)?;
        }

        Ok(())
    }
}
