//! Scalar leaf values.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// A typed leaf value.
///
/// Every variant has a canonical text form (see [`Scalar::as_text`]) which is
/// what text-only formats write and what converters parse back.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Boolean value
    Bool(bool),
    /// Signed integer; narrower widths are range checked by their converters
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Free text
    Text(String),
    /// Enum symbol, matched case-insensitively on input
    Symbol(String),
    /// UUID value
    Uuid(Uuid),
    /// Point in time, rendered as RFC 3339
    Date(DateTime<Utc>),
    /// Name of a declared type
    TypeRef(String),
}

impl Scalar {
    /// Returns the variant name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Text(_) => "text",
            Scalar::Symbol(_) => "symbol",
            Scalar::Uuid(_) => "uuid",
            Scalar::Date(_) => "date",
            Scalar::TypeRef(_) => "type",
        }
    }

    /// Returns the canonical text form.
    ///
    /// ```
    /// # use cfgtree::node::Scalar;
    /// assert_eq!(Scalar::Bool(true).as_text(), "true");
    /// assert_eq!(Scalar::Float(1.0).as_text(), "1.0");
    /// assert_eq!(Scalar::Symbol("FAST".into()).as_text(), "FAST");
    /// ```
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(n) => n.to_string(),
            // Debug keeps the fractional part so "1.0" stays a float in text formats
            Scalar::Float(f) => format!("{f:?}"),
            Scalar::Text(s) | Scalar::Symbol(s) | Scalar::TypeRef(s) => s.clone(),
            Scalar::Uuid(u) => u.hyphenated().to_string(),
            Scalar::Date(d) => d.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    /// Returns the text if this is a text-like scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) | Scalar::Symbol(s) | Scalar::TypeRef(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to read a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to read an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to read a float; integers widen losslessly where possible
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            Scalar::Int(n) => Some(*n as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<Uuid> for Scalar {
    fn from(value: Uuid) -> Self {
        Scalar::Uuid(value)
    }
}

impl From<DateTime<Utc>> for Scalar {
    fn from(value: DateTime<Utc>) -> Self {
        Scalar::Date(value)
    }
}
