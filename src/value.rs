//! The datum model: materialized values shaped by a schema.

use std::collections::HashMap;

/// A value whose shape is dictated by a schema.
///
/// There is no union variant: union values are carried directly as the
/// selected branch's datum, and the writer picks the first branch whose
/// validator accepts the value. `fixed` values are `Bytes` of exactly the
/// declared size.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Bytes(Vec<u8>),
    String(String),
    /// A declared enum symbol.
    Enum(String),
    Array(Vec<Datum>),
    Map(HashMap<String, Datum>),
    /// Field name / value pairs, in field order.
    Record(Vec<(String, Datum)>),
}

impl Datum {
    /// Builds a record datum from name/value pairs.
    pub fn record<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Datum)>,
        S: Into<String>,
    {
        Datum::Record(fields.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    /// Looks up a record field by name.
    pub fn get(&self, field: &str) -> Option<&Datum> {
        match self {
            Datum::Record(fields) => fields.iter().find(|(n, _)| n == field).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Returns the datum's shape name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Datum::Null => "null",
            Datum::Boolean(_) => "boolean",
            Datum::Int(_) => "int",
            Datum::Long(_) => "long",
            Datum::Float(_) => "float",
            Datum::Double(_) => "double",
            Datum::Bytes(_) => "bytes",
            Datum::String(_) => "string",
            Datum::Enum(_) => "enum",
            Datum::Array(_) => "array",
            Datum::Map(_) => "map",
            Datum::Record(_) => "record",
        }
    }
}

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Boolean(v)
    }
}

impl From<i32> for Datum {
    fn from(v: i32) -> Self {
        Datum::Int(v)
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Long(v)
    }
}

impl From<f32> for Datum {
    fn from(v: f32) -> Self {
        Datum::Float(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Double(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::String(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::String(v)
    }
}

impl From<Vec<u8>> for Datum {
    fn from(v: Vec<u8>) -> Self {
        Datum::Bytes(v)
    }
}

impl From<&[u8]> for Datum {
    fn from(v: &[u8]) -> Self {
        Datum::Bytes(v.to_vec())
    }
}

impl From<Vec<Datum>> for Datum {
    fn from(v: Vec<Datum>) -> Self {
        Datum::Array(v)
    }
}

impl From<HashMap<String, Datum>> for Datum {
    fn from(v: HashMap<String, Datum>) -> Self {
        Datum::Map(v)
    }
}
