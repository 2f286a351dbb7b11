//! Schema model: the recursive type descriptions that direct encoding,
//! decoding, and resolution.
//!
//! Schemas are built programmatically and immutable afterwards; encoders and
//! decoders only ever borrow them. Parsing schema documents is out of scope
//! for this crate.

use std::fmt;

use serde_json::Value as Json;

use crate::validate::validate;
use crate::value::Datum;

/// A recursive, tagged schema description.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    /// Raw byte sequence, optionally refined by a logical type.
    Bytes { logical: Option<LogicalType> },
    String,
    /// Ordered sequence of values of one element schema.
    Array(Box<Schema>),
    /// String-keyed mapping to values of one schema.
    Map(Box<Schema>),
    /// Sum type over the given branch schemas.
    Union(Vec<Schema>),
    /// Named enumeration over a closed set of symbols.
    Enum { name: Name, symbols: Vec<String> },
    /// Named byte sequence of a fixed size, optionally refined by a
    /// logical type.
    Fixed {
        name: Name,
        size: usize,
        logical: Option<LogicalType>,
    },
    /// Named sequence of typed fields.
    Record(RecordSchema),
    /// Protocol error declaration; record semantics throughout.
    Error(RecordSchema),
    /// Protocol message parameter list; an anonymous record.
    Request(Vec<Field>),
}

/// Fieldless tags for the schema kinds, used by the compatibility matcher
/// and in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
    Array,
    Map,
    Union,
    Enum,
    Fixed,
    Record,
    Error,
    Request,
}

impl SchemaKind {
    /// Returns the kind's name as it appears in schema documents.
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Null => "null",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Int => "int",
            SchemaKind::Long => "long",
            SchemaKind::Float => "float",
            SchemaKind::Double => "double",
            SchemaKind::Bytes => "bytes",
            SchemaKind::String => "string",
            SchemaKind::Array => "array",
            SchemaKind::Map => "map",
            SchemaKind::Union => "union",
            SchemaKind::Enum => "enum",
            SchemaKind::Fixed => "fixed",
            SchemaKind::Record => "record",
            SchemaKind::Error => "error",
            SchemaKind::Request => "request",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A possibly namespaced schema name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub name: String,
    pub namespace: Option<String>,
}

impl Name {
    /// Creates a name from a bare or dotted fullname; everything before the
    /// last dot becomes the namespace.
    pub fn new(fullname: &str) -> Self {
        match fullname.rsplit_once('.') {
            Some((ns, n)) => Self {
                name: n.to_string(),
                namespace: Some(ns.to_string()),
            },
            None => Self {
                name: fullname.to_string(),
                namespace: None,
            },
        }
    }

    /// Returns the dotted fullname.
    pub fn fullname(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// One field of a record, error, or request schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    /// Declared default, kept in the JSON shape the schema language uses.
    pub default: Option<Json>,
}

impl Field {
    /// Creates a field with no default.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            default: None,
        }
    }

    /// Creates a field with a declared default value.
    pub fn with_default(name: impl Into<String>, schema: Schema, default: Json) -> Self {
        Self {
            name: name.into(),
            schema,
            default: Some(default),
        }
    }

    /// Returns true if the field declares a default.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// The shared shape of record and error schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub name: Name,
    pub fields: Vec<Field>,
}

impl RecordSchema {
    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An application-level refinement over a physical schema.
///
/// Only `decimal` is recognized, over `bytes` and `fixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    Decimal { precision: u32, scale: u32 },
}

impl Schema {
    /// Plain `bytes` with no logical type.
    pub fn bytes() -> Self {
        Schema::Bytes { logical: None }
    }

    /// An array of the given element schema.
    pub fn array(element: Schema) -> Self {
        Schema::Array(Box::new(element))
    }

    /// A map with the given value schema.
    pub fn map(values: Schema) -> Self {
        Schema::Map(Box::new(values))
    }

    /// A union over the given branches, in declared order.
    pub fn union_of(branches: Vec<Schema>) -> Self {
        Schema::Union(branches)
    }

    /// A named enum over the given symbols, in declared order.
    pub fn enumeration(name: &str, symbols: &[&str]) -> Self {
        Schema::Enum {
            name: Name::new(name),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// A named fixed-size byte schema.
    pub fn fixed(name: &str, size: usize) -> Self {
        Schema::Fixed {
            name: Name::new(name),
            size,
            logical: None,
        }
    }

    /// A named record with the given fields, in declared order.
    pub fn record(name: &str, fields: Vec<Field>) -> Self {
        Schema::Record(RecordSchema {
            name: Name::new(name),
            fields,
        })
    }

    /// `bytes` carrying a decimal logical type.
    pub fn decimal_bytes(precision: u32, scale: u32) -> Self {
        Schema::Bytes {
            logical: Some(LogicalType::Decimal { precision, scale }),
        }
    }

    /// `fixed` carrying a decimal logical type.
    pub fn decimal_fixed(name: &str, size: usize, precision: u32, scale: u32) -> Self {
        Schema::Fixed {
            name: Name::new(name),
            size,
            logical: Some(LogicalType::Decimal { precision, scale }),
        }
    }

    /// Returns the schema's kind tag.
    pub fn kind(&self) -> SchemaKind {
        match self {
            Schema::Null => SchemaKind::Null,
            Schema::Boolean => SchemaKind::Boolean,
            Schema::Int => SchemaKind::Int,
            Schema::Long => SchemaKind::Long,
            Schema::Float => SchemaKind::Float,
            Schema::Double => SchemaKind::Double,
            Schema::Bytes { .. } => SchemaKind::Bytes,
            Schema::String => SchemaKind::String,
            Schema::Array(_) => SchemaKind::Array,
            Schema::Map(_) => SchemaKind::Map,
            Schema::Union(_) => SchemaKind::Union,
            Schema::Enum { .. } => SchemaKind::Enum,
            Schema::Fixed { .. } => SchemaKind::Fixed,
            Schema::Record(_) => SchemaKind::Record,
            Schema::Error(_) => SchemaKind::Error,
            Schema::Request(_) => SchemaKind::Request,
        }
    }

    /// Returns the dotted fullname for named schemas.
    pub fn fullname(&self) -> Option<String> {
        match self {
            Schema::Enum { name, .. } | Schema::Fixed { name, .. } => Some(name.fullname()),
            Schema::Record(r) | Schema::Error(r) => Some(r.name.fullname()),
            _ => None,
        }
    }

    /// Returns the decimal refinement, if any.
    pub fn logical_type(&self) -> Option<&LogicalType> {
        match self {
            Schema::Bytes { logical } | Schema::Fixed { logical, .. } => logical.as_ref(),
            _ => None,
        }
    }

    /// Returns the record shape of record-like schemas.
    pub(crate) fn record_fields(&self) -> Option<&[Field]> {
        match self {
            Schema::Record(r) | Schema::Error(r) => Some(&r.fields),
            Schema::Request(fields) => Some(fields),
            _ => None,
        }
    }

    /// Checks a datum against this schema.
    pub fn is_valid_datum(&self, datum: &Datum) -> bool {
        validate(self, datum)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fullname() {
            Some(name) => write!(f, "{} {}", self.kind(), name),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Returns true iff data written with `writer` can be resolved by `reader`.
///
/// The comparison is on names and type tags only; mismatches nested deeper
/// than one level surface as read failures when recursion reaches them.
pub fn schemas_match(writer: &Schema, reader: &Schema) -> bool {
    use SchemaKind::*;

    let (w, r) = (writer.kind(), reader.kind());
    if w == Union || r == Union {
        return true;
    }
    if w == r {
        return match (writer, reader) {
            (Schema::Array(we), Schema::Array(re)) => we.kind() == re.kind(),
            (Schema::Map(wv), Schema::Map(rv)) => wv.kind() == rv.kind(),
            (Schema::Enum { .. }, Schema::Enum { .. })
            | (Schema::Record(_), Schema::Record(_))
            | (Schema::Error(_), Schema::Error(_)) => writer.fullname() == reader.fullname(),
            (
                Schema::Fixed { size: ws, .. },
                Schema::Fixed { size: rs, .. },
            ) => writer.fullname() == reader.fullname() && ws == rs,
            _ => true,
        };
    }
    // Numeric promotions.
    matches!(
        (w, r),
        (Int, Long) | (Int, Float) | (Int, Double) | (Long, Float) | (Long, Double) | (Float, Double)
    )
}
