//! Datum validation against a schema.
//!
//! Validation runs on every write and doubles as union branch selection, so
//! it holds no state and allocates nothing.

use crate::decimal;
use crate::schema::{Field, LogicalType, Schema};
use crate::value::Datum;

/// Returns true iff `datum` conforms to `schema`.
///
/// Primitive checks are type-exact, refined so that integer-valued datums
/// are accepted for `int` and `long` within range. Record fields may be
/// absent only when they declare a default.
pub fn validate(schema: &Schema, datum: &Datum) -> bool {
    match schema {
        Schema::Null => matches!(datum, Datum::Null),
        Schema::Boolean => matches!(datum, Datum::Boolean(_)),
        Schema::Int => match datum {
            Datum::Int(_) => true,
            Datum::Long(v) => i32::try_from(*v).is_ok(),
            _ => false,
        },
        Schema::Long => matches!(datum, Datum::Int(_) | Datum::Long(_)),
        Schema::Float => matches!(datum, Datum::Float(_)),
        Schema::Double => matches!(datum, Datum::Double(_)),
        Schema::Bytes { logical: None } => matches!(datum, Datum::Bytes(_)),
        Schema::Bytes {
            logical: Some(LogicalType::Decimal { precision, scale }),
        } => decimal::unscaled_of(datum, *precision, *scale).is_ok(),
        Schema::String => matches!(datum, Datum::String(_)),
        Schema::Array(element) => match datum {
            Datum::Array(items) => items.iter().all(|v| validate(element, v)),
            _ => false,
        },
        Schema::Map(values) => match datum {
            Datum::Map(entries) => entries.values().all(|v| validate(values, v)),
            _ => false,
        },
        Schema::Union(branches) => branches.iter().any(|b| validate(b, datum)),
        Schema::Enum { symbols, .. } => match datum {
            Datum::Enum(s) | Datum::String(s) => symbols.iter().any(|sym| sym == s),
            _ => false,
        },
        Schema::Fixed {
            size,
            logical: None,
            ..
        } => matches!(datum, Datum::Bytes(b) if b.len() == *size),
        Schema::Fixed {
            size,
            logical: Some(LogicalType::Decimal { precision, scale }),
            ..
        } => decimal::unscaled_of(datum, *precision, *scale)
            .and_then(|u| decimal::to_fixed_bytes(u, *size))
            .is_ok(),
        Schema::Record(r) => validate_fields(&r.fields, datum),
        Schema::Error(r) => validate_fields(&r.fields, datum),
        Schema::Request(fields) => validate_fields(fields, datum),
    }
}

fn validate_fields(fields: &[Field], datum: &Datum) -> bool {
    if !matches!(datum, Datum::Record(_)) {
        return false;
    }
    fields.iter().all(|f| match datum.get(&f.name) {
        Some(value) => validate(&f.schema, value),
        None => f.has_default(),
    })
}
