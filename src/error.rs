//! Error types for Tayberry operations.

use thiserror::Error;

use crate::schema::SchemaKind;

/// Result type for Tayberry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Tayberry operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A datum does not conform to the writer's schema.
    #[error("datum {datum} does not match schema {schema}")]
    TypeMismatch { datum: String, schema: String },

    /// Writer and reader schemas cannot be resolved against each other.
    #[error("writer schema {writer} is not compatible with reader schema {reader}")]
    Incompatible {
        writer: SchemaKind,
        reader: SchemaKind,
    },

    /// An unscaled decimal value exceeds the declared precision.
    #[error("unscaled value {unscaled} exceeds precision {precision}")]
    DecimalOutOfRange { unscaled: i64, precision: u32 },

    /// A decimal value does not fit the available byte width.
    #[error("decimal value does not fit in {size} bytes")]
    DecimalTooWide { size: usize },

    /// The reader declares a field the writer omits, with no default.
    #[error("no default value for field {field}")]
    MissingDefault { field: String },

    /// A union branch index outside the writer's declared branches.
    #[error("union branch index {index} out of range for {count} branches")]
    BadUnionIndex { index: i64, count: usize },

    /// An enum index outside the writer's declared symbols.
    #[error("enum index {index} out of range for {count} symbols")]
    BadEnumIndex { index: i64, count: usize },

    /// The reader's enum does not declare a symbol the writer wrote.
    #[error("enum symbol {0:?} not declared by reader schema")]
    UnknownEnumSymbol(String),

    /// A field default that cannot be materialized against its schema.
    #[error("default value {value} does not match schema {schema}")]
    BadDefault { value: String, schema: String },

    /// Invalid UTF-8 in a string payload.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Varint longer than 10 bytes, or overflowing 64 bits.
    #[error("varint overflow")]
    VarintOverflow,

    /// An `int` wire value outside the signed 32-bit range.
    #[error("int value {value} out of 32-bit range")]
    IntOutOfRange { value: i64 },

    /// A negative length prefix for bytes, a string, or a block size.
    #[error("negative length prefix: {length}")]
    NegativeLength { length: i64 },

    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a datum/schema mismatch error from display representations.
    pub fn type_mismatch(datum: impl ToString, schema: impl ToString) -> Self {
        Self::TypeMismatch {
            datum: datum.to_string(),
            schema: schema.to_string(),
        }
    }

    /// Creates an incompatibility error from the two schema kinds.
    pub fn incompatible(writer: SchemaKind, reader: SchemaKind) -> Self {
        Self::Incompatible { writer, reader }
    }

    /// Creates a bad-default error from display representations.
    pub fn bad_default(value: impl ToString, schema: impl ToString) -> Self {
        Self::BadDefault {
            value: value.to_string(),
            schema: schema.to_string(),
        }
    }
}
