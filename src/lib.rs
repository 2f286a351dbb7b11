//! Tayberry - schema-driven binary serialization with writer/reader schema
//! resolution.
//!
//! A datum is validated against a writer's schema and serialized into a
//! compact binary stream; reading the stream back resolves the writer's
//! schema against the reader's, applying numeric promotions, union
//! widening and narrowing, and field defaults.
//!
//! # Example
//!
//! ```rust
//! use tayberry::{from_bytes, to_bytes, Datum, Field, Schema};
//!
//! fn main() -> tayberry::Result<()> {
//!     let writer_schema = Schema::record(
//!         "Point",
//!         vec![
//!             Field::new("x", Schema::Int),
//!             Field::new("y", Schema::Int),
//!         ],
//!     );
//!     let datum = Datum::record([("x", Datum::Int(3)), ("y", Datum::Int(4))]);
//!
//!     // Encoding
//!     let data = to_bytes(&writer_schema, &datum)?;
//!
//!     // Decoding, with an evolved reader schema
//!     let reader_schema = Schema::record(
//!         "Point",
//!         vec![
//!             Field::new("x", Schema::Long),
//!             Field::new("y", Schema::Long),
//!         ],
//!     );
//!     let decoded = from_bytes(&writer_schema, Some(&reader_schema), &data)?;
//!     assert_eq!(
//!         decoded,
//!         Datum::record([("x", Datum::Long(3)), ("y", Datum::Long(4))])
//!     );
//!     Ok(())
//! }
//! ```

pub mod decimal;
mod error;
mod reader;
mod schema;
mod types;
mod validate;
mod value;
mod writer;

pub use error::{Error, Result};
pub use reader::{datum_from_default, Reader};
pub use schema::{
    schemas_match, Field, LogicalType, Name, RecordSchema, Schema, SchemaKind,
};
pub use types::{zigzag_decode, zigzag_encode};
pub use validate::validate;
pub use value::Datum;
pub use writer::Writer;

use std::io::Cursor;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Serializes one datum against a writer's schema into a fresh buffer.
pub fn to_bytes(schema: &Schema, datum: &Datum) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    Writer::new(schema, &mut out).write(datum)?;
    Ok(out)
}

/// Decodes one datum from a buffer, resolving the writer's schema against
/// the reader's. With no reader schema the writer's shape is returned
/// as-is.
pub fn from_bytes(
    writer_schema: &Schema,
    reader_schema: Option<&Schema>,
    data: &[u8],
) -> Result<Datum> {
    let mut cursor = Cursor::new(data);
    match reader_schema {
        Some(rs) => Reader::with_reader_schema(writer_schema, rs, &mut cursor).read(),
        None => Reader::new(writer_schema, &mut cursor).read(),
    }
}
