//! Schema-directed datum encoder.

use std::io::Write;

use crate::decimal;
use crate::error::{Error, Result};
use crate::reader::datum_from_default;
use crate::schema::{Field, LogicalType, Schema};
use crate::types::{zigzag_encode, MAX_VARINT_BYTES};
use crate::validate::validate;
use crate::value::Datum;

/// Writer serializes datums conforming to one schema into a borrowed
/// byte stream.
///
/// The writer keeps no state between `write` calls; the stream stays owned
/// by the caller. A failed write leaves the stream position undefined.
pub struct Writer<'a, W: Write> {
    schema: &'a Schema,
    out: &'a mut W,
}

impl<'a, W: Write> Writer<'a, W> {
    /// Creates a writer bound to a schema and an output stream.
    pub fn new(schema: &'a Schema, out: &'a mut W) -> Self {
        Self { schema, out }
    }

    /// Validates `datum` against the writer's schema and serializes it.
    pub fn write(&mut self, datum: &Datum) -> Result<()> {
        if !validate(self.schema, datum) {
            return Err(Error::type_mismatch(datum.type_name(), self.schema));
        }
        self.write_datum(self.schema, datum)
    }

    fn write_datum(&mut self, schema: &Schema, datum: &Datum) -> Result<()> {
        match schema {
            Schema::Null => match datum {
                Datum::Null => Ok(()),
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Boolean => match datum {
                Datum::Boolean(v) => self.write_boolean(*v),
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Int | Schema::Long => match datum {
                Datum::Int(v) => self.write_long(*v as i64),
                Datum::Long(v) => self.write_long(*v),
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Float => match datum {
                Datum::Float(v) => self.write_raw(&v.to_le_bytes()),
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Double => match datum {
                Datum::Double(v) => self.write_raw(&v.to_le_bytes()),
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Bytes { logical: None } => match datum {
                Datum::Bytes(b) => self.write_bytes_payload(b),
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Bytes {
                logical: Some(LogicalType::Decimal { precision, scale }),
            } => {
                let unscaled = decimal::unscaled_of(datum, *precision, *scale)?;
                self.write_bytes_payload(&decimal::to_minimal_bytes(unscaled))
            }
            Schema::String => match datum {
                Datum::String(s) => self.write_bytes_payload(s.as_bytes()),
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Array(element) => match datum {
                Datum::Array(items) => {
                    if !items.is_empty() {
                        self.write_long(items.len() as i64)?;
                        for item in items {
                            self.write_datum(element, item)?;
                        }
                    }
                    self.write_long(0)
                }
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Map(values) => match datum {
                Datum::Map(entries) => {
                    if !entries.is_empty() {
                        self.write_long(entries.len() as i64)?;
                        for (key, value) in entries {
                            self.write_bytes_payload(key.as_bytes())?;
                            self.write_datum(values, value)?;
                        }
                    }
                    self.write_long(0)
                }
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Union(branches) => {
                match branches.iter().position(|b| validate(b, datum)) {
                    Some(index) => {
                        self.write_long(index as i64)?;
                        self.write_datum(&branches[index], datum)
                    }
                    None => Err(Error::type_mismatch(datum.type_name(), schema)),
                }
            }
            Schema::Enum { symbols, .. } => {
                let symbol = match datum {
                    Datum::Enum(s) | Datum::String(s) => s,
                    other => return Err(Error::type_mismatch(other.type_name(), schema)),
                };
                match symbols.iter().position(|s| s == symbol) {
                    Some(index) => self.write_long(index as i64),
                    None => Err(Error::type_mismatch(symbol, schema)),
                }
            }
            Schema::Fixed {
                size,
                logical: None,
                ..
            } => match datum {
                Datum::Bytes(b) if b.len() == *size => self.write_raw(b),
                other => Err(Error::type_mismatch(other.type_name(), schema)),
            },
            Schema::Fixed {
                size,
                logical: Some(LogicalType::Decimal { precision, scale }),
                ..
            } => {
                let unscaled = decimal::unscaled_of(datum, *precision, *scale)?;
                self.write_raw(&decimal::to_fixed_bytes(unscaled, *size)?)
            }
            Schema::Record(r) => self.write_fields(&r.fields, datum),
            Schema::Error(r) => self.write_fields(&r.fields, datum),
            Schema::Request(fields) => self.write_fields(fields, datum),
        }
    }

    /// Writes record fields in schema order, substituting declared defaults
    /// for fields the datum lacks.
    fn write_fields(&mut self, fields: &[Field], datum: &Datum) -> Result<()> {
        for field in fields {
            match datum.get(&field.name) {
                Some(value) => self.write_datum(&field.schema, value)?,
                None => match &field.default {
                    Some(default) => {
                        let value = datum_from_default(&field.schema, default)?;
                        self.write_datum(&field.schema, &value)?;
                    }
                    None => {
                        return Err(Error::MissingDefault {
                            field: field.name.clone(),
                        })
                    }
                },
            }
        }
        Ok(())
    }

    /// Writes a signed 64-bit integer as a zig-zag varint.
    fn write_long(&mut self, value: i64) -> Result<()> {
        let mut n = zigzag_encode(value);
        let mut buf = [0u8; MAX_VARINT_BYTES];
        let mut i = 0;
        while n > 0x7f {
            buf[i] = (n as u8 & 0x7f) | 0x80;
            n >>= 7;
            i += 1;
        }
        buf[i] = n as u8;
        self.write_raw(&buf[..=i])
    }

    fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.write_raw(&[if value { 1 } else { 0 }])
    }

    /// Writes a long length prefix followed by the payload.
    fn write_bytes_payload(&mut self, data: &[u8]) -> Result<()> {
        self.write_long(data.len() as i64)?;
        self.write_raw(data)
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.out.write_all(data)?;
        Ok(())
    }
}
