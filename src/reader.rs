//! Schema-directed datum decoder with writer/reader schema resolution.

use std::io::{Read, Seek, SeekFrom};

use serde_json::Value as Json;
use tracing::{debug, trace};

use crate::decimal;
use crate::error::{Error, Result};
use crate::schema::{schemas_match, Field, LogicalType, Schema, SchemaKind};
use crate::types::{zigzag_decode, MAX_VARINT_BYTES};
use crate::value::Datum;

/// Reader decodes datums written with one schema into the shape a reader
/// schema expects, applying numeric promotion, union resolution, and field
/// defaults along the way.
///
/// The input stream stays owned by the caller; `Seek` is needed by the skip
/// path to step over size-prefixed blocks and unused payloads.
pub struct Reader<'a, R: Read + Seek> {
    writer_schema: &'a Schema,
    reader_schema: Option<&'a Schema>,
    input: &'a mut R,
}

impl<'a, R: Read + Seek> Reader<'a, R> {
    /// Creates a reader whose expected shape is the writer's schema itself.
    pub fn new(writer_schema: &'a Schema, input: &'a mut R) -> Self {
        Self {
            writer_schema,
            reader_schema: None,
            input,
        }
    }

    /// Creates a reader resolving the writer's schema against a distinct
    /// reader schema.
    pub fn with_reader_schema(
        writer_schema: &'a Schema,
        reader_schema: &'a Schema,
        input: &'a mut R,
    ) -> Self {
        Self {
            writer_schema,
            reader_schema: Some(reader_schema),
            input,
        }
    }

    /// Reads one datum from the stream.
    pub fn read(&mut self) -> Result<Datum> {
        let writer = self.writer_schema;
        let reader = self.reader_schema.unwrap_or(writer);
        self.read_datum(writer, reader)
    }

    fn read_datum(&mut self, writer: &Schema, reader: &Schema) -> Result<Datum> {
        if !schemas_match(writer, reader) {
            return Err(Error::incompatible(writer.kind(), reader.kind()));
        }

        // A reader union absorbs a non-union writer: resolve against the
        // first branch the writer is compatible with.
        if !matches!(writer, Schema::Union(_)) {
            if let Schema::Union(branches) = reader {
                let branch = branches
                    .iter()
                    .find(|b| schemas_match(writer, b))
                    .ok_or_else(|| Error::incompatible(writer.kind(), reader.kind()))?;
                trace!(writer = %writer, branch = %branch, "reader union absorbed writer schema");
                return self.read_datum(writer, branch);
            }
        }

        match writer {
            Schema::Null => Ok(Datum::Null),
            Schema::Boolean => Ok(Datum::Boolean(self.read_byte()? == 1)),
            Schema::Int => {
                let value = self.read_long()?;
                let value =
                    i32::try_from(value).map_err(|_| Error::IntOutOfRange { value })?;
                Ok(promote(Datum::Int(value), reader.kind()))
            }
            Schema::Long => Ok(promote(Datum::Long(self.read_long()?), reader.kind())),
            Schema::Float => {
                let buf = self.read_exact(4)?;
                let value = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
                Ok(promote(Datum::Float(value), reader.kind()))
            }
            Schema::Double => {
                let buf = self.read_exact(8)?;
                let value = f64::from_le_bytes([
                    buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
                ]);
                Ok(Datum::Double(value))
            }
            Schema::Bytes { logical: None } => Ok(Datum::Bytes(self.read_bytes_payload()?)),
            Schema::Bytes {
                logical: Some(LogicalType::Decimal { scale, .. }),
            } => {
                let payload = self.read_bytes_payload()?;
                let unscaled = decimal::unscaled_from_bytes(&payload)?;
                Ok(decimal::datum_from_unscaled(unscaled, *scale))
            }
            Schema::String => {
                let payload = self.read_bytes_payload()?;
                String::from_utf8(payload)
                    .map(Datum::String)
                    .map_err(|_| Error::InvalidUtf8)
            }
            Schema::Array(element) => {
                let Schema::Array(reader_element) = reader else {
                    return Err(Error::incompatible(writer.kind(), reader.kind()));
                };
                let mut items = Vec::new();
                self.read_blocks(|r| {
                    items.push(r.read_datum(element, reader_element)?);
                    Ok(())
                })?;
                Ok(Datum::Array(items))
            }
            Schema::Map(values) => {
                let Schema::Map(reader_values) = reader else {
                    return Err(Error::incompatible(writer.kind(), reader.kind()));
                };
                let mut entries = std::collections::HashMap::new();
                self.read_blocks(|r| {
                    let key = r.read_string_payload()?;
                    entries.insert(key, r.read_datum(values, reader_values)?);
                    Ok(())
                })?;
                Ok(Datum::Map(entries))
            }
            Schema::Union(branches) => {
                let index = self.read_long()?;
                let branch = usize::try_from(index)
                    .ok()
                    .and_then(|i| branches.get(i))
                    .ok_or(Error::BadUnionIndex {
                        index,
                        count: branches.len(),
                    })?;
                self.read_datum(branch, reader)
            }
            Schema::Enum { symbols, .. } => {
                let index = self.read_long()?;
                let symbol = usize::try_from(index)
                    .ok()
                    .and_then(|i| symbols.get(i))
                    .ok_or(Error::BadEnumIndex {
                        index,
                        count: symbols.len(),
                    })?;
                if let Schema::Enum {
                    symbols: reader_symbols,
                    ..
                } = reader
                {
                    if !reader_symbols.iter().any(|s| s == symbol) {
                        return Err(Error::UnknownEnumSymbol(symbol.clone()));
                    }
                }
                Ok(Datum::Enum(symbol.clone()))
            }
            Schema::Fixed {
                size,
                logical: None,
                ..
            } => Ok(Datum::Bytes(self.read_exact(*size)?)),
            Schema::Fixed {
                size,
                logical: Some(LogicalType::Decimal { scale, .. }),
                ..
            } => {
                let payload = self.read_exact(*size)?;
                let unscaled = decimal::unscaled_from_bytes(&payload)?;
                Ok(decimal::datum_from_unscaled(unscaled, *scale))
            }
            Schema::Record(_) | Schema::Error(_) | Schema::Request(_) => {
                // record_fields is Some for all three kinds.
                let writer_fields = writer.record_fields().unwrap_or(&[]);
                let reader_fields = match reader.record_fields() {
                    Some(fields) => fields,
                    None => return Err(Error::incompatible(writer.kind(), reader.kind())),
                };
                self.read_record(writer_fields, reader_fields)
            }
        }
    }

    fn read_record(
        &mut self,
        writer_fields: &[Field],
        reader_fields: &[Field],
    ) -> Result<Datum> {
        let mut fields = Vec::new();
        for wf in writer_fields {
            match reader_fields.iter().find(|rf| rf.name == wf.name) {
                Some(rf) => {
                    fields.push((wf.name.clone(), self.read_datum(&wf.schema, &rf.schema)?));
                }
                None => {
                    trace!(field = %wf.name, "skipping field the reader does not declare");
                    self.skip(&wf.schema)?;
                }
            }
        }
        for rf in reader_fields {
            if writer_fields.iter().any(|wf| wf.name == rf.name) {
                continue;
            }
            match &rf.default {
                Some(default) => {
                    debug!(field = %rf.name, "filling reader field from default");
                    fields.push((rf.name.clone(), datum_from_default(&rf.schema, default)?));
                }
                None => {
                    return Err(Error::MissingDefault {
                        field: rf.name.clone(),
                    })
                }
            }
        }
        Ok(Datum::Record(fields))
    }

    /// Advances the stream past one datum of the given schema without
    /// materializing it.
    pub fn skip(&mut self, schema: &Schema) -> Result<()> {
        match schema {
            Schema::Null => Ok(()),
            Schema::Boolean => self.read_byte().map(|_| ()),
            Schema::Int | Schema::Long => self.read_long().map(|_| ()),
            Schema::Float => self.seek_forward(4),
            Schema::Double => self.seek_forward(8),
            Schema::Bytes { .. } | Schema::String => {
                let length = self.read_length()?;
                self.seek_forward(length as i64)
            }
            Schema::Array(element) => self.skip_blocks(|r| r.skip(element)),
            Schema::Map(values) => self.skip_blocks(|r| {
                let length = r.read_length()?;
                r.seek_forward(length as i64)?;
                r.skip(values)
            }),
            Schema::Union(branches) => {
                let index = self.read_long()?;
                let branch = usize::try_from(index)
                    .ok()
                    .and_then(|i| branches.get(i))
                    .ok_or(Error::BadUnionIndex {
                        index,
                        count: branches.len(),
                    })?;
                self.skip(branch)
            }
            Schema::Enum { .. } => self.read_long().map(|_| ()),
            Schema::Fixed { size, .. } => self.seek_forward(*size as i64),
            Schema::Record(r) => {
                for field in &r.fields {
                    self.skip(&field.schema)?;
                }
                Ok(())
            }
            Schema::Error(r) => {
                for field in &r.fields {
                    self.skip(&field.schema)?;
                }
                Ok(())
            }
            Schema::Request(fields) => {
                for field in fields {
                    self.skip(&field.schema)?;
                }
                Ok(())
            }
        }
    }

    /// Consumes container blocks until the zero terminator, reading one
    /// item at a time. A negative count carries a byte size before the
    /// items; the items are still read individually.
    fn read_blocks(&mut self, mut read_item: impl FnMut(&mut Self) -> Result<()>) -> Result<()> {
        loop {
            let mut count = self.read_long()?;
            if count == 0 {
                return Ok(());
            }
            if count < 0 {
                count = count
                    .checked_neg()
                    .ok_or(Error::NegativeLength { length: count })?;
                let block_size = self.read_long()?;
                if block_size < 0 {
                    return Err(Error::NegativeLength { length: block_size });
                }
            }
            for _ in 0..count {
                read_item(self)?;
            }
        }
    }

    /// Consumes container blocks without materializing items, seeking
    /// directly over size-prefixed blocks.
    fn skip_blocks(&mut self, mut skip_item: impl FnMut(&mut Self) -> Result<()>) -> Result<()> {
        loop {
            let count = self.read_long()?;
            if count == 0 {
                return Ok(());
            }
            if count < 0 {
                let block_size = self.read_long()?;
                if block_size < 0 {
                    return Err(Error::NegativeLength { length: block_size });
                }
                trace!(bytes = block_size, "seeking over size-prefixed block");
                self.seek_forward(block_size)?;
            } else {
                for _ in 0..count {
                    skip_item(self)?;
                }
            }
        }
    }

    /// Reads a zig-zag varint long, rejecting encodings beyond 64 bits.
    fn read_long(&mut self) -> Result<i64> {
        let mut result: u64 = 0;
        let mut shift = 0;
        for i in 0..MAX_VARINT_BYTES {
            let b = self.read_byte()?;
            // The 10th byte may only carry bit 63.
            if i == MAX_VARINT_BYTES - 1 && b > 1 {
                return Err(Error::VarintOverflow);
            }
            result |= ((b & 0x7f) as u64) << shift;
            if b & 0x80 == 0 {
                return Ok(zigzag_decode(result));
            }
            shift += 7;
        }
        Err(Error::VarintOverflow)
    }

    fn read_length(&mut self) -> Result<usize> {
        let length = self.read_long()?;
        usize::try_from(length).map_err(|_| Error::NegativeLength { length })
    }

    fn read_bytes_payload(&mut self) -> Result<Vec<u8>> {
        let length = self.read_length()?;
        self.read_exact(length)
    }

    fn read_string_payload(&mut self) -> Result<String> {
        String::from_utf8(self.read_bytes_payload()?).map_err(|_| Error::InvalidUtf8)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.input.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.input.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn seek_forward(&mut self, n: i64) -> Result<()> {
        self.input.seek(SeekFrom::Current(n))?;
        Ok(())
    }
}

/// Applies the read-time numeric promotions: int widens to long, integers
/// cast to float or double, float widens to double.
fn promote(datum: Datum, reader_kind: SchemaKind) -> Datum {
    match (datum, reader_kind) {
        (Datum::Int(v), SchemaKind::Long) => Datum::Long(v as i64),
        (Datum::Int(v), SchemaKind::Float) => Datum::Float(v as f32),
        (Datum::Int(v), SchemaKind::Double) => Datum::Double(v as f64),
        (Datum::Long(v), SchemaKind::Float) => Datum::Float(v as f32),
        (Datum::Long(v), SchemaKind::Double) => Datum::Double(v as f64),
        (Datum::Float(v), SchemaKind::Double) => Datum::Double(v as f64),
        (datum, _) => datum,
    }
}

/// Materializes a declared default into datum form, mirroring the schema
/// recursion. Union defaults apply to the first branch; bytes and fixed
/// defaults are strings of codepoints below 256, one byte each.
pub fn datum_from_default(schema: &Schema, default: &Json) -> Result<Datum> {
    match schema {
        Schema::Null => match default {
            Json::Null => Ok(Datum::Null),
            _ => Err(Error::bad_default(default, schema)),
        },
        Schema::Boolean => default
            .as_bool()
            .map(Datum::Boolean)
            .ok_or_else(|| Error::bad_default(default, schema)),
        Schema::Int => default
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Datum::Int)
            .ok_or_else(|| Error::bad_default(default, schema)),
        Schema::Long => default
            .as_i64()
            .map(Datum::Long)
            .ok_or_else(|| Error::bad_default(default, schema)),
        Schema::Float => default
            .as_f64()
            .map(|v| Datum::Float(v as f32))
            .ok_or_else(|| Error::bad_default(default, schema)),
        Schema::Double => default
            .as_f64()
            .map(Datum::Double)
            .ok_or_else(|| Error::bad_default(default, schema)),
        Schema::Bytes { .. } => bytes_from_default(default)
            .ok_or_else(|| Error::bad_default(default, schema)),
        Schema::String => default
            .as_str()
            .map(|s| Datum::String(s.to_string()))
            .ok_or_else(|| Error::bad_default(default, schema)),
        Schema::Fixed { size, .. } => match bytes_from_default(default) {
            Some(Datum::Bytes(b)) if b.len() == *size => Ok(Datum::Bytes(b)),
            _ => Err(Error::bad_default(default, schema)),
        },
        Schema::Enum { symbols, .. } => match default.as_str() {
            Some(s) if symbols.iter().any(|sym| sym == s) => Ok(Datum::Enum(s.to_string())),
            _ => Err(Error::bad_default(default, schema)),
        },
        Schema::Array(element) => match default.as_array() {
            Some(items) => items
                .iter()
                .map(|v| datum_from_default(element, v))
                .collect::<Result<Vec<_>>>()
                .map(Datum::Array),
            None => Err(Error::bad_default(default, schema)),
        },
        Schema::Map(values) => match default.as_object() {
            Some(entries) => entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), datum_from_default(values, v)?)))
                .collect::<Result<std::collections::HashMap<_, _>>>()
                .map(Datum::Map),
            None => Err(Error::bad_default(default, schema)),
        },
        Schema::Union(branches) => match branches.first() {
            Some(first) => datum_from_default(first, default),
            None => Err(Error::bad_default(default, schema)),
        },
        Schema::Record(r) => record_from_default(&r.fields, default, schema),
        Schema::Error(r) => record_from_default(&r.fields, default, schema),
        Schema::Request(fields) => record_from_default(fields, default, schema),
    }
}

fn record_from_default(fields: &[Field], default: &Json, schema: &Schema) -> Result<Datum> {
    let entries = default
        .as_object()
        .ok_or_else(|| Error::bad_default(default, schema))?;
    let mut out = Vec::new();
    for field in fields {
        let value = match entries.get(&field.name) {
            Some(v) => datum_from_default(&field.schema, v)?,
            None => match &field.default {
                Some(own) => datum_from_default(&field.schema, own)?,
                None => {
                    return Err(Error::MissingDefault {
                        field: field.name.clone(),
                    })
                }
            },
        };
        out.push((field.name.clone(), value));
    }
    Ok(Datum::Record(out))
}

/// Bytes and fixed defaults are declared as strings whose codepoints map
/// one-to-one onto bytes.
fn bytes_from_default(default: &Json) -> Option<Datum> {
    let s = default.as_str()?;
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let code = c as u32;
        if code > 0xFF {
            return None;
        }
        out.push(code as u8);
    }
    Some(Datum::Bytes(out))
}
