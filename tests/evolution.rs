//! End-to-end schema evolution tests.
//!
//! These exercise the full writer/reader pipeline against golden byte
//! vectors and verify that evolved reader schemas resolve data written
//! under older writer schemas.

use std::io::Cursor;

use serde_json::json;
use tayberry::{from_bytes, to_bytes, zigzag_encode, Datum, Field, Reader, Schema};

fn encode(schema: &Schema, datum: &Datum) -> Vec<u8> {
    to_bytes(schema, datum).expect("encode failed")
}

fn decode(writer: &Schema, reader: &Schema, data: &[u8]) -> Datum {
    from_bytes(writer, Some(reader), data).expect("decode failed")
}

#[test]
fn record_round_trip_golden_bytes() {
    // record{a:int, b:string} with {a:42, b:"hi"}:
    // zigzag(42) = 0x54, string length 2 -> 0x04, then "hi".
    let schema = Schema::record(
        "Example",
        vec![
            Field::new("a", Schema::Int),
            Field::new("b", Schema::String),
        ],
    );
    let datum = Datum::record([("a", Datum::Int(42)), ("b", Datum::from("hi"))]);

    let data = encode(&schema, &datum);
    assert_eq!(data, [0x54, 0x04, 0x68, 0x69]);
    assert_eq!(from_bytes(&schema, None, &data).unwrap(), datum);
}

#[test]
fn union_promotion_golden_bytes() {
    // Writer int, reader union<null,long>; wire for 7 is 0x0e.
    let reader = Schema::union_of(vec![Schema::Null, Schema::Long]);
    let data = encode(&Schema::Int, &Datum::Int(7));
    assert_eq!(data, [0x0e]);
    assert_eq!(decode(&Schema::Int, &reader, &data), Datum::Long(7));
}

#[test]
fn blocked_array_golden_bytes() {
    let schema = Schema::array(Schema::Int);
    let datum = Datum::Array(vec![Datum::Int(1), Datum::Int(2), Datum::Int(3)]);

    let data = encode(&schema, &datum);
    assert_eq!(data, [0x06, 0x02, 0x04, 0x06, 0x00]);
    assert_eq!(from_bytes(&schema, None, &data).unwrap(), datum);
}

#[test]
fn record_default_golden_bytes() {
    // Writer record{a:int}, reader adds b:string default "x"; wire 0x0a.
    let writer = Schema::record("Example", vec![Field::new("a", Schema::Int)]);
    let reader = Schema::record(
        "Example",
        vec![
            Field::new("a", Schema::Int),
            Field::with_default("b", Schema::String, json!("x")),
        ],
    );
    assert_eq!(
        decode(&writer, &reader, &[0x0a]),
        Datum::record([("a", Datum::Int(5)), ("b", Datum::from("x"))])
    );
}

#[test]
fn decimal_golden_bytes() {
    // bytes logical=decimal precision=5 scale=2, datum 1.23:
    // unscaled 123, framed as length 1 then 0x7b.
    let schema = Schema::decimal_bytes(5, 2);
    let data = encode(&schema, &Datum::Double(1.23));
    assert_eq!(data, [0x02, 0x7b]);
    assert_eq!(from_bytes(&schema, None, &data).unwrap(), Datum::Double(1.23));
}

#[test]
fn varint_length_matches_zigzag_width() {
    // The encoded length is ceil(significant_bits / 7), one byte for zero.
    let cases = [
        0i64,
        1,
        -1,
        63,
        -64,
        64,
        -65,
        127,
        128,
        300,
        -300,
        i32::MAX as i64,
        i32::MIN as i64,
        i64::MAX,
        i64::MIN,
    ];
    for n in cases {
        let data = encode(&Schema::Long, &Datum::Long(n));
        let z = zigzag_encode(n);
        let expected = if z == 0 {
            1
        } else {
            (64 - z.leading_zeros() as usize + 6) / 7
        };
        assert_eq!(data.len(), expected, "length for {n}");
        assert_eq!(from_bytes(&Schema::Long, None, &data).unwrap(), Datum::Long(n));
    }
}

#[test]
fn promotion_matrix_round_trips() {
    let int_data = encode(&Schema::Int, &Datum::Int(-12));
    assert_eq!(
        decode(&Schema::Int, &Schema::Long, &int_data),
        Datum::Long(-12)
    );
    assert_eq!(
        decode(&Schema::Int, &Schema::Float, &int_data),
        Datum::Float(-12.0)
    );
    assert_eq!(
        decode(&Schema::Int, &Schema::Double, &int_data),
        Datum::Double(-12.0)
    );

    let long_data = encode(&Schema::Long, &Datum::Long(1 << 33));
    assert_eq!(
        decode(&Schema::Long, &Schema::Double, &long_data),
        Datum::Double((1u64 << 33) as f64)
    );

    // long -> float rounds to nearest even.
    let long_data = encode(&Schema::Long, &Datum::Long(16777217));
    assert_eq!(
        decode(&Schema::Long, &Schema::Float, &long_data),
        Datum::Float(16777216.0)
    );

    let float_data = encode(&Schema::Float, &Datum::Float(0.25));
    assert_eq!(
        decode(&Schema::Float, &Schema::Double, &float_data),
        Datum::Double(0.25)
    );
}

#[test]
fn writer_only_fields_are_skipped() {
    let writer = Schema::record(
        "Event",
        vec![
            Field::new("id", Schema::Long),
            Field::new("tags", Schema::array(Schema::String)),
            Field::new("payload", Schema::bytes()),
            Field::new("kind", Schema::enumeration("Kind", &["A", "B"])),
        ],
    );
    let reader = Schema::record("Event", vec![Field::new("id", Schema::Long)]);

    let datum = Datum::record([
        ("id", Datum::Long(99)),
        ("tags", Datum::Array(vec![Datum::from("x"), Datum::from("y")])),
        ("payload", Datum::Bytes(vec![1, 2, 3])),
        ("kind", Datum::Enum("B".into())),
    ]);
    let data = encode(&writer, &datum);
    assert_eq!(
        decode(&writer, &reader, &data),
        Datum::record([("id", Datum::Long(99))])
    );
}

#[test]
fn nested_record_evolution() {
    let writer_inner = Schema::record("Inner", vec![Field::new("v", Schema::Int)]);
    let writer = Schema::record(
        "Outer",
        vec![
            Field::new("inner", writer_inner),
            Field::new("name", Schema::String),
        ],
    );

    let reader_inner = Schema::record(
        "Inner",
        vec![
            Field::new("v", Schema::Long),
            Field::with_default("unit", Schema::String, json!("m")),
        ],
    );
    let reader = Schema::record(
        "Outer",
        vec![
            Field::new("inner", reader_inner),
            Field::new("name", Schema::String),
        ],
    );

    let datum = Datum::record([
        (
            "inner",
            Datum::record([("v", Datum::Int(7))]),
        ),
        ("name", Datum::from("probe")),
    ]);
    // The writer substitutes nothing here; the reader promotes v and fills
    // the new unit field.
    let data = encode(&writer, &datum);
    assert_eq!(
        decode(&writer, &reader, &data),
        Datum::record([
            (
                "inner",
                Datum::record([("v", Datum::Long(7)), ("unit", Datum::from("m"))]),
            ),
            ("name", Datum::from("probe")),
        ])
    );
}

#[test]
fn size_prefixed_blocks_decode_and_skip_identically() {
    let schema = Schema::array(Schema::Long);

    // Hand-built stream: block of 2 items with byte size, then a block of
    // one item without, then the terminator.
    let mut data = Vec::new();
    data.push(0x03); // count -2
    data.push(0x04); // block size 2
    data.push(0x02); // 1
    data.push(0x04); // 2
    data.push(0x02); // count 1
    data.push(0x06); // 3
    data.push(0x00); // terminator

    assert_eq!(
        from_bytes(&schema, None, &data).unwrap(),
        Datum::Array(vec![Datum::Long(1), Datum::Long(2), Datum::Long(3)])
    );

    let mut read_cursor = Cursor::new(data.as_slice());
    Reader::new(&schema, &mut read_cursor).read().unwrap();

    let mut skip_cursor = Cursor::new(data.as_slice());
    Reader::new(&schema, &mut skip_cursor)
        .skip(&schema)
        .unwrap();
    assert_eq!(skip_cursor.position(), read_cursor.position());
}

#[test]
fn ambiguous_union_takes_first_match() {
    // A Long datum is accepted by both branches; the writer must tag the
    // lowest index, and the reader must honor the wire tag.
    let schema = Schema::union_of(vec![Schema::Long, Schema::Int]);
    let data = encode(&schema, &Datum::Long(5));
    assert_eq!(data[0], 0x00);
    assert_eq!(from_bytes(&schema, None, &data).unwrap(), Datum::Long(5));
}

#[test]
fn union_to_union_resolution() {
    let writer = Schema::union_of(vec![Schema::Null, Schema::Int, Schema::String]);
    let reader = Schema::union_of(vec![Schema::String, Schema::Double]);

    // int resolves through the reader's double branch.
    let data = encode(&writer, &Datum::Int(3));
    assert_eq!(decode(&writer, &reader, &data), Datum::Double(3.0));

    // string resolves to string.
    let data = encode(&writer, &Datum::from("ok"));
    assert_eq!(decode(&writer, &reader, &data), Datum::from("ok"));

    // null has no home in the reader union.
    let data = encode(&writer, &Datum::Null);
    assert!(from_bytes(&writer, Some(&reader), &data).is_err());
}

#[test]
fn enum_evolution_by_fullname() {
    let writer = Schema::enumeration("colors.Color", &["RED", "GREEN"]);
    let reader = Schema::enumeration("colors.Color", &["RED", "GREEN", "BLUE"]);
    let data = encode(&writer, &Datum::Enum("GREEN".into()));
    assert_eq!(decode(&writer, &reader, &data), Datum::Enum("GREEN".into()));

    // A differently-named enum does not resolve.
    let other = Schema::enumeration("colors.Paint", &["RED", "GREEN"]);
    assert!(from_bytes(&writer, Some(&other), &data).is_err());
}

#[test]
fn fixed_decimal_evolution() {
    // Decimal over fixed pads to the declared size; plain fixed readers of
    // the same name and size see the raw bytes.
    let writer = Schema::decimal_fixed("money.Amount", 4, 7, 2);
    let data = encode(&writer, &Datum::Double(12.34));
    assert_eq!(data, [0x00, 0x00, 0x04, 0xd2]);
    assert_eq!(from_bytes(&writer, None, &data).unwrap(), Datum::Double(12.34));
}

#[test]
fn map_of_records_round_trip() {
    let value_schema = Schema::record(
        "Entry",
        vec![
            Field::new("count", Schema::Long),
            Field::new("flag", Schema::Boolean),
        ],
    );
    let schema = Schema::map(value_schema);

    let mut entries = std::collections::HashMap::new();
    entries.insert(
        "first".to_string(),
        Datum::record([("count", Datum::Long(1)), ("flag", Datum::Boolean(true))]),
    );
    entries.insert(
        "second".to_string(),
        Datum::record([("count", Datum::Long(-2)), ("flag", Datum::Boolean(false))]),
    );
    let datum = Datum::Map(entries);

    let data = encode(&schema, &datum);
    assert_eq!(from_bytes(&schema, None, &data).unwrap(), datum);
}
