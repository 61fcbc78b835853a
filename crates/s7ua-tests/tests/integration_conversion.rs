// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Type Conversion Integration Tests
//!
//! Conversion through the per-type converter table, as used by reads and
//! writes.
//!
//! - `test_bcd_*`: DATE_AND_TIME and S5TIME
//! - `test_dtl_*`: DTL
//! - `test_char_*`: CHAR and WCHAR
//! - `test_array_*`: Arrays of S7 types

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use s7ua::conversion::temporal::S5TIME_MAX_MS;
use s7ua::conversion::{self, DateAndTimeConverter, DtlConverter, S5TimeConverter};
use s7ua::{ConversionError, S7DataType, S7Value, UaValue, ValueKind};

use s7ua_tests::common::STAMP_BYTES;

fn timestamp(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_milli_opt(h, mi, s, ms)
        .unwrap()
}

// =============================================================================
// BCD types
// =============================================================================

#[test]
fn test_bcd_date_and_time_through_table() {
    let (value, kind) =
        conversion::from_protocol(S7DataType::DateAndTime, &UaValue::ByteString(STAMP_BYTES.to_vec()))
            .unwrap();

    let expected = timestamp(2024, 3, 15, 13, 45, 30, 123);
    assert_eq!(value, S7Value::DateTime(expected));
    assert_eq!(kind, ValueKind::DateTime);

    let raw = conversion::to_protocol(S7DataType::DateAndTime, &value).unwrap();
    assert_eq!(raw, UaValue::ByteString(STAMP_BYTES.to_vec()));
}

#[test]
fn test_bcd_date_and_time_century_pivot() {
    let nineties = DateAndTimeConverter::encode(&timestamp(1995, 12, 31, 23, 59, 59, 999)).unwrap();
    assert_eq!(nineties[0], 0x95);
    assert_eq!(
        DateAndTimeConverter::decode(&nineties).unwrap(),
        timestamp(1995, 12, 31, 23, 59, 59, 999)
    );

    let late = DateAndTimeConverter::encode(&timestamp(2089, 1, 1, 0, 0, 0, 0)).unwrap();
    assert_eq!(
        DateAndTimeConverter::decode(&late).unwrap(),
        timestamp(2089, 1, 1, 0, 0, 0, 0)
    );

    assert!(DateAndTimeConverter::encode(&timestamp(2090, 1, 1, 0, 0, 0, 0)).is_err());
    assert!(DateAndTimeConverter::encode(&timestamp(1989, 12, 31, 0, 0, 0, 0)).is_err());
}

#[test]
fn test_bcd_date_and_time_rejects_bad_input() {
    let mut bytes = STAMP_BYTES;
    bytes[1] = 0x1A;
    let err = DateAndTimeConverter::decode(&bytes).unwrap_err();
    assert!(err.to_string().contains("BCD"));
    assert!(DateAndTimeConverter::decode(&STAMP_BYTES[..7]).is_err());

    let result = conversion::from_protocol(S7DataType::DateAndTime, &UaValue::Int32(1));
    assert!(result.is_err());
}

#[test]
fn test_bcd_s5time_round_trips_through_table() {
    for (word, ms) in [(0x0010u16, 100i64), (0x1999, 99_900), (0x2123, 123_000), (0x3999, 9_990_000)] {
        let (value, _) = conversion::from_protocol(S7DataType::S5Time, &UaValue::UInt16(word)).unwrap();
        assert_eq!(value, S7Value::Duration(TimeDelta::milliseconds(ms)));
        assert_eq!(
            conversion::to_protocol(S7DataType::S5Time, &value).unwrap(),
            UaValue::UInt16(word)
        );
    }
}

#[test]
fn test_bcd_s5time_picks_finest_base_and_rounds() {
    assert_eq!(S5TimeConverter::encode(9_990).unwrap(), 0x0999);
    assert_eq!(S5TimeConverter::encode(9_996).unwrap(), 0x1100);
    assert_eq!(S5TimeConverter::encode(0).unwrap(), 0x0000);
    assert!(S5TimeConverter::encode(S5TIME_MAX_MS + 1).is_err());
    assert!(S5TimeConverter::encode(-1).is_err());
    assert!(S5TimeConverter::decode(0x00A0).is_err());
}

// =============================================================================
// DTL
// =============================================================================

#[test]
fn test_dtl_through_table_truncates_to_100ns() {
    let dt = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_nano_opt(13, 45, 30, 123_456_789)
        .unwrap();

    let raw = conversion::to_protocol(S7DataType::Dtl, &S7Value::DateTime(dt)).unwrap();
    let UaValue::ByteString(bytes) = &raw else {
        panic!("expected byte string");
    };
    assert_eq!(bytes.len(), 12);
    assert_eq!(&bytes[0..2], &2024u16.to_be_bytes());
    assert_eq!(bytes[4], 6);

    let (value, _) = conversion::from_protocol(S7DataType::Dtl, &raw).unwrap();
    let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_nano_opt(13, 45, 30, 123_456_700)
        .unwrap();
    assert_eq!(value, S7Value::DateTime(expected));
}

#[test]
fn test_dtl_rejects_wrong_length() {
    assert!(matches!(
        DtlConverter::decode(&[0u8; 8]),
        Err(ConversionError::InvalidLength { .. })
    ));
}

// =============================================================================
// CHAR / WCHAR
// =============================================================================

#[test]
fn test_char_narrow_is_latin1() {
    let raw = conversion::to_protocol(S7DataType::Char, &S7Value::Char('é')).unwrap();
    assert_eq!(raw, UaValue::Byte(0xE9));
    assert!(conversion::to_protocol(S7DataType::Char, &S7Value::Char('€')).is_err());

    let (value, _) = conversion::from_protocol(S7DataType::Char, &UaValue::Byte(b'A')).unwrap();
    assert_eq!(value, S7Value::Char('A'));
}

#[test]
fn test_char_wide_rejects_surrogates() {
    let (value, _) = conversion::from_protocol(S7DataType::WChar, &UaValue::UInt16(0x20AC)).unwrap();
    assert_eq!(value, S7Value::Char('€'));
    assert!(conversion::from_protocol(S7DataType::WChar, &UaValue::UInt16(0xD800)).is_err());
}

// =============================================================================
// Arrays
// =============================================================================

#[test]
fn test_array_of_int_checks_each_element() {
    let value = S7Value::Array(vec![S7Value::I16(1), S7Value::I16(-2)]);
    assert_eq!(
        conversion::to_protocol(S7DataType::ArrayOfInt, &value).unwrap(),
        UaValue::Array(vec![UaValue::Int16(1), UaValue::Int16(-2)])
    );

    let bad = S7Value::Array(vec![S7Value::I16(1), S7Value::I32(40_000)]);
    assert!(matches!(
        conversion::to_protocol(S7DataType::ArrayOfInt, &bad),
        Err(ConversionError::ArrayConversionFailed { index: 1, .. })
    ));
}

#[test]
fn test_array_of_s5time_from_words() {
    let raw = UaValue::Array(vec![UaValue::UInt16(0x2001), UaValue::UInt16(0x1005)]);
    let (value, kind) = conversion::from_protocol(S7DataType::ArrayOfS5Time, &raw).unwrap();

    assert_eq!(
        value,
        S7Value::Array(vec![
            S7Value::Duration(TimeDelta::seconds(1)),
            S7Value::Duration(TimeDelta::milliseconds(500)),
        ])
    );
    assert_eq!(kind, ValueKind::Array(Box::new(ValueKind::Duration)));
}
