// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Converters for date, time and duration types.
//!
//! | S7 type        | Wire form                | Canonical form        |
//! |----------------|--------------------------|-----------------------|
//! | DATE           | UInt16 days since 1990   | `NaiveDate`           |
//! | TIME           | Int32 milliseconds       | `TimeDelta`           |
//! | LTIME          | Int64 nanoseconds        | `TimeDelta`           |
//! | TIME_OF_DAY    | UInt32 ms since midnight | `NaiveTime`           |
//! | LTIME_OF_DAY   | UInt64 ns since midnight | `NaiveTime`           |
//! | S5TIME         | UInt16 base + 3 BCD      | `TimeDelta`           |
//! | DATE_AND_TIME  | 8-byte BCD ByteString    | `NaiveDateTime`       |
//! | DTL            | 12-byte ByteString       | `NaiveDateTime`       |
//! | LDT            | DateTime                 | `NaiveDateTime`       |

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc,
};

use crate::client::session::UaValue;
use crate::error::ConversionError;
use crate::value::{S7Value, ValueKind};

use super::bcd;
use super::{S7TypeConverter, WireType};

const NANOS_PER_DAY: u64 = 86_400 * 1_000_000_000;
const MILLIS_PER_DAY: u32 = 86_400_000;

fn mismatch(expected: &str, raw: &UaValue) -> ConversionError {
    ConversionError::type_mismatch(expected, raw.type_name())
}

fn wrong_kind(expected: &str, value: &S7Value) -> ConversionError {
    ConversionError::type_mismatch(expected, value.kind().to_string())
}

fn integer(raw: &UaValue, expected: &str) -> Result<i128, ConversionError> {
    match raw {
        UaValue::UInt64(v) => Ok(*v as i128),
        other => other
            .as_i64()
            .map(|v| v as i128)
            .ok_or_else(|| mismatch(expected, other)),
    }
}

fn epoch_1990() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default()
}

fn duration_from(value: &S7Value, expected: &str) -> Result<TimeDelta, ConversionError> {
    match value {
        S7Value::Duration(d) => Ok(*d),
        other => Err(wrong_kind(expected, other)),
    }
}

fn datetime_from(value: &S7Value, expected: &str) -> Result<NaiveDateTime, ConversionError> {
    match value {
        S7Value::DateTime(dt) => Ok(*dt),
        S7Value::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
        other => Err(wrong_kind(expected, other)),
    }
}

fn time_from(value: &S7Value, expected: &str) -> Result<NaiveTime, ConversionError> {
    match value {
        S7Value::TimeOfDay(t) => Ok(*t),
        other => Err(wrong_kind(expected, other)),
    }
}

fn nanos_since_midnight(t: NaiveTime) -> u64 {
    t.num_seconds_from_midnight() as u64 * 1_000_000_000 + t.nanosecond() as u64
}

/// 1 = Sunday .. 7 = Saturday.
fn s7_weekday(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8 + 1
}

// =============================================================================
// DATE
// =============================================================================

/// DATE: days since 1990-01-01 as UInt16.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateConverter;

impl S7TypeConverter for DateConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::Date
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::UInt16)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        let days = integer(raw, "UInt16")?;
        if !(0..=u16::MAX as i128).contains(&days) {
            return Err(ConversionError::value_out_of_range(days, 0, u16::MAX as i128));
        }
        epoch_1990()
            .checked_add_signed(TimeDelta::days(days as i64))
            .map(S7Value::Date)
            .ok_or_else(|| ConversionError::invalid_value("DATE", format!("{days} days overflows")))
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let date = match value {
            S7Value::Date(d) => *d,
            S7Value::DateTime(dt) => dt.date(),
            other => return Err(wrong_kind("date", other)),
        };
        let days = (date - epoch_1990()).num_days();
        u16::try_from(days)
            .map(UaValue::UInt16)
            .map_err(|_| ConversionError::value_out_of_range(days, 0, u16::MAX as i64))
    }

    fn name(&self) -> &'static str {
        "DateConverter"
    }
}

// =============================================================================
// TIME / LTIME
// =============================================================================

/// TIME: signed milliseconds as Int32.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeConverter;

impl S7TypeConverter for TimeConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::Duration
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::Int32)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        let ms = integer(raw, "Int32")?;
        let ms = i32::try_from(ms)
            .map_err(|_| ConversionError::value_out_of_range(ms, i32::MIN as i128, i32::MAX as i128))?;
        Ok(S7Value::Duration(TimeDelta::milliseconds(ms as i64)))
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let ms = duration_from(value, "duration")?.num_milliseconds();
        i32::try_from(ms)
            .map(UaValue::Int32)
            .map_err(|_| ConversionError::value_out_of_range(ms, i32::MIN as i64, i32::MAX as i64))
    }

    fn name(&self) -> &'static str {
        "TimeConverter"
    }
}

/// LTIME: signed nanoseconds as Int64.
#[derive(Debug, Clone, Copy, Default)]
pub struct LTimeConverter;

impl S7TypeConverter for LTimeConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::Duration
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::Int64)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        let ns = integer(raw, "Int64")?;
        let ns = i64::try_from(ns)
            .map_err(|_| ConversionError::value_out_of_range(ns, i64::MIN as i128, i64::MAX as i128))?;
        Ok(S7Value::Duration(TimeDelta::nanoseconds(ns)))
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let d = duration_from(value, "duration")?;
        d.num_nanoseconds()
            .map(UaValue::Int64)
            .ok_or_else(|| ConversionError::invalid_value("LTIME", format!("{d} overflows 64-bit nanoseconds")))
    }

    fn name(&self) -> &'static str {
        "LTimeConverter"
    }
}

// =============================================================================
// TIME_OF_DAY / LTIME_OF_DAY
// =============================================================================

/// TIME_OF_DAY: milliseconds since midnight as UInt32.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOfDayConverter;

impl S7TypeConverter for TimeOfDayConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::TimeOfDay
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::UInt32)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        let ms = integer(raw, "UInt32")?;
        if !(0..MILLIS_PER_DAY as i128).contains(&ms) {
            return Err(ConversionError::value_out_of_range(ms, 0, MILLIS_PER_DAY as i128 - 1));
        }
        let ms = ms as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(ms / 1000, (ms % 1000) * 1_000_000)
            .map(S7Value::TimeOfDay)
            .ok_or_else(|| ConversionError::invalid_value("TIME_OF_DAY", format!("{ms} ms")))
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let t = time_from(value, "time of day")?;
        let ms = t.num_seconds_from_midnight() * 1000 + (t.nanosecond() % 1_000_000_000) / 1_000_000;
        Ok(UaValue::UInt32(ms))
    }

    fn name(&self) -> &'static str {
        "TimeOfDayConverter"
    }
}

/// LTIME_OF_DAY: nanoseconds since midnight as UInt64.
#[derive(Debug, Clone, Copy, Default)]
pub struct LTimeOfDayConverter;

impl S7TypeConverter for LTimeOfDayConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::TimeOfDay
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::UInt64)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        let ns = integer(raw, "UInt64")?;
        if !(0..NANOS_PER_DAY as i128).contains(&ns) {
            return Err(ConversionError::value_out_of_range(ns, 0, NANOS_PER_DAY as i128 - 1));
        }
        let ns = ns as u64;
        NaiveTime::from_num_seconds_from_midnight_opt(
            (ns / 1_000_000_000) as u32,
            (ns % 1_000_000_000) as u32,
        )
        .map(S7Value::TimeOfDay)
        .ok_or_else(|| ConversionError::invalid_value("LTIME_OF_DAY", format!("{ns} ns")))
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let t = time_from(value, "time of day")?;
        Ok(UaValue::UInt64(nanos_since_midnight(t).min(NANOS_PER_DAY - 1)))
    }

    fn name(&self) -> &'static str {
        "LTimeOfDayConverter"
    }
}

// =============================================================================
// S5TIME
// =============================================================================

/// Time bases of S5TIME in milliseconds, indexed by the two base bits.
pub const S5TIME_BASES_MS: [i64; 4] = [10, 100, 1_000, 10_000];

/// Largest duration representable by S5TIME (999 * 10 s).
pub const S5TIME_MAX_MS: i64 = 9_990_000;

/// S5TIME: 16-bit word with a 2-bit time base (bits 13-12) and three BCD
/// digits (bits 11-0).
///
/// Encoding picks the finest base that holds the rounded value.
#[derive(Debug, Clone, Copy, Default)]
pub struct S5TimeConverter;

impl S5TimeConverter {
    /// Decodes an S5TIME word to milliseconds.
    pub fn decode(word: u16) -> Result<i64, ConversionError> {
        let base = S5TIME_BASES_MS[((word >> 12) & 0x03) as usize];
        let count = bcd::decode_three_digits(word)? as i64;
        Ok(count * base)
    }

    /// Encodes milliseconds to an S5TIME word.
    pub fn encode(ms: i64) -> Result<u16, ConversionError> {
        if !(0..=S5TIME_MAX_MS).contains(&ms) {
            return Err(ConversionError::value_out_of_range(ms, 0, S5TIME_MAX_MS));
        }
        for (index, base) in S5TIME_BASES_MS.iter().enumerate() {
            let count = (ms + base / 2) / base;
            if count <= 999 {
                let digits = bcd::encode_three_digits(count as u16)?;
                return Ok(((index as u16) << 12) | digits);
            }
        }
        Err(ConversionError::value_out_of_range(ms, 0, S5TIME_MAX_MS))
    }
}

impl S7TypeConverter for S5TimeConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::Duration
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::UInt16)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        let word = match raw {
            UaValue::ByteString(bytes) => match bytes.as_slice() {
                [high, low] => u16::from_be_bytes([*high, *low]),
                other => return Err(ConversionError::invalid_length("S5TIME", 2, other.len())),
            },
            other => {
                let v = integer(other, "UInt16")?;
                u16::try_from(v).map_err(|_| ConversionError::value_out_of_range(v, 0, u16::MAX as i128))?
            }
        };
        Ok(S7Value::Duration(TimeDelta::milliseconds(Self::decode(word)?)))
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let ms = duration_from(value, "duration")?.num_milliseconds();
        Self::encode(ms).map(UaValue::UInt16)
    }

    fn name(&self) -> &'static str {
        "S5TimeConverter"
    }
}

// =============================================================================
// DATE_AND_TIME
// =============================================================================

/// Length of the DATE_AND_TIME byte representation.
pub const DATE_AND_TIME_LEN: usize = 8;

/// DATE_AND_TIME: eight BCD bytes.
///
/// ```text
/// b0 year (90-99 => 199x, 00-89 => 20xx)   b4 minute
/// b1 month                                  b5 second
/// b2 day                                    b6 ms hundreds/tens
/// b3 hour                                   b7 ms ones (high) | weekday (low)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DateAndTimeConverter;

impl DateAndTimeConverter {
    /// Decodes eight BCD bytes. The weekday nibble is ignored.
    pub fn decode(bytes: &[u8]) -> Result<NaiveDateTime, ConversionError> {
        if bytes.len() != DATE_AND_TIME_LEN {
            return Err(ConversionError::invalid_length(
                "DATE_AND_TIME",
                DATE_AND_TIME_LEN,
                bytes.len(),
            ));
        }

        let year = bcd::decode_byte(bytes[0], 0)? as i32;
        let year = if year >= 90 { 1900 + year } else { 2000 + year };
        let month = bcd::decode_byte(bytes[1], 1)? as u32;
        let day = bcd::decode_byte(bytes[2], 2)? as u32;
        let hour = bcd::decode_byte(bytes[3], 3)? as u32;
        let minute = bcd::decode_byte(bytes[4], 4)? as u32;
        let second = bcd::decode_byte(bytes[5], 5)? as u32;
        let ms_high = bcd::decode_byte(bytes[6], 6)? as u32;
        let ms_ones = bcd::decode_nibble(bytes[7] >> 4, bytes[7], 7)? as u32;
        let millis = ms_high * 10 + ms_ones;

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_milli_opt(hour, minute, second, millis))
            .ok_or_else(|| {
                ConversionError::invalid_value(
                    "DATE_AND_TIME",
                    format!(
                        "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{millis:03} is not a valid date"
                    ),
                )
            })
    }

    /// Encodes a timestamp between 1990 and 2089 into eight BCD bytes.
    pub fn encode(dt: &NaiveDateTime) -> Result<[u8; DATE_AND_TIME_LEN], ConversionError> {
        let year = dt.year();
        if !(1990..=2089).contains(&year) {
            return Err(ConversionError::value_out_of_range(year, 1990, 2089));
        }
        let millis = (dt.nanosecond() % 1_000_000_000) / 1_000_000;

        Ok([
            bcd::encode_byte((year % 100) as u8)?,
            bcd::encode_byte(dt.month() as u8)?,
            bcd::encode_byte(dt.day() as u8)?,
            bcd::encode_byte(dt.hour() as u8)?,
            bcd::encode_byte(dt.minute() as u8)?,
            bcd::encode_byte(dt.second() as u8)?,
            bcd::encode_byte((millis / 10) as u8)?,
            (((millis % 10) as u8) << 4) | s7_weekday(dt.date()),
        ])
    }
}

impl S7TypeConverter for DateAndTimeConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::DateTime
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::ByteString)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        match raw {
            UaValue::ByteString(bytes) => Self::decode(bytes).map(S7Value::DateTime),
            UaValue::Array(items) => {
                let bytes = items
                    .iter()
                    .map(|item| match item {
                        UaValue::Byte(b) => Ok(*b),
                        other => Err(mismatch("Byte", other)),
                    })
                    .collect::<Result<Vec<u8>, _>>()?;
                Self::decode(&bytes).map(S7Value::DateTime)
            }
            other => Err(mismatch("ByteString", other)),
        }
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let dt = datetime_from(value, "datetime")?;
        Ok(UaValue::ByteString(Self::encode(&dt)?.to_vec()))
    }

    fn name(&self) -> &'static str {
        "DateAndTimeConverter"
    }
}

// =============================================================================
// DTL
// =============================================================================

/// Length of the DTL byte representation.
pub const DTL_LEN: usize = 12;

/// DTL: twelve bytes, big endian.
///
/// ```text
/// b0-1 year   b2 month   b3 day   b4 weekday (1 = Sunday)
/// b5 hour     b6 minute  b7 second
/// b8-11 nanoseconds
/// ```
///
/// Nanoseconds are truncated to 100 ns on both paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct DtlConverter;

impl DtlConverter {
    /// Decodes twelve DTL bytes. The weekday byte is ignored.
    pub fn decode(bytes: &[u8]) -> Result<NaiveDateTime, ConversionError> {
        let bytes: &[u8; DTL_LEN] = bytes
            .try_into()
            .map_err(|_| ConversionError::invalid_length("DTL", DTL_LEN, bytes.len()))?;

        let year = u16::from_be_bytes([bytes[0], bytes[1]]) as i32;
        let (month, day) = (bytes[2] as u32, bytes[3] as u32);
        let (hour, minute, second) = (bytes[5] as u32, bytes[6] as u32, bytes[7] as u32);
        let nanos = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        if nanos >= 1_000_000_000 {
            return Err(ConversionError::value_out_of_range(nanos, 0, 999_999_999));
        }
        let nanos = nanos - nanos % 100;

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_nano_opt(hour, minute, second, nanos))
            .ok_or_else(|| {
                ConversionError::invalid_value(
                    "DTL",
                    format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02} is not a valid date"),
                )
            })
    }

    /// Encodes a timestamp between 1970 and 2262 into twelve DTL bytes.
    pub fn encode(dt: &NaiveDateTime) -> Result<[u8; DTL_LEN], ConversionError> {
        let year = dt.year();
        if !(1970..=2262).contains(&year) {
            return Err(ConversionError::value_out_of_range(year, 1970, 2262));
        }
        let nanos = dt.nanosecond() % 1_000_000_000;
        let nanos = nanos - nanos % 100;

        let mut out = [0u8; DTL_LEN];
        out[0..2].copy_from_slice(&(year as u16).to_be_bytes());
        out[2] = dt.month() as u8;
        out[3] = dt.day() as u8;
        out[4] = s7_weekday(dt.date());
        out[5] = dt.hour() as u8;
        out[6] = dt.minute() as u8;
        out[7] = dt.second() as u8;
        out[8..12].copy_from_slice(&nanos.to_be_bytes());
        Ok(out)
    }
}

impl S7TypeConverter for DtlConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::DateTime
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::ByteString)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        match raw {
            UaValue::ByteString(bytes) => Self::decode(bytes).map(S7Value::DateTime),
            other => Err(mismatch("ByteString", other)),
        }
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let dt = datetime_from(value, "datetime")?;
        Ok(UaValue::ByteString(Self::encode(&dt)?.to_vec()))
    }

    fn name(&self) -> &'static str {
        "DtlConverter"
    }
}

// =============================================================================
// LDT
// =============================================================================

/// LDT: native DateTime on the wire. Int64 nanoseconds since the Unix epoch
/// are also accepted on read.
#[derive(Debug, Clone, Copy, Default)]
pub struct LdtConverter;

impl S7TypeConverter for LdtConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::DateTime
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::DateTime)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        match raw {
            UaValue::DateTime(dt) => Ok(S7Value::DateTime(dt.naive_utc())),
            UaValue::Int64(ns) => Ok(S7Value::DateTime(DateTime::<Utc>::from_timestamp_nanos(*ns).naive_utc())),
            UaValue::UInt64(ns) => {
                let ns = i64::try_from(*ns)
                    .map_err(|_| ConversionError::value_out_of_range(*ns, 0, i64::MAX as u64))?;
                Ok(S7Value::DateTime(DateTime::<Utc>::from_timestamp_nanos(ns).naive_utc()))
            }
            other => Err(mismatch("DateTime", other)),
        }
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let dt = datetime_from(value, "datetime")?;
        Ok(UaValue::DateTime(Utc.from_utc_datetime(&dt)))
    }

    fn name(&self) -> &'static str {
        "LdtConverter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap()
    }

    #[test]
    fn test_date_and_time_decode() {
        let bytes = [0x24, 0x03, 0x15, 0x13, 0x45, 0x30, 0x12, 0x35];
        assert_eq!(
            DateAndTimeConverter::decode(&bytes).unwrap(),
            dt(2024, 3, 15, 13, 45, 30, 123)
        );

        let nineties = [0x95, 0x12, 0x31, 0x23, 0x59, 0x59, 0x99, 0x91];
        assert_eq!(
            DateAndTimeConverter::decode(&nineties).unwrap(),
            dt(1995, 12, 31, 23, 59, 59, 999)
        );
    }

    #[test]
    fn test_date_and_time_encode_weekday() {
        // 2024-03-15 is a Friday (6).
        let bytes = DateAndTimeConverter::encode(&dt(2024, 3, 15, 13, 45, 30, 123)).unwrap();
        assert_eq!(bytes, [0x24, 0x03, 0x15, 0x13, 0x45, 0x30, 0x12, 0x36]);

        // 2023-01-01 is a Sunday (1).
        let bytes = DateAndTimeConverter::encode(&dt(2023, 1, 1, 0, 0, 0, 0)).unwrap();
        assert_eq!(bytes[7], 0x01);
    }

    #[test]
    fn test_date_and_time_errors() {
        assert!(matches!(
            DateAndTimeConverter::decode(&[0x24, 0x03]),
            Err(ConversionError::InvalidLength { expected: 8, actual: 2, .. })
        ));
        assert!(DateAndTimeConverter::decode(&[0x2A, 0x03, 0x15, 0, 0, 0, 0, 0]).is_err());
        assert!(DateAndTimeConverter::decode(&[0x24, 0x02, 0x30, 0, 0, 0, 0, 0]).is_err());
        assert!(DateAndTimeConverter::encode(&dt(2090, 1, 1, 0, 0, 0, 0)).is_err());
        assert!(DateAndTimeConverter::encode(&dt(1989, 12, 31, 0, 0, 0, 0)).is_err());
    }

    #[test]
    fn test_date_and_time_converter_roundtrip() {
        let c = DateAndTimeConverter;
        let value = S7Value::DateTime(dt(2001, 9, 9, 1, 46, 40, 7));
        let raw = c.to_protocol(&value).unwrap();
        assert_eq!(c.from_protocol(&raw).unwrap(), value);
    }

    #[test]
    fn test_s5time_decode() {
        assert_eq!(S5TimeConverter::decode(0x0123).unwrap(), 1_230);
        assert_eq!(S5TimeConverter::decode(0x1123).unwrap(), 12_300);
        assert_eq!(S5TimeConverter::decode(0x2123).unwrap(), 123_000);
        assert_eq!(S5TimeConverter::decode(0x3999).unwrap(), S5TIME_MAX_MS);
        assert!(S5TimeConverter::decode(0x00AB).is_err());
    }

    #[test]
    fn test_s5time_encode_picks_finest_base() {
        assert_eq!(S5TimeConverter::encode(0).unwrap(), 0x0000);
        assert_eq!(S5TimeConverter::encode(1_230).unwrap(), 0x0123);
        assert_eq!(S5TimeConverter::encode(9_990).unwrap(), 0x0999);
        assert_eq!(S5TimeConverter::encode(10_000).unwrap(), 0x1100);
        assert_eq!(S5TimeConverter::encode(S5TIME_MAX_MS).unwrap(), 0x3999);
        assert!(S5TimeConverter::encode(-1).is_err());
        assert!(S5TimeConverter::encode(S5TIME_MAX_MS + 1).is_err());
    }

    #[test]
    fn test_s5time_converter_accepts_byte_string() {
        let c = S5TimeConverter;
        assert_eq!(
            c.from_protocol(&UaValue::ByteString(vec![0x21, 0x23])).unwrap(),
            S7Value::Duration(TimeDelta::seconds(123))
        );
        assert_eq!(
            c.to_protocol(&S7Value::Duration(TimeDelta::seconds(123))).unwrap(),
            UaValue::UInt16(0x2123)
        );
    }

    #[test]
    fn test_dtl_roundtrip_and_truncation() {
        let value = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_nano_opt(13, 45, 30, 123_456_789)
            .unwrap();
        let bytes = DtlConverter::encode(&value).unwrap();
        assert_eq!(&bytes[0..2], &2024u16.to_be_bytes());
        assert_eq!(bytes[4], 6);
        assert_eq!(u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]), 123_456_700);

        let decoded = DtlConverter::decode(&bytes).unwrap();
        assert_eq!(decoded.nanosecond(), 123_456_700);
        assert!(DtlConverter::decode(&bytes[..11]).is_err());
    }

    #[test]
    fn test_date() {
        let c = DateConverter;
        assert_eq!(
            c.from_protocol(&UaValue::UInt16(0)).unwrap(),
            S7Value::Date(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
        );
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let raw = c.to_protocol(&S7Value::Date(d)).unwrap();
        assert_eq!(raw, UaValue::UInt16(12_418));
        assert!(c
            .to_protocol(&S7Value::Date(NaiveDate::from_ymd_opt(1989, 1, 1).unwrap()))
            .is_err());
    }

    #[test]
    fn test_time_and_ltime() {
        assert_eq!(
            TimeConverter.from_protocol(&UaValue::Int32(-250)).unwrap(),
            S7Value::Duration(TimeDelta::milliseconds(-250))
        );
        assert_eq!(
            LTimeConverter.to_protocol(&S7Value::Duration(TimeDelta::microseconds(3))).unwrap(),
            UaValue::Int64(3_000)
        );
        assert!(TimeConverter
            .to_protocol(&S7Value::Duration(TimeDelta::days(30)))
            .is_err());
    }

    #[test]
    fn test_time_of_day() {
        let t = NaiveTime::from_hms_milli_opt(12, 0, 0, 5).unwrap();
        assert_eq!(
            TimeOfDayConverter.to_protocol(&S7Value::TimeOfDay(t)).unwrap(),
            UaValue::UInt32(43_200_005)
        );
        assert!(TimeOfDayConverter.from_protocol(&UaValue::UInt32(MILLIS_PER_DAY)).is_err());
        assert_eq!(
            LTimeOfDayConverter.from_protocol(&UaValue::UInt64(1)).unwrap(),
            S7Value::TimeOfDay(NaiveTime::from_hms_nano_opt(0, 0, 0, 1).unwrap())
        );
    }

    #[test]
    fn test_ldt() {
        let c = LdtConverter;
        let value = dt(2024, 3, 15, 0, 0, 0, 0);
        let raw = c.to_protocol(&S7Value::DateTime(value)).unwrap();
        assert!(matches!(raw, UaValue::DateTime(_)));
        assert_eq!(c.from_protocol(&raw).unwrap(), S7Value::DateTime(value));
        assert_eq!(
            c.from_protocol(&UaValue::Int64(0)).unwrap(),
            S7Value::DateTime(DateTime::<Utc>::from_timestamp(0, 0).unwrap().naive_utc())
        );
    }
}
