// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Conversion between raw protocol values and canonical S7 values.
//!
//! Every S7 type has one [`S7TypeConverter`]. The process-wide table returned
//! by [`converter_for`] is built once on first use; types without an entry
//! (STRUCT, UDT, UNKNOWN) fall back to a [`DefaultConverter`] that passes the
//! value through its natural mapping.
//!
//! # Example
//!
//! ```
//! use s7ua::conversion::converter_for;
//! use s7ua::{S7DataType, S7Value, UaValue};
//!
//! let converter = converter_for(S7DataType::Time).unwrap();
//! let value = converter.from_protocol(&UaValue::Int32(1500)).unwrap();
//! assert_eq!(value, S7Value::Duration(chrono::TimeDelta::milliseconds(1500)));
//! ```

pub mod array;
pub mod bcd;
pub mod primitive;
pub mod temporal;
pub mod udt;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;

use crate::client::session::UaValue;
use crate::data_type::S7DataType;
use crate::error::ConversionError;
use crate::value::{S7Value, ValueKind};

pub use array::ArrayConverter;
pub use primitive::{CharConverter, NumericConverter, StringConverter};
pub use temporal::{
    DateAndTimeConverter, DateConverter, DtlConverter, LdtConverter, LTimeConverter,
    LTimeOfDayConverter, S5TimeConverter, TimeConverter, TimeOfDayConverter,
};
pub use udt::{
    FromS7Value, MemberView, StructConverter, TypedUdtConverter, UdtConverter,
    UdtConverterAdapter,
};

// =============================================================================
// S7TypeConverter
// =============================================================================

/// Converts one S7 type between its wire form and its canonical form.
pub trait S7TypeConverter: Send + Sync {
    /// Kind of value produced by [`from_protocol`](Self::from_protocol).
    fn target_type(&self) -> ValueKind;

    /// Wire type this converter emits, if fixed.
    fn wire_type(&self) -> Option<WireType> {
        None
    }

    /// Converts a raw value to its canonical form.
    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError>;

    /// Converts a canonical value to its raw form.
    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError>;

    /// Returns the converter name for logging.
    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn S7TypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// WireType
// =============================================================================

/// Variant tag of a [`UaValue`], used where the raw element type must be
/// known independently of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// `Boolean`
    Boolean,
    /// `SByte`
    SByte,
    /// `Byte`
    Byte,
    /// `Int16`
    Int16,
    /// `UInt16`
    UInt16,
    /// `Int32`
    Int32,
    /// `UInt32`
    UInt32,
    /// `Int64`
    Int64,
    /// `UInt64`
    UInt64,
    /// `Float`
    Float,
    /// `Double`
    Double,
    /// `String`
    String,
    /// `DateTime`
    DateTime,
    /// `ByteString`
    ByteString,
}

impl WireType {
    /// Returns the wire type of a raw value, `None` for composite values.
    pub fn of(value: &UaValue) -> Option<Self> {
        Some(match value {
            UaValue::Boolean(_) => Self::Boolean,
            UaValue::SByte(_) => Self::SByte,
            UaValue::Byte(_) => Self::Byte,
            UaValue::Int16(_) => Self::Int16,
            UaValue::UInt16(_) => Self::UInt16,
            UaValue::Int32(_) => Self::Int32,
            UaValue::UInt32(_) => Self::UInt32,
            UaValue::Int64(_) => Self::Int64,
            UaValue::UInt64(_) => Self::UInt64,
            UaValue::Float(_) => Self::Float,
            UaValue::Double(_) => Self::Double,
            UaValue::String(_) => Self::String,
            UaValue::DateTime(_) => Self::DateTime,
            UaValue::ByteString(_) => Self::ByteString,
            UaValue::Guid(_) | UaValue::NodeId(_) | UaValue::Array(_) | UaValue::Null => {
                return None
            }
        })
    }

    /// Returns `true` if the raw value has this wire type.
    #[inline]
    pub fn matches(&self, value: &UaValue) -> bool {
        Self::of(value) == Some(*self)
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// =============================================================================
// DefaultConverter
// =============================================================================

/// Pass-through converter for types without a dedicated codec.
///
/// Raw values are mapped onto their natural canonical counterpart and the
/// caller-supplied fallback kind is reported as target type.
#[derive(Debug, Clone)]
pub struct DefaultConverter {
    fallback: ValueKind,
}

impl DefaultConverter {
    /// Creates a converter reporting `fallback` as its target type.
    pub fn new(fallback: ValueKind) -> Self {
        Self { fallback }
    }
}

impl S7TypeConverter for DefaultConverter {
    fn target_type(&self) -> ValueKind {
        self.fallback.clone()
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        natural_value(raw)
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        natural_raw(value)
    }

    fn name(&self) -> &'static str {
        "DefaultConverter"
    }
}

/// Maps a raw value onto the canonical value of the same shape.
pub fn natural_value(raw: &UaValue) -> Result<S7Value, ConversionError> {
    Ok(match raw {
        UaValue::Boolean(v) => S7Value::Bool(*v),
        UaValue::SByte(v) => S7Value::I8(*v),
        UaValue::Byte(v) => S7Value::U8(*v),
        UaValue::Int16(v) => S7Value::I16(*v),
        UaValue::UInt16(v) => S7Value::U16(*v),
        UaValue::Int32(v) => S7Value::I32(*v),
        UaValue::UInt32(v) => S7Value::U32(*v),
        UaValue::Int64(v) => S7Value::I64(*v),
        UaValue::UInt64(v) => S7Value::U64(*v),
        UaValue::Float(v) => S7Value::F32(*v),
        UaValue::Double(v) => S7Value::F64(*v),
        UaValue::String(v) => S7Value::String(v.clone()),
        UaValue::DateTime(v) => S7Value::DateTime(v.naive_utc()),
        UaValue::Guid(v) => S7Value::String(v.to_string()),
        UaValue::NodeId(v) => S7Value::String(v.to_string()),
        UaValue::ByteString(bytes) => {
            S7Value::Array(bytes.iter().copied().map(S7Value::U8).collect())
        }
        UaValue::Array(items) => S7Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    natural_value(item).map_err(|e| ConversionError::array_element(i, &e))
                })
                .collect::<Result<_, _>>()?,
        ),
        UaValue::Null => return Err(ConversionError::NullValue),
    })
}

/// Maps a canonical value onto the raw value of the same shape.
pub fn natural_raw(value: &S7Value) -> Result<UaValue, ConversionError> {
    Ok(match value {
        S7Value::Bool(v) => UaValue::Boolean(*v),
        S7Value::I8(v) => UaValue::SByte(*v),
        S7Value::U8(v) => UaValue::Byte(*v),
        S7Value::I16(v) => UaValue::Int16(*v),
        S7Value::U16(v) => UaValue::UInt16(*v),
        S7Value::I32(v) => UaValue::Int32(*v),
        S7Value::U32(v) => UaValue::UInt32(*v),
        S7Value::I64(v) => UaValue::Int64(*v),
        S7Value::U64(v) => UaValue::UInt64(*v),
        S7Value::F32(v) => UaValue::Float(*v),
        S7Value::F64(v) => UaValue::Double(*v),
        S7Value::Char(v) => UaValue::String(v.to_string()),
        S7Value::String(v) => UaValue::String(v.clone()),
        S7Value::DateTime(v) => UaValue::DateTime(Utc.from_utc_datetime(v)),
        S7Value::Array(items) => UaValue::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| natural_raw(item).map_err(|e| ConversionError::array_element(i, &e)))
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(ConversionError::unsupported_type(format!(
                "{} has no natural wire form",
                other.kind()
            )))
        }
    })
}

/// Returns the natural kind of a raw value.
pub fn natural_kind(raw: &UaValue) -> ValueKind {
    natural_value(raw)
        .map(|v| v.kind())
        .unwrap_or(ValueKind::Null)
}

// =============================================================================
// Converter lookup
// =============================================================================

static CONVERTERS: Lazy<HashMap<S7DataType, Arc<dyn S7TypeConverter>>> =
    Lazy::new(build_converters);

fn build_converters() -> HashMap<S7DataType, Arc<dyn S7TypeConverter>> {
    use S7DataType as T;

    let mut map: HashMap<S7DataType, Arc<dyn S7TypeConverter>> = HashMap::new();

    let scalars: Vec<(S7DataType, Arc<dyn S7TypeConverter>)> = vec![
        (T::Bool, Arc::new(NumericConverter::bool())),
        (T::Byte, Arc::new(NumericConverter::u8())),
        (T::USInt, Arc::new(NumericConverter::u8())),
        (T::SInt, Arc::new(NumericConverter::i8())),
        (T::Word, Arc::new(NumericConverter::u16())),
        (T::UInt, Arc::new(NumericConverter::u16())),
        (T::Counter, Arc::new(NumericConverter::u16())),
        (T::Int, Arc::new(NumericConverter::i16())),
        (T::DWord, Arc::new(NumericConverter::u32())),
        (T::UDInt, Arc::new(NumericConverter::u32())),
        (T::DInt, Arc::new(NumericConverter::i32())),
        (T::LWord, Arc::new(NumericConverter::u64())),
        (T::ULInt, Arc::new(NumericConverter::u64())),
        (T::LInt, Arc::new(NumericConverter::i64())),
        (T::Real, Arc::new(NumericConverter::f32())),
        (T::LReal, Arc::new(NumericConverter::f64())),
        (T::Char, Arc::new(CharConverter::narrow())),
        (T::WChar, Arc::new(CharConverter::wide())),
        (T::String, Arc::new(StringConverter)),
        (T::WString, Arc::new(StringConverter)),
        (T::Date, Arc::new(DateConverter)),
        (T::Time, Arc::new(TimeConverter)),
        (T::LTime, Arc::new(LTimeConverter)),
        (T::TimeOfDay, Arc::new(TimeOfDayConverter)),
        (T::LTimeOfDay, Arc::new(LTimeOfDayConverter)),
        (T::S5Time, Arc::new(S5TimeConverter)),
        (T::DateAndTime, Arc::new(DateAndTimeConverter)),
        (T::Dtl, Arc::new(DtlConverter)),
        (T::Ldt, Arc::new(LdtConverter)),
    ];

    for (s7_type, converter) in scalars {
        if let Some(array_type) = s7_type.array_of() {
            map.entry(array_type)
                .or_insert_with(|| Arc::new(ArrayConverter::new(Arc::clone(&converter))));
        }
        map.insert(s7_type, converter);
    }

    map
}

/// Returns the converter registered for an S7 type.
pub fn converter_for(s7_type: S7DataType) -> Option<Arc<dyn S7TypeConverter>> {
    CONVERTERS.get(&s7_type).cloned()
}

/// Returns the converter for an S7 type, or a [`DefaultConverter`] reporting
/// `fallback` when the type has none.
pub fn converter_or_default(s7_type: S7DataType, fallback: ValueKind) -> Arc<dyn S7TypeConverter> {
    converter_for(s7_type).unwrap_or_else(|| Arc::new(DefaultConverter::new(fallback)))
}

/// Converts a raw value read for a variable of type `s7_type`.
///
/// Returns the canonical value and the kind reported by the converter.
pub fn from_protocol(
    s7_type: S7DataType,
    raw: &UaValue,
) -> Result<(S7Value, ValueKind), ConversionError> {
    let converter = converter_or_default(s7_type, natural_kind(raw));
    let value = converter.from_protocol(raw)?;
    Ok((value, converter.target_type()))
}

/// Converts a canonical value for writing to a variable of type `s7_type`.
pub fn to_protocol(s7_type: S7DataType, value: &S7Value) -> Result<UaValue, ConversionError> {
    converter_or_default(s7_type, value.kind()).to_protocol(value)
}
