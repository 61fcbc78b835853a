// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Converters for numeric, character and string types.

use crate::client::session::UaValue;
use crate::error::ConversionError;
use crate::value::{S7Value, ValueKind};

use super::{S7TypeConverter, WireType};

// =============================================================================
// NumericConverter
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numeric {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

/// Converter for BOOL, integer and floating point types.
///
/// Reads accept any integer wire value that fits the target range, since
/// servers are not consistent about e.g. WORD vs UInt16. Writes accept any
/// integer canonical value that fits.
#[derive(Debug, Clone, Copy)]
pub struct NumericConverter {
    numeric: Numeric,
}

macro_rules! numeric_ctor {
    ($($fn_name:ident => $variant:ident),* $(,)?) => {
        $(
            #[doc = concat!("Converter producing `", stringify!($fn_name), "` values.")]
            pub const fn $fn_name() -> Self {
                Self { numeric: Numeric::$variant }
            }
        )*
    };
}

impl NumericConverter {
    numeric_ctor! {
        bool => Bool,
        i8 => I8,
        u8 => U8,
        i16 => I16,
        u16 => U16,
        i32 => I32,
        u32 => U32,
        i64 => I64,
        u64 => U64,
        f32 => F32,
        f64 => F64,
    }

    fn integer_to_value(&self, v: i128) -> Result<S7Value, ConversionError> {
        macro_rules! checked {
            ($ty:ty, $variant:ident) => {
                <$ty>::try_from(v)
                    .map(S7Value::$variant)
                    .map_err(|_| ConversionError::value_out_of_range(v, <$ty>::MIN as i128, <$ty>::MAX as i128))
            };
        }

        match self.numeric {
            Numeric::I8 => checked!(i8, I8),
            Numeric::U8 => checked!(u8, U8),
            Numeric::I16 => checked!(i16, I16),
            Numeric::U16 => checked!(u16, U16),
            Numeric::I32 => checked!(i32, I32),
            Numeric::U32 => checked!(u32, U32),
            Numeric::I64 => checked!(i64, I64),
            Numeric::U64 => checked!(u64, U64),
            Numeric::F32 => Ok(S7Value::F32(v as f32)),
            Numeric::F64 => Ok(S7Value::F64(v as f64)),
            Numeric::Bool => match v {
                0 => Ok(S7Value::Bool(false)),
                1 => Ok(S7Value::Bool(true)),
                _ => Err(ConversionError::value_out_of_range(v, 0, 1)),
            },
        }
    }
}

impl S7TypeConverter for NumericConverter {
    fn target_type(&self) -> ValueKind {
        match self.numeric {
            Numeric::Bool => ValueKind::Bool,
            Numeric::I8 => ValueKind::I8,
            Numeric::U8 => ValueKind::U8,
            Numeric::I16 => ValueKind::I16,
            Numeric::U16 => ValueKind::U16,
            Numeric::I32 => ValueKind::I32,
            Numeric::U32 => ValueKind::U32,
            Numeric::I64 => ValueKind::I64,
            Numeric::U64 => ValueKind::U64,
            Numeric::F32 => ValueKind::F32,
            Numeric::F64 => ValueKind::F64,
        }
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(match self.numeric {
            Numeric::Bool => WireType::Boolean,
            Numeric::I8 => WireType::SByte,
            Numeric::U8 => WireType::Byte,
            Numeric::I16 => WireType::Int16,
            Numeric::U16 => WireType::UInt16,
            Numeric::I32 => WireType::Int32,
            Numeric::U32 => WireType::UInt32,
            Numeric::I64 => WireType::Int64,
            Numeric::U64 => WireType::UInt64,
            Numeric::F32 => WireType::Float,
            Numeric::F64 => WireType::Double,
        })
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        match (self.numeric, raw) {
            (Numeric::Bool, UaValue::Boolean(v)) => Ok(S7Value::Bool(*v)),
            (Numeric::F32, UaValue::Float(v)) => Ok(S7Value::F32(*v)),
            (Numeric::F64, UaValue::Double(v)) => Ok(S7Value::F64(*v)),
            (Numeric::F64, UaValue::Float(v)) => Ok(S7Value::F64(*v as f64)),
            (_, UaValue::UInt64(v)) => self.integer_to_value(*v as i128),
            (_, raw) => match raw.as_i64() {
                Some(v) => self.integer_to_value(v as i128),
                None => Err(ConversionError::type_mismatch(
                    self.target_type().to_string(),
                    raw.type_name(),
                )),
            },
        }
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let mismatch = || ConversionError::type_mismatch(self.target_type().to_string(), value.kind().to_string());

        let converted = match (self.numeric, value) {
            (Numeric::Bool, S7Value::Bool(v)) => return Ok(UaValue::Boolean(*v)),
            (Numeric::Bool, _) => return Err(mismatch()),
            (Numeric::F32, S7Value::F32(v)) => return Ok(UaValue::Float(*v)),
            (Numeric::F32, S7Value::F64(v)) => {
                if v.is_finite() && v.abs() > f32::MAX as f64 {
                    return Err(ConversionError::value_out_of_range(*v, f32::MIN as f64, f32::MAX as f64));
                }
                return Ok(UaValue::Float(*v as f32));
            }
            (Numeric::F64, S7Value::F32(v)) => return Ok(UaValue::Double(*v as f64)),
            (Numeric::F64, S7Value::F64(v)) => return Ok(UaValue::Double(*v)),
            (_, value) => value.as_i128().ok_or_else(mismatch)?,
        };

        Ok(match self.integer_to_value(converted)? {
            S7Value::I8(v) => UaValue::SByte(v),
            S7Value::U8(v) => UaValue::Byte(v),
            S7Value::I16(v) => UaValue::Int16(v),
            S7Value::U16(v) => UaValue::UInt16(v),
            S7Value::I32(v) => UaValue::Int32(v),
            S7Value::U32(v) => UaValue::UInt32(v),
            S7Value::I64(v) => UaValue::Int64(v),
            S7Value::U64(v) => UaValue::UInt64(v),
            S7Value::F32(v) => UaValue::Float(v),
            S7Value::F64(v) => UaValue::Double(v),
            _ => return Err(mismatch()),
        })
    }

    fn name(&self) -> &'static str {
        "NumericConverter"
    }
}

// =============================================================================
// CharConverter
// =============================================================================

/// Converter for CHAR (one byte, Latin-1) and WCHAR (one UTF-16 code unit).
#[derive(Debug, Clone, Copy)]
pub struct CharConverter {
    wide: bool,
}

impl CharConverter {
    /// CHAR converter.
    pub const fn narrow() -> Self {
        Self { wide: false }
    }

    /// WCHAR converter.
    pub const fn wide() -> Self {
        Self { wide: true }
    }

    fn from_code_unit(&self, unit: u32) -> Result<S7Value, ConversionError> {
        char::from_u32(unit)
            .map(S7Value::Char)
            .ok_or_else(|| ConversionError::invalid_value("WCHAR", format!("0x{unit:04X} is not a character")))
    }
}

impl S7TypeConverter for CharConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::Char
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(if self.wide { WireType::UInt16 } else { WireType::Byte })
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        match raw {
            UaValue::Byte(b) => Ok(S7Value::Char(char::from(*b))),
            UaValue::SByte(b) => Ok(S7Value::Char(char::from(*b as u8))),
            UaValue::UInt16(u) if self.wide => self.from_code_unit(*u as u32),
            UaValue::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(S7Value::Char(c)),
                    _ => Err(ConversionError::invalid_value(
                        "CHAR",
                        format!("expected exactly one character, got {:?}", s),
                    )),
                }
            }
            other => Err(ConversionError::type_mismatch(
                if self.wide { "UInt16" } else { "Byte" },
                other.type_name(),
            )),
        }
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let c = match value {
            S7Value::Char(c) => *c,
            S7Value::String(s) if s.chars().count() == 1 => s.chars().next().unwrap_or_default(),
            other => return Err(ConversionError::type_mismatch("char", other.kind().to_string())),
        };

        let code = c as u32;
        if self.wide {
            u16::try_from(code)
                .map(UaValue::UInt16)
                .map_err(|_| ConversionError::value_out_of_range(code, 0, 0xFFFF))
        } else {
            u8::try_from(code)
                .map(UaValue::Byte)
                .map_err(|_| ConversionError::value_out_of_range(code, 0, 0xFF))
        }
    }

    fn name(&self) -> &'static str {
        if self.wide {
            "WCharConverter"
        } else {
            "CharConverter"
        }
    }
}

// =============================================================================
// StringConverter
// =============================================================================

/// Converter for STRING and WSTRING.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl S7TypeConverter for StringConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::String
    }

    fn wire_type(&self) -> Option<WireType> {
        Some(WireType::String)
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        match raw {
            UaValue::String(s) => Ok(S7Value::String(s.clone())),
            other => Err(ConversionError::type_mismatch("String", other.type_name())),
        }
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        match value {
            S7Value::String(s) => Ok(UaValue::String(s.clone())),
            S7Value::Char(c) => Ok(UaValue::String(c.to_string())),
            other => Err(ConversionError::type_mismatch("string", other.kind().to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "StringConverter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_range_checked_write() {
        let int = NumericConverter::i16();
        assert_eq!(int.to_protocol(&S7Value::I16(999)).unwrap(), UaValue::Int16(999));
        assert_eq!(int.to_protocol(&S7Value::I32(999)).unwrap(), UaValue::Int16(999));
        assert!(matches!(
            int.to_protocol(&S7Value::I32(40_000)),
            Err(ConversionError::ValueOutOfRange { .. })
        ));
        assert!(int.to_protocol(&S7Value::Bool(true)).is_err());
    }

    #[test]
    fn test_read_accepts_compatible_integer_wire_types() {
        let word = NumericConverter::u16();
        assert_eq!(word.from_protocol(&UaValue::UInt16(7)).unwrap(), S7Value::U16(7));
        assert_eq!(word.from_protocol(&UaValue::Int32(7)).unwrap(), S7Value::U16(7));
        assert!(word.from_protocol(&UaValue::Int32(-1)).is_err());
        assert!(word.from_protocol(&UaValue::String("7".into())).is_err());
    }

    #[test]
    fn test_bool() {
        let b = NumericConverter::bool();
        assert_eq!(b.from_protocol(&UaValue::Boolean(true)).unwrap(), S7Value::Bool(true));
        assert_eq!(b.to_protocol(&S7Value::Bool(false)).unwrap(), UaValue::Boolean(false));
        assert!(b.to_protocol(&S7Value::I16(1)).is_err());
    }

    #[test]
    fn test_real() {
        let real = NumericConverter::f32();
        assert_eq!(real.from_protocol(&UaValue::Float(1.5)).unwrap(), S7Value::F32(1.5));
        assert_eq!(real.to_protocol(&S7Value::F64(1.5)).unwrap(), UaValue::Float(1.5));
        assert!(real.to_protocol(&S7Value::F64(1e300)).is_err());
    }

    #[test]
    fn test_char_narrow_and_wide() {
        let narrow = CharConverter::narrow();
        assert_eq!(narrow.from_protocol(&UaValue::Byte(b'A')).unwrap(), S7Value::Char('A'));
        assert_eq!(narrow.from_protocol(&UaValue::Byte(0xE9)).unwrap(), S7Value::Char('é'));
        assert_eq!(narrow.to_protocol(&S7Value::Char('é')).unwrap(), UaValue::Byte(0xE9));
        assert!(narrow.to_protocol(&S7Value::Char('€')).is_err());

        let wide = CharConverter::wide();
        assert_eq!(wide.from_protocol(&UaValue::UInt16(0x20AC)).unwrap(), S7Value::Char('€'));
        assert_eq!(wide.to_protocol(&S7Value::Char('€')).unwrap(), UaValue::UInt16(0x20AC));
        assert!(wide.from_protocol(&UaValue::UInt16(0xD800)).is_err());
    }

    #[test]
    fn test_string() {
        let s = StringConverter;
        assert_eq!(
            s.from_protocol(&UaValue::String("abc".into())).unwrap(),
            S7Value::String("abc".into())
        );
        assert!(s.from_protocol(&UaValue::Int16(1)).is_err());
    }
}
