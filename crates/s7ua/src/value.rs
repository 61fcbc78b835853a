// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Canonical values produced by the type converters.
//!
//! [`S7Value`] is what application code sees after conversion: durations are
//! [`TimeDelta`], timestamps are [`NaiveDateTime`], an `ARRAY OF CHAR` is a
//! list of characters rather than a string. [`ValueKind`] names the shape of a
//! value and is what a converter reports as its target type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

// =============================================================================
// ValueKind
// =============================================================================

/// Shape of a canonical value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `u8`
    U8,
    /// `i16`
    I16,
    /// `u16`
    U16,
    /// `i32`
    I32,
    /// `u32`
    U32,
    /// `i64`
    I64,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `char`
    Char,
    /// `String`
    String,
    /// Calendar date.
    Date,
    /// Time of day.
    TimeOfDay,
    /// Signed duration.
    Duration,
    /// Timestamp without time zone.
    DateTime,
    /// Sequence of values of one kind.
    Array(Box<ValueKind>),
    /// Ordered named members.
    Struct,
    /// Aggregate produced by a custom UDT converter.
    Custom(String),
    /// No value.
    Null,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::I8 => f.write_str("i8"),
            Self::U8 => f.write_str("u8"),
            Self::I16 => f.write_str("i16"),
            Self::U16 => f.write_str("u16"),
            Self::I32 => f.write_str("i32"),
            Self::U32 => f.write_str("u32"),
            Self::I64 => f.write_str("i64"),
            Self::U64 => f.write_str("u64"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::Char => f.write_str("char"),
            Self::String => f.write_str("string"),
            Self::Date => f.write_str("date"),
            Self::TimeOfDay => f.write_str("time_of_day"),
            Self::Duration => f.write_str("duration"),
            Self::DateTime => f.write_str("datetime"),
            Self::Array(inner) => write!(f, "array<{inner}>"),
            Self::Struct => f.write_str("struct"),
            Self::Custom(name) => write!(f, "custom<{name}>"),
            Self::Null => f.write_str("null"),
        }
    }
}

// =============================================================================
// CustomValue
// =============================================================================

/// Type-erased aggregate built by a custom UDT converter.
///
/// Equality is identity: two `CustomValue`s are equal when they share the
/// same allocation.
#[derive(Clone)]
pub struct CustomValue {
    type_name: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    /// Wraps a value under the given UDT type name.
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            value: Arc::new(value),
        }
    }

    /// Returns the UDT type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns a reference to the inner value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns `true` if the inner value has type `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValue")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && Arc::ptr_eq(&self.value, &other.value)
    }
}

// =============================================================================
// S7Value
// =============================================================================

/// Canonical S7 value.
#[derive(Debug, Clone, PartialEq)]
pub enum S7Value {
    /// BOOL
    Bool(bool),
    /// SINT
    I8(i8),
    /// BYTE, USINT
    U8(u8),
    /// INT
    I16(i16),
    /// WORD, UINT, COUNTER
    U16(u16),
    /// DINT
    I32(i32),
    /// DWORD, UDINT
    U32(u32),
    /// LINT
    I64(i64),
    /// LWORD, ULINT
    U64(u64),
    /// REAL
    F32(f32),
    /// LREAL
    F64(f64),
    /// CHAR, WCHAR
    Char(char),
    /// STRING, WSTRING
    String(String),
    /// DATE
    Date(NaiveDate),
    /// TIME_OF_DAY, LTIME_OF_DAY
    TimeOfDay(NaiveTime),
    /// TIME, LTIME, S5TIME
    Duration(TimeDelta),
    /// DATE_AND_TIME, DTL, LDT
    DateTime(NaiveDateTime),
    /// Any `ARRAY_OF_*`.
    Array(Vec<S7Value>),
    /// STRUCT or UDT as ordered named members.
    Struct(Vec<(String, S7Value)>),
    /// UDT projected by a custom converter.
    Custom(CustomValue),
}

impl S7Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::I8(_) => ValueKind::I8,
            Self::U8(_) => ValueKind::U8,
            Self::I16(_) => ValueKind::I16,
            Self::U16(_) => ValueKind::U16,
            Self::I32(_) => ValueKind::I32,
            Self::U32(_) => ValueKind::U32,
            Self::I64(_) => ValueKind::I64,
            Self::U64(_) => ValueKind::U64,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::Char(_) => ValueKind::Char,
            Self::String(_) => ValueKind::String,
            Self::Date(_) => ValueKind::Date,
            Self::TimeOfDay(_) => ValueKind::TimeOfDay,
            Self::Duration(_) => ValueKind::Duration,
            Self::DateTime(_) => ValueKind::DateTime,
            Self::Array(items) => ValueKind::Array(Box::new(
                items.first().map(S7Value::kind).unwrap_or(ValueKind::Null),
            )),
            Self::Struct(_) => ValueKind::Struct,
            Self::Custom(c) => ValueKind::Custom(c.type_name().to_string()),
        }
    }

    /// Returns the value as an i128 if it is an integer.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::I8(v) => Some(*v as i128),
            Self::U8(v) => Some(*v as i128),
            Self::I16(v) => Some(*v as i128),
            Self::U16(v) => Some(*v as i128),
            Self::I32(v) => Some(*v as i128),
            Self::U32(v) => Some(*v as i128),
            Self::I64(v) => Some(*v as i128),
            Self::U64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Returns the value as an f64 if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            other => other.as_i128().map(|v| v as f64),
        }
    }

    /// Returns the boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the custom aggregate.
    pub fn as_custom(&self) -> Option<&CustomValue> {
        match self {
            Self::Custom(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up a member of a [`S7Value::Struct`].
    pub fn member(&self, name: &str) -> Option<&S7Value> {
        match self {
            Self::Struct(members) => members.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for S7Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Char(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::TimeOfDay(v) => write!(f, "{v}"),
            Self::Duration(v) => write!(f, "{}ms", v.num_milliseconds()),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Array(v) => write!(f, "[{} items]", v.len()),
            Self::Struct(v) => write!(f, "{{{} members}}", v.len()),
            Self::Custom(v) => write!(f, "<{}>", v.type_name()),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for S7Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
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
    char => Char,
    String => String,
    NaiveDate => Date,
    NaiveTime => TimeOfDay,
    TimeDelta => Duration,
    NaiveDateTime => DateTime,
    CustomValue => Custom,
}

impl From<&str> for S7Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
