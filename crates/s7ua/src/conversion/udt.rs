// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! STRUCT and UDT conversion.
//!
//! There are two tiers:
//!
//! - The generic tier ([`StructConverter`]) maps the converted members onto an
//!   ordered [`S7Value::Struct`] and back. It needs no registration.
//! - The custom tier ([`UdtConverter`]) projects the members onto one
//!   application type. Implement [`TypedUdtConverter`] for a concrete type and
//!   register it through [`UdtConverterAdapter`]; the registry stores the
//!   object-safe form.
//!
//! # Example
//!
//! ```
//! use s7ua::conversion::{MemberView, TypedUdtConverter, UdtConverter, UdtConverterAdapter};
//! use s7ua::error::ConversionError;
//! use s7ua::S7Value;
//!
//! struct Motor {
//!     running: bool,
//!     speed: i16,
//! }
//!
//! struct MotorConverter;
//!
//! impl TypedUdtConverter for MotorConverter {
//!     type Value = Motor;
//!
//!     fn udt_type_name(&self) -> &str {
//!         "DT_Motor"
//!     }
//!
//!     fn from_members(&self, members: &MemberView<'_>) -> Result<Motor, ConversionError> {
//!         Ok(Motor {
//!             running: members.get("Running")?,
//!             speed: members.get("Speed")?,
//!         })
//!     }
//!
//!     fn to_members(&self, motor: &Motor) -> Result<Vec<(String, S7Value)>, ConversionError> {
//!         Ok(vec![
//!             ("Running".into(), S7Value::Bool(motor.running)),
//!             ("Speed".into(), S7Value::I16(motor.speed)),
//!         ])
//!     }
//! }
//!
//! let converter = UdtConverterAdapter::new(MotorConverter);
//! assert_eq!(converter.udt_type_name(), "DT_Motor");
//! ```

use std::any::Any;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::error::ConversionError;
use crate::model::Variable;
use crate::value::{CustomValue, S7Value};

// =============================================================================
// FromS7Value
// =============================================================================

/// Extraction of a Rust value from a canonical [`S7Value`].
pub trait FromS7Value: Sized {
    /// Extracts the value, failing on a kind mismatch or range overflow.
    fn from_s7_value(value: &S7Value) -> Result<Self, ConversionError>;
}

macro_rules! impl_from_s7_integer {
    ($($ty:ty),*) => {
        $(
            impl FromS7Value for $ty {
                fn from_s7_value(value: &S7Value) -> Result<Self, ConversionError> {
                    let v = value.as_i128().ok_or_else(|| {
                        ConversionError::type_mismatch(stringify!($ty), value.kind().to_string())
                    })?;
                    <$ty>::try_from(v).map_err(|_| {
                        ConversionError::value_out_of_range(v, <$ty>::MIN as i128, <$ty>::MAX as i128)
                    })
                }
            }
        )*
    };
}

impl_from_s7_integer!(i8, u8, i16, u16, i32, u32, i64, u64);

macro_rules! impl_from_s7_variant {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl FromS7Value for $ty {
                fn from_s7_value(value: &S7Value) -> Result<Self, ConversionError> {
                    match value {
                        S7Value::$variant(v) => Ok(v.clone()),
                        other => Err(ConversionError::type_mismatch(
                            stringify!($ty),
                            other.kind().to_string(),
                        )),
                    }
                }
            }
        )*
    };
}

impl_from_s7_variant!(
    bool => Bool,
    char => Char,
    String => String,
    NaiveDate => Date,
    NaiveTime => TimeOfDay,
    TimeDelta => Duration,
    NaiveDateTime => DateTime
);

impl FromS7Value for f32 {
    fn from_s7_value(value: &S7Value) -> Result<Self, ConversionError> {
        match value {
            S7Value::F32(v) => Ok(*v),
            other => Err(ConversionError::type_mismatch("f32", other.kind().to_string())),
        }
    }
}

impl FromS7Value for f64 {
    fn from_s7_value(value: &S7Value) -> Result<Self, ConversionError> {
        value
            .as_f64()
            .ok_or_else(|| ConversionError::type_mismatch("f64", value.kind().to_string()))
    }
}

impl FromS7Value for S7Value {
    fn from_s7_value(value: &S7Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl<T: FromS7Value> FromS7Value for Vec<T> {
    fn from_s7_value(value: &S7Value) -> Result<Self, ConversionError> {
        match value {
            S7Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::from_s7_value(item).map_err(|e| ConversionError::array_element(i, &e)))
                .collect(),
            other => Err(ConversionError::type_mismatch("array", other.kind().to_string())),
        }
    }
}

// =============================================================================
// MemberView
// =============================================================================

/// Read-only view over the converted members of a UDT instance.
#[derive(Debug, Clone, Copy)]
pub struct MemberView<'a> {
    members: &'a [Variable],
}

impl<'a> MemberView<'a> {
    /// Wraps a member list.
    pub fn new(members: &'a [Variable]) -> Self {
        Self { members }
    }

    /// Returns the member variable with the given name.
    pub fn variable(&self, name: &str) -> Option<&'a Variable> {
        self.members.iter().find(|m| m.display_name == name)
    }

    /// Returns the converted value of a member.
    pub fn value(&self, name: &str) -> Result<&'a S7Value, ConversionError> {
        let member = self
            .variable(name)
            .ok_or_else(|| ConversionError::invalid_value("UDT", format!("no member named '{name}'")))?;
        member.value.as_ref().ok_or(ConversionError::NullValue)
    }

    /// Extracts a member value as `T`.
    pub fn get<T: FromS7Value>(&self, name: &str) -> Result<T, ConversionError> {
        T::from_s7_value(self.value(name)?)
    }

    /// Iterates over the members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Variable> + 'a {
        self.members.iter()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if there are no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// =============================================================================
// UdtConverter
// =============================================================================

/// Object-safe custom UDT converter, as stored in the registry.
pub trait UdtConverter: Send + Sync {
    /// UDT type name this converter handles.
    fn udt_type_name(&self) -> &str;

    /// Assembles the aggregate from converted members.
    fn from_members(&self, members: &[Variable]) -> Result<CustomValue, ConversionError>;

    /// Splits an aggregate into member variables carrying the values to write.
    ///
    /// `template` is the discovered member list; only members that receive a
    /// value are returned.
    fn to_members(
        &self,
        value: &CustomValue,
        template: &[Variable],
    ) -> Result<Vec<Variable>, ConversionError>;
}

impl std::fmt::Debug for dyn UdtConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UdtConverter({})", self.udt_type_name())
    }
}

/// Custom UDT converter for one concrete Rust type.
pub trait TypedUdtConverter: Send + Sync + 'static {
    /// Aggregate type.
    type Value: Any + Send + Sync;

    /// UDT type name this converter handles.
    fn udt_type_name(&self) -> &str;

    /// Builds the aggregate from converted members.
    fn from_members(&self, members: &MemberView<'_>) -> Result<Self::Value, ConversionError>;

    /// Lists `(member name, value)` pairs to write.
    fn to_members(&self, value: &Self::Value) -> Result<Vec<(String, S7Value)>, ConversionError>;
}

/// Adapts a [`TypedUdtConverter`] to the object-safe [`UdtConverter`].
#[derive(Debug, Clone)]
pub struct UdtConverterAdapter<C> {
    inner: C,
}

impl<C: TypedUdtConverter> UdtConverterAdapter<C> {
    /// Wraps a typed converter.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// Returns the wrapped converter.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: TypedUdtConverter> UdtConverter for UdtConverterAdapter<C> {
    fn udt_type_name(&self) -> &str {
        self.inner.udt_type_name()
    }

    fn from_members(&self, members: &[Variable]) -> Result<CustomValue, ConversionError> {
        let value = self.inner.from_members(&MemberView::new(members))?;
        Ok(CustomValue::new(self.inner.udt_type_name(), value))
    }

    fn to_members(
        &self,
        value: &CustomValue,
        template: &[Variable],
    ) -> Result<Vec<Variable>, ConversionError> {
        let typed = value.downcast_ref::<C::Value>().ok_or_else(|| {
            ConversionError::type_mismatch(
                std::any::type_name::<C::Value>(),
                format!("custom value of '{}'", value.type_name()),
            )
        })?;
        assign_members(self.inner.udt_type_name(), template, self.inner.to_members(typed)?)
    }
}

/// Copies `pairs` onto the matching template members, in template order.
fn assign_members(
    type_name: &str,
    template: &[Variable],
    pairs: Vec<(String, S7Value)>,
) -> Result<Vec<Variable>, ConversionError> {
    if let Some((unknown, _)) = pairs
        .iter()
        .find(|(name, _)| !template.iter().any(|m| &m.display_name == name))
    {
        return Err(ConversionError::invalid_value(
            type_name,
            format!("no member named '{unknown}'"),
        ));
    }

    let mut pairs = pairs;
    Ok(template
        .iter()
        .filter_map(|member| {
            let index = pairs.iter().position(|(name, _)| name == &member.display_name)?;
            let (_, value) = pairs.swap_remove(index);
            let mut assigned = member.clone();
            assigned.value = Some(value);
            Some(assigned)
        })
        .collect())
}

// =============================================================================
// StructConverter
// =============================================================================

/// Generic STRUCT/UDT tier: an ordered list of named member values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructConverter;

impl StructConverter {
    /// Builds an [`S7Value::Struct`] from members that hold a value.
    pub fn compose(members: &[Variable]) -> S7Value {
        S7Value::Struct(
            members
                .iter()
                .filter_map(|m| {
                    let value = match &m.value {
                        Some(v) => v.clone(),
                        None if m.is_structured() => Self::compose(&m.struct_members),
                        None => return None,
                    };
                    Some((m.display_name.clone(), value))
                })
                .collect(),
        )
    }

    /// Assigns the members of an [`S7Value::Struct`] to the template members.
    pub fn decompose(
        type_name: &str,
        template: &[Variable],
        value: &S7Value,
    ) -> Result<Vec<Variable>, ConversionError> {
        match value {
            S7Value::Struct(members) => assign_members(type_name, template, members.clone()),
            other => Err(ConversionError::type_mismatch("struct", other.kind().to_string())),
        }
    }
}
