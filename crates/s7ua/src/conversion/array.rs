// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Element-wise conversion of one-dimensional arrays.

use std::sync::Arc;

use crate::client::session::UaValue;
use crate::error::ConversionError;
use crate::value::{S7Value, ValueKind};

use super::{S7TypeConverter, WireType};

/// Applies an element converter to every entry of an array.
///
/// A `ByteString` is accepted in place of a byte array on read. On write,
/// every converted element must carry the element converter's wire type so
/// the resulting array is homogeneous.
#[derive(Debug, Clone)]
pub struct ArrayConverter {
    element: Arc<dyn S7TypeConverter>,
}

impl ArrayConverter {
    /// Wraps an element converter.
    pub fn new(element: Arc<dyn S7TypeConverter>) -> Self {
        Self { element }
    }

    /// Returns the element converter.
    pub fn element(&self) -> &Arc<dyn S7TypeConverter> {
        &self.element
    }
}

impl S7TypeConverter for ArrayConverter {
    fn target_type(&self) -> ValueKind {
        ValueKind::Array(Box::new(self.element.target_type()))
    }

    fn from_protocol(&self, raw: &UaValue) -> Result<S7Value, ConversionError> {
        let items: Vec<UaValue> = match raw {
            UaValue::Array(items) => items.clone(),
            UaValue::ByteString(bytes) if self.element.wire_type() == Some(WireType::Byte) => {
                bytes.iter().copied().map(UaValue::Byte).collect()
            }
            other => return Err(ConversionError::type_mismatch("Array", other.type_name())),
        };

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                self.element
                    .from_protocol(item)
                    .map_err(|e| ConversionError::array_element(i, &e))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(S7Value::Array)
    }

    fn to_protocol(&self, value: &S7Value) -> Result<UaValue, ConversionError> {
        let items = match value {
            S7Value::Array(items) => items,
            other => return Err(ConversionError::type_mismatch("array", other.kind().to_string())),
        };

        let wire = self.element.wire_type();
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let raw = self
                    .element
                    .to_protocol(item)
                    .map_err(|e| ConversionError::array_element(i, &e))?;
                match wire {
                    Some(expected) if !expected.matches(&raw) => Err(ConversionError::array_element(
                        i,
                        &ConversionError::type_mismatch(expected.to_string(), raw.type_name()),
                    )),
                    _ => Ok(raw),
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(UaValue::Array)
    }

    fn name(&self) -> &'static str {
        "ArrayConverter"
    }
}
