// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mapping from OPC UA data type ids to S7 data types.
//!
//! The server reports a variable's type as the node id of its DataType node:
//!
//! ```text
//! ns=0;i=<n>          built-in OPC UA type      -> BUILTIN_TYPES
//! ns=<v>;i=<n>        S7 vendor numeric type    -> VENDOR_NUMERIC_TYPES
//! ns=<v>;s=<name>     fixed vendor string type  -> VENDOR_STRING_TYPES
//! ns=<v>;s=<other>    user-defined type         -> UDT named <other>
//! ```
//!
//! A ValueRank of 1 or more turns the result into the matching array type.
//! The tables are plain data so firmware variants can be supported through
//! [`TypeMappingTable::with_vendor_numeric`] and friends.

use std::collections::HashMap;

use crate::data_type::S7DataType;
use crate::types::{NodeId, NodeIdentifier};

/// Built-in OPC UA data types (namespace 0).
pub const BUILTIN_TYPES: &[(u32, S7DataType)] = &[
    (1, S7DataType::Bool),
    (2, S7DataType::SInt),
    (3, S7DataType::Byte),
    (4, S7DataType::Int),
    (5, S7DataType::UInt),
    (6, S7DataType::DInt),
    (7, S7DataType::UDInt),
    (8, S7DataType::LInt),
    (9, S7DataType::ULInt),
    (10, S7DataType::Real),
    (11, S7DataType::LReal),
    (12, S7DataType::String),
    (13, S7DataType::Ldt),
    (22, S7DataType::Struct),
];

/// S7 vendor data types with numeric ids.
pub const VENDOR_NUMERIC_TYPES: &[(u32, S7DataType)] = &[
    (3001, S7DataType::Char),
    (3002, S7DataType::WChar),
    (3003, S7DataType::Date),
    (3004, S7DataType::TimeOfDay),
    (3005, S7DataType::S5Time),
    (3006, S7DataType::Dtl),
    (3007, S7DataType::LTime),
    (3008, S7DataType::LTimeOfDay),
    (3009, S7DataType::Ldt),
    (3010, S7DataType::Counter),
    (3011, S7DataType::Time),
    (3012, S7DataType::WString),
    (3013, S7DataType::Word),
    (3014, S7DataType::DWord),
    (3015, S7DataType::LWord),
];

/// S7 vendor data types with fixed string ids. Any other string id is a UDT.
pub const VENDOR_STRING_TYPES: &[(&str, S7DataType)] =
    &[("DT_DATE_AND_TIME", S7DataType::DateAndTime)];

/// Display name of the counters area.
pub const COUNTERS_AREA: &str = "Counters";

/// Display name of the timers area.
pub const TIMERS_AREA: &str = "Timers";

/// Result of mapping a data type id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedType {
    /// The S7 type.
    pub s7_type: S7DataType,
    /// UDT type name, set when `s7_type` is UDT.
    pub udt_type_name: Option<String>,
}

impl MappedType {
    /// A mapping without UDT name.
    pub fn plain(s7_type: S7DataType) -> Self {
        Self {
            s7_type,
            udt_type_name: None,
        }
    }

    /// The fallback for unknown types.
    pub fn unknown() -> Self {
        Self::plain(S7DataType::Unknown)
    }
}

/// Lookup table from data type node ids to S7 types.
#[derive(Debug, Clone)]
pub struct TypeMappingTable {
    vendor_namespace: u16,
    builtin: HashMap<u32, S7DataType>,
    vendor_numeric: HashMap<u32, S7DataType>,
    vendor_string: HashMap<String, S7DataType>,
}

impl TypeMappingTable {
    /// Creates the default table for the given vendor namespace.
    pub fn new(vendor_namespace: u16) -> Self {
        Self {
            vendor_namespace,
            builtin: BUILTIN_TYPES.iter().copied().collect(),
            vendor_numeric: VENDOR_NUMERIC_TYPES.iter().copied().collect(),
            vendor_string: VENDOR_STRING_TYPES
                .iter()
                .map(|(name, ty)| ((*name).to_string(), *ty))
                .collect(),
        }
    }

    /// Returns the vendor namespace index.
    pub fn vendor_namespace(&self) -> u16 {
        self.vendor_namespace
    }

    /// Adds or replaces a built-in mapping.
    pub fn with_builtin(mut self, id: u32, s7_type: S7DataType) -> Self {
        self.builtin.insert(id, s7_type);
        self
    }

    /// Adds or replaces a vendor numeric mapping.
    pub fn with_vendor_numeric(mut self, id: u32, s7_type: S7DataType) -> Self {
        self.vendor_numeric.insert(id, s7_type);
        self
    }

    /// Adds or replaces a vendor string mapping.
    pub fn with_vendor_string(mut self, id: impl Into<String>, s7_type: S7DataType) -> Self {
        self.vendor_string.insert(id.into(), s7_type);
        self
    }

    /// Maps a data type id to a scalar S7 type.
    pub fn resolve(&self, data_type: &NodeId) -> MappedType {
        match (&data_type.identifier, data_type.namespace_index) {
            (NodeIdentifier::Numeric(id), 0) => self
                .builtin
                .get(id)
                .copied()
                .map(MappedType::plain)
                .unwrap_or_else(MappedType::unknown),
            (NodeIdentifier::Numeric(id), ns) if ns == self.vendor_namespace => self
                .vendor_numeric
                .get(id)
                .copied()
                .map(MappedType::plain)
                .unwrap_or_else(MappedType::unknown),
            (NodeIdentifier::String(name), ns) if ns == self.vendor_namespace => {
                match self.vendor_string.get(name) {
                    Some(ty) => MappedType::plain(*ty),
                    None => MappedType {
                        s7_type: S7DataType::Udt,
                        udt_type_name: Some(name.clone()),
                    },
                }
            }
            _ => MappedType::unknown(),
        }
    }

    /// Maps a data type id and value rank.
    ///
    /// A missing data type yields UNKNOWN. Structured types keep their scalar
    /// type even when the rank says array, since their elements are browsed
    /// as members.
    pub fn map(&self, data_type: Option<&NodeId>, value_rank: Option<i32>) -> MappedType {
        let Some(data_type) = data_type else {
            return MappedType::unknown();
        };

        let mut mapped = self.resolve(data_type);
        if value_rank.is_some_and(|rank| rank >= 1) {
            if let Some(array) = mapped.s7_type.array_of() {
                mapped.s7_type = array;
            }
        }
        mapped
    }

    /// Returns the S7 type children of a memory area default to, if the area
    /// overrides the protocol type.
    pub fn area_default(area_name: &str) -> Option<S7DataType> {
        match area_name {
            COUNTERS_AREA => Some(S7DataType::Counter),
            TIMERS_AREA => Some(S7DataType::S5Time),
            _ => None,
        }
    }
}

impl Default for TypeMappingTable {
    fn default() -> Self {
        Self::new(3)
    }
}
