// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol session abstraction.
//!
//! The crate never talks to the network itself. A [`UaSession`] is whatever
//! OPC UA stack the application plugs in; the pool obtains sessions through a
//! [`SessionFactory`]. Both traits are object safe so sessions can be stored
//! as `Arc<dyn UaSession>`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::S7Result;
use crate::types::{AttributeId, ConnectionConfig, NodeClass, NodeId, StatusCode};

// =============================================================================
// UaValue
// =============================================================================

/// Raw value as carried by the OPC UA wire protocol.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UaValue {
    /// Boolean.
    Boolean(bool),
    /// Signed 8-bit integer.
    SByte(i8),
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Unsigned 16-bit integer.
    UInt16(u16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// String.
    String(String),
    /// UTC timestamp.
    DateTime(DateTime<Utc>),
    /// GUID.
    Guid(Uuid),
    /// Raw bytes. S7 packed types (DATE_AND_TIME, DTL) arrive in this form.
    ByteString(Vec<u8>),
    /// Node id, as returned for the DataType attribute.
    NodeId(NodeId),
    /// One-dimensional array.
    Array(Vec<UaValue>),
    /// No value.
    #[default]
    Null,
}

impl UaValue {
    /// Returns the wire type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::SByte(_) => "SByte",
            Self::Byte(_) => "Byte",
            Self::Int16(_) => "Int16",
            Self::UInt16(_) => "UInt16",
            Self::Int32(_) => "Int32",
            Self::UInt32(_) => "UInt32",
            Self::Int64(_) => "Int64",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
            Self::ByteString(_) => "ByteString",
            Self::NodeId(_) => "NodeId",
            Self::Array(_) => "Array",
            Self::Null => "Null",
        }
    }

    /// Returns `true` for [`UaValue::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Attempts to get the value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::SByte(v) => Some(*v as i64),
            Self::Byte(v) => Some(*v as i64),
            Self::Int16(v) => Some(*v as i64),
            Self::UInt16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::UInt32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            Self::UInt64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Attempts to get the value as a node id.
    pub fn as_node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NodeId(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for UaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::SByte(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Self::Guid(v) => write!(f, "{v}"),
            Self::ByteString(v) => write!(f, "<{} bytes>", v.len()),
            Self::NodeId(v) => write!(f, "{v}"),
            Self::Array(v) => write!(f, "[{} items]", v.len()),
            Self::Null => write!(f, "null"),
        }
    }
}

// =============================================================================
// DataValue / BrowseResult
// =============================================================================

/// One read result: value plus protocol status.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// The value.
    pub value: UaValue,
    /// Protocol status code.
    pub status: StatusCode,
    /// Server timestamp of the value source.
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Creates a good data value.
    pub fn good(value: UaValue) -> Self {
        Self {
            value,
            status: StatusCode::GOOD,
            source_timestamp: None,
        }
    }

    /// Creates a data value carrying only a status.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            value: UaValue::Null,
            status,
            source_timestamp: None,
        }
    }
}

/// One browse result: a forward hierarchical reference target.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseResult {
    /// Node id of the child.
    pub node_id: NodeId,
    /// Display name of the child.
    pub display_name: String,
    /// Node class of the child.
    pub node_class: NodeClass,
}

impl BrowseResult {
    /// Creates a browse result.
    pub fn new(node_id: NodeId, display_name: impl Into<String>, node_class: NodeClass) -> Self {
        Self {
            node_id,
            display_name: display_name.into(),
            node_class,
        }
    }
}

// =============================================================================
// UaSession / SessionFactory
// =============================================================================

/// An open OPC UA session.
///
/// Implementations must be `Send + Sync`; the pool hands the same session to
/// one borrower at a time, but the session object itself is shared through an
/// `Arc`.
#[async_trait]
pub trait UaSession: Send + Sync {
    /// Returns `true` while the session can serve requests.
    fn is_connected(&self) -> bool;

    /// Returns the forward hierarchical children of `node_id` whose node class
    /// matches `node_class_mask` (0 = all classes).
    async fn browse(&self, node_id: &NodeId, node_class_mask: u32)
        -> S7Result<Vec<BrowseResult>>;

    /// Reads attributes, one result per request in request order.
    async fn read(&self, nodes: &[(NodeId, AttributeId)]) -> S7Result<Vec<DataValue>>;

    /// Writes values, one status per request in request order.
    async fn write(&self, values: &[(NodeId, UaValue)]) -> S7Result<Vec<StatusCode>>;

    /// Closes the session.
    async fn close(&self) -> S7Result<()>;
}

/// Creates sessions for the pool.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Opens a new session to `endpoint`.
    async fn create_session(
        &self,
        config: &ConnectionConfig,
        endpoint: &str,
    ) -> S7Result<Arc<dyn UaSession>>;
}
