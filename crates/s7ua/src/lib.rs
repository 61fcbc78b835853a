// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Siemens S7 PLC client over OPC UA.
//!
//! S7-1200/1500 controllers expose their data blocks and memory areas
//! through an embedded OPC UA server. This crate walks that address space,
//! builds a typed model of it and reads or writes values using S7 semantics
//! (BCD timestamps, S5TIME, DTL, structured UDTs) on top of the raw OPC UA
//! values.
//!
//! # Features
//!
//! - Bounded session pool with automatic replacement of dead sessions
//! - Recursive structure discovery of data blocks, instance DBs and areas
//! - Per-type converters for every S7 elementary type and arrays of them
//! - UDT registry with placeholder definitions and typed custom converters
//! - Batched reads and writes of whole subtrees
//!
//! The OPC UA transport itself is abstracted behind [`UaSession`] and
//! [`SessionFactory`], so any client stack can be plugged in.
//!
//! # Error Handling
//!
//! ```text
//! S7Error
//! ├── Connection    - Session unavailable or failed to open
//! ├── Pool          - Session pool lifecycle and exhaustion
//! ├── Browse        - Address space browsing failures
//! ├── Operation     - Read/write round trip failures
//! ├── Conversion    - Raw value <-> S7 value conversion errors
//! ├── Configuration - Invalid settings or node ids
//! └── NotFound      - Missing node ids, converters or definitions
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use s7ua::{ClientConfig, ConnectionConfig, S7Client, S7Value};
//!
//! let config = ClientConfig::new(ConnectionConfig::new("opc.tcp://192.168.0.10:4840"))
//!     .with_pool_size(4);
//! let client = S7Client::new(config, factory)?;
//! client.connect().await?;
//!
//! let structure = client.discover_structure().await?;
//! let values = client.read_structure(&structure).await?;
//! for (path, variable) in values.variables_by_path() {
//!     println!("{path} = {:?}", variable.value);
//! }
//!
//! client.write_by_path(&structure, "Db1.Setpoint", S7Value::I16(999)).await?;
//! client.dispose().await;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod access;
pub mod client;
pub mod conversion;
pub mod data_type;
pub mod discovery;
pub mod error;
pub mod model;
pub mod registry;
pub mod structure;
pub mod type_map;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use error::{
    BrowseError, ConfigurationError, ConnectionError, ConversionError, ErrorCode, ErrorSeverity,
    NotFoundError, OperationError, PoolError, S7Error, S7Result, S7ResultExt,
};

pub use types::{
    AttributeId, ClientConfig, ConnectionConfig, ConnectionConfigBuilder, DiscoveryConfig,
    NodeClass, NodeId, NodeIdentifier, PoolConfig, S7Root, SecurityMode, StatusCode,
    UserIdentity,
};

pub use data_type::S7DataType;
pub use value::{CustomValue, S7Value, ValueKind};

pub use model::{
    GlobalDataBlock, InstanceDataBlock, InstanceDbSection, Node, Quality, StructureElement,
    UdtDefinition, UdtMemberDefinition, Variable, VariableStatus,
};

// Re-export client types
pub use client::{
    BrowseResult, DataValue, PoolStats, S7Client, SessionFactory, SessionLease, SessionPool,
    UaSession, UaValue,
};

pub use access::DataAccessor;
pub use conversion::{
    FromS7Value, MemberView, S7TypeConverter, TypedUdtConverter, UdtConverter, WireType,
};
pub use discovery::StructureDiscoverer;
pub use registry::UdtRegistry;
pub use structure::PlcStructure;
pub use type_map::{MappedType, TypeMappingTable};
