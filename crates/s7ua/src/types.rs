// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Protocol-level types and client configuration.
//!
//! - **NodeId**: the four OPC UA identifier kinds with parsing and display
//! - **NodeClass / AttributeId / StatusCode**: the protocol vocabulary used by
//!   browse, read and write
//! - **S7Root**: the seven well-known roots of an S7-1500 address space
//! - **ConnectionConfig / ClientConfig**: connection, pool and discovery
//!   settings with serde and builder support
//!
//! # Examples
//!
//! ```
//! use s7ua::types::{ConnectionConfig, NodeId, S7Root};
//!
//! let node: NodeId = "ns=3;s=\"Db\".\"Speed\"".parse().unwrap();
//! assert_eq!(node.namespace_index, 3);
//!
//! let root = S7Root::DataBlocksGlobal.node_id(3);
//! assert_eq!(root.to_string(), "ns=3;s=DataBlocksGlobal");
//!
//! let config = ConnectionConfig::builder()
//!     .endpoint("opc.tcp://192.168.0.1:4840")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.endpoint, "opc.tcp://192.168.0.1:4840");
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ConfigurationError, PoolError, S7Error};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier.
///
/// ```
/// use s7ua::types::NodeId;
///
/// let numeric = NodeId::numeric(0, 4);
/// let parsed: NodeId = "i=4".parse().unwrap();
/// assert_eq!(numeric, parsed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node ID.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: impl Into<Vec<u8>>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value.into()),
        }
    }

    /// Returns the numeric identifier, if any.
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string identifier, if any.
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` for string identifiers.
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self.identifier, NodeIdentifier::String(_))
    }

    /// Returns the OPC UA text form (`ns=3;s=Name`, `i=12`).
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = S7Error;

    /// Parses `ns=3;s=..`, `ns=0;i=..`, `g=..`, `b=..` or a bare identifier
    /// in namespace 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: String| S7Error::from(ConfigurationError::invalid_node_id(s, reason));

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, id) = rest
                    .split_once(';')
                    .ok_or_else(|| invalid("Missing identifier after namespace".into()))?;
                let ns: u16 = ns
                    .parse()
                    .map_err(|_| invalid("Invalid namespace index".into()))?;
                (ns, id)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id
                .parse()
                .map_err(|_| invalid("Invalid numeric identifier".into()))?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            if id.is_empty() {
                return Err(invalid("Empty string identifier".into()));
            }
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id).map_err(|e| invalid(format!("Invalid GUID: {e}")))?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64
                .decode(id)
                .map_err(|e| invalid(format!("Invalid base64: {e}")))?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(invalid(
                "Unknown identifier type. Expected i=, s=, g=, or b=".into(),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The four OPC UA identifier kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),
    /// String identifier. S7 symbols and UDT type ids use this form.
    String(String),
    /// GUID identifier.
    Guid(Uuid),
    /// Opaque identifier.
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={v}"),
            Self::String(v) => write!(f, "s={v}"),
            Self::Guid(v) => write!(f, "g={v}"),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// NodeClass
// =============================================================================

/// OPC UA node class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    /// Object node.
    Object,
    /// Variable node.
    Variable,
    /// Method node.
    Method,
    /// Object type node.
    ObjectType,
    /// Variable type node.
    VariableType,
    /// Reference type node.
    ReferenceType,
    /// Data type node.
    DataType,
    /// View node.
    View,
}

impl NodeClass {
    /// Returns the OPC UA bit mask value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Object => 1,
            Self::Variable => 2,
            Self::Method => 4,
            Self::ObjectType => 8,
            Self::VariableType => 16,
            Self::ReferenceType => 32,
            Self::DataType => 64,
            Self::View => 128,
        }
    }

    /// Creates from OPC UA value.
    pub fn from_value(value: u32) -> Option<Self> {
        match value {
            1 => Some(Self::Object),
            2 => Some(Self::Variable),
            4 => Some(Self::Method),
            8 => Some(Self::ObjectType),
            16 => Some(Self::VariableType),
            32 => Some(Self::ReferenceType),
            64 => Some(Self::DataType),
            128 => Some(Self::View),
            _ => None,
        }
    }

    /// Returns `true` if this class is selected by a browse mask.
    #[inline]
    pub const fn matches_mask(&self, mask: u32) -> bool {
        mask == 0 || self.value() & mask != 0
    }
}

/// Browse mask selecting object nodes.
pub const MASK_OBJECT: u32 = NodeClass::Object.value();

/// Browse mask selecting variable nodes.
pub const MASK_VARIABLE: u32 = NodeClass::Variable.value();

/// Browse mask selecting object and variable nodes.
pub const MASK_OBJECT_OR_VARIABLE: u32 = MASK_OBJECT | MASK_VARIABLE;

// =============================================================================
// AttributeId
// =============================================================================

/// The OPC UA attributes read by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeId {
    /// Browse name attribute.
    BrowseName,
    /// Display name attribute.
    DisplayName,
    /// Value attribute.
    #[default]
    Value,
    /// Data type attribute.
    DataType,
    /// Value rank attribute.
    ValueRank,
    /// Array dimensions attribute.
    ArrayDimensions,
}

impl AttributeId {
    /// Returns the OPC UA numeric value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::BrowseName => 3,
            Self::DisplayName => 4,
            Self::Value => 13,
            Self::DataType => 14,
            Self::ValueRank => 15,
            Self::ArrayDimensions => 16,
        }
    }
}

// =============================================================================
// StatusCode
// =============================================================================

/// Raw OPC UA status code.
///
/// The two top bits carry the severity: `00` good, `01` uncertain, `1x` bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// Good.
    pub const GOOD: Self = Self(0x0000_0000);
    /// Generic uncertain.
    pub const UNCERTAIN: Self = Self(0x4000_0000);
    /// Generic bad.
    pub const BAD: Self = Self(0x8000_0000);
    /// The node id syntax is invalid.
    pub const BAD_NODE_ID_INVALID: Self = Self(0x8033_0000);
    /// The node id refers to a node that does not exist.
    pub const BAD_NODE_ID_UNKNOWN: Self = Self(0x8034_0000);
    /// The value supplied has the wrong type.
    pub const BAD_TYPE_MISMATCH: Self = Self(0x8074_0000);
    /// No value has been received yet.
    pub const BAD_WAITING_FOR_INITIAL_DATA: Self = Self(0x80AB_0000);

    /// Returns the raw value.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the severity is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Returns `true` if the severity is uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    /// Returns `true` if the severity is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08X} ({})",
            self.0,
            crate::error::OperationError::status_code_name(self.0)
        )
    }
}

// =============================================================================
// S7Root
// =============================================================================

/// Well-known root folders of the S7-1500 OPC UA address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum S7Root {
    /// Global data blocks.
    DataBlocksGlobal,
    /// Instance data blocks.
    DataBlocksInstance,
    /// Bit memory (M area).
    Memory,
    /// Process image inputs.
    Inputs,
    /// Process image outputs.
    Outputs,
    /// Timers.
    Timers,
    /// Counters.
    Counters,
}

impl S7Root {
    /// All roots in discovery order.
    pub const ALL: [S7Root; 7] = [
        Self::DataBlocksGlobal,
        Self::DataBlocksInstance,
        Self::Memory,
        Self::Inputs,
        Self::Outputs,
        Self::Timers,
        Self::Counters,
    ];

    /// Returns the string identifier of the root.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DataBlocksGlobal => "DataBlocksGlobal",
            Self::DataBlocksInstance => "DataBlocksInstance",
            Self::Memory => "Memory",
            Self::Inputs => "Inputs",
            Self::Outputs => "Outputs",
            Self::Timers => "Timers",
            Self::Counters => "Counters",
        }
    }

    /// Returns the root node id in the given vendor namespace.
    pub fn node_id(&self, vendor_namespace: u16) -> NodeId {
        NodeId::string(vendor_namespace, self.name())
    }

    /// Returns `true` for the five flat memory areas.
    pub const fn is_area(&self) -> bool {
        !matches!(self, Self::DataBlocksGlobal | Self::DataBlocksInstance)
    }
}

impl fmt::Display for S7Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// SecurityMode / UserIdentity
// =============================================================================

/// Message security mode requested from the session factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// No security.
    #[default]
    None,
    /// Messages are signed.
    Sign,
    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

/// User identity presented when a session is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserIdentity {
    /// Anonymous authentication.
    #[default]
    Anonymous,
    /// Username and password authentication.
    UserName {
        /// The username.
        username: String,
        /// The password.
        password: String,
    },
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::UserName { username, .. } => write!(f, "UserName({username})"),
        }
    }
}

// =============================================================================
// ConnectionConfig
// =============================================================================

/// Settings handed to the session factory for every pooled session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server endpoint URL (e.g., "opc.tcp://192.168.0.1:4840").
    pub endpoint: String,

    /// Security mode.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// User identity.
    #[serde(default)]
    pub user_identity: UserIdentity,

    /// Application name.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Application URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_uri: Option<String>,

    /// Session timeout.
    #[serde(default = "default_session_timeout", with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Request timeout for browse/read/write.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_application_name() -> String {
    "S7 UA Client".to_string()
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

impl ConnectionConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Creates a configuration with only the endpoint set.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), S7Error> {
        if self.endpoint.is_empty() {
            return Err(ConfigurationError::missing_field("endpoint").into());
        }

        if !self.endpoint.starts_with("opc.tcp://") {
            return Err(ConfigurationError::invalid_endpoint(
                &self.endpoint,
                "Endpoint must start with opc.tcp://",
            )
            .into());
        }

        if self.session_timeout.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "session_timeout",
                "Session timeout must be greater than 0",
            )
            .into());
        }

        Ok(())
    }

    /// Returns the effective application URI.
    pub fn effective_application_uri(&self) -> String {
        self.application_uri.clone().unwrap_or_else(|| {
            format!("urn:s7ua:{}", self.application_name.replace(' ', ""))
        })
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            security_mode: SecurityMode::default(),
            user_identity: UserIdentity::default(),
            application_name: default_application_name(),
            application_uri: None,
            session_timeout: default_session_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Builder for [`ConnectionConfig`].
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    endpoint: Option<String>,
    security_mode: Option<SecurityMode>,
    user_identity: Option<UserIdentity>,
    application_name: Option<String>,
    application_uri: Option<String>,
    session_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl ConnectionConfigBuilder {
    /// Sets the server endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the security mode.
    pub fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.security_mode = Some(mode);
        self
    }

    /// Sets username/password authentication.
    pub fn username(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.user_identity = Some(UserIdentity::UserName {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Sets the application URI.
    pub fn application_uri(mut self, uri: impl Into<String>) -> Self {
        self.application_uri = Some(uri.into());
        self
    }

    /// Sets the session timeout.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = Some(timeout);
        self
    }

    /// Sets the request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<ConnectionConfig, S7Error> {
        let config = ConnectionConfig {
            endpoint: self
                .endpoint
                .ok_or_else(|| ConfigurationError::missing_field("endpoint"))?,
            security_mode: self.security_mode.unwrap_or_default(),
            user_identity: self.user_identity.unwrap_or_default(),
            application_name: self
                .application_name
                .unwrap_or_else(default_application_name),
            application_uri: self.application_uri,
            session_timeout: self.session_timeout.unwrap_or_else(default_session_timeout),
            request_timeout: self.request_timeout.unwrap_or_else(default_request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// PoolConfig / DiscoveryConfig / ClientConfig
// =============================================================================

/// Session pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of sessions created by `initialize`.
    pub size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { size: 5 }
    }
}

impl PoolConfig {
    /// Creates a pool configuration with the given size.
    pub fn with_size(size: usize) -> Self {
        Self { size }
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), S7Error> {
        if self.size == 0 {
            return Err(PoolError::InvalidSize { size: self.size }.into());
        }
        Ok(())
    }
}

/// Structure discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum struct/UDT nesting depth before members become UNKNOWN leaves.
    pub max_depth: usize,

    /// Namespace index of the S7 vendor namespace.
    pub vendor_namespace: u16,

    /// Child display names skipped at every browse.
    pub excluded_names: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            vendor_namespace: 3,
            excluded_names: vec!["Icon".to_string()],
        }
    }
}

impl DiscoveryConfig {
    /// Returns `true` if a child with this display name is skipped.
    pub fn is_excluded(&self, display_name: &str) -> bool {
        self.excluded_names.iter().any(|n| n == display_name)
    }
}

/// Top-level client configuration.
///
/// ```
/// use s7ua::types::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{
///     "connection": { "endpoint": "opc.tcp://plc:4840", "request_timeout": "5s" },
///     "pool": { "size": 2 }
/// }"#).unwrap();
/// assert_eq!(config.pool.size, 2);
/// assert_eq!(config.discovery.max_depth, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Connection settings.
    pub connection: ConnectionConfig,

    /// Pool settings.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

impl ClientConfig {
    /// Creates a configuration with defaults for everything except the connection.
    pub fn new(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            pool: PoolConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }

    /// Sets the pool size.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool.size = size;
        self
    }

    /// Validates all sections.
    pub fn validate(&self) -> Result<(), S7Error> {
        self.connection.validate()?;
        self.pool.validate()?;
        Ok(())
    }
}

// =============================================================================
// humantime_serde helper
// =============================================================================

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================
