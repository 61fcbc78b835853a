// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for S7 access over OPC UA.
//!
//! The hierarchy is organized by concern so callers can match on the part of
//! the stack that failed while still handling everything through [`S7Error`].
//!
//! # Error Categories
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
//! # Examples
//!
//! ```
//! use s7ua::error::{S7Error, PoolError, ErrorSeverity};
//!
//! let error = S7Error::from(PoolError::exhausted(2, 5));
//! assert_eq!(error.severity(), ErrorSeverity::Critical);
//! assert!(error.to_string().contains("2 out of 5"));
//! ```

use std::fmt;
use thiserror::Error;
use tracing::Level;

// =============================================================================
// S7Error - Main Error Type
// =============================================================================

/// The main error type of the crate.
#[derive(Debug, Error)]
pub enum S7Error {
    /// Connection-related errors.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Session pool errors.
    #[error("{0}")]
    Pool(#[from] PoolError),

    /// Browse errors.
    #[error("{0}")]
    Browse(#[from] BrowseError),

    /// Read/write operation errors.
    #[error("{0}")]
    Operation(#[from] OperationError),

    /// Value conversion errors.
    #[error("{0}")]
    Conversion(#[from] ConversionError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// Lookup errors.
    #[error("{0}")]
    NotFound(#[from] NotFoundError),
}

impl S7Error {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a not connected error.
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Creates a session creation failure.
    pub fn session_failed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection(ConnectionError::session_creation_failed(endpoint, message))
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Returns `true` if the failed operation may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_retryable(),
            Self::Pool(e) => e.is_retryable(),
            Self::Browse(_) => false,
            Self::Operation(e) => e.is_retryable(),
            Self::Conversion(_) | Self::Configuration(_) | Self::NotFound(_) => false,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(_) => ErrorSeverity::Warning,
            Self::Pool(e) => e.severity(),
            Self::Browse(_) => ErrorSeverity::Warning,
            Self::Operation(_) => ErrorSeverity::Error,
            Self::Conversion(_) => ErrorSeverity::Error,
            Self::Configuration(_) => ErrorSeverity::Critical,
            Self::NotFound(_) => ErrorSeverity::Error,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Pool(_) => "pool",
            Self::Browse(_) => "browse",
            Self::Operation(_) => "operation",
            Self::Conversion(_) => "conversion",
            Self::Configuration(_) => "configuration",
            Self::NotFound(_) => "not_found",
        }
    }

    /// Returns a unique error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Connection(e) => e.error_code(),
            Self::Pool(e) => e.error_code(),
            Self::Browse(e) => e.error_code(),
            Self::Operation(e) => e.error_code(),
            Self::Conversion(e) => e.error_code(),
            Self::Configuration(e) => e.error_code(),
            Self::NotFound(e) => e.error_code(),
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        let code = self.error_code();

        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Errors raised when no usable session is available.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The session is not connected.
    #[error("Not connected to OPC UA server")]
    NotConnected,

    /// The session factory could not open a session.
    #[error("Failed to create session to '{endpoint}': {message}")]
    SessionCreationFailed {
        /// Target endpoint.
        endpoint: String,
        /// Error message.
        message: String,
    },

    /// Transport failure reported by the session.
    #[error("Transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
    },
}

impl ConnectionError {
    /// Creates a session creation failure.
    pub fn session_creation_failed(
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SessionCreationFailed {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns `true` if reconnecting may resolve the error.
    pub fn is_retryable(&self) -> bool {
        true
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::NotConnected => 1,
            Self::SessionCreationFailed { .. } => 2,
            Self::Transport { .. } => 3,
        };
        ErrorCode::new(1, code)
    }
}

// =============================================================================
// PoolError
// =============================================================================

/// Session pool lifecycle errors.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A borrow was attempted before the pool was initialized.
    #[error("Session pool is not initialized")]
    Uninitialized,

    /// `initialize` was called on a pool that already holds sessions.
    #[error("Session pool is already initialized")]
    AlreadyInitialized,

    /// Not every session could be created during initialization.
    #[error("Session pool initialization failed: created {created} out of {requested} sessions")]
    Exhausted {
        /// Sessions created before the failure.
        created: usize,
        /// Configured pool size.
        requested: usize,
    },

    /// The pool was disposed.
    #[error("Session pool has been disposed")]
    Disposed,

    /// A dead session could not be replaced.
    #[error("Failed to replace disconnected session: {message}")]
    ReplacementFailed {
        /// Error message.
        message: String,
    },

    /// The configured pool size is unusable.
    #[error("Invalid session pool size: {size}")]
    InvalidSize {
        /// Configured size.
        size: usize,
    },
}

impl PoolError {
    /// Creates an exhaustion error.
    pub fn exhausted(created: usize, requested: usize) -> Self {
        Self::Exhausted { created, requested }
    }

    /// Creates a replacement failure.
    pub fn replacement_failed(message: impl Into<String>) -> Self {
        Self::ReplacementFailed {
            message: message.into(),
        }
    }

    /// Returns `true` if the error may be transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::ReplacementFailed { .. })
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Exhausted { .. } | Self::InvalidSize { .. } => ErrorSeverity::Critical,
            Self::ReplacementFailed { .. } => ErrorSeverity::Error,
            Self::Uninitialized | Self::AlreadyInitialized | Self::Disposed => {
                ErrorSeverity::Warning
            }
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::Uninitialized => 1,
            Self::AlreadyInitialized => 2,
            Self::Exhausted { .. } => 3,
            Self::Disposed => 4,
            Self::ReplacementFailed { .. } => 5,
            Self::InvalidSize { .. } => 6,
        };
        ErrorCode::new(2, code)
    }
}

// =============================================================================
// BrowseError
// =============================================================================

/// Address space browsing errors.
#[derive(Debug, Error)]
pub enum BrowseError {
    /// Browse call failed.
    #[error("Browse failed for '{node_id}': {message}")]
    BrowseFailed {
        /// The node id.
        node_id: String,
        /// Error message.
        message: String,
    },

    /// Discovery recursion limit reached.
    #[error("Maximum browse depth exceeded: {depth} > {max}")]
    MaxDepthExceeded {
        /// Reached depth.
        depth: usize,
        /// Configured limit.
        max: usize,
    },
}

impl BrowseError {
    /// Creates a browse failed error.
    pub fn browse_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrowseFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a depth exceeded error.
    pub fn max_depth_exceeded(depth: usize, max: usize) -> Self {
        Self::MaxDepthExceeded { depth, max }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::BrowseFailed { .. } => 1,
            Self::MaxDepthExceeded { .. } => 2,
        };
        ErrorCode::new(3, code)
    }
}

// =============================================================================
// OperationError
// =============================================================================

/// Read and write round trip errors.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Write failed.
    #[error("Write failed for '{node_id}': {message}")]
    WriteFailed {
        /// The node id.
        node_id: String,
        /// Error message.
        message: String,
    },

    /// The server answered with a bad status.
    #[error("Bad status 0x{status_code:08X} for '{node_id}'")]
    BadStatus {
        /// The node id.
        node_id: String,
        /// Raw status code.
        status_code: u32,
    },

    /// The number of results does not match the number of requests.
    #[error("Expected {expected} results, got {actual}")]
    ResultCountMismatch {
        /// Number of requested items.
        expected: usize,
        /// Number of returned items.
        actual: usize,
    },
}

impl OperationError {
    /// Creates a write failed error.
    pub fn write_failed(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Creates a bad status error.
    pub fn bad_status(node_id: impl Into<String>, status_code: u32) -> Self {
        Self::BadStatus {
            node_id: node_id.into(),
            status_code,
        }
    }

    /// Returns `true` if the operation may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::WriteFailed { .. })
    }

    /// Returns a symbolic name for well-known status codes.
    pub fn status_code_name(code: u32) -> &'static str {
        match code {
            0x0000_0000 => "Good",
            0x4000_0000 => "Uncertain",
            0x8000_0000 => "Bad",
            0x8001_0000 => "BadUnexpectedError",
            0x8002_0000 => "BadInternalError",
            0x800A_0000 => "BadTimeout",
            0x800E_0000 => "BadServerNotConnected",
            0x8033_0000 => "BadNodeIdInvalid",
            0x8034_0000 => "BadNodeIdUnknown",
            0x8035_0000 => "BadAttributeIdInvalid",
            0x8068_0000 => "BadNotReadable",
            0x8069_0000 => "BadNotWritable",
            0x8074_0000 => "BadTypeMismatch",
            0x80AB_0000 => "BadWaitingForInitialData",
            c if c & 0x8000_0000 != 0 => "Bad",
            c if c & 0x4000_0000 != 0 => "Uncertain",
            _ => "Good",
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::WriteFailed { .. } => 1,
            Self::BadStatus { .. } => 2,
            Self::ResultCountMismatch { .. } => 3,
        };
        ErrorCode::new(4, code)
    }
}

// =============================================================================
// ConversionError
// =============================================================================

/// Errors converting between raw protocol values and S7 values.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Type mismatch.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// Invalid value.
    #[error("Invalid value for type '{target_type}': {message}")]
    InvalidValue {
        /// Target type.
        target_type: String,
        /// Error message.
        message: String,
    },

    /// Byte array of the wrong length.
    #[error("Invalid length for '{target_type}': expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Target type.
        target_type: String,
        /// Expected byte count.
        expected: usize,
        /// Received byte count.
        actual: usize,
    },

    /// Array conversion failed.
    #[error("Array conversion failed at index {index}: {message}")]
    ArrayConversionFailed {
        /// Element index.
        index: usize,
        /// Error message.
        message: String,
    },

    /// Null value.
    #[error("Unexpected null value")]
    NullValue,

    /// Value out of range.
    #[error("Value {value} out of range [{min}, {max}]")]
    ValueOutOfRange {
        /// The value that is out of range.
        value: String,
        /// Minimum allowed value.
        min: String,
        /// Maximum allowed value.
        max: String,
    },

    /// Invalid format, e.g. a nibble that is not a BCD digit.
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Error message.
        message: String,
    },

    /// Unsupported type.
    #[error("Unsupported type: {type_name}")]
    UnsupportedType {
        /// Type name.
        type_name: String,
    },
}

impl ConversionError {
    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(target_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            target_type: target_type.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid length error.
    pub fn invalid_length(target_type: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::InvalidLength {
            target_type: target_type.into(),
            expected,
            actual,
        }
    }

    /// Wraps an element failure with its index.
    pub fn array_element(index: usize, source: &ConversionError) -> Self {
        Self::ArrayConversionFailed {
            index,
            message: source.to_string(),
        }
    }

    /// Creates a value out of range error.
    pub fn value_out_of_range<T: fmt::Display>(value: T, min: T, max: T) -> Self {
        Self::ValueOutOfRange {
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid BCD error for the given byte.
    pub fn invalid_bcd(byte: u8, position: usize) -> Self {
        Self::invalid_format(format!(
            "byte 0x{byte:02X} at offset {position} is not a valid BCD value"
        ))
    }

    /// Creates an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::TypeMismatch { .. } => 1,
            Self::InvalidValue { .. } => 2,
            Self::InvalidLength { .. } => 3,
            Self::ArrayConversionFailed { .. } => 4,
            Self::NullValue => 5,
            Self::ValueOutOfRange { .. } => 6,
            Self::InvalidFormat { .. } => 7,
            Self::UnsupportedType { .. } => 8,
        };
        ErrorCode::new(5, code)
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Invalid endpoint URL.
    #[error("Invalid endpoint URL: '{url}' - {reason}")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Reason.
        reason: String,
    },

    /// Invalid node id text.
    #[error("Invalid node id '{node_id}': {reason}")]
    InvalidNodeId {
        /// The node id text.
        node_id: String,
        /// Reason.
        reason: String,
    },

    /// Invalid field value.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Missing required field.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name.
        field: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid node id error.
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::InvalidEndpoint { .. } => 1,
            Self::InvalidNodeId { .. } => 2,
            Self::InvalidValue { .. } => 3,
            Self::MissingField { .. } => 4,
        };
        ErrorCode::new(6, code)
    }
}

// =============================================================================
// NotFoundError
// =============================================================================

/// Lookup failures that name the missing identifier.
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// Write target carries no node id.
    #[error("Variable '{variable}' has no node id")]
    NodeId {
        /// Display name of the variable.
        variable: String,
    },

    /// No custom converter is registered for a UDT.
    #[error("No converter registered for UDT '{udt_type_name}'")]
    UdtConverter {
        /// UDT type name.
        udt_type_name: String,
    },

    /// No definition is registered for a UDT.
    #[error("No definition registered for UDT '{udt_type_name}'")]
    UdtDefinition {
        /// UDT type name.
        udt_type_name: String,
    },

    /// No variable at the given full path.
    #[error("No variable found at path '{path}'")]
    Path {
        /// The full path.
        path: String,
    },
}

impl NotFoundError {
    /// Creates a missing node id error.
    pub fn node_id(variable: impl Into<String>) -> Self {
        Self::NodeId {
            variable: variable.into(),
        }
    }

    /// Creates a missing UDT converter error.
    pub fn udt_converter(udt_type_name: impl Into<String>) -> Self {
        Self::UdtConverter {
            udt_type_name: udt_type_name.into(),
        }
    }

    /// Creates a missing UDT definition error.
    pub fn udt_definition(udt_type_name: impl Into<String>) -> Self {
        Self::UdtDefinition {
            udt_type_name: udt_type_name.into(),
        }
    }

    /// Creates a missing path error.
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path { path: path.into() }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        let code = match self {
            Self::NodeId { .. } => 1,
            Self::UdtConverter { .. } => 2,
            Self::UdtDefinition { .. } => 3,
            Self::Path { .. } => 4,
        };
        ErrorCode::new(7, code)
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code.
///
/// Format: `S7-XXYY` where XX is the category and YY the specific error.
///
/// Categories:
/// - 1: Connection
/// - 2: Pool
/// - 3: Browse
/// - 4: Operation
/// - 5: Conversion
/// - 6: Configuration
/// - 7: NotFound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category (1-7).
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S7-{:02X}{:02X}", self.category, self.code)
    }
}

// =============================================================================
// Result Type
// =============================================================================

/// Result alias used throughout the crate.
pub type S7Result<T> = Result<T, S7Error>;

/// Extension trait adding logged context to results.
pub trait S7ResultExt<T> {
    /// Logs the error with the given context before passing it on.
    fn log_context(self, context: &str) -> S7Result<T>;

    /// Adds node context to errors.
    fn with_node(self, node_id: &str) -> S7Result<T>;
}

impl<T> S7ResultExt<T> for S7Result<T> {
    fn log_context(self, context: &str) -> S7Result<T> {
        self.map_err(|e| {
            e.log(context);
            e
        })
    }

    fn with_node(self, node_id: &str) -> S7Result<T> {
        self.map_err(|e| {
            tracing::debug!(node_id = node_id, error = %e, "S7 error with node context");
            e
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
