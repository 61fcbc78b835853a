// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! An in-memory S7 address space served through [`MockSession`].
//!
//! Every session created by one [`MockSessionFactory`] shares the same
//! [`MockAddressSpace`], so values written through one pooled session are
//! visible through the others. Node ids follow the dotted S7 convention:
//! a child of `ns=3;s=Db` named `X` gets `ns=3;s=Db.X`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use s7ua::{
    AttributeId, BrowseResult, ConnectionConfig, ConnectionError, DataValue, NodeClass, NodeId,
    S7Error, S7Result, SessionFactory, StatusCode, UaSession, UaValue,
};

/// Vendor namespace used by all mock node ids.
pub const MOCK_NAMESPACE: u16 = 3;

// =============================================================================
// Mock Address Space
// =============================================================================

#[derive(Debug, Default)]
struct SpaceState {
    children: HashMap<NodeId, Vec<BrowseResult>>,
    types: HashMap<NodeId, (NodeId, i32)>,
    values: HashMap<NodeId, UaValue>,
    statuses: HashMap<NodeId, StatusCode>,
    write_status: Option<StatusCode>,
    writes: Vec<Vec<(NodeId, UaValue)>>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Shared in-memory address space.
#[derive(Debug, Default)]
pub struct MockAddressSpace {
    state: Mutex<SpaceState>,
}

impl MockAddressSpace {
    /// Creates an empty address space.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds an object (data block, section, nested instance) below `parent`.
    pub fn add_object(&self, parent: &str, name: &str) -> String {
        self.add_child(parent, name, NodeClass::Object)
    }

    /// Adds a variable with a data type id and value rank and returns its
    /// string identifier.
    pub fn add_variable(
        &self,
        parent: &str,
        name: &str,
        data_type: NodeId,
        value_rank: i32,
        value: UaValue,
    ) -> String {
        let path = self.add_child(parent, name, NodeClass::Variable);
        let id = NodeId::string(MOCK_NAMESPACE, path.clone());
        let mut state = self.state.lock();
        state.types.insert(id.clone(), (data_type, value_rank));
        state.values.insert(id, value);
        path
    }

    /// Adds a scalar variable.
    pub fn add_scalar(&self, parent: &str, name: &str, data_type: NodeId, value: UaValue) -> String {
        self.add_variable(parent, name, data_type, -1, value)
    }

    /// Adds a struct or UDT variable without a value of its own.
    pub fn add_struct(&self, parent: &str, name: &str, data_type: NodeId) -> String {
        self.add_variable(parent, name, data_type, -1, UaValue::Null)
    }

    fn add_child(&self, parent: &str, name: &str, class: NodeClass) -> String {
        let path = format!("{parent}.{name}");
        let id = NodeId::string(MOCK_NAMESPACE, path.clone());
        self.state
            .lock()
            .children
            .entry(NodeId::string(MOCK_NAMESPACE, parent))
            .or_default()
            .push(BrowseResult::new(id, name, class));
        path
    }

    /// Current value of a node.
    pub fn value(&self, path: &str) -> Option<UaValue> {
        self.state
            .lock()
            .values
            .get(&NodeId::string(MOCK_NAMESPACE, path))
            .cloned()
    }

    /// Overrides the read status of one node.
    pub fn set_read_status(&self, path: &str, status: StatusCode) {
        self.state
            .lock()
            .statuses
            .insert(NodeId::string(MOCK_NAMESPACE, path), status);
    }

    /// Forces every write to report `status`. `None` restores normal writes.
    pub fn set_write_status(&self, status: Option<StatusCode>) {
        self.state.lock().write_status = status;
    }

    /// Makes value reads fail at the transport level.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Makes write requests fail at the transport level.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Every write request received, in order.
    pub fn writes(&self) -> Vec<Vec<(NodeId, UaValue)>> {
        self.state.lock().writes.clone()
    }

    fn browse(&self, node_id: &NodeId, mask: u32) -> Vec<BrowseResult> {
        self.state
            .lock()
            .children
            .get(node_id)
            .map(|children| {
                children
                    .iter()
                    .filter(|c| c.node_class.matches_mask(mask))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read(&self, nodes: &[(NodeId, AttributeId)]) -> S7Result<Vec<DataValue>> {
        let state = self.state.lock();
        if state.fail_reads && nodes.iter().any(|(_, a)| *a == AttributeId::Value) {
            return Err(ConnectionError::transport("read timed out").into());
        }

        Ok(nodes
            .iter()
            .map(|(id, attribute)| match attribute {
                AttributeId::DataType => match state.types.get(id) {
                    Some((dt, _)) => DataValue::good(UaValue::NodeId(dt.clone())),
                    None => DataValue::with_status(StatusCode::BAD_NODE_ID_UNKNOWN),
                },
                AttributeId::ValueRank => match state.types.get(id) {
                    Some((_, rank)) => DataValue::good(UaValue::Int32(*rank)),
                    None => DataValue::with_status(StatusCode::BAD_NODE_ID_UNKNOWN),
                },
                AttributeId::ArrayDimensions => match state.types.get(id) {
                    Some((_, rank)) if *rank >= 1 => {
                        let len = match state.values.get(id) {
                            Some(UaValue::ByteString(bytes)) => bytes.len(),
                            Some(UaValue::Array(items)) => items.len(),
                            _ => 0,
                        };
                        DataValue::good(UaValue::Array(vec![UaValue::UInt32(len as u32)]))
                    }
                    Some(_) => DataValue::good(UaValue::Null),
                    None => DataValue::with_status(StatusCode::BAD_NODE_ID_UNKNOWN),
                },
                AttributeId::Value => match state.values.get(id) {
                    Some(value) => {
                        let status = state.statuses.get(id).copied().unwrap_or(StatusCode::GOOD);
                        DataValue {
                            value: value.clone(),
                            status,
                            source_timestamp: None,
                        }
                    }
                    None => DataValue::with_status(StatusCode::BAD_NODE_ID_UNKNOWN),
                },
                _ => DataValue::with_status(StatusCode::BAD),
            })
            .collect())
    }

    fn write(&self, values: &[(NodeId, UaValue)]) -> S7Result<Vec<StatusCode>> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(ConnectionError::transport("write timed out").into());
        }
        state.writes.push(values.to_vec());

        let forced = state.write_status;
        Ok(values
            .iter()
            .map(|(id, value)| {
                if let Some(status) = forced {
                    return status;
                }
                match state.values.get_mut(id) {
                    Some(slot) => {
                        *slot = value.clone();
                        StatusCode::GOOD
                    }
                    None => StatusCode::BAD_NODE_ID_UNKNOWN,
                }
            })
            .collect())
    }
}

// =============================================================================
// Mock Session
// =============================================================================

/// A session over a [`MockAddressSpace`].
#[derive(Debug)]
pub struct MockSession {
    id: usize,
    space: Arc<MockAddressSpace>,
    connected: AtomicBool,
    closed: Arc<AtomicUsize>,
}

impl MockSession {
    /// Creates a connected session.
    pub fn new(space: Arc<MockAddressSpace>) -> Self {
        Self::with_id(0, space, Arc::new(AtomicUsize::new(0)))
    }

    fn with_id(id: usize, space: Arc<MockAddressSpace>, closed: Arc<AtomicUsize>) -> Self {
        Self {
            id,
            space,
            connected: AtomicBool::new(true),
            closed,
        }
    }

    /// Creation order within the factory.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Simulates a dropped connection.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl UaSession for MockSession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn browse(&self, node_id: &NodeId, node_class_mask: u32) -> S7Result<Vec<BrowseResult>> {
        Ok(self.space.browse(node_id, node_class_mask))
    }

    async fn read(&self, nodes: &[(NodeId, AttributeId)]) -> S7Result<Vec<DataValue>> {
        self.space.read(nodes)
    }

    async fn write(&self, values: &[(NodeId, UaValue)]) -> S7Result<Vec<StatusCode>> {
        self.space.write(values)
    }

    async fn close(&self) -> S7Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Mock Session Factory
// =============================================================================

/// Factory handing out [`MockSession`]s over one shared address space.
#[derive(Debug)]
pub struct MockSessionFactory {
    space: Arc<MockAddressSpace>,
    fail_at: Mutex<Option<usize>>,
    attempts: AtomicUsize,
    closed: Arc<AtomicUsize>,
    sessions: Mutex<Vec<Arc<MockSession>>>,
}

impl MockSessionFactory {
    /// Creates a factory over `space`.
    pub fn new(space: Arc<MockAddressSpace>) -> Arc<Self> {
        Arc::new(Self {
            space,
            fail_at: Mutex::new(None),
            attempts: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            sessions: Mutex::new(Vec::new()),
        })
    }

    /// Makes the attempt with zero-based index `attempt` fail.
    pub fn fail_at(&self, attempt: usize) {
        *self.fail_at.lock() = Some(attempt);
    }

    /// Number of create attempts, failures included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of sessions successfully created.
    pub fn created(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Number of sessions closed.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// All sessions created so far, in creation order.
    pub fn sessions(&self) -> Vec<Arc<MockSession>> {
        self.sessions.lock().clone()
    }

    /// The shared address space.
    pub fn space(&self) -> &Arc<MockAddressSpace> {
        &self.space
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn create_session(
        &self,
        _config: &ConnectionConfig,
        endpoint: &str,
    ) -> S7Result<Arc<dyn UaSession>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if *self.fail_at.lock() == Some(attempt) {
            tracing::debug!(attempt, endpoint, "Mock session creation failing");
            return Err(S7Error::session_failed(endpoint, "connection refused"));
        }

        let session = Arc::new(MockSession::with_id(
            attempt,
            Arc::clone(&self.space),
            Arc::clone(&self.closed),
        ));
        self.sessions.lock().push(Arc::clone(&session));
        Ok(session)
    }
}
