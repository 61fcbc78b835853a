// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! High-level client combining the pool, discovery and data access.

use std::sync::Arc;

use crate::access::DataAccessor;
use crate::client::pool::SessionPool;
use crate::client::session::SessionFactory;
use crate::conversion::TypedUdtConverter;
use crate::discovery::StructureDiscoverer;
use crate::error::{NotFoundError, S7Error, S7Result};
use crate::model::{Node, Variable};
use crate::registry::UdtRegistry;
use crate::structure::PlcStructure;
use crate::type_map::TypeMappingTable;
use crate::types::ClientConfig;
use crate::value::S7Value;

/// S7 client over a pool of OPC UA sessions.
///
/// Every operation borrows one session from the pool for its duration.
///
/// # Examples
///
/// ```rust,ignore
/// let config = ClientConfig::new(ConnectionConfig::new("opc.tcp://plc:4840"));
/// let client = S7Client::new(config, factory)?;
/// client.connect().await?;
///
/// let structure = client.discover_structure().await?;
/// let values = client.read_structure(&structure).await?;
/// let speed = values.find_variable("Db1.Motor.Speed");
///
/// client.write_by_path(&structure, "Db1.Motor.Speed", S7Value::I16(1200)).await?;
/// client.dispose().await;
/// ```
pub struct S7Client {
    config: ClientConfig,
    pool: SessionPool,
    registry: Arc<UdtRegistry>,
    discoverer: StructureDiscoverer,
    accessor: DataAccessor,
}

impl S7Client {
    /// Creates a client with a fresh UDT registry.
    pub fn new(config: ClientConfig, factory: Arc<dyn SessionFactory>) -> S7Result<Self> {
        Self::with_registry(config, factory, Arc::new(UdtRegistry::new()))
    }

    /// Creates a client sharing an existing UDT registry.
    pub fn with_registry(
        config: ClientConfig,
        factory: Arc<dyn SessionFactory>,
        registry: Arc<UdtRegistry>,
    ) -> S7Result<Self> {
        config.validate()?;
        Ok(Self {
            pool: SessionPool::new(factory, config.pool.clone()),
            discoverer: StructureDiscoverer::new(config.discovery.clone(), Arc::clone(&registry)),
            accessor: DataAccessor::new(Arc::clone(&registry)),
            registry,
            config,
        })
    }

    /// Replaces the type table used by discovery.
    pub fn with_type_map(mut self, type_map: TypeMappingTable) -> Self {
        self.discoverer = self.discoverer.with_type_map(type_map);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the session pool.
    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    /// Returns the UDT registry.
    pub fn registry(&self) -> &Arc<UdtRegistry> {
        &self.registry
    }

    /// Registers a custom UDT converter.
    pub fn register_udt_converter<C: TypedUdtConverter>(&self, converter: C) {
        self.registry.register_typed(converter);
    }

    /// Opens the pool's sessions.
    pub async fn connect(&self) -> S7Result<()> {
        let connection = &self.config.connection;
        self.pool.initialize(connection, &connection.endpoint).await
    }

    /// Discovers the children of one shell node.
    pub async fn discover(&self, shell: &Node) -> S7Result<Node> {
        self.pool
            .execute_with_session(|session| async move {
                Ok(self.discoverer.discover(session.as_ref(), shell).await)
            })
            .await
    }

    /// Discovers every data block and memory area.
    pub async fn discover_structure(&self) -> S7Result<PlcStructure> {
        let roots = self
            .pool
            .execute_with_session(|session| async move {
                let shells = self.discoverer.root_shells(session.as_ref()).await;
                let mut roots = Vec::with_capacity(shells.len());
                for shell in &shells {
                    roots.push(self.discoverer.discover(session.as_ref(), shell).await);
                }
                Ok(roots)
            })
            .await?;

        let structure = PlcStructure::new(roots);
        tracing::info!(
            roots = structure.roots().len(),
            variables = structure.variable_count(),
            udts = self.registry.list_definitions().len(),
            "Discovered PLC structure"
        );
        Ok(structure)
    }

    /// Reads every leaf below `node` in one request.
    pub async fn read(&self, node: &Node, parent_path: &str) -> S7Result<Node> {
        self.pool
            .execute_with_session(|session| async move {
                self.accessor.read_node(session.as_ref(), node, parent_path).await
            })
            .await
    }

    /// Reads a whole structure, one request per root.
    pub async fn read_structure(&self, structure: &PlcStructure) -> S7Result<PlcStructure> {
        let roots = self
            .pool
            .execute_with_session(|session| async move {
                let mut roots = Vec::with_capacity(structure.roots().len());
                for root in structure.roots() {
                    roots.push(self.accessor.read_node(session.as_ref(), root, "").await?);
                }
                Ok::<_, S7Error>(roots)
            })
            .await?;
        Ok(PlcStructure::new(roots))
    }

    /// Writes a value to a variable.
    pub async fn write(&self, variable: &Variable, value: S7Value) -> S7Result<bool> {
        self.pool
            .execute_with_session(|session| async move {
                self.accessor.write_variable(session.as_ref(), variable, value).await
            })
            .await
    }

    /// Writes a value to the variable at `path` in `structure`.
    pub async fn write_by_path(
        &self,
        structure: &PlcStructure,
        path: &str,
        value: S7Value,
    ) -> S7Result<bool> {
        let variable = structure
            .find_variable(path)
            .ok_or_else(|| NotFoundError::path(path))?;
        self.write(variable, value).await
    }

    /// Closes all sessions.
    pub async fn dispose(&self) {
        self.pool.dispose().await;
    }
}

impl std::fmt::Debug for S7Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S7Client")
            .field("endpoint", &self.config.connection.endpoint)
            .field("pool", &self.pool)
            .field("registry", &self.registry)
            .finish()
    }
}
