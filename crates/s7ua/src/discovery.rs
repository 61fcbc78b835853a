// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Structure discovery.
//!
//! [`StructureDiscoverer`] walks the S7 address space below a shell node and
//! returns the same node with its children filled in. Discovery never fails:
//! browse errors leave a node without children and attribute read errors
//! leave a variable UNKNOWN, so one broken node does not abort the walk.
//!
//! ```text
//! GlobalDataBlock / StructureElement ── browse(Variable) ─▶ Variable*
//! InstanceDataBlock ── browse(Object) ─▶ InstanceDbSection (by name)
//! InstanceDbSection ── browse(Object|Variable) ─▶ Variable* + InstanceDataBlock*
//! Variable (STRUCT/UDT) ── browse(Variable) ─▶ members, recursively
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::client::session::{BrowseResult, UaSession, UaValue};
use crate::data_type::S7DataType;
use crate::error::{BrowseError, S7Error};
use crate::model::{
    GlobalDataBlock, InstanceDataBlock, InstanceDbSection, Node, StructureElement, Variable,
};
use crate::registry::UdtRegistry;
use crate::type_map::{MappedType, TypeMappingTable};
use crate::types::{
    AttributeId, DiscoveryConfig, NodeClass, NodeId, S7Root, MASK_OBJECT, MASK_OBJECT_OR_VARIABLE,
    MASK_VARIABLE,
};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Recursive walker of the S7 address space.
#[derive(Debug)]
pub struct StructureDiscoverer {
    config: DiscoveryConfig,
    type_map: TypeMappingTable,
    registry: Arc<UdtRegistry>,
}

impl StructureDiscoverer {
    /// Creates a discoverer with the default type table for the configured
    /// vendor namespace.
    pub fn new(config: DiscoveryConfig, registry: Arc<UdtRegistry>) -> Self {
        let type_map = TypeMappingTable::new(config.vendor_namespace);
        Self {
            config,
            type_map,
            registry,
        }
    }

    /// Replaces the type table.
    pub fn with_type_map(mut self, type_map: TypeMappingTable) -> Self {
        self.type_map = type_map;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Returns the type table.
    pub fn type_map(&self) -> &TypeMappingTable {
        &self.type_map
    }

    /// Returns the UDT registry placeholders are registered in.
    pub fn registry(&self) -> &Arc<UdtRegistry> {
        &self.registry
    }

    /// Discovers the children of `shell`.
    ///
    /// Returns the shell unchanged if the session is disconnected or its
    /// node id cannot be parsed.
    pub async fn discover(&self, session: &dyn UaSession, shell: &Node) -> Node {
        if !session.is_connected() {
            tracing::warn!(
                node = shell.display_name(),
                kind = shell.kind_name(),
                "Session disconnected, skipping discovery"
            );
            return shell.clone();
        }

        match shell {
            Node::GlobalDataBlock(db) => {
                let Some(id) = parse_node_id(&db.node_id) else {
                    return shell.clone();
                };
                let variables = self.variables_at(session, &id, 0, None).await;
                tracing::debug!(block = %db.display_name, variables = variables.len(), "Discovered global data block");
                Node::GlobalDataBlock(GlobalDataBlock {
                    variables,
                    ..db.clone()
                })
            }
            Node::StructureElement(el) => {
                let Some(id) = parse_node_id(&el.node_id) else {
                    return shell.clone();
                };
                let area_type = TypeMappingTable::area_default(&el.display_name);
                let variables = self.variables_at(session, &id, 0, area_type).await;
                tracing::debug!(area = %el.display_name, variables = variables.len(), "Discovered memory area");
                Node::StructureElement(StructureElement {
                    variables,
                    ..el.clone()
                })
            }
            Node::InstanceDataBlock(db) => {
                Node::InstanceDataBlock(self.discover_instance(session, db.clone()).await)
            }
            Node::InstanceDbSection(section) => {
                Node::InstanceDbSection(self.discover_section(session, section.clone()).await)
            }
            Node::Variable(variable) => Node::Variable(self.discover_variable(session, variable).await),
        }
    }

    /// Builds the shells of every root: one GlobalDataBlock per global data
    /// block, one InstanceDataBlock per instance data block, and one
    /// StructureElement per memory area.
    pub async fn root_shells(&self, session: &dyn UaSession) -> Vec<Node> {
        let ns = self.config.vendor_namespace;
        let mut shells = Vec::new();

        for child in self
            .browse(session, &S7Root::DataBlocksGlobal.node_id(ns), MASK_OBJECT)
            .await
        {
            shells.push(GlobalDataBlock::shell(child.node_id.to_string(), child.display_name).into());
        }
        for child in self
            .browse(session, &S7Root::DataBlocksInstance.node_id(ns), MASK_OBJECT)
            .await
        {
            shells.push(InstanceDataBlock::shell(child.node_id.to_string(), child.display_name).into());
        }
        for root in S7Root::ALL.iter().filter(|r| r.is_area()) {
            shells.push(StructureElement::shell(root.node_id(ns).to_string(), root.name()).into());
        }

        tracing::debug!(roots = shells.len(), "Built root shells");
        shells
    }

    // =========================================================================
    // Instance data blocks
    // =========================================================================

    fn discover_instance<'a>(
        &'a self,
        session: &'a dyn UaSession,
        mut db: InstanceDataBlock,
    ) -> BoxFuture<'a, InstanceDataBlock> {
        Box::pin(async move {
            let Some(id) = parse_node_id(&db.node_id) else {
                return db;
            };
            for child in self.browse(session, &id, MASK_OBJECT).await {
                let shell = InstanceDbSection::shell(child.node_id.to_string(), child.display_name);
                let section = self.discover_section(session, shell).await;
                let name = section.display_name.clone();
                if !db.assign_section(section) {
                    tracing::debug!(block = %db.display_name, section = %name, "Dropping unknown instance section");
                }
            }
            db
        })
    }

    async fn discover_section(
        &self,
        session: &dyn UaSession,
        mut section: InstanceDbSection,
    ) -> InstanceDbSection {
        let Some(id) = parse_node_id(&section.node_id) else {
            return section;
        };

        let (objects, variables): (Vec<_>, Vec<_>) = self
            .browse(session, &id, MASK_OBJECT_OR_VARIABLE)
            .await
            .into_iter()
            .partition(|child| child.node_class == NodeClass::Object);

        section.variables = self.variables_from(session, variables, 0, None).await;
        section.nested_instances = Vec::with_capacity(objects.len());
        for child in objects {
            let shell = InstanceDataBlock::shell(child.node_id.to_string(), child.display_name);
            section
                .nested_instances
                .push(self.discover_instance(session, shell).await);
        }
        section
    }

    // =========================================================================
    // Variables
    // =========================================================================

    async fn discover_variable(&self, session: &dyn UaSession, variable: &Variable) -> Variable {
        if !variable.is_structured() {
            return variable.clone();
        }
        let Some(id) = variable.node_id.as_deref().and_then(parse_node_id) else {
            return variable.clone();
        };

        let members = self.variables_at(session, &id, 1, None).await;
        if let Some(name) = &variable.udt_type_name {
            self.register_udt(name);
            self.registry.enrich_definition(name, &members);
        }
        variable.clone().with_members(members)
    }

    /// Browses variable children of `parent` and maps them.
    fn variables_at<'a>(
        &'a self,
        session: &'a dyn UaSession,
        parent: &'a NodeId,
        depth: usize,
        area_type: Option<S7DataType>,
    ) -> BoxFuture<'a, Vec<Variable>> {
        Box::pin(async move {
            let children = self.browse(session, parent, MASK_VARIABLE).await;
            self.variables_from(session, children, depth, area_type).await
        })
    }

    /// Maps browsed children to variables with one attribute read for all of
    /// them, expanding STRUCT/UDT members.
    async fn variables_from(
        &self,
        session: &dyn UaSession,
        children: Vec<BrowseResult>,
        depth: usize,
        area_type: Option<S7DataType>,
    ) -> Vec<Variable> {
        if children.is_empty() {
            return Vec::new();
        }

        let types = self.read_types(session, &children).await;
        let mut variables = Vec::with_capacity(children.len());

        for (child, (mapped, array_length)) in children.into_iter().zip(types) {
            let MappedType {
                mut s7_type,
                mut udt_type_name,
            } = mapped;

            if let Some(area_type) = area_type {
                if depth == 0 && !s7_type.is_array() && !s7_type.is_structured() {
                    s7_type = area_type;
                }
            }

            if s7_type.is_structured() && depth >= self.config.max_depth {
                S7Error::from(BrowseError::max_depth_exceeded(depth + 1, self.config.max_depth))
                    .log(&format!("expanding '{}', kept as UNKNOWN", child.display_name));
                s7_type = S7DataType::Unknown;
                udt_type_name = None;
            }

            let mut variable = Variable::new(child.node_id.to_string(), child.display_name, s7_type);
            variable.udt_type_name = udt_type_name;
            if variable.s7_type.is_array() {
                variable.array_length = array_length;
            }

            if variable.is_structured() {
                if let Some(name) = &variable.udt_type_name {
                    if self.register_udt(name) {
                        tracing::debug!(udt = %name, variable = %variable.display_name, "Detected UDT");
                    }
                }
                let members = self.variables_at(session, &child.node_id, depth + 1, None).await;
                if let Some(name) = &variable.udt_type_name {
                    self.registry.enrich_definition(name, &members);
                }
                variable = variable.with_members(members);
            }

            variables.push(variable);
        }

        variables
    }

    fn register_udt(&self, name: &str) -> bool {
        let data_type_id = NodeId::string(self.config.vendor_namespace, name);
        self.registry
            .register_placeholder_if_absent(name, Some(data_type_id.to_string()))
    }

    /// Reads DataType, ValueRank and ArrayDimensions of every child in one
    /// request. Returns the mapped type and the element count of each child.
    async fn read_types(
        &self,
        session: &dyn UaSession,
        children: &[BrowseResult],
    ) -> Vec<(MappedType, usize)> {
        const ATTRIBUTES: [AttributeId; 3] = [
            AttributeId::DataType,
            AttributeId::ValueRank,
            AttributeId::ArrayDimensions,
        ];
        let request: Vec<(NodeId, AttributeId)> = children
            .iter()
            .flat_map(|child| ATTRIBUTES.map(|attribute| (child.node_id.clone(), attribute)))
            .collect();

        let results = match session.read(&request).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(error = %e, children = children.len(), "Type attribute read failed");
                return vec![(MappedType::unknown(), 0); children.len()];
            }
        };
        if results.len() != request.len() {
            tracing::warn!(
                expected = request.len(),
                actual = results.len(),
                "Type attribute read returned an unexpected number of results"
            );
        }

        (0..children.len())
            .map(|i| {
                let good = |offset: usize| {
                    results
                        .get(ATTRIBUTES.len() * i + offset)
                        .filter(|r| r.status.is_good())
                };
                let data_type = good(0).and_then(|r| r.value.as_node_id());
                let value_rank = good(1)
                    .and_then(|r| r.value.as_i64())
                    .and_then(|rank| i32::try_from(rank).ok());
                let array_length = good(2).map_or(0, |r| element_count(&r.value));
                (self.type_map.map(data_type, value_rank), array_length)
            })
            .collect()
    }

    /// Browses `node_id`, dropping excluded names and non-matching classes.
    async fn browse(&self, session: &dyn UaSession, node_id: &NodeId, mask: u32) -> Vec<BrowseResult> {
        match session.browse(node_id, mask).await {
            Ok(children) => children
                .into_iter()
                .filter(|child| {
                    child.node_class.matches_mask(mask) && !self.config.is_excluded(&child.display_name)
                })
                .collect(),
            Err(e) => {
                S7Error::from(BrowseError::browse_failed(node_id.to_string(), e.to_string()))
                    .log("browsing children, node treated as empty");
                Vec::new()
            }
        }
    }
}

/// Product of the ArrayDimensions entries, 0 when absent or unbounded.
fn element_count(dimensions: &UaValue) -> usize {
    let dims: Vec<i64> = match dimensions {
        UaValue::Array(items) => items.iter().filter_map(UaValue::as_i64).collect(),
        other => other.as_i64().into_iter().collect(),
    };
    if dims.is_empty() || dims.iter().any(|&d| d <= 0) {
        return 0;
    }
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(usize::try_from(d).ok()?))
        .unwrap_or(0)
}

fn parse_node_id(text: &str) -> Option<NodeId> {
    match text.parse() {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::warn!(node_id = %text, error = %e, "Skipping node with malformed node id");
            None
        }
    }
}
