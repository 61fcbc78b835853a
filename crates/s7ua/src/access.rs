// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Batched reads and writes over a discovered tree.
//!
//! A read collects every leaf variable below a node, reads all their values
//! in one request and rebuilds the tree with converted values, statuses and
//! full paths. The input tree is not modified.
//!
//! A write converts one value and writes it. STRUCT and UDT values are split
//! into their member leaves, which are written together in one request.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::session::{DataValue, UaSession, UaValue};
use crate::conversion::{self, StructConverter};
use crate::error::{
    ConversionError, NotFoundError, OperationError, S7Error, S7Result, S7ResultExt,
};
use crate::model::{
    GlobalDataBlock, InstanceDataBlock, InstanceDbSection, Node, StructureElement, Variable,
    VariableStatus,
};
use crate::registry::UdtRegistry;
use crate::types::{AttributeId, NodeId, StatusCode};
use crate::value::{S7Value, ValueKind};

/// Joins a parent path and a name with a dot.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Reads and writes variables of a discovered tree.
#[derive(Debug, Clone)]
pub struct DataAccessor {
    registry: Arc<UdtRegistry>,
}

impl DataAccessor {
    /// Creates an accessor that resolves custom UDT converters in `registry`.
    pub fn new(registry: Arc<UdtRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Arc<UdtRegistry> {
        &self.registry
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Reads every leaf below `node` in one request and returns the rebuilt
    /// tree.
    ///
    /// Full paths start at `parent_path` followed by the node's own name. A
    /// leaf without a result stays Waiting; a leaf whose node id does not
    /// parse is Bad with `BadNodeIdInvalid`. A value that fails to convert,
    /// or a UDT a custom converter rejects, keeps its raw value and is Bad
    /// with `BadTypeMismatch`. On a disconnected session the node is returned
    /// unchanged.
    pub async fn read_node(
        &self,
        session: &dyn UaSession,
        node: &Node,
        parent_path: &str,
    ) -> S7Result<Node> {
        if !session.is_connected() {
            tracing::warn!(node = node.display_name(), "Session disconnected, skipping read");
            return Ok(node.clone());
        }

        let mut leaves = Vec::new();
        node.visit_variables(&mut |variable| {
            if !variable.is_structured() {
                if let Some(id) = variable.node_id.as_deref().and_then(|text| text.parse::<NodeId>().ok()) {
                    leaves.push(id);
                }
            }
        });

        let results = self.read_values(session, &leaves).await?;
        tracing::debug!(
            node = node.display_name(),
            leaves = leaves.len(),
            results = results.len(),
            "Read node values"
        );

        let rebuild = Rebuild {
            registry: &self.registry,
            results: &results,
        };
        Ok(rebuild.node(node, parent_path))
    }

    async fn read_values(
        &self,
        session: &dyn UaSession,
        leaves: &[NodeId],
    ) -> S7Result<HashMap<String, DataValue>> {
        if leaves.is_empty() {
            return Ok(HashMap::new());
        }

        let request: Vec<_> = leaves.iter().map(|id| (id.clone(), AttributeId::Value)).collect();
        let values = session.read(&request).await.log_context("batched value read")?;
        if values.len() != request.len() {
            tracing::warn!(
                expected = request.len(),
                actual = values.len(),
                "Value read returned an unexpected number of results"
            );
        }

        Ok(leaves
            .iter()
            .zip(values)
            .map(|(id, value)| (id.to_string(), value))
            .collect())
    }

    // =========================================================================
    // Write
    // =========================================================================

    /// Writes `value` to `variable`.
    ///
    /// Returns `Ok(true)` when every written node reported a good status,
    /// `Ok(false)` when the session is disconnected, a node id is malformed,
    /// the write request fails or any status is not good. Conversion errors
    /// and missing node ids are returned as errors.
    ///
    /// STRUCT and UDT variables take an [`S7Value::Struct`] or, when a custom
    /// converter is registered for the UDT, an [`S7Value::Custom`]. A
    /// `Struct` value already names its members, so it is assigned to them
    /// directly even when a custom converter exists; writing one to a UDT
    /// whose definition is not in the registry fails with
    /// [`NotFoundError::UdtDefinition`]. Members are written in one request
    /// and are not rolled back on partial failure.
    pub async fn write_variable(
        &self,
        session: &dyn UaSession,
        variable: &Variable,
        value: S7Value,
    ) -> S7Result<bool> {
        if !session.is_connected() {
            tracing::warn!(variable = %variable.display_name, "Session disconnected, skipping write");
            return Ok(false);
        }

        let mut leaves = Vec::new();
        self.flatten(variable, value, &mut leaves)?;

        let mut request = Vec::with_capacity(leaves.len());
        for (leaf, value) in leaves {
            let text = leaf
                .node_id
                .as_deref()
                .ok_or_else(|| NotFoundError::node_id(&leaf.display_name))?;
            let Ok(id) = text.parse::<NodeId>() else {
                tracing::warn!(variable = %leaf.display_name, node_id = %text, "Malformed node id, write skipped");
                return Ok(false);
            };
            let raw = conversion::to_protocol(leaf.s7_type, &value)
                .map_err(S7Error::from)
                .with_node(text)?;
            request.push((id, raw));
        }

        if request.is_empty() {
            tracing::debug!(variable = %variable.display_name, "Nothing to write");
            return Ok(true);
        }

        self.send_write(session, variable, &request).await
    }

    async fn send_write(
        &self,
        session: &dyn UaSession,
        variable: &Variable,
        request: &[(NodeId, UaValue)],
    ) -> S7Result<bool> {
        let name = &variable.display_name;
        let statuses = match session.write(request).await {
            Ok(statuses) => statuses,
            Err(e) => {
                let target = variable.node_id.as_deref().unwrap_or(name);
                S7Error::from(OperationError::write_failed(target, e.to_string()))
                    .log("batched value write");
                return Ok(false);
            }
        };

        if statuses.len() != request.len() {
            let e = OperationError::ResultCountMismatch {
                expected: request.len(),
                actual: statuses.len(),
            };
            tracing::warn!(variable = %name, error = %e, "Write returned an unexpected number of results");
            return Ok(false);
        }

        let mut all_good = true;
        for ((id, _), status) in request.iter().zip(&statuses) {
            if !status.is_good() {
                all_good = false;
                let e = OperationError::bad_status(id.to_string(), status.bits());
                tracing::warn!(variable = %name, error = %e, "Write rejected");
            }
        }

        if all_good {
            tracing::debug!(variable = %name, nodes = request.len(), "Write succeeded");
        }
        Ok(all_good)
    }

    /// Splits a value into `(leaf variable, value)` pairs.
    fn flatten(
        &self,
        variable: &Variable,
        value: S7Value,
        out: &mut Vec<(Variable, S7Value)>,
    ) -> S7Result<()> {
        if !variable.is_structured() {
            out.push((variable.clone(), value));
            return Ok(());
        }

        let type_name = variable
            .udt_type_name
            .as_deref()
            .unwrap_or(&variable.display_name);

        let members = match &value {
            S7Value::Custom(custom) => {
                let name = variable.udt_type_name.as_deref().unwrap_or(custom.type_name());
                let converter = self
                    .registry
                    .get_converter(name)
                    .ok_or_else(|| NotFoundError::udt_converter(name))?;
                converter.to_members(custom, &variable.struct_members)?
            }
            S7Value::Struct(_) => {
                if let Some(name) = variable.udt_type_name.as_deref() {
                    if !self.registry.contains_definition(name) {
                        return Err(NotFoundError::udt_definition(name).into());
                    }
                }
                StructConverter::decompose(type_name, &variable.struct_members, &value)?
            }
            other => {
                return Err(ConversionError::type_mismatch(
                    format!("struct value for '{type_name}'"),
                    other.kind().to_string(),
                )
                .into())
            }
        };

        for member in members {
            let Some(member_value) = member.value.clone() else {
                continue;
            };
            self.flatten(&member, member_value, out)?;
        }
        Ok(())
    }
}

// =============================================================================
// Rebuild
// =============================================================================

/// Pure rebuild of a tree from read results.
struct Rebuild<'a> {
    registry: &'a UdtRegistry,
    results: &'a HashMap<String, DataValue>,
}

impl Rebuild<'_> {
    fn node(&self, node: &Node, parent_path: &str) -> Node {
        match node {
            Node::GlobalDataBlock(db) => {
                let path = join_path(parent_path, &db.display_name);
                Node::GlobalDataBlock(GlobalDataBlock {
                    variables: self.variables(&db.variables, &path),
                    ..db.clone()
                })
            }
            Node::StructureElement(el) => {
                let path = join_path(parent_path, &el.display_name);
                Node::StructureElement(StructureElement {
                    variables: self.variables(&el.variables, &path),
                    ..el.clone()
                })
            }
            Node::InstanceDataBlock(db) => Node::InstanceDataBlock(self.instance(db, parent_path)),
            Node::InstanceDbSection(section) => {
                Node::InstanceDbSection(self.section(section, parent_path))
            }
            Node::Variable(variable) => Node::Variable(self.variable(variable, parent_path)),
        }
    }

    fn instance(&self, db: &InstanceDataBlock, parent_path: &str) -> InstanceDataBlock {
        let path = join_path(parent_path, &db.display_name);
        let section = |s: &Option<InstanceDbSection>| s.as_ref().map(|s| self.section(s, &path));
        InstanceDataBlock {
            inputs: section(&db.inputs),
            outputs: section(&db.outputs),
            in_outs: section(&db.in_outs),
            static_: section(&db.static_),
            ..db.clone()
        }
    }

    fn section(&self, section: &InstanceDbSection, parent_path: &str) -> InstanceDbSection {
        let path = join_path(parent_path, &section.display_name);
        InstanceDbSection {
            variables: self.variables(&section.variables, &path),
            nested_instances: section
                .nested_instances
                .iter()
                .map(|db| self.instance(db, &path))
                .collect(),
            ..section.clone()
        }
    }

    fn variables(&self, variables: &[Variable], parent_path: &str) -> Vec<Variable> {
        variables
            .iter()
            .map(|v| self.variable(v, parent_path))
            .collect()
    }

    fn variable(&self, variable: &Variable, parent_path: &str) -> Variable {
        let mut out = variable.reset();
        out.full_path = Some(join_path(parent_path, &variable.display_name));

        if variable.is_structured() {
            return self.structured(out, variable);
        }

        let Some(text) = variable.node_id.as_deref() else {
            return out;
        };
        let Ok(id) = text.parse::<NodeId>() else {
            out.status = VariableStatus::BAD_NODE_ID;
            return out;
        };
        let Some(result) = self.results.get(&id.to_string()) else {
            return out;
        };

        out.status = VariableStatus::Read(result.status);
        out.source_timestamp = result.source_timestamp;
        out.raw_value = Some(result.value.clone());

        if !result.value.is_null() && !result.status.is_bad() {
            match conversion::from_protocol(variable.s7_type, &result.value) {
                Ok((value, kind)) => {
                    out.value = Some(value);
                    out.system_type = Some(kind);
                }
                Err(e) => {
                    S7Error::from(e).log(&format!("converting '{}'", variable.display_name));
                    out.status = VariableStatus::Read(StatusCode::BAD_TYPE_MISMATCH);
                }
            }
        }
        out
    }

    fn structured(&self, mut out: Variable, variable: &Variable) -> Variable {
        let path = out.full_path.clone().unwrap_or_default();
        out.struct_members = self.variables(&variable.struct_members, &path);
        out.status = out
            .struct_members
            .iter()
            .map(|m| m.status)
            .reduce(VariableStatus::worst)
            .unwrap_or(VariableStatus::Waiting);

        let converter = variable
            .udt_type_name
            .as_deref()
            .and_then(|name| self.registry.get_converter(name));
        let Some(converter) = converter else {
            return out;
        };

        if !out.status.is_good() {
            tracing::debug!(
                variable = %variable.display_name,
                status = %out.status,
                "Members not all good, custom UDT value left unset"
            );
            return out;
        }
        match converter.from_members(&out.struct_members) {
            Ok(custom) => {
                out.system_type = Some(ValueKind::Custom(custom.type_name().to_string()));
                out.value = Some(S7Value::Custom(custom));
            }
            Err(e) => {
                S7Error::from(e).log(&format!("projecting UDT '{}'", variable.display_name));
                out.status = VariableStatus::Read(StatusCode::BAD_TYPE_MISMATCH);
            }
        }
        out
    }
}
