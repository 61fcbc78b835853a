// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! PLC object model.
//!
//! Discovery produces a tree of [`Node`]s; a read pass returns a new tree of
//! the same shape with values, statuses and full paths filled in. Nodes are
//! plain values and are never updated in place.
//!
//! ```text
//! Node
//! ├── GlobalDataBlock    variables
//! ├── InstanceDataBlock  inputs / outputs / in_outs / static_ sections
//! ├── InstanceDbSection  variables + nested_instances
//! ├── StructureElement   variables (Inputs, Outputs, Memory, Timers, Counters)
//! └── Variable           scalar, array, or STRUCT/UDT with struct_members
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::session::UaValue;
use crate::data_type::S7DataType;
use crate::types::StatusCode;
use crate::value::{S7Value, ValueKind};

/// Display name of the input section of an instance data block.
pub const SECTION_INPUTS: &str = "Inputs";
/// Display name of the output section of an instance data block.
pub const SECTION_OUTPUTS: &str = "Outputs";
/// Display name of the in/out section of an instance data block.
pub const SECTION_IN_OUTS: &str = "InOuts";
/// Display name of the static section of an instance data block.
pub const SECTION_STATIC: &str = "Static";

// =============================================================================
// Quality / VariableStatus
// =============================================================================

/// Three-state value quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Value is valid.
    Good,
    /// Value may not be accurate.
    Uncertain,
    /// Value is not usable.
    Bad,
}

impl Quality {
    /// Derives the quality from a protocol status code.
    pub fn from_status_code(status: StatusCode) -> Self {
        if status.is_good() {
            Self::Good
        } else if status.is_uncertain() {
            Self::Uncertain
        } else {
            Self::Bad
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => f.write_str("Good"),
            Self::Uncertain => f.write_str("Uncertain"),
            Self::Bad => f.write_str("Bad"),
        }
    }
}

/// Read state of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariableStatus {
    /// Never read, or the last read returned no result for this variable.
    #[default]
    Waiting,
    /// Read completed with the given protocol status.
    Read(StatusCode),
}

impl VariableStatus {
    /// Status of a variable whose node id could not be parsed.
    pub const BAD_NODE_ID: Self = Self::Read(StatusCode::BAD_NODE_ID_INVALID);

    /// Returns the quality, `None` while waiting.
    pub fn quality(&self) -> Option<Quality> {
        match self {
            Self::Waiting => None,
            Self::Read(code) => Some(Quality::from_status_code(*code)),
        }
    }

    /// Returns the raw status code, `None` while waiting.
    pub fn code(&self) -> Option<StatusCode> {
        match self {
            Self::Waiting => None,
            Self::Read(code) => Some(*code),
        }
    }

    /// Returns `true` if waiting for a first read.
    #[inline]
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if the last read was good.
    #[inline]
    pub fn is_good(&self) -> bool {
        self.quality() == Some(Quality::Good)
    }

    /// Combines two statuses, keeping the worse one.
    ///
    /// Order from best to worst: Good, Uncertain, Waiting, Bad.
    pub fn worst(self, other: Self) -> Self {
        fn rank(status: &VariableStatus) -> u8 {
            match status.quality() {
                Some(Quality::Good) => 0,
                Some(Quality::Uncertain) => 1,
                None => 2,
                Some(Quality::Bad) => 3,
            }
        }
        if rank(&other) > rank(&self) {
            other
        } else {
            self
        }
    }
}

impl fmt::Display for VariableStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => f.write_str("Waiting"),
            Self::Read(code) => write!(f, "{} {}", Quality::from_status_code(*code), code),
        }
    }
}

// =============================================================================
// Variable
// =============================================================================

/// A PLC variable: a leaf, an array, or a STRUCT/UDT with members.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Variable {
    /// Node id text, absent for variables that were never bound to a node.
    pub node_id: Option<String>,
    /// Display name.
    pub display_name: String,
    /// PLC data type.
    pub s7_type: S7DataType,
    /// UDT type name, set for UDT variables whose type id is a string.
    pub udt_type_name: Option<String>,
    /// Members of a STRUCT/UDT, empty otherwise.
    pub struct_members: Vec<Variable>,
    /// Element count of an array variable, 0 for scalars or when unknown.
    pub array_length: usize,
    /// Converted value.
    pub value: Option<S7Value>,
    /// Value as read from the wire.
    pub raw_value: Option<UaValue>,
    /// Kind of the converted value.
    pub system_type: Option<ValueKind>,
    /// Dot-separated path, assigned by a read pass.
    pub full_path: Option<String>,
    /// Read state.
    pub status: VariableStatus,
    /// Sampling interval requested for monitoring.
    pub sampling_interval: Duration,
    /// Source timestamp of the last read.
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl Variable {
    /// Creates an unread variable.
    pub fn new(
        node_id: impl Into<String>,
        display_name: impl Into<String>,
        s7_type: S7DataType,
    ) -> Self {
        Self {
            node_id: Some(node_id.into()),
            display_name: display_name.into(),
            s7_type,
            ..Default::default()
        }
    }

    /// Sets the UDT type name.
    pub fn with_udt_type_name(mut self, name: impl Into<String>) -> Self {
        self.udt_type_name = Some(name.into());
        self
    }

    /// Sets the members. Ignored unless the variable is STRUCT or UDT.
    pub fn with_members(mut self, members: Vec<Variable>) -> Self {
        if self.s7_type.is_structured() {
            self.struct_members = members;
        } else if !members.is_empty() {
            tracing::debug!(
                variable = %self.display_name,
                s7_type = %self.s7_type,
                "Ignoring members of non-structured variable"
            );
        }
        self
    }

    /// Sets the sampling interval.
    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Returns `true` for STRUCT and UDT variables.
    #[inline]
    pub fn is_structured(&self) -> bool {
        self.s7_type.is_structured()
    }

    /// Finds a direct member by display name.
    pub fn member(&self, name: &str) -> Option<&Variable> {
        self.struct_members.iter().find(|m| m.display_name == name)
    }

    /// Returns this variable with read results cleared.
    pub fn reset(&self) -> Self {
        Self {
            value: None,
            raw_value: None,
            system_type: None,
            full_path: None,
            status: VariableStatus::Waiting,
            source_timestamp: None,
            struct_members: self.struct_members.iter().map(Variable::reset).collect(),
            ..self.clone()
        }
    }
}

// =============================================================================
// Containers
// =============================================================================

/// A global data block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobalDataBlock {
    /// Node id text.
    pub node_id: String,
    /// Display name.
    pub display_name: String,
    /// Top-level variables.
    pub variables: Vec<Variable>,
}

impl GlobalDataBlock {
    /// Creates an undiscovered shell.
    pub fn shell(node_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            display_name: display_name.into(),
            variables: Vec::new(),
        }
    }
}

/// A memory area: Inputs, Outputs, Memory, Timers or Counters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureElement {
    /// Node id text.
    pub node_id: String,
    /// Display name.
    pub display_name: String,
    /// Variables of the area.
    pub variables: Vec<Variable>,
}

impl StructureElement {
    /// Creates an undiscovered shell.
    pub fn shell(node_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            display_name: display_name.into(),
            variables: Vec::new(),
        }
    }
}

/// One section of an instance data block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstanceDbSection {
    /// Node id text.
    pub node_id: String,
    /// Display name.
    pub display_name: String,
    /// Variables of the section.
    pub variables: Vec<Variable>,
    /// Multi-instances declared in the section.
    pub nested_instances: Vec<InstanceDataBlock>,
}

impl InstanceDbSection {
    /// Creates an undiscovered shell.
    pub fn shell(node_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }
}

/// An instance data block of a function block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstanceDataBlock {
    /// Node id text.
    pub node_id: String,
    /// Display name.
    pub display_name: String,
    /// Input parameters.
    pub inputs: Option<InstanceDbSection>,
    /// Output parameters.
    pub outputs: Option<InstanceDbSection>,
    /// In/out parameters.
    pub in_outs: Option<InstanceDbSection>,
    /// Static variables.
    pub static_: Option<InstanceDbSection>,
}

impl InstanceDataBlock {
    /// Creates an undiscovered shell.
    pub fn shell(node_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    /// Iterates over the present sections in declaration order.
    pub fn sections(&self) -> impl Iterator<Item = &InstanceDbSection> {
        [&self.inputs, &self.outputs, &self.in_outs, &self.static_]
            .into_iter()
            .flatten()
    }

    /// Stores a section by its display name. Returns `false` if the name is
    /// not one of the four canonical sections.
    pub fn assign_section(&mut self, section: InstanceDbSection) -> bool {
        let slot = match section.display_name.as_str() {
            SECTION_INPUTS => &mut self.inputs,
            SECTION_OUTPUTS => &mut self.outputs,
            SECTION_IN_OUTS => &mut self.in_outs,
            SECTION_STATIC => &mut self.static_,
            _ => return false,
        };
        *slot = Some(section);
        true
    }
}

// =============================================================================
// Node
// =============================================================================

/// Any element of the PLC tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Global data block.
    GlobalDataBlock(GlobalDataBlock),
    /// Instance data block.
    InstanceDataBlock(InstanceDataBlock),
    /// Section of an instance data block.
    InstanceDbSection(InstanceDbSection),
    /// Memory area.
    StructureElement(StructureElement),
    /// Variable.
    Variable(Variable),
}

impl Node {
    /// Returns the display name.
    pub fn display_name(&self) -> &str {
        match self {
            Self::GlobalDataBlock(n) => &n.display_name,
            Self::InstanceDataBlock(n) => &n.display_name,
            Self::InstanceDbSection(n) => &n.display_name,
            Self::StructureElement(n) => &n.display_name,
            Self::Variable(n) => &n.display_name,
        }
    }

    /// Returns the node id text.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::GlobalDataBlock(n) => Some(&n.node_id),
            Self::InstanceDataBlock(n) => Some(&n.node_id),
            Self::InstanceDbSection(n) => Some(&n.node_id),
            Self::StructureElement(n) => Some(&n.node_id),
            Self::Variable(n) => n.node_id.as_deref(),
        }
    }

    /// Returns the variable kind name, for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::GlobalDataBlock(_) => "GlobalDataBlock",
            Self::InstanceDataBlock(_) => "InstanceDataBlock",
            Self::InstanceDbSection(_) => "InstanceDbSection",
            Self::StructureElement(_) => "StructureElement",
            Self::Variable(_) => "Variable",
        }
    }

    /// Visits every variable in the tree, members included, depth first.
    pub fn visit_variables<'a>(&'a self, visitor: &mut dyn FnMut(&'a Variable)) {
        fn walk_variable<'a>(variable: &'a Variable, visitor: &mut dyn FnMut(&'a Variable)) {
            visitor(variable);
            for member in &variable.struct_members {
                walk_variable(member, visitor);
            }
        }

        fn walk_instance<'a>(db: &'a InstanceDataBlock, visitor: &mut dyn FnMut(&'a Variable)) {
            for section in db.sections() {
                walk_section(section, visitor);
            }
        }

        fn walk_section<'a>(section: &'a InstanceDbSection, visitor: &mut dyn FnMut(&'a Variable)) {
            for variable in &section.variables {
                walk_variable(variable, visitor);
            }
            for nested in &section.nested_instances {
                walk_instance(nested, visitor);
            }
        }

        match self {
            Self::GlobalDataBlock(db) => {
                for variable in &db.variables {
                    walk_variable(variable, visitor);
                }
            }
            Self::StructureElement(el) => {
                for variable in &el.variables {
                    walk_variable(variable, visitor);
                }
            }
            Self::InstanceDbSection(section) => walk_section(section, visitor),
            Self::InstanceDataBlock(db) => walk_instance(db, visitor),
            Self::Variable(v) => walk_variable(v, visitor),
        }
    }
}

impl From<GlobalDataBlock> for Node {
    fn from(value: GlobalDataBlock) -> Self {
        Self::GlobalDataBlock(value)
    }
}

impl From<InstanceDataBlock> for Node {
    fn from(value: InstanceDataBlock) -> Self {
        Self::InstanceDataBlock(value)
    }
}

impl From<InstanceDbSection> for Node {
    fn from(value: InstanceDbSection) -> Self {
        Self::InstanceDbSection(value)
    }
}

impl From<StructureElement> for Node {
    fn from(value: StructureElement) -> Self {
        Self::StructureElement(value)
    }
}

impl From<Variable> for Node {
    fn from(value: Variable) -> Self {
        Self::Variable(value)
    }
}

// =============================================================================
// UDT definitions
// =============================================================================

/// One member of a UDT layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdtMemberDefinition {
    /// Member name.
    pub name: String,
    /// Member type.
    pub s7_type: S7DataType,
    /// Type name of a nested UDT member.
    pub udt_type_name: Option<String>,
    /// Byte offset inside the UDT, accumulated from preceding member sizes.
    pub offset: usize,
    /// Element count for arrays, 0 for scalars.
    pub array_length: usize,
    /// Size in bytes, 0 if unknown.
    pub size_in_bytes: usize,
}

/// Layout of a user-defined type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdtDefinition {
    /// UDT type name.
    pub name: String,
    /// Members in declaration order; empty for a placeholder.
    pub members: Vec<UdtMemberDefinition>,
    /// Total size in bytes, 0 if unknown.
    pub size_in_bytes: usize,
    /// When the definition was first seen.
    pub discovered_at: DateTime<Utc>,
    /// Node id of the DataType node.
    pub data_type_node_id: Option<String>,
}

impl UdtDefinition {
    /// Creates a definition without members.
    pub fn placeholder(name: impl Into<String>, data_type_node_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            size_in_bytes: 0,
            discovered_at: Utc::now(),
            data_type_node_id,
        }
    }

    /// Returns `true` while no members are known.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.members.is_empty()
    }

    /// Builds member definitions from discovered member variables.
    pub fn with_members_from(mut self, members: &[Variable]) -> Self {
        let mut offset = 0;
        self.members = members
            .iter()
            .map(|member| {
                let size = match member.s7_type.element_type() {
                    Some(element) => element.size_in_bytes() * member.array_length,
                    None => member.s7_type.size_in_bytes(),
                };
                let definition = UdtMemberDefinition {
                    name: member.display_name.clone(),
                    s7_type: member.s7_type,
                    udt_type_name: member.udt_type_name.clone(),
                    offset,
                    array_length: member.array_length,
                    size_in_bytes: size,
                };
                offset += size;
                definition
            })
            .collect();
        self.size_in_bytes = offset;
        self
    }
}
