// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The discovered PLC structure and its path index.

use std::collections::BTreeMap;

use crate::access::join_path;
use crate::model::{
    GlobalDataBlock, InstanceDataBlock, InstanceDbSection, Node, StructureElement, Variable,
};

/// All discovered roots of one PLC.
///
/// Variables are addressed by dotted paths made of the display names from
/// the root down, e.g. `Db1.Motor.Speed` or `Fb1_DB.Static.Counter`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlcStructure {
    roots: Vec<Node>,
}

impl PlcStructure {
    /// Wraps discovered roots.
    pub fn new(roots: Vec<Node>) -> Self {
        Self { roots }
    }

    /// Returns all roots in discovery order.
    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    /// Consumes the structure and returns its roots.
    pub fn into_roots(self) -> Vec<Node> {
        self.roots
    }

    /// Global data blocks.
    pub fn global_data_blocks(&self) -> impl Iterator<Item = &GlobalDataBlock> {
        self.roots.iter().filter_map(|n| match n {
            Node::GlobalDataBlock(db) => Some(db),
            _ => None,
        })
    }

    /// Instance data blocks.
    pub fn instance_data_blocks(&self) -> impl Iterator<Item = &InstanceDataBlock> {
        self.roots.iter().filter_map(|n| match n {
            Node::InstanceDataBlock(db) => Some(db),
            _ => None,
        })
    }

    /// Memory areas.
    pub fn areas(&self) -> impl Iterator<Item = &StructureElement> {
        self.roots.iter().filter_map(|n| match n {
            Node::StructureElement(el) => Some(el),
            _ => None,
        })
    }

    /// Finds a root by display name.
    pub fn root(&self, name: &str) -> Option<&Node> {
        self.roots.iter().find(|n| n.display_name() == name)
    }

    /// Finds a variable by dotted path.
    pub fn find_variable(&self, path: &str) -> Option<&Variable> {
        let mut found = None;
        self.walk(&mut |candidate, variable| {
            if found.is_none() && candidate == path {
                found = Some(variable);
            }
        });
        found
    }

    /// Indexes every variable, members included, by dotted path.
    pub fn variables_by_path(&self) -> BTreeMap<String, &Variable> {
        let mut index = BTreeMap::new();
        self.walk(&mut |path, variable| {
            index.entry(path.to_string()).or_insert(variable);
        });
        index
    }

    /// Number of variables, members included.
    pub fn variable_count(&self) -> usize {
        let mut count = 0;
        for root in &self.roots {
            root.visit_variables(&mut |_| count += 1);
        }
        count
    }

    fn walk<'a>(&'a self, visitor: &mut dyn FnMut(&str, &'a Variable)) {
        for root in &self.roots {
            walk_node(root, "", visitor);
        }
    }
}

impl From<Vec<Node>> for PlcStructure {
    fn from(roots: Vec<Node>) -> Self {
        Self::new(roots)
    }
}

fn walk_node<'a>(node: &'a Node, parent: &str, visitor: &mut dyn FnMut(&str, &'a Variable)) {
    match node {
        Node::GlobalDataBlock(db) => {
            walk_variables(&db.variables, &join_path(parent, &db.display_name), visitor)
        }
        Node::StructureElement(el) => {
            walk_variables(&el.variables, &join_path(parent, &el.display_name), visitor)
        }
        Node::InstanceDataBlock(db) => walk_instance(db, parent, visitor),
        Node::InstanceDbSection(section) => walk_section(section, parent, visitor),
        Node::Variable(variable) => walk_variables(std::slice::from_ref(variable), parent, visitor),
    }
}

fn walk_instance<'a>(
    db: &'a InstanceDataBlock,
    parent: &str,
    visitor: &mut dyn FnMut(&str, &'a Variable),
) {
    let path = join_path(parent, &db.display_name);
    for section in db.sections() {
        walk_section(section, &path, visitor);
    }
}

fn walk_section<'a>(
    section: &'a InstanceDbSection,
    parent: &str,
    visitor: &mut dyn FnMut(&str, &'a Variable),
) {
    let path = join_path(parent, &section.display_name);
    walk_variables(&section.variables, &path, visitor);
    for nested in &section.nested_instances {
        walk_instance(nested, &path, visitor);
    }
}

fn walk_variables<'a>(
    variables: &'a [Variable],
    parent: &str,
    visitor: &mut dyn FnMut(&str, &'a Variable),
) {
    for variable in variables {
        let path = join_path(parent, &variable.display_name);
        visitor(&path, variable);
        walk_variables(&variable.struct_members, &path, visitor);
    }
}
