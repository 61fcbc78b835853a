// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Registry of UDT definitions and custom UDT converters.
//!
//! Both maps are keyed by UDT type name and use `DashMap`, so discovery tasks
//! can register definitions while readers look up converters.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::conversion::{TypedUdtConverter, UdtConverter, UdtConverterAdapter};
use crate::model::{UdtDefinition, Variable};

/// Concurrent registry of UDT definitions and converters.
#[derive(Default)]
pub struct UdtRegistry {
    definitions: DashMap<String, UdtDefinition>,
    converters: DashMap<String, Arc<dyn UdtConverter>>,
}

impl UdtRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    /// Registers a definition, replacing any previous one with the same name.
    pub fn register_definition(&self, definition: UdtDefinition) {
        tracing::debug!(
            udt = %definition.name,
            members = definition.members.len(),
            "Registered UDT definition"
        );
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Registers a placeholder unless a definition already exists.
    ///
    /// Returns `true` if the placeholder was inserted.
    pub fn register_placeholder_if_absent(
        &self,
        name: &str,
        data_type_node_id: Option<String>,
    ) -> bool {
        match self.definitions.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(UdtDefinition::placeholder(name, data_type_node_id));
                tracing::debug!(udt = %name, "Registered UDT placeholder");
                true
            }
        }
    }

    /// Fills a placeholder definition with members derived from discovered
    /// member variables. Definitions that already have members are kept.
    ///
    /// Returns `true` if the definition was enriched.
    pub fn enrich_definition(&self, name: &str, members: &[Variable]) -> bool {
        if members.is_empty() {
            return false;
        }
        match self.definitions.get_mut(name) {
            Some(mut definition) if definition.is_placeholder() => {
                let enriched = definition.clone().with_members_from(members);
                tracing::debug!(
                    udt = %name,
                    members = enriched.members.len(),
                    size = enriched.size_in_bytes,
                    "Enriched UDT definition"
                );
                *definition = enriched;
                true
            }
            _ => false,
        }
    }

    /// Returns a copy of a definition.
    pub fn get_definition(&self, name: &str) -> Option<UdtDefinition> {
        self.definitions.get(name).map(|r| r.value().clone())
    }

    /// Removes a definition.
    pub fn remove_definition(&self, name: &str) -> Option<UdtDefinition> {
        self.definitions.remove(name).map(|(_, d)| d)
    }

    /// Returns all definitions, sorted by name.
    pub fn list_definitions(&self) -> Vec<UdtDefinition> {
        let mut out: Vec<_> = self.definitions.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Returns `true` if a definition exists.
    pub fn contains_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    // =========================================================================
    // Converters
    // =========================================================================

    /// Registers a converter under its own UDT type name.
    pub fn register_converter(&self, converter: Arc<dyn UdtConverter>) {
        let name = converter.udt_type_name().to_string();
        if self.converters.insert(name.clone(), converter).is_some() {
            tracing::info!(udt = %name, "Replaced UDT converter");
        } else {
            tracing::info!(udt = %name, "Registered UDT converter");
        }
    }

    /// Wraps a typed converter and registers it.
    pub fn register_typed<C: TypedUdtConverter>(&self, converter: C) {
        self.register_converter(Arc::new(UdtConverterAdapter::new(converter)));
    }

    /// Returns the converter for a UDT type name.
    pub fn get_converter(&self, name: &str) -> Option<Arc<dyn UdtConverter>> {
        self.converters.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Removes a converter.
    pub fn remove_converter(&self, name: &str) -> Option<Arc<dyn UdtConverter>> {
        self.converters.remove(name).map(|(_, c)| c)
    }

    /// Returns the names of all registered converters, sorted.
    pub fn list_converters(&self) -> Vec<String> {
        let mut names: Vec<_> = self.converters.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Returns `true` if a converter is registered for the name.
    pub fn contains_converter(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// Removes all definitions and converters.
    pub fn clear(&self) {
        self.definitions.clear();
        self.converters.clear();
    }
}

impl std::fmt::Debug for UdtRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdtRegistry")
            .field("definitions", &self.definitions.len())
            .field("converters", &self.converters.len())
            .finish()
    }
}
