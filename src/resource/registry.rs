//! Resource Registry - Load resource definitions from JSON
//!
//! Every [`ResourceKind`] has one definition in the embedded JSON: where it
//! lives on the API, how it is listed, whether it can be edited, and which
//! columns the table shows. The `editable` flag is the single switch for both
//! the edit action and the edit modal.

use super::model::ResourceKind;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded resource JSON (compiled into the binary)
const RESOURCE_FILE: &str = include_str!("../resources/resources.json");

/// Color definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColorDef {
    pub value: String,
    pub color: [u8; 3],
}

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
    pub width: u16,
    #[serde(default)]
    pub color_map: Option<String>,
}

/// Toast texts for successful mutations
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDefs {
    pub created: String,
    #[serde(default)]
    pub updated: Option<String>,
    pub deleted: String,
}

fn default_true() -> bool {
    true
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    /// Path segment under `/api/v1/`
    pub path: String,
    /// Where the record array sits in a list response ("" = the body itself)
    pub response_path: String,
    /// Whether the list endpoint honours `skip`/`limit`
    #[serde(default)]
    pub server_paginated: bool,
    #[serde(default = "default_true")]
    pub editable: bool,
    pub name_field: String,
    pub columns: Vec<ColumnDef>,
    pub messages: MessageDefs,
}

/// Root structure of resources.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub color_maps: HashMap<String, Vec<ColorDef>>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let config: ResourceConfig = serde_json::from_str(RESOURCE_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));

        for kind in ResourceKind::ALL {
            if !config.resources.contains_key(kind.key()) {
                panic!("Embedded resource JSON has no entry for '{}'", kind.key());
            }
        }

        config
    })
}

/// Get the definition of a resource kind
pub fn get_resource(kind: ResourceKind) -> &'static ResourceDef {
    &get_registry().resources[kind.key()]
}

/// Whether records of this kind can be edited
pub fn is_editable(kind: ResourceKind) -> bool {
    get_resource(kind).editable
}

/// Get all resource keys (for autocomplete)
pub fn get_all_resource_keys() -> Vec<&'static str> {
    ResourceKind::ALL.iter().map(|kind| kind.key()).collect()
}

/// Get a color map by name
pub fn get_color_map(name: &str) -> Option<&'static Vec<ColorDef>> {
    get_registry().color_maps.get(name)
}

/// Get color for a value based on color map name
pub fn get_color_for_value(color_map_name: &str, value: &str) -> Option<[u8; 3]> {
    get_color_map(color_map_name)?
        .iter()
        .find(|c| c.value == value)
        .map(|c| c.color)
}
