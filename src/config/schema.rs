//! Declarative default tree for the compile configuration
//!
//! The bundled `assets/configuration.json` follows the editor-extension
//! `contributes.configuration` layout: nested `object`/`array` nodes with
//! typed leaves carrying a `default`. Walking it yields the initial
//! configuration handed to the bridge.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::AdvplError;

/// Namespace prefix stripped from every schema key
pub const NAMESPACE_PREFIX: &str = "advpl.";

const BUNDLED_SCHEMA: &str = include_str!("../../assets/configuration.json");

/// A node of the configuration schema
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawNode")]
pub enum SchemaNode {
    /// Mapping of property name to node, in declaration order
    Object(Vec<(String, SchemaNode)>),
    /// Sequence whose default is a single item
    Array(Box<SchemaNode>),
    /// Typed leaf with its default value
    Leaf(Value),
}

/// Wire shape of a schema node before validation
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
    items: Option<Box<RawNode>>,
    default: Option<Value>,
}

impl TryFrom<RawNode> for SchemaNode {
    type Error = String;

    fn try_from(raw: RawNode) -> Result<Self, Self::Error> {
        match raw.kind.as_deref() {
            Some("object") => {
                let mut properties = Vec::with_capacity(raw.properties.len());
                for (key, value) in raw.properties {
                    let node: SchemaNode = serde_json::from_value(value)
                        .map_err(|e| format!("property '{}': {}", key, e))?;
                    properties.push((key, node));
                }
                Ok(SchemaNode::Object(properties))
            }
            Some("array") => {
                let items = raw
                    .items
                    .ok_or_else(|| "array node without 'items'".to_string())?;
                Ok(SchemaNode::Array(Box::new(SchemaNode::try_from(*items)?)))
            }
            Some("string") | Some("number") | Some("integer") | Some("boolean") | Some("null")
            | None => Ok(SchemaNode::Leaf(raw.default.unwrap_or(Value::Null))),
            Some(other) => Err(format!("unsupported schema type '{}'", other)),
        }
    }
}

impl SchemaNode {
    /// Expand this node into its default value
    pub fn defaults(&self) -> Value {
        match self {
            SchemaNode::Object(properties) => {
                let mut object = Map::new();
                for (key, node) in properties {
                    let key = key.strip_prefix(NAMESPACE_PREFIX).unwrap_or(key);
                    object.insert(key.to_string(), node.defaults());
                }
                Value::Object(object)
            }
            SchemaNode::Array(items) => Value::Array(vec![items.defaults()]),
            SchemaNode::Leaf(default) => default.clone(),
        }
    }
}

/// The configuration schema
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: SchemaNode,
}

impl Schema {
    /// Parse a schema from JSON text; the root must be an object node
    pub fn from_json(text: &str) -> Result<Self, AdvplError> {
        let root: SchemaNode = serde_json::from_str(text)
            .map_err(|e| AdvplError::config_error_with_source("Invalid configuration schema", e))?;

        if !matches!(root, SchemaNode::Object(_)) {
            return Err(AdvplError::config_error(
                "Configuration schema root must be an object",
            ));
        }

        Ok(Self { root })
    }

    /// Schema compiled into the binary
    pub fn bundled() -> Result<Self, AdvplError> {
        Self::from_json(BUNDLED_SCHEMA)
    }

    /// Default configuration mapping described by the schema
    pub fn defaults(&self) -> Map<String, Value> {
        match self.root.defaults() {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
