//! Graph nodes.
//!
//! A node is one typed, identified unit of graph data. The core does not
//! interpret kind-specific properties; it only needs a stable identifier, a
//! discriminator and an estimable attribute bag.

use crate::error::BdioError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-LD style identifier key used in entry envelopes and node records.
pub(crate) const ID: &str = "@id";

/// Discriminator key of a node record.
pub(crate) const TYPE: &str = "@type";

/// Key holding the node list of an entry envelope.
pub(crate) const GRAPH: &str = "@graph";

/// The kind of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Project,
    Component,
    File,
    Container,
    ContainerLayer,
    Dependency,
    Annotation,
    BdbaFile,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Project,
        NodeKind::Component,
        NodeKind::File,
        NodeKind::Container,
        NodeKind::ContainerLayer,
        NodeKind::Dependency,
        NodeKind::Annotation,
        NodeKind::BdbaFile,
    ];

    /// The type name written to the `@type` field.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Project => "Project",
            NodeKind::Component => "Component",
            NodeKind::File => "File",
            NodeKind::Container => "Container",
            NodeKind::ContainerLayer => "ContainerLayer",
            NodeKind::Dependency => "Dependency",
            NodeKind::Annotation => "Annotation",
            NodeKind::BdbaFile => "BdbaFile",
        }
    }

    /// Parses a `@type` value back into a kind.
    pub fn from_type_name(name: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|k| k.type_name() == name)
    }
}

/// One typed, identified unit of graph data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub properties: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            id: id.into(),
            kind,
            properties: Map::new(),
        }
    }

    /// Builder-style property assignment.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// The textual record form: `{"@id": ..., "@type": ..., <properties>}`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(ID.to_string(), Value::String(self.id.clone()));
        map.insert(TYPE.to_string(), Value::String(self.kind.type_name().to_string()));
        for (key, value) in &self.properties {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }

    /// Parses a textual node record. A record that is not an object, or that
    /// is missing its identifier or carries an unknown type, is malformed.
    pub fn from_value(value: &Value) -> Result<Node, BdioError> {
        let map = value
            .as_object()
            .ok_or_else(|| BdioError::FramingSyntax("node record must be an object".to_string()))?;

        let id = map
            .get(ID)
            .and_then(Value::as_str)
            .ok_or_else(|| BdioError::FramingSyntax("node record missing @id".to_string()))?;

        let type_name = map
            .get(TYPE)
            .and_then(Value::as_str)
            .ok_or_else(|| BdioError::FramingSyntax("node record missing @type".to_string()))?;

        let kind = NodeKind::from_type_name(type_name).ok_or_else(|| {
            BdioError::FramingSyntax(format!("unknown node type: {}", type_name))
        })?;

        let mut properties = Map::new();
        for (key, item) in map {
            if key != ID && key != TYPE {
                properties.insert(key.clone(), item.clone());
            }
        }

        Ok(Node {
            id: id.to_string(),
            kind,
            properties,
        })
    }
}
