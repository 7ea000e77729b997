//! Compact binary encoding.
//!
//! The binary form replaces JSON entry envelopes with self-delimiting
//! records: a fixed eight byte record header (tag, schema version, payload
//! length, all big-endian) followed by a bincode payload. Record zero of the
//! header entry carries the document metadata; every other record is one
//! graph node. Entries use the same archive layout and the same size budget
//! as the textual encoding.

pub mod reader;
pub mod writer;

pub use reader::BinaryChunkReader;
pub use writer::BinaryChunkWriter;

use crate::error::BdioError;
use crate::metadata::{Creator, Metadata, Product};
use crate::node::{Node, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::io::Read;

/// Schema version written into every record header.
pub const FORMAT_VERSION: u16 = 1;

/// Byte length of an encoded record header.
pub(crate) const RECORD_HEADER_LEN: usize = 8;

/// Record discriminator. Tag zero is the document metadata record; the rest
/// map one-to-one onto node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTag {
    Header,
    Project,
    Component,
    File,
    Container,
    ContainerLayer,
    Dependency,
    Annotation,
    BdbaFile,
}

impl RecordTag {
    pub fn as_u16(self) -> u16 {
        match self {
            RecordTag::Header => 0,
            RecordTag::Project => 1,
            RecordTag::Component => 2,
            RecordTag::File => 3,
            RecordTag::Container => 4,
            RecordTag::ContainerLayer => 5,
            RecordTag::Dependency => 6,
            RecordTag::Annotation => 7,
            RecordTag::BdbaFile => 8,
        }
    }

    pub fn from_u16(raw: u16) -> Option<RecordTag> {
        match raw {
            0 => Some(RecordTag::Header),
            1 => Some(RecordTag::Project),
            2 => Some(RecordTag::Component),
            3 => Some(RecordTag::File),
            4 => Some(RecordTag::Container),
            5 => Some(RecordTag::ContainerLayer),
            6 => Some(RecordTag::Dependency),
            7 => Some(RecordTag::Annotation),
            8 => Some(RecordTag::BdbaFile),
            _ => None,
        }
    }

    pub fn for_kind(kind: NodeKind) -> RecordTag {
        match kind {
            NodeKind::Project => RecordTag::Project,
            NodeKind::Component => RecordTag::Component,
            NodeKind::File => RecordTag::File,
            NodeKind::Container => RecordTag::Container,
            NodeKind::ContainerLayer => RecordTag::ContainerLayer,
            NodeKind::Dependency => RecordTag::Dependency,
            NodeKind::Annotation => RecordTag::Annotation,
            NodeKind::BdbaFile => RecordTag::BdbaFile,
        }
    }

    /// The node kind carried by this record, or `None` for the metadata tag.
    pub fn kind(self) -> Option<NodeKind> {
        match self {
            RecordTag::Header => None,
            RecordTag::Project => Some(NodeKind::Project),
            RecordTag::Component => Some(NodeKind::Component),
            RecordTag::File => Some(NodeKind::File),
            RecordTag::Container => Some(NodeKind::Container),
            RecordTag::ContainerLayer => Some(NodeKind::ContainerLayer),
            RecordTag::Dependency => Some(NodeKind::Dependency),
            RecordTag::Annotation => Some(NodeKind::Annotation),
            RecordTag::BdbaFile => Some(NodeKind::BdbaFile),
        }
    }
}

/// The fixed prefix of every record: tag, version and payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub tag: RecordTag,
    pub version: u16,
    pub length: u32,
}

impl RecordHeader {
    pub fn new(tag: RecordTag, length: u32) -> Self {
        RecordHeader {
            tag,
            version: FORMAT_VERSION,
            length,
        }
    }

    pub fn encode(&self) -> [u8; RECORD_HEADER_LEN] {
        let mut buf = [0u8; RECORD_HEADER_LEN];
        buf[0..2].copy_from_slice(&self.tag.as_u16().to_be_bytes());
        buf[2..4].copy_from_slice(&self.version.to_be_bytes());
        buf[4..8].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Reads the next record header. A clean end of input yields `None`; an
    /// end of input mid-header, an unknown tag or an unsupported version is
    /// malformed.
    pub fn read<R: Read>(reader: &mut R) -> Result<Option<RecordHeader>, BdioError> {
        let mut buf = [0u8; RECORD_HEADER_LEN];
        let mut filled = 0;
        while filled < buf.len() {
            let n = reader.read(&mut buf[filled..])?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(BdioError::FramingSyntax(
                    "truncated record header".to_string(),
                ));
            }
            filled += n;
        }

        let raw_tag = u16::from_be_bytes([buf[0], buf[1]]);
        let tag = RecordTag::from_u16(raw_tag).ok_or_else(|| {
            BdioError::FramingSyntax(format!("unknown record tag: {}", raw_tag))
        })?;
        let version = u16::from_be_bytes([buf[2], buf[3]]);
        if version != FORMAT_VERSION {
            return Err(BdioError::FramingSyntax(format!(
                "unsupported record version: {}",
                version
            )));
        }
        let length = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        Ok(Some(RecordHeader {
            tag,
            version,
            length,
        }))
    }
}

/// A property value in the binary schema.
///
/// The textual encoding leans on arbitrary JSON, but bincode is not
/// self-describing, so the binary form needs a closed sum type with explicit
/// discriminants for every value shape a property can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    Sequence(Vec<PropertyValue>),
    Mapping(Vec<(String, PropertyValue)>),
}

impl PropertyValue {
    pub fn from_json(value: &Value) -> PropertyValue {
        match value {
            Value::Null => PropertyValue::Null,
            Value::Bool(b) => PropertyValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropertyValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    PropertyValue::Unsigned(u)
                } else {
                    PropertyValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => PropertyValue::Text(s.clone()),
            Value::Array(items) => {
                PropertyValue::Sequence(items.iter().map(PropertyValue::from_json).collect())
            }
            Value::Object(map) => PropertyValue::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn into_json(self) -> Value {
        match self {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(b),
            PropertyValue::Integer(i) => Value::Number(Number::from(i)),
            PropertyValue::Unsigned(u) => Value::Number(Number::from(u)),
            PropertyValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            PropertyValue::Text(s) => Value::String(s),
            PropertyValue::Sequence(items) => {
                Value::Array(items.into_iter().map(PropertyValue::into_json).collect())
            }
            PropertyValue::Mapping(pairs) => {
                let mut map = Map::new();
                for (key, value) in pairs {
                    map.insert(key, value.into_json());
                }
                Value::Object(map)
            }
        }
    }
}

/// Payload of a node record. The kind lives in the record tag, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct NodeRecord {
    pub id: String,
    pub properties: Vec<(String, PropertyValue)>,
}

impl NodeRecord {
    pub fn from_node(node: &Node) -> NodeRecord {
        NodeRecord {
            id: node.id.clone(),
            properties: node
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
                .collect(),
        }
    }

    pub fn into_node(self, kind: NodeKind) -> Node {
        let mut properties = Map::new();
        for (key, value) in self.properties {
            properties.insert(key, value.into_json());
        }
        Node {
            id: self.id,
            kind,
            properties,
        }
    }
}

/// Payload of the document metadata record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct HeaderRecord {
    pub id: String,
    pub creation: Option<DateTime<Utc>>,
    pub creator: Option<Creator>,
    pub publishers: Vec<Product>,
    pub extensions: Vec<(String, PropertyValue)>,
}

impl HeaderRecord {
    pub fn from_metadata(metadata: &Metadata) -> HeaderRecord {
        HeaderRecord {
            id: metadata.id().to_string(),
            creation: metadata.creation,
            creator: metadata.creator.clone(),
            publishers: metadata.publishers.clone(),
            extensions: metadata
                .extensions
                .iter()
                .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
                .collect(),
        }
    }

    pub fn into_metadata(self) -> Metadata {
        let mut metadata = Metadata::new(self.id);
        metadata.creation = self.creation;
        metadata.creator = self.creator;
        metadata.publishers = self.publishers;
        for (key, value) in self.extensions {
            metadata.set_extension(key, value.into_json());
        }
        metadata
    }
}
