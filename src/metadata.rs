//! Document metadata.
//!
//! A document carries exactly one effective identifier plus descriptive
//! fields (creation time, creator, producer chain) written once and
//! referenced by every entry's framing. Legacy formats may spread metadata
//! across records, so partial fragments can be merged; an incompatible
//! identifier in a non-fragment form is a hard error.

use crate::error::BdioError;
use crate::node;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Envelope field holding the creation timestamp.
const CREATION: &str = "creationDateTime";

/// Envelope field holding the creator as a `user@host` pair.
const CREATOR: &str = "creator";

/// Envelope field holding the producer chain as a user-agent style string.
const PUBLISHER: &str = "publisher";

/// One element of the producer/publisher chain, rendered user-agent style as
/// `name/version (comment)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub version: Option<String>,
    pub comment: Option<String>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Product {
            name: name.into(),
            version: None,
            comment: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Parses a user-agent style product chain, e.g.
    /// `scanner/1.2.0 (linux amd64) bdio/0.1.0`.
    pub fn parse_chain(input: &str) -> Vec<Product> {
        let mut products: Vec<Product> = Vec::new();
        let mut rest = input.trim();
        while !rest.is_empty() {
            if let Some(stripped) = rest.strip_prefix('(') {
                // Comment attaches to the preceding product
                let end = stripped.find(')').unwrap_or(stripped.len());
                if let Some(last) = products.last_mut() {
                    last.comment = Some(stripped[..end].to_string());
                }
                rest = stripped[end..].trim_start_matches(')').trim_start();
            } else {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                let token = &rest[..end];
                let product = match token.split_once('/') {
                    Some((name, version)) => Product::new(name).with_version(version),
                    None => Product::new(token),
                };
                products.push(product);
                rest = rest[end..].trim_start();
            }
        }
        products
    }

    /// Renders a chain back to its user-agent style string.
    pub fn chain_to_string(products: &[Product]) -> String {
        products
            .iter()
            .map(Product::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(version) = &self.version {
            write!(f, "/{}", version)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " ({})", comment)?;
        }
        Ok(())
    }
}

/// The user/host pair describing who produced a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub user: Option<String>,
    pub host: Option<String>,
}

impl Creator {
    /// Parses the `user@host` form; the host portion is prefixed with `@`.
    pub fn parse(input: &str) -> Creator {
        match input.split_once('@') {
            Some((user, host)) => Creator {
                user: (!user.is_empty()).then(|| user.to_string()),
                host: (!host.is_empty()).then(|| host.to_string()),
            },
            None => Creator {
                user: (!input.is_empty()).then(|| input.to_string()),
                host: None,
            },
        }
    }

    /// Combines two creators, preferring whichever side already has a value
    /// for each half.
    fn combine(&mut self, other: &Creator) {
        if self.user.is_none() {
            self.user = other.user.clone();
        }
        if self.host.is_none() {
            self.host = other.host.clone();
        }
    }

    fn is_empty(&self) -> bool {
        self.user.is_none() && self.host.is_none()
    }
}

impl fmt::Display for Creator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}", user)?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{}", host)?;
        }
        Ok(())
    }
}

/// Document-level descriptive record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    id: String,
    pub creation: Option<DateTime<Utc>>,
    pub creator: Option<Creator>,
    pub publishers: Vec<Product>,
    pub extensions: BTreeMap<String, Value>,
}

impl Metadata {
    pub fn new(id: impl Into<String>) -> Self {
        Metadata {
            id: id.into(),
            creation: None,
            creator: None,
            publishers: Vec::new(),
            extensions: BTreeMap::new(),
        }
    }

    /// The stable document identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_creation(&mut self, creation: DateTime<Utc>) {
        self.creation = Some(creation);
    }

    pub fn set_creator(&mut self, creator: Creator) {
        self.creator = Some(creator);
    }

    pub fn add_publisher(&mut self, product: Product) {
        self.publishers.push(product);
    }

    pub fn set_extension(&mut self, key: impl Into<String>, value: Value) {
        self.extensions.insert(key.into(), value);
    }

    /// Merges a partial metadata fragment into this record.
    ///
    /// Identifiers equal up to a `#` fragment delimiter reconcile (the
    /// non-fragment form wins); any other mismatch is fatal. Publisher
    /// chains concatenate skipping duplicates, creator halves combine
    /// preferring existing values, the earliest creation time is kept, and
    /// extension fields merge first-writer-wins.
    pub fn merge(&mut self, other: &Metadata) -> Result<(), BdioError> {
        if self.id.is_empty() {
            self.id = other.id.clone();
        } else if !other.id.is_empty() {
            if base_id(&self.id) != base_id(&other.id) {
                return Err(BdioError::MetadataMismatch {
                    expected: self.id.clone(),
                    actual: other.id.clone(),
                });
            }
            // The non-fragment form wins
            if self.id.contains('#') && !other.id.contains('#') {
                self.id = other.id.clone();
            }
        }

        match (&mut self.creation, other.creation) {
            (Some(existing), Some(incoming)) if incoming < *existing => {
                self.creation = Some(incoming);
            }
            (None, Some(incoming)) => self.creation = Some(incoming),
            _ => {}
        }

        if let Some(incoming) = &other.creator {
            match &mut self.creator {
                Some(existing) => existing.combine(incoming),
                None => self.creator = Some(incoming.clone()),
            }
        }

        for product in &other.publishers {
            if !self.publishers.contains(product) {
                self.publishers.push(product.clone());
            }
        }

        for (key, value) in &other.extensions {
            self.extensions
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        Ok(())
    }

    /// The envelope fields of this metadata, without the `@graph` list.
    pub fn to_envelope_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert(node::ID.to_string(), Value::String(self.id.clone()));
        if let Some(creation) = &self.creation {
            fields.insert(CREATION.to_string(), Value::String(creation.to_rfc3339()));
        }
        if let Some(creator) = &self.creator {
            if !creator.is_empty() {
                fields.insert(CREATOR.to_string(), Value::String(creator.to_string()));
            }
        }
        if !self.publishers.is_empty() {
            fields.insert(
                PUBLISHER.to_string(),
                Value::String(Product::chain_to_string(&self.publishers)),
            );
        }
        for (key, value) in &self.extensions {
            fields.insert(key.clone(), value.clone());
        }
        fields
    }

    /// Extracts metadata from an entry envelope's top-level fields.
    pub fn from_envelope(fields: &Map<String, Value>) -> Result<Metadata, BdioError> {
        let id = fields
            .get(node::ID)
            .and_then(Value::as_str)
            .ok_or_else(|| BdioError::FramingSyntax("entry envelope missing @id".to_string()))?;

        let mut metadata = Metadata::new(id);
        for (key, value) in fields {
            match key.as_str() {
                node::ID | node::GRAPH => {}
                CREATION => {
                    let text = value.as_str().ok_or_else(|| {
                        BdioError::FramingSyntax("creationDateTime must be a string".to_string())
                    })?;
                    let parsed = DateTime::parse_from_rfc3339(text).map_err(|e| {
                        BdioError::FramingSyntax(format!("invalid creationDateTime: {}", e))
                    })?;
                    metadata.creation = Some(parsed.with_timezone(&Utc));
                }
                CREATOR => {
                    if let Some(text) = value.as_str() {
                        metadata.creator = Some(Creator::parse(text));
                    }
                }
                PUBLISHER => {
                    if let Some(text) = value.as_str() {
                        metadata.publishers = Product::parse_chain(text);
                    }
                }
                _ => {
                    metadata.extensions.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(metadata)
    }
}

/// Strips an optional `#fragment` suffix from a document identifier.
pub(crate) fn base_id(id: &str) -> &str {
    match id.find('#') {
        Some(index) => &id[..index],
        None => id,
    }
}
