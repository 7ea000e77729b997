//! Chunk reader for the textual JSON-graph encoding.
//!
//! Pulls entries from an archive source, enforces the per-entry size budget
//! on the way in, parses each entry envelope and routes the recovered nodes
//! into per-kind groups. Entries whose names do not carry the data extension
//! are skipped, so ancillary files in the same container are tolerated.

use crate::archive::{self, EntrySource, SourceEntry};
use crate::chunk::Chunk;
use crate::error::BdioError;
use crate::metadata::Metadata;
use crate::node::{self, Node};
use crate::options::DocumentOptions;
use crate::validate::{enforce, NoopValidator, Validator};
use serde_json::Value;
use tracing::{debug, trace};

/// Reads size-bounded archive entries back into node chunks.
pub struct ChunkReader<S: EntrySource, V: Validator> {
    source: S,
    validator: V,
    options: DocumentOptions,
    metadata: Option<Metadata>,
}

impl<S: EntrySource> ChunkReader<S, NoopValidator> {
    /// A reader that performs no validation.
    pub fn new(source: S) -> Self {
        ChunkReader::with_validator(source, NoopValidator)
    }
}

impl<S: EntrySource, V: Validator> ChunkReader<S, V> {
    pub fn with_validator(source: S, validator: V) -> Self {
        ChunkReader {
            source,
            validator,
            options: DocumentOptions::default(),
            metadata: None,
        }
    }

    pub fn with_options(mut self, options: DocumentOptions) -> Self {
        self.options = options;
        self
    }

    /// The metadata accumulated from every envelope read so far.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Reads the header entry. The header carries only metadata; a header
    /// with graph data is malformed.
    pub fn read_header(&mut self) -> Result<Metadata, BdioError> {
        let entry = self
            .next_data_entry()?
            .ok_or_else(|| BdioError::FramingSyntax("document has no header entry".to_string()))?;
        let name = entry.name.clone();
        let bytes = archive::read_bounded(entry, self.options.max_entry_size)?;
        let (metadata, graph) = parse_envelope(&name, &bytes)?;
        if !graph.is_empty() {
            return Err(BdioError::FramingSyntax(format!(
                "header entry {} must not carry graph data",
                name
            )));
        }
        debug!(entry = %name, id = %metadata.id(), "read document header");
        self.merge_metadata(&metadata)?;
        Ok(metadata)
    }

    /// Reads the next data entry as a chunk, or `None` once the archive is
    /// exhausted. Every node is validated before it is routed.
    pub fn read_chunk(&mut self) -> Result<Option<Chunk>, BdioError> {
        let Some(entry) = self.next_data_entry()? else {
            return Ok(None);
        };
        let name = entry.name.clone();
        let bytes = archive::read_bounded(entry, self.options.max_entry_size)?;
        let (metadata, graph) = parse_envelope(&name, &bytes)?;
        self.merge_metadata(&metadata)?;

        let mut chunk = Chunk::new();
        for value in &graph {
            let node = Node::from_value(value)?;
            enforce(&self.validator, &node)?;
            chunk.push(node);
        }
        debug!(entry = %name, nodes = chunk.len(), "read data entry");
        Ok(Some(chunk))
    }

    fn next_data_entry(&mut self) -> Result<Option<SourceEntry>, BdioError> {
        loop {
            let Some(entry) = self.source.next_entry()? else {
                return Ok(None);
            };
            if archive::is_data_entry_name(&entry.name, &self.options.data_extension) {
                return Ok(Some(entry));
            }
            trace!(entry = %entry.name, "skipping non-data entry");
        }
    }

    fn merge_metadata(&mut self, incoming: &Metadata) -> Result<(), BdioError> {
        match &mut self.metadata {
            Some(existing) => existing.merge(incoming),
            None => {
                self.metadata = Some(incoming.clone());
                Ok(())
            }
        }
    }
}

/// Splits an entry envelope into its metadata fields and graph node list.
pub(crate) fn parse_envelope(name: &str, bytes: &[u8]) -> Result<(Metadata, Vec<Value>), BdioError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let fields = value.as_object().ok_or_else(|| {
        BdioError::FramingSyntax(format!("entry {} is not a JSON object", name))
    })?;
    let metadata = Metadata::from_envelope(fields)?;
    let graph = fields
        .get(node::GRAPH)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            BdioError::FramingSyntax(format!("entry {} is missing its @graph list", name))
        })?;
    Ok((metadata, graph.clone()))
}
