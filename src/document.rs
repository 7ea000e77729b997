//! Document assembly.
//!
//! Ties the pieces together for whole-document consumers: sniffing which
//! shape a raw input takes, reading standalone payloads as one-entry
//! documents, and wrapping the chunk reader so metadata fragments accumulate
//! behind a single surface. Legacy shapes are detected here but converted by
//! upstream adapters; the assembler only selects.

use crate::archive::{EntrySink, EntrySource};
use crate::chunk::Chunk;
use crate::error::BdioError;
use crate::estimate;
use crate::metadata::Metadata;
use crate::node::Node;
use crate::options::DocumentOptions;
use crate::reader::{self, ChunkReader};
use crate::validate::{enforce, NoopValidator, Validator};
use crate::writer::ChunkWriter;
use tracing::debug;

/// How many leading bytes the sniffer examines.
pub const SNIFF_LIMIT: usize = 512;

/// The shape of a raw input, decided from a bounded lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// The current entry envelope format.
    Graph,
    /// A legacy bill-of-materials list.
    LegacyBom,
    /// A legacy scan container object.
    LegacyScanContainer,
    /// Blank or whitespace-only input.
    Empty,
}

/// Top-level fields that open a legacy scan container object.
const SCAN_CONTAINER_FIELDS: [&str; 4] =
    ["scanNodeList", "baseDir", "scannerVersion", "signatureVersion"];

/// Decides the shape of an input from its first bytes. The predicates are
/// checked in order and unrecognized input falls back to [`InputShape::Graph`],
/// so sniffing never fails.
pub fn sniff(buf: &[u8]) -> InputShape {
    let prefix = &buf[..buf.len().min(SNIFF_LIMIT)];
    let text = String::from_utf8_lossy(prefix);
    let trimmed = text.trim_start();

    if trimmed.is_empty() {
        return InputShape::Empty;
    }
    if trimmed.starts_with('[') && trimmed.contains("BillOfMaterials") {
        return InputShape::LegacyBom;
    }
    if trimmed.starts_with('{') {
        if let Some(field) = first_field_name(trimmed) {
            if SCAN_CONTAINER_FIELDS.contains(&field) {
                return InputShape::LegacyScanContainer;
            }
        }
    }
    InputShape::Graph
}

/// The first field name of a JSON object prefix. Field names in the formats
/// sniffed here never contain escapes, so a plain quote scan suffices.
fn first_field_name(text: &str) -> Option<&str> {
    let after_brace = text.split_once('{')?.1;
    let after_quote = after_brace.split_once('"')?.1;
    Some(after_quote.split_once('"')?.0)
}

/// Folds metadata fragments into one record, left to right. An incompatible
/// identifier anywhere in the sequence is fatal.
pub fn merge_metadata<I>(fragments: I) -> Result<Option<Metadata>, BdioError>
where
    I: IntoIterator<Item = Metadata>,
{
    let mut merged: Option<Metadata> = None;
    for fragment in fragments {
        match &mut merged {
            Some(existing) => existing.merge(&fragment)?,
            None => merged = Some(fragment),
        }
    }
    Ok(merged)
}

/// Front door for whole-document reads and writes.
#[derive(Debug, Clone, Default)]
pub struct DocumentAssembler {
    options: DocumentOptions,
}

impl DocumentAssembler {
    pub fn new() -> Self {
        DocumentAssembler::default()
    }

    pub fn with_options(mut self, options: DocumentOptions) -> Self {
        self.options = options;
        self
    }

    /// A document reader over an archive source.
    pub fn reader<S: EntrySource>(&self, source: S) -> DocumentReader<S, NoopValidator> {
        DocumentReader {
            inner: ChunkReader::new(source).with_options(self.options.clone()),
            header: None,
        }
    }

    /// A chunk writer over an archive sink. Refuses options that leave no
    /// headroom for nodes once the envelope overhead is paid.
    pub fn writer<S: EntrySink>(
        &self,
        metadata: Metadata,
        sink: S,
    ) -> Result<ChunkWriter<S, NoopValidator>, BdioError> {
        let overhead = estimate::entry_overhead(&metadata);
        if overhead >= self.options.max_entry_size {
            return Err(BdioError::EntrySizeViolation {
                entry_name: None,
                estimated_size: overhead as i64,
            });
        }
        Ok(ChunkWriter::new(metadata, sink).with_options(self.options.clone()))
    }

    /// Reads a single standalone JSON payload as a one-entry document.
    ///
    /// Empty input yields an empty document under placeholder metadata.
    /// Legacy shapes are refused here; the caller selects an adapter from
    /// the sniffed shape instead.
    pub fn read_graph(&self, bytes: &[u8]) -> Result<(Metadata, Chunk), BdioError> {
        let shape = sniff(bytes);
        debug!(?shape, len = bytes.len(), "sniffed standalone payload");
        match shape {
            InputShape::Empty => Ok((Metadata::new(""), Chunk::new())),
            InputShape::LegacyBom => Err(BdioError::FramingSyntax(
                "legacy bill-of-materials input requires an external adapter".to_string(),
            )),
            InputShape::LegacyScanContainer => Err(BdioError::FramingSyntax(
                "legacy scan container input requires an external adapter".to_string(),
            )),
            InputShape::Graph => {
                if bytes.len() > self.options.max_entry_size {
                    return Err(BdioError::EntrySizeViolation {
                        entry_name: None,
                        estimated_size: bytes.len() as i64,
                    });
                }
                let (metadata, graph) = reader::parse_envelope("<standalone>", bytes)?;
                let mut chunk = Chunk::new();
                for value in &graph {
                    let node = Node::from_value(value)?;
                    enforce(&NoopValidator, &node)?;
                    chunk.push(node);
                }
                Ok((metadata, chunk))
            }
        }
    }
}

/// Reads a whole document from an archive source, accumulating metadata
/// fragments across entries.
pub struct DocumentReader<S: EntrySource, V: Validator> {
    inner: ChunkReader<S, V>,
    header: Option<Metadata>,
}

impl<S: EntrySource, V: Validator> DocumentReader<S, V> {
    /// The header metadata, read on first use.
    pub fn header(&mut self) -> Result<&Metadata, BdioError> {
        let header = match self.header.take() {
            Some(header) => header,
            None => self.inner.read_header()?,
        };
        Ok(self.header.insert(header))
    }

    /// The next chunk, reading the header first if it has not been read.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>, BdioError> {
        self.header()?;
        self.inner.read_chunk()
    }

    /// The metadata accumulated so far, including fragments merged from data
    /// entry envelopes.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.inner.metadata()
    }
}
