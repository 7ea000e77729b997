//! Chunk writer for the textual JSON-graph encoding.
//!
//! Turns a metadata record followed by an unbounded node sequence into a
//! sequence of size-bounded entries in an archive sink. A node is never
//! split across entries: when it does not fit the current entry, the entry
//! is closed and the reservation is retried exactly once against a fresh
//! one; a node too large for even a fresh entry is a fatal size violation.

use crate::archive::{self, EntrySink};
use crate::error::BdioError;
use crate::estimate;
use crate::framer::EntryFramer;
use crate::metadata::Metadata;
use crate::node::{self, Node};
use crate::options::DocumentOptions;
use crate::validate::{enforce, NoopValidator, Validator};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unstarted,
    Started,
    Closed,
}

/// Writes graph nodes into size-bounded archive entries.
pub struct ChunkWriter<S: EntrySink, V: Validator> {
    sink: S,
    metadata: Metadata,
    validator: V,
    options: DocumentOptions,
    state: State,
    framer: Option<EntryFramer>,
    current_name: Option<String>,
    next_index: u32,
}

impl<S: EntrySink> ChunkWriter<S, NoopValidator> {
    /// A writer that performs no validation.
    pub fn new(metadata: Metadata, sink: S) -> Self {
        ChunkWriter::with_validator(metadata, sink, NoopValidator)
    }
}

impl<S: EntrySink, V: Validator> ChunkWriter<S, V> {
    pub fn with_validator(metadata: Metadata, sink: S, validator: V) -> Self {
        ChunkWriter {
            sink,
            metadata,
            validator,
            options: DocumentOptions::default(),
            state: State::Unstarted,
            framer: None,
            current_name: None,
            next_index: 0,
        }
    }

    pub fn with_options(mut self, options: DocumentOptions) -> Self {
        self.options = options;
        self
    }

    /// Starts the document by writing the header entry: an envelope carrying
    /// only the metadata and an empty node list. Must be called exactly
    /// once, before any node is written.
    pub fn start(&mut self) -> Result<(), BdioError> {
        if self.state != State::Unstarted {
            return Err(BdioError::InvalidState("writer already started"));
        }

        let name = archive::header_entry_name(&self.options.entry_prefix, &self.options.data_extension);
        let mut fields = self.metadata.to_envelope_fields();
        fields.insert(node::GRAPH.to_string(), Value::Array(Vec::new()));
        let bytes = serde_json::to_vec(&Value::Object(fields))?;

        if bytes.len() > self.options.max_entry_size {
            return Err(BdioError::EntrySizeViolation {
                entry_name: Some(name),
                estimated_size: bytes.len() as i64,
            });
        }

        self.sink.start_entry(&name)?;
        self.sink.write(&bytes)?;
        self.sink.finish_entry()?;
        self.state = State::Started;
        debug!(entry = %name, "wrote document header entry");
        Ok(())
    }

    /// Writes one node, rolling over to a new entry when the current one is
    /// full. The node is validated before any bytes are committed.
    pub fn next(&mut self, node: &Node) -> Result<(), BdioError> {
        if self.state != State::Started {
            return Err(BdioError::InvalidState("writer not started"));
        }

        enforce(&self.validator, node)?;
        let value = node.to_value();
        let bytes = serde_json::to_vec(&value)?;

        if self.framer.is_none() {
            self.open_entry()?;
        }
        if self.reserve_and_write(&bytes)? {
            return Ok(());
        }

        // Close the refusing entry and retry exactly once against a fresh
        // one; a second refusal means the node fits no entry at all
        self.open_entry()?;
        if self.reserve_and_write(&bytes)? {
            return Ok(());
        }

        Err(BdioError::EntrySizeViolation {
            entry_name: self.current_name.clone(),
            estimated_size: (estimate::estimate(&value) + estimate::entry_overhead(&self.metadata))
                as i64,
        })
    }

    /// Forces the current entry to close before reaching the size budget;
    /// the next node starts a new entry.
    pub fn close_entry(&mut self) {
        if let Some(framer) = self.framer.as_mut() {
            framer.force_close();
        }
    }

    /// Finishes the open entry (if any) and releases the sink. Idempotent:
    /// a second call writes nothing and raises no error, so error-path
    /// cleanup can always call it.
    pub fn close(&mut self) -> Result<(), BdioError> {
        if self.state == State::Closed {
            return Ok(());
        }
        self.state = State::Closed;
        self.finish_open_entry()?;
        self.sink.close()?;
        Ok(())
    }

    /// The underlying sink, for callers that need it back after `close`.
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn reserve_and_write(&mut self, bytes: &[u8]) -> Result<bool, BdioError> {
        let Some(framer) = self.framer.as_mut() else {
            return Err(BdioError::InvalidState("no entry is open"));
        };
        match framer.try_reserve(bytes.len()) {
            Some(prefix) => {
                if !prefix.is_empty() {
                    self.sink.write(prefix)?;
                }
                self.sink.write(bytes)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn open_entry(&mut self) -> Result<(), BdioError> {
        self.finish_open_entry()?;
        let name = archive::data_entry_name(
            &self.options.entry_prefix,
            &self.options.data_extension,
            self.next_index,
        );
        self.next_index += 1;

        let framer = EntryFramer::for_graph(&self.metadata, self.options.max_entry_size)?;
        self.sink.start_entry(&name)?;
        self.sink.write(framer.header())?;
        debug!(entry = %name, remaining = framer.remaining(), "opened data entry");
        self.framer = Some(framer);
        self.current_name = Some(name);
        Ok(())
    }

    fn finish_open_entry(&mut self) -> Result<(), BdioError> {
        if let Some(framer) = self.framer.take() {
            self.sink.write(framer.footer())?;
            self.sink.finish_entry()?;
        }
        Ok(())
    }
}
