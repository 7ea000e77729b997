//! Chunk writer for the compact binary encoding.
//!
//! Mirrors the textual writer's entry rollover discipline, but frames each
//! node as a self-delimiting record instead of a JSON array element. Since
//! records carry their own length there is no envelope, so an entry's budget
//! is spent entirely on records.

use crate::archive::{self, EntrySink};
use crate::binary::{HeaderRecord, NodeRecord, RecordHeader, RecordTag, RECORD_HEADER_LEN};
use crate::error::BdioError;
use crate::framer::EntryFramer;
use crate::metadata::Metadata;
use crate::node::Node;
use crate::options::DocumentOptions;
use crate::validate::{enforce, NoopValidator, Validator};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unstarted,
    Started,
    Closed,
}

/// Writes graph nodes as binary records into size-bounded archive entries.
pub struct BinaryChunkWriter<S: EntrySink, V: Validator> {
    sink: S,
    metadata: Metadata,
    validator: V,
    options: DocumentOptions,
    state: State,
    framer: Option<EntryFramer>,
    current_name: Option<String>,
    next_index: u32,
}

impl<S: EntrySink> BinaryChunkWriter<S, NoopValidator> {
    pub fn new(metadata: Metadata, sink: S) -> Self {
        BinaryChunkWriter::with_validator(metadata, sink, NoopValidator)
    }
}

impl<S: EntrySink, V: Validator> BinaryChunkWriter<S, V> {
    pub fn with_validator(metadata: Metadata, sink: S, validator: V) -> Self {
        BinaryChunkWriter {
            sink,
            metadata,
            validator,
            options: DocumentOptions::binary(),
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

    /// Writes the header entry: a single metadata record.
    pub fn start(&mut self) -> Result<(), BdioError> {
        if self.state != State::Unstarted {
            return Err(BdioError::InvalidState("writer already started"));
        }

        let name = archive::header_entry_name(&self.options.entry_prefix, &self.options.data_extension);
        let payload = bincode::serialize(&HeaderRecord::from_metadata(&self.metadata))?;
        let total = RECORD_HEADER_LEN + payload.len();
        if total > self.options.max_entry_size {
            return Err(BdioError::EntrySizeViolation {
                entry_name: Some(name),
                estimated_size: total as i64,
            });
        }

        let record = RecordHeader::new(RecordTag::Header, payload.len() as u32);
        self.sink.start_entry(&name)?;
        self.sink.write(&record.encode())?;
        self.sink.write(&payload)?;
        self.sink.finish_entry()?;
        self.state = State::Started;
        debug!(entry = %name, "wrote binary header entry");
        Ok(())
    }

    /// Writes one node record, rolling over to a new entry when the current
    /// one is full.
    pub fn next(&mut self, node: &Node) -> Result<(), BdioError> {
        if self.state != State::Started {
            return Err(BdioError::InvalidState("writer not started"));
        }

        enforce(&self.validator, node)?;
        let payload = bincode::serialize(&NodeRecord::from_node(node))?;
        let record = RecordHeader::new(RecordTag::for_kind(node.kind), payload.len() as u32);
        let cost = RECORD_HEADER_LEN + payload.len();

        if self.framer.is_none() {
            self.open_entry()?;
        }
        if self.reserve_and_write(cost, &record, &payload)? {
            return Ok(());
        }

        // Close the refusing entry and retry exactly once against a fresh
        // one; a second refusal means the record fits no entry at all
        self.open_entry()?;
        if self.reserve_and_write(cost, &record, &payload)? {
            return Ok(());
        }

        Err(BdioError::EntrySizeViolation {
            entry_name: self.current_name.clone(),
            estimated_size: cost as i64,
        })
    }

    /// Forces the current entry to close before reaching the size budget.
    pub fn close_entry(&mut self) {
        if let Some(framer) = self.framer.as_mut() {
            framer.force_close();
        }
    }

    /// Finishes the open entry (if any) and releases the sink. Idempotent
    /// once started; closing a writer that never wrote its header is a
    /// protocol error.
    pub fn close(&mut self) -> Result<(), BdioError> {
        if self.state == State::Closed {
            return Ok(());
        }
        if self.state == State::Unstarted {
            return Err(BdioError::InvalidState("document header was never written"));
        }
        self.state = State::Closed;
        self.finish_open_entry()?;
        self.sink.close()?;
        Ok(())
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn reserve_and_write(
        &mut self,
        cost: usize,
        record: &RecordHeader,
        payload: &[u8],
    ) -> Result<bool, BdioError> {
        let Some(framer) = self.framer.as_mut() else {
            return Err(BdioError::InvalidState("no entry is open"));
        };
        if framer.try_reserve(cost).is_none() {
            return Ok(false);
        }
        self.sink.write(&record.encode())?;
        self.sink.write(payload)?;
        Ok(true)
    }

    fn open_entry(&mut self) -> Result<(), BdioError> {
        self.finish_open_entry()?;
        let name = archive::data_entry_name(
            &self.options.entry_prefix,
            &self.options.data_extension,
            self.next_index,
        );
        self.next_index += 1;

        // Records delimit themselves, so the entry has no framing bytes
        let framer = EntryFramer::with_framing(
            Vec::new(),
            Vec::new(),
            Vec::new(),
            self.options.max_entry_size,
        )?;
        self.sink.start_entry(&name)?;
        debug!(entry = %name, remaining = framer.remaining(), "opened binary data entry");
        self.framer = Some(framer);
        self.current_name = Some(name);
        Ok(())
    }

    fn finish_open_entry(&mut self) -> Result<(), BdioError> {
        if self.framer.take().is_some() {
            self.sink.finish_entry()?;
        }
        Ok(())
    }
}
