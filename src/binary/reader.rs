//! Chunk reader for the compact binary encoding.

use crate::archive::{self, EntrySource, SourceEntry};
use crate::binary::{HeaderRecord, NodeRecord, RecordHeader, RecordTag};
use crate::chunk::Chunk;
use crate::error::BdioError;
use crate::metadata::Metadata;
use crate::options::DocumentOptions;
use crate::validate::{enforce, NoopValidator, Validator};
use std::io::Cursor;
use tracing::{debug, trace};

/// Reads binary record entries back into node chunks.
pub struct BinaryChunkReader<S: EntrySource, V: Validator> {
    source: S,
    validator: V,
    options: DocumentOptions,
    metadata: Option<Metadata>,
}

impl<S: EntrySource> BinaryChunkReader<S, NoopValidator> {
    pub fn new(source: S) -> Self {
        BinaryChunkReader::with_validator(source, NoopValidator)
    }
}

impl<S: EntrySource, V: Validator> BinaryChunkReader<S, V> {
    pub fn with_validator(source: S, validator: V) -> Self {
        BinaryChunkReader {
            source,
            validator,
            options: DocumentOptions::binary(),
            metadata: None,
        }
    }

    pub fn with_options(mut self, options: DocumentOptions) -> Self {
        self.options = options;
        self
    }

    /// The metadata recovered from the header entry, once read.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Reads the header entry: exactly one metadata record.
    pub fn read_header(&mut self) -> Result<Metadata, BdioError> {
        let entry = self
            .next_data_entry()?
            .ok_or_else(|| BdioError::FramingSyntax("document has no header entry".to_string()))?;
        let name = entry.name.clone();
        let bytes = archive::read_bounded(entry, self.options.max_entry_size)?;
        let mut cursor = Cursor::new(bytes.as_slice());

        let record = RecordHeader::read(&mut cursor)?.ok_or_else(|| {
            BdioError::FramingSyntax(format!("header entry {} is empty", name))
        })?;
        if record.tag != RecordTag::Header {
            return Err(BdioError::FramingSyntax(format!(
                "header entry {} does not start with a metadata record",
                name
            )));
        }
        let payload = read_payload(&mut cursor, record.length)?;
        let header: HeaderRecord = bincode::deserialize(&payload)?;

        if RecordHeader::read(&mut cursor)?.is_some() {
            return Err(BdioError::FramingSyntax(format!(
                "header entry {} must not carry graph data",
                name
            )));
        }

        let metadata = header.into_metadata();
        debug!(entry = %name, id = %metadata.id(), "read binary header");
        self.merge_metadata(&metadata)?;
        Ok(metadata)
    }

    /// Reads the next data entry as a chunk, or `None` once the archive is
    /// exhausted.
    pub fn read_chunk(&mut self) -> Result<Option<Chunk>, BdioError> {
        let Some(entry) = self.next_data_entry()? else {
            return Ok(None);
        };
        let name = entry.name.clone();
        let bytes = archive::read_bounded(entry, self.options.max_entry_size)?;
        let mut cursor = Cursor::new(bytes.as_slice());

        let mut chunk = Chunk::new();
        while let Some(record) = RecordHeader::read(&mut cursor)? {
            let kind = record.tag.kind().ok_or_else(|| {
                BdioError::FramingSyntax(format!(
                    "data entry {} carries a metadata record",
                    name
                ))
            })?;
            let payload = read_payload(&mut cursor, record.length)?;
            let node_record: NodeRecord = bincode::deserialize(&payload)?;
            let node = node_record.into_node(kind);
            enforce(&self.validator, &node)?;
            chunk.push(node);
        }
        debug!(entry = %name, nodes = chunk.len(), "read binary data entry");
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

/// Reads a record payload of the declared length, treating a short read as a
/// truncated record rather than an I/O failure.
fn read_payload(cursor: &mut Cursor<&[u8]>, length: u32) -> Result<Vec<u8>, BdioError> {
    use std::io::Read;

    let mut payload = vec![0u8; length as usize];
    cursor
        .read_exact(&mut payload)
        .map_err(|_| BdioError::FramingSyntax("truncated record payload".to_string()))?;
    Ok(payload)
}
