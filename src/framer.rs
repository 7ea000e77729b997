//! Entry framing.
//!
//! An entry framer owns the fixed byte sequences that open, delimit and
//! close one archive entry, and tracks the remaining uncompressed capacity.
//! The counter only ever decreases; a refused reservation leaves it
//! untouched, so the budget invariant holds for every entry a writer can
//! produce.

use crate::error::BdioError;
use crate::metadata::Metadata;
use crate::node;

/// Framing bytes and remaining capacity for one entry.
#[derive(Debug)]
pub struct EntryFramer {
    header: Vec<u8>,
    delimiter: Vec<u8>,
    footer: Vec<u8>,
    remaining: usize,
    reserved_any: bool,
}

impl EntryFramer {
    /// Framing for the textual JSON-graph encoding:
    /// `{"@id":<ID>,"@graph":[` ... `, ` ... `]}`.
    pub fn for_graph(metadata: &Metadata, budget: usize) -> Result<Self, BdioError> {
        let id = serde_json::to_string(metadata.id())?;
        let header = format!("{{\"{}\":{},\"{}\":[", node::ID, id, node::GRAPH).into_bytes();
        EntryFramer::with_framing(header, b", ".to_vec(), b"]}".to_vec(), budget)
    }

    /// Framing from explicit byte sequences. The binary encoding uses empty
    /// framing since its records are self-delimiting.
    pub fn with_framing(
        header: Vec<u8>,
        delimiter: Vec<u8>,
        footer: Vec<u8>,
        budget: usize,
    ) -> Result<Self, BdioError> {
        let overhead = header.len() + footer.len();
        if overhead > budget {
            return Err(BdioError::EntrySizeViolation {
                entry_name: None,
                estimated_size: overhead as i64,
            });
        }
        Ok(EntryFramer {
            remaining: budget - overhead,
            header,
            delimiter,
            footer,
            reserved_any: false,
        })
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    pub fn footer(&self) -> &[u8] {
        &self.footer
    }

    /// Bytes still available for node data in this entry.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Attempts to reserve capacity for a node of the given serialized
    /// length. On success the capacity is committed and the returned slice
    /// holds the bytes to write before the node (the delimiter, or nothing
    /// for the first node of the entry). On refusal the state is unchanged.
    pub fn try_reserve(&mut self, node_len: usize) -> Option<&[u8]> {
        let delimiter_len = if self.reserved_any {
            self.delimiter.len()
        } else {
            0
        };
        let cost = node_len.checked_add(delimiter_len)?;
        if cost > self.remaining {
            return None;
        }
        self.remaining -= cost;
        let first = !self.reserved_any;
        self.reserved_any = true;
        if first {
            Some(&[])
        } else {
            Some(&self.delimiter)
        }
    }

    /// Drains the remaining capacity so the next reservation fails, forcing
    /// the writer to start a new entry.
    pub fn force_close(&mut self) {
        self.remaining = 0;
    }
}
