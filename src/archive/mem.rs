//! In-memory archive.
//!
//! Keeps entries as named byte buffers in insertion order. Used by tests and
//! for handing a document between components in the same process.

use crate::archive::{EntrySink, EntrySource, SourceEntry};
use std::io::{self, Cursor};

/// An archive held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemArchive {
    entries: Vec<(String, Vec<u8>)>,
    current: Option<(String, Vec<u8>)>,
    closed: bool,
}

impl MemArchive {
    pub fn new() -> Self {
        MemArchive::default()
    }

    /// Completed entries in write order.
    pub fn entries(&self) -> &[(String, Vec<u8>)] {
        &self.entries
    }

    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The bytes of a completed entry by name.
    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Total bytes across all completed entries.
    pub fn total_len(&self) -> usize {
        self.entries.iter().map(|(_, bytes)| bytes.len()).sum()
    }

    /// A source yielding this archive's entries in write order.
    pub fn source(&self) -> MemSource {
        MemSource {
            entries: self.entries.clone(),
            position: 0,
        }
    }
}

impl EntrySink for MemArchive {
    fn start_entry(&mut self, name: &str) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "archive is closed",
            ));
        }
        self.finish_entry()?;
        self.current = Some((name.to_string(), Vec::new()));
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        match &mut self.current {
            Some((_, bytes)) => {
                bytes.extend_from_slice(buf);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no entry is open",
            )),
        }
    }

    fn finish_entry(&mut self) -> io::Result<()> {
        if let Some(entry) = self.current.take() {
            self.entries.push(entry);
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if !self.closed {
            self.finish_entry()?;
            self.closed = true;
        }
        Ok(())
    }
}

/// Reads entries back out of a [`MemArchive`].
pub struct MemSource {
    entries: Vec<(String, Vec<u8>)>,
    position: usize,
}

impl EntrySource for MemSource {
    fn next_entry(&mut self) -> io::Result<Option<SourceEntry>> {
        let Some((name, bytes)) = self.entries.get(self.position).cloned() else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(SourceEntry {
            name,
            size_hint: Some(bytes.len() as u64),
            reader: Box::new(Cursor::new(bytes)),
        }))
    }
}
