//! Archive containers.
//!
//! A BDIO archive is a container of named entries. Entry 0 is a header entry
//! carrying only document metadata; entries 1..N hold graph data. Data
//! entries are recognized purely by their extension, so consumers tolerate
//! unknown ancillary entries (signature files and the like) by skipping them.

pub mod dir;
pub mod mem;

pub use dir::DirArchive;
pub use mem::MemArchive;

use crate::error::BdioError;
use std::io::{self, Read};

/// The maximum uncompressed size in bytes of a single entry.
pub const MAX_ENTRY_SIZE: usize = 16 * 1024 * 1024;

/// The name of the header entry, e.g. `bdio-header.jsonld`.
pub fn header_entry_name(prefix: &str, extension: &str) -> String {
    format!("{}-header.{}", prefix, extension)
}

/// The name of a data entry, e.g. `bdio-entry-03.jsonld`. Two digits minimum,
/// growing as needed.
pub fn data_entry_name(prefix: &str, extension: &str, index: u32) -> String {
    format!("{}-entry-{:02}.{}", prefix, index, extension)
}

/// Checks whether an entry name represents document data.
pub fn is_data_entry_name(name: &str, extension: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| ext == extension)
        .unwrap_or(false)
}

/// The sequential index of a data entry name, or `None` for the header and
/// ancillary entries. Indices grow past two digits, so ordering readers must
/// compare numerically rather than lexicographically.
pub(crate) fn entry_index(name: &str) -> Option<u32> {
    let stem = name.rsplit_once('.')?.0;
    let (_, index) = stem.rsplit_once("-entry-")?;
    index.parse().ok()
}

/// Destination for archive entries. One writer exclusively owns a sink for
/// its whole lifetime; entries are written strictly sequentially.
pub trait EntrySink {
    /// Opens a new named entry, implicitly finishing any unfinished one.
    fn start_entry(&mut self, name: &str) -> io::Result<()>;

    /// Appends bytes to the currently open entry.
    fn write(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Completes the currently open entry.
    fn finish_entry(&mut self) -> io::Result<()>;

    /// Releases the sink. Must be idempotent.
    fn close(&mut self) -> io::Result<()>;
}

/// One entry pulled from an archive source.
pub struct SourceEntry {
    pub name: String,
    /// Declared size in bytes, when the container records one. The container
    /// may misrepresent the actual size, so readers must not trust it as a
    /// bound.
    pub size_hint: Option<u64>,
    pub reader: Box<dyn Read>,
}

/// Origin of archive entries, yielded strictly in document order.
pub trait EntrySource {
    /// The next entry, or `None` once the archive is exhausted.
    fn next_entry(&mut self) -> io::Result<Option<SourceEntry>>;
}

/// Reads an entry fully into memory, refusing anything over the size budget.
/// The container's declared size is checked first but the actual byte count
/// is what decides, since the container may lie.
pub(crate) fn read_bounded(entry: SourceEntry, budget: usize) -> Result<Vec<u8>, BdioError> {
    if let Some(hint) = entry.size_hint {
        if hint > budget as u64 {
            return Err(BdioError::EntrySizeViolation {
                entry_name: Some(entry.name),
                estimated_size: hint as i64,
            });
        }
    }

    let mut bytes = Vec::new();
    entry
        .reader
        .take(budget as u64 + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() > budget {
        return Err(BdioError::EntrySizeViolation {
            entry_name: Some(entry.name),
            estimated_size: bytes.len() as i64,
        });
    }
    Ok(bytes)
}
