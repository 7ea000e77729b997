//! Directory-backed archive.
//!
//! Stores each entry as one file inside a directory. On read, the header
//! entry is yielded first and the data entries follow in numeric index
//! order, which keeps entry 100 after entry 99 once the zero-padded index
//! outgrows its two digits.

use crate::archive::{self, EntrySink, EntrySource, SourceEntry};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes archive entries as files in a directory.
pub struct DirArchive {
    root: PathBuf,
    current: Option<File>,
    closed: bool,
}

impl DirArchive {
    /// Creates the directory (and parents) if needed.
    pub fn create<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(DirArchive {
            root,
            current: None,
            closed: false,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens an existing directory archive for reading.
    pub fn open<P: AsRef<Path>>(root: P) -> io::Result<DirSource> {
        let root = root.as_ref().to_path_buf();
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        // Header first, then data entries by numeric index (name order alone
        // would put entry 100 before entry 99), then ancillary names
        names.sort_by_key(|name| {
            (
                !name.contains("-header."),
                archive::entry_index(name).unwrap_or(u32::MAX),
                name.clone(),
            )
        });
        Ok(DirSource {
            root,
            names,
            position: 0,
        })
    }
}

impl EntrySink for DirArchive {
    fn start_entry(&mut self, name: &str) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "archive is closed",
            ));
        }
        self.finish_entry()?;
        let file = File::create(self.root.join(name))?;
        self.current = Some(file);
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<()> {
        match &mut self.current {
            Some(file) => file.write_all(buf),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no entry is open",
            )),
        }
    }

    fn finish_entry(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.current.take() {
            file.flush()?;
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

/// Reads archive entries back from a directory.
pub struct DirSource {
    root: PathBuf,
    names: Vec<String>,
    position: usize,
}

impl EntrySource for DirSource {
    fn next_entry(&mut self) -> io::Result<Option<SourceEntry>> {
        let Some(name) = self.names.get(self.position).cloned() else {
            return Ok(None);
        };
        self.position += 1;

        let path = self.root.join(&name);
        let size_hint = fs::metadata(&path).ok().map(|m| m.len());
        let file = File::open(path)?;
        Ok(Some(SourceEntry {
            name,
            size_hint,
            reader: Box::new(file),
        }))
    }
}
