//! Document options.

use crate::archive;
use serde::{Deserialize, Serialize};

/// Tunable settings shared by the writers, readers and the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOptions {
    /// Maximum uncompressed size in bytes of a single entry.
    #[serde(default = "default_max_entry_size")]
    pub max_entry_size: usize,

    /// Prefix of entry names inside the archive.
    #[serde(default = "default_entry_prefix")]
    pub entry_prefix: String,

    /// Extension identifying data-bearing entries; anything else is skipped.
    #[serde(default = "default_data_extension")]
    pub data_extension: String,
}

fn default_max_entry_size() -> usize {
    archive::MAX_ENTRY_SIZE
}

fn default_entry_prefix() -> String {
    "bdio".to_string()
}

fn default_data_extension() -> String {
    "jsonld".to_string()
}

impl Default for DocumentOptions {
    fn default() -> Self {
        DocumentOptions {
            max_entry_size: default_max_entry_size(),
            entry_prefix: default_entry_prefix(),
            data_extension: default_data_extension(),
        }
    }
}

impl DocumentOptions {
    /// Defaults for the compact binary encoding.
    pub fn binary() -> Self {
        DocumentOptions {
            data_extension: "bdio".to_string(),
            ..DocumentOptions::default()
        }
    }

    pub fn with_max_entry_size(mut self, max_entry_size: usize) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }
}
