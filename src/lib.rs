//! BDIO: Chunked Bill-of-Materials Document Format
//!
//! A chunked, size-bounded document format for bill-of-materials graphs.
//! Documents are archives of named entries: a header entry carrying only
//! metadata followed by data entries, each holding a bounded slice of the
//! node graph. Writers place nodes with an estimate-then-verify sizing
//! discipline so no entry ever exceeds the uncompressed budget; readers
//! enforce the same budget independently and reassemble nodes into per-kind
//! chunks.

pub mod archive;
pub mod binary;
pub mod chunk;
pub mod document;
pub mod error;
pub mod estimate;
pub mod framer;
pub mod metadata;
pub mod node;
pub mod options;
pub mod reader;
pub mod validate;
pub mod writer;

pub use archive::{DirArchive, EntrySink, EntrySource, MemArchive, MAX_ENTRY_SIZE};
pub use binary::{BinaryChunkReader, BinaryChunkWriter};
pub use chunk::Chunk;
pub use document::{sniff, DocumentAssembler, DocumentReader, InputShape};
pub use error::BdioError;
pub use metadata::{Creator, Metadata, Product};
pub use node::{Node, NodeKind};
pub use options::DocumentOptions;
pub use reader::ChunkReader;
pub use validate::{NoopValidator, RequiredFieldsValidator, Severity, Validator, Violation};
pub use writer::ChunkWriter;
