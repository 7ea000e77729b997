//! Directory-backed archives: on-disk naming and full round trips through
//! the filesystem.

use bdio::{ChunkReader, ChunkWriter, DirArchive, DocumentOptions, Metadata, Node, NodeKind};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_directory_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let archive = DirArchive::create(temp_dir.path().join("doc")).unwrap();

    let options = DocumentOptions::default().with_max_entry_size(400);
    let mut writer =
        ChunkWriter::new(Metadata::new("urn:uuid:on-disk"), archive).with_options(options.clone());
    writer.start().unwrap();
    for index in 0..10 {
        let node = Node::new(format!("urn:uuid:f{}", index), NodeKind::File)
            .with_property("path", json!(format!("src/file-{}.rs", index)));
        writer.next(&node).unwrap();
    }
    writer.close().unwrap();

    // The files land under the expected names
    let root = temp_dir.path().join("doc");
    assert!(root.join("bdio-header.jsonld").is_file());
    assert!(root.join("bdio-entry-00.jsonld").is_file());

    let source = DirArchive::open(&root).unwrap();
    let mut reader = ChunkReader::new(source).with_options(options);
    let metadata = reader.read_header().unwrap();
    assert_eq!(metadata.id(), "urn:uuid:on-disk");

    let mut total = 0;
    while let Some(chunk) = reader.read_chunk().unwrap() {
        total += chunk.len();
    }
    assert_eq!(total, 10);
}

#[test]
fn test_write_order_survives_past_two_digit_indices() {
    let temp_dir = TempDir::new().unwrap();
    let archive = DirArchive::create(temp_dir.path()).unwrap();

    // One node per entry, pushed past the two-digit index range
    let mut writer = ChunkWriter::new(Metadata::new("urn:uuid:many"), archive);
    writer.start().unwrap();
    for index in 0..101 {
        let node = Node::new(format!("urn:uuid:f{:04}", index), NodeKind::File)
            .with_property("path", json!(format!("src/{}.rs", index)));
        writer.next(&node).unwrap();
        writer.close_entry();
    }
    writer.close().unwrap();

    let source = DirArchive::open(temp_dir.path()).unwrap();
    let mut reader = ChunkReader::new(source);
    reader.read_header().unwrap();
    let mut ids = Vec::new();
    while let Some(chunk) = reader.read_chunk().unwrap() {
        for node in chunk.into_nodes() {
            ids.push(node.id);
        }
    }

    let expected: Vec<String> = (0..101).map(|i| format!("urn:uuid:f{:04}", i)).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_stray_files_in_directory_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let archive = DirArchive::create(temp_dir.path()).unwrap();

    let mut writer = ChunkWriter::new(Metadata::new("urn:uuid:on-disk"), archive);
    writer.start().unwrap();
    writer
        .next(&Node::new("urn:uuid:f1", NodeKind::File).with_property("path", json!("a")))
        .unwrap();
    writer.close().unwrap();

    // A signature file beside the document must not disturb reading
    std::fs::write(temp_dir.path().join("bdio.sig"), b"not json").unwrap();

    let source = DirArchive::open(temp_dir.path()).unwrap();
    let mut reader = ChunkReader::new(source);
    reader.read_header().unwrap();
    assert_eq!(reader.read_chunk().unwrap().unwrap().len(), 1);
    assert!(reader.read_chunk().unwrap().is_none());
}

#[test]
fn test_entry_files_stay_within_budget_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let archive = DirArchive::create(temp_dir.path()).unwrap();

    let budget = 400;
    let options = DocumentOptions::default().with_max_entry_size(budget);
    let mut writer =
        ChunkWriter::new(Metadata::new("urn:uuid:on-disk"), archive).with_options(options);
    writer.start().unwrap();
    for index in 0..25 {
        let node = Node::new(format!("urn:uuid:f{}", index), NodeKind::File)
            .with_property("path", json!(format!("src/dir/file-{}.rs", index)));
        writer.next(&node).unwrap();
    }
    writer.close().unwrap();

    for entry in std::fs::read_dir(temp_dir.path()).unwrap() {
        let entry = entry.unwrap();
        let len = entry.metadata().unwrap().len() as usize;
        assert!(
            len <= budget,
            "file {:?} is {} bytes, budget {}",
            entry.file_name(),
            len,
            budget
        );
    }
}
