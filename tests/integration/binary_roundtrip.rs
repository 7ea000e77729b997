//! Write/read round trips over the compact binary encoding.

use bdio::binary::{BinaryChunkReader, BinaryChunkWriter, RecordTag, FORMAT_VERSION};
use bdio::{BdioError, Chunk, Creator, DocumentOptions, EntrySink, MemArchive, Metadata, Node, NodeKind};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn sample_metadata() -> Metadata {
    let mut metadata = Metadata::new("urn:uuid:binary-doc");
    metadata.set_creation(Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap());
    metadata.set_creator(Creator::parse("builder@ci-host"));
    metadata.set_extension("buildNumber", json!(1337));
    metadata
}

#[test]
fn test_binary_round_trip_preserves_everything() {
    let metadata = sample_metadata();
    let mut writer = BinaryChunkWriter::new(metadata.clone(), MemArchive::new());
    writer.start().unwrap();

    let nodes = vec![
        Node::new("urn:uuid:p1", NodeKind::Project).with_property("name", json!("demo")),
        Node::new("urn:uuid:c1", NodeKind::Component)
            .with_property("identifier", json!("pkg:cargo/serde@1.0"))
            .with_property("scores", json!([1, 2, 3])),
        Node::new("urn:uuid:f1", NodeKind::File)
            .with_property("path", json!("src/lib.rs"))
            .with_property("meta", json!({"executable": false, "ratio": 0.25})),
        Node::new("urn:uuid:d1", NodeKind::Dependency)
            .with_property("dependsOn", json!("urn:uuid:c1")),
    ];
    for node in &nodes {
        writer.next(node).unwrap();
    }
    writer.close().unwrap();

    let archive = writer.into_sink();
    assert_eq!(archive.entry_names()[0], "bdio-header.bdio");

    let mut reader = BinaryChunkReader::new(archive.source());
    let read_metadata = reader.read_header().unwrap();
    assert_eq!(read_metadata, metadata);

    let chunk = reader.read_chunk().unwrap().unwrap();
    assert_eq!(chunk.projects().len(), 1);
    assert_eq!(chunk.components().len(), 1);
    assert_eq!(chunk.files().len(), 1);
    assert_eq!(chunk.dependencies().len(), 1);
    assert_eq!(chunk.files()[0], nodes[2]);
    assert!(reader.read_chunk().unwrap().is_none());
}

#[test]
fn test_binary_budget_invariant() {
    let budget = 512;
    let options = DocumentOptions::binary().with_max_entry_size(budget);
    let mut writer = BinaryChunkWriter::new(Metadata::new("urn:uuid:binary-doc"), MemArchive::new())
        .with_options(options.clone());
    writer.start().unwrap();
    for index in 0..20 {
        let node = Node::new(format!("urn:uuid:f{}", index), NodeKind::File)
            .with_property("path", json!(format!("src/deeply/nested/module-{}.rs", index)));
        writer.next(&node).unwrap();
    }
    writer.close().unwrap();

    let archive = writer.into_sink();
    assert!(archive.entry_names().len() > 2);
    for (name, bytes) in archive.entries() {
        assert!(bytes.len() <= budget, "entry {} over budget", name);
    }

    let mut reader = BinaryChunkReader::new(archive.source()).with_options(options);
    reader.read_header().unwrap();
    let mut total = 0;
    while let Some(chunk) = reader.read_chunk().unwrap() {
        total += chunk.len();
    }
    assert_eq!(total, 20);
}

#[test]
fn test_future_version_is_rejected() {
    // Hand-build a header record claiming a newer schema version
    let future_version = FORMAT_VERSION + 1;
    let mut record = Vec::new();
    record.extend_from_slice(&RecordTag::Header.as_u16().to_be_bytes());
    record.extend_from_slice(&future_version.to_be_bytes());
    record.extend_from_slice(&0u32.to_be_bytes());

    let mut archive = MemArchive::new();
    archive.start_entry("bdio-header.bdio").unwrap();
    archive.write(&record).unwrap();
    archive.close().unwrap();

    let mut reader = BinaryChunkReader::new(archive.source());
    assert!(matches!(
        reader.read_header(),
        Err(BdioError::FramingSyntax(_))
    ));
}

#[test]
fn test_oversize_binary_entry_rejected_on_read() {
    let mut archive = MemArchive::new();
    archive.start_entry("bdio-entry-00.bdio").unwrap();
    archive.write(&vec![0u8; 600]).unwrap();
    archive.close().unwrap();

    let options = DocumentOptions::binary().with_max_entry_size(512);
    let mut reader = BinaryChunkReader::new(archive.source()).with_options(options);
    assert!(matches!(
        reader.read_chunk(),
        Err(BdioError::EntrySizeViolation { .. })
    ));
}

#[test]
fn test_empty_graph_document() {
    let mut writer = BinaryChunkWriter::new(Metadata::new("urn:uuid:binary-doc"), MemArchive::new());
    writer.start().unwrap();
    writer.close().unwrap();

    let mut reader = BinaryChunkReader::new(writer.into_sink().source());
    let metadata = reader.read_header().unwrap();
    assert_eq!(metadata.id(), "urn:uuid:binary-doc");
    assert!(reader.read_chunk().unwrap().is_none());
}

#[test]
fn test_chunk_groups_are_unused_when_kind_absent() {
    let mut writer = BinaryChunkWriter::new(Metadata::new("urn:uuid:binary-doc"), MemArchive::new());
    writer.start().unwrap();
    writer
        .next(&Node::new("urn:uuid:a1", NodeKind::Annotation).with_property("comment", json!("hi")))
        .unwrap();
    writer.close().unwrap();

    let mut reader = BinaryChunkReader::new(writer.into_sink().source());
    reader.read_header().unwrap();
    let chunk: Chunk = reader.read_chunk().unwrap().unwrap();
    assert_eq!(chunk.annotations().len(), 1);
    assert!(chunk.containers().is_empty());
    assert!(chunk.container_layers().is_empty());
    assert!(chunk.bdba_files().is_empty());
}
