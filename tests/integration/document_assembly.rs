//! End-to-end document assembly: metadata fragment accumulation across
//! entries and standalone payload reads.

use bdio::{
    BdioError, DocumentAssembler, EntrySink, InputShape, MemArchive, Metadata, Node, NodeKind,
};
use serde_json::json;

#[test]
fn test_metadata_fragments_accumulate_across_entries() {
    // Entries hand-written with fragment identifiers and disjoint fields,
    // the way a multi-producer pipeline leaves them
    let mut archive = MemArchive::new();
    archive.start_entry("bdio-header.jsonld").unwrap();
    archive
        .write(br#"{"@id":"urn:uuid:abc#scan","creator":"alice","@graph":[]}"#)
        .unwrap();
    archive.start_entry("bdio-entry-00.jsonld").unwrap();
    archive
        .write(
            br#"{"@id":"urn:uuid:abc","creator":"@build-host","publisher":"scanner/2.0","@graph":[{"@id":"f1","@type":"File","path":"a"}]}"#,
        )
        .unwrap();
    archive.close().unwrap();

    let assembler = DocumentAssembler::new();
    let mut reader = assembler.reader(archive.source());
    assert_eq!(reader.header().unwrap().id(), "urn:uuid:abc#scan");

    let chunk = reader.next_chunk().unwrap().unwrap();
    assert_eq!(chunk.files().len(), 1);
    assert!(reader.next_chunk().unwrap().is_none());

    let merged = reader.metadata().unwrap();
    // Non-fragment identifier wins, creator halves combine, publisher joins
    assert_eq!(merged.id(), "urn:uuid:abc");
    let creator = merged.creator.as_ref().unwrap();
    assert_eq!(creator.user.as_deref(), Some("alice"));
    assert_eq!(creator.host.as_deref(), Some("build-host"));
    assert_eq!(merged.publishers.len(), 1);
    assert_eq!(merged.publishers[0].name, "scanner");
}

#[test]
fn test_incompatible_entry_identifier_is_fatal() {
    let mut archive = MemArchive::new();
    archive.start_entry("bdio-header.jsonld").unwrap();
    archive
        .write(br#"{"@id":"urn:uuid:abc","@graph":[]}"#)
        .unwrap();
    archive.start_entry("bdio-entry-00.jsonld").unwrap();
    archive
        .write(br#"{"@id":"urn:uuid:other","@graph":[]}"#)
        .unwrap();
    archive.close().unwrap();

    let mut reader = DocumentAssembler::new().reader(archive.source());
    reader.header().unwrap();
    assert!(matches!(
        reader.next_chunk(),
        Err(BdioError::MetadataMismatch { .. })
    ));
}

#[test]
fn test_entry_bytes_are_standalone_payloads() {
    // Any data entry of a written document is itself a well-formed
    // standalone payload
    let assembler = DocumentAssembler::new();
    let mut writer = assembler
        .writer(Metadata::new("urn:uuid:abc"), MemArchive::new())
        .unwrap();
    writer.start().unwrap();
    writer
        .next(&Node::new("urn:uuid:f1", NodeKind::File).with_property("path", json!("src/a.rs")))
        .unwrap();
    writer
        .next(&Node::new("urn:uuid:f2", NodeKind::File).with_property("path", json!("src/b.rs")))
        .unwrap();
    writer.close().unwrap();

    let archive = writer.into_sink();
    let entry = archive.entry("bdio-entry-00.jsonld").unwrap();
    assert_eq!(bdio::sniff(entry), InputShape::Graph);

    let (metadata, chunk) = assembler.read_graph(entry).unwrap();
    assert_eq!(metadata.id(), "urn:uuid:abc");
    assert_eq!(chunk.files().len(), 2);
}

#[test]
fn test_sniffed_legacy_shape_is_surfaced() {
    let legacy = br#"[{"@type":"BillOfMaterials","spdx:name":"demo"}]"#;
    assert_eq!(bdio::sniff(legacy), InputShape::LegacyBom);
    // The assembler refuses to parse it, leaving adapter selection to the
    // caller who sniffed
    assert!(matches!(
        DocumentAssembler::new().read_graph(legacy),
        Err(BdioError::FramingSyntax(_))
    ));
}

#[test]
fn test_unknown_node_type_in_payload_is_malformed() {
    let payload = br#"{"@id":"urn:uuid:abc","@graph":[{"@id":"w1","@type":"Widget"}]}"#;
    assert!(matches!(
        DocumentAssembler::new().read_graph(payload),
        Err(BdioError::FramingSyntax(_))
    ));
}
