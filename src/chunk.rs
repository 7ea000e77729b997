//! Chunks.
//!
//! A chunk is the reader-side reconstruction of one entry's contents: the
//! entry's nodes grouped by kind so a consumer can ask for, say, all File
//! nodes without scanning. Within each group the original write order is
//! preserved; grouping is a projection, not a reordering. A chunk never
//! spans entries.

use crate::node::{Node, NodeKind};
use std::collections::VecDeque;

/// The nodes of one entry, grouped by kind.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    projects: Vec<Node>,
    components: Vec<Node>,
    files: Vec<Node>,
    containers: Vec<Node>,
    container_layers: Vec<Node>,
    dependencies: Vec<Node>,
    annotations: Vec<Node>,
    bdba_files: Vec<Node>,
    arrival: Vec<NodeKind>,
}

impl Chunk {
    pub fn new() -> Self {
        Chunk::default()
    }

    /// Routes a node into its kind group, preserving arrival order.
    pub(crate) fn push(&mut self, node: Node) {
        self.arrival.push(node.kind);
        self.group_mut(node.kind).push(node);
    }

    pub fn projects(&self) -> &[Node] {
        &self.projects
    }

    pub fn components(&self) -> &[Node] {
        &self.components
    }

    pub fn files(&self) -> &[Node] {
        &self.files
    }

    pub fn containers(&self) -> &[Node] {
        &self.containers
    }

    pub fn container_layers(&self) -> &[Node] {
        &self.container_layers
    }

    pub fn dependencies(&self) -> &[Node] {
        &self.dependencies
    }

    pub fn annotations(&self) -> &[Node] {
        &self.annotations
    }

    pub fn bdba_files(&self) -> &[Node] {
        &self.bdba_files
    }

    /// The group for an arbitrary kind.
    pub fn nodes_of(&self, kind: NodeKind) -> &[Node] {
        match kind {
            NodeKind::Project => &self.projects,
            NodeKind::Component => &self.components,
            NodeKind::File => &self.files,
            NodeKind::Container => &self.containers,
            NodeKind::ContainerLayer => &self.container_layers,
            NodeKind::Dependency => &self.dependencies,
            NodeKind::Annotation => &self.annotations,
            NodeKind::BdbaFile => &self.bdba_files,
        }
    }

    pub fn len(&self) -> usize {
        self.arrival.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrival.is_empty()
    }

    /// Consumes the chunk, yielding every node in its original write order
    /// across all kind groups.
    pub fn into_nodes(self) -> Vec<Node> {
        let mut queues: [VecDeque<Node>; 8] = [
            self.projects.into(),
            self.components.into(),
            self.files.into(),
            self.containers.into(),
            self.container_layers.into(),
            self.dependencies.into(),
            self.annotations.into(),
            self.bdba_files.into(),
        ];
        self.arrival
            .into_iter()
            .filter_map(|kind| queues[group_index(kind)].pop_front())
            .collect()
    }

    fn group_mut(&mut self, kind: NodeKind) -> &mut Vec<Node> {
        match kind {
            NodeKind::Project => &mut self.projects,
            NodeKind::Component => &mut self.components,
            NodeKind::File => &mut self.files,
            NodeKind::Container => &mut self.containers,
            NodeKind::ContainerLayer => &mut self.container_layers,
            NodeKind::Dependency => &mut self.dependencies,
            NodeKind::Annotation => &mut self.annotations,
            NodeKind::BdbaFile => &mut self.bdba_files,
        }
    }
}

fn group_index(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Project => 0,
        NodeKind::Component => 1,
        NodeKind::File => 2,
        NodeKind::Container => 3,
        NodeKind::ContainerLayer => 4,
        NodeKind::Dependency => 5,
        NodeKind::Annotation => 6,
        NodeKind::BdbaFile => 7,
    }
}
