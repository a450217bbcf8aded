//! Vertex and edge storage

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use traversal_core::{Direction, ElementId, ElementKind, Property, RawElement};

#[derive(Debug, Clone)]
pub(crate) struct VertexRecord {
    pub label: String,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub(crate) struct EdgeRecord {
    pub label: String,
    pub properties: Map<String, Value>,
    pub out_v: i64,
    pub in_v: i64,
}

/// Graph contents; identifiers are shared between vertices and edges
#[derive(Debug, Default)]
pub(crate) struct GraphData {
    next_id: i64,
    vertices: BTreeMap<i64, VertexRecord>,
    edges: BTreeMap<i64, EdgeRecord>,
}

fn apply(target: &mut Map<String, Value>, properties: &[Property]) {
    for property in properties {
        target.insert(property.key.clone(), property.value.clone());
    }
}

impl GraphData {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn ids(&self, kind: ElementKind) -> Vec<i64> {
        match kind {
            ElementKind::Vertex => self.vertices.keys().copied().collect(),
            ElementKind::Edge => self.edges.keys().copied().collect(),
        }
    }

    pub fn contains(&self, kind: ElementKind, id: &ElementId) -> Option<i64> {
        let ElementId::Int(id) = id else {
            return None;
        };
        let present = match kind {
            ElementKind::Vertex => self.vertices.contains_key(id),
            ElementKind::Edge => self.edges.contains_key(id),
        };
        present.then_some(*id)
    }

    pub fn vertex(&self, id: i64) -> Option<&VertexRecord> {
        self.vertices.get(&id)
    }

    pub fn edge(&self, id: i64) -> Option<&EdgeRecord> {
        self.edges.get(&id)
    }

    pub fn label(&self, kind: ElementKind, id: i64) -> Option<&str> {
        match kind {
            ElementKind::Vertex => self.vertex(id).map(|v| v.label.as_str()),
            ElementKind::Edge => self.edge(id).map(|e| e.label.as_str()),
        }
    }

    pub fn properties(&self, kind: ElementKind, id: i64) -> Option<&Map<String, Value>> {
        match kind {
            ElementKind::Vertex => self.vertex(id).map(|v| &v.properties),
            ElementKind::Edge => self.edge(id).map(|e| &e.properties),
        }
    }

    pub fn add_vertex(&mut self, label: &str, properties: &[Property]) -> i64 {
        let id = self.allocate();
        let mut record = VertexRecord {
            label: label.to_string(),
            properties: Map::new(),
        };
        apply(&mut record.properties, properties);
        self.vertices.insert(id, record);
        id
    }

    pub fn add_edge(&mut self, label: &str, properties: &[Property], out_v: i64, in_v: i64) -> i64 {
        let id = self.allocate();
        let mut record = EdgeRecord {
            label: label.to_string(),
            properties: Map::new(),
            out_v,
            in_v,
        };
        apply(&mut record.properties, properties);
        self.edges.insert(id, record);
        id
    }

    pub fn update(&mut self, kind: ElementKind, id: i64, properties: &[Property]) {
        let target = match kind {
            ElementKind::Vertex => self.vertices.get_mut(&id).map(|v| &mut v.properties),
            ElementKind::Edge => self.edges.get_mut(&id).map(|e| &mut e.properties),
        };
        if let Some(target) = target {
            apply(target, properties);
        }
    }

    /// Remove an element; removing a vertex removes its edges
    pub fn remove(&mut self, kind: ElementKind, id: i64) {
        match kind {
            ElementKind::Vertex => {
                if self.vertices.remove(&id).is_some() {
                    self.edges.retain(|_, e| e.out_v != id && e.in_v != id);
                }
            }
            ElementKind::Edge => {
                self.edges.remove(&id);
            }
        }
    }

    /// Edges incident to `vertex` in `direction`, outgoing before incoming
    pub fn incident(&self, vertex: i64, direction: Direction, labels: &[String]) -> Vec<i64> {
        let matches = |edge: &EdgeRecord| labels.is_empty() || labels.contains(&edge.label);
        let outgoing = self
            .edges
            .iter()
            .filter(|(_, e)| e.out_v == vertex && matches(e))
            .map(|(id, _)| *id);
        let incoming = self
            .edges
            .iter()
            .filter(|(_, e)| e.in_v == vertex && matches(e))
            .map(|(id, _)| *id);
        match direction {
            Direction::Out => outgoing.collect(),
            Direction::In => incoming.collect(),
            Direction::Both => outgoing.chain(incoming).collect(),
        }
    }

    pub fn raw(&self, kind: ElementKind, id: i64) -> Option<RawElement> {
        match kind {
            ElementKind::Vertex => self
                .vertex(id)
                .map(|v| RawElement::vertex(id, v.label.clone(), v.properties.clone())),
            ElementKind::Edge => self.edge(id).map(|e| {
                RawElement::edge(
                    id,
                    e.label.clone(),
                    e.properties.clone(),
                    ElementId::Int(e.out_v),
                    ElementId::Int(e.in_v),
                )
            }),
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.edges.clear();
    }
}
