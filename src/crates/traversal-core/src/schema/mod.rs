//! Domain types and the graph model they are registered in
//!
//! A domain type becomes a graph element by implementing [`Element`]. The
//! associated `Kind` marker decides whether it is a vertex or an edge, which
//! the traversal builder uses to gate operations at compile time:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use traversal_core::schema::{Element, ElementId, VertexKind};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Person {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     id: Option<ElementId>,
//!     name: String,
//!     age: u32,
//! }
//!
//! impl Element for Person {
//!     type Kind = VertexKind;
//!     const LABEL: &'static str = "Person";
//!     const PROPERTIES: &'static [&'static str] = &["name", "age"];
//! }
//! ```
//!
//! The identifier is assigned by the engine. It is absent on values that have
//! not been created yet and is never part of a property payload.

mod model;
mod payload;

pub use model::{
    ElementDescriptor, ElementSchema, GraphModel, GraphModelBuilder, LabelDescriptor,
    PropertyDescriptor,
};
pub use payload::Property;
pub(crate) use payload::{creation_payload, update_payload};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key under which the engine-assigned identifier travels
pub const ID_KEY: &str = "id";

/// Key reserved for the element label
pub const LABEL_KEY: &str = "label";

/// Opaque, engine-assigned element identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementId {
    /// Numeric identifier
    Int(i64),
    /// String identifier
    Str(String),
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Str(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for ElementId {
    fn from(id: i32) -> Self {
        Self::Int(i64::from(id))
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

impl From<&ElementId> for ElementId {
    fn from(id: &ElementId) -> Self {
        id.clone()
    }
}

/// The two element kinds of a property graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Graph node
    Vertex,
    /// Directed relation between two vertices
    Edge,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Edge => f.write_str("edge"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Type-level element kind, implemented only by [`VertexKind`] and [`EdgeKind`]
pub trait KindMarker: sealed::Sealed + Send + Sync + 'static {
    /// Runtime counterpart of the marker
    const KIND: ElementKind;
}

/// Marker for vertex types
#[derive(Debug, Clone, Copy)]
pub struct VertexKind;

/// Marker for edge types
#[derive(Debug, Clone, Copy)]
pub struct EdgeKind;

impl sealed::Sealed for VertexKind {}
impl sealed::Sealed for EdgeKind {}

impl KindMarker for VertexKind {
    const KIND: ElementKind = ElementKind::Vertex;
}

impl KindMarker for EdgeKind {
    const KIND: ElementKind = ElementKind::Edge;
}

/// A domain type stored in the graph as a vertex or an edge
///
/// `PROPERTIES` lists the serialised field names in payload order. The `id`
/// field, when present, is filled from the engine-assigned identifier during
/// decoding and must not be listed.
pub trait Element: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// [`VertexKind`] or [`EdgeKind`]
    type Kind: KindMarker;

    /// Graph label this type maps to
    const LABEL: &'static str;

    /// Ordered property names
    const PROPERTIES: &'static [&'static str];
}

/// Vertex domain types
pub trait Vertex: Element<Kind = VertexKind> {}

impl<T: Element<Kind = VertexKind>> Vertex for T {}

/// Edge domain types
pub trait Edge: Element<Kind = EdgeKind> {}

impl<T: Element<Kind = EdgeKind>> Edge for T {}
