//! Result shapes
//!
//! A [`Shape`] is the type-level description of what a traversal is
//! currently positioned on. Domain element types are shapes themselves;
//! [`AnyVertex`] and [`AnyEdge`] stand for elements of unknown label,
//! [`Val`] for plain values and [`Folded`] for aggregated lists.
//!
//! The `Kind` associated type gates builder methods at compile time: walking
//! edges needs `Kind = VertexKind`, moving to endpoints needs
//! `Kind = EdgeKind`. Label-level narrowing cannot be expressed in types, so
//! the builder also tracks a runtime [`ShapeInfo`].

use crate::error::{Result, TraversalError};
use crate::projector::{Projector, RawElement, RawResult};
use crate::schema::{EdgeKind, Element, ElementKind, GraphModel, VertexKind, ID_KEY, LABEL_KEY};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::marker::PhantomData;

/// Marker kind of plain values
#[derive(Debug, Clone, Copy)]
pub struct ValueKind;

/// Marker kind of folded lists
#[derive(Debug, Clone, Copy)]
pub struct ListKind;

/// Marker kind of a traversal that has not selected anything yet
#[derive(Debug, Clone, Copy)]
pub struct StartKind;

/// What a traversal is positioned on, and how its results decode
pub trait Shape: Send + Sync + 'static {
    /// [`VertexKind`], [`EdgeKind`], [`ValueKind`], [`ListKind`] or [`StartKind`]
    type Kind: Send + Sync + 'static;

    /// Decoded result type
    type Output: Send + 'static;

    /// Decode one raw result; `Ok(None)` drops it from the output
    fn decode(raw: RawResult, projector: &Projector) -> Result<Option<Self::Output>>;
}

impl<T: Element> Shape for T {
    type Kind = T::Kind;
    type Output = T;

    fn decode(raw: RawResult, projector: &Projector) -> Result<Option<T>> {
        projector.decode_element::<T>(raw)
    }
}

/// Vertex of any label
#[derive(Debug, Clone, Copy)]
pub struct AnyVertex;

impl Shape for AnyVertex {
    type Kind = VertexKind;
    type Output = RawElement;

    fn decode(raw: RawResult, projector: &Projector) -> Result<Option<RawElement>> {
        projector.decode_any(raw, ElementKind::Vertex).map(Some)
    }
}

/// Edge of any label
#[derive(Debug, Clone, Copy)]
pub struct AnyEdge;

impl Shape for AnyEdge {
    type Kind = EdgeKind;
    type Output = RawElement;

    fn decode(raw: RawResult, projector: &Projector) -> Result<Option<RawElement>> {
        projector.decode_any(raw, ElementKind::Edge).map(Some)
    }
}

/// Plain value of type `V`
pub struct Val<V>(PhantomData<fn() -> V>);

impl<V: DeserializeOwned + Send + 'static> Shape for Val<V> {
    type Kind = ValueKind;
    type Output = V;

    fn decode(raw: RawResult, projector: &Projector) -> Result<Option<V>> {
        projector.decode_value(raw).map(Some)
    }
}

/// Every result of shape `S` gathered into one list
pub struct Folded<S>(PhantomData<fn() -> S>);

impl<S: Shape> Shape for Folded<S> {
    type Kind = ListKind;
    type Output = Vec<S::Output>;

    fn decode(raw: RawResult, projector: &Projector) -> Result<Option<Self::Output>> {
        projector.decode_list::<S>(raw).map(Some)
    }
}

/// Nothing selected yet
#[derive(Debug, Clone, Copy)]
pub struct Start;

impl Shape for Start {
    type Kind = StartKind;
    type Output = RawResult;

    fn decode(raw: RawResult, _projector: &Projector) -> Result<Option<RawResult>> {
        Ok(Some(raw))
    }
}

/// Runtime view of the current shape, used for label-level checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShapeInfo {
    Start,
    Elements {
        kind: ElementKind,
        /// `None` stands for any label of `kind`
        labels: Option<BTreeSet<String>>,
    },
    Value,
    Folded(Box<ShapeInfo>),
}

impl ShapeInfo {
    pub(crate) fn any(kind: ElementKind) -> Self {
        Self::Elements { kind, labels: None }
    }

    pub(crate) fn exactly(kind: ElementKind, label: impl Into<String>) -> Self {
        Self::Elements {
            kind,
            labels: Some(BTreeSet::from([label.into()])),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Start => "start".to_string(),
            Self::Elements { kind, labels: None } => format!("any {}", kind),
            Self::Elements {
                labels: Some(labels),
                ..
            } => format!("[{}]", labels.iter().cloned().collect::<Vec<_>>().join(", ")),
            Self::Value => "value".to_string(),
            Self::Folded(inner) => format!("folded {}", inner.describe()),
        }
    }

    /// Narrow to `label`, failing when it is outside the candidate set
    pub(crate) fn narrow(&self, kind: ElementKind, label: &str) -> Result<Self> {
        match self {
            Self::Elements {
                kind: current,
                labels,
            } if *current == kind => match labels {
                Some(labels) if !labels.contains(label) => {
                    Err(TraversalError::type_mismatch(self.describe(), label))
                }
                _ => Ok(Self::exactly(kind, label)),
            },
            _ => Err(TraversalError::type_mismatch(self.describe(), label)),
        }
    }

    /// Check that at least one candidate declares `key`
    pub(crate) fn check_property(&self, model: &GraphModel, key: &str) -> Result<()> {
        let declared = match self {
            Self::Elements { .. } if key == ID_KEY || key == LABEL_KEY => true,
            Self::Elements { kind, labels: None } => model
                .labels(*kind)
                .filter_map(|label| model.schema_for_label(label))
                .any(|schema| schema.has_property(key)),
            Self::Elements {
                labels: Some(labels),
                ..
            } => labels
                .iter()
                .filter_map(|label| model.schema_for_label(label))
                .any(|schema| schema.has_property(key)),
            _ => false,
        };
        if declared {
            Ok(())
        } else {
            Err(TraversalError::UnknownProperty {
                shape: self.describe(),
                property: key.to_string(),
            })
        }
    }
}
