//! Result projection
//!
//! The engine answers with [`RawResult`]s; the [`Projector`] turns them into
//! typed values using the graph model. Elements whose label does not match
//! the expected type are dropped under [`ProjectionMode::Exclude`] (the
//! default) and reported as [`TraversalError::TypeFilterMismatch`] under
//! [`ProjectionMode::Strict`]. Decoding has no side effects.

use crate::error::{Result, TraversalError};
use crate::schema::{Element, ElementId, ElementKind, GraphModel, ID_KEY};
use crate::shape::Shape;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

/// One element as returned by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    /// Engine-assigned identifier
    pub id: ElementId,
    /// Element label
    pub label: String,
    /// Vertex or edge
    pub kind: ElementKind,
    /// Property values by name
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Source vertex, edges only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_v: Option<ElementId>,
    /// Target vertex, edges only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_v: Option<ElementId>,
}

impl RawElement {
    /// A raw vertex
    pub fn vertex(
        id: impl Into<ElementId>,
        label: impl Into<String>,
        properties: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ElementKind::Vertex,
            properties,
            out_v: None,
            in_v: None,
        }
    }

    /// A raw edge from `out_v` to `in_v`
    pub fn edge(
        id: impl Into<ElementId>,
        label: impl Into<String>,
        properties: Map<String, Value>,
        out_v: ElementId,
        in_v: ElementId,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind: ElementKind::Edge,
            properties,
            out_v: Some(out_v),
            in_v: Some(in_v),
        }
    }

    /// Value of one property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// One result emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum RawResult {
    /// A vertex or an edge
    Element(RawElement),
    /// A scalar or structured value
    Value(Value),
    /// A folded list
    List(Vec<RawResult>),
}

impl RawResult {
    /// Plain JSON rendering, elements included
    pub fn into_json(self) -> Result<Value> {
        Ok(match self {
            Self::Element(element) => serde_json::to_value(element)?,
            Self::Value(value) => value,
            Self::List(items) => Value::Array(
                items
                    .into_iter()
                    .map(RawResult::into_json)
                    .collect::<Result<_>>()?,
            ),
        })
    }

    fn variant(&self) -> &'static str {
        match self {
            Self::Element(_) => "element",
            Self::Value(_) => "value",
            Self::List(_) => "list",
        }
    }
}

/// How label mismatches are handled while decoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// Drop mismatching elements from the output
    #[default]
    Exclude,
    /// Fail with a type filter mismatch
    Strict,
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exclude => f.write_str("exclude"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for ProjectionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exclude" => Ok(Self::Exclude),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown projection mode '{}'", other)),
        }
    }
}

/// Decodes raw results into typed values
#[derive(Debug, Clone)]
pub struct Projector {
    model: Arc<GraphModel>,
    mode: ProjectionMode,
}

impl Projector {
    /// Create a projector over `model`
    pub fn new(model: Arc<GraphModel>, mode: ProjectionMode) -> Self {
        Self { model, mode }
    }

    /// Active projection mode
    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    /// Decode `raw` as shape `S`; `None` means the result was filtered out
    pub fn decode<S: Shape>(&self, raw: RawResult) -> Result<Option<S::Output>> {
        S::decode(raw, self)
    }

    /// Decode a typed element
    pub fn decode_element<T: Element>(&self, raw: RawResult) -> Result<Option<T>> {
        let element = self.expect_element(raw)?;
        let expected = self.model.label_of::<T>()?;

        if element.kind != expected.kind || element.label != expected.label {
            return match self.mode {
                ProjectionMode::Exclude => {
                    trace!(expected = %expected.label, found = %element.label, "Excluding element");
                    Ok(None)
                }
                ProjectionMode::Strict => Err(TraversalError::TypeFilterMismatch {
                    expected: expected.label.clone(),
                    found: element.label,
                }),
            };
        }

        let mut object = element.properties;
        object.insert(ID_KEY.to_string(), serde_json::to_value(&element.id)?);
        serde_json::from_value(Value::Object(object))
            .map(Some)
            .map_err(|e| {
                TraversalError::Decoding(format!("cannot decode '{}': {}", expected.label, e))
            })
    }

    /// Decode an element of any label of `kind`
    pub fn decode_any(&self, raw: RawResult, kind: ElementKind) -> Result<RawElement> {
        let element = self.expect_element(raw)?;
        if element.kind != kind {
            return Err(TraversalError::Decoding(format!(
                "expected a {}, found {} '{}'",
                kind, element.kind, element.label
            )));
        }
        Ok(element)
    }

    /// Decode a plain value
    pub fn decode_value<V: DeserializeOwned>(&self, raw: RawResult) -> Result<V> {
        let json = raw.into_json()?;
        serde_json::from_value(json).map_err(|e| TraversalError::Decoding(e.to_string()))
    }

    /// Decode a folded list, dropping filtered items
    pub fn decode_list<S: Shape>(&self, raw: RawResult) -> Result<Vec<S::Output>> {
        match raw {
            RawResult::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(value) = S::decode(item, self)? {
                        out.push(value);
                    }
                }
                Ok(out)
            }
            other => Err(TraversalError::Decoding(format!(
                "expected a list, found {}",
                other.variant()
            ))),
        }
    }

    fn expect_element(&self, raw: RawResult) -> Result<RawElement> {
        match raw {
            RawResult::Element(element) => Ok(element),
            other => Err(TraversalError::Decoding(format!(
                "expected an element, found {}",
                other.variant()
            ))),
        }
    }
}
