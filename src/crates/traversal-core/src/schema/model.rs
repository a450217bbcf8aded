//! Graph model: the registry mapping domain types to labels and properties
//!
//! The model is assembled once at configuration time through a
//! [`GraphModelBuilder`] and is read-only afterwards. Builders and the result
//! projector share it behind an `Arc`.
//!
//! ```rust,ignore
//! let mut builder = GraphModel::builder();
//! builder.register_vertex::<Person>()?;
//! builder.register_edge::<Knows>()?;
//! builder.ignore_on_update::<Person>("partition_key");
//! let model = builder.build()?;
//!
//! let props = model.describe_properties::<Person>()?;
//! ```

use super::{Element, ElementKind, Edge, KindMarker, Vertex, ID_KEY, LABEL_KEY};
use crate::error::SchemaError;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use tracing::debug;

/// Identity of a registered element type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDescriptor {
    /// Graph label
    pub label: String,
    /// Vertex or edge
    pub kind: ElementKind,
    /// Rust type name, for diagnostics
    pub type_name: String,
}

/// One property of a registered element type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Serialised property name
    pub name: String,
    /// Whether the property is left out of update payloads
    pub ignore_on_update: bool,
}

/// Everything the model knows about a single element type
#[derive(Debug, Clone)]
pub struct ElementSchema {
    type_id: TypeId,
    label: LabelDescriptor,
    properties: Vec<PropertyDescriptor>,
}

impl ElementSchema {
    /// Label descriptor of this type
    pub fn label(&self) -> &LabelDescriptor {
        &self.label
    }

    /// Element kind of this type
    pub fn kind(&self) -> ElementKind {
        self.label.kind
    }

    /// Ordered property descriptors
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Whether the type declares `name`
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    /// Properties included in update payloads, in declaration order
    pub fn update_properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.iter().filter(|p| !p.ignore_on_update)
    }
}

/// Registration request for one domain type
///
/// Produced from the type itself ([`ElementDescriptor::of`]) or handed over by
/// an external type registry.
#[derive(Debug, Clone)]
pub struct ElementDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    label: &'static str,
    kind: ElementKind,
    properties: &'static [&'static str],
}

impl ElementDescriptor {
    /// Describe a domain type
    pub fn of<T: Element>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            label: T::LABEL,
            kind: <T::Kind as KindMarker>::KIND,
            properties: T::PROPERTIES,
        }
    }

    /// Rust type name of the described type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declared label
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Declared kind
    pub fn kind(&self) -> ElementKind {
        self.kind
    }
}

/// Builder for a [`GraphModel`]
#[derive(Debug, Default)]
pub struct GraphModelBuilder {
    elements: Vec<ElementSchema>,
    by_type: HashMap<TypeId, usize>,
    by_label: HashMap<String, usize>,
    ignored: Vec<(TypeId, &'static str, String)>,
}

impl GraphModelBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type described by `descriptor`
    ///
    /// Registering the same type twice returns the existing descriptor. Two
    /// distinct types resolving to one label is a [`SchemaError::DuplicateLabel`].
    pub fn register(
        &mut self,
        descriptor: ElementDescriptor,
    ) -> Result<LabelDescriptor, SchemaError> {
        if let Some(&index) = self.by_type.get(&descriptor.type_id) {
            return Ok(self.elements[index].label.clone());
        }

        let type_name = descriptor.type_name.to_string();
        if descriptor.label.trim().is_empty() {
            return Err(SchemaError::EmptyLabel { type_name });
        }
        if descriptor.label == ID_KEY || descriptor.label == LABEL_KEY {
            return Err(SchemaError::ReservedName {
                type_name,
                name: descriptor.label.to_string(),
            });
        }
        if let Some(&index) = self.by_label.get(descriptor.label) {
            return Err(SchemaError::DuplicateLabel {
                label: descriptor.label.to_string(),
                first: self.elements[index].label.type_name.clone(),
                second: type_name,
            });
        }

        let mut properties: Vec<PropertyDescriptor> =
            Vec::with_capacity(descriptor.properties.len());
        for &name in descriptor.properties {
            if name == ID_KEY || name == LABEL_KEY {
                return Err(SchemaError::ReservedName {
                    type_name,
                    name: name.to_string(),
                });
            }
            if properties.iter().any(|p| p.name == name) {
                return Err(SchemaError::DuplicateProperty {
                    type_name,
                    property: name.to_string(),
                });
            }
            properties.push(PropertyDescriptor {
                name: name.to_string(),
                ignore_on_update: false,
            });
        }

        let label = LabelDescriptor {
            label: descriptor.label.to_string(),
            kind: descriptor.kind,
            type_name,
        };
        debug!(label = %label.label, kind = %label.kind, "Registered element type");

        let index = self.elements.len();
        self.by_type.insert(descriptor.type_id, index);
        self.by_label.insert(label.label.clone(), index);
        self.elements.push(ElementSchema {
            type_id: descriptor.type_id,
            label: label.clone(),
            properties,
        });
        Ok(label)
    }

    /// Register a descriptor that must be of `expected` kind
    pub fn register_as(
        &mut self,
        descriptor: ElementDescriptor,
        expected: ElementKind,
    ) -> Result<LabelDescriptor, SchemaError> {
        if descriptor.kind != expected {
            return Err(SchemaError::UnrecognizedKind {
                type_name: descriptor.type_name.to_string(),
                expected: expected.to_string(),
                found: descriptor.kind.to_string(),
            });
        }
        self.register(descriptor)
    }

    /// Register a vertex type
    pub fn register_vertex<T: Vertex>(&mut self) -> Result<LabelDescriptor, SchemaError> {
        self.register_as(ElementDescriptor::of::<T>(), ElementKind::Vertex)
    }

    /// Register an edge type
    pub fn register_edge<T: Edge>(&mut self) -> Result<LabelDescriptor, SchemaError> {
        self.register_as(ElementDescriptor::of::<T>(), ElementKind::Edge)
    }

    /// Register every vertex and edge type supplied by an external registry
    ///
    /// Each descriptor is checked against the slot it was supplied in, so a
    /// registry listing an edge type among its vertex types fails with
    /// [`SchemaError::UnrecognizedKind`].
    pub fn from_base_types<V, E>(
        &mut self,
        vertices: V,
        edges: E,
    ) -> Result<Vec<LabelDescriptor>, SchemaError>
    where
        V: IntoIterator<Item = ElementDescriptor>,
        E: IntoIterator<Item = ElementDescriptor>,
    {
        let mut labels = Vec::new();
        for descriptor in vertices {
            labels.push(self.register_as(descriptor, ElementKind::Vertex)?);
        }
        for descriptor in edges {
            labels.push(self.register_as(descriptor, ElementKind::Edge)?);
        }
        Ok(labels)
    }

    /// Exclude `property` of `T` from update payloads
    ///
    /// Validated when the model is built.
    pub fn ignore_on_update<T: Element>(&mut self, property: impl Into<String>) -> &mut Self {
        self.ignored
            .push((TypeId::of::<T>(), type_name::<T>(), property.into()));
        self
    }

    /// Finish the model
    pub fn build(mut self) -> Result<GraphModel, SchemaError> {
        for (type_id, type_name, property) in std::mem::take(&mut self.ignored) {
            let index = *self.by_type.get(&type_id).ok_or_else(|| {
                SchemaError::NotRegistered {
                    type_name: type_name.to_string(),
                }
            })?;
            let descriptor = self.elements[index]
                .properties
                .iter_mut()
                .find(|p| p.name == property)
                .ok_or_else(|| SchemaError::UnknownPropertyConfig {
                    type_name: type_name.to_string(),
                    property: property.clone(),
                })?;
            descriptor.ignore_on_update = true;
        }

        Ok(GraphModel {
            elements: self.elements,
            by_type: self.by_type,
            by_label: self.by_label,
        })
    }
}

/// Read-only mapping from domain types to labels and property descriptors
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    elements: Vec<ElementSchema>,
    by_type: HashMap<TypeId, usize>,
    by_label: HashMap<String, usize>,
}

impl GraphModel {
    /// Start building a model
    pub fn builder() -> GraphModelBuilder {
        GraphModelBuilder::new()
    }

    /// A model with no registered types
    pub fn empty() -> Self {
        Self::default()
    }

    /// Schema of a registered type
    pub fn schema_of<T: Element>(&self) -> Result<&ElementSchema, SchemaError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .map(|&index| &self.elements[index])
            .ok_or_else(|| SchemaError::NotRegistered {
                type_name: type_name::<T>().to_string(),
            })
    }

    /// Label descriptor of a registered type
    pub fn label_of<T: Element>(&self) -> Result<&LabelDescriptor, SchemaError> {
        self.schema_of::<T>().map(ElementSchema::label)
    }

    /// Ordered property descriptors of a registered type
    pub fn describe_properties<T: Element>(&self) -> Result<&[PropertyDescriptor], SchemaError> {
        self.schema_of::<T>().map(ElementSchema::properties)
    }

    /// Schema registered under `label`
    pub fn schema_for_label(&self, label: &str) -> Option<&ElementSchema> {
        self.by_label.get(label).map(|&index| &self.elements[index])
    }

    /// Labels of every registered type of `kind`, in registration order
    pub fn labels(&self, kind: ElementKind) -> impl Iterator<Item = &str> {
        self.elements
            .iter()
            .filter(move |e| e.kind() == kind)
            .map(|e| e.label.label.as_str())
    }

    /// Whether `T` was registered
    pub fn contains<T: Element>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no type is registered
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub(crate) fn type_id_of(&self, label: &str) -> Option<TypeId> {
        self.schema_for_label(label).map(|s| s.type_id)
    }
}
