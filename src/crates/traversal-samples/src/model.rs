//! The social graph model

use serde::{Deserialize, Serialize};
use traversal_core::{EdgeKind, Element, ElementId, GraphModel, Result, VertexKind};

/// Partition every sample person is stored in
pub const PARTITION: &str = "people";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub name: String,
    pub age: u32,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<String>>,
    /// Fixed at creation
    #[serde(default)]
    pub partition_key: String,
}

impl Person {
    pub fn new(name: &str, age: u32, zip_code: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            age,
            zip_code: zip_code.to_string(),
            phone_numbers: None,
            partition_key: PARTITION.to_string(),
        }
    }

    pub fn with_phone_numbers(mut self, numbers: &[&str]) -> Self {
        self.phone_numbers = Some(numbers.iter().map(|n| n.to_string()).collect());
        self
    }
}

impl Element for Person {
    type Kind = VertexKind;
    const LABEL: &'static str = "Person";
    const PROPERTIES: &'static [&'static str] =
        &["name", "age", "zip_code", "phone_numbers", "partition_key"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Knows {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
}

impl Element for Knows {
    type Kind = EdgeKind;
    const LABEL: &'static str = "Knows";
    const PROPERTIES: &'static [&'static str] = &[];
}

/// Person and Knows, with the partition key left alone by updates
pub fn social_model() -> Result<GraphModel> {
    let mut model = GraphModel::builder();
    model.register_vertex::<Person>()?;
    model.register_edge::<Knows>()?;
    model.ignore_on_update::<Person>("partition_key");
    Ok(model.build()?)
}
