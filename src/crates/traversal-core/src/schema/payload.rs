//! Property payloads for creation and update steps

use super::{Element, ElementSchema, GraphModel, PropertyDescriptor, ID_KEY};
use crate::error::{Result, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::type_name;

/// One property of a creation or update payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub key: String,
    /// Property value
    pub value: Value,
}

impl Property {
    /// Create a property
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Every declared, non-null property of `value`
pub(crate) fn creation_payload<T: Element>(model: &GraphModel, value: &T) -> Result<Vec<Property>> {
    let schema = model.schema_of::<T>()?;
    encode(schema, value, |_| true)
}

/// Declared, non-null properties of `value` that are not ignored on update
pub(crate) fn update_payload<T: Element>(model: &GraphModel, value: &T) -> Result<Vec<Property>> {
    let schema = model.schema_of::<T>()?;
    encode(schema, value, |p| !p.ignore_on_update)
}

fn encode<T: Element>(
    schema: &ElementSchema,
    value: &T,
    include: impl Fn(&PropertyDescriptor) -> bool,
) -> Result<Vec<Property>> {
    let mut object = match serde_json::to_value(value)? {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            return Err(SchemaError::NotAnObject {
                type_name: type_name::<T>().to_string(),
            }
            .into())
        }
    };
    object.remove(ID_KEY);

    let mut properties = Vec::with_capacity(schema.properties().len());
    for descriptor in schema.properties() {
        match object.remove(&descriptor.name) {
            Some(Value::Null) | None => {}
            Some(value) if include(descriptor) => {
                properties.push(Property::new(descriptor.name.clone(), value))
            }
            Some(_) => {}
        }
    }

    if let Some(key) = object.keys().next() {
        return Err(SchemaError::UndeclaredProperty {
            type_name: type_name::<T>().to_string(),
            property: key.clone(),
        }
        .into());
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraversalError;
    use crate::schema::{ElementId, VertexKind};
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Person {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<ElementId>,
        name: String,
        age: u32,
        phone_numbers: Option<Vec<String>>,
        partition_key: String,
    }

    impl Element for Person {
        type Kind = VertexKind;
        const LABEL: &'static str = "Person";
        const PROPERTIES: &'static [&'static str] =
            &["name", "age", "phone_numbers", "partition_key"];
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Loose {
        name: String,
        extra: u8,
    }

    impl Element for Loose {
        type Kind = VertexKind;
        const LABEL: &'static str = "Loose";
        const PROPERTIES: &'static [&'static str] = &["name"];
    }

    fn model() -> GraphModel {
        let mut builder = GraphModel::builder();
        builder.register_vertex::<Person>().unwrap();
        builder.register_vertex::<Loose>().unwrap();
        builder.ignore_on_update::<Person>("partition_key");
        builder.build().unwrap()
    }

    fn marko() -> Person {
        Person {
            id: Some(ElementId::from(1)),
            name: "Marko".into(),
            age: 29,
            phone_numbers: None,
            partition_key: "p".into(),
        }
    }

    #[test]
    fn test_creation_payload_orders_and_strips() {
        let payload = creation_payload(&model(), &marko()).unwrap();
        assert_eq!(
            payload,
            vec![
                Property::new("name", "Marko"),
                Property::new("age", 29),
                Property::new("partition_key", "p"),
            ]
        );
    }

    #[test]
    fn test_update_payload_skips_ignored() {
        let mut person = marko();
        person.phone_numbers = Some(vec!["+491234567".into()]);
        let payload = update_payload(&model(), &person).unwrap();
        let keys: Vec<_> = payload.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "age", "phone_numbers"]);
        assert_eq!(payload[2].value, json!(["+491234567"]));
    }

    #[test]
    fn test_undeclared_field_is_rejected() {
        let err = creation_payload(
            &model(),
            &Loose {
                name: "x".into(),
                extra: 1,
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TraversalError::Schema(SchemaError::UndeclaredProperty { ref property, .. }) if property == "extra"
        ));
    }
}
