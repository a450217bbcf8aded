//! Common test model and a scripted channel

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use traversal_core::{
    EdgeKind, Element, ElementId, GraphChannel, GraphEnvironment, GraphModel, RawElement,
    RawResult, RawResultStream, Result, TraversalError, TraversalRequest, VertexKind,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub name: String,
    pub age: u32,
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_numbers: Option<Vec<String>>,
    #[serde(default)]
    pub partition_key: String,
}

impl Element for Person {
    type Kind = VertexKind;
    const LABEL: &'static str = "Person";
    const PROPERTIES: &'static [&'static str] =
        &["name", "age", "zip_code", "phone_numbers", "partition_key"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Software {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ElementId>,
    pub name: String,
}

impl Element for Software {
    type Kind = VertexKind;
    const LABEL: &'static str = "Software";
    const PROPERTIES: &'static [&'static str] = &["name"];
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unregistered {
    pub name: String,
}

impl Element for Unregistered {
    type Kind = VertexKind;
    const LABEL: &'static str = "Unregistered";
    const PROPERTIES: &'static [&'static str] = &["name"];
}

pub fn model() -> GraphModel {
    let mut builder = GraphModel::builder();
    builder.register_vertex::<Person>().unwrap();
    builder.register_vertex::<Software>().unwrap();
    builder.register_edge::<Knows>().unwrap();
    builder.ignore_on_update::<Person>("partition_key");
    builder.build().unwrap()
}

pub fn person(name: &str, age: u32, zip_code: &str) -> Person {
    Person {
        id: None,
        name: name.to_string(),
        age,
        zip_code: zip_code.to_string(),
        phone_numbers: None,
        partition_key: "p".to_string(),
    }
}

pub fn raw_person(id: i64, name: &str, zip_code: &str) -> RawResult {
    let properties: Map<String, Value> = match json!({
        "name": name,
        "age": 30,
        "zip_code": zip_code,
        "partition_key": "p",
    }) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    RawResult::Element(RawElement::vertex(id, "Person", properties))
}

pub fn raw_software(id: i64, name: &str) -> RawResult {
    let mut properties = Map::new();
    properties.insert("name".to_string(), json!(name));
    RawResult::Element(RawElement::vertex(id, "Software", properties))
}

/// What the scripted channel does with a request
#[derive(Clone)]
pub enum Script {
    /// Refuse to submit
    Refuse(String),
    /// Stream the items, then end
    Respond(Vec<std::result::Result<RawResult, (u16, String)>>),
    /// Stream the items, then never end
    Hang(Vec<RawResult>),
}

/// Channel answering every request with the same script
pub struct ScriptedChannel {
    script: Script,
    pub requests: Arc<Mutex<Vec<TraversalRequest>>>,
}

impl ScriptedChannel {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl GraphChannel for ScriptedChannel {
    async fn send(&self, request: TraversalRequest) -> Result<RawResultStream> {
        self.requests.lock().unwrap().push(request);
        match self.script.clone() {
            Script::Refuse(message) => Err(TraversalError::Transport(message)),
            Script::Respond(items) => Ok(Box::pin(stream::iter(items.into_iter().map(
                |item| item.map_err(|(code, message)| TraversalError::server(code, message)),
            )))),
            Script::Hang(items) => Ok(Box::pin(
                stream::iter(items.into_iter().map(Ok)).chain(stream::pending()),
            )),
        }
    }
}

/// Environment over a scripted channel, returning the request log too
pub fn scripted(script: Script) -> (GraphEnvironment, Arc<Mutex<Vec<TraversalRequest>>>) {
    let channel = ScriptedChannel::new(script);
    let requests = channel.requests.clone();
    let env = GraphEnvironment::builder(model())
        .with_channel(channel)
        .build()
        .unwrap();
    (env, requests)
}
