//! Social graph used by the engine tests

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use traversal_core::{
    EdgeKind, Element, ElementId, GraphEnvironment, GraphModel, Result, VertexKind,
};
use traversal_memory::InMemoryGraph;

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

pub fn person(name: &str, age: u32, zip_code: &str) -> Person {
    Person {
        id: None,
        name: name.to_string(),
        age,
        zip_code: zip_code.to_string(),
        phone_numbers: None,
        partition_key: "people".to_string(),
    }
}

pub fn environment(graph: &InMemoryGraph) -> GraphEnvironment {
    let mut model = GraphModel::builder();
    model.register_vertex::<Person>().unwrap();
    model.register_edge::<Knows>().unwrap();
    model.ignore_on_update::<Person>("partition_key");
    GraphEnvironment::builder(model.build().unwrap())
        .with_channel(graph.clone())
        .build()
        .unwrap()
}

/// The people of the social graph, with their assigned identifiers
pub struct People {
    pub marko: Person,
    pub vadas: Person,
    pub josh: Person,
    pub peter: Person,
    pub daniel: Person,
}

impl People {
    pub fn id_of(person: &Person) -> ElementId {
        person.id.clone().expect("created people have identifiers")
    }
}

pub async fn add(env: &GraphEnvironment, person: Person) -> Result<Person> {
    Ok(env
        .g()
        .add_v(&person)?
        .first()
        .await?
        .expect("add_v yields the created vertex"))
}

pub async fn knows(env: &GraphEnvironment, from: &Person, to: &Person) -> Result<Knows> {
    let to = People::id_of(to);
    Ok(env
        .g()
        .v_of::<Person>(People::id_of(from))?
        .add_e(&Knows::default())?
        .to(|t| t.v_of::<Person>(to))?
        .first()
        .await?
        .expect("add_e yields the created edge"))
}

/// Marko, Vadas, Josh, Peter and Daniel; Marko knows Vadas and Josh
pub async fn seed(env: &GraphEnvironment) -> Result<People> {
    env.g().v_all().drop().to_list().await?;

    let marko = add(env, person("Marko", 29, "10001")).await?;
    let vadas = add(env, person("Vadas", 27, "10199")).await?;
    let josh = add(env, person("Josh", 32, "89002")).await?;
    let peter = add(env, person("Peter", 35, "10122")).await?;
    let mut daniel = person("Daniel", 37, "88905");
    daniel.phone_numbers = Some(vec!["+491234567".to_string(), "+492345678".to_string()]);
    let daniel = add(env, daniel).await?;

    knows(env, &marko, &vadas).await?;
    knows(env, &marko, &josh).await?;

    Ok(People {
        marko,
        vadas,
        josh,
        peter,
        daniel,
    })
}

pub fn names(people: &[Person]) -> Vec<String> {
    let mut names: Vec<String> = people.iter().map(|p| p.name.clone()).collect();
    names.sort();
    names
}
