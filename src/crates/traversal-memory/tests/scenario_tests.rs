//! The social graph sample, end to end against the in-memory engine

mod common;

use common::{environment, names, seed, Knows, People, Person};
use traversal_core::{GraphEnvironment, Predicate, Test, Traversal};
use traversal_memory::InMemoryGraph;

const NEARBY: [&str; 5] = ["10001", "10199", "10121", "10122", "10123"];

fn zips(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

fn who_does_marko_know(env: &GraphEnvironment, people: &People) -> Traversal<Person> {
    env.g()
        .v_of::<Person>(People::id_of(&people.marko))
        .unwrap()
        .both::<Knows>()
        .unwrap()
        .of_type::<Person>()
        .unwrap()
}

fn nearby_friends(env: &GraphEnvironment, people: &People, nearby: &[&str]) -> Traversal<Person> {
    let marko = People::id_of(&people.marko);
    env.g()
        .inject(zips(nearby))
        .unwrap()
        .fold()
        .bind(|t, zips| {
            t.v_of::<Person>(marko)?
                .both::<Knows>()?
                .of_type::<Person>()?
                .where_(Predicate::has("zip_code", Test::within_bound(&zips)))
        })
        .unwrap()
}

fn nearby_strangers(env: &GraphEnvironment, people: &People, nearby: &[&str]) -> Traversal<Person> {
    let marko = People::id_of(&people.marko);
    env.g()
        .inject(zips(nearby))
        .unwrap()
        .fold()
        .bind(|t, zips| {
            t.v_of::<Person>(marko)?
                .both::<Knows>()?
                .of_type::<Person>()?
                .fold()
                .bind(|t, known| {
                    t.v::<Person>()?.where_(
                        (!Predicate::is(Test::within_bound(&known)))
                            .and(Predicate::has("zip_code", Test::within_bound(&zips))),
                    )
                })
        })
        .unwrap()
}

#[tokio::test]
async fn test_who_marko_knows() {
    let graph = InMemoryGraph::new();
    let env = environment(&graph);
    let people = seed(&env).await.unwrap();

    let known = who_does_marko_know(&env, &people).to_list().await.unwrap();
    assert_eq!(names(&known), vec!["Josh", "Vadas"]);
    assert!(known.contains(&people.vadas));
    assert!(known.contains(&people.josh));
}

#[tokio::test]
async fn test_friends_in_bound_zip_codes() {
    let graph = InMemoryGraph::new();
    let env = environment(&graph);
    let people = seed(&env).await.unwrap();

    let friends = nearby_friends(&env, &people, &["10001", "10199"])
        .to_list()
        .await
        .unwrap();
    assert_eq!(names(&friends), vec!["Vadas"]);

    let friends = nearby_friends(&env, &people, &NEARBY).to_list().await.unwrap();
    assert_eq!(names(&friends), vec!["Vadas"]);
}

#[tokio::test]
async fn test_strangers_in_nearby_zip_codes() {
    let graph = InMemoryGraph::new();
    let env = environment(&graph);
    let people = seed(&env).await.unwrap();

    let strangers = nearby_strangers(&env, &people, &["10122"])
        .to_list()
        .await
        .unwrap();
    assert_eq!(strangers, vec![people.peter.clone()]);
}

#[tokio::test]
async fn test_strangers_include_marko_himself() {
    let graph = InMemoryGraph::new();
    let env = environment(&graph);
    let people = seed(&env).await.unwrap();

    // Marko is not among the people he knows and lives in a nearby zip code
    let strangers = nearby_strangers(&env, &people, &NEARBY).to_list().await.unwrap();
    assert_eq!(names(&strangers), vec!["Marko", "Peter"]);
}

#[tokio::test]
async fn test_empty_fold_excludes_nobody() {
    let graph = InMemoryGraph::new();
    let env = environment(&graph);
    let people = seed(&env).await.unwrap();

    // Peter knows nobody, so the folded set is empty
    let peter = People::id_of(&people.peter);
    let strangers = env
        .g()
        .v_of::<Person>(peter)
        .unwrap()
        .both::<Knows>()
        .unwrap()
        .of_type::<Person>()
        .unwrap()
        .fold()
        .bind(|t, known| t.v::<Person>()?.where_(!Predicate::is(Test::within_bound(&known))))
        .unwrap()
        .to_list()
        .await
        .unwrap();
    assert_eq!(strangers.len(), 5);
}

#[tokio::test]
async fn test_results_are_typed_and_complete() {
    let graph = InMemoryGraph::new();
    let env = environment(&graph);
    let people = seed(&env).await.unwrap();

    let daniel = env
        .g()
        .v_of::<Person>(People::id_of(&people.daniel))
        .unwrap()
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(daniel, people.daniel);
    assert_eq!(
        daniel.phone_numbers,
        Some(vec!["+491234567".to_string(), "+492345678".to_string()])
    );
    assert_eq!(graph.vertex_count(), 5);
    assert_eq!(graph.edge_count(), 2);
}
