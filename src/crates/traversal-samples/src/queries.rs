//! The sample traversals

use crate::model::{Knows, Person};
use tracing::info;
use traversal_core::{ElementId, GraphEnvironment, Predicate, Result, Test, TraversalError};

/// Zip codes considered close to Marko
pub const NEARBY: [&str; 5] = ["10001", "10199", "10121", "10122", "10123"];

/// The people the sample creates
pub struct People {
    pub marko: Person,
    pub vadas: Person,
    pub josh: Person,
    pub peter: Person,
    pub daniel: Person,
}

fn id_of(person: &Person) -> Result<ElementId> {
    person.id.clone().ok_or_else(|| {
        TraversalError::Decoding(format!("{} came back without an identifier", person.name))
    })
}

async fn add(env: &GraphEnvironment, person: Person) -> Result<Person> {
    let name = person.name.clone();
    env.g()
        .add_v(&person)?
        .first()
        .await?
        .ok_or_else(|| TraversalError::Decoding(format!("creating {name} returned nothing")))
}

async fn add_knows(env: &GraphEnvironment, from: &Person, to: &Person) -> Result<()> {
    let to = id_of(to)?;
    env.g()
        .v_of::<Person>(id_of(from)?)?
        .add_e(&Knows::default())?
        .to(|t| t.v_of::<Person>(to))?
        .to_list()
        .await?;
    Ok(())
}

/// Replace the graph with the sample people
pub async fn seed(env: &GraphEnvironment) -> Result<People> {
    env.g().v_all().drop().to_list().await?;

    let marko = add(env, Person::new("Marko", 29, "10001")).await?;
    let vadas = add(env, Person::new("Vadas", 27, "10199")).await?;
    let josh = add(env, Person::new("Josh", 32, "89002")).await?;
    let peter = add(env, Person::new("Peter", 35, "10122")).await?;
    let daniel = add(
        env,
        Person::new("Daniel", 37, "88905").with_phone_numbers(&["+491234567", "+492345678"]),
    )
    .await?;

    add_knows(env, &marko, &vadas).await?;
    add_knows(env, &marko, &josh).await?;
    info!("Sample graph created");

    Ok(People {
        marko,
        vadas,
        josh,
        peter,
        daniel,
    })
}

/// Everyone Marko knows, in either direction
pub async fn who_does_marko_know(env: &GraphEnvironment, people: &People) -> Result<Vec<Person>> {
    env.g()
        .v_of::<Person>(id_of(&people.marko)?)?
        .both::<Knows>()?
        .of_type::<Person>()?
        .to_list()
        .await
}

/// Marko's acquaintances living in one of `nearby`
pub async fn nearby_friends(
    env: &GraphEnvironment,
    people: &People,
    nearby: &[&str],
) -> Result<Vec<Person>> {
    let marko = id_of(&people.marko)?;
    env.g()
        .inject(nearby.iter().map(|zip| zip.to_string()))?
        .fold()
        .bind(|t, zips| {
            t.v_of::<Person>(marko)?
                .both::<Knows>()?
                .of_type::<Person>()?
                .where_(Predicate::has("zip_code", Test::within_bound(&zips)))
        })?
        .to_list()
        .await
}

/// People in one of `nearby` that Marko does not know yet
pub async fn nearby_strangers(
    env: &GraphEnvironment,
    people: &People,
    nearby: &[&str],
) -> Result<Vec<Person>> {
    let marko = id_of(&people.marko)?;
    let name = &people.marko.name;
    env.g()
        .inject(nearby.iter().map(|zip| zip.to_string()))?
        .fold()
        .bind(|t, zips| {
            t.v_of::<Person>(marko)?
                .both::<Knows>()?
                .of_type::<Person>()?
                .fold()
                .bind(|t, known| {
                    t.v::<Person>()?.where_(
                        (!Predicate::is(Test::within_bound(&known)))
                            .and(Predicate::has("zip_code", Test::within_bound(&zips)))
                            .and(Predicate::has("name", Test::neq(name.as_str()))),
                    )
                })
        })?
        .to_list()
        .await
}

/// Marko has a birthday; the partition key sent along is ignored
pub async fn birthday(env: &GraphEnvironment, people: &People) -> Result<Option<Person>> {
    let mut older = people.marko.clone();
    older.age += 1;
    older.partition_key = String::new();
    env.g()
        .v_of::<Person>(id_of(&people.marko)?)?
        .update(&older)?
        .first()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::social_model;
    use traversal_memory::InMemoryGraph;

    fn environment() -> GraphEnvironment {
        GraphEnvironment::builder(social_model().unwrap())
            .with_channel(InMemoryGraph::new())
            .build()
            .unwrap()
    }

    fn names(people: Vec<Person>) -> Vec<String> {
        let mut names: Vec<String> = people.into_iter().map(|p| p.name).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_sample_queries() {
        let env = environment();
        let people = seed(&env).await.unwrap();

        let known = who_does_marko_know(&env, &people).await.unwrap();
        assert_eq!(names(known), vec!["Josh", "Vadas"]);

        let friends = nearby_friends(&env, &people, &NEARBY).await.unwrap();
        assert_eq!(names(friends), vec!["Vadas"]);

        let strangers = nearby_strangers(&env, &people, &NEARBY).await.unwrap();
        assert_eq!(names(strangers), vec!["Peter"]);
    }

    #[tokio::test]
    async fn test_seed_replaces_graph() {
        let env = environment();
        seed(&env).await.unwrap();
        let people = seed(&env).await.unwrap();

        let everyone = env.g().v::<Person>().unwrap().count().first().await.unwrap();
        assert_eq!(everyone, Some(5));
        assert_eq!(
            people.daniel.phone_numbers.as_deref().map(|n| n.len()),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_birthday_keeps_partition() {
        let env = environment();
        let people = seed(&env).await.unwrap();

        let marko = birthday(&env, &people).await.unwrap().unwrap();
        assert_eq!(marko.age, 30);
        assert_eq!(marko.partition_key, "people");
    }
}
