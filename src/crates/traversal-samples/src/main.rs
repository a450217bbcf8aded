//! # traversal-samples
//!
//! Runs the social graph sample against the in-memory engine or a WebSocket
//! server, and can serve an in-memory graph itself.

mod model;
mod queries;

use anyhow::Context;
use clap::{Parser, Subcommand};
use model::{social_model, Person};
use queries::NEARBY;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use traversal_core::{EnvironmentConfig, GraphEnvironment, QueryLogLevel};
use traversal_memory::InMemoryGraph;
use traversal_ws::{WebSocketChannel, WebSocketConfig, WebSocketServer, DEFAULT_PORT};

#[derive(Parser)]
#[command(name = "traversal-samples")]
#[command(about = "Typed graph traversal samples", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the social graph and run the sample queries
    Run {
        /// Graph server; the in-memory engine when omitted
        #[arg(short, long, env = "TRAVERSAL_WS_URL")]
        url: Option<String>,

        /// Log every traversal at this level
        #[arg(long, default_value = "none")]
        query_log_level: QueryLogLevel,
    },

    /// Serve an in-memory graph over WebSocket
    Serve {
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            url,
            query_log_level,
        } => run(url, query_log_level).await,
        Commands::Serve { port, host } => serve(&host, port).await,
    }
}

async fn run(url: Option<String>, query_log_level: QueryLogLevel) -> anyhow::Result<()> {
    let config = EnvironmentConfig::new().with_query_log_level(query_log_level);
    let builder = GraphEnvironment::builder(social_model()?).with_config(config);

    let env = match url {
        Some(url) => {
            let channel = WebSocketChannel::connect(WebSocketConfig::new(url.as_str()))
                .await
                .with_context(|| format!("cannot reach graph server at {url}"))?;
            builder.with_channel(channel).build()?
        }
        None => {
            info!("No server given, using the in-memory engine");
            builder.with_channel(InMemoryGraph::new()).build()?
        }
    };

    let people = queries::seed(&env).await?;

    print_people(
        "Who does Marko know?",
        queries::who_does_marko_know(&env, &people).await?,
    );
    print_people(
        "Which of Marko's friends live nearby?",
        queries::nearby_friends(&env, &people, &NEARBY).await?,
    );
    print_people(
        "Who lives nearby that Marko does not know yet?",
        queries::nearby_strangers(&env, &people, &NEARBY).await?,
    );
    if let Some(marko) = queries::birthday(&env, &people).await? {
        println!("\nMarko turned {} (partition '{}')", marko.age, marko.partition_key);
    }
    Ok(())
}

fn print_people(question: &str, mut people: Vec<Person>) {
    people.sort_by(|a, b| a.name.cmp(&b.name));
    println!("\n{}", question);
    if people.is_empty() {
        println!("  nobody");
    }
    for person in people {
        println!("  {} ({}, {})", person.name, person.age, person.zip_code);
    }
}

async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let graph = InMemoryGraph::new();
    let server = WebSocketServer::bind((host, port), Arc::new(graph))
        .await
        .with_context(|| format!("cannot listen on {host}:{port}"))?;
    info!(addr = %server.local_addr()?, "Serving an in-memory graph, Ctrl-C to stop");

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
