//! Client and server talking over real sockets

use async_trait::async_trait;
use futures::future::join_all;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, connect_async};
use traversal_core::{
    CompiledTraversal, EdgeKind, Element, ElementId, ElementKind, GraphChannel, GraphEnvironment,
    GraphModel, Predicate, RawResult, RawResultStream, Result, Step, StepSequence, Test, TraversalError,
    TraversalRequest, VertexKind,
};
use traversal_memory::{InMemoryGraph, EVALUATION_FAILED};
use traversal_ws::{status, ResponseMessage, WebSocketChannel, WebSocketConfig, WebSocketServer, WsError, BATCH_SIZE};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ElementId>,
    name: String,
    zip_code: String,
}

impl Element for Person {
    type Kind = VertexKind;
    const LABEL: &'static str = "Person";
    const PROPERTIES: &'static [&'static str] = &["name", "zip_code"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Knows {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ElementId>,
}

impl Element for Knows {
    type Kind = EdgeKind;
    const LABEL: &'static str = "Knows";
    const PROPERTIES: &'static [&'static str] = &[];
}

/// Accepts every request and never answers
struct Silent;

#[async_trait]
impl GraphChannel for Silent {
    async fn send(&self, _request: TraversalRequest) -> Result<RawResultStream> {
        Ok(Box::pin(futures::stream::pending()))
    }
}

async fn serve(graph: Arc<dyn GraphChannel>) -> WebSocketConfig {
    let server = WebSocketServer::bind("127.0.0.1:0", graph).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    WebSocketConfig::new(format!("ws://{addr}/gremlin"))
}

async fn environment(config: WebSocketConfig) -> GraphEnvironment {
    let mut model = GraphModel::builder();
    model.register_vertex::<Person>().unwrap();
    model.register_edge::<Knows>().unwrap();
    let channel = WebSocketChannel::connect(config).await.unwrap();
    GraphEnvironment::builder(model.build().unwrap())
        .with_channel(channel)
        .build()
        .unwrap()
}

async fn add(env: &GraphEnvironment, name: &str, zip_code: &str) -> Person {
    let person = Person {
        id: None,
        name: name.to_string(),
        zip_code: zip_code.to_string(),
    };
    env.g().add_v(&person).unwrap().first().await.unwrap().unwrap()
}

async fn knows(env: &GraphEnvironment, from: &Person, to: &Person) {
    let to = to.id.clone().unwrap();
    env.g()
        .v_of::<Person>(from.id.clone().unwrap())
        .unwrap()
        .add_e(&Knows::default())
        .unwrap()
        .to(|t| t.v_of::<Person>(to))
        .unwrap()
        .to_list()
        .await
        .unwrap();
}

fn select_all() -> TraversalRequest {
    let steps = StepSequence::new().append(Step::SelectAll {
        kind: ElementKind::Vertex,
    });
    TraversalRequest {
        request_id: Uuid::new_v4(),
        traversal: CompiledTraversal::new(steps).unwrap(),
    }
}

fn inject(values: Vec<Value>) -> TraversalRequest {
    let steps = StepSequence::new().append(Step::Inject { values });
    TraversalRequest {
        request_id: Uuid::new_v4(),
        traversal: CompiledTraversal::new(steps).unwrap(),
    }
}

#[tokio::test]
async fn test_correlated_traversal_over_the_wire() {
    let graph = InMemoryGraph::new();
    let env = environment(serve(Arc::new(graph.clone())).await).await;

    let marko = add(&env, "Marko", "10001").await;
    let vadas = add(&env, "Vadas", "10199").await;
    let josh = add(&env, "Josh", "89002").await;
    knows(&env, &marko, &vadas).await;
    knows(&env, &marko, &josh).await;
    assert_eq!(graph.vertex_count(), 3);
    assert_eq!(graph.edge_count(), 2);

    let marko_id = marko.id.clone().unwrap();
    let friends = env
        .g()
        .inject(vec!["10001".to_string(), "10199".to_string()])
        .unwrap()
        .fold()
        .bind(|t, zips| {
            t.v_of::<Person>(marko_id)?
                .both::<Knows>()?
                .of_type::<Person>()?
                .where_(Predicate::has("zip_code", Test::within_bound(&zips)))
        })
        .unwrap()
        .to_list()
        .await
        .unwrap();
    assert_eq!(friends, vec![vadas]);
}

#[tokio::test]
async fn test_server_error_keeps_code() {
    let graph = InMemoryGraph::new();
    let env = environment(serve(Arc::new(graph.clone())).await).await;
    let marko = add(&env, "Marko", "10001").await;

    let result = env
        .g()
        .v_of::<Person>(marko.id.unwrap())
        .unwrap()
        .add_e(&Knows::default())
        .unwrap()
        .to(|t| t.v_of::<Person>(9_999))
        .unwrap()
        .to_list()
        .await;
    assert!(matches!(
        result,
        Err(TraversalError::Server { code, .. }) if code == EVALUATION_FAILED
    ));
    assert_eq!(graph.edge_count(), 0);
}

#[tokio::test]
async fn test_results_span_several_frames_in_order() {
    let env = environment(serve(Arc::new(InMemoryGraph::new())).await).await;

    let count = (BATCH_SIZE * 2 + 7) as i64;
    let values = env
        .g()
        .inject(0..count)
        .unwrap()
        .to_list()
        .await
        .unwrap();
    assert_eq!(values, (0..count).collect::<Vec<_>>());

    let nothing = env.g().v::<Person>().unwrap().to_list().await.unwrap();
    assert!(nothing.is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_share_one_connection() {
    let env = environment(serve(Arc::new(InMemoryGraph::new())).await).await;

    let queries = (0..20i64).map(|i| {
        let env = env.clone();
        async move { env.g().inject(vec![i, i * 100])?.to_list().await }
    });
    for (i, result) in join_all(queries).await.into_iter().enumerate() {
        let i = i as i64;
        assert_eq!(result.unwrap(), vec![i, i * 100]);
    }
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = WebSocketChannel::connect(WebSocketConfig::new(format!("ws://{addr}"))).await;
    assert!(matches!(result, Err(WsError::Connect { .. })));

    let result = WebSocketChannel::connect(WebSocketConfig::new("http://localhost")).await;
    assert!(matches!(result, Err(WsError::Connect { .. })));
}

#[tokio::test]
async fn test_dropped_stream_releases_request() {
    let config = serve(Arc::new(Silent)).await;
    let channel = WebSocketChannel::connect(config).await.unwrap();

    let results = channel.send(select_all()).await.unwrap();
    assert_eq!(channel.in_flight(), 1);
    drop(results);
    assert_eq!(channel.in_flight(), 0);
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let config = serve(Arc::new(Silent))
        .await
        .with_request_timeout(Duration::from_secs(1));
    let env = environment(config).await;

    match env.g().v_all().to_list().await {
        Err(TraversalError::Transport(message)) => {
            assert!(message.contains("No response within 1s"), "{message}")
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lost_connection_fails_requests_in_flight() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut socket = accept_async(socket).await.unwrap();
        let _request = socket.next().await;
        drop(socket);
    });

    let channel = WebSocketChannel::connect(WebSocketConfig::new(format!("ws://{addr}")))
        .await
        .unwrap();
    let mut results = channel.send(select_all()).await.unwrap();

    match results.next().await {
        Some(Err(TraversalError::Transport(message))) => {
            assert_eq!(message, "Connection closed")
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
    assert!(results.next().await.is_none());
    assert!(channel.is_closed());
    assert!(channel.send(select_all()).await.is_err());
}

#[tokio::test]
async fn test_malformed_frame_is_rejected() {
    let config = serve(Arc::new(InMemoryGraph::new())).await;
    let (mut socket, _) = connect_async(config.url.as_str()).await.unwrap();

    futures::SinkExt::send(&mut socket, Message::Text("{\"op\": 1}".to_string()))
        .await
        .unwrap();
    let reply = loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => break text,
            Some(Ok(_)) => continue,
            other => panic!("expected a reply, got {other:?}"),
        }
    };
    let reply: ResponseMessage = serde_json::from_str(&reply).unwrap();
    assert_eq!(reply.status.code, status::MALFORMED_REQUEST);
    assert_eq!(reply.request_id, None);
}

#[tokio::test]
async fn test_unread_request_does_not_stall_others() {
    let config = serve(Arc::new(InMemoryGraph::new())).await;
    let channel = WebSocketChannel::connect(config.with_buffer_size(1))
        .await
        .unwrap();

    let _unread = channel
        .send(inject((0..1000).map(|i| json!(i)).collect()))
        .await
        .unwrap();
    let mut small = channel.send(inject(vec![json!(7)])).await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), small.next())
        .await
        .expect("the small request should not wait on the unread one");
    assert!(matches!(first, Some(Ok(RawResult::Value(ref v))) if *v == json!(7)));
    assert!(small.next().await.is_none());
}
