// Shared primitives for booting real nodes across integration tests.
#![allow(dead_code)]

use std::{
    // `Arc` shares data between threads; `OnceLock` writes a value only once.
    sync::{Arc, OnceLock},
    // Sleep durations are used in readiness and polling loops.
    time::Duration,
};

use serde_json::Value;
use survival_node::{NodeConfig, NodeMode};

// Node settings with a throwaway save directory and no external services.
pub fn node_config(peer_id: &str, mode: NodeMode) -> NodeConfig {
    NodeConfig {
        peer_id: peer_id.to_string(),
        player_name: Some(peer_id.to_uppercase()),
        class_type: Some(survival_node::domain::ClassType::Scout),
        mode,
        join_peers: Vec::new(),
        spawn_radius_m: 300.0,
        narrator_url: None,
        narrator_timeout: Duration::from_millis(500),
        save_dir: std::env::temp_dir().join(format!("survival-it-{}", uuid::Uuid::new_v4())),
        continue_save: false,
        start_position: None,
        rng_seed: Some(1),
        timings: Default::default(),
    }
}

// Boot a node on its own thread and return its base URL once it accepts connections.
pub fn spawn_node(config: NodeConfig) -> String {
    // Local one-time slot where the node thread publishes its selected URL.
    let published_url = Arc::new(OnceLock::<String>::new());
    let published_url_thread = Arc::clone(&published_url);
    // Spawn an OS thread so the node outlives individual `#[tokio::test]` runtimes.
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("test runtime");
        runtime.block_on(async move {
            // Bind to an ephemeral port to avoid collisions with local services.
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral test port");
            let addr = listener.local_addr().expect("get local addr");
            let _ = published_url_thread.set(format!("http://{}", addr));
            survival_node::run(listener, config)
                .await
                .expect("node failed");
        });
    });
    wait_for_url_and_readiness(published_url)
}

fn wait_for_url_and_readiness(published_url: Arc<OnceLock<String>>) -> String {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    // Retry for a short period to avoid racing bind/accept.
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return base_url;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("node did not become ready in time");
}

// WebSocket address of a node's peer route.
pub fn peer_address(base_url: &str) -> String {
    format!("{}/peer", base_url.replacen("http://", "ws://", 1))
}

pub async fn state(client: &reqwest::Client, base_url: &str) -> Value {
    client
        .get(format!("{base_url}/state"))
        .send()
        .await
        .expect("state request")
        .json()
        .await
        .expect("state json")
}

// Poll `/state` until `done` holds or the deadline passes.
pub async fn wait_for_state(
    client: &reqwest::Client,
    base_url: &str,
    done: impl Fn(&Value) -> bool,
) -> Value {
    for _ in 0..100 {
        let view = state(client, base_url).await;
        if done(&view) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("state never reached the expected shape");
}
