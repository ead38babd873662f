//! Standalone serve process: loads a TOML config, registers with discovery,
//! and serves inbound peer traffic over HTTP.
//!
//! Mirrors `original_source/internal/register/register.go`'s `New(config)`
//! entry point, adapted to this crate's `Hub`/`Subscriber` composition. The
//! coordination-service backend itself is out of scope (see
//! [`distcache::discovery`]), so this binary registers against an in-process
//! [`distcache::discovery::StaticDiscoveryBackend`] seeded with only this
//! node — enough to exercise the serve path without a live etcd cluster.

use distcache::config::Config;
use distcache::discovery::{DiscoveryBackend, StaticDiscoveryBackend, Subscriber};
use distcache::hub::Hub;
use distcache::node_client::HttpNodeClient;
use distcache::ring::HashRing;
use distcache::server;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const BASEPATH: &str = "/cache";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "distcache.toml".into());
    let text = std::fs::read_to_string(&config_path)
        .map_err(|e| format!("reading {config_path}: {e}"))?;
    let config = Config::from_toml(&text)?;

    tracing::info!(node = %config.node_name, addr = %config.self_endpoint(), "starting serve process");

    let ring = HashRing::new(config.replicas);
    let dial_timeout = Duration::from_secs(config.dial_timeout_secs);
    let subscriber = Arc::new(Subscriber::new(
        ring,
        Arc::new(move |endpoint: &str| {
            Arc::new(HttpNodeClient::new(endpoint.to_string(), dial_timeout).expect("valid base url"))
                as Arc<dyn distcache::node_client::NodeClient>
        }),
    ));

    let backend: Arc<dyn DiscoveryBackend> = Arc::new(StaticDiscoveryBackend::new());
    subscriber.spawn_watch(backend.clone());
    let _lease = backend
        .register(
            config.node_name.clone(),
            config.self_endpoint(),
            Duration::from_secs(config.lease_ttl_secs),
        )
        .await;

    let hub = Arc::new(Hub::with_discovery(subscriber, config.node_name.clone()));
    let app = server::router(hub, BASEPATH);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = %config.port, basepath = BASEPATH, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
