mod common;

use std::sync::Arc;

use jumplink::infrastructure::cache::NullCache;
use jumplink::infrastructure::persistence::InMemoryUrlMappingRepository;

#[tokio::test]
async fn test_health_endpoint_success() {
    let (server, _repository) = common::create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["store"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
}

#[tokio::test]
async fn test_health_endpoint_structure() {
    let (server, _repository) = common::create_test_server();

    let json = server.get("/health").await.json::<serde_json::Value>();

    assert!(json.get("status").is_some());
    assert!(json.get("version").is_some());
    assert!(json["checks"].get("store").is_some());
    assert!(json["checks"].get("cache").is_some());
}

#[tokio::test]
async fn test_health_degraded_when_store_down() {
    let state = common::create_test_state(Arc::new(common::BrokenStore), Arc::new(NullCache::new()));
    let server = common::server_for(state);

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["store"]["status"], "error");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
}

#[tokio::test]
async fn test_health_degraded_when_cache_down() {
    let state = common::create_test_state(
        Arc::new(InMemoryUrlMappingRepository::new()),
        Arc::new(common::MemoryCache::unhealthy()),
    );
    let server = common::server_for(state);

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), 503);

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["checks"]["store"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "error");
}
