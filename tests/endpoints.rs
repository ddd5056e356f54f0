//! HTTP endpoint integration tests against a running service.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use telemetry_demo::config::schema::DelayRange;
use telemetry_demo::simulator::{ErrorKind, Operation, Outcome, SeededRandom, SequenceRandom};

mod common;

#[tokio::test]
async fn test_hello_and_request_ids() {
    let (registry, memory) = common::recording_registry(common::fast_simulator(), Arc::new(SeededRandom::new(1)));
    let service = common::start_service(common::test_config(), registry).await;
    let client = reqwest::Client::new();

    let res = client.get(common::url(service.local_addr(), "/hello")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let id = res.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert!(res
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let body = res.text().await.unwrap();
    assert!(body.starts_with("Hello from telemetry-demo! Time: "), "{}", body);

    let res = client
        .get(common::url(service.local_addr(), "/hello"))
        .header("x-request-id", "client-chosen")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "client-chosen");

    assert_eq!(memory.count(Operation::Hello, true), 2);
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_calc_params_and_defaults() {
    let (registry, memory) = common::recording_registry(common::fast_simulator(), Arc::new(SeededRandom::new(2)));
    let service = common::start_service(common::test_config(), registry).await;
    let addr = service.local_addr();

    let body = reqwest::get(common::url(addr, "/calc?x=21&y=2")).await.unwrap().text().await.unwrap();
    assert_eq!(body, "Result: 21 * 2 = 42");

    let body = reqwest::get(common::url(addr, "/calc")).await.unwrap().text().await.unwrap();
    assert_eq!(body, "Result: 10 * 20 = 200");

    let body = reqwest::get(common::url(addr, "/calc?x=-7")).await.unwrap().text().await.unwrap();
    assert_eq!(body, "Result: -7 * 20 = -140");

    // No overflow on large factors.
    let body = reqwest::get(common::url(addr, "/calc?x=2147483647&y=2147483647"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "Result: 2147483647 * 2147483647 = 4611686014132420609");

    let res = reqwest::get(common::url(addr, "/calc?x=abc")).await.unwrap();
    assert_eq!(res.status(), 400);

    // Rejected before the operation started.
    assert_eq!(memory.count(Operation::Calc, true), 4);
    assert_eq!(memory.observations().len(), 4);
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_users_endpoints() {
    // Raw value 1 never lands on the not-found draw.
    let (registry, memory) = common::recording_registry(common::fast_simulator(), Arc::new(SequenceRandom::new([1])));
    let service = common::start_service(common::test_config(), registry).await;
    let addr = service.local_addr();

    let list: Value = reqwest::get(common::url(addr, "/users")).await.unwrap().json().await.unwrap();
    assert_eq!(list["total"], 3);
    assert_eq!(list["users"].as_array().unwrap().len(), 3);
    assert!(list["timestamp"].as_u64().is_some());

    let user: Value = reqwest::get(common::url(addr, "/users/42")).await.unwrap().json().await.unwrap();
    assert_eq!(user["id"], "42");
    assert_eq!(user["name"], "User 42");
    assert_eq!(user["email"], "user42@example.com");
    assert!(user["created"].as_str().is_some());

    let lookups: Vec<_> = memory
        .observations()
        .into_iter()
        .filter(|o| o.operation == Operation::UsersGet)
        .collect();
    assert_eq!(lookups.len(), 1);
    assert!(lookups[0].tag("user_bucket").is_some());
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_user_not_found_maps_to_404() {
    let (registry, memory) = common::recording_registry(common::fast_simulator(), Arc::new(SequenceRandom::new([0])));
    let service = common::start_service(common::test_config(), registry).await;

    let res = reqwest::get(common::url(service.local_addr(), "/users/7")).await.unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "User not found: 7");

    let observations = memory.observations();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].outcome, Outcome::Error(ErrorKind::NotFound));
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_error_endpoint_always_fails() {
    let (registry, memory) = common::recording_registry(common::fast_simulator(), Arc::new(SeededRandom::new(3)));
    let service = common::start_service(common::test_config(), registry).await;

    for _ in 0..10 {
        let res = reqwest::get(common::url(service.local_addr(), "/error")).await.unwrap();
        let status = res.status().as_u16();
        let body: Value = res.json().await.unwrap();
        match body["error"].as_str().unwrap() {
            "runtime" | "state" => assert_eq!(status, 500),
            "validation" => assert_eq!(status, 400),
            other => panic!("unexpected error kind {}", other),
        }
        assert!(body["message"].as_str().unwrap().starts_with("Simulated "));
    }

    assert_eq!(memory.count(Operation::Error, false), 10);
    assert_eq!(memory.count(Operation::Error, true), 0);
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_orders_and_slow() {
    let (registry, _memory) = common::recording_registry(common::fast_simulator(), Arc::new(SeededRandom::new(4)));
    let service = common::start_service(common::test_config(), registry).await;
    let addr = service.local_addr();

    let batch: Value = reqwest::get(common::url(addr, "/orders")).await.unwrap().json().await.unwrap();
    let count = batch["count"].as_u64().unwrap();
    assert!((1..10).contains(&count));
    assert_eq!(batch["orders"].as_array().unwrap().len() as u64, count);
    assert_eq!(batch["currency"], "USD");
    let total = batch["total_value"].as_f64().unwrap();
    assert!((100.0..10000.0).contains(&total));

    let body = reqwest::get(common::url(addr, "/slow")).await.unwrap().text().await.unwrap();
    assert!(body.starts_with("Slow response completed after "), "{}", body);
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_health_and_unknown_routes() {
    let (registry, memory) = common::recording_registry(common::fast_simulator(), Arc::new(SeededRandom::new(5)));
    let service = common::start_service(common::test_config(), registry).await;
    let addr = service.local_addr();

    let health: Value = reqwest::get(common::url(addr, "/actuator/health")).await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], "UP");

    let res = reqwest::get(common::url(addr, "/nope")).await.unwrap();
    assert_eq!(res.status(), 404);

    assert!(memory.observations().is_empty());
    service.stop().await.unwrap();
}

#[tokio::test]
async fn test_request_timeout_cancels_operation() {
    let mut simulator = common::fast_simulator();
    simulator.slow_delay = DelayRange {
        min_ms: 3_000,
        max_ms: 3_001,
    };
    let (registry, memory) = common::recording_registry(simulator, Arc::new(SeededRandom::new(6)));
    let mut config = common::test_config();
    config.timeouts.request_secs = 1;
    let service = common::start_service(config, registry).await;

    let res = reqwest::get(common::url(service.local_addr(), "/slow")).await.unwrap();
    assert_eq!(res.status(), 408);

    // The abandoned invocation still closes its observation.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let observations = memory.observations();
    assert_eq!(observations.len(), 1);
    assert_eq!(observations[0].operation, Operation::Slow);
    assert_eq!(observations[0].outcome, Outcome::Error(ErrorKind::Cancelled));
    service.stop().await.unwrap();
}
