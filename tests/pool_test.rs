//! End-to-end pool behavior tests.

mod common;

use common::{endpoint, settings_with_decay, ManualClock};
use endpoint_pool::{
    AcquireOptions, EndpointConfig, EndpointPool, PoolError, PoolSettings,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_weighted_selection_prefers_heavier_endpoint() {
    let pool = EndpointPool::new(settings_with_decay(0.5)).unwrap();
    pool.register_endpoint(endpoint("a", 1.0)).unwrap();
    pool.register_endpoint(endpoint("b", 2.0)).unwrap();

    // Equal health: the score ratio is exactly the weight ratio.
    let snapshots = pool.describe_all();
    let score_a = snapshots.iter().find(|s| s.id == "a").unwrap().score;
    let score_b = snapshots.iter().find(|s| s.id == "b").unwrap().score;
    assert!(score_a > 0.0);
    assert!((score_b - 2.0 * score_a).abs() < 1e-12);

    let lease = pool.acquire(AcquireOptions::default()).unwrap();
    assert_eq!(lease.endpoint_id, "b");
}

#[test]
fn test_hysteresis_marks_unhealthy_then_recovers() {
    let pool = EndpointPool::new(settings_with_decay(0.5)).unwrap();
    pool.register_endpoint(EndpointConfig {
        failure_threshold: 0.4,
        recovery_threshold: 0.7,
        cooldown_secs: 0.0,
        ..EndpointConfig::new("c", "10.0.0.5:3128")
    })
    .unwrap();

    for _ in 0..4 {
        pool.record_result("c", false, None, None).unwrap();
    }
    let snapshot = pool.snapshot("c").unwrap();
    assert!(snapshot.success_ewma <= 0.0625);
    assert!(!snapshot.healthy);

    for _ in 0..5 {
        pool.record_result("c", true, None, None).unwrap();
    }
    let snapshot = pool.snapshot("c").unwrap();
    assert!(snapshot.success_ewma > 0.7);
    assert!(snapshot.healthy);
}

#[test]
fn test_capacity_cap_blocks_second_acquire() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    pool.register_endpoint(EndpointConfig {
        max_sessions: Some(1),
        ..EndpointConfig::new("d", "10.0.0.5:3128")
    })
    .unwrap();

    let lease = pool.acquire(AcquireOptions::default()).unwrap();
    assert!(matches!(
        pool.acquire(AcquireOptions::default()),
        Err(PoolError::NotAvailable)
    ));

    assert!(pool.release(&lease.session_id));
    assert!(pool.acquire(AcquireOptions::default()).is_ok());
}

#[test]
fn test_sticky_client_stays_on_bound_endpoint() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    pool.register_endpoint(endpoint("e", 1.0)).unwrap();

    let first = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(first.endpoint_id, "e");

    // A higher-scoring endpoint arriving later must not steal the client.
    pool.register_endpoint(endpoint("f", 5.0)).unwrap();
    let second = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(second.endpoint_id, "e");

    // Unbound callers go to the better endpoint.
    let other = pool.acquire(AcquireOptions::default()).unwrap();
    assert_eq!(other.endpoint_id, "f");
}

#[test]
fn test_record_result_unknown_endpoint() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    let err = pool
        .record_result("unknown-id", true, None, None)
        .unwrap_err();
    assert!(matches!(err, PoolError::UnknownEndpoint(id) if id == "unknown-id"));
}

#[test]
fn test_release_is_idempotent() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    pool.register_endpoint(endpoint("a", 1.0)).unwrap();

    let lease = pool.acquire(AcquireOptions::default()).unwrap();
    assert_eq!(pool.snapshot("a").unwrap().active_sessions, 1);

    assert!(pool.release(&lease.session_id));
    assert!(!pool.release(&lease.session_id));
    assert_eq!(pool.snapshot("a").unwrap().active_sessions, 0);
}

#[test]
fn test_record_result_releases_session() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    pool.register_endpoint(endpoint("a", 1.0)).unwrap();

    let lease = pool.acquire(AcquireOptions::default()).unwrap();
    pool.record_result("a", true, Some(42.0), Some(&lease.session_id))
        .unwrap();

    let snapshot = pool.snapshot("a").unwrap();
    assert_eq!(snapshot.active_sessions, 0);
    assert_eq!(snapshot.latency_ewma_ms, 42.0);
    assert!(!pool.release(&lease.session_id));
}

#[test]
fn test_lease_ttl_frees_capacity_lazily() {
    let clock = Arc::new(ManualClock::new());
    let pool = EndpointPool::with_clock(PoolSettings::default(), clock.clone()).unwrap();
    pool.register_endpoint(EndpointConfig {
        max_sessions: Some(1),
        ..EndpointConfig::new("a", "10.0.0.5:3128")
    })
    .unwrap();

    // Default session TTL is 30s.
    let lease = pool.acquire(AcquireOptions::default()).unwrap();
    assert!(matches!(
        pool.acquire(AcquireOptions::default()),
        Err(PoolError::NotAvailable)
    ));

    clock.advance(Duration::from_secs(31));
    let second = pool.acquire(AcquireOptions::default()).unwrap();
    assert_eq!(second.endpoint_id, "a");

    // The expired lease was reclaimed by the sweep, not by release.
    assert!(!pool.release(&lease.session_id));
    assert_eq!(pool.snapshot("a").unwrap().active_sessions, 1);
}

#[test]
fn test_sticky_binding_expires_after_ttl() {
    let clock = Arc::new(ManualClock::new());
    let settings = PoolSettings {
        sticky_ttl_secs: 60,
        ..PoolSettings::default()
    };
    let pool = EndpointPool::with_clock(settings, clock.clone()).unwrap();
    pool.register_endpoint(endpoint("a", 1.0)).unwrap();

    let first = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(first.endpoint_id, "a");
    pool.release(&first.session_id);

    pool.register_endpoint(endpoint("b", 5.0)).unwrap();

    // Binding still live: the client stays on "a".
    clock.advance(Duration::from_secs(30));
    let second = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(second.endpoint_id, "a");
    pool.release(&second.session_id);

    // Reuse refreshed the TTL at t+30, so it lapses at t+90.
    clock.advance(Duration::from_secs(61));
    let third = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(third.endpoint_id, "b");
}

#[test]
fn test_sticky_falls_back_when_capacity_exhausted() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    pool.register_endpoint(EndpointConfig {
        max_sessions: Some(1),
        weight: 5.0,
        ..EndpointConfig::new("a", "10.0.0.5:3128")
    })
    .unwrap();
    pool.register_endpoint(endpoint("b", 1.0)).unwrap();

    let first = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(first.endpoint_id, "a");

    // "a" is at capacity: the sticky path may not bypass the cap, and the
    // client is rebound to the endpoint that actually served it.
    let second = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(second.endpoint_id, "b");

    pool.release(&first.session_id);
    pool.release(&second.session_id);
    let third = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(third.endpoint_id, "b");
}

#[test]
fn test_unhealthy_fallback_still_serves() {
    let pool = EndpointPool::new(settings_with_decay(0.5)).unwrap();
    pool.register_endpoint(EndpointConfig {
        failure_threshold: 0.4,
        recovery_threshold: 0.7,
        ..EndpointConfig::new("a", "10.0.0.5:3128")
    })
    .unwrap();

    pool.record_result("a", false, None, None).unwrap();
    assert!(!pool.snapshot("a").unwrap().healthy);

    let strict = pool.acquire(AcquireOptions {
        allow_unhealthy_fallback: false,
        ..AcquireOptions::default()
    });
    assert!(matches!(strict, Err(PoolError::NotAvailable)));

    let relaxed = pool.acquire(AcquireOptions::default()).unwrap();
    assert_eq!(relaxed.endpoint_id, "a");
}

#[test]
fn test_cooldown_blocks_strict_selection_until_elapsed() {
    let clock = Arc::new(ManualClock::new());
    let pool = EndpointPool::with_clock(settings_with_decay(0.5), clock.clone()).unwrap();
    pool.register_endpoint(EndpointConfig {
        failure_threshold: 0.4,
        recovery_threshold: 0.7,
        cooldown_secs: 10.0,
        ..EndpointConfig::new("a", "10.0.0.5:3128")
    })
    .unwrap();

    // One success then one failure: EWMA 0.5 keeps it healthy, but the
    // failure opens a cooldown window.
    pool.record_result("a", true, None, None).unwrap();
    pool.record_result("a", false, None, None).unwrap();
    let snapshot = pool.snapshot("a").unwrap();
    assert!(snapshot.healthy);
    assert!(snapshot.in_cooldown);

    let strict = pool.acquire(AcquireOptions {
        allow_unhealthy_fallback: false,
        ..AcquireOptions::default()
    });
    assert!(matches!(strict, Err(PoolError::NotAvailable)));

    clock.advance(Duration::from_secs(11));
    let lease = pool.acquire(AcquireOptions {
        allow_unhealthy_fallback: false,
        ..AcquireOptions::default()
    });
    assert!(lease.is_ok());
}

#[test]
fn test_replace_endpoint_invalidates_sessions() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    pool.register_endpoint(endpoint("a", 1.0)).unwrap();

    let lease = pool.acquire(AcquireOptions::default()).unwrap();
    pool.record_result("a", true, Some(80.0), None).unwrap();

    pool.register_endpoint(EndpointConfig::new("a", "10.0.0.9:3128"))
        .unwrap();

    // The old lease does not survive the replacement.
    assert!(!pool.release(&lease.session_id));
    let snapshot = pool.snapshot("a").unwrap();
    assert_eq!(snapshot.active_sessions, 0);
    assert_eq!(snapshot.observations, 0);
    assert_eq!(snapshot.address, "10.0.0.9:3128");
}

#[test]
fn test_remove_endpoint_cascades() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    pool.register_endpoint(endpoint("a", 5.0)).unwrap();
    pool.register_endpoint(endpoint("b", 1.0)).unwrap();

    let lease = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(lease.endpoint_id, "a");

    pool.remove_endpoint("a");
    assert!(matches!(
        pool.snapshot("a"),
        Err(PoolError::UnknownEndpoint(_))
    ));
    assert!(!pool.release(&lease.session_id));

    // The stale binding is gone: the client lands on the remaining endpoint.
    let rerouted = pool.acquire(AcquireOptions::for_client("client-1")).unwrap();
    assert_eq!(rerouted.endpoint_id, "b");
}

#[test]
fn test_snapshot_reflects_normalized_config() {
    let pool = EndpointPool::new(PoolSettings::default()).unwrap();
    let mut config = EndpointConfig::new("  a  ", "10.0.0.5:3128");
    config.failure_threshold = 1.4;
    config.recovery_threshold = 0.2;
    config.metadata.insert("region".into(), "eu-west".into());
    pool.register_endpoint(config).unwrap();

    let snapshot = pool.snapshot("a").unwrap();
    assert_eq!(snapshot.id, "a");
    assert_eq!(snapshot.weight, 1.0);
    assert!(snapshot.healthy);
    assert_eq!(snapshot.active_sessions, 0);
    assert_eq!(snapshot.metadata.get("region").map(String::as_str), Some("eu-west"));

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["id"], "a");
    assert_eq!(json["healthy"], true);
    assert!(json["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_capacity_invariant_under_concurrency() {
    common::init_tracing();

    const CAP: u32 = 4;
    let pool = Arc::new(EndpointPool::new(PoolSettings::default()).unwrap());
    pool.register_endpoint(EndpointConfig {
        max_sessions: Some(CAP),
        ..EndpointConfig::new("d", "10.0.0.5:3128")
    })
    .unwrap();

    let in_flight = Arc::new(AtomicU32::new(0));
    let violations = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let pool = pool.clone();
        let in_flight = in_flight.clone();
        let violations = violations.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..50 {
                match pool.acquire(AcquireOptions::default()) {
                    Ok(lease) => {
                        let holding = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                        if holding > CAP {
                            violations.fetch_add(1, Ordering::SeqCst);
                        }
                        tokio::task::yield_now().await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                        assert!(pool.release(&lease.session_id));
                    }
                    Err(PoolError::NotAvailable) => {
                        tokio::task::yield_now().await;
                    }
                    Err(err) => panic!("unexpected error: {err}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert_eq!(pool.snapshot("d").unwrap().active_sessions, 0);
}
