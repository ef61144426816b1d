//! Concurrency tests for the rendezvous cache.
//!
//! Producers and consumers meet here without ordering assumptions, so these
//! tests pin down the visibility and wake-up behavior: no lost wake-ups, no
//! early timeouts, no torn values.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::time::sleep;

use yunmeng::RendezvousCache;

#[tokio::test]
async fn absent_key_with_zero_wait_returns_immediately() {
    let cache: RendezvousCache<Value> = RendezvousCache::new();
    let start = Instant::now();
    let value = cache.get("never_written", Duration::ZERO).await;
    assert_eq!(value, None);
    assert!(start.elapsed() < Duration::from_millis(50), "zero wait must not block");
}

#[tokio::test]
async fn completed_put_is_visible_from_any_task_without_waiting() {
    let cache = Arc::new(RendezvousCache::new());
    cache.put("k", json!({"action": "讀書"}));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            let value = cache.get("k", Duration::from_secs(1)).await;
            assert_eq!(value, Some(json!({"action": "讀書"})));
            assert!(start.elapsed() < Duration::from_millis(100));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn infinite_waiter_is_woken_by_a_concurrent_put() {
    let cache: Arc<RendezvousCache<Value>> = Arc::new(RendezvousCache::new());

    let waiter = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.wait_for("later").await })
    };

    sleep(Duration::from_millis(100)).await;
    cache.put("later", json!(42));

    let value = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .expect("waiter must be woken, not lost")
        .unwrap();
    assert_eq!(value, json!(42));
}

#[tokio::test]
async fn bounded_wait_on_a_never_written_key_lasts_the_full_budget() {
    let cache: RendezvousCache<Value> = RendezvousCache::new();
    let budget = Duration::from_millis(200);

    let start = Instant::now();
    let value = cache.get("never_written", budget).await;
    let elapsed = start.elapsed();

    assert_eq!(value, None);
    assert!(elapsed >= budget, "returned absent after only {elapsed:?}");
    assert!(elapsed < Duration::from_secs(1), "timeout overshot: {elapsed:?}");
}

#[tokio::test]
async fn concurrent_puts_to_one_key_leave_exactly_one_valid_value() {
    let cache: Arc<RendezvousCache<Value>> = Arc::new(RendezvousCache::new());
    let writers: i64 = 16;

    let mut handles = Vec::new();
    for i in 0..writers {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            cache.put("contested", json!(i));
        }));
    }
    // Concurrent readers must only ever see absent or a complete write.
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            if let Some(value) = cache.try_get("contested") {
                let n = value.as_i64().expect("torn value observed");
                assert!((0..writers).contains(&n));
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let survivor = cache.try_get("contested").expect("one value must remain");
    assert!((0..writers).contains(&survivor.as_i64().unwrap()));
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn overwrite_is_visible_to_every_later_read() {
    let cache = Arc::new(RendezvousCache::new());
    cache.put("k", json!("old"));
    cache.put("k", json!("new"));

    for _ in 0..4 {
        let cache = Arc::clone(&cache);
        let value = tokio::spawn(async move { cache.get("k", Duration::from_secs(1)).await })
            .await
            .unwrap();
        assert_eq!(value, Some(json!("new")));
    }
}

#[tokio::test]
async fn consumer_returns_as_soon_as_the_producer_publishes() {
    let cache: Arc<RendezvousCache<Value>> = Arc::new(RendezvousCache::new());

    let producer = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            cache.put("sch_li_15_minute_08:00", json!({"action": "讀書"}));
        })
    };

    let start = Instant::now();
    let value = cache
        .get("sch_li_15_minute_08:00", Duration::from_secs(5))
        .await;
    let elapsed = start.elapsed();

    assert_eq!(value, Some(json!({"action": "讀書"})));
    assert!(elapsed >= Duration::from_millis(900), "returned before the producer ran");
    assert!(
        elapsed < Duration::from_millis(2_500),
        "took {elapsed:?}, should return shortly after the 1s publish"
    );
    producer.await.unwrap();
}

#[tokio::test]
async fn unknown_key_times_out_after_roughly_its_budget() {
    let cache: Arc<RendezvousCache<Value>> = Arc::new(RendezvousCache::new());
    // Unrelated writes keep arriving; they must not satisfy this waiter.
    let noise = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            for i in 0..10 {
                cache.put(format!("other_{i}"), json!(i));
                sleep(Duration::from_millis(20)).await;
            }
        })
    };

    let start = Instant::now();
    let value = cache.get("unknown_key", Duration::from_millis(200)).await;
    let elapsed = start.elapsed();

    assert_eq!(value, None, "woken by an unrelated key's write");
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(1));
    noise.await.unwrap();
}

#[tokio::test]
async fn waiters_on_different_keys_each_get_their_own_value() {
    let cache: Arc<RendezvousCache<Value>> = Arc::new(RendezvousCache::new());

    let mut waiters = Vec::new();
    for i in 0..4 {
        let cache = Arc::clone(&cache);
        waiters.push(tokio::spawn(async move {
            let key = format!("slot_{i}");
            let value = cache.wait_for(&key).await;
            (i, value)
        }));
    }

    sleep(Duration::from_millis(50)).await;
    // Publish in reverse order; every waiter still ends up with its own.
    for i in (0..4).rev() {
        cache.put(format!("slot_{i}"), json!(format!("value_{i}")));
        sleep(Duration::from_millis(10)).await;
    }

    for waiter in waiters {
        let (i, value) = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("every waiter must be woken")
            .unwrap();
        assert_eq!(value, json!(format!("value_{i}")));
    }
}
