use chrono::{DateTime, Duration, TimeZone, Utc};
use reservd::application::engine::ReservationEngine;
use reservd::domain::clock::ManualClock;
use reservd::domain::reservation::{ItemType, ReservationStatus};
use reservd::error::{ErrorKind, ReservationError};
use reservd::infrastructure::in_memory::InMemoryReservationStore;
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

fn engine_at(start: DateTime<Utc>) -> (Arc<ReservationEngine>, ManualClock) {
    let clock = ManualClock::new(start);
    let engine = ReservationEngine::new(Box::new(InMemoryReservationStore::new()))
        .with_clock(Arc::new(clock.clone()));
    (Arc::new(engine), clock)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_yield_single_hold() {
    let (engine, _clock) = engine_at(t0());

    let mut handles = Vec::new();
    for user in 1..=64 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine.create(user, 42, ItemType::Weapon).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => {
                assert!(matches!(e, ReservationError::AlreadyReserved { item_id: 42 }));
                assert_eq!(e.kind(), ErrorKind::Conflict);
            }
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_on_distinct_items_all_succeed() {
    let (engine, _clock) = engine_at(t0());

    let handles: Vec<_> = (1..=32)
        .map(|item| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.create(item, item, ItemType::Other).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sweep_races_with_cancel() {
    let (engine, clock) = engine_at(t0());

    let mut ids = Vec::new();
    for item in 1..=20 {
        ids.push(engine.create(1, item, ItemType::Armor).await.unwrap().id);
    }
    clock.advance(Duration::minutes(31));

    let sweeper = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.sweep().await })
    };
    let cancels: Vec<_> = ids
        .iter()
        .step_by(2)
        .map(|id| {
            let engine = engine.clone();
            let id = *id;
            tokio::spawn(async move { engine.cancel(id).await })
        })
        .collect();

    let expired = sweeper.await.unwrap().unwrap();
    let mut cancelled = 0;
    for cancel in cancels {
        if cancel.await.unwrap().is_ok() {
            cancelled += 1;
        }
    }

    // Every record ends in exactly one terminal state.
    assert_eq!(expired + cancelled, 20);
    for reservation in engine.list_by_user(1).await.unwrap() {
        assert!(reservation.status.is_terminal());
    }
}

#[tokio::test]
async fn test_expiry_scenario() {
    let (engine, clock) = engine_at(t0());

    let first = engine.create(1, 99, ItemType::Weapon).await.unwrap();
    assert_eq!(first.expires_at, t0() + Duration::minutes(30));

    clock.set(t0() + Duration::minutes(31));
    assert_eq!(engine.sweep().await.unwrap(), 1);
    assert_eq!(
        engine.get(first.id).await.unwrap().status,
        ReservationStatus::Expired
    );

    let second = engine.create(2, 99, ItemType::Weapon).await.unwrap();
    assert_eq!(second.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn test_invalid_item_id_fails_validation() {
    let (engine, _clock) = engine_at(t0());
    let err = engine.create(1, 0, ItemType::Other).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(engine.list_by_user(1).await.unwrap().is_empty());
}
