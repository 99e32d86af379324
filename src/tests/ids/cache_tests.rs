use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::ids::{CacheError, CacheEvent, CacheState, IdCache, IdServiceError};
use crate::tests::support::{FailingService, SequenceService};

#[tokio::test]
async fn first_fetch_starts_on_construction() {
    let service = Arc::new(SequenceService::new());
    let cache = IdCache::new(service.clone(), 3);
    let mut events = cache.subscribe();

    assert_eq!(cache.state().await, CacheState::Fetching);
    cache.ready().await.unwrap();

    assert_eq!(events.recv().await.unwrap(), CacheEvent::Fetching { count: 3 });
    assert_eq!(
        events.recv().await.unwrap(),
        CacheEvent::NewIdentifiers { count: 3 }
    );
    assert_eq!(events.recv().await.unwrap(), CacheEvent::Ready);
    assert_eq!(cache.state().await, CacheState::Ready);
    assert_eq!(cache.buffered().await, 3);
    assert_eq!(service.requested(), vec![3]);
}

#[tokio::test]
async fn identifiers_are_issued_in_fetch_order_across_batches() {
    let service = Arc::new(SequenceService::new());
    let cache = IdCache::new(service.clone(), 2);

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(cache.request_identifier().await.unwrap());
    }

    assert_eq!(ids, ["id1", "id2", "id3", "id4", "id5"]);
    assert_eq!(cache.fetches().await, 3);
    assert_eq!(service.calls(), 3);
}

#[tokio::test]
async fn refill_is_armed_when_one_identifier_is_left() {
    let cache = IdCache::new(Arc::new(SequenceService::new()), 3);
    cache.ready().await.unwrap();

    cache.request_identifier().await.unwrap();
    cache.request_identifier().await.unwrap();
    assert!(!cache.is_fetching().await);
    assert_eq!(cache.buffered().await, 1);

    // handing out the last one must leave a fetch in flight
    assert_eq!(cache.request_identifier().await.unwrap(), "id3");
    assert_eq!(cache.buffered().await, 0);
    assert!(cache.is_fetching().await);
    assert_eq!(cache.state().await, CacheState::Fetching);

    assert_eq!(cache.request_identifier().await.unwrap(), "id4");
}

#[tokio::test]
async fn buffer_is_never_empty_without_a_fetch_in_flight() {
    let cache = IdCache::new(Arc::new(SequenceService::new()), 4);
    for _ in 0..25 {
        cache.request_identifier().await.unwrap();
        let empty = cache.buffered().await == 0;
        assert!(!empty || cache.is_fetching().await);
    }
}

#[tokio::test]
async fn at_most_one_fetch_is_in_flight() {
    let service = Arc::new(SequenceService::with_delay(Duration::from_millis(20)));
    let cache = IdCache::new(service.clone(), 2);

    let requests = (0..6).map(|_| cache.request_identifier());
    let ids: Vec<String> = join_all(requests)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(ids, ["id1", "id2", "id3", "id4", "id5", "id6"]);
    assert_eq!(service.max_in_flight(), 1);
    // three batches for six ids, plus the refill armed by the last one
    assert_eq!(cache.fetches().await, 4);
}

#[tokio::test]
async fn concurrent_waiters_are_served_in_arrival_order() {
    let service = Arc::new(SequenceService::with_delay(Duration::from_millis(10)));
    let cache = IdCache::new(service, 1);

    let mut waiters = Vec::new();
    for _ in 0..4 {
        let cache = cache.clone();
        waiters.push(async move { cache.request_identifier().await.unwrap() });
    }
    let ids = join_all(waiters).await;

    assert_eq!(ids, ["id1", "id2", "id3", "id4"]);
}

#[tokio::test]
async fn service_errors_are_broadcast_and_returned() {
    let cache = IdCache::new(Arc::new(FailingService::always()), 2);
    let mut events = cache.subscribe();

    let err = cache.request_identifier().await.unwrap_err();
    assert!(matches!(err, CacheError::Service(IdServiceError::Service(_))));

    assert_eq!(events.recv().await.unwrap(), CacheEvent::Fetching { count: 2 });
    assert_eq!(
        events.recv().await.unwrap(),
        CacheEvent::Error {
            message: "identifier service error: service unavailable".into()
        }
    );

    // nothing buffered and nothing armed
    assert_eq!(cache.state().await, CacheState::Empty);
    assert!(matches!(
        cache.request_identifier().await,
        Err(CacheError::Exhausted)
    ));
}

#[tokio::test]
async fn ready_fails_when_first_batch_fails() {
    let cache = IdCache::new(Arc::new(FailingService::always()), 2);
    assert!(matches!(cache.ready().await, Err(CacheError::Service(_))));
}

#[tokio::test]
async fn refill_failure_surfaces_on_the_waiting_request() {
    let cache = IdCache::new(Arc::new(FailingService::after(1)), 2);
    assert_eq!(cache.request_identifier().await.unwrap(), "id1");
    assert_eq!(cache.request_identifier().await.unwrap(), "id2");
    assert!(matches!(
        cache.request_identifier().await,
        Err(CacheError::Service(_))
    ));
}

#[tokio::test]
async fn ready_is_announced_once() {
    let cache = IdCache::new(Arc::new(SequenceService::new()), 1);
    let mut events = cache.subscribe();
    for _ in 0..3 {
        cache.request_identifier().await.unwrap();
    }

    let mut ready = 0;
    while let Ok(event) = events.try_recv() {
        if event == CacheEvent::Ready {
            ready += 1;
        }
    }
    assert_eq!(ready, 1);
}

#[tokio::test]
async fn zero_batch_size_is_raised_to_one() {
    let cache = IdCache::new(Arc::new(SequenceService::new()), 0);
    assert_eq!(cache.batch_size(), 1);
    assert_eq!(cache.endpoint(), "mock://sequence");
    assert_eq!(cache.request_identifier().await.unwrap(), "id1");
}
