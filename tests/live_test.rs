//! Gateway lifecycle against real and test-double buses, plus the
//! degraded polling path.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actix_web::web::Bytes;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use lume_live::bus::{BusSubscription, EventBus, PollingBus};
use lume_live::errors::AppError;
use lume_live::events::Event;
use lume_live::gateway;

use common::setup_store;

async fn next_frame(rx: &mut mpsc::UnboundedReceiver<Bytes>) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("stream closed");
    String::from_utf8(frame.to_vec()).unwrap()
}

// --- Teardown (recording double) ---

struct RecordingBus {
    unsubscribe_calls: Arc<AtomicUsize>,
}

struct RecordingSubscription {
    unsubscribe_calls: Arc<AtomicUsize>,
}

#[async_trait]
impl BusSubscription for RecordingSubscription {
    async fn recv(&mut self) -> Option<Event> {
        std::future::pending().await
    }

    fn unsubscribe(&mut self) {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl EventBus for RecordingBus {
    fn publish(&self, _deck_id: &str, _event: Event) -> Result<(), AppError> {
        Ok(())
    }

    fn subscribe(&self, _deck_id: &str) -> Box<dyn BusSubscription> {
        Box::new(RecordingSubscription {
            unsubscribe_calls: self.unsubscribe_calls.clone(),
        })
    }
}

#[tokio::test]
async fn client_abort_releases_subscription_exactly_once() {
    let (_pool, store) = setup_store();
    let unsubscribe_calls = Arc::new(AtomicUsize::new(0));
    let bus: Arc<dyn EventBus> = Arc::new(RecordingBus {
        unsubscribe_calls: unsubscribe_calls.clone(),
    });

    let mut rx = gateway::open(&store, &bus, "deck1", Duration::from_millis(20)).unwrap();
    let _ = next_frame(&mut rx).await; // init
    drop(rx); // client goes away

    // Next heartbeat write fails and tears the connection down.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(unsubscribe_calls.load(Ordering::SeqCst), 1);
}

// --- Degraded mode (polling bus) ---

#[tokio::test]
async fn polling_subscription_sees_slide_change() {
    let (_pool, store) = setup_store();
    store.set("deck1", 1).unwrap();
    let bus = PollingBus::new(
        store.clone(),
        Duration::from_millis(10),
        Duration::from_millis(40),
    );

    let mut sub = bus.subscribe("deck1");
    store.set("deck1", 2).unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, Event::Slide { slide_index: 2, .. }));
}

#[tokio::test]
async fn polling_subscription_dedupes_redelivered_reactions() {
    let (_pool, store) = setup_store();
    store.set("deck1", 0).unwrap();
    let bus = PollingBus::new(
        store.clone(),
        Duration::from_millis(10),
        Duration::from_millis(40),
    );
    let mut sub = bus.subscribe("deck1");

    let dup = Event::Reaction {
        emoji: "👏".to_string(),
        reaction_id: "fixed-id".to_string(),
        timestamp: Utc::now().timestamp_millis(),
    };
    bus.publish("deck1", dup.clone()).unwrap();
    bus.publish("deck1", dup).unwrap();
    bus.publish(
        "deck1",
        Event::Reaction {
            emoji: "🔥".to_string(),
            reaction_id: "other-id".to_string(),
            timestamp: Utc::now().timestamp_millis(),
        },
    )
    .unwrap();

    let first = tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.reaction_id(), Some("fixed-id"));

    // The duplicate is swallowed; the next delivery is the distinct id.
    let second = tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.reaction_id(), Some("other-id"));
}

#[tokio::test]
async fn polling_subscription_stops_after_unsubscribe() {
    let (_pool, store) = setup_store();
    store.set("deck1", 0).unwrap();
    let bus = PollingBus::new(
        store.clone(),
        Duration::from_millis(10),
        Duration::from_millis(40),
    );
    let mut sub = bus.subscribe("deck1");
    sub.unsubscribe();
    sub.unsubscribe(); // idempotent
    assert!(sub.recv().await.is_none());
}

#[tokio::test]
async fn gateway_over_polling_bus_converges() {
    let (_pool, store) = setup_store();
    store.set("deck1", 1).unwrap();
    let bus: Arc<dyn EventBus> = Arc::new(PollingBus::new(
        store.clone(),
        Duration::from_millis(10),
        Duration::from_millis(40),
    ));

    let mut rx = gateway::open(&store, &bus, "deck1", Duration::from_secs(15)).unwrap();
    let init = next_frame(&mut rx).await;
    assert_eq!(init, "event: init\ndata: {\"slide\":1}\n\n");

    store.set("deck1", 4).unwrap();
    let frame = next_frame(&mut rx).await;
    assert!(frame.contains("\"slideIndex\":4"));

    bus.publish("deck1", Event::reaction("🎉")).unwrap();
    let frame = next_frame(&mut rx).await;
    assert!(frame.contains("\"type\":\"reaction\""));
    assert!(frame.contains("🎉"));
}
