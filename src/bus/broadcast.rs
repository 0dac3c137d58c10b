//! In-process broadcast hub: one `tokio::sync::broadcast` channel per deck.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::AppError;
use crate::events::Event;

use super::{BusSubscription, EventBus};

/// Slow receivers that fall behind skip to live (RecvError::Lagged).
const CHANNEL_CAPACITY: usize = 256;

pub struct BroadcastBus {
    channels: RwLock<HashMap<String, broadcast::Sender<Event>>>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for BroadcastBus {
    fn publish(&self, deck_id: &str, event: Event) -> Result<(), AppError> {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        if let Some(sender) = channels.get(deck_id) {
            // send() errors when no receiver is subscribed. Events are
            // ephemeral, so an empty room simply drops them.
            let _ = sender.send(event);
        }
        Ok(())
    }

    fn subscribe(&self, deck_id: &str) -> Box<dyn BusSubscription> {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let sender = channels
            .entry(deck_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        Box::new(BroadcastSubscription {
            rx: Some(sender.subscribe()),
        })
    }
}

struct BroadcastSubscription {
    rx: Option<broadcast::Receiver<Event>>,
}

#[async_trait]
impl BusSubscription for BroadcastSubscription {
    async fn recv(&mut self) -> Option<Event> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("viewer lagged, skipped {skipped} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn unsubscribe(&mut self) {
        self.rx = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = BroadcastBus::new();
        let mut sub = bus.subscribe("deck1");
        bus.publish("deck1", Event::slide(3)).unwrap();
        let ev = sub.recv().await.unwrap();
        assert!(matches!(ev, Event::Slide { slide_index: 3, .. }));
    }

    #[tokio::test]
    async fn decks_are_isolated() {
        let bus = BroadcastBus::new();
        let mut sub = bus.subscribe("deck-a");
        bus.publish("deck-b", Event::slide(9)).unwrap();
        bus.publish("deck-a", Event::slide(1)).unwrap();
        let ev = sub.recv().await.unwrap();
        assert!(matches!(ev, Event::Slide { slide_index: 1, .. }));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let bus = BroadcastBus::new();
        assert!(bus.publish("empty-room", Event::reaction("🎉")).is_ok());
    }

    #[tokio::test]
    async fn recv_after_unsubscribe_returns_none() {
        let bus = BroadcastBus::new();
        let mut sub = bus.subscribe("deck1");
        sub.unsubscribe();
        sub.unsubscribe(); // idempotent
        assert!(sub.recv().await.is_none());
    }
}
