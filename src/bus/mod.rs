//! Pub/sub seam between the control path and viewer connections.
//!
//! One logical channel per deck. Two backends exist: an in-process
//! broadcast hub and a polling backend that substitutes periodic state
//! diffing when push-style delivery is unavailable. The stream gateway
//! only ever talks to these traits and never branches on the backend.

pub mod broadcast;
pub mod polling;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::events::Event;
use crate::store::StateStore;

pub use broadcast::BroadcastBus;
pub use polling::PollingBus;

/// A live subscription to one deck's channel. Dropping the subscription
/// releases it; `unsubscribe` does so explicitly and is idempotent.
#[async_trait]
pub trait BusSubscription: Send {
    /// Wait for the next event. `None` means the subscription is closed.
    async fn recv(&mut self) -> Option<Event>;

    fn unsubscribe(&mut self);
}

pub trait EventBus: Send + Sync {
    fn publish(&self, deck_id: &str, event: Event) -> Result<(), AppError>;
    fn subscribe(&self, deck_id: &str) -> Box<dyn BusSubscription>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusKind {
    Broadcast,
    Polling,
}

/// Select the bus backend once at startup. Runtime fallback between
/// backends is deliberately not supported.
pub fn build_bus(
    kind: BusKind,
    store: Arc<dyn StateStore>,
    poll_floor: Duration,
    poll_ceil: Duration,
) -> Arc<dyn EventBus> {
    match kind {
        BusKind::Broadcast => Arc::new(BroadcastBus::new()),
        BusKind::Polling => Arc::new(PollingBus::new(store, poll_floor, poll_ceil)),
    }
}
