//! Degraded-mode bus: periodic state diffing instead of push delivery.
//!
//! Slide changes are detected by re-reading the state store and comparing
//! against the last observed index; reactions flow through a bounded
//! best-effort log that subscribers drain and dedupe by reaction id. The
//! poll interval tightens on activity and relaxes toward a capped ceiling
//! under idle load.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::events::Event;
use crate::store::StateStore;

use super::{BusSubscription, EventBus};

/// Oldest reaction log entries are pruned past this length.
const REACTION_LOG_CAP: usize = 256;

/// Per-connection cap on remembered reaction ids.
const SEEN_IDS_CAP: usize = 512;

/// Consecutive quiet polls before the interval starts relaxing.
const IDLE_POLLS_BEFORE_BACKOFF: u32 = 3;

type ReactionLog = Arc<RwLock<HashMap<String, VecDeque<Event>>>>;

pub struct PollingBus {
    store: Arc<dyn StateStore>,
    reactions: ReactionLog,
    floor: Duration,
    ceil: Duration,
}

impl PollingBus {
    pub fn new(store: Arc<dyn StateStore>, floor: Duration, ceil: Duration) -> Self {
        Self {
            store,
            reactions: Arc::new(RwLock::new(HashMap::new())),
            floor,
            ceil,
        }
    }
}

impl EventBus for PollingBus {
    fn publish(&self, deck_id: &str, event: Event) -> Result<(), AppError> {
        match event {
            // Slide state is already durable in the store; the poll loop
            // picks the change up by diffing, so there is nothing to log.
            Event::Slide { .. } => Ok(()),
            Event::Reaction { .. } => {
                let mut log = self.reactions.write().unwrap_or_else(|e| e.into_inner());
                let deck_log = log.entry(deck_id.to_string()).or_default();
                deck_log.push_back(event);
                while deck_log.len() > REACTION_LOG_CAP {
                    deck_log.pop_front();
                }
                Ok(())
            }
        }
    }

    fn subscribe(&self, deck_id: &str) -> Box<dyn BusSubscription> {
        // Baseline the slide index at subscribe time so a caller that reads
        // its own snapshot afterwards never misses an interleaved advance.
        let last_slide = match self.store.get(deck_id) {
            Ok(state) => state.map(|s| s.slide_index),
            Err(e) => {
                log::warn!("poll baseline read failed for {deck_id}: {e}");
                None
            }
        };
        Box::new(PollSubscription {
            store: self.store.clone(),
            reactions: self.reactions.clone(),
            deck_id: deck_id.to_string(),
            last_slide,
            seen: SeenIds::new(SEEN_IDS_CAP),
            pending: VecDeque::new(),
            backoff: PollBackoff::new(self.floor, self.ceil),
            closed: false,
        })
    }
}

struct PollSubscription {
    store: Arc<dyn StateStore>,
    reactions: ReactionLog,
    deck_id: String,
    last_slide: Option<u32>,
    seen: SeenIds,
    pending: VecDeque<Event>,
    backoff: PollBackoff,
    closed: bool,
}

impl PollSubscription {
    /// One poll tick: diff slide state, drain unseen reactions.
    fn poll_once(&mut self) {
        match self.store.get(&self.deck_id) {
            Ok(state) => {
                let slide_index = state.map(|s| s.slide_index).unwrap_or(0);
                if self.last_slide != Some(slide_index) {
                    self.pending.push_back(Event::slide(slide_index));
                    self.last_slide = Some(slide_index);
                }
            }
            Err(e) => log::warn!("poll read failed for {}: {e}", self.deck_id),
        }

        let log = self.reactions.read().unwrap_or_else(|e| e.into_inner());
        if let Some(deck_log) = log.get(&self.deck_id) {
            for event in deck_log {
                if let Some(id) = event.reaction_id() {
                    if self.seen.insert(id) {
                        self.pending.push_back(event.clone());
                    }
                }
            }
        }
    }
}

#[async_trait]
impl BusSubscription for PollSubscription {
    async fn recv(&mut self) -> Option<Event> {
        loop {
            if self.closed {
                return None;
            }
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            tokio::time::sleep(self.backoff.interval()).await;
            if self.closed {
                return None;
            }
            self.poll_once();
            if self.pending.is_empty() {
                self.backoff.on_idle();
            } else {
                self.backoff.on_activity();
            }
        }
    }

    fn unsubscribe(&mut self) {
        self.closed = true;
        self.pending.clear();
    }
}

/// Bounded remember-set of reaction ids: insertion-ordered ring, oldest
/// ids forgotten first once the cap is reached.
struct SeenIds {
    order: VecDeque<String>,
    set: HashSet<String>,
    cap: usize,
}

impl SeenIds {
    fn new(cap: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(cap),
            set: HashSet::with_capacity(cap),
            cap,
        }
    }

    /// Returns true if the id was not seen before.
    fn insert(&mut self, id: &str) -> bool {
        if self.set.contains(id) {
            return false;
        }
        self.set.insert(id.to_string());
        self.order.push_back(id.to_string());
        while self.order.len() > self.cap {
            if let Some(old) = self.order.pop_front() {
                self.set.remove(&old);
            }
        }
        true
    }
}

/// Adaptive poll interval: snap to the floor on activity, relax by 1.5x
/// toward the ceiling after a run of quiet polls.
struct PollBackoff {
    interval: Duration,
    floor: Duration,
    ceil: Duration,
    idle_polls: u32,
}

impl PollBackoff {
    fn new(floor: Duration, ceil: Duration) -> Self {
        Self {
            interval: floor,
            floor,
            ceil,
            idle_polls: 0,
        }
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn on_activity(&mut self) {
        self.idle_polls = 0;
        self.interval = self.floor;
    }

    fn on_idle(&mut self) {
        self.idle_polls += 1;
        if self.idle_polls >= IDLE_POLLS_BEFORE_BACKOFF {
            self.interval = (self.interval * 3 / 2).min(self.ceil);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seen_ids_dedupe() {
        let mut seen = SeenIds::new(8);
        assert!(seen.insert("a"));
        assert!(!seen.insert("a"));
        assert!(seen.insert("b"));
    }

    #[test]
    fn seen_ids_forget_oldest_past_cap() {
        let mut seen = SeenIds::new(2);
        assert!(seen.insert("a"));
        assert!(seen.insert("b"));
        assert!(seen.insert("c")); // evicts "a"
        assert!(seen.insert("a"));
        assert_eq!(seen.order.len(), 2);
        assert_eq!(seen.set.len(), 2);
    }

    #[test]
    fn backoff_relaxes_then_snaps_back() {
        let floor = Duration::from_millis(100);
        let ceil = Duration::from_millis(1000);
        let mut backoff = PollBackoff::new(floor, ceil);

        for _ in 0..IDLE_POLLS_BEFORE_BACKOFF {
            backoff.on_idle();
        }
        assert!(backoff.interval() > floor);

        for _ in 0..32 {
            backoff.on_idle();
        }
        assert_eq!(backoff.interval(), ceil);

        backoff.on_activity();
        assert_eq!(backoff.interval(), floor);
    }
}
