use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Current slide position for a deck. One logical row per deck,
/// last-write-wins; created implicitly on first advance or first read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideState {
    pub deck_id: String,
    pub slide_index: u32,
}

/// A live event fanned out to viewer connections.
///
/// Slide events are idempotent (viewers overwrite their local index with
/// the received value). Reaction events carry a unique id so receivers can
/// dedupe redeliveries from at-least-once paths and the polling fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Slide {
        #[serde(rename = "slideIndex")]
        slide_index: u32,
        timestamp: i64,
    },
    Reaction {
        emoji: String,
        #[serde(rename = "reactionId")]
        reaction_id: String,
        timestamp: i64,
    },
}

impl Event {
    pub fn slide(slide_index: u32) -> Self {
        Event::Slide {
            slide_index,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn reaction(emoji: impl Into<String>) -> Self {
        Event::Reaction {
            emoji: emoji.into(),
            reaction_id: new_reaction_id(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn reaction_id(&self) -> Option<&str> {
        match self {
            Event::Reaction { reaction_id, .. } => Some(reaction_id),
            Event::Slide { .. } => None,
        }
    }

    /// Serialize as an SSE data frame: `data: <json>\n\n`.
    pub fn to_frame(&self) -> String {
        // Event only contains integers and strings; serialization cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("data: {json}\n\n")
    }
}

/// Random 16-byte hex id for a reaction.
fn new_reaction_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}
