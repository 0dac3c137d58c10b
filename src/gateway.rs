//! Per-viewer connection lifecycle: init snapshot, live relay, heartbeat,
//! teardown.
//!
//! Each open stream is one spawned task feeding SSE frames into an
//! unbounded channel; the HTTP response body drains the channel. When the
//! client goes away the body stream is dropped, the next send fails, and
//! the task tears down: heartbeat timer dropped, bus subscription released
//! exactly once.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web::Bytes;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};

use crate::bus::EventBus;
use crate::errors::AppError;
use crate::store::StateStore;

/// SSE comment line, ignored by client libraries. Keeps intermediaries
/// from dropping the connection as idle.
const HEARTBEAT_FRAME: Bytes = Bytes::from_static(b": ping\n\n");

/// Open a gateway for one viewer. Returns the frame stream to use as the
/// response body, or an error if the initial snapshot cannot be read.
///
/// The subscription is opened before the snapshot read, so an advance that
/// lands between the two is still delivered live; the snapshot is at worst
/// one advance stale, never skipped. The init frame is queued before the
/// relay task starts, so it is always the first thing the viewer sees.
pub fn open(
    store: &Arc<dyn StateStore>,
    bus: &Arc<dyn EventBus>,
    deck_id: &str,
    heartbeat: Duration,
) -> Result<mpsc::UnboundedReceiver<Bytes>, AppError> {
    let mut sub = bus.subscribe(deck_id);

    let slide_index = store.get(deck_id)?.map(|s| s.slide_index).unwrap_or(0);

    let (tx, rx) = mpsc::unbounded_channel::<Bytes>();
    let init = format!("event: init\ndata: {{\"slide\":{slide_index}}}\n\n");
    let _ = tx.send(Bytes::from(init));

    let deck = deck_id.to_string();
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
        loop {
            tokio::select! {
                event = sub.recv() => {
                    match event {
                        Some(event) => {
                            if tx.send(Bytes::from(event.to_frame())).is_err() {
                                break;
                            }
                        }
                        // Bus closed the subscription; end the stream.
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if tx.send(HEARTBEAT_FRAME.clone()).is_err() {
                        break;
                    }
                }
            }
        }
        sub.unsubscribe();
        log::debug!("viewer stream for {deck} closed");
    });

    Ok(rx)
}
