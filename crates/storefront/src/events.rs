//! Cart change notifications.
//!
//! The cart store calls [`BroadcastObserver`] after each persisted mutation.
//! Subscribers (the SSE endpoint) read from the broadcast channel as a stream.

use async_stream::stream;
use futures::Stream;
use kenzy_core::{CartEvent, CartObserver};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the cart event channel. Slow subscribers skip older events.
pub const EVENT_CAPACITY: usize = 64;

/// Logs each cart change and publishes it on a broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    sender: broadcast::Sender<CartEvent>,
}

impl BroadcastObserver {
    #[must_use]
    pub const fn new(sender: broadcast::Sender<CartEvent>) -> Self {
        Self { sender }
    }
}

impl CartObserver for BroadcastObserver {
    fn on_change(&self, event: &CartEvent) {
        info!(
            kind = ?event.kind,
            product_id = event.product_id.as_ref().map(|id| id.as_str()),
            item_count = event.item_count,
            total = %event.total,
            "Cart updated"
        );
        // No subscribers is not an error.
        let _ = self.sender.send(event.clone());
    }
}

/// Cart events from `receiver` until the channel closes.
pub fn cart_events(mut receiver: broadcast::Receiver<CartEvent>) -> impl Stream<Item = CartEvent> {
    stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => yield event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Cart event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
