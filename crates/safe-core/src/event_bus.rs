//! Event bus for publishing wallet events to observers.
//!
//! Backed by a tokio broadcast channel: publishing never blocks, and a
//! subscriber that falls behind by more than the capacity misses the oldest
//! events.

use safe_types::SafeEvent;
use tokio::sync::broadcast;

/// Broadcast channel of `SafeEvent`s.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<SafeEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Creates a receiver for events published from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<SafeEvent> {
		self.sender.subscribe()
	}

	/// Publishes `event`, failing only when nobody is subscribed.
	pub fn publish(
		&self,
		event: SafeEvent,
	) -> Result<usize, broadcast::error::SendError<SafeEvent>> {
		self.sender.send(event)
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(1024)
	}
}
