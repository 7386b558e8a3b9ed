//! Delivery of host events.

use tabcwd_protocol::HostEvent;
use tokio::sync::mpsc;

/// The host's dispatch capability.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, event: HostEvent);
}

/// Forwards events into a channel drained by the host loop.
#[derive(Debug, Clone)]
pub struct ChannelDispatch {
    sender: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelDispatch {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Dispatch for ChannelDispatch {
    fn dispatch(&self, event: HostEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Host event receiver dropped; event discarded");
        }
    }
}
