//! UI sink backed by an unbounded channel.
//!
//! Events are queued for whichever task owns the UI; the loading flag is set
//! by that task as screens come and go.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::debug;

use crate::traits::{UiEvent, UiSink};

/// [`UiSink`] that forwards events over an mpsc channel.
#[derive(Debug)]
pub struct ChannelUi {
    tx: mpsc::UnboundedSender<UiEvent>,
    loading: AtomicBool,
}

impl ChannelUi {
    /// Create the sink and the receiving end for the UI task.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                loading: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// Record whether a loading-type screen is showing.
    pub fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::Release);
    }
}

impl UiSink for ChannelUi {
    fn is_loading_screen(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    fn dispatch(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            debug!("UI channel closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_reaches_receiver() {
        let (ui, mut rx) = ChannelUi::new();
        ui.dispatch(UiEvent::ShowUnauthenticated);
        assert_eq!(rx.try_recv().unwrap(), UiEvent::ShowUnauthenticated);
    }

    #[test]
    fn test_dispatch_after_receiver_dropped() {
        let (ui, rx) = ChannelUi::new();
        drop(rx);
        ui.dispatch(UiEvent::ShowUnauthenticated);
    }

    #[test]
    fn test_loading_flag() {
        let (ui, _rx) = ChannelUi::new();
        assert!(!ui.is_loading_screen());
        ui.set_loading(true);
        assert!(ui.is_loading_screen());
    }
}
