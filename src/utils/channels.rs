//! Event channels between worker threads and the UI thread
//!
//! Workers push events into an [`EventSink`]; the UI drains the matching
//! receiver once per frame. Every send also pokes the shared
//! [`RepaintSignal`] so an idle window wakes up to show the new state.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Callback that asks the UI to redraw
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Shared, late-bound repaint hook
///
/// Created before the egui context exists and filled in once it does.
#[derive(Clone, Default)]
pub struct RepaintSignal {
    notifier: Arc<RwLock<Option<Notifier>>>,
}

impl RepaintSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the redraw callback
    pub fn set(&self, notifier: Notifier) {
        *self.notifier.write() = Some(notifier);
    }

    /// Request a redraw if a callback is installed
    pub fn notify(&self) {
        if let Some(notifier) = self.notifier.read().as_ref() {
            notifier();
        }
    }
}

impl std::fmt::Debug for RepaintSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepaintSignal")
            .field("installed", &self.notifier.read().is_some())
            .finish()
    }
}

/// Sending half of a worker -> UI event channel
pub struct EventSink<T> {
    tx: Sender<T>,
    repaint: RepaintSignal,
}

impl<T> Clone for EventSink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            repaint: self.repaint.clone(),
        }
    }
}

impl<T> EventSink<T> {
    /// Deliver an event and wake the UI
    ///
    /// Returns false once the receiving side is gone.
    pub fn send(&self, event: T) -> bool {
        let delivered = self.tx.send(event).is_ok();
        if delivered {
            self.repaint.notify();
        } else {
            debug!("Event receiver dropped");
        }
        delivered
    }
}

/// Create a bounded event channel wired to `repaint`
pub fn event_channel<T>(capacity: usize, repaint: RepaintSignal) -> (EventSink<T>, Receiver<T>) {
    let (tx, rx) = bounded(capacity);
    (EventSink { tx, repaint }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_send_notifies_repaint() {
        let count = Arc::new(AtomicUsize::new(0));
        let signal = RepaintSignal::new();
        let counter = Arc::clone(&count);
        signal.set(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let (sink, rx) = event_channel::<u32>(4, signal);
        assert!(sink.send(7));
        assert!(sink.clone().send(8));

        assert_eq!(rx.try_recv().ok(), Some(7));
        assert_eq!(rx.try_recv().ok(), Some(8));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_send_without_receiver_reports_failure() {
        let (sink, rx) = event_channel::<u32>(1, RepaintSignal::new());
        drop(rx);
        assert!(!sink.send(1));
    }

    #[test]
    fn test_signal_without_notifier_is_noop() {
        RepaintSignal::new().notify();
    }
}
