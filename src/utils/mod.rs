pub mod channels;

pub use channels::{event_channel, EventSink, Notifier, RepaintSignal};
