//! Crossbeam-backed event channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sending half handed to the guard.
///
/// Cloneable and `Sync`, so rayon workers in a parallel batch share one.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event; dropped silently once nobody is listening
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half, usually drained on a front-end thread
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Blocking iterator that ends when every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

pub struct EventChannel;

impl EventChannel {
    /// Create a connected sender/receiver pair
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender for callers that do not follow progress
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BatchEvent, UploadEvent, UploadProgress};
    use std::thread;

    #[test]
    fn progress_crosses_threads_in_order() {
        let (sender, receiver) = EventChannel::new();

        let worker = thread::spawn(move || {
            for completed in 1..=3 {
                sender.send(Event::Upload(UploadEvent::Progress(UploadProgress {
                    completed,
                    total: 3,
                    current_file: format!("photo_{}.jpg", completed),
                })));
            }
        });
        worker.join().unwrap();

        let seen: Vec<usize> = receiver
            .iter()
            .filter_map(|event| match event {
                Event::Upload(UploadEvent::Progress(p)) => Some(p.completed),
                _ => None,
            })
            .collect();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn iteration_ends_after_last_clone_drops() {
        let (sender, receiver) = EventChannel::new();
        let clone = sender.clone();

        sender.send(Event::Batch(BatchEvent::Started { total_uploads: 2 }));
        drop(sender);
        clone.send(Event::Batch(BatchEvent::Started { total_uploads: 2 }));
        drop(clone);

        assert_eq!(receiver.iter().count(), 2);
    }

    #[test]
    fn null_sender_swallows_events() {
        null_sender().send(Event::Batch(BatchEvent::Started { total_uploads: 1 }));
    }
}
