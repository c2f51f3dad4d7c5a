//! The worker's end of the request/event channel pair.

use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use log::debug;

use crate::event::Event;
use crate::request::Request;

/// Requests in, events out.
#[derive(Debug)]
pub struct Channels {
    requests: Receiver<Request>,
    events: Sender<Event>,
    closed: bool,
}

impl Channels {
    /// Creates the worker's channel ends.
    #[must_use]
    pub const fn new(requests: Receiver<Request>, events: Sender<Event>) -> Self {
        Self {
            requests,
            events,
            closed: false,
        }
    }

    /// Returns the next pending request, if any.
    ///
    /// A hung-up request sender marks the channels closed; the worker uses
    /// that as its shutdown signal.
    pub fn next_request(&mut self) -> Option<Request> {
        match self.requests.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.closed = true;
                None
            }
        }
    }

    /// Whether the application side hung up.
    #[must_use]
    pub const fn closed(&self) -> bool {
        self.closed
    }

    /// Delivers an event; a gone listener is not an error.
    pub fn notify(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("No event listener");
        }
    }
}
