// The one channel everything talks through.
// Input pump, gamepad thread and the ingest worker all hold a sender,
// the main loop owns the receiver and handles events one at a time.

use crate::nav::NavEvent;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Logical input from keyboard or controller
    Input(NavEvent),

    /// Ingestor moved a file into this platform's directory
    Refresh(String),

    /// User asked to re-read the current platform
    Rescan,

    // UI Events
    Tick,
    Render,
    Quit,
}

pub type EventSender = mpsc::UnboundedSender<AppEvent>;

pub struct EventHandler {
    event_sender: EventSender,
    event_receiver: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        Self {
            event_sender,
            event_receiver,
        }
    }

    pub fn sender(&self) -> EventSender {
        self.event_sender.clone()
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.event_receiver.recv().await
    }

    /// Non-blocking variant for draining whatever is already queued
    pub fn try_next_event(&mut self) -> Option<AppEvent> {
        self.event_receiver.try_recv().ok()
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_send_order_per_sender() {
        let mut handler = EventHandler::new();
        let input = handler.sender();
        let ingest = handler.sender();

        input.send(AppEvent::Input(NavEvent::NavigateDown)).unwrap();
        ingest.send(AppEvent::Refresh("nes".to_string())).unwrap();
        input.send(AppEvent::Input(NavEvent::Activate)).unwrap();

        assert_eq!(handler.next_event().await, Some(AppEvent::Input(NavEvent::NavigateDown)));
        assert_eq!(handler.next_event().await, Some(AppEvent::Refresh("nes".to_string())));
        assert_eq!(handler.next_event().await, Some(AppEvent::Input(NavEvent::Activate)));
        assert_eq!(handler.try_next_event(), None);
    }
}
