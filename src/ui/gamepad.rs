//! Controller input via gilrs
//!
//! D-pad browses, South (A on Xbox layout) launches, East (B) or Start+Select
//! stops the running emulator.

use crate::events::{AppEvent, EventSender};
use crate::nav::NavEvent;
use gilrs::{Button, EventType, Gilrs};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Runs the controller loop on its own thread (Gilrs is not Send).
pub fn spawn(sender: EventSender) -> Option<JoinHandle<()>> {
    thread::Builder::new()
        .name("romshelf-gamepad".to_string())
        .spawn(move || run(sender))
        .map_err(|e| warn!("Could not start gamepad thread: {}", e))
        .ok()
}

fn run(sender: EventSender) {
    let mut gilrs = match Gilrs::new() {
        Ok(gilrs) => gilrs,
        Err(e) => {
            warn!("No controller support: {}", e);
            return;
        }
    };

    for (_id, gamepad) in gilrs.gamepads() {
        info!("🎮 Controller connected: {}", gamepad.name());
    }

    loop {
        while let Some(gilrs::Event { id, event, .. }) = gilrs.next_event() {
            let app_event = match event {
                EventType::ButtonPressed(button, _) => {
                    let gamepad = gilrs.gamepad(id);
                    map_button(button, |held| gamepad.is_pressed(held))
                }
                EventType::Connected => {
                    info!("🎮 Controller connected: {}", gilrs.gamepad(id).name());
                    None
                }
                EventType::Disconnected => {
                    info!("Controller disconnected");
                    None
                }
                _ => None,
            };

            if let Some(app_event) = app_event {
                if sender.send(app_event).is_err() {
                    return;
                }
            }
        }

        if sender.is_closed() {
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// `is_held` reports other buttons' state so Start+Select can be read as a chord
pub fn map_button(button: Button, is_held: impl Fn(Button) -> bool) -> Option<AppEvent> {
    let nav = |event: NavEvent| Some(AppEvent::Input(event));

    match button {
        Button::DPadUp => nav(NavEvent::NavigateUp),
        Button::DPadDown => nav(NavEvent::NavigateDown),
        Button::DPadLeft => nav(NavEvent::SwitchPlatformLeft),
        Button::DPadRight => nav(NavEvent::SwitchPlatformRight),
        Button::South => nav(NavEvent::Activate),
        Button::East => nav(NavEvent::Cancel),
        Button::Start if is_held(Button::Select) => nav(NavEvent::Cancel),
        Button::Select if is_held(Button::Start) => nav(NavEvent::Cancel),
        _ => None,
    }
}
