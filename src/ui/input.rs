use crate::events::{AppEvent, EventSender};
use crate::nav::NavEvent;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

// How often the terminal is checked for keys - ticks go out at the configured rate
const KEY_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Forwards keyboard input and periodic ticks into the event channel.
/// Ends quietly once the receiving side is gone.
pub async fn pump_terminal_events(sender: EventSender, tick_rate: Duration) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        while event::poll(Duration::ZERO)? {
            let app_event = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => key_to_app_event(key),
                Event::Resize(_, _) => Some(AppEvent::Render),
                _ => None,
            };

            if let Some(app_event) = app_event {
                if sender.send(app_event).is_err() {
                    return Ok(());
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            if sender.send(AppEvent::Tick).is_err() {
                return Ok(());
            }
            last_tick = Instant::now();
        }

        tokio::time::sleep(KEY_POLL_INTERVAL).await;
    }
}

pub fn key_to_app_event(key: KeyEvent) -> Option<AppEvent> {
    let nav = |event: NavEvent| Some(AppEvent::Input(event));

    match key.code {
        // Quit the launcher itself
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(AppEvent::Quit),
        KeyCode::Char('q') => Some(AppEvent::Quit),

        // Browse
        KeyCode::Up | KeyCode::Char('k') => nav(NavEvent::NavigateUp),
        KeyCode::Down | KeyCode::Char('j') => nav(NavEvent::NavigateDown),
        KeyCode::Left | KeyCode::Char('h') => nav(NavEvent::SwitchPlatformLeft),
        KeyCode::Right | KeyCode::Char('l') => nav(NavEvent::SwitchPlatformRight),

        // Launch / stop the emulator
        KeyCode::Enter | KeyCode::Char(' ') => nav(NavEvent::Activate),
        KeyCode::Esc | KeyCode::Backspace => nav(NavEvent::Cancel),

        // Library
        KeyCode::F(5) | KeyCode::Char('r') => Some(AppEvent::Rescan),

        _ => None,
    }
}
