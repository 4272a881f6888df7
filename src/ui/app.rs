use super::{input, TerminalManager};
use crate::config::Config;
use crate::events::EventHandler;
use crate::ingest::{IngestSettings, Ingestor};
use crate::nav::LibraryView;
use crate::session::Session;
use anyhow::Result;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::{error, info, warn};

const HINTS: &str = "↑↓ select  ←→ system  Enter launch  Esc stop  r rescan  q quit";

pub struct App {
    config: Config,
    terminal: TerminalManager,
    event_handler: EventHandler,
    session: Session,
    ingestor: Option<Ingestor>,
}

impl App {
    pub async fn new(config: Config) -> Result<Self> {
        let event_handler = EventHandler::new();
        let mut session = Session::from_config(&config)?;

        // Auto-import is nice to have - the launcher works fine without it
        let ingestor = if config.ingest.enabled {
            let settings = IngestSettings {
                inbox: config.inbox.clone(),
                library_root: config.library_root.clone(),
                platforms: config.platforms(),
                sweep_on_start: config.ingest.sweep_on_start,
            };
            match Ingestor::spawn(settings, event_handler.sender()) {
                Ok(ingestor) => Some(ingestor),
                Err(e) => {
                    warn!("Auto-import disabled: {}", e);
                    session.set_status(format!("⚠ Auto-import off: {}", e));
                    None
                }
            }
        } else {
            None
        };

        let terminal = TerminalManager::new()?;

        Ok(Self {
            config,
            terminal,
            event_handler,
            session,
            ingestor,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Keyboard + ticks in the background
        let sender = self.event_handler.sender();
        let tick_rate = self.config.ui.tick_rate();
        tokio::spawn(async move {
            if let Err(e) = input::pump_terminal_events(sender, tick_rate).await {
                error!("Input pump died: {}", e);
            }
        });

        #[cfg(feature = "gamepad")]
        super::gamepad::spawn(self.event_handler.sender());

        // Main event loop - draw, then handle exactly one event
        let result = self.event_loop().await;

        self.shutdown();
        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        let show_hints = self.config.ui.show_hints;

        while !self.session.should_quit() {
            let view = self.session.view();
            self.terminal.draw(|f| render_ui(f, &view, show_hints))?;

            match self.event_handler.next_event().await {
                Some(event) => self.session.handle_event(event),
                None => break,
            }
        }

        Ok(())
    }

    /// Ingestor first (lets a move in progress finish), then the emulator
    fn shutdown(&mut self) {
        if let Some(mut ingestor) = self.ingestor.take() {
            ingestor.stop();
        }
        self.session.shutdown();
        info!("👋 romshelf shut down");
    }
}

fn render_ui(f: &mut Frame, view: &LibraryView, show_hints: bool) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Game list
            Constraint::Length(3), // Status
        ])
        .split(f.area());

    render_header(f, chunks[0], view);
    render_game_list(f, chunks[1], view);
    render_status(f, chunks[2], view, show_hints);
}

fn render_header(f: &mut Frame, area: Rect, view: &LibraryView) {
    let title = format!(
        "◀  System: {}  ▶   ({}/{})",
        view.platform_name,
        view.platform_index + 1,
        view.platform_count
    );

    let header = Paragraph::new(title)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title("romshelf"));

    f.render_widget(header, area);
}

fn render_game_list(f: &mut Frame, area: Rect, view: &LibraryView) {
    let items: Vec<ListItem> = view
        .entries
        .iter()
        .map(|entry| {
            let is_running = view.running.as_deref() == Some(entry.as_str());
            let prefix = if is_running { "▶ " } else { "  " };
            let style = if is_running {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}{}", prefix, entry)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Games"))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Green))
        .highlight_symbol("► ");

    let mut list_state = ListState::default();
    list_state.select(Some(view.selected));

    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_status(f: &mut Frame, area: Rect, view: &LibraryView, show_hints: bool) {
    let text = match (&view.status, show_hints) {
        (Some(status), _) => status.clone(),
        (None, true) => HINTS.to_string(),
        (None, false) => String::new(),
    };

    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, area);
}
