//! Shell — the event loop that owns all display state.
//!
//! Architecture (mirrors the rest of the app):
//! - A `tokio::mpsc` channel carries `ShellMessage` events in from
//!   background contexts (input reader, engine connection, log
//!   subscription callbacks).
//! - The loop draws a frame when something changed, then awaits the next
//!   message.  All widget mutation happens here, single-threaded.
//! - Teardown closes the status bar (unsubscribe + cancel the deferred
//!   gate reset), then closes and drains the queue so no queued display
//!   event outlives the widget.

use std::io;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use deck_core::log::LogHub;
use deck_core::protocol::{EngineState, EngineUpdate, PlaybackStatus, PROTOCOL_VERSION};

use crate::status_bar::{PendingMessage, StatusBar};
use crate::theme::{C_ACCENT, C_CONNECTING, C_MUTED, C_PLAYING, C_PRIMARY, C_SEPARATOR};

// ── Internal event bus ────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ShellMessage {
    /// Keyboard/resize event from the blocking input reader.
    Event(Event),
    /// A state update from the engine connection.
    Engine(EngineUpdate),
    /// A log message that passed the rate limiter.
    Display(PendingMessage),
    /// The engine connection dropped; state is stale.
    ConnectionLost,
}

// ── Shell ─────────────────────────────────────────────────────────────────────

pub struct Shell {
    state: EngineState,
    connected: bool,
    status_bar: StatusBar,
    should_quit: bool,
}

impl Shell {
    pub fn new(hub: std::sync::Arc<LogHub>, tx: mpsc::UnboundedSender<ShellMessage>) -> Self {
        let status_bar = StatusBar::new(hub, tx);
        Self {
            state: EngineState::default(),
            connected: false,
            status_bar,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(
        mut self,
        tx: mpsc::UnboundedSender<ShellMessage>,
        mut rx: mpsc::UnboundedReceiver<ShellMessage>,
    ) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        info!("shell started");

        // ── Background task: keyboard events ──────────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.send(ShellMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });
        drop(tx);

        // Message expiry check — drives the 5 s display window.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                }

                _ = ui_tick.tick() => {
                    needs_redraw = self.status_bar.tick();
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.status_bar.close();
        rx.close();
        while rx.try_recv().is_ok() {}

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    // ── Message handling ──────────────────────────────────────────────────────

    /// Returns true when the display changed and a redraw is needed.
    fn handle_message(&mut self, msg: ShellMessage) -> bool {
        match msg {
            ShellMessage::Event(ev) => self.handle_event(ev),

            ShellMessage::Engine(update) => match update {
                EngineUpdate::Hello {
                    protocol_version,
                    state,
                } => {
                    if protocol_version != PROTOCOL_VERSION {
                        warn!(
                            "engine speaks protocol v{}, shell expects v{}",
                            protocol_version, PROTOCOL_VERSION
                        );
                    }
                    self.connected = true;
                    self.apply_state(state)
                }
                EngineUpdate::State { data } => {
                    self.connected = true;
                    self.apply_state(data)
                }
                // Log updates are published into the hub by the reader
                // and arrive here as Display messages instead.
                EngineUpdate::Log { .. } => false,
            },

            ShellMessage::Display(msg) => {
                self.status_bar.show_message(msg);
                true
            }

            ShellMessage::ConnectionLost => {
                self.connected = false;
                self.state = EngineState::default();
                self.status_bar.sync(&self.state);
                true
            }
        }
    }

    fn apply_state(&mut self, state: EngineState) -> bool {
        if state.rev < self.state.rev {
            debug!(
                "stale engine snapshot: rev {} after {}",
                state.rev, self.state.rev
            );
        }
        self.state = state;
        self.status_bar.sync(&self.state);
        true
    }

    fn handle_event(&mut self, ev: Event) -> bool {
        match ev {
            Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                    true
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.should_quit = true;
                    true
                }
                _ => false,
            },
            Event::Resize(_, _) => true,
            _ => false,
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        draw_separator(frame, chunks[2]);
        self.status_bar.draw(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let conn_span = if self.connected {
            Span::styled("●", Style::default().fg(C_PLAYING))
        } else {
            Span::styled("○", Style::default().fg(C_ACCENT))
        };

        let (label, color) = match self.state.playback {
            PlaybackStatus::Idle => ("idle", C_MUTED),
            PlaybackStatus::Connecting => ("connecting…", C_CONNECTING),
            PlaybackStatus::Playing => ("playing", C_PLAYING),
            PlaybackStatus::Paused => ("paused", C_CONNECTING),
            PlaybackStatus::Error => ("error", C_ACCENT),
        };

        let line = Line::from(vec![
            Span::styled(" tapedeck ", Style::default().fg(C_PRIMARY)),
            conn_span,
            Span::raw(" "),
            Span::styled(label, Style::default().fg(color)),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Draw a horizontal separator line.
fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::log::Severity;
    use deck_core::protocol::TrackFacts;
    use std::sync::Arc;

    fn shell() -> (Shell, mpsc::UnboundedReceiver<ShellMessage>) {
        let hub = Arc::new(LogHub::new());
        let (tx, rx) = mpsc::unbounded_channel();
        (Shell::new(hub, tx), rx)
    }

    fn snapshot(rev: u64) -> EngineState {
        EngineState {
            rev,
            playback: PlaybackStatus::Playing,
            ready: true,
            track: Some(TrackFacts {
                codec: Some("FLAC".to_string()),
                bitrate_bps: 912_000,
                sample_rate_hz: 44_100,
                channels: 2,
                gain_db: 0.0,
            }),
            selected_length_ms: 10_000,
            total_length_ms: 20_000,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn engine_state_marks_connected() {
        let (mut shell, _rx) = shell();
        assert!(!shell.connected);

        let redraw = shell.handle_message(ShellMessage::Engine(EngineUpdate::Hello {
            protocol_version: PROTOCOL_VERSION,
            state: snapshot(1),
        }));
        assert!(redraw);
        assert!(shell.connected);
        assert_eq!(shell.state.rev, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connection_lost_resets_state() {
        let (mut shell, _rx) = shell();
        shell.handle_message(ShellMessage::Engine(EngineUpdate::State { data: snapshot(3) }));
        assert!(shell.connected);

        let redraw = shell.handle_message(ShellMessage::ConnectionLost);
        assert!(redraw);
        assert!(!shell.connected);
        assert_eq!(shell.state.rev, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn display_message_reaches_the_bar() {
        let (mut shell, _rx) = shell();
        let redraw = shell.handle_message(ShellMessage::Display(PendingMessage {
            level: Severity::Warning,
            text: "underrun".to_string(),
        }));
        assert!(redraw);
        assert!(shell.status_bar.message_active());
    }

    #[tokio::test(start_paused = true)]
    async fn quit_keys() {
        use ratatui::crossterm::event::{KeyEvent, KeyEventState};

        let (mut shell, _rx) = shell();
        shell.handle_message(ShellMessage::Event(Event::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })));
        assert!(shell.should_quit);
    }
}
