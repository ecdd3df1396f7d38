//! Status bar — codec/length presentation plus rate-limited log messages.
//!
//! The bar subscribes to the log hub when constructed.  The subscription
//! callback runs on whatever thread published the record: it asks the
//! [`MessageGate`] whether the message may be displayed, reduces the
//! text to its last non-empty line, and hands a [`PendingMessage`] to
//! the shell queue.  The shell applies it single-threaded: the message
//! replaces the codec line for [`MESSAGE_TIMEOUT`], then the codec line
//! comes back.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{Duration, Instant};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use deck_core::log::{LogHub, Severity, SubscriberId};
use deck_core::protocol::EngineState;
use deck_core::timefmt::format_clock_ms;

use crate::gate::MessageGate;
use crate::shell::ShellMessage;
use crate::theme::{style_error_message, style_muted, style_secondary, style_warning_message};

/// How long an admitted message stays on screen.
pub const MESSAGE_TIMEOUT: Duration = Duration::from_millis(5000);

/// A message that passed the gate, reduced to a single line.
/// Ownership moves through the shell queue to the display step.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    pub level: Severity,
    pub text: String,
}

struct ActiveMessage {
    level: Severity,
    text: String,
    expires: Instant,
}

pub struct StatusBar {
    hub: Arc<LogHub>,
    subscription: Option<SubscriberId>,
    gate: MessageGate,
    message: Option<ActiveMessage>,
    codec_line: String,
    length_line: String,
}

impl StatusBar {
    /// Subscribes to `hub` at `Warning`; admitted messages are sent to
    /// `tx` as [`ShellMessage::Display`].  Must be called on the runtime
    /// that will run the deferred gate resets.
    pub fn new(hub: Arc<LogHub>, tx: UnboundedSender<ShellMessage>) -> Self {
        let gate = MessageGate::new();
        let subscription = {
            let gate = gate.clone();
            hub.subscribe(Severity::Warning, move |record| {
                if !gate.admit(record.level) {
                    return;
                }
                let text = last_non_empty_line(&record.text).to_string();
                let _ = tx.send(ShellMessage::Display(PendingMessage {
                    level: record.level,
                    text,
                }));
            })
        };

        Self {
            hub,
            subscription: Some(subscription),
            gate,
            message: None,
            codec_line: String::new(),
            length_line: format_length_line(&EngineState::default()),
        }
    }

    /// Display step — runs on the shell loop only.  Empty text falls
    /// back to the default presentation instead of showing a blank bar.
    pub fn show_message(&mut self, msg: PendingMessage) {
        if msg.text.is_empty() {
            self.message = None;
            return;
        }
        self.message = Some(ActiveMessage {
            level: msg.level,
            text: msg.text,
            expires: Instant::now() + MESSAGE_TIMEOUT,
        });
    }

    /// Expire the current message.  Returns true when the display
    /// changed and a redraw is needed.
    pub fn tick(&mut self) -> bool {
        let expired = self
            .message
            .as_ref()
            .is_some_and(|active| Instant::now() >= active.expires);
        if expired {
            // codec info comes back once the message is cleared
            self.message = None;
        }
        expired
    }

    /// Re-derive the codec and length lines from an engine snapshot.
    pub fn sync(&mut self, state: &EngineState) {
        self.codec_line = format_codec_line(state);
        self.length_line = format_length_line(state);
    }

    pub fn message_active(&self) -> bool {
        self.message.is_some()
    }

    /// Unsubscribe and cancel the pending deferred reset.  Idempotent;
    /// also invoked from `Drop` so teardown cannot be forgotten.
    pub fn close(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.hub.unsubscribe(id);
        }
        self.gate.shutdown();
        self.message = None;
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let length_width = (self.length_line.width() as u16).min(area.width);
        let left = Rect {
            x: area.x,
            y: area.y,
            width: area.width.saturating_sub(length_width + 1),
            height: 1,
        };
        let right = Rect {
            x: area.x + area.width - length_width,
            y: area.y,
            width: length_width,
            height: 1,
        };

        if let Some(active) = &self.message {
            let style = match active.level {
                Severity::Error => style_error_message(),
                _ => style_warning_message(),
            };
            let text = truncate_to_width(&active.text, left.width.saturating_sub(2) as usize);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(format!(" {} ", text), style))),
                left,
            );
        } else if !self.codec_line.is_empty() {
            let text = truncate_to_width(&self.codec_line, left.width.saturating_sub(1) as usize);
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::raw(" "),
                    Span::styled(text, style_secondary()),
                ])),
                left,
            );
        }

        frame.render_widget(
            Paragraph::new(Span::styled(self.length_line.clone(), style_muted())),
            right,
        );
    }
}

impl Drop for StatusBar {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Line building ─────────────────────────────────────────────────────────────

/// Multi-line log text is reduced to its last non-empty line before
/// display; the bar has exactly one row.
fn last_non_empty_line(text: &str) -> &str {
    text.lines().rev().find(|l| !l.is_empty()).unwrap_or("")
}

fn format_codec_line(state: &EngineState) -> String {
    if !state.ready {
        return String::new();
    }
    let Some(track) = &state.track else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::new();
    if let Some(codec) = &track.codec {
        parts.push(codec.clone());
    }
    match track.channels {
        0 => {}
        1 => parts.push("mono".to_string()),
        2 => parts.push("stereo".to_string()),
        n => parts.push(format!("{} channels", n)),
    }
    if track.sample_rate_hz > 0 {
        parts.push(format!("{} kHz", track.sample_rate_hz / 1000));
    }
    if track.bitrate_bps > 0 {
        parts.push(format!("{} kbit/s", track.bitrate_bps / 1000));
    }
    if track.gain_db != 0.0 {
        parts.push(format!("{:.2} dB", track.gain_db));
    }

    parts.join(", ")
}

fn format_length_line(state: &EngineState) -> String {
    format!(
        "{} / {}",
        format_clock_ms(state.selected_length_ms),
        format_clock_ms(state.total_length_ms)
    )
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    let mut width = 0usize;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        out.push(ch);
    }
    out
}
