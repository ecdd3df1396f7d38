//! Color palette and style constants for the tapedeck shell.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_CONNECTING: Color = Color::Rgb(255, 184, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SEPARATOR: Color = Color::Rgb(40, 40, 52);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);

pub const C_WARNING: Color = Color::Rgb(255, 184, 80);
pub const C_WARNING_BG: Color = Color::Rgb(56, 44, 12);
pub const C_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_ERROR_BG: Color = Color::Rgb(56, 16, 16);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_warning_message() -> Style {
    Style::default()
        .fg(C_WARNING)
        .bg(C_WARNING_BG)
        .add_modifier(Modifier::BOLD)
}

pub fn style_error_message() -> Style {
    Style::default()
        .fg(C_ERROR)
        .bg(C_ERROR_BG)
        .add_modifier(Modifier::BOLD)
}
