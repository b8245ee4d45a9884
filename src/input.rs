use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

/// Raw mode swallows SIGINT, so Ctrl-C is handled here along with q and Esc.
pub(crate) fn is_quit(k: &KeyEvent) -> bool {
    if k.kind != KeyEventKind::Press {
        return false;
    }
    match k.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') | KeyCode::Char('C') => k.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Drains pending terminal events without blocking longer than `timeout`.
pub(crate) fn quit_requested(timeout: Duration) -> anyhow::Result<bool> {
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if is_quit(&k) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
