//! Terminal capability lookup
//!
//! Boundary to the external terminal database: callers hand in a
//! `TerminalCapabilities` implementation (terminfo-backed, usually) and the
//! accessors here resolve named capabilities to byte sequences, falling back
//! to well-known VT100-style defaults whenever the database has no answer.
//! A missing capability is never fatal.

use crate::keys::ESC;

/// Resolves terminfo capability names to raw byte sequences.
///
/// Implementations return `None` (or an empty sequence) when the capability
/// is unknown; every consumer in this crate falls back to a hardcoded
/// default in that case.
pub trait TerminalCapabilities {
    fn resolve(&self, name: &str) -> Option<Vec<u8>>;
}

/// A capability source that knows nothing, forcing every lookup onto the
/// documented defaults. Used in tests and on systems without a terminal
/// database.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCapabilities;

impl TerminalCapabilities for NullCapabilities {
    fn resolve(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}

fn seq_or_default(caps: &dyn TerminalCapabilities, name: &str, default: &[u8]) -> Vec<u8> {
    match caps.resolve(name) {
        Some(seq) if !seq.is_empty() => seq,
        _ => {
            log::warn!("no terminal capability for {name}, using default");
            default.to_vec()
        }
    }
}

fn str_or_default(caps: &dyn TerminalCapabilities, name: &str, default: &str) -> String {
    match caps.resolve(name) {
        Some(seq) if !seq.is_empty() => String::from_utf8_lossy(&seq).into_owned(),
        _ => {
            log::warn!("no terminal capability for {name}, using default");
            default.to_string()
        }
    }
}

// === Key capabilities ===

/// Up arrow key (`kcuu1`)
pub fn key_up(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "kcuu1", &[ESC, b'O', b'A'])
}

/// Down arrow key (`kcud1`)
pub fn key_down(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "kcud1", &[ESC, b'O', b'B'])
}

/// Left arrow key (`kcub1`)
pub fn key_left(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "kcub1", &[ESC, b'O', b'D'])
}

/// Right arrow key (`kcuf1`)
pub fn key_right(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "kcuf1", &[ESC, b'O', b'C'])
}

/// Home key (`khome`)
pub fn key_home(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "khome", &[ESC, b'O', b'H'])
}

/// End key (`kend`)
pub fn key_end(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "kend", &[ESC, b'O', b'F'])
}

/// Cursor-home control sequence (`home`)
pub fn home(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "home", &[ESC, b'[', b'H'])
}

/// Cursor-end control sequence (`end`)
pub fn end(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "end", &[ESC, b'[', b'F'])
}

/// Page-up key (`kpp`)
pub fn key_page_up(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "kpp", &[ESC, b'[', b'5', b'~'])
}

/// Page-down key (`knp`)
pub fn key_page_down(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "knp", &[ESC, b'[', b'6', b'~'])
}

/// Insert key (`kich1`)
pub fn key_insert(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "kich1", &[ESC, b'[', b'2', b'~'])
}

/// Delete key (`kdch1`)
pub fn key_delete(caps: &dyn TerminalCapabilities) -> Vec<u8> {
    seq_or_default(caps, "kdch1", &[ESC, b'[', b'3', b'~'])
}

// === Display-control capabilities ===
//
// Not consumed by the input path; exposed for the rendering side of a line
// editor so capability fallback lives in one place.

/// Save cursor position (`sc`)
pub fn save_cursor(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "sc", "\x1b[s")
}

/// Restore saved cursor position (`rc`)
pub fn restore_cursor(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "rc", "\x1b[u")
}

/// Clear screen (`clear`)
pub fn clear_screen(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "clear", "\x1b[2J")
}

/// Switch to the alternate screen buffer (`smcup`)
pub fn alternate_buffer(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "smcup", "\x1b[?1049h")
}

/// Switch back to the main screen buffer (`rmcup`)
pub fn main_buffer(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "rmcup", "\x1b[?1049l")
}

/// Inverted background (`smso`)
pub fn invert_background(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "smso", "\x1b[7m")
}

/// Normal background (`rmso`)
pub fn normal_background(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "rmso", "\x1b[27m")
}

/// Bold text (`bold`)
pub fn enable_bold(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "bold", "\x1b[0;1m")
}

/// Underlined text (`smul`)
pub fn enable_underline(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "smul", "\x1b[0;4m")
}

/// End underlined text (`rmul`)
pub fn disable_underline(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "rmul", "\x1b[0;24m")
}

/// Blinking text (`blink`)
pub fn enable_blink(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "blink", "\x1b[0;5m")
}

/// Reset to the terminal's original colors (`op`)
pub fn original_colors(caps: &dyn TerminalCapabilities) -> String {
    str_or_default(caps, "op", "\x1b[0;0m")
}
