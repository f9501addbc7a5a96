//! Raw key byte sequences
//!
//! Centralizes the byte-level constants the resolver works with: the escape
//! introducer, control characters, and the two encodings terminals use for
//! each arrow key (CSI `ESC [ x` and SS3 `ESC O x`).

/// Escape introducer: the leading byte of every multi-byte control sequence
pub const ESC: u8 = 0x1b;

/// Horizontal tab
pub const TAB: u8 = 0x09;

/// Carriage return (Enter on most terminals)
pub const CR: u8 = 0x0d;

/// Line feed
pub const LF: u8 = 0x0a;

/// Backspace control character
pub const BS: u8 = 0x08;

/// Delete (what most terminals send for the Backspace key)
pub const DEL: u8 = 0x7f;

/// Control character for a letter key: Ctrl-A is 0x01, Ctrl-Z is 0x1a
#[inline]
pub fn ctrl(c: char) -> u8 {
    (c as u8) & 0x1f
}

// === Arrow key encodings ===
//
// Terminals disagree: some send CSI sequences, some SS3. Both encodings are
// bound by default, and both participate in the held-key repetition scan.

/// Up arrow, CSI encoding (`ESC [ A`)
pub const UP: &[u8] = &[ESC, b'[', b'A'];

/// Up arrow, SS3 encoding (`ESC O A`)
pub const UP_ALT: &[u8] = &[ESC, b'O', b'A'];

/// Down arrow, CSI encoding (`ESC [ B`)
pub const DOWN: &[u8] = &[ESC, b'[', b'B'];

/// Down arrow, SS3 encoding (`ESC O B`)
pub const DOWN_ALT: &[u8] = &[ESC, b'O', b'B'];

/// Left arrow, CSI encoding (`ESC [ D`)
pub const LEFT: &[u8] = &[ESC, b'[', b'D'];

/// Left arrow, SS3 encoding (`ESC O D`)
pub const LEFT_ALT: &[u8] = &[ESC, b'O', b'D'];

/// Right arrow, CSI encoding (`ESC [ C`)
pub const RIGHT: &[u8] = &[ESC, b'[', b'C'];

/// Right arrow, SS3 encoding (`ESC O C`)
pub const RIGHT_ALT: &[u8] = &[ESC, b'O', b'C'];

/// Directional patterns in the order the repetition rule checks them.
/// The order breaks ties between encodings and must not change.
pub const DIRECTIONAL_PRIORITY: &[&[u8]] = &[
    UP, UP_ALT, DOWN, DOWN_ALT, LEFT, LEFT_ALT, RIGHT, RIGHT_ALT,
];

/// True if the chunk opens with the escape introducer
#[inline]
pub fn starts_with_escape(bytes: &[u8]) -> bool {
    bytes.first() == Some(&ESC)
}

/// True if `chunk` is `pattern` repeated back-to-back one or more times.
///
/// A key held down is reported by some terminals as its full escape
/// sequence repeated in a single read, rather than coalesced.
pub fn is_repetition_of(chunk: &[u8], pattern: &[u8]) -> bool {
    if pattern.is_empty() || chunk.is_empty() || chunk.len() % pattern.len() != 0 {
        return false;
    }
    chunk.chunks_exact(pattern.len()).all(|part| part == pattern)
}
