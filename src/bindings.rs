//! Key bindings and byte-sequence resolution
//!
//! The key table maps raw byte patterns to logical operations. Resolution
//! handles the awkward parts of the terminal protocol: the same logical key
//! has multiple encodings, input is unframed, and a held key can arrive as
//! its full escape sequence repeated back-to-back in one read.

use crate::keys;
use crate::operation::Operation;
use crate::terminfo::{self, TerminalCapabilities};

/// Scope a binding applies to. Only used to decide which existing binding a
/// new one replaces; lookup ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingMode {
    Edit,
    Search,
    All,
}

/// Association between a byte-sequence pattern and a logical operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pattern: Vec<u8>,
    operation: Operation,
    mode: WorkingMode,
}

impl KeyBinding {
    /// New binding scoped to edit mode (the common case)
    pub fn new(pattern: impl Into<Vec<u8>>, operation: Operation) -> Self {
        Self::scoped(pattern, operation, WorkingMode::Edit)
    }

    /// New binding with an explicit working mode
    pub fn scoped(pattern: impl Into<Vec<u8>>, operation: Operation, mode: WorkingMode) -> Self {
        Self {
            pattern: pattern.into(),
            operation,
            mode,
        }
    }

    pub fn pattern(&self) -> &[u8] {
        &self.pattern
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn mode(&self) -> WorkingMode {
        self.mode
    }
}

/// Outcome of resolving one byte chunk against the key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The chunk exactly matches a bound sequence, or is a bound escape
    /// sequence repeated back-to-back (a held key)
    Matched(Operation),
    /// The chunk starts with a bound directional sequence but carries
    /// trailing bytes that are not a whole repetition; the best candidate
    /// in priority order is reported
    Ambiguous(Operation),
    /// No escape introducer and no single-byte binding: literal text input
    Unmapped,
    /// Escape-led input that matches nothing, bare ESC included
    NoAction,
}

impl Resolution {
    /// The operation this resolution carries, if any
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Resolution::Matched(op) | Resolution::Ambiguous(op) => Some(*op),
            Resolution::Unmapped | Resolution::NoAction => None,
        }
    }
}

/// The set of all key bindings for a session.
///
/// Backed by a plain list: tables hold a few dozen entries and patterns are
/// a handful of bytes, so a scan beats hashing. Lookups never mutate.
#[derive(Debug, Default, Clone)]
pub struct KeyResolver {
    bindings: Vec<KeyBinding>,
}

impl KeyResolver {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-seeded with the given bindings
    pub fn with_bindings(bindings: Vec<KeyBinding>) -> Self {
        let mut resolver = Self::new();
        for binding in bindings {
            resolver.add(binding);
        }
        resolver
    }

    /// The default Emacs-style table, with arrow/home/end/delete sequences
    /// taken from the terminal database (falling back to VT100-style
    /// defaults) and both known arrow encodings bound.
    pub fn emacs_defaults(caps: &dyn TerminalCapabilities) -> Self {
        use Operation::*;

        let mut resolver = Self::new();
        let ctrl_bindings: &[(u8, Operation)] = &[
            (keys::ctrl('a'), MoveBeginning),
            (keys::ctrl('b'), MovePrevChar),
            (keys::ctrl('d'), Eof),
            (keys::ctrl('e'), MoveEnd),
            (keys::ctrl('f'), MoveNextChar),
            (keys::ctrl('g'), Abort),
            (keys::BS, DeletePrevChar),
            (keys::TAB, Complete),
            (keys::ctrl('k'), DeleteEnd),
            (keys::ctrl('l'), Clear),
            (keys::LF, NewLine),
            (keys::CR, NewLine),
            (keys::ctrl('n'), HistoryNext),
            (keys::ctrl('p'), HistoryPrev),
            (keys::ctrl('r'), SearchPrev),
            (keys::ctrl('s'), SearchNextWord),
            (keys::ctrl('u'), DeleteBeginning),
            (keys::ctrl('w'), DeletePrevWord),
            (keys::ctrl('y'), Paste),
            (keys::ctrl('_'), Undo),
            (keys::DEL, DeletePrevChar),
        ];
        for &(byte, op) in ctrl_bindings {
            resolver.add(KeyBinding::new(vec![byte], op));
        }

        // Meta sequences
        resolver.add(KeyBinding::new([keys::ESC, b'b'], MovePrevWord));
        resolver.add(KeyBinding::new([keys::ESC, b'f'], MoveNextWord));
        resolver.add(KeyBinding::new([keys::ESC, b'd'], DeleteNextWord));
        resolver.add(KeyBinding::new([keys::ESC, keys::DEL], DeletePrevWord));

        // Both arrow encodings participate in resolution; the terminal
        // database decides one, the fixed constants cover the other.
        for (pattern, op) in [
            (keys::UP, HistoryPrev),
            (keys::UP_ALT, HistoryPrev),
            (keys::DOWN, HistoryNext),
            (keys::DOWN_ALT, HistoryNext),
            (keys::LEFT, MovePrevChar),
            (keys::LEFT_ALT, MovePrevChar),
            (keys::RIGHT, MoveNextChar),
            (keys::RIGHT_ALT, MoveNextChar),
        ] {
            resolver.add(KeyBinding::new(pattern, op));
        }
        for (seq, op) in [
            (terminfo::key_up(caps), HistoryPrev),
            (terminfo::key_down(caps), HistoryNext),
            (terminfo::key_left(caps), MovePrevChar),
            (terminfo::key_right(caps), MoveNextChar),
            (terminfo::key_home(caps), MoveBeginning),
            (terminfo::home(caps), MoveBeginning),
            (terminfo::key_end(caps), MoveEnd),
            (terminfo::end(caps), MoveEnd),
            (terminfo::key_delete(caps), DeleteNextChar),
        ] {
            resolver.add(KeyBinding::new(seq, op));
        }

        resolver
    }

    /// All bindings, in insertion order
    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// Add a binding, replacing any existing one with the same pattern and
    /// working mode.
    pub fn add(&mut self, binding: KeyBinding) {
        self.bindings
            .retain(|b| !(b.pattern == binding.pattern && b.mode == binding.mode));
        self.bindings.push(binding);
    }

    /// Add a binding, replacing any existing one with the same pattern
    /// regardless of working mode. Used for global rebindings.
    pub fn add_ignoring_mode(&mut self, binding: KeyBinding) {
        self.bindings.retain(|b| b.pattern != binding.pattern);
        self.bindings.push(binding);
    }

    /// Add several bindings with `add` semantics
    pub fn add_all(&mut self, bindings: impl IntoIterator<Item = KeyBinding>) {
        for binding in bindings {
            self.add(binding);
        }
    }

    /// Remove every binding
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Exact pattern lookup
    pub fn find_operation(&self, pattern: &[u8]) -> Option<&KeyBinding> {
        self.bindings.iter().find(|b| b.pattern == pattern)
    }

    /// Resolve a byte chunk to its best interpretation.
    ///
    /// Exact matches win. Otherwise, escape-led chunks are checked against
    /// the directional encodings in fixed priority order: an exact
    /// back-to-back repetition of a bound pattern (a held key) counts as a
    /// match and collapses to a single operation signal; a prefix match
    /// with leftover bytes is reported as ambiguous with the candidate
    /// operation. Escape-led chunks matching nothing resolve to no action,
    /// and anything else is literal input for the caller to insert.
    pub fn resolve(&self, chunk: &[u8]) -> Resolution {
        if chunk.is_empty() {
            return Resolution::Unmapped;
        }
        if let Some(binding) = self.find_operation(chunk) {
            return Resolution::Matched(binding.operation);
        }
        if !keys::starts_with_escape(chunk) {
            return Resolution::Unmapped;
        }
        for pattern in keys::DIRECTIONAL_PRIORITY {
            if !chunk.starts_with(pattern) {
                continue;
            }
            if let Some(binding) = self.find_operation(pattern) {
                if keys::is_repetition_of(chunk, pattern) {
                    return Resolution::Matched(binding.operation);
                }
                return Resolution::Ambiguous(binding.operation);
            }
        }
        Resolution::NoAction
    }
}
