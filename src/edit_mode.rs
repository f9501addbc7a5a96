//! Edit-mode state machine
//!
//! Decides which operation the line editor actually executes, given what the
//! resolver made of the raw bytes and whether the line buffer is empty.
//! Tracks the per-session sub-mode (plain editing vs incremental search), a
//! pending completion-confirmation flag, and the EOF counter that keeps one
//! stray Ctrl-D from ending an interactive session.
//!
//! Every input has a defined transition; this component has no failure path.

use crate::bindings::Resolution;
use crate::keys;
use crate::operation::Operation;

/// Persistent editing sub-mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubMode {
    Edit,
    Search,
}

/// The one mutable record of per-session editing state. Owned by the state
/// machine and mutated nowhere else, so the machine stays trivially
/// testable.
#[derive(Debug, Clone)]
pub struct EditModeState {
    mode: SubMode,
    asking_confirmation: bool,
    eof_counter: u32,
    ignore_eof: u32,
    configured_ignore_eof: u32,
    eof_checked: bool,
}

impl EditModeState {
    fn new(ignore_eof: u32) -> Self {
        Self {
            mode: SubMode::Edit,
            asking_confirmation: false,
            eof_counter: 0,
            ignore_eof: 0,
            configured_ignore_eof: ignore_eof,
            eof_checked: false,
        }
    }
}

/// Consumes (raw chunk, resolution, buffer emptiness) and yields the
/// operation to execute, updating sub-mode and EOF state as it goes.
#[derive(Debug, Clone)]
pub struct EditModeStateMachine {
    state: EditModeState,
}

impl EditModeStateMachine {
    /// Machine in the initial EDIT state with the given ignore-EOF
    /// threshold: that many consecutive EOF keystrokes on an empty line are
    /// tolerated (answered with `IgnoreEof`) before `Eof` is emitted.
    pub fn new(ignore_eof: u32) -> Self {
        Self {
            state: EditModeState::new(ignore_eof),
        }
    }

    /// Current sub-mode
    pub fn mode(&self) -> SubMode {
        self.state.mode
    }

    /// Whether a completion confirmation is pending
    pub fn is_asking_confirmation(&self) -> bool {
        self.state.asking_confirmation
    }

    /// Arm or clear the completion-confirmation question. Set by the line
    /// editor when a completion produces more candidates than it will show
    /// unprompted.
    pub fn set_asking_confirmation(&mut self, pending: bool) {
        self.state.asking_confirmation = pending;
    }

    /// Consecutive EOF keystrokes seen on an empty line
    pub fn eof_counter(&self) -> u32 {
        self.state.eof_counter
    }

    /// Change the ignore-EOF threshold; takes effect at the next EOF run
    pub fn set_ignore_eof(&mut self, threshold: u32) {
        self.state.configured_ignore_eof = threshold;
    }

    /// Advance the machine one input and return the operation to execute.
    ///
    /// `chunk` is the raw input the resolution came from (the confirmation
    /// question and ESC handling look at the bytes themselves),
    /// `buffer_is_empty` reflects the externally owned line buffer.
    pub fn step(&mut self, chunk: &[u8], resolution: &Resolution, buffer_is_empty: bool) -> Operation {
        // Pending confirmation swallows everything: y/n answer it, anything
        // else leaves it pending.
        if self.state.asking_confirmation {
            return match chunk {
                b"y" => {
                    self.state.asking_confirmation = false;
                    Operation::Complete
                }
                b"n" => {
                    self.state.asking_confirmation = false;
                    Operation::CompleteAbort
                }
                _ => Operation::NoAction,
            };
        }

        match resolution.operation() {
            Some(op) => self.bound_input(op, buffer_is_empty),
            None => self.unbound_input(chunk),
        }
    }

    /// Input with no binding: ESC leaves search (or does nothing in edit
    /// mode), everything else is literal text for the current mode.
    fn unbound_input(&mut self, chunk: &[u8]) -> Operation {
        let is_escape = chunk == [keys::ESC];
        match self.state.mode {
            SubMode::Search => {
                if is_escape {
                    self.state.mode = SubMode::Edit;
                    Operation::SearchExit
                } else {
                    Operation::SearchInput
                }
            }
            SubMode::Edit => {
                if keys::starts_with_escape(chunk) {
                    Operation::NoAction
                } else {
                    Operation::Edit
                }
            }
        }
    }

    fn bound_input(&mut self, op: Operation, buffer_is_empty: bool) -> Operation {
        // Any operation other than EOF ends an EOF run.
        if op != Operation::Eof {
            self.reset_eof();
        }

        match self.state.mode {
            SubMode::Search => self.bound_in_search(op),
            SubMode::Edit => self.bound_in_edit(op, buffer_is_empty),
        }
    }

    /// Search mode remaps bound operations: only newline, the search
    /// operations themselves and backspace keep meaning; any other bound
    /// sequence (it started with escape to be multi-byte) is assumed to be
    /// stray input and becomes literal search text.
    fn bound_in_search(&mut self, op: Operation) -> Operation {
        match op {
            Operation::NewLine => {
                self.state.mode = SubMode::Edit;
                Operation::SearchEnd
            }
            Operation::SearchPrev => Operation::SearchPrevWord,
            Operation::SearchNextWord => Operation::SearchNextWord,
            Operation::DeletePrevChar => Operation::SearchDelete,
            _ => Operation::SearchInput,
        }
    }

    fn bound_in_edit(&mut self, op: Operation, buffer_is_empty: bool) -> Operation {
        if op.enters_search() {
            self.state.mode = SubMode::Search;
            return op;
        }

        if op == Operation::Eof {
            return self.eof_pressed(buffer_is_empty);
        }

        op
    }

    /// EOF on an empty line counts against the ignore threshold before the
    /// session is allowed to end; on a non-empty line it degrades to
    /// delete-next-char, the conventional terminal behavior.
    fn eof_pressed(&mut self, buffer_is_empty: bool) -> Operation {
        if !buffer_is_empty {
            self.reset_eof();
            return Operation::DeleteNextChar;
        }

        self.check_eof();
        if self.state.eof_counter > self.state.ignore_eof {
            Operation::Eof
        } else {
            self.state.eof_counter += 1;
            Operation::IgnoreEof
        }
    }

    /// Latch the configured threshold at the start of an EOF run
    fn check_eof(&mut self) {
        if !self.state.eof_checked {
            self.state.ignore_eof = self.state.configured_ignore_eof;
            self.state.eof_checked = true;
        }
    }

    fn reset_eof(&mut self) {
        self.state.eof_counter = 0;
        self.state.eof_checked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{KeyResolver, Resolution};
    use crate::terminfo::NullCapabilities;

    fn machine() -> EditModeStateMachine {
        EditModeStateMachine::new(0)
    }

    fn step_key(
        machine: &mut EditModeStateMachine,
        resolver: &KeyResolver,
        chunk: &[u8],
        buffer_is_empty: bool,
    ) -> Operation {
        let resolution = resolver.resolve(chunk);
        machine.step(chunk, &resolution, buffer_is_empty)
    }

    #[test]
    fn test_literal_input_in_edit_mode() {
        let mut machine = machine();
        assert_eq!(
            machine.step(b"a", &Resolution::Unmapped, true),
            Operation::Edit
        );
        assert_eq!(machine.mode(), SubMode::Edit);
    }

    #[test]
    fn test_bare_escape_in_edit_mode_is_no_action() {
        let mut machine = machine();
        assert_eq!(
            machine.step(&[keys::ESC], &Resolution::NoAction, true),
            Operation::NoAction
        );
    }

    #[test]
    fn test_search_entry_passes_operation_through() {
        let resolver = KeyResolver::emacs_defaults(&NullCapabilities);
        let mut machine = machine();

        let op = step_key(&mut machine, &resolver, &[keys::ctrl('r')], true);
        assert_eq!(op, Operation::SearchPrev);
        assert_eq!(machine.mode(), SubMode::Search);

        // Newline ends the search and returns to edit mode.
        let op = step_key(&mut machine, &resolver, &[keys::CR], true);
        assert_eq!(op, Operation::SearchEnd);
        assert_eq!(machine.mode(), SubMode::Edit);
    }

    #[test]
    fn test_search_mode_operation_routing() {
        let resolver = KeyResolver::emacs_defaults(&NullCapabilities);
        let mut machine = machine();
        step_key(&mut machine, &resolver, &[keys::ctrl('r')], true);

        // Repeated search-prev finds the previous match
        assert_eq!(
            step_key(&mut machine, &resolver, &[keys::ctrl('r')], true),
            Operation::SearchPrevWord
        );
        // The next-word operation passes through unchanged
        assert_eq!(
            step_key(&mut machine, &resolver, &[keys::ctrl('s')], true),
            Operation::SearchNextWord
        );
        // Backspace edits the search pattern
        assert_eq!(
            step_key(&mut machine, &resolver, &[keys::DEL], true),
            Operation::SearchDelete
        );
        // Any other bound escape sequence is stray input, not a command
        assert_eq!(
            step_key(&mut machine, &resolver, keys::UP, true),
            Operation::SearchInput
        );
        assert_eq!(machine.mode(), SubMode::Search);
    }

    #[test]
    fn test_search_mode_literal_and_escape() {
        let resolver = KeyResolver::emacs_defaults(&NullCapabilities);
        let mut machine = machine();
        step_key(&mut machine, &resolver, &[keys::ctrl('r')], true);

        assert_eq!(
            step_key(&mut machine, &resolver, b"q", true),
            Operation::SearchInput
        );
        assert_eq!(
            step_key(&mut machine, &resolver, &[keys::ESC], true),
            Operation::SearchExit
        );
        assert_eq!(machine.mode(), SubMode::Edit);
    }

    #[test]
    fn test_eof_threshold_counts_presses() {
        let mut machine = EditModeStateMachine::new(1);
        let eof = Resolution::Matched(Operation::Eof);
        let chunk = [keys::ctrl('d')];

        assert_eq!(machine.step(&chunk, &eof, true), Operation::IgnoreEof);
        assert_eq!(machine.step(&chunk, &eof, true), Operation::IgnoreEof);
        assert_eq!(machine.step(&chunk, &eof, true), Operation::Eof);
    }

    #[test]
    fn test_eof_on_nonempty_buffer_deletes_forward() {
        let mut machine = EditModeStateMachine::new(1);
        let eof = Resolution::Matched(Operation::Eof);
        let chunk = [keys::ctrl('d')];

        assert_eq!(machine.step(&chunk, &eof, true), Operation::IgnoreEof);
        assert_eq!(machine.eof_counter(), 1);

        assert_eq!(machine.step(&chunk, &eof, false), Operation::DeleteNextChar);
        assert_eq!(machine.eof_counter(), 0);
    }

    #[test]
    fn test_any_other_operation_resets_eof_run() {
        let resolver = KeyResolver::emacs_defaults(&NullCapabilities);
        let mut machine = EditModeStateMachine::new(1);
        let eof = Resolution::Matched(Operation::Eof);
        let chunk = [keys::ctrl('d')];

        assert_eq!(machine.step(&chunk, &eof, true), Operation::IgnoreEof);
        step_key(&mut machine, &resolver, &[keys::ctrl('a')], true);
        assert_eq!(machine.eof_counter(), 0);

        // The run starts over after the interruption.
        assert_eq!(machine.step(&chunk, &eof, true), Operation::IgnoreEof);
        assert_eq!(machine.step(&chunk, &eof, true), Operation::IgnoreEof);
        assert_eq!(machine.step(&chunk, &eof, true), Operation::Eof);
    }

    #[test]
    fn test_confirmation_swallows_input_until_answered() {
        let mut machine = machine();
        machine.set_asking_confirmation(true);

        assert_eq!(
            machine.step(b"x", &Resolution::Unmapped, true),
            Operation::NoAction
        );
        assert!(machine.is_asking_confirmation());

        assert_eq!(
            machine.step(b"y", &Resolution::Unmapped, true),
            Operation::Complete
        );
        assert!(!machine.is_asking_confirmation());
    }

    #[test]
    fn test_confirmation_abort() {
        let mut machine = machine();
        machine.set_asking_confirmation(true);
        assert_eq!(
            machine.step(b"n", &Resolution::Unmapped, true),
            Operation::CompleteAbort
        );
        assert!(!machine.is_asking_confirmation());
    }

    #[test]
    fn test_bound_operation_passes_through_in_edit_mode() {
        let resolver = KeyResolver::emacs_defaults(&NullCapabilities);
        let mut machine = machine();
        assert_eq!(
            step_key(&mut machine, &resolver, &[keys::ctrl('e')], false),
            Operation::MoveEnd
        );
        assert_eq!(
            step_key(&mut machine, &resolver, keys::LEFT, false),
            Operation::MovePrevChar
        );
    }

    #[test]
    fn test_held_arrow_in_edit_mode() {
        let resolver = KeyResolver::emacs_defaults(&NullCapabilities);
        let mut machine = machine();
        let held: Vec<u8> = keys::UP.repeat(3);
        assert_eq!(
            step_key(&mut machine, &resolver, &held, false),
            Operation::HistoryPrev
        );
    }
}
