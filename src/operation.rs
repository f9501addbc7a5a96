//! Logical editing operations
//!
//! The abstract vocabulary the rest of the input core speaks: byte sequences
//! resolve to an `Operation`, and the edit-mode state machine decides which
//! `Operation` the line editor finally executes. Nothing here knows about
//! byte encodings or terminal types.

/// A logical editing command, independent of the byte sequence that
/// triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Literal text input to insert into the line buffer
    Edit,
    /// Accept the current line
    NewLine,

    // Cursor movement
    MovePrevChar,
    MoveNextChar,
    MovePrevWord,
    MoveNextWord,
    MoveBeginning,
    MoveEnd,

    // History navigation
    HistoryPrev,
    HistoryNext,

    // Deletion
    DeletePrevChar,
    DeleteNextChar,
    DeletePrevWord,
    DeleteNextWord,
    DeleteBeginning,
    DeleteEnd,
    DeleteAll,

    // Incremental search
    SearchPrev,
    SearchNextWord,
    SearchPrevWord,
    SearchEnd,
    SearchExit,
    SearchInput,
    SearchDelete,

    // Completion
    Complete,
    CompleteAbort,

    // Kill-ring / misc editing
    Paste,
    Undo,
    Clear,
    Abort,

    // Session termination
    Eof,
    IgnoreEof,
    Exit,

    /// Input consumed with no effect
    NoAction,
}

impl Operation {
    /// True for the operations that put the editor into incremental search
    /// when received in edit mode.
    pub fn enters_search(self) -> bool {
        matches!(self, Operation::SearchPrev | Operation::SearchNextWord)
    }
}
