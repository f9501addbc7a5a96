//! crabline — input core for readline-style terminal line editing
//!
//! Turns raw bytes arriving from a terminal device into the editing
//! operations a line editor executes:
//!
//! - [`capture::InputCaptureSession`] drains the device on a background
//!   task into a bounded queue so the terminal never blocks
//! - [`bindings::KeyResolver`] maps byte sequences (escape sequences
//!   included, repeated or not) to logical [`operation::Operation`]s
//! - [`edit_mode::EditModeStateMachine`] folds in the editing sub-mode,
//!   completion confirmation and EOF counting to pick the operation that
//!   actually runs
//!
//! [`reader::InputReader`] wires the three together into the pull loop a
//! host drives. Rendering, history persistence and completion candidate
//! computation stay with the host.

pub mod alias;
pub mod bindings;
pub mod capture;
pub mod config;
pub mod edit_mode;
pub mod keys;
pub mod operation;
pub mod reader;
pub mod source;
pub mod terminfo;

pub use alias::{Alias, AliasCompletion, AliasManager};
pub use bindings::{KeyBinding, KeyResolver, Resolution, WorkingMode};
pub use capture::{
    ByteSource, CaptureError, InputCaptureSession, NoopCloser, PollStatus, RawByteChunk,
    ReadDiscipline, SourceCloser,
};
pub use config::Config;
pub use edit_mode::{EditModeStateMachine, SubMode};
pub use operation::Operation;
pub use reader::{InputEvent, InputReader};
pub use source::{ChannelSource, ChannelSourceHandle, ReaderSource};
pub use terminfo::{NullCapabilities, TerminalCapabilities};
