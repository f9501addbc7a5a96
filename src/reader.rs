//! Input reader
//!
//! Composes the three core pieces into the consumer loop a line editor
//! drives: pull a captured chunk, resolve it against the key table, step the
//! edit-mode state machine, hand back the operation to execute. The line
//! buffer itself stays with the caller; this loop only needs to know whether
//! it is empty.

use crate::bindings::KeyResolver;
use crate::capture::{ByteSource, CaptureError, InputCaptureSession, RawByteChunk};
use crate::config::Config;
use crate::edit_mode::EditModeStateMachine;
use crate::operation::Operation;
use crate::terminfo::TerminalCapabilities;

/// One resolved step of the input loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    /// The operation the line editor should execute
    pub operation: Operation,
    /// The raw bytes behind it, needed when the operation is literal input
    /// (`Edit`, `SearchInput`)
    pub chunk: RawByteChunk,
}

/// Drives capture, resolution and the edit-mode state machine as one unit.
pub struct InputReader {
    session: InputCaptureSession,
    resolver: KeyResolver,
    machine: EditModeStateMachine,
}

impl InputReader {
    /// Reader with the default Emacs-style key table and the thresholds
    /// from `config`
    pub fn new(config: &Config, caps: &dyn TerminalCapabilities) -> Self {
        Self::with_parts(
            InputCaptureSession::with_discipline(
                crate::capture::ReadDiscipline::native(),
                config.queue_capacity,
            ),
            KeyResolver::emacs_defaults(caps),
            EditModeStateMachine::new(config.ignore_eof),
        )
    }

    /// Reader assembled from explicitly constructed parts
    pub fn with_parts(
        session: InputCaptureSession,
        resolver: KeyResolver,
        machine: EditModeStateMachine,
    ) -> Self {
        Self {
            session,
            resolver,
            machine,
        }
    }

    /// Begin capturing from `source`
    pub fn start<S: ByteSource>(&mut self, source: S) -> Result<(), CaptureError> {
        self.session.start(source)
    }

    /// Pull and interpret the next chunk of input.
    ///
    /// Returns `None` once the capture stream is closed and drained; hosts
    /// treat that as session termination, the same as an EOF operation past
    /// the ignore threshold.
    pub async fn next_operation(&mut self, buffer_is_empty: bool) -> Option<InputEvent> {
        let chunk = self.session.read_next().await?;
        let resolution = self.resolver.resolve(chunk.as_bytes());
        let operation = self
            .machine
            .step(chunk.as_bytes(), &resolution, buffer_is_empty);
        Some(InputEvent { operation, chunk })
    }

    /// Stop capturing; idempotent
    pub async fn stop(&mut self) {
        self.session.stop().await;
    }

    /// The key table, for rebinding
    pub fn resolver_mut(&mut self) -> &mut KeyResolver {
        &mut self.resolver
    }

    /// The edit-mode state machine, for confirmation arming and threshold
    /// changes
    pub fn machine_mut(&mut self) -> &mut EditModeStateMachine {
        &mut self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ReadDiscipline;
    use crate::edit_mode::SubMode;
    use crate::keys;
    use crate::source::ChannelSource;
    use crate::terminfo::NullCapabilities;

    fn reader(ignore_eof: u32) -> InputReader {
        InputReader::with_parts(
            InputCaptureSession::with_discipline(ReadDiscipline::Block, 32),
            KeyResolver::emacs_defaults(&NullCapabilities),
            EditModeStateMachine::new(ignore_eof),
        )
    }

    #[tokio::test]
    async fn test_bytes_become_operations_end_to_end() {
        let (handle, source) = ChannelSource::new();
        let mut reader = reader(0);
        reader.start(source).unwrap();

        handle.push(b"h".to_vec());
        handle.push(vec![keys::ctrl('a')]);
        handle.push(keys::UP.repeat(2));
        handle.push(vec![keys::CR]);
        handle.close();

        let mut ops = Vec::new();
        while let Some(event) = reader.next_operation(false).await {
            ops.push(event.operation);
        }
        assert_eq!(
            ops,
            vec![
                Operation::Edit,
                Operation::MoveBeginning,
                Operation::HistoryPrev,
                Operation::NewLine,
            ]
        );
        reader.stop().await;
    }

    #[tokio::test]
    async fn test_literal_chunk_is_preserved_for_insertion() {
        let (handle, source) = ChannelSource::new();
        let mut reader = reader(0);
        reader.start(source).unwrap();

        handle.push(b"hello".to_vec());
        let event = reader.next_operation(true).await.expect("event");
        assert_eq!(event.operation, Operation::Edit);
        assert_eq!(event.chunk.as_bytes(), b"hello");

        handle.close();
        reader.stop().await;
    }

    #[tokio::test]
    async fn test_search_session_through_the_loop() {
        let (handle, source) = ChannelSource::new();
        let mut reader = reader(0);
        reader.start(source).unwrap();

        handle.push(vec![keys::ctrl('r')]);
        handle.push(b"git".to_vec());
        handle.push(vec![keys::CR]);
        handle.close();

        assert_eq!(
            reader.next_operation(true).await.unwrap().operation,
            Operation::SearchPrev
        );
        assert_eq!(reader.machine_mut().mode(), SubMode::Search);
        assert_eq!(
            reader.next_operation(true).await.unwrap().operation,
            Operation::SearchInput
        );
        assert_eq!(
            reader.next_operation(true).await.unwrap().operation,
            Operation::SearchEnd
        );
        assert_eq!(reader.machine_mut().mode(), SubMode::Edit);
        reader.stop().await;
    }

    #[tokio::test]
    async fn test_closed_stream_ends_the_loop() {
        let (handle, source) = ChannelSource::new();
        let mut reader = reader(0);
        reader.start(source).unwrap();
        handle.close();

        assert_eq!(reader.next_operation(true).await, None);
        // Subsequent pulls stay closed.
        assert_eq!(reader.next_operation(true).await, None);
        reader.stop().await;
    }

    #[tokio::test]
    async fn test_eof_keystrokes_respect_threshold() {
        let (handle, source) = ChannelSource::new();
        let mut reader = reader(1);
        reader.start(source).unwrap();

        for _ in 0..3 {
            handle.push(vec![keys::ctrl('d')]);
        }
        handle.close();

        assert_eq!(
            reader.next_operation(true).await.unwrap().operation,
            Operation::IgnoreEof
        );
        assert_eq!(
            reader.next_operation(true).await.unwrap().operation,
            Operation::IgnoreEof
        );
        assert_eq!(
            reader.next_operation(true).await.unwrap().operation,
            Operation::Eof
        );
        reader.stop().await;
    }

    #[tokio::test]
    async fn test_confirmation_pending_through_the_loop() {
        let (handle, source) = ChannelSource::new();
        let mut reader = reader(0);
        reader.start(source).unwrap();
        reader.machine_mut().set_asking_confirmation(true);

        handle.push(b"x".to_vec());
        handle.push(b"y".to_vec());
        handle.close();

        assert_eq!(
            reader.next_operation(true).await.unwrap().operation,
            Operation::NoAction
        );
        assert_eq!(
            reader.next_operation(true).await.unwrap().operation,
            Operation::Complete
        );
        reader.stop().await;
    }
}
