//! Byte source implementations
//!
//! Two ready-made `ByteSource`s: `ReaderSource` adapts any blocking
//! `io::Read` (a PTY master's cloned reader, a pipe, stdin), and
//! `ChannelSource` is an in-process source whose handle pushes bytes and can
//! close the stream out from under a blocked read — used by tests and by
//! hosts that feed input programmatically.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use crate::capture::{ByteSource, NoopCloser, PollStatus, SourceCloser};

/// Wraps a blocking reader as a `ByteSource` for the `Block` discipline.
///
/// The availability check is unsupported; pair this source with
/// `ReadDiscipline::Block`. Without a closer, `stop()` takes effect at the
/// next byte (or EOF) the reader produces; pass one via `with_closer` when
/// the device can be closed out-of-band.
pub struct ReaderSource<R> {
    reader: R,
    closer: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl<R: Read + Send + 'static> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            closer: None,
        }
    }

    /// Attach a close callback invoked by `stop()` (e.g. closing the PTY
    /// master so the cloned reader unblocks)
    pub fn with_closer(mut self, close: impl Fn() + Send + Sync + 'static) -> Self {
        self.closer = Some(Arc::new(close));
        self
    }
}

struct FnCloser(Arc<dyn Fn() + Send + Sync>);

impl SourceCloser for FnCloser {
    fn close(&self) {
        (self.0)();
    }
}

impl<R: Read + Send + 'static> ByteSource for ReaderSource<R> {
    fn poll_available(&mut self) -> io::Result<PollStatus> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "reader source has no availability check, use the blocking discipline",
        ))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }

    fn closer(&self) -> Box<dyn SourceCloser> {
        match &self.closer {
            Some(close) => Box::new(FnCloser(Arc::clone(close))),
            None => Box::new(NoopCloser),
        }
    }
}

enum Feed {
    Data(Vec<u8>),
    Close,
}

/// Feeding side of a `ChannelSource`. Cheap to clone; closing is idempotent.
#[derive(Clone)]
pub struct ChannelSourceHandle {
    tx: Sender<Feed>,
}

impl ChannelSourceHandle {
    /// Queue bytes for the capture task. Bytes pushed after `close` are
    /// discarded.
    pub fn push(&self, bytes: Vec<u8>) {
        let _ = self.tx.send(Feed::Data(bytes));
    }

    /// End the stream. An in-flight blocking read observes EOF.
    pub fn close(&self) {
        let _ = self.tx.send(Feed::Close);
    }
}

struct HandleCloser {
    tx: Sender<Feed>,
}

impl SourceCloser for HandleCloser {
    fn close(&self) {
        let _ = self.tx.send(Feed::Close);
    }
}

/// In-process byte source backed by a channel. Supports both read
/// disciplines: `poll_available` reports what is queued, `read` blocks until
/// bytes or close arrive.
pub struct ChannelSource {
    rx: Receiver<Feed>,
    tx: Sender<Feed>,
    pending: VecDeque<u8>,
    closed: bool,
}

impl ChannelSource {
    pub fn new() -> (ChannelSourceHandle, ChannelSource) {
        let (tx, rx) = mpsc::channel();
        let handle = ChannelSourceHandle { tx: tx.clone() };
        let source = ChannelSource {
            rx,
            tx,
            pending: VecDeque::new(),
            closed: false,
        };
        (handle, source)
    }

    fn absorb(&mut self, feed: Feed) {
        match feed {
            Feed::Data(bytes) => self.pending.extend(bytes),
            Feed::Close => self.closed = true,
        }
    }

    /// Move everything queued on the channel into the pending buffer
    /// without blocking
    fn drain_channel(&mut self) {
        while !self.closed {
            match self.rx.try_recv() {
                Ok(feed) => self.absorb(feed),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                }
            }
        }
    }
}

impl ByteSource for ChannelSource {
    fn poll_available(&mut self) -> io::Result<PollStatus> {
        self.drain_channel();
        if !self.pending.is_empty() {
            Ok(PollStatus::Ready(self.pending.len()))
        } else if self.closed {
            Ok(PollStatus::Eof)
        } else {
            Ok(PollStatus::Empty)
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // One queued message per read, so the blocking discipline chunks
        // exactly the way bytes were pushed; the poll discipline drains the
        // channel in poll_available instead.
        while self.pending.is_empty() {
            if self.closed {
                return Ok(0);
            }
            match self.rx.recv() {
                Ok(feed) => self.absorb(feed),
                Err(_) => self.closed = true,
            }
        }
        let n = buf.len().min(self.pending.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.pending.pop_front().expect("pending not empty");
        }
        Ok(n)
    }

    fn closer(&self) -> Box<dyn SourceCloser> {
        Box::new(HandleCloser {
            tx: self.tx.clone(),
        })
    }
}
