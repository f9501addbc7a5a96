//! Background input capture
//!
//! Owns the raw terminal byte source and keeps it drained so the device
//! never blocks writers: one background task per session reads chunks into a
//! bounded FIFO queue, and a single consumer pulls them with `read_next()`.
//! The queue is the only shared state; a full queue blocks the capture task
//! (backpressure), never the device.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Queue capacity in chunks
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Fixed read buffer for the blocking discipline
const READ_BUF_SIZE: usize = 1024;

/// Pause between polls when the device has nothing buffered
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Device-level capture failures. All of them are terminal to the session:
/// the stream closes and the consumer drains to `None`, nothing is retried.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture session already started")]
    AlreadyStarted,
    #[error("capture stream is closed")]
    Closed,
    #[error("device read failed: {0}")]
    Device(#[from] io::Error),
}

/// An ordered run of bytes captured together from one device read.
/// Guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawByteChunk {
    bytes: Vec<u8>,
}

impl RawByteChunk {
    /// Wrap captured bytes; empty reads never become chunks
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            None
        } else {
            Some(Self { bytes })
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: empty reads never become chunks
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for RawByteChunk {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// What a non-blocking availability check reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    /// This many bytes can be read without blocking
    Ready(usize),
    /// Nothing buffered right now
    Empty,
    /// The device reported end-of-stream
    Eof,
}

/// A raw byte device the capture task drains.
///
/// `read` may block; `poll_available` must not. A source only needs to
/// support the discipline it is used with (`ReadDiscipline`), the other
/// method may return `ErrorKind::Unsupported`.
pub trait ByteSource: Send + 'static {
    /// Non-blocking check of buffered byte count (poll discipline)
    fn poll_available(&mut self) -> io::Result<PollStatus>;

    /// Blocking read; `Ok(0)` means end-of-stream
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Handle that can close the device from another thread, unblocking an
    /// in-flight `read`
    fn closer(&self) -> Box<dyn SourceCloser>;
}

/// Detached close handle for a `ByteSource`, taken at session start so
/// `stop()` can close the device while the capture task is mid-read.
pub trait SourceCloser: Send + Sync {
    fn close(&self);
}

/// Closer for sources that cannot be interrupted; stop then takes effect at
/// the next poll interval or the next byte.
pub struct NoopCloser;

impl SourceCloser for NoopCloser {
    fn close(&self) {}
}

/// How the capture task reads the device. Terminal devices differ in
/// blocking behavior across platforms, so the discipline is picked once at
/// construction, never per-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadDiscipline {
    /// Check bytes-available, read exactly that many, sleep briefly when
    /// idle. For devices with a reliable availability check (POSIX ttys).
    Poll,
    /// Issue blocking reads up to a fixed buffer size. For devices where
    /// availability checks lie or block.
    Block,
}

impl ReadDiscipline {
    /// The discipline matching this platform's terminal semantics
    pub fn native() -> Self {
        if cfg!(unix) {
            ReadDiscipline::Poll
        } else {
            ReadDiscipline::Block
        }
    }
}

// Shared between the session handle and the capture task. `stopped` is the
// single close signal; the closer is taken (once) by whoever flips it first.
struct Shared {
    stopped: AtomicBool,
    closer: Mutex<Option<Box<dyn SourceCloser>>>,
}

impl Shared {
    /// Flip the session to stopped and close the device. Returns true for
    /// the caller that actually performed the shutdown, so a stop already
    /// in progress suppresses duplicate work and error noise.
    fn shutdown(&self) -> bool {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Some(closer) = self.closer.lock().unwrap().take() {
            closer.close();
        }
        true
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Non-blocking capture session: one background task drains the device into
/// a bounded queue, one consumer pulls chunks out in arrival order.
pub struct InputCaptureSession {
    discipline: ReadDiscipline,
    capacity: usize,
    chunk_rx: Option<mpsc::Receiver<RawByteChunk>>,
    shared: Option<Arc<Shared>>,
    task: Option<JoinHandle<()>>,
}

impl InputCaptureSession {
    /// Session using the platform's native read discipline and the default
    /// queue capacity
    pub fn new() -> Self {
        Self::with_discipline(ReadDiscipline::native(), DEFAULT_QUEUE_CAPACITY)
    }

    /// Session with an explicit discipline and queue capacity
    pub fn with_discipline(discipline: ReadDiscipline, capacity: usize) -> Self {
        Self {
            discipline,
            capacity: capacity.max(1),
            chunk_rx: None,
            shared: None,
            task: None,
        }
    }

    /// Begin capturing from `source` on a background task.
    ///
    /// A session captures from one source for its whole life; a second call
    /// fails with `CaptureError::AlreadyStarted`.
    pub fn start<S: ByteSource>(&mut self, source: S) -> Result<(), CaptureError> {
        if self.shared.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::channel(self.capacity);
        let shared = Arc::new(Shared {
            stopped: AtomicBool::new(false),
            closer: Mutex::new(Some(source.closer())),
        });

        let task_shared = Arc::clone(&shared);
        let discipline = self.discipline;
        self.task = Some(tokio::task::spawn_blocking(move || {
            capture_loop(source, tx, task_shared, discipline);
        }));
        self.chunk_rx = Some(rx);
        self.shared = Some(shared);
        log::debug!("input capture started ({discipline:?})");
        Ok(())
    }

    /// Pull the next captured chunk, waiting until one arrives.
    ///
    /// Returns `None` once the stream is closed and every buffered chunk has
    /// been drained. A session that was never started reads as closed.
    pub async fn read_next(&mut self) -> Option<RawByteChunk> {
        match self.chunk_rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// True once `stop()` has run or the capture task shut itself down.
    /// Buffered chunks may still be waiting in the queue.
    pub fn is_stopped(&self) -> bool {
        match &self.shared {
            Some(shared) => shared.is_stopped(),
            None => false,
        }
    }

    /// Close the source, mark the stream closed, and join the background
    /// task. Idempotent: repeated calls (or a call racing the capture task's
    /// own shutdown) do nothing further and never fail.
    pub async fn stop(&mut self) {
        if let Some(shared) = &self.shared {
            if shared.shutdown() {
                log::info!("input capture stopped, stream closed");
            }
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Default for InputCaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

enum Progress {
    Chunk,
    Idle,
    Eof,
}

fn capture_loop<S: ByteSource>(
    mut source: S,
    tx: mpsc::Sender<RawByteChunk>,
    shared: Arc<Shared>,
    discipline: ReadDiscipline,
) {
    let mut buf = [0u8; READ_BUF_SIZE];
    while !shared.is_stopped() {
        let step = match discipline {
            ReadDiscipline::Poll => poll_step(&mut source, &mut buf, &tx),
            ReadDiscipline::Block => block_step(&mut source, &mut buf, &tx),
        };
        match step {
            Ok(Progress::Chunk) => {}
            Ok(Progress::Idle) => std::thread::sleep(POLL_INTERVAL),
            Ok(Progress::Eof) => {
                shared.shutdown();
                break;
            }
            Err(err) => {
                // Errors surfaced mid-shutdown are expected (the closer just
                // yanked the device); only a live session logs them.
                if shared.shutdown() {
                    log::warn!("capture read failed, closing session: {err}");
                }
                break;
            }
        }
    }
    // Dropping the sender closes the stream; the consumer drains whatever
    // is queued and then observes the close.
}

fn poll_step<S: ByteSource>(
    source: &mut S,
    buf: &mut [u8],
    tx: &mpsc::Sender<RawByteChunk>,
) -> io::Result<Progress> {
    match source.poll_available()? {
        PollStatus::Eof => Ok(Progress::Eof),
        PollStatus::Empty => Ok(Progress::Idle),
        PollStatus::Ready(count) => {
            let want = count.min(buf.len());
            let n = source.read(&mut buf[..want])?;
            enqueue(&buf[..n], tx)
        }
    }
}

fn block_step<S: ByteSource>(
    source: &mut S,
    buf: &mut [u8],
    tx: &mpsc::Sender<RawByteChunk>,
) -> io::Result<Progress> {
    let n = source.read(buf)?;
    enqueue(&buf[..n], tx)
}

fn enqueue(bytes: &[u8], tx: &mpsc::Sender<RawByteChunk>) -> io::Result<Progress> {
    let Some(chunk) = RawByteChunk::new(bytes.to_vec()) else {
        return Ok(Progress::Eof);
    };
    // blocking_send provides the backpressure: a full queue parks the
    // capture task, not the device. A dropped receiver means the consumer
    // is gone, which ends the session like an EOF.
    match tx.blocking_send(chunk) {
        Ok(()) => Ok(Progress::Chunk),
        Err(_) => Ok(Progress::Eof),
    }
}
