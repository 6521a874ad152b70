//! Concurrent release scanning.
//!
//! [`ReleaseScanner`] fans lines out to a pool of worker threads running the
//! single-line parser. The input channel is bounded, every blocking send and
//! receive observes cancellation, output order is not preserved (each scan
//! carries a monotonic id for reordering), and a panicking parse is captured
//! as a structured error without killing the pool.

use std::io::BufRead;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded, select};

use crate::parser::TagParser;
use crate::types::Release;

/// One scanned line.
#[derive(Debug)]
pub struct Scan {
    /// The parsed release.
    pub release: Release,
    /// The input line.
    pub line: String,
    /// Monotonic assignment id, starting at 1.
    pub id: u64,
}

/// A scanner failure: a reader error or a captured worker panic.
#[derive(Debug)]
pub enum ScanError {
    /// The input reader failed.
    Read {
        /// Id that would have been assigned to the failed line.
        id: u64,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// A worker panicked while parsing a line.
    Panic {
        /// Worker index.
        worker: usize,
        /// Id of the line being parsed.
        id: u64,
        /// The line being parsed.
        line: String,
        /// Stringified panic payload.
        message: String,
        /// Captured backtrace.
        backtrace: String,
    },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::Read { id, source } => write!(f, "read line {id}: {source}"),
            ScanError::Panic {
                worker,
                id,
                line,
                message,
                ..
            } => write!(f, "worker {worker}: {id} {line:?}: {message}"),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Read { source, .. } => Some(source),
            ScanError::Panic { .. } => None,
        }
    }
}

/// Cooperative cancellation for a scan in flight.
///
/// Cloning shares the token. Cancelling unblocks every pending channel
/// operation in the pool.
#[derive(Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    tx: Arc<Mutex<Option<Sender<()>>>>,
    rx: Receiver<()>,
}

impl CancelToken {
    /// Creates a fresh, uncancelled token.
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(Mutex::new(Some(tx))),
            rx,
        }
    }

    /// Cancels the scan. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }
    }

    /// Whether the token was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn done(&self) -> &Receiver<()> {
        &self.rx
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A concurrent release scanner over a shared parser.
pub struct ReleaseScanner {
    parser: Arc<TagParser>,
    workers: usize,
}

impl ReleaseScanner {
    /// Creates a scanner with one worker per available CPU.
    pub fn new(parser: TagParser) -> Self {
        Self::with_workers(parser, num_cpus::get())
    }

    /// Creates a scanner with an explicit worker count (minimum 1).
    pub fn with_workers(parser: TagParser, workers: usize) -> Self {
        ReleaseScanner {
            parser: Arc::new(parser),
            workers: workers.max(1),
        }
    }

    /// The configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Scans lines from the reader until it is exhausted or the token is
    /// cancelled, returning a stream of unordered results.
    pub fn scan_reader<R>(&self, rdr: R, cancel: CancelToken) -> ScanStream
    where
        R: BufRead + Send + 'static,
    {
        let (in_tx, in_rx) = bounded::<Scan>(self.workers * 2);
        let (out_tx, out_rx) = bounded::<Scan>(self.workers * 2);
        let errors = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::with_capacity(self.workers + 1);

        // producer: read lines, assign monotonic ids
        let producer_cancel = cancel.clone();
        let producer_errors = Arc::clone(&errors);
        handles.push(std::thread::spawn(move || {
            let mut id = 0u64;
            for line in rdr.lines() {
                id += 1;
                let line = match line {
                    Ok(line) => line.strip_suffix('\n').unwrap_or(&line).to_string(),
                    Err(source) => {
                        record(&producer_errors, ScanError::Read { id, source });
                        return;
                    }
                };
                let scan = Scan {
                    release: Release::default(),
                    line,
                    id,
                };
                select! {
                    send(in_tx, scan) -> res => {
                        if res.is_err() {
                            return;
                        }
                    }
                    recv(producer_cancel.done()) -> _ => return,
                }
            }
        }));

        // workers: parse, forward
        for worker in 0..self.workers {
            let parser = Arc::clone(&self.parser);
            let in_rx = in_rx.clone();
            let out_tx = out_tx.clone();
            let errors = Arc::clone(&errors);
            let cancel = cancel.clone();
            handles.push(std::thread::spawn(move || {
                loop {
                    let mut scan = select! {
                        recv(in_rx) -> msg => match msg {
                            Ok(scan) => scan,
                            Err(_) => return,
                        },
                        recv(cancel.done()) -> _ => return,
                    };
                    let parsed = catch_unwind(AssertUnwindSafe(|| {
                        parser.parse_release(scan.line.as_bytes())
                    }));
                    match parsed {
                        Ok(release) => {
                            scan.release = release;
                            select! {
                                send(out_tx, scan) -> res => {
                                    if res.is_err() {
                                        return;
                                    }
                                }
                                recv(cancel.done()) -> _ => return,
                            }
                        }
                        Err(payload) => {
                            let message = panic_message(&payload);
                            tracing::warn!(worker, id = scan.id, line = %scan.line, %message, "parse panicked");
                            record(
                                &errors,
                                ScanError::Panic {
                                    worker,
                                    id: scan.id,
                                    line: scan.line,
                                    message,
                                    backtrace: std::backtrace::Backtrace::force_capture()
                                        .to_string(),
                                },
                            );
                        }
                    }
                }
            }));
        }
        drop(in_rx);
        drop(out_tx);

        ScanStream {
            rx: out_rx,
            errors,
            handles,
        }
    }
}

/// The stream of scan results. Iterate to drain; results are unordered.
pub struct ScanStream {
    rx: Receiver<Scan>,
    errors: Arc<Mutex<Vec<ScanError>>>,
    handles: Vec<JoinHandle<()>>,
}

impl Iterator for ScanStream {
    type Item = Scan;

    fn next(&mut self) -> Option<Scan> {
        self.rx.recv().ok()
    }
}

impl ScanStream {
    /// Joins the pool and returns every captured error. Call after the
    /// stream is drained (or cancelled).
    pub fn errors(&mut self) -> Vec<ScanError> {
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        match self.errors.lock() {
            Ok(mut v) => v.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Joins the pool and returns the first captured error, if any.
    pub fn err(&mut self) -> Option<ScanError> {
        self.errors().into_iter().next()
    }
}

fn record(errors: &Mutex<Vec<ScanError>>, err: ScanError) {
    if let Ok(mut v) = errors.lock() {
        v.push(err);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
