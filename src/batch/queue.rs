//! Work queue feeding image paths to the batch workers.
//!
//! Uses std::sync::mpsc; the receiving end is shared by every worker.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// One image waiting to be scanned.
#[derive(Debug, Clone)]
pub struct ScanJob {
    /// Position in the input list (0-based), used to restore order
    pub index: usize,
    pub path: PathBuf,
}

impl ScanJob {
    pub fn new(index: usize, path: PathBuf) -> Self {
        Self { index, path }
    }
}

/// Creates a new work queue.
///
/// The channel is unbounded: the whole batch is queued up front and the
/// sender dropped, so workers exit once the queue drains.
pub fn create_work_queue() -> (Sender<ScanJob>, Receiver<ScanJob>) {
    channel()
}

/// Queues every path in order and closes the channel.
pub fn enqueue_all(paths: &[PathBuf]) -> Receiver<ScanJob> {
    let (sender, receiver) = create_work_queue();
    for (index, path) in paths.iter().enumerate() {
        // Receiver is alive in this scope, so send cannot fail
        let _ = sender.send(ScanJob::new(index, path.clone()));
    }
    receiver
}
