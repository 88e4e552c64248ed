//! Batch workers.
//!
//! A fixed number of threads pull `ScanJob`s from the shared queue, run the
//! pipeline and send records back. One failed image never stops the batch.

use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use super::queue::{enqueue_all, ScanJob};
use super::BatchRecord;
use crate::ocr::TextRecognizer;
use crate::pipeline::PlatePipeline;

/// Runs one worker loop until the queue is drained.
fn run_scan_worker<R: TextRecognizer>(
    worker_id: usize,
    pipeline: &PlatePipeline<R>,
    jobs: &Mutex<Receiver<ScanJob>>,
    results: Sender<(usize, BatchRecord)>,
    at: NaiveDateTime,
) {
    loop {
        let job = match jobs.lock() {
            Ok(receiver) => receiver.recv(),
            Err(_) => break,
        };

        match job {
            Ok(job) => {
                crate::log(&format!(
                    "Worker {}: scanning {} ({})",
                    worker_id,
                    job.index + 1,
                    job.path.display()
                ));

                let record = match pipeline.process_path(&job.path, at) {
                    Ok(report) => BatchRecord::scanned(job.path, report),
                    Err(e) => {
                        crate::log(&format!("Worker {}: {}", worker_id, e));
                        BatchRecord::failed(job.path, e.to_string())
                    }
                };

                if results.send((job.index, record)).is_err() {
                    break;
                }
            }
            Err(_) => {
                // Channel closed, queue drained
                break;
            }
        }
    }
}

/// Scans `paths` with `workers` threads; records come back in input order.
pub fn run_batch<R: TextRecognizer>(
    pipeline: &PlatePipeline<R>,
    paths: &[PathBuf],
    workers: usize,
    at: NaiveDateTime,
) -> Vec<BatchRecord> {
    let workers = workers.clamp(1, paths.len().max(1));
    let jobs = Mutex::new(enqueue_all(paths));
    let (sender, receiver) = channel();

    crate::log(&format!(
        "Scanning {} image(s) with {} worker(s)",
        paths.len(),
        workers
    ));

    std::thread::scope(|scope| {
        for worker_id in 1..=workers {
            let results = sender.clone();
            let jobs = &jobs;
            scope.spawn(move || run_scan_worker(worker_id, pipeline, jobs, results, at));
        }
    });
    drop(sender);

    let mut indexed: Vec<(usize, BatchRecord)> = receiver.into_iter().collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, record)| record).collect()
}
