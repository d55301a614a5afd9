// Batch calculation module
// Hashes a list of files one at a time on a background thread, publishing
// progress and results as events

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use tracing::{debug, error, info, warn};

use super::digest::{DigestEngine, HashAlgorithm};
use super::error::{HashCalcError, Result};
use super::fs::FileSystem;
use super::input::EntryId;
use super::progress::{ProgressReader, ReadProgress};

/// One file queued for a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashJob {
    pub id: EntryId,
    pub path: String,
}

impl HashJob {
    pub fn new(id: EntryId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

/// Per-file digest primitive used by the coordinator
pub trait FileHasher: Send + Sync {
    /// Hash the file at `path`, reporting read progress as it goes
    fn hash_file(
        &self,
        algorithm: HashAlgorithm,
        path: &str,
        progress: &mut (dyn FnMut(ReadProgress) + Send),
    ) -> Result<String>;
}

/// FileHasher that streams files from a FileSystem through the DigestEngine
pub struct FileHashCalculator {
    fs: Arc<dyn FileSystem>,
    engine: DigestEngine,
}

impl FileHashCalculator {
    pub fn new(fs: Arc<dyn FileSystem>, engine: DigestEngine) -> Self {
        Self { fs, engine }
    }
}

impl FileHasher for FileHashCalculator {
    fn hash_file(
        &self,
        algorithm: HashAlgorithm,
        path: &str,
        progress: &mut (dyn FnMut(ReadProgress) + Send),
    ) -> Result<String> {
        let opened = self.fs.open(path)?;
        let reader = ProgressReader::new(opened.reader, opened.len).on_progress(|p| progress(p));

        self.engine
            .digest_with(algorithm, reader)
            .map_err(|e| match e {
                HashCalcError::Io {
                    path: None,
                    operation,
                    source,
                } => HashCalcError::Io {
                    path: Some(path.into()),
                    operation,
                    source,
                },
                other => other,
            })
    }
}

/// How a batch ended
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Every job was attempted
    Completed,
    /// Cancellation was observed between files
    Cancelled,
    /// The algorithm name was not recognized; no file was touched
    InvalidAlgorithm { name: String },
}

/// Summary of a finished batch
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchSummary {
    pub outcome: BatchOutcome,
    pub total: usize,
    /// Jobs handed to the hasher, successful or not
    pub attempted: usize,
    /// Jobs recorded with a blank hash because the file could not be read
    pub failed: usize,
    #[serde(serialize_with = "serialize_duration")]
    pub elapsed: Duration,
}

// Helper function to serialize Duration as seconds
fn serialize_duration<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Events published by a running batch, in order
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        algorithm: String,
        total: usize,
    },
    FileStarted {
        id: EntryId,
        index: usize,
        total: usize,
        label: String,
        path: String,
    },
    FileProgress {
        id: EntryId,
        progress: ReadProgress,
    },
    /// `hash` is empty when the file could not be read
    FileHashed {
        id: EntryId,
        hash: String,
    },
    Finished(BatchSummary),
}

#[derive(Debug, Default)]
struct RunState {
    running: AtomicBool,
    cancel_requested: AtomicBool,
    label: Mutex<String>,
    file_progress: Mutex<ReadProgress>,
}

impl RunState {
    fn set_label(&self, label: String) {
        *self.label.lock().unwrap_or_else(|e| e.into_inner()) = label;
    }

    fn set_file_progress(&self, progress: ReadProgress) {
        *self.file_progress.lock().unwrap_or_else(|e| e.into_inner()) = progress;
    }

    fn finish(&self) {
        self.set_label(String::new());
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Clears the run state even if the hasher panics
struct RunningGuard<'a>(&'a RunState);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Runs at most one batch at a time over a snapshot of hash jobs
///
/// Cloning yields another handle onto the same coordinator, so observers on
/// other threads can read `is_running` and `progress_label` or call `cancel`.
#[derive(Clone)]
pub struct BatchCoordinator {
    hasher: Arc<dyn FileHasher>,
    state: Arc<RunState>,
}

impl BatchCoordinator {
    pub fn new(hasher: Arc<dyn FileHasher>) -> Self {
        Self {
            hasher,
            state: Arc::new(RunState::default()),
        }
    }

    /// Coordinator hashing real files through `fs`
    pub fn with_file_system(fs: Arc<dyn FileSystem>, engine: DigestEngine) -> Self {
        Self::new(Arc::new(FileHashCalculator::new(fs, engine)))
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// `"{index}/{count}"` of the file in flight, empty when idle
    pub fn progress_label(&self) -> String {
        self.state.label.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Read progress of the file in flight
    pub fn file_progress(&self) -> ReadProgress {
        *self.state.file_progress.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ask the running batch to stop before its next file
    ///
    /// Returns false, and does nothing, when no batch is running.
    pub fn cancel(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state.cancel_requested.store(true, Ordering::SeqCst);
        info!("hash calculation cancellation requested");
        true
    }

    /// Start a batch on a background thread
    ///
    /// `is_running` is already true when this returns.
    pub fn start(
        &self,
        algorithm: &str,
        jobs: Vec<HashJob>,
        events: Sender<BatchEvent>,
    ) -> Result<BatchHandle> {
        self.begin()?;

        let this = self.clone();
        let algorithm = algorithm.to_string();
        let spawned = thread::Builder::new()
            .name("hash-batch".to_string())
            .spawn(move || this.execute(&algorithm, &jobs, &events));

        match spawned {
            Ok(handle) => Ok(BatchHandle { handle }),
            Err(e) => {
                self.state.finish();
                Err(HashCalcError::Thread {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Run a batch on the calling thread
    pub fn run(
        &self,
        algorithm: &str,
        jobs: &[HashJob],
        events: &Sender<BatchEvent>,
    ) -> Result<BatchSummary> {
        self.begin()?;
        Ok(self.execute(algorithm, jobs, events))
    }

    fn begin(&self) -> Result<()> {
        if self
            .state
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("refusing to start a hash batch while another is running");
            return Err(HashCalcError::BatchAlreadyRunning);
        }
        self.state.cancel_requested.store(false, Ordering::SeqCst);
        self.state.set_file_progress(ReadProgress::default());
        Ok(())
    }

    fn execute(&self, algorithm: &str, jobs: &[HashJob], events: &Sender<BatchEvent>) -> BatchSummary {
        let guard = RunningGuard(&self.state);
        let start_time = Instant::now();
        let total = jobs.len();

        let _ = events.send(BatchEvent::Started {
            algorithm: algorithm.to_string(),
            total,
        });

        let algorithm = match HashAlgorithm::from_name(algorithm) {
            Ok(alg) => alg,
            Err(e) => {
                error!("{}", e);
                drop(guard);
                let summary = BatchSummary {
                    outcome: BatchOutcome::InvalidAlgorithm {
                        name: algorithm.to_string(),
                    },
                    total,
                    attempted: 0,
                    failed: 0,
                    elapsed: start_time.elapsed(),
                };
                let _ = events.send(BatchEvent::Finished(summary.clone()));
                return summary;
            }
        };

        info!(algorithm = %algorithm, files = total, "hash calculation started");

        let mut attempted = 0;
        let mut failed = 0;
        let mut outcome = BatchOutcome::Completed;

        for (index, job) in jobs.iter().enumerate() {
            if self.state.cancel_requested.load(Ordering::SeqCst) {
                outcome = BatchOutcome::Cancelled;
                break;
            }

            let label = format!("{}/{}", index + 1, total);
            self.state.set_label(label.clone());
            self.state.set_file_progress(ReadProgress::default());
            let _ = events.send(BatchEvent::FileStarted {
                id: job.id,
                index,
                total,
                label,
                path: job.path.clone(),
            });
            debug!(path = %job.path, index, "hashing file");

            let state = &self.state;
            let id = job.id;
            let mut on_progress = |progress: ReadProgress| {
                state.set_file_progress(progress);
                let _ = events.send(BatchEvent::FileProgress { id, progress });
            };

            let hash = match self.hasher.hash_file(algorithm, &job.path, &mut on_progress) {
                Ok(hash) => hash,
                Err(e) => {
                    if e.is_file_access() {
                        warn!(path = %job.path, "failed to hash file, recording blank hash: {}", e);
                    } else {
                        error!(path = %job.path, "unexpected hashing failure, recording blank hash: {}", e);
                    }
                    failed += 1;
                    String::new()
                }
            };
            attempted += 1;

            let _ = events.send(BatchEvent::FileHashed { id: job.id, hash });
        }

        drop(guard);

        let summary = BatchSummary {
            outcome,
            total,
            attempted,
            failed,
            elapsed: start_time.elapsed(),
        };
        info!(
            outcome = ?summary.outcome,
            attempted,
            failed,
            "hash calculation finished in {:.2}s",
            summary.elapsed.as_secs_f64()
        );
        let _ = events.send(BatchEvent::Finished(summary.clone()));
        summary
    }
}

/// Handle onto a batch running in the background
pub struct BatchHandle {
    handle: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the batch to finish
    pub fn join(self) -> Result<BatchSummary> {
        self.handle.join().map_err(|_| HashCalcError::Thread {
            reason: "hash batch thread panicked".to_string(),
        })
    }
}
