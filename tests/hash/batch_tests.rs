// Tests for the batch coordinator

use std::fs;
use std::sync::{Arc, Mutex, OnceLock};

use crossbeam_channel::{bounded, unbounded, Receiver};
use hashcalc::hash::{
    BatchCoordinator, BatchEvent, BatchOutcome, DigestEngine, EntryId, FileHasher, HashAlgorithm,
    HashCalcError, HashJob, LocalFileSystem, ReadProgress, Result,
};
use tempfile::TempDir;

/// Records what the coordinator looked like on every call
#[derive(Default)]
struct RecordingHasher {
    coordinator: OnceLock<BatchCoordinator>,
    labels: Mutex<Vec<String>>,
    running_seen: Mutex<Vec<bool>>,
    cancel_on_call: Option<usize>,
    fail_path: Option<String>,
}

impl RecordingHasher {
    fn calls(&self) -> usize {
        self.labels.lock().unwrap().len()
    }
}

impl FileHasher for RecordingHasher {
    fn hash_file(
        &self,
        algorithm: HashAlgorithm,
        path: &str,
        progress: &mut (dyn FnMut(ReadProgress) + Send),
    ) -> Result<String> {
        let coordinator = self.coordinator.get().unwrap();
        let call = {
            let mut labels = self.labels.lock().unwrap();
            labels.push(coordinator.progress_label());
            labels.len()
        };
        self.running_seen.lock().unwrap().push(coordinator.is_running());

        if self.cancel_on_call == Some(call) {
            assert!(coordinator.cancel());
        }
        progress(ReadProgress::complete());

        if self.fail_path.as_deref() == Some(path) {
            return Err(HashCalcError::FileNotFound { path: path.into() });
        }
        Ok(format!("{}:{}", algorithm, path))
    }
}

fn coordinator_with(hasher: RecordingHasher) -> (BatchCoordinator, Arc<RecordingHasher>) {
    let hasher = Arc::new(hasher);
    let coordinator = BatchCoordinator::new(hasher.clone());
    let _ = hasher.coordinator.set(coordinator.clone());
    (coordinator, hasher)
}

fn jobs(n: u64) -> Vec<HashJob> {
    (1..=n).map(|i| HashJob::new(EntryId(i), format!("file{}", i))).collect()
}

fn hashed(rx: &Receiver<BatchEvent>) -> Vec<(EntryId, String)> {
    rx.try_iter()
        .filter_map(|e| match e {
            BatchEvent::FileHashed { id, hash } => Some((id, hash)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_labels_in_order_and_cleared() {
    let (coordinator, hasher) = coordinator_with(RecordingHasher::default());
    let (tx, rx) = unbounded();

    let summary = coordinator.run("SHA256", &jobs(3), &tx).unwrap();

    assert_eq!(summary.outcome, BatchOutcome::Completed);
    assert_eq!(*hasher.labels.lock().unwrap(), vec!["1/3", "2/3", "3/3"]);
    assert_eq!(coordinator.progress_label(), "");
    assert!(!coordinator.is_running());

    let results = hashed(&rx);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], (EntryId(1), "SHA256:file1".to_string()));
}

#[test]
fn test_is_running_during_hashing() {
    let (coordinator, hasher) = coordinator_with(RecordingHasher::default());
    let (tx, _rx) = unbounded();

    coordinator.run("MD5", &jobs(2), &tx).unwrap();

    assert_eq!(*hasher.running_seen.lock().unwrap(), vec![true, true]);
    assert!(!coordinator.is_running());
}

#[test]
fn test_cancellation_between_files() {
    let (coordinator, hasher) = coordinator_with(RecordingHasher {
        cancel_on_call: Some(2),
        ..Default::default()
    });
    let (tx, rx) = unbounded();

    let summary = coordinator.run("SHA1", &jobs(5), &tx).unwrap();

    assert_eq!(summary.outcome, BatchOutcome::Cancelled);
    assert_eq!(summary.attempted, 2);
    assert_eq!(hasher.calls(), 2);
    // The file in flight when cancel was requested still completes
    assert_eq!(hashed(&rx).len(), 2);
    assert!(!coordinator.is_running());
    assert_eq!(coordinator.progress_label(), "");
}

#[test]
fn test_invalid_algorithm_touches_no_file() {
    let (coordinator, hasher) = coordinator_with(RecordingHasher::default());
    let (tx, rx) = unbounded();

    let summary = coordinator.run("Whirlpool", &jobs(3), &tx).unwrap();

    assert_eq!(
        summary.outcome,
        BatchOutcome::InvalidAlgorithm {
            name: "Whirlpool".to_string()
        }
    );
    assert_eq!(hasher.calls(), 0);
    assert!(!coordinator.is_running());

    let events: Vec<BatchEvent> = rx.try_iter().collect();
    assert!(matches!(events.first(), Some(BatchEvent::Started { .. })));
    assert!(matches!(events.last(), Some(BatchEvent::Finished(_))));
    assert!(!events.iter().any(|e| matches!(e, BatchEvent::FileHashed { .. })));
}

#[test]
fn test_empty_list_differs_from_invalid_algorithm() {
    let (coordinator, _hasher) = coordinator_with(RecordingHasher::default());
    let (tx, _rx) = unbounded();

    let empty = coordinator.run("SHA256", &[], &tx).unwrap();
    let invalid = coordinator.run("sha256", &[], &tx).unwrap();

    assert_eq!(empty.outcome, BatchOutcome::Completed);
    assert!(matches!(invalid.outcome, BatchOutcome::InvalidAlgorithm { .. }));
}

#[test]
fn test_unreadable_file_gives_blank_hash_and_continues() {
    let (coordinator, _hasher) = coordinator_with(RecordingHasher {
        fail_path: Some("file2".to_string()),
        ..Default::default()
    });
    let (tx, rx) = unbounded();

    let summary = coordinator.run("SHA512", &jobs(3), &tx).unwrap();

    assert_eq!(summary.outcome, BatchOutcome::Completed);
    assert_eq!(summary.failed, 1);
    let results = hashed(&rx);
    assert_eq!(results[1], (EntryId(2), String::new()));
    assert_eq!(results[2].1, "SHA512:file3");
}

/// Blocks inside the first file until released
struct GatedHasher {
    entered: crossbeam_channel::Sender<()>,
    release: Receiver<()>,
}

impl FileHasher for GatedHasher {
    fn hash_file(
        &self,
        _algorithm: HashAlgorithm,
        _path: &str,
        _progress: &mut (dyn FnMut(ReadProgress) + Send),
    ) -> Result<String> {
        let _ = self.entered.send(());
        let _ = self.release.recv();
        Ok("X".to_string())
    }
}

#[test]
fn test_background_start_and_second_start_rejected() {
    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let coordinator = BatchCoordinator::new(Arc::new(GatedHasher {
        entered: entered_tx,
        release: release_rx,
    }));
    let (tx, rx) = unbounded();

    let handle = coordinator.start("MD5", jobs(1), tx.clone()).unwrap();
    assert!(coordinator.is_running());

    entered_rx.recv().unwrap();
    assert_eq!(coordinator.progress_label(), "1/1");
    assert!(matches!(
        coordinator.start("MD5", jobs(1), tx.clone()),
        Err(HashCalcError::BatchAlreadyRunning)
    ));

    release_tx.send(()).unwrap();
    let summary = handle.join().unwrap();
    assert_eq!(summary.outcome, BatchOutcome::Completed);
    assert!(!coordinator.is_running());
    assert_eq!(hashed(&rx), vec![(EntryId(1), "X".to_string())]);
}

#[test]
fn test_real_files_through_file_system() {
    let dir = TempDir::new().unwrap();
    let present = dir.path().join("hello.txt");
    fs::write(&present, b"hello world").unwrap();
    let missing = dir.path().join("missing.txt");

    let coordinator = BatchCoordinator::with_file_system(Arc::new(LocalFileSystem), DigestEngine::new());
    let (tx, rx) = unbounded();
    let jobs = vec![
        HashJob::new(EntryId(1), present.to_str().unwrap()),
        HashJob::new(EntryId(2), missing.to_str().unwrap()),
    ];

    let summary = coordinator.run("MD5", &jobs, &tx).unwrap();
    assert_eq!(summary.failed, 1);

    let events: Vec<BatchEvent> = rx.try_iter().collect();
    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::FileProgress { id: EntryId(1), progress } => Some(progress.percentage),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![100]);

    let results: Vec<_> = events
        .into_iter()
        .filter_map(|e| match e {
            BatchEvent::FileHashed { id, hash } => Some((id, hash)),
            _ => None,
        })
        .collect();
    assert_eq!(results[0].1, "5EB63BBBE01EEED093CB22BB8F5ACDC3");
    assert_eq!(results[1].1, "");
}

struct PanickingHasher;

impl FileHasher for PanickingHasher {
    fn hash_file(
        &self,
        _algorithm: HashAlgorithm,
        _path: &str,
        _progress: &mut (dyn FnMut(ReadProgress) + Send),
    ) -> Result<String> {
        panic!("hasher failure");
    }
}

#[test]
fn test_panicking_hasher_clears_state_and_disconnects() {
    let coordinator = BatchCoordinator::new(Arc::new(PanickingHasher));
    let (tx, rx) = unbounded();

    let handle = coordinator.start("MD5", jobs(2), tx).unwrap();
    assert!(matches!(handle.join(), Err(HashCalcError::Thread { .. })));

    assert!(!coordinator.is_running());
    assert_eq!(coordinator.progress_label(), "");
    let events: Vec<BatchEvent> = rx.iter().collect();
    assert!(!events.iter().any(|e| matches!(e, BatchEvent::Finished(_))));
}
