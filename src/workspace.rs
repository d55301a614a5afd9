//! Hashing session: the input list, the selected algorithm and the batch
//! coordinator, with the commands a front end exposes

use std::path::Path;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::hash::batch::{BatchCoordinator, BatchEvent, BatchHandle, BatchSummary, FileHasher};
use crate::hash::digest::{DigestEngine, HashAlgorithm};
use crate::hash::error::{HashCalcError, Result};
use crate::hash::export::export_to_file;
use crate::hash::fs::FileSystem;
use crate::hash::input::{EntryId, InputList};
use crate::hash::progress::ReadProgress;

pub struct Workspace {
    list: InputList,
    coordinator: BatchCoordinator,
    algorithm: String,
    /// Events of the current batch; disconnects once its thread exits
    events_rx: Option<Receiver<BatchEvent>>,
    handle: Option<BatchHandle>,
    last_summary: Option<BatchSummary>,
}

impl Workspace {
    /// Workspace hashing files from `fs` with `engine`
    pub fn new(fs: Arc<dyn FileSystem>, engine: DigestEngine) -> Self {
        let coordinator = BatchCoordinator::with_file_system(fs.clone(), engine);
        Self::with_coordinator(fs, coordinator)
    }

    /// Workspace whose batches use a custom per-file hasher
    pub fn with_hasher(fs: Arc<dyn FileSystem>, hasher: Arc<dyn FileHasher>) -> Self {
        Self::with_coordinator(fs, BatchCoordinator::new(hasher))
    }

    /// Workspace configured from settings
    pub fn from_settings(fs: Arc<dyn FileSystem>, settings: &Settings) -> Self {
        let engine = DigestEngine::with_buffer_size(settings.hashing.buffer_size);
        let mut workspace = Self::new(fs, engine);
        workspace.set_algorithm(settings.hashing.algorithm);
        workspace
            .list
            .set_match_full_path(settings.matching.match_full_path);
        workspace
    }

    fn with_coordinator(fs: Arc<dyn FileSystem>, coordinator: BatchCoordinator) -> Self {
        Self {
            list: InputList::new(fs),
            coordinator,
            algorithm: HashAlgorithm::default().name().to_string(),
            events_rx: None,
            handle: None,
            last_summary: None,
        }
    }

    pub fn list(&self) -> &InputList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut InputList {
        &mut self.list
    }

    /// Observer handle onto the coordinator's run state
    pub fn coordinator(&self) -> &BatchCoordinator {
        &self.coordinator
    }

    pub fn algorithm_name(&self) -> &str {
        &self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: HashAlgorithm) {
        self.algorithm = algorithm.name().to_string();
    }

    /// Select an algorithm by name; unknown names surface when a batch starts
    pub fn set_algorithm_name(&mut self, name: &str) {
        self.algorithm = name.to_string();
    }

    pub fn is_running(&self) -> bool {
        self.coordinator.is_running()
    }

    pub fn progress_label(&self) -> String {
        self.coordinator.progress_label()
    }

    pub fn file_progress(&self) -> ReadProgress {
        self.coordinator.file_progress()
    }

    pub fn last_summary(&self) -> Option<&BatchSummary> {
        self.last_summary.as_ref()
    }

    /// An empty list may be started; it completes with no work
    pub fn can_begin(&self) -> bool {
        !self.is_running()
    }

    pub fn can_abort(&self) -> bool {
        self.is_running()
    }

    pub fn can_export(&self) -> bool {
        !self.is_running()
    }

    pub fn can_clear_path(&self) -> bool {
        !self.is_running()
    }

    /// Clear every calculated hash and hash the whole list in the background
    pub fn begin_calculation(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(HashCalcError::BatchAlreadyRunning);
        }

        self.list.clear_calculated_hashes();
        self.last_summary = None;
        let jobs = self.list.jobs();
        debug!(jobs = jobs.len(), algorithm = %self.algorithm, "beginning calculation");

        let (events_tx, events_rx) = unbounded();
        let handle = self.coordinator.start(&self.algorithm, jobs, events_tx)?;
        self.events_rx = Some(events_rx);
        self.handle = Some(handle);
        Ok(())
    }

    /// Request cancellation; false when nothing is running
    pub fn abort_calculation(&mut self) -> bool {
        self.coordinator.cancel()
    }

    /// Apply every pending batch event to the list without blocking
    pub fn pump_events(&mut self) -> Result<Vec<BatchEvent>> {
        let Some(events_rx) = self.events_rx.clone() else {
            return Ok(Vec::new());
        };

        let thread_done = self.handle.as_ref().is_some_and(|h| h.is_finished());
        let events: Vec<BatchEvent> = events_rx.try_iter().collect();
        for event in &events {
            self.apply(event)?;
        }

        // Every send precedes thread exit, so a finished thread with no
        // `Finished` among its events died mid-batch
        if thread_done && self.handle.is_some() {
            self.abandon_batch()?;
        }
        Ok(events)
    }

    /// Block until the running batch finishes, applying events as they arrive
    ///
    /// `on_event` sees each event after it has been applied to the list.
    /// Returns `None` when no batch was started.
    pub fn wait<F>(&mut self, mut on_event: F) -> Result<Option<BatchSummary>>
    where
        F: FnMut(&Workspace, &BatchEvent),
    {
        if self.handle.is_none() {
            return Ok(self.last_summary.clone());
        }

        while self.handle.is_some() {
            let Some(events_rx) = self.events_rx.clone() else {
                break;
            };
            match events_rx.recv() {
                Ok(event) => {
                    self.apply(&event)?;
                    on_event(self, &event);
                }
                Err(_) => self.abandon_batch()?,
            }
        }

        Ok(self.last_summary.clone())
    }

    /// Remove an entry by clearing its path
    pub fn clear_file_path(&mut self, id: EntryId) -> bool {
        if !self.can_clear_path() {
            return false;
        }
        self.list.set_file_path(id, "")
    }

    /// Export the list, naming files the way matching identifies them
    pub fn export(&self, path: &Path) -> Result<()> {
        let file_name_only = !self.list.match_full_path();
        export_to_file(path, self.list.entries(), file_name_only)
    }

    /// Join a batch thread that ended without sending `Finished`
    fn abandon_batch(&mut self) -> Result<()> {
        self.events_rx = None;
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let joined = handle.join();
        if let Err(e) = &joined {
            error!("hash batch ended without a result: {}", e);
        }
        joined?;
        Err(HashCalcError::Thread {
            reason: "hash batch ended without reporting a result".to_string(),
        })
    }

    fn apply(&mut self, event: &BatchEvent) -> Result<()> {
        self.list.apply_batch_event(event);

        if let BatchEvent::Finished(summary) = event {
            self.events_rx = None;
            if let Some(handle) = self.handle.take() {
                handle.join()?;
            }
            info!(outcome = ?summary.outcome, "batch results applied");
            self.last_summary = Some(summary.clone());
        }
        Ok(())
    }
}
