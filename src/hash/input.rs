// Input list module
// Owns the user's entries, keeps existence and match state current, and
// applies results coming back from a batch

use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use super::batch::{BatchEvent, HashJob};
use super::error::Result;
use super::fs::FileSystem;
use super::matching::{evaluate, FileHashMetadata, MatchCriteria, MatchState};
use super::registry::KnownHashRegistry;
use super::subscription::ChangeSubscriptions;

/// Stable identity of an entry within its list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One file in the input list
#[derive(Debug, Clone, serde::Serialize)]
pub struct InputEntry {
    pub id: EntryId,
    pub file_path: String,
    /// Empty until calculated
    pub calculated_hash: String,
    pub file_exists: bool,
    pub match_criteria: MatchCriteria,
}

impl InputEntry {
    pub fn match_state(&self) -> MatchState {
        self.match_criteria.state()
    }
}

/// Entry field reported by `ListChange::EntryChanged`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    FilePath,
    CalculatedHash,
    FileExists,
    MatchCriteria,
}

/// Notification published to an optional observer of the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange {
    Added(EntryId),
    Removed(EntryId),
    Cleared,
    EntryChanged { id: EntryId, field: EntryField },
}

/// Ordered, mutable collection of input entries
pub struct InputList {
    fs: Arc<dyn FileSystem>,
    entries: Vec<InputEntry>,
    next_id: u64,
    known_text: String,
    match_full_path: bool,
    registry: KnownHashRegistry,
    subscriptions: ChangeSubscriptions<EntryId>,
    observer: Option<Sender<ListChange>>,
}

impl InputList {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            entries: Vec::new(),
            next_id: 1,
            known_text: String::new(),
            match_full_path: false,
            registry: KnownHashRegistry::default(),
            subscriptions: ChangeSubscriptions::new(),
            observer: None,
        }
    }

    /// Publish list changes on `observer`
    pub fn set_observer(&mut self, observer: Sender<ListChange>) {
        self.observer = Some(observer);
    }

    pub fn entries(&self) -> &[InputEntry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&InputEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn registry(&self) -> &KnownHashRegistry {
        &self.registry
    }

    pub fn known_hashes_text(&self) -> &str {
        &self.known_text
    }

    pub fn match_full_path(&self) -> bool {
        self.match_full_path
    }

    pub fn is_subscribed(&self, id: EntryId) -> bool {
        self.subscriptions.is_subscribed(id)
    }

    /// Snapshot of the list as batch jobs, in list order
    pub fn jobs(&self) -> Vec<HashJob> {
        self.entries
            .iter()
            .map(|e| HashJob::new(e.id, e.file_path.clone()))
            .collect()
    }

    /// Add files and directories
    ///
    /// Directories are expanded recursively into the files below them. A path
    /// already present (exact string comparison) is skipped. Returns the ids
    /// of the entries actually added.
    pub fn add_paths<I, S>(&mut self, paths: I) -> Result<Vec<EntryId>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = Vec::new();

        for path in paths {
            let path = path.as_ref();
            if self.fs.is_dir(path) {
                for file in self.fs.walk_files(path)? {
                    added.extend(self.add_path(&file));
                }
            } else {
                added.extend(self.add_path(path));
            }
        }

        debug!(added = added.len(), total = self.entries.len(), "added input paths");
        Ok(added)
    }

    /// Add a single file path unless it is blank or already listed
    pub fn add_path(&mut self, path: &str) -> Option<EntryId> {
        if path.trim().is_empty() || self.entries.iter().any(|e| e.file_path == path) {
            return None;
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;

        let mut entry = InputEntry {
            id,
            file_path: path.to_string(),
            calculated_hash: String::new(),
            file_exists: self.fs.exists(path),
            match_criteria: MatchCriteria::NONE,
        };
        entry.match_criteria = self.evaluate_entry(&entry);

        self.entries.push(entry);
        self.subscriptions.subscribe(id);
        self.notify(ListChange::Added(id));
        Some(id)
    }

    /// Remove an entry; false when the id is unknown
    pub fn remove_entry(&mut self, id: EntryId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.entries.remove(index);
        self.subscriptions.unsubscribe(id);
        self.notify(ListChange::Removed(id));
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        let dropped = self.subscriptions.unsubscribe_all();
        debug!(entries = dropped.len(), "cleared input list");
        self.notify(ListChange::Cleared);
    }

    /// Edit an entry's path
    ///
    /// An empty or whitespace-only path removes the entry. Otherwise existence
    /// and match state are re-evaluated.
    pub fn set_file_path(&mut self, id: EntryId, path: &str) -> bool {
        if path.trim().is_empty() {
            return self.remove_entry(id);
        }

        let Some(index) = self.position(id) else {
            return false;
        };
        if self.entries[index].file_path == path {
            return true;
        }

        self.entries[index].file_path = path.to_string();
        self.notify(ListChange::EntryChanged {
            id,
            field: EntryField::FilePath,
        });

        let exists = self.fs.exists(path);
        if self.entries[index].file_exists != exists {
            self.entries[index].file_exists = exists;
            self.notify(ListChange::EntryChanged {
                id,
                field: EntryField::FileExists,
            });
        }

        self.refresh_match(index);
        true
    }

    /// Record a calculated hash and re-evaluate the entry's match
    pub fn set_calculated_hash(&mut self, id: EntryId, hash: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.write_hash(index, hash);
        true
    }

    /// Reset every calculated hash to empty
    pub fn clear_calculated_hashes(&mut self) {
        for index in 0..self.entries.len() {
            self.write_hash(index, "");
        }
    }

    /// Replace the known hash text, rebuilding the registry on change
    pub fn set_known_hashes_text(&mut self, text: &str) {
        if self.known_text == text {
            return;
        }
        self.known_text = text.to_string();
        self.rebuild_registry();
    }

    /// Switch between full path and file name identity
    pub fn set_match_full_path(&mut self, match_full_path: bool) {
        if self.match_full_path == match_full_path {
            return;
        }
        self.match_full_path = match_full_path;
        self.rebuild_registry();
    }

    /// Apply a result published by a batch
    ///
    /// Only `FileHashed` changes the list; results for entries removed while
    /// the batch ran are dropped.
    pub fn apply_batch_event(&mut self, event: &BatchEvent) {
        if let BatchEvent::FileHashed { id, hash } = event {
            if !self.set_calculated_hash(*id, hash) {
                warn!(entry = %id, "discarding hash for an entry no longer in the list");
            }
        }
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn write_hash(&mut self, index: usize, hash: &str) {
        if self.entries[index].calculated_hash == hash {
            return;
        }
        self.entries[index].calculated_hash = hash.to_string();
        let id = self.entries[index].id;
        self.notify(ListChange::EntryChanged {
            id,
            field: EntryField::CalculatedHash,
        });
        self.refresh_match(index);
    }

    fn rebuild_registry(&mut self) {
        self.registry = KnownHashRegistry::build(&self.known_text, self.match_full_path);
        for index in 0..self.entries.len() {
            self.refresh_match(index);
        }
    }

    fn refresh_match(&mut self, index: usize) {
        let entry = &self.entries[index];
        if !self.subscriptions.is_subscribed(entry.id) {
            return;
        }
        let criteria = self.evaluate_entry(entry);
        if self.entries[index].match_criteria != criteria {
            self.entries[index].match_criteria = criteria;
            let id = self.entries[index].id;
            self.notify(ListChange::EntryChanged {
                id,
                field: EntryField::MatchCriteria,
            });
        }
    }

    fn evaluate_entry(&self, entry: &InputEntry) -> MatchCriteria {
        evaluate(
            &FileHashMetadata::new(&entry.file_path, &entry.calculated_hash),
            self.registry.records(),
            self.registry.use_full_path(),
        )
    }

    fn notify(&self, change: ListChange) {
        if let Some(observer) = &self.observer {
            let _ = observer.send(change);
        }
    }
}
