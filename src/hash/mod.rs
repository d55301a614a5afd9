// Hash calculation core
// Digesting, progress reporting, known-hash matching and batch coordination

pub mod batch;
pub mod digest;
pub mod error;
pub mod export;
pub mod fs;
pub mod input;
pub mod matching;
pub mod path_utils;
pub mod progress;
pub mod registry;
pub mod subscription;

// Re-export commonly used types for convenience
pub use batch::{
    BatchCoordinator, BatchEvent, BatchHandle, BatchOutcome, BatchSummary, FileHashCalculator,
    FileHasher, HashJob,
};
pub use digest::{bytes_to_hex, DigestEngine, HashAlgorithm, HashRegistry, Hasher, DEFAULT_BUFFER_SIZE};
pub use error::{HashCalcError, Result};
pub use export::{export_to_file, write_entries};
pub use fs::{FileSystem, LocalFileSystem, OpenedFile};
pub use input::{EntryField, EntryId, InputEntry, InputList, ListChange};
pub use matching::{evaluate, FileHashMetadata, MatchCriteria, MatchState};
pub use progress::{ProgressReader, ReadProgress};
pub use registry::{parse_known_hashes, KnownHashRecord, KnownHashRegistry};
pub use subscription::ChangeSubscriptions;
