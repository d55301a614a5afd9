// Match evaluation module
// Classifies a computed (path, hash) pair against the known hash registry

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::path_utils::{eq_ignore_case, identity_key};
use super::registry::KnownHashRecord;

/// Flag set over name and hash matches
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MatchCriteria(u8);

impl MatchCriteria {
    pub const NONE: MatchCriteria = MatchCriteria(0);
    pub const NAME_MATCH: MatchCriteria = MatchCriteria(0b01);
    pub const HASH_MATCH: MatchCriteria = MatchCriteria(0b10);

    pub fn contains(self, other: MatchCriteria) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn name_match(self) -> bool {
        self.contains(Self::NAME_MATCH)
    }

    pub fn hash_match(self) -> bool {
        self.contains(Self::HASH_MATCH)
    }

    pub fn state(self) -> MatchState {
        match (self.name_match(), self.hash_match()) {
            (true, true) => MatchState::Success,
            (true, false) => MatchState::Error,
            (false, true) => MatchState::Indeterminate,
            (false, false) => MatchState::Default,
        }
    }
}

impl BitOr for MatchCriteria {
    type Output = MatchCriteria;

    fn bitor(self, rhs: MatchCriteria) -> MatchCriteria {
        MatchCriteria(self.0 | rhs.0)
    }
}

impl BitOrAssign for MatchCriteria {
    fn bitor_assign(&mut self, rhs: MatchCriteria) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for MatchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name_match(), self.hash_match()) {
            (true, true) => f.write_str("NAME_MATCH | HASH_MATCH"),
            (true, false) => f.write_str("NAME_MATCH"),
            (false, true) => f.write_str("HASH_MATCH"),
            (false, false) => f.write_str("NONE"),
        }
    }
}

impl serde::Serialize for MatchCriteria {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("MatchCriteria", 2)?;
        s.serialize_field("name_match", &self.name_match())?;
        s.serialize_field("hash_match", &self.hash_match())?;
        s.end()
    }
}

/// Display state derived from the two match flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchState {
    /// Name and hash match
    Success,
    /// Name matches, hash differs
    Error,
    /// Hash matches a file with another name
    Indeterminate,
    /// Neither matches
    Default,
}

/// A file reference with its computed hash
#[derive(Debug, Clone, Copy)]
pub struct FileHashMetadata<'a> {
    pub path: &'a str,
    pub hash: &'a str,
}

impl<'a> FileHashMetadata<'a> {
    pub fn new(path: &'a str, hash: &'a str) -> Self {
        Self { path, hash }
    }
}

/// Compare an input against known records
///
/// A name match needs exactly one record with the same identity key; several
/// records sharing the key are ambiguous and give no name match. A hash match
/// needs any record with the same hash, so a blank hash matches a blank
/// record.
pub fn evaluate(
    input: &FileHashMetadata<'_>,
    known: &[KnownHashRecord],
    use_full_path: bool,
) -> MatchCriteria {
    let input_key = identity_key(input.path, use_full_path);

    let name_matches = known
        .iter()
        .filter(|record| eq_ignore_case(input_key, identity_key(&record.path, use_full_path)))
        .take(2)
        .count();

    let mut criteria = MatchCriteria::NONE;

    if name_matches == 1 {
        criteria |= MatchCriteria::NAME_MATCH;
    }

    if known
        .iter()
        .any(|record| eq_ignore_case(input.hash, &record.hash))
    {
        criteria |= MatchCriteria::HASH_MATCH;
    }

    criteria
}
