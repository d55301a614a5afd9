// Tests for match evaluation under both identity policies

use hashcalc::hash::{evaluate, parse_known_hashes, FileHashMetadata, KnownHashRecord, MatchCriteria, MatchState};

fn known() -> Vec<KnownHashRecord> {
    vec![
        KnownHashRecord::new("AAAA", "/data/one.txt"),
        KnownHashRecord::new("BBBB", "/data/two.txt"),
    ]
}

#[test]
fn test_truth_table_file_name_policy() {
    let known = known();
    let cases = [
        ("/elsewhere/one.txt", "AAAA", MatchState::Success),
        ("/elsewhere/one.txt", "CCCC", MatchState::Error),
        ("/elsewhere/renamed.txt", "AAAA", MatchState::Indeterminate),
        ("/elsewhere/other.txt", "CCCC", MatchState::Default),
    ];

    for (path, hash, expected) in cases {
        let criteria = evaluate(&FileHashMetadata::new(path, hash), &known, false);
        assert_eq!(criteria.state(), expected, "{} {}", path, hash);
    }
}

#[test]
fn test_truth_table_full_path_policy() {
    let known = known();
    let cases = [
        ("/data/one.txt", "AAAA", MatchState::Success),
        ("/data/one.txt", "CCCC", MatchState::Error),
        ("/elsewhere/one.txt", "AAAA", MatchState::Indeterminate),
        ("/elsewhere/one.txt", "CCCC", MatchState::Default),
    ];

    for (path, hash, expected) in cases {
        let criteria = evaluate(&FileHashMetadata::new(path, hash), &known, true);
        assert_eq!(criteria.state(), expected, "{} {}", path, hash);
    }
}

#[test]
fn test_ambiguous_name_gives_no_name_match() {
    let known = vec![
        KnownHashRecord::new("AAAA", "/a/dup.bin"),
        KnownHashRecord::new("BBBB", "/b/dup.bin"),
    ];

    let criteria = evaluate(&FileHashMetadata::new("/c/dup.bin", "AAAA"), &known, false);
    assert_eq!(criteria, MatchCriteria::HASH_MATCH);

    // Distinct under full path identity
    let criteria = evaluate(&FileHashMetadata::new("/a/dup.bin", "AAAA"), &known, true);
    assert_eq!(criteria, MatchCriteria::NAME_MATCH | MatchCriteria::HASH_MATCH);
}

#[test]
fn test_backslash_separated_names() {
    let known = vec![KnownHashRecord::new("AAAA", "C:\\dir\\File.TXT")];
    let criteria = evaluate(&FileHashMetadata::new("/home/file.txt", ""), &known, false);
    assert_eq!(criteria, MatchCriteria::NAME_MATCH);
}

#[test]
fn test_empty_registry() {
    let criteria = evaluate(&FileHashMetadata::new("/x", "AAAA"), &[], false);
    assert!(criteria.is_none());
}

#[test]
fn test_uncalculated_entry_against_blank_record() {
    // A `*`-only line parses to a blank record, which a blank hash matches
    let known = parse_known_hashes("***");
    let criteria = evaluate(&FileHashMetadata::new("a.txt", ""), &known, false);
    assert!(criteria.hash_match());
    assert!(!criteria.name_match());
}

#[test]
fn test_failed_file_round_trips_through_export() {
    // A file that could not be read exports as ` *name` and still matches by
    // hash and name once read back
    let known = parse_known_hashes(" *broken.bin\n");
    let criteria = evaluate(&FileHashMetadata::new("/data/broken.bin", ""), &known, false);
    assert_eq!(criteria.state(), MatchState::Success);
}
