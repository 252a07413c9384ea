//! Property tests for the line index.
//!
//! Arbitrary record sequences, optionally interleaved with malformed lines,
//! must index exactly the valid records at their true byte offsets.
//!
//! Run with: `cargo test --test index_properties`

use std::fs;
use std::path::Path;

use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

use fast_jsonl::cache::{self, CacheLocation};
use fast_jsonl::hashing::{digest_bytes, digest_file};
use fast_jsonl::scanner::scan;
use fast_jsonl::{
    cache_init, CacheConfig, NamingStrategy, Reader, ReaderOptions, RecordSource, StalenessPolicy,
};

// ============================================================================
// Strategies
// ============================================================================

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 äöü€日本]{0,12}".prop_map(Value::from),
    ]
}

fn record() -> impl Strategy<Value = Value> {
    prop_oneof![
        scalar(),
        prop::collection::vec(scalar(), 0..4).prop_map(Value::from),
        prop::collection::btree_map("[a-z]{1,6}", scalar(), 0..5)
            .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
    ]
}

/// Lines that never parse as JSON.
fn garbage() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("{".to_string()),
        Just("{\"a\": }".to_string()),
        "[a-z]{1,8}[{:]",
    ]
}

fn write_lines(path: &Path, lines: &[String]) {
    fs::write(path, lines.join("\n")).unwrap();
}

fn local_config() -> CacheConfig {
    CacheConfig::new(NamingStrategy::Local)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_offsets_point_at_records(records in prop::collection::vec(record(), 0..24)) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        let lines: Vec<String> = records.iter().map(Value::to_string).collect();
        write_lines(&path, &lines);

        let index = scan(&path).unwrap();
        let bytes = fs::read(&path).unwrap();

        prop_assert_eq!(index.len(), records.len());
        for (i, record) in records.iter().enumerate() {
            let start = index.offset(i).unwrap() as usize;
            let end = bytes[start..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |n| start + n);
            let parsed: Value = serde_json::from_slice(&bytes[start..end]).unwrap();
            prop_assert_eq!(&parsed, record);
        }
    }

    #[test]
    fn test_malformed_lines_receive_no_position(
        records in prop::collection::vec(record(), 1..16),
        noise in prop::collection::vec((any::<prop::sample::Index>(), garbage()), 0..6),
    ) {
        let mut lines: Vec<String> = records.iter().map(Value::to_string).collect();
        for (at, line) in noise {
            let at = at.index(lines.len() + 1);
            lines.insert(at, line);
        }

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        write_lines(&path, &lines);

        let reader = Reader::open_with(&path, ReaderOptions::new(local_config())).unwrap();

        prop_assert_eq!(reader.len(), records.len());
        let read: Vec<Value> = reader.iter().map(|r| r.unwrap()).collect();
        prop_assert_eq!(read, records);
    }
}

// ============================================================================
// Round Trip and Metadata
// ============================================================================

#[test]
fn test_persist_load_round_trip_with_empty_index() {
    let temp = TempDir::new().unwrap();
    for (name, body) in [("empty.jsonl", ""), ("some.jsonl", "{}\n[1]\n\"x\"")] {
        let path = temp.path().join(name);
        fs::write(&path, body).unwrap();
        let location = CacheLocation::resolve(&path, None, &local_config()).unwrap();

        let artifact = cache::build(&path).unwrap();
        cache::persist(&artifact, &location.cache_path).unwrap();

        assert_eq!(cache::load(&location.cache_path).unwrap(), artifact);
    }
}

#[test]
fn test_recorded_hash_matches_independent_digest() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    let lines: Vec<String> = (0..50).map(|i| json!({"i": i}).to_string()).collect();
    write_lines(&path, &lines);

    let artifact = cache_init(&path, None, StalenessPolicy::default(), &local_config()).unwrap();

    assert_eq!(artifact.meta.hash, digest_file(&path).unwrap());
    assert_eq!(artifact.meta.hash, digest_bytes(&fs::read(&path).unwrap()));
    assert_eq!(artifact.len(), 50);
}
