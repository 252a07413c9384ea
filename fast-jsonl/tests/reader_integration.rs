//! Integration tests for the cache-backed readers.
//!
//! These tests exercise the public API end to end:
//! - scan → persist → load → seek-and-read
//! - staleness policies across reopen and recache
//! - multi-file composition
//!
//! Run with: `cargo test --test reader_integration`

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use rand::seq::SliceRandom;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

use fast_jsonl::cache::{self, CacheLocation};
use fast_jsonl::{
    cache_init, CacheConfig, Error, InconsistencyKind, MultiReader, NamingStrategy, Reader,
    ReaderOptions, RecordSource, StalenessPolicy,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// No records.
fn empty_zero() -> Vec<Value> {
    Vec::new()
}

/// Ten empty objects.
fn empty_ten() -> Vec<Value> {
    vec![json!({}); 10]
}

/// Ten objects of growing size: record `i` maps `"j"` to `j² / 2` for `j < i`.
fn various_ten() -> Vec<Value> {
    (0..10)
        .map(|i| {
            let map: Map<String, Value> = (0..i)
                .map(|j| (j.to_string(), json!((j * j) as f64 / 2.0)))
                .collect();
            Value::Object(map)
        })
        .collect()
}

/// Write records one per line without a trailing newline.
fn save_data(path: &Path, records: &[Value], append: bool) {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .unwrap();
    let lines: Vec<String> = records.iter().map(Value::to_string).collect();
    file.write_all(lines.join("\n").as_bytes()).unwrap();
}

/// Cache config that keeps user-strategy caches inside the temp dir.
fn config(temp: &TempDir) -> CacheConfig {
    CacheConfig::new(NamingStrategy::User).with_user_cache_root(temp.path().join("home"))
}

fn options(temp: &TempDir) -> ReaderOptions {
    ReaderOptions::new(config(temp))
}

fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

fn collect(reader: &impl RecordSource) -> Vec<Value> {
    reader.iter().map(|r| r.unwrap()).collect()
}

// ============================================================================
// Single Reader
// ============================================================================

#[test]
fn test_end_to_end_default_options() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    let records = vec![json!({"0": 0.0}), json!({"0": 0.0, "1": 0.5})];
    save_data(&path, &records, false);

    let reader = Reader::open_with(&path, options(&temp)).unwrap();

    assert_ne!(reader.get(0).unwrap(), json!({}));
    assert_eq!(reader.get(1).unwrap(), json!({"0": 0.0, "1": 0.5}));
}

#[test]
fn test_length_and_getitem() {
    for records in [empty_zero(), empty_ten(), various_ten()] {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        save_data(&path, &records, false);

        let reader = Reader::open_with(&path, options(&temp)).unwrap();
        assert_eq!(reader.len(), records.len());
        for (i, record) in records.iter().enumerate() {
            assert_eq!(&reader.get(i).unwrap(), record);
        }
        assert_eq!(collect(&reader), records);
    }
}

#[test]
fn test_get_many_with_lists_and_lazy_iterators() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    let records = various_ten();
    save_data(&path, &records, false);
    let reader = Reader::open_with(&path, options(&temp)).unwrap();

    let picked = reader.get_many(vec![0, 2, 4]).unwrap();
    assert_eq!(picked, vec![records[0].clone(), records[2].clone(), records[4].clone()]);

    let lazy = reader.get_many((2..6).step_by(2)).unwrap();
    assert_eq!(lazy, vec![records[2].clone(), records[4].clone()]);

    let mut shuffled: Vec<usize> = (0..records.len()).chain(0..3).collect();
    shuffled.shuffle(&mut rand::rng());
    let fetched = reader.get_many(shuffled.iter().copied()).unwrap();
    for (position, record) in shuffled.iter().zip(&fetched) {
        assert_eq!(record, &records[*position]);
    }
}

#[test]
fn test_reverse_slice_default_excludes_first_record() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    save_data(&path, &various_ten(), false);
    let reader = Reader::open_with(&path, options(&temp)).unwrap();

    let reversed = reader.slice(None, None, Some(-1)).unwrap();

    let expected: Vec<Value> = various_ten().into_iter().skip(1).rev().collect();
    assert_eq!(reversed.len(), 9);
    assert_eq!(reversed, expected);
}

#[test]
fn test_slice_past_end_fails_without_materializing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    save_data(&path, &empty_ten()[..2], false);
    let reader = Reader::open_with(&path, options(&temp)).unwrap();

    let err = reader.slice(Some(0), Some(isize::MAX), None).unwrap_err();
    assert!(matches!(
        err,
        Error::Inconsistent {
            position: 2,
            kind: InconsistencyKind::OutOfRange { len: 2 }
        }
    ));
}

#[test]
fn test_slice_grid() {
    for records in [empty_zero(), empty_ten(), various_ten()] {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        save_data(&path, &records, false);
        let reader = Reader::open_with(&path, options(&temp)).unwrap();

        for start in [Some(0), None] {
            for stop in [Some(0), None, Some(-1)] {
                for step in [Some(1), Some(2), None] {
                    let sliced = reader.slice(start, stop, step).unwrap();
                    let stride = step.unwrap_or(1) as usize;
                    let expected: Vec<Value> = match stop {
                        None => records.iter().step_by(stride).cloned().collect(),
                        Some(_) => Vec::new(),
                    };
                    assert_eq!(sliced, expected, "slice {:?}:{:?}:{:?}", start, stop, step);
                }
            }
        }
    }
}

#[test]
fn test_malformed_lines_are_invisible() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    fs::write(&path, "{\"a\":1}\nnot json\n{\"b\":2}\n\n{\"c\":3}").unwrap();

    let reader = Reader::open_with(&path, options(&temp)).unwrap();

    assert_eq!(reader.len(), 3);
    assert_eq!(
        collect(&reader),
        vec![json!({"a": 1}), json!({"b": 2}), json!({"c": 3})]
    );
}

#[test]
fn test_open_rejects_cache_path_equal_to_source() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    save_data(&path, &empty_ten(), false);

    let result = Reader::open_with(&path, options(&temp).with_cache_path(&path));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_local_strategy_places_cache_next_to_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    save_data(&path, &empty_ten(), false);

    let reader =
        Reader::open_with(&path, ReaderOptions::new(CacheConfig::new(NamingStrategy::Local)))
            .unwrap();

    assert!(reader.cache_path().starts_with(fs::canonicalize(temp.path()).unwrap()));
    assert!(reader.cache_path().to_string_lossy().contains(".fj_cache"));
}

// ============================================================================
// Cache Parameters and Staleness
// ============================================================================

/// Every combination of explicit cache path, pre-existing cache, source
/// modification, and policy must initialize successfully.
#[test]
fn test_cache_init_parameter_grid() {
    let policies = [
        StalenessPolicy::default(),
        StalenessPolicy::forced(),
        StalenessPolicy::check_time(),
        StalenessPolicy::check_hash(),
    ];

    for use_cache_path in [false, true] {
        for precache in [false, true] {
            for modify in [None, Some("time"), Some("content")] {
                for policy in policies {
                    let temp = TempDir::new().unwrap();
                    let path = temp.path().join("data.jsonl");
                    let cache_path = use_cache_path.then(|| temp.path().join("cache.json"));
                    let config = config(&temp);
                    save_data(&path, &empty_ten(), false);

                    if precache {
                        let location =
                            CacheLocation::resolve(&path, cache_path.as_deref(), &config).unwrap();
                        cache::persist(&cache::build(&path).unwrap(), &location.cache_path)
                            .unwrap();
                        match modify {
                            Some("time") => save_data(&path, &empty_ten(), true),
                            Some("content") => save_data(&path, &various_ten(), true),
                            _ => {}
                        }
                    }

                    let options = ReaderOptions {
                        cache_path: cache_path.clone(),
                        policy,
                        config,
                    };
                    let reader = Reader::open_with(&path, options).unwrap();
                    if !precache || policy.force_cache || policy.check_cache_hash {
                        // A fresh or rebuilt cache always reads back cleanly.
                        assert!(reader.iter().all(|r| r.is_ok()));
                    }
                }
            }
        }
    }
}

#[test]
fn test_staleness_gating() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    let config = config(&temp);
    save_data(&path, &empty_ten(), false);
    set_mtime(&path, 1_700_000_000);

    let first = cache_init(&path, None, StalenessPolicy::default(), &config).unwrap();
    assert_eq!(first.len(), 10);

    // (a) No flags: content change is ignored.
    save_data(&path, &various_ten()[..4], false);
    set_mtime(&path, 1_700_000_000);
    let trusted = cache_init(&path, None, StalenessPolicy::default(), &config).unwrap();
    assert_eq!(trusted, first);

    // (c) Hash check: content changed without mtime moving.
    let rehashed = cache_init(&path, None, StalenessPolicy::check_hash(), &config).unwrap();
    assert_eq!(rehashed.len(), 4);

    // (b) Time check: mtime advanced.
    save_data(&path, &various_ten()[..7], false);
    set_mtime(&path, 1_700_000_500);
    let retimed = cache_init(&path, None, StalenessPolicy::check_time(), &config).unwrap();
    assert_eq!(retimed.len(), 7);
}

#[test]
fn test_recache_without_flags_keeps_stale_cache() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    save_data(&path, &empty_ten(), false);
    let mut reader = Reader::open_with(&path, options(&temp)).unwrap();

    save_data(&path, &various_ten(), false);
    reader.recache(None, StalenessPolicy::default()).unwrap();

    // Ten cached offsets of 2-byte lines now point into the middle of the
    // new, longer records.
    let results: Vec<_> = reader.iter().collect();
    assert!(results.iter().any(|r| matches!(r, Err(e) if e.is_inconsistency())));
}

#[test]
fn test_recache_with_flags_or_new_path_refreshes() {
    let cases: Vec<(StalenessPolicy, bool)> = vec![
        (StalenessPolicy::default(), true),
        (StalenessPolicy::forced(), false),
        (StalenessPolicy::forced(), true),
        (StalenessPolicy::check_time(), false),
        (StalenessPolicy::check_hash(), false),
        (StalenessPolicy::check_hash(), true),
    ];

    for (policy, new_cache_path) in cases {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        save_data(&path, &empty_ten(), false);
        set_mtime(&path, 1_700_000_000);
        let mut reader = Reader::open_with(&path, options(&temp)).unwrap();

        save_data(&path, &various_ten(), false);
        set_mtime(&path, 1_700_000_100);

        let cache_path = new_cache_path.then(|| temp.path().join("cache.json"));
        reader.recache(cache_path, policy).unwrap();

        assert_eq!(collect(&reader), various_ten(), "policy {:?}", policy);
    }
}

#[test]
fn test_force_recache() {
    for cache_path in [None, Some("cache.json")] {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        save_data(&path, &empty_ten(), false);
        let mut reader = Reader::open_with(&path, options(&temp)).unwrap();

        save_data(&path, &various_ten(), false);
        reader
            .force_recache(cache_path.map(|name| temp.path().join(name)))
            .unwrap();

        assert_eq!(collect(&reader), various_ten());
    }
}

#[test]
fn test_stale_cache_past_end_of_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data.jsonl");
    save_data(&path, &empty_ten(), false);
    let reader = Reader::open_with(&path, options(&temp)).unwrap();

    save_data(&path, &empty_ten()[..2], false);

    let err = reader.get(9).unwrap_err();
    assert!(matches!(
        err,
        Error::Inconsistent {
            position: 9,
            kind: InconsistencyKind::PastEndOfFile
        }
    ));
}

// ============================================================================
// Multi Reader
// ============================================================================

fn multi_paths(temp: &TempDir, name: &str, count: usize) -> Vec<PathBuf> {
    let name = Path::new(name);
    let stem = name.file_stem().unwrap().to_string_lossy();
    let ext = name.extension().unwrap().to_string_lossy();
    (0..count)
        .map(|i| temp.path().join(format!("{}_{}.{}", stem, i, ext)))
        .collect()
}

#[test]
fn test_multi_reader_composition() {
    let temp = TempDir::new().unwrap();
    let paths = multi_paths(&temp, "data.jsonl", 3);
    for (i, path) in paths.iter().enumerate() {
        let records: Vec<Value> = (0..10).map(|j| json!({"file": i, "record": j})).collect();
        save_data(path, &records, false);
    }

    let reader =
        MultiReader::open_with(&paths, None, StalenessPolicy::default(), config(&temp)).unwrap();

    assert_eq!(reader.len(), 30);
    assert_eq!(reader.get(12).unwrap(), json!({"file": 1, "record": 2}));
    assert_eq!(reader.locate(12), Some((1, 2)));
    assert_eq!(
        reader.slice(Some(9), Some(11), None).unwrap(),
        vec![json!({"file": 0, "record": 9}), json!({"file": 1, "record": 0})]
    );
}

#[test]
fn test_multi_reader_matches_concatenation() {
    for records in [empty_zero(), empty_ten(), various_ten()] {
        let temp = TempDir::new().unwrap();
        let paths = multi_paths(&temp, "data.jsonl", 3);
        for path in &paths {
            save_data(path, &records, false);
        }

        let reader =
            MultiReader::open_with(&paths, None, StalenessPolicy::default(), config(&temp))
                .unwrap();

        let expected: Vec<Value> = records.iter().cycle().take(records.len() * 3).cloned().collect();
        assert_eq!(reader.len(), expected.len());
        assert_eq!(collect(&reader), expected);
    }
}

#[test]
fn test_multi_reader_same_path() {
    let policies = [
        StalenessPolicy::default(),
        StalenessPolicy::forced(),
        StalenessPolicy::check_time(),
        StalenessPolicy::check_hash(),
    ];
    for policy in policies {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.jsonl");
        save_data(&path, &various_ten(), false);
        let paths = vec![path.clone(); 3];

        let reader = MultiReader::open_with(&paths, None, policy, config(&temp)).unwrap();
        let _second = MultiReader::open_with(&paths, None, policy, config(&temp)).unwrap();

        let expected: Vec<Value> = various_ten().into_iter().cycle().take(30).collect();
        assert_eq!(collect(&reader), expected);
    }
}

#[test]
fn test_multi_reader_recache() {
    let temp = TempDir::new().unwrap();
    let paths = multi_paths(&temp, "data.jsonl", 3);
    for path in &paths {
        save_data(path, &empty_ten(), false);
    }
    let mut reader =
        MultiReader::open_with(&paths, None, StalenessPolicy::default(), config(&temp)).unwrap();

    for path in &paths {
        save_data(path, &various_ten(), false);
    }
    let cache_paths = multi_paths(&temp, "cache.json", 3)
        .into_iter()
        .map(Some)
        .collect();
    reader.recache(Some(cache_paths), StalenessPolicy::default()).unwrap();

    let expected: Vec<Value> = various_ten().into_iter().cycle().take(30).collect();
    assert_eq!(collect(&reader), expected);

    for path in &paths {
        save_data(path, &empty_ten(), false);
    }
    reader.force_recache(None).unwrap();
    assert_eq!(reader.len(), 30);
    assert_eq!(collect(&reader), vec![json!({}); 30]);
}
