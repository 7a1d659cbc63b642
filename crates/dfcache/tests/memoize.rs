//! End-to-end behavior of memoized calls against a real cache directory.

use std::cell::Cell;
use std::path::{Path, PathBuf};

use chrono::Duration;
use dfcache::{
    BindError, BoundArgs, CacheError, CallArgs, CallError, CallStatus, Column, DataFrame,
    FunctionId, MemoOptions, Memoized, Output, Signature, Value,
};

#[derive(Debug, thiserror::Error)]
enum UpstreamError {
    #[error("warehouse unavailable for region {0}")]
    Unavailable(String),
}

fn sales_signature() -> Signature {
    Signature::new(FunctionId::new("reports", "sales"))
        .param("region")
        .param_with_default("limit", 10)
}

fn sales_frame(args: &BoundArgs) -> DataFrame {
    let region = args.get("region").and_then(Value::as_str).unwrap_or("?");
    let limit = args.get("limit").and_then(Value::as_int).unwrap_or(0);
    DataFrame::new(vec![
        Column::utf8("region", [region, region]),
        Column::int64("limit", [limit, limit]),
        Column::float64("revenue", [1.5, 2.5]),
    ])
    .unwrap()
}

/// Renames the newest artifact so it looks `age` older than it is.
fn age_newest_artifact<F>(memo: &Memoized<F>, age: Duration) -> PathBuf {
    let record = memo.artifacts().unwrap().pop().unwrap();
    let target = record
        .key
        .locate(memo.cache_dir(), record.created_at - age)
        .path;
    std::fs::rename(&record.path, &target).unwrap();
    target
}

fn files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

#[test]
fn repeated_call_is_served_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let memo = Memoized::new(sales_signature(), MemoOptions::new(dir.path()), |args: &BoundArgs| {
        runs.set(runs.get() + 1);
        Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
    })
    .unwrap();

    let (first, s1) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    let (second, s2) = memo
        .call_with_status(CallArgs::new().kwarg("limit", 10).kwarg("region", "eu"))
        .unwrap();

    assert_eq!((s1, s2), (CallStatus::Miss, CallStatus::Hit));
    assert_eq!(first, second);
    assert_eq!(runs.get(), 1);

    let (_, s3) = memo.call_with_status(CallArgs::new().arg("us")).unwrap();
    assert_eq!(s3, CallStatus::Miss);
    assert_eq!(runs.get(), 2);
    assert_eq!(memo.artifacts().unwrap().len(), 2);
}

#[test]
fn artifact_younger_than_ttl_is_a_hit() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let memo = Memoized::new(
        sales_signature(),
        MemoOptions::new(dir.path()).invalid_after("1h"),
        |args: &BoundArgs| {
            runs.set(runs.get() + 1);
            Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
        },
    )
    .unwrap();

    memo.call(CallArgs::new().arg("eu")).unwrap();
    age_newest_artifact(&memo, Duration::minutes(59));

    let (_, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(status, CallStatus::Hit);
    assert_eq!(runs.get(), 1);
}

#[test]
fn artifact_older_than_ttl_is_recomputed() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let memo = Memoized::new(
        sales_signature(),
        MemoOptions::new(dir.path()).invalid_after("1h"),
        |args: &BoundArgs| {
            runs.set(runs.get() + 1);
            Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
        },
    )
    .unwrap();

    memo.call(CallArgs::new().arg("eu")).unwrap();
    let stale = age_newest_artifact(&memo, Duration::minutes(61));

    let (_, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(status, CallStatus::Miss);
    assert_eq!(runs.get(), 2);

    // The fresh artifact is newer than the stale one and serves the next call.
    let records = memo.artifacts().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, stale);
    let (_, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(status, CallStatus::Hit);
    assert_eq!(runs.get(), 2);
}

#[test]
fn artifacts_never_expire_without_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let memo = Memoized::new(sales_signature(), MemoOptions::new(dir.path()), |args: &BoundArgs| {
        runs.set(runs.get() + 1);
        Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
    })
    .unwrap();

    memo.call(CallArgs::new().arg("eu")).unwrap();
    age_newest_artifact(&memo, Duration::days(3_650));

    let (_, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(status, CallStatus::Hit);
    assert_eq!(runs.get(), 1);
}

#[test]
fn unparseable_ttl_treats_cache_as_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let memo = Memoized::new(
        sales_signature(),
        MemoOptions::new(dir.path()).invalid_after("whenever"),
        |args: &BoundArgs| {
            runs.set(runs.get() + 1);
            Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
        },
    )
    .unwrap();

    for _ in 0..2 {
        let (_, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
        assert_eq!(status, CallStatus::Miss);
    }
    assert_eq!(runs.get(), 2);
}

#[test]
fn corrupt_artifact_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let memo = Memoized::new(sales_signature(), MemoOptions::new(dir.path()), |args: &BoundArgs| {
        runs.set(runs.get() + 1);
        Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
    })
    .unwrap();

    let expected = memo.call(CallArgs::new().arg("eu")).unwrap();
    let record = memo.artifacts().unwrap().pop().unwrap();
    std::fs::write(&record.path, b"\x00\x01 definitely not a frame").unwrap();

    let (output, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(status, CallStatus::Miss);
    assert_eq!(output, expected);
    assert_eq!(runs.get(), 2);

    let records = memo.artifacts().unwrap();
    assert_eq!(records.len(), 1);
    let (_, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(status, CallStatus::Hit);
}

#[test]
fn non_frame_results_are_never_stored() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let signature = Signature::new(FunctionId::new("reports", "row_count")).param("region");
    let memo = Memoized::new(signature, MemoOptions::new(dir.path()), |_: &BoundArgs| {
        runs.set(runs.get() + 1);
        Ok::<_, UpstreamError>(Output::Value(Value::Int(42)))
    })
    .unwrap();

    for _ in 0..2 {
        let (output, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
        assert_eq!(status, CallStatus::Miss);
        assert_eq!(output.as_value(), Some(&Value::Int(42)));
    }
    assert_eq!(runs.get(), 2);
    assert!(files_in(dir.path()).is_empty());
}

#[test]
fn clear_cache_removes_only_this_function() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let memo = Memoized::new(sales_signature(), MemoOptions::new(dir.path()), |args: &BoundArgs| {
        runs.set(runs.get() + 1);
        Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
    })
    .unwrap();
    let neighbour = Memoized::new(
        Signature::new(FunctionId::new("reports", "sales_v2")).param("region"),
        MemoOptions::new(dir.path()),
        |args: &BoundArgs| Ok::<_, UpstreamError>(Output::Frame(sales_frame(args))),
    )
    .unwrap();

    for region in ["eu", "us", "apac"] {
        memo.call(CallArgs::new().arg(region)).unwrap();
    }
    neighbour.call(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(memo.artifacts().unwrap().len(), 3);

    assert_eq!(memo.clear_cache().unwrap(), 3);
    assert!(memo.artifacts().unwrap().is_empty());
    assert_eq!(neighbour.artifacts().unwrap().len(), 1);
    assert_eq!(memo.clear_cache().unwrap(), 0);

    let (_, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(status, CallStatus::Miss);
    assert_eq!(runs.get(), 4);
}

#[test]
fn clear_cache_keeps_functions_with_lookalike_names() {
    let dir = tempfile::tempdir().unwrap();
    let dotted = Memoized::new(
        Signature::new(FunctionId::new("pkg.mod", "f")).param("region"),
        MemoOptions::new(dir.path()),
        |args: &BoundArgs| Ok::<_, UpstreamError>(Output::Frame(sales_frame(args))),
    )
    .unwrap();
    let underscored = Memoized::new(
        Signature::new(FunctionId::new("pkg_mod", "f")).param("region"),
        MemoOptions::new(dir.path()),
        |args: &BoundArgs| Ok::<_, UpstreamError>(Output::Frame(sales_frame(args))),
    )
    .unwrap();

    dotted.call(CallArgs::new().arg("eu")).unwrap();
    underscored.call(CallArgs::new().arg("eu")).unwrap();

    assert_eq!(dotted.clear_cache().unwrap(), 1);
    assert_eq!(underscored.artifacts().unwrap().len(), 1);
    let (_, status) = underscored
        .call_with_status(CallArgs::new().arg("eu"))
        .unwrap();
    assert_eq!(status, CallStatus::Hit);
}

#[test]
fn clear_cache_tolerates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    let memo = Memoized::new(sales_signature(), MemoOptions::new(&cache_dir), |args: &BoundArgs| {
        Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
    })
    .unwrap();
    std::fs::remove_dir(&cache_dir).unwrap();

    assert_eq!(memo.clear_cache().unwrap(), 0);
    // Saving into the vanished directory fails quietly.
    let (_, status) = memo.call_with_status(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(status, CallStatus::Miss);
}

#[test]
fn disabled_caching_neither_reads_nor_writes() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let compute = |args: &BoundArgs| {
        runs.set(runs.get() + 1);
        Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
    };

    let enabled = Memoized::new(sales_signature(), MemoOptions::new(dir.path()), compute).unwrap();
    enabled.call(CallArgs::new().arg("eu")).unwrap();
    let before = files_in(dir.path());

    let disabled = Memoized::new(
        sales_signature(),
        MemoOptions::new(dir.path()).caching_enabled(false),
        compute,
    )
    .unwrap();
    for _ in 0..2 {
        let (_, status) = disabled.call_with_status(CallArgs::new().arg("eu")).unwrap();
        assert_eq!(status, CallStatus::Bypassed);
    }
    assert_eq!(runs.get(), 3);
    assert_eq!(files_in(dir.path()), before);

    let err = disabled
        .call(CallArgs::new().arg("eu").kwarg("colour", "red"))
        .unwrap_err();
    assert!(matches!(err, CallError::Key(BindError::UnknownArgument { .. })));
}

#[test]
fn bind_error_is_fatal_and_skips_computation() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let memo = Memoized::new(sales_signature(), MemoOptions::new(dir.path()), |args: &BoundArgs| {
        runs.set(runs.get() + 1);
        Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
    })
    .unwrap();

    let err = memo.call(CallArgs::new()).unwrap_err();
    assert!(matches!(err, CallError::Key(BindError::MissingArgument { .. })));
    let err = memo
        .call(CallArgs::new().arg("eu").arg(1).arg(2))
        .unwrap_err();
    assert!(matches!(err, CallError::Key(BindError::TooManyPositional { .. })));
    assert_eq!(runs.get(), 0);
    assert!(files_in(dir.path()).is_empty());
}

#[test]
fn computation_error_passes_through_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let memo = Memoized::new(sales_signature(), MemoOptions::new(dir.path()), |args: &BoundArgs| {
        let region = args.get("region").and_then(Value::as_str).unwrap_or("?");
        Err::<Output, _>(UpstreamError::Unavailable(region.to_string()))
    })
    .unwrap();

    let err = memo.call(CallArgs::new().arg("eu")).unwrap_err();
    assert_eq!(err.to_string(), "warehouse unavailable for region eu");
    assert!(matches!(
        err.into_compute(),
        Some(UpstreamError::Unavailable(region)) if region == "eu"
    ));
    assert!(files_in(dir.path()).is_empty());
}

#[test]
fn receiver_does_not_affect_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Cell::new(0);
    let signature = Signature::new(FunctionId::new("reports", "Warehouse.sales"))
        .receiver("self")
        .param("region");
    let memo = Memoized::new(signature, MemoOptions::new(dir.path()), |args: &BoundArgs| {
        assert!(args.receiver().is_some());
        seen.set(seen.get() + 1);
        Ok::<_, UpstreamError>(Output::Frame(sales_frame(args)))
    })
    .unwrap();

    let (_, s1) = memo
        .call_with_status(CallArgs::new().arg("conn-1").arg("eu"))
        .unwrap();
    let (_, s2) = memo
        .call_with_status(CallArgs::new().arg("conn-2").arg("eu"))
        .unwrap();
    assert_eq!((s1, s2), (CallStatus::Miss, CallStatus::Hit));
    assert_eq!(seen.get(), 1);

    let names: Vec<String> = files_in(dir.path())
        .iter()
        .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("reports_Warehouse_sales_"));
    assert!(names[0].ends_with(".dfc"));
}

#[test]
fn frame_arguments_key_by_content() {
    let dir = tempfile::tempdir().unwrap();
    let runs = Cell::new(0);
    let signature = Signature::new(FunctionId::new("reports", "enrich")).param("input");
    let memo = Memoized::new(signature, MemoOptions::new(dir.path()), |args: &BoundArgs| {
        runs.set(runs.get() + 1);
        let input = args.get("input").and_then(Value::as_frame).cloned();
        Ok::<_, UpstreamError>(Output::Frame(input.unwrap_or_else(DataFrame::empty)))
    })
    .unwrap();

    let make = |ids: [i64; 2]| DataFrame::new(vec![Column::int64("id", ids)]).unwrap();

    memo.call(CallArgs::new().arg(make([1, 2]))).unwrap();
    let (_, status) = memo.call_with_status(CallArgs::new().arg(make([1, 2]))).unwrap();
    assert_eq!(status, CallStatus::Hit);
    let (_, status) = memo.call_with_status(CallArgs::new().arg(make([2, 1]))).unwrap();
    assert_eq!(status, CallStatus::Miss);
    assert_eq!(runs.get(), 2);
}

#[test]
fn wrapping_fails_when_cache_dir_cannot_be_created() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let result = Memoized::new(
        sales_signature(),
        MemoOptions::new(blocker.join("cache")),
        |args: &BoundArgs| Ok::<_, UpstreamError>(Output::Frame(sales_frame(args))),
    );
    assert!(matches!(result, Err(CacheError::Io { .. })));
}

#[test]
fn options_come_from_project_config() {
    let project = tempfile::tempdir().unwrap();
    let cache_dir = project.path().join("artifacts");
    std::fs::write(
        project.path().join(dfcache_config::CONFIG_FILE),
        format!(
            "[cache]\ndir = {:?}\ninvalid_after = \"1d\"\n",
            cache_dir.display().to_string()
        ),
    )
    .unwrap();

    let config = dfcache_config::load_config(project.path()).unwrap();
    let memo = Memoized::new(
        sales_signature(),
        MemoOptions::from_config(&config),
        |args: &BoundArgs| Ok::<_, UpstreamError>(Output::Frame(sales_frame(args))),
    )
    .unwrap();

    assert_eq!(memo.cache_dir(), cache_dir);
    assert!(cache_dir.is_dir());
    assert_eq!(memo.options().invalid_after.as_deref(), Some("1d"));
    memo.call(CallArgs::new().arg("eu")).unwrap();
    assert_eq!(files_in(&cache_dir).len(), 1);
}
