//! Integration tests for glob discovery over the local filesystem.

use ironsplit::io::glob::{discover_files, entries_from_paths, expand_glob, expand_glob_required};
use ironsplit::testing::*;
use ironsplit::*;
use regex::Regex;
use std::sync::Arc;

#[test]
fn test_discovery_is_sorted_and_skips_directories() -> anyhow::Result<()> {
    let dir = TempDirPath::new()?;
    write_text_files(&dir, &[("b.csv", "h\n2\n"), ("a.csv", "h\n1\n"), ("sub/c.csv", "h\n3\n")])?;

    let pattern = format!("{}/*", dir.path().display());
    let files = discover_files(&pattern, None)?;
    let names: Vec<_> = files
        .iter()
        .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.csv", "b.csv"]);
    assert_eq!(files[0].length, 4);
    assert_eq!(files[0].hosts, ["localhost"]);
    Ok(())
}

#[test]
fn test_filter_matches_file_names() -> anyhow::Result<()> {
    let dir = TempDirPath::new()?;
    write_text_files(
        &dir,
        &[
            ("part-0.csv", "x\n"),
            ("_SUCCESS", ""),
            (".part-1.csv.crc", "zz"),
            ("part-1.csv", "y\n"),
        ],
    )?;
    let pattern = format!("{}/*", dir.path().display());
    let filter = Regex::new(r"^part-\d+\.csv$")?;
    let files = discover_files(&pattern, Some(&filter))?;
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.path.extension().is_some_and(|e| e == "csv")));
    Ok(())
}

#[test]
fn test_recursive_glob() -> anyhow::Result<()> {
    let dir = TempDirPath::new()?;
    write_text_files(
        &dir,
        &[("d=1/a.txt", "1\n"), ("d=2/b.txt", "2\n"), ("d=2/deep/c.txt", "3\n")],
    )?;
    let pattern = format!("{}/**/*.txt", dir.path().display());
    assert_eq!(expand_glob(&pattern)?.len(), 3);
    Ok(())
}

#[test]
fn test_no_matches() -> anyhow::Result<()> {
    let dir = TempDirPath::new()?;
    let pattern = format!("{}/*.nothing", dir.path().display());
    assert!(expand_glob(&pattern)?.is_empty());
    assert!(expand_glob_required(&pattern).is_err());
    assert!(discover_files(&pattern, None)?.is_empty());
    Ok(())
}

#[test]
fn test_invalid_pattern_is_discovery_error() {
    let err = discover_files("[", None).unwrap_err();
    assert!(matches!(err, SplitError::Discovery(_)));
}

#[test]
fn test_entries_from_paths_keeps_order() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/z", "zz"), ("/a", "a")]);
    let files = entries_from_paths(&fs, ["/z", "/a"])?;
    assert_eq!(files[0].length, 2);
    assert_eq!(files[1].length, 1);
    assert!(matches!(
        entries_from_paths(&fs, ["/missing"]),
        Err(SplitError::Discovery(_))
    ));
    Ok(())
}

#[test]
fn test_local_end_to_end() -> anyhow::Result<()> {
    let dir = TempDirPath::new()?;
    write_text_files(
        &dir,
        &[("01.log", "ts,msg\n1,boot\n"), ("02.log", "ts,msg\n2,ready\n3,idle\n")],
    )?;
    let files = discover_files(&format!("{}/*.log", dir.path().display()), None)?;
    let fs: Arc<dyn FileSystem> = Arc::new(LocalFs);

    let splits = SplitPlanner::new(fs.clone(), 1024).with_copy_header(true).plan(&files);
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].header(), Some("ts,msg"));
    assert_eq!(splits[0].locations(), ["localhost"]);

    let task = TaskContext::new(fs, Arc::new(TextDecoder))
        .with_path_field("file")
        .with_filename_only(true);
    let mut reader = create_record_reader(splits[0].clone(), task);
    let records = collect_records(&mut reader)?;
    assert_eq!(string_field(&records, "body"), ["1,boot", "2,ready", "3,idle"]);
    assert_eq!(string_field(&records, "file"), ["01.log", "02.log", "02.log"]);
    Ok(())
}
