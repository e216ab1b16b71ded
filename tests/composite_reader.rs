//! Tests for reading composite splits back as one record stream.

use ironsplit::metrics::{FILES_OPENED, RECORDS_READ};
use ironsplit::testing::*;
use ironsplit::*;
use std::path::PathBuf;
use std::sync::Arc;

fn two_file_split(fs: &MemoryFs) -> CompositeSplit {
    let files = entries_for(fs, &["/in/f1.txt", "/in/f2.txt"]);
    let splits = plan(fs, &files, 1 << 20, false);
    assert_eq!(splits.len(), 1);
    splits.into_iter().next().unwrap()
}

fn text_task(fs: &MemoryFs) -> TaskContext {
    TaskContext::new(Arc::new(fs.clone()), Arc::new(TextDecoder)).with_path_field("path")
}

#[test]
fn test_records_come_in_file_order_with_paths() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/in/f1.txt", "a\nb\nc\n"), ("/in/f2.txt", "d\ne\n")]);
    let split = two_file_split(&fs);

    let mut reader = create_record_reader(split, text_task(&fs));
    let records = collect_records(&mut reader)?;

    assert_eq!(string_field(&records, "body"), ["a", "b", "c", "d", "e"]);
    assert_eq!(
        string_field(&records, "path"),
        ["/in/f1.txt", "/in/f1.txt", "/in/f1.txt", "/in/f2.txt", "/in/f2.txt"]
    );
    assert!(reader.is_done());
    assert_eq!(reader.records_read(), 5);
    Ok(())
}

#[test]
fn test_at_most_one_file_open_at_a_time() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/in/f1.txt", "a\nb\nc\n"), ("/in/f2.txt", "d\ne\n")]);
    let split = two_file_split(&fs);

    let mut reader = create_record_reader(split, text_task(&fs));
    assert_eq!(fs.open_count(), 0, "nothing opens before the first record");
    let mut seen = 0;
    while let Some(_rec) = reader.advance()? {
        seen += 1;
        assert!(fs.live_handles() <= 1);
    }
    assert_eq!(seen, 5);
    assert_eq!(fs.max_live_handles(), 1);
    assert_eq!(fs.live_handles(), 0);
    assert_eq!(
        fs.opened_paths(),
        [PathBuf::from("/in/f1.txt"), PathBuf::from("/in/f2.txt")]
    );
    Ok(())
}

#[test]
fn test_close_before_second_file_never_opens_it() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/in/f1.txt", "a\nb\nc\n"), ("/in/f2.txt", "d\ne\n")]);
    let split = two_file_split(&fs);

    let mut reader = create_record_reader(split, text_task(&fs));
    for _ in 0..3 {
        assert!(reader.advance()?.is_some());
    }
    assert_eq!(reader.current_path(), Some(std::path::Path::new("/in/f1.txt")));
    reader.close();
    reader.close();

    assert!(reader.is_done());
    assert!(reader.advance()?.is_none());
    assert_eq!(fs.opened_paths(), [PathBuf::from("/in/f1.txt")]);
    assert_eq!(fs.live_handles(), 0);
    Ok(())
}

#[test]
fn test_unopenable_file_is_reader_init_error() {
    let fs = memory_fs_with(&[("/in/f1.txt", "a\nb\nc\n"), ("/in/f2.txt", "d\ne\n")]);
    fs.deny("/in/f2.txt");
    let split = two_file_split(&fs);

    let mut reader = create_record_reader(split, text_task(&fs));
    let mut ok = 0;
    let err = loop {
        match reader.next() {
            Some(Ok(_)) => ok += 1,
            Some(Err(e)) => break e,
            None => panic!("expected an error"),
        }
    };
    assert_eq!(ok, 3);
    match &err {
        SplitError::ReaderInit { path, .. } => assert_eq!(path, &PathBuf::from("/in/f2.txt")),
        other => panic!("expected ReaderInit, got {other:?}"),
    }
    assert!(err.to_string().contains("/in/f2.txt"));
    assert!(reader.next().is_none());
    assert_eq!(fs.live_handles(), 0);
}

#[cfg(feature = "io-jsonl")]
#[test]
fn test_decoder_error_passes_through_and_ends_stream() {
    let fs = memory_fs_with(&[
        ("/in/f1.jsonl", "{\"id\":1}\nnot json\n{\"id\":3}\n"),
        ("/in/f2.jsonl", "{\"id\":4}\n"),
    ]);
    let files = entries_for(&fs, &["/in/f1.jsonl", "/in/f2.jsonl"]);
    let split = plan(&fs, &files, 1 << 20, false).remove(0);
    let task = TaskContext::new(Arc::new(fs.clone()), Arc::new(JsonlDecoder));

    let mut reader = create_record_reader(split, task);
    let first = reader.next().unwrap().unwrap();
    assert_eq!(first.get("id"), Some(&serde_json::json!(1)));

    let err = reader.next().unwrap().unwrap_err();
    assert!(err.is_decode());
    assert!(format!("{err:#}").contains("not json"));

    assert!(reader.next().is_none());
    assert_eq!(fs.opened_paths(), [PathBuf::from("/in/f1.jsonl")]);
    assert_eq!(fs.live_handles(), 0);
}

#[test]
fn test_progress_is_monotonic_and_ends_at_one() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[
        ("/in/f1.txt", "alpha\nbeta\ngamma\n"),
        ("/in/f2.txt", "delta\nepsilon\n"),
    ]);
    let split = two_file_split(&fs);
    let total = split.total_length();

    let mut reader = create_record_reader(split, text_task(&fs));
    assert_eq!(reader.progress(), 0.0);
    let mut last = 0.0f32;
    while reader.advance()?.is_some() {
        let p = reader.progress();
        assert!(p >= last, "progress went from {last} to {p}");
        assert!(p <= 1.0);
        last = p;
    }
    assert_eq!(reader.progress(), 1.0);
    assert_eq!(reader.position(), total);
    Ok(())
}

#[test]
fn test_empty_files_yield_nothing() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/in/e1", ""), ("/in/f", "x\n"), ("/in/e2", "")]);
    let files = entries_for(&fs, &["/in/e1", "/in/f", "/in/e2"]);
    let split = plan(&fs, &files, 1 << 20, false).remove(0);
    assert_eq!(split.len(), 3);

    let task = TaskContext::new(Arc::new(fs.clone()), Arc::new(TextDecoder));
    let mut reader = create_record_reader(split, task);
    let records = collect_records(&mut reader)?;
    assert_eq!(string_field(&records, "body"), ["x"]);
    assert_eq!(reader.progress(), 1.0);
    Ok(())
}

#[test]
fn test_filename_only_tagging() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/in/f1.txt", "a\n"), ("/in/f2.txt", "b\n")]);
    let split = two_file_split(&fs);
    let task = text_task(&fs).with_path_field("src").with_filename_only(true);

    let mut reader = create_record_reader(split, task);
    let records = collect_records(&mut reader)?;
    assert_eq!(string_field(&records, "src"), ["f1.txt", "f2.txt"]);
    assert!(records.iter().all(|r| r.get("path").is_none()));
    Ok(())
}

#[test]
fn test_no_tag_without_path_field() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/in/f1.txt", "a\n"), ("/in/f2.txt", "b\n")]);
    let split = two_file_split(&fs);
    let task = TaskContext::new(Arc::new(fs.clone()), Arc::new(TextDecoder));

    let mut reader = create_record_reader(split, task);
    let records = collect_records(&mut reader)?;
    assert!(records.iter().all(|r| r.len() == 2));
    Ok(())
}

#[test]
fn test_lines_of_a_cut_file_read_once_across_splits() -> anyhow::Result<()> {
    let lines: Vec<String> = (0..50).map(|i| format!("line-{i}")).collect();
    let body = lines.iter().map(|l| format!("{l}\n")).collect::<String>();
    let fs = memory_fs_with(&[("/in/big.txt", body.as_str()), ("/in/small.txt", "tail\n")]);
    let files = entries_for(&fs, &["/in/big.txt", "/in/small.txt"]);

    for max in [7, 16, 64, 100, 1000] {
        let splits = plan(&fs, &files, max, false);
        assert_covers_exactly_once(&files, &splits);

        let mut bodies = Vec::new();
        for split in splits {
            let task = TaskContext::new(Arc::new(fs.clone()), Arc::new(TextDecoder));
            let mut reader = create_record_reader(split, task);
            bodies.extend(string_field(&collect_records(&mut reader)?, "body"));
            assert!(fs.max_live_handles() <= 1);
        }
        let mut expected = lines.clone();
        expected.push("tail".to_string());
        assert_eq!(bodies, expected, "max_split_size = {max}");
    }
    Ok(())
}

#[test]
fn test_shared_header_is_dropped_from_every_file() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/in/a.txt", "H\n1\n2\n"), ("/in/b.txt", "H\n3\n")]);
    let files = entries_for(&fs, &["/in/a.txt", "/in/b.txt"]);
    let split = plan(&fs, &files, 1 << 20, true).remove(0);
    assert_eq!(split.header(), Some("H"));

    let task = TaskContext::new(Arc::new(fs.clone()), Arc::new(TextDecoder));
    let mut reader = create_record_reader(split, task);
    let records = collect_records(&mut reader)?;
    assert_eq!(string_field(&records, "body"), ["1", "2", "3"]);
    Ok(())
}

#[test]
fn test_metrics_count_opens_and_records() -> anyhow::Result<()> {
    let fs = memory_fs_with(&[("/in/f1.txt", "a\nb\nc\n"), ("/in/f2.txt", "d\ne\n")]);
    let split = two_file_split(&fs);
    let metrics = MetricsCollector::new();
    let task = text_task(&fs).with_metrics(metrics.clone());

    let mut reader = create_record_reader(split, task);
    collect_records(&mut reader)?;
    assert_eq!(metrics.counter(FILES_OPENED), 2);
    assert_eq!(metrics.counter(RECORDS_READ), 5);
    Ok(())
}

#[test]
fn test_out_of_range_index_is_reader_init() {
    let fs = memory_fs_with(&[("/in/f1.txt", "a\n"), ("/in/f2.txt", "b\n")]);
    let split = two_file_split(&fs);
    let err = PathTrackingReader::open(&split, 2, &text_task(&fs)).err().unwrap();
    assert!(matches!(err, SplitError::ReaderInit { .. }));
    assert_eq!(fs.open_count(), 0);
}
