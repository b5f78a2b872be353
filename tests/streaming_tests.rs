use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use toonlite::{
    read_table, stream_rows, ColType, Column, Error, ParseError, RowStreamer, StreamOptions,
    StreamWriter, Table, TabularOptions, WarningKind,
};

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn concat(batches: &[Table]) -> Vec<Vec<toonlite::Value>> {
    let mut rows = Vec::new();
    for batch in batches {
        for row in 0..batch.n_rows() {
            rows.push(
                (0..batch.n_cols())
                    .map(|col| batch.column(col).unwrap().get(row))
                    .collect(),
            );
        }
    }
    rows
}

fn ten_row_block() -> String {
    let mut text = String::from("[10]{id,name}:\n");
    for i in 1..=10 {
        writeln!(text, "  {i}, \"row{i}\"").unwrap();
    }
    text
}

#[test]
fn batches_arrive_in_fixed_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "ten.toon", &ten_row_block());

    let opts = StreamOptions::new().with_batch_size(3);
    let mut batches = Vec::new();
    stream_rows(&path, &opts, |batch| {
        batches.push(batch);
        Ok(())
    })
    .unwrap();

    let sizes: Vec<_> = batches.iter().map(Table::n_rows).collect();
    assert_eq!(sizes, vec![3, 3, 3, 1]);

    for batch in &batches {
        assert_eq!(batch.names(), ["id", "name"]);
        assert_eq!(batch.column(0).unwrap().col_type(), ColType::Integer);
        assert_eq!(batch.column(1).unwrap().col_type(), ColType::String);
    }
}

#[test]
fn concatenated_batches_equal_full_read_for_every_batch_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "ten.toon", &ten_row_block());

    let full = read_table(&path, &TabularOptions::new()).unwrap();
    let full_rows = concat(std::slice::from_ref(&full));

    for batch_size in 1..=11 {
        let opts = StreamOptions::new().with_batch_size(batch_size);
        let mut batches = Vec::new();
        stream_rows(&path, &opts, |batch| {
            batches.push(batch);
            Ok(())
        })
        .unwrap();
        assert_eq!(concat(&batches), full_rows, "batch_size {batch_size}");
    }
}

#[test]
fn consumer_errors_abort_and_propagate() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "ten.toon", &ten_row_block());

    let opts = StreamOptions::new().with_batch_size(2);
    let mut calls = 0;
    let err = stream_rows(&path, &opts, |_| {
        calls += 1;
        if calls == 2 {
            return Err(Error::Parse(ParseError::new("consumer gave up")));
        }
        Ok(())
    })
    .unwrap_err();

    assert!(err.to_string().contains("consumer gave up"));
    assert_eq!(calls, 2);
}

#[test]
fn schema_expansion_persists_for_later_batches() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "ragged.toon",
        "[4]{a}:\n  1\n  2, 9\n  3\n  4\n",
    );

    let opts = StreamOptions::new().with_batch_size(2);
    let mut streamer = RowStreamer::open(&path, opts).unwrap();
    let mut batches = Vec::new();
    streamer
        .stream(|batch| {
            batches.push(batch);
            Ok(())
        })
        .unwrap();

    // The first batch saw the expansion mid-batch; the second keeps the
    // widened schema and the inferred type even though all its rows are
    // short.
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].names(), ["a", "V2"]);
    assert_eq!(batches[1].names(), ["a", "V2"]);
    assert_eq!(
        batches[1].column(1).unwrap(),
        &Column::Integer(vec![None, None])
    );

    let warnings = streamer.warnings();
    assert!(warnings
        .iter()
        .any(|w| w.kind == WarningKind::RaggedRows));
}

#[test]
fn column_types_stay_stable_across_batches() {
    let dir = tempfile::tempdir().unwrap();
    // The double appears in the first batch; the second batch is all
    // integers but must stay Double.
    let path = write_file(&dir, "mix.toon", "[4]{x}:\n  1.5\n  2\n  3\n  4\n");

    let opts = StreamOptions::new().with_batch_size(2);
    let mut batches = Vec::new();
    stream_rows(&path, &opts, |batch| {
        batches.push(batch);
        Ok(())
    })
    .unwrap();

    assert_eq!(batches[0].column(0).unwrap().col_type(), ColType::Double);
    assert_eq!(batches[1].column(0).unwrap().col_type(), ColType::Double);
    assert_eq!(
        batches[1].column(0).unwrap(),
        &Column::Double(vec![Some(3.0), Some(4.0)])
    );
}

#[test]
fn interrupt_hook_cancels_the_stream() {
    let dir = tempfile::tempdir().unwrap();
    let mut text = String::from("[]{id}:\n");
    for i in 0..12_000 {
        writeln!(text, "  {i}").unwrap();
    }
    let path = write_file(&dir, "big.toon", &text);

    let cancel = Arc::new(AtomicBool::new(true));
    let hook = {
        let cancel = Arc::clone(&cancel);
        Arc::new(move || cancel.load(Ordering::Relaxed)) as toonlite::InterruptHook
    };
    let opts = StreamOptions::new()
        .with_batch_size(100_000)
        .with_tabular(TabularOptions::new().with_interrupt(hook));

    let mut batches = 0;
    let err = stream_rows(&path, &opts, |_| {
        batches += 1;
        Ok(())
    })
    .unwrap_err();

    assert!(err.is_cancelled());
    // No partial batch is delivered on cancellation.
    assert_eq!(batches, 0);
}

#[test]
fn sibling_after_header_yields_no_batches() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "sibling.toon", "[2]{a,b}:\nsibling: 1\n");

    let mut streamer = RowStreamer::open(&path, StreamOptions::new()).unwrap();
    let mut batches = 0;
    streamer
        .stream(|_| {
            batches += 1;
            Ok(())
        })
        .unwrap();

    assert_eq!(batches, 0);
    assert!(streamer
        .warnings()
        .iter()
        .any(|w| w.kind == WarningKind::CountMismatch));
}

#[test]
fn count_mismatch_warning_arrives_after_final_batch() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "short.toon", "[9]{id}:\n  1\n  2\n");

    let opts = StreamOptions::new().with_batch_size(1);
    let mut streamer = RowStreamer::open(&path, opts).unwrap();
    let mut batches = 0;
    streamer
        .stream(|_| {
            batches += 1;
            Ok(())
        })
        .unwrap();

    assert_eq!(batches, 2);
    let warnings = streamer.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::CountMismatch);
    assert!(warnings[0].message.contains("Declared [9]"));
}

#[test]
fn stream_writer_output_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("written.toon");

    let schema = vec!["id".to_string(), "name".to_string()];
    let mut writer = StreamWriter::create(&path, schema, 2).unwrap();

    for chunk in [&[1, 2, 3][..], &[4, 5][..]] {
        let batch = Table::from_columns(vec![
            (
                "id".to_string(),
                Column::Integer(chunk.iter().map(|&i| Some(i)).collect()),
            ),
            (
                "name".to_string(),
                Column::String(chunk.iter().map(|i| Some(format!("row{i}"))).collect()),
            ),
        ])
        .unwrap();
        writer.write_batch(&batch).unwrap();
    }
    writer.finish().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("[5]{id,name}:\n"));

    let back = read_table(&path, &TabularOptions::new()).unwrap();
    assert_eq!(back.n_rows(), 5);
    assert_eq!(back.column(0).unwrap().col_type(), ColType::Integer);
    assert_eq!(
        back.column(1).unwrap().get(4),
        toonlite::Value::String("row5".to_string())
    );
}

#[test]
fn streamed_write_then_streamed_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_file(&dir, "in.toon", &ten_row_block());
    let dest = dir.path().join("out.toon");

    {
        let mut writer =
            StreamWriter::create(&dest, vec!["id".to_string(), "name".to_string()], 2)
                .unwrap();
        stream_rows(
            &source,
            &StreamOptions::new().with_batch_size(4),
            |batch| writer.write_batch(&batch),
        )
        .unwrap();
        writer.finish().unwrap();
    }

    let original = read_table(&source, &TabularOptions::new()).unwrap();
    let copied = read_table(&dest, &TabularOptions::new()).unwrap();
    assert_eq!(original, copied);
}
