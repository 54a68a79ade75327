use anyhow::Result;
use rand::Rng;
use seekline::{
    BuildOutcome, IndexBuilder, IndexOptions, LineReader, RECORD_WIDTH, codec, index_path,
};
use std::fs;
use std::path::Path;

fn build_with(source: &Path, chunk_size: u64, workers: usize) -> Result<BuildOutcome> {
    let outcome = IndexBuilder::new(IndexOptions {
        chunk_size,
        workers: Some(workers),
    })
    .build(source)?;
    Ok(outcome)
}

fn read_records(path: &Path) -> Vec<u64> {
    let data = fs::read(path).unwrap();
    data.chunks_exact(RECORD_WIDTH).map(codec::decode).collect()
}

/// The index is a function of file content only: any chunk size (and any
/// worker count) must produce byte-identical output.
#[test]
fn index_is_independent_of_chunk_size() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let mut rng = rand::thread_rng();
    let mut content = String::new();
    for _ in 0..400 {
        let len = rng.gen_range(0..40);
        content.push_str(&"z".repeat(len));
        content.push('\n');
    }

    // Smallest legal size, a small even size, and one larger than the file.
    let mut indexes = Vec::new();
    for (i, chunk_size) in [2, 58, 1 << 20].into_iter().enumerate() {
        let src = dir.path().join(format!("copy{i}.txt"));
        fs::write(&src, &content)?;
        build_with(&src, chunk_size, 3)?;
        indexes.push(fs::read(index_path(&src))?);
    }

    assert_eq!(indexes[0], indexes[1]);
    assert_eq!(indexes[1], indexes[2]);
    Ok(())
}

#[test]
fn records_are_strictly_increasing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("mono.txt");

    let content: String = (0..300).map(|i| format!("{i}\n")).collect();
    fs::write(&src, &content)?;

    build_with(&src, 16, 4)?;
    let records = read_records(&index_path(&src));
    assert_eq!(records[0], 0);
    assert!(records.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(*records.last().unwrap(), content.len() as u64);
    Ok(())
}

/// Force many more chunks than workers so every worker loops through the
/// pull queue several times.
#[test]
fn many_chunks_few_workers() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("busy.txt");

    let lines: Vec<String> = (0..1000).map(|i| format!("record number {i}")).collect();
    fs::write(&src, lines.join("\n") + "\n")?;

    let outcome = build_with(&src, 64, 4)?;
    let BuildOutcome::Built { lines: count, chunks } = outcome else {
        panic!("expected a fresh build, got {outcome:?}");
    };
    assert_eq!(count, 1000);
    assert!(chunks > 100, "expected many chunks, got {chunks}");

    let mut reader = LineReader::open(&src)?;
    assert_eq!(reader.read_line(1)?, lines[0]);
    assert_eq!(reader.read_line(500)?, lines[499]);
    assert_eq!(reader.read_line(1000)?, lines[999]);
    Ok(())
}

/// A worker count far above the chunk count must neither deadlock nor
/// duplicate work.
#[test]
fn more_workers_than_chunks() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let src = dir.path().join("tiny.txt");
    fs::write(&src, "a\nb\n")?;

    let outcome = build_with(&src, 2, 16)?;
    assert_eq!(outcome, BuildOutcome::Built { lines: 2, chunks: 2 });
    assert_eq!(read_records(&index_path(&src)), vec![0, 2, 4]);
    Ok(())
}
