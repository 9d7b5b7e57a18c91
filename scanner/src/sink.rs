use crate::{
    errors::{SinkError, SinkResult},
    record::PersistedRecord,
};
use parking_lot::Mutex;
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Append-only destination for scanned records.
///
/// Records arrive in discovery order. A failed `append` is returned to the scanner
/// as is; retry policy belongs to the sink.
pub trait RecordSink: Send {
    fn append(&mut self, record: &PersistedRecord) -> SinkResult<()>;

    /// Makes every appended record durable. Called once per master block.
    fn flush(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

impl RecordSink for Box<dyn RecordSink> {
    fn append(&mut self, record: &PersistedRecord) -> SinkResult<()> {
        (**self).append(record)
    }

    fn flush(&mut self) -> SinkResult<()> {
        (**self).flush()
    }
}

/// Keeps records in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<PersistedRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PersistedRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &PersistedRecord) -> SinkResult<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Writes one JSON object per line to a file opened in append mode.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn open<P: AsRef<Path>>(path: P) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: BufWriter::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesSink {
    fn append(&mut self, record: &PersistedRecord) -> SinkResult<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }
}

impl Drop for JsonLinesSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Reads back a file produced by [`JsonLinesSink`]. Blank lines are skipped.
pub fn read_records<P: AsRef<Path>>(path: P) -> SinkResult<Vec<PersistedRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line).map_err(SinkError::from)?);
    }
    Ok(records)
}
