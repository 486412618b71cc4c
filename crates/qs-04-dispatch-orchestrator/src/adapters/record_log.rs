//! Record sinks.

use crate::domain::errors::RecordSinkError;
use crate::ports::outbound::RecordSink;
use parking_lot::{Mutex, RwLock};
use shared_types::DispatchRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keeps records in memory only.
#[derive(Debug, Default)]
pub struct InMemoryRecordLog {
    records: RwLock<Vec<DispatchRecord>>,
}

impl InMemoryRecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordSink for InMemoryRecordLog {
    fn append(&self, record: &DispatchRecord) -> Result<(), RecordSinkError> {
        self.records.write().push(record.clone());
        Ok(())
    }

    fn records(&self) -> Vec<DispatchRecord> {
        self.records.read().clone()
    }
}

/// Appends one JSON object per line to a file, and keeps an in-memory copy
/// for reads.
#[derive(Debug)]
pub struct JsonLinesRecordLog {
    path: PathBuf,
    file: Mutex<File>,
    memory: InMemoryRecordLog,
}

impl JsonLinesRecordLog {
    /// Open (or create) the log. Existing lines are loaded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RecordSinkError> {
        let path = path.as_ref().to_path_buf();
        let memory = InMemoryRecordLog::new();
        if path.exists() {
            for record in Self::read_all(&path)? {
                memory.append(&record)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), existing = memory.len(), "Record log opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
            memory,
        })
    }

    /// Parse every record in a JSON-lines file.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<DispatchRecord>, RecordSinkError> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonLinesRecordLog {
    fn append(&self, record: &DispatchRecord) -> Result<(), RecordSinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        {
            let mut file = self.file.lock();
            file.write_all(&line)?;
            file.flush()?;
        }
        self.memory.append(record)
    }

    fn records(&self) -> Vec<DispatchRecord> {
        self.memory.records()
    }
}
