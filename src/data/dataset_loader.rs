use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::data::record::Record;
use crate::error::{GridError, Result};

/// Anything that can hand the engine its full dataset in one call.
///
/// Acquisition is opaque to the engine: it calls `load` once and either
/// gets the complete ordered sequence or a failure. Retrying is the
/// source's business.
pub trait DatasetSource {
    /// Produce every record in load order
    fn load(&self) -> Result<Vec<Record>>;

    /// Human readable origin, used in logs and error messages
    fn describe(&self) -> String;
}

/// A flat JSON array of records on disk
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for JsonFileSource {
    fn load(&self) -> Result<Vec<Record>> {
        let file = File::open(&self.path)
            .map_err(|e| GridError::load_failure(self.describe(), e))?;
        load_json_records(BufReader::new(file), &self.describe())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Records already in memory (fixtures, tests, generated data)
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<Record>,
}

impl InMemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl DatasetSource for InMemorySource {
    fn load(&self) -> Result<Vec<Record>> {
        ensure_unique_ids(&self.records, &self.describe())?;
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} records)", self.records.len())
    }
}

/// Parse a JSON array of records from any reader.
///
/// The array is streamed element by element rather than parsed into an
/// intermediate `serde_json::Value` tree, which matters at a million rows.
pub fn load_json_records<R: Read>(reader: R, source_name: &str) -> Result<Vec<Record>> {
    let started = Instant::now();

    let records: Vec<Record> = {
        let mut de = serde_json::Deserializer::from_reader(reader);
        let records = Vec::<Record>::deserialize(&mut de)
            .map_err(|e| GridError::load_failure(source_name, e))?;
        de.end().map_err(|e| GridError::load_failure(source_name, e))?;
        records
    };

    ensure_unique_ids(&records, source_name)?;

    info!(target: "loader",
        "Loaded {} records from {} in {:?}",
        records.len(), source_name, started.elapsed()
    );
    Ok(records)
}

/// Load a JSON dataset file
pub fn load_json_file<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    JsonFileSource::new(path.as_ref()).load()
}

fn ensure_unique_ids(records: &[Record], source_name: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id) {
            debug!(target: "loader", "Duplicate id {} in {}", record.id, source_name);
            return Err(GridError::load_failure(
                source_name,
                format!("duplicate record id {}", record.id),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::Status;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_RECORDS: &str = r#"[
        {"id": 1, "date": "2024-05-01T10:00:00.000Z", "merchant": "TechCorp", "category": "Food",
         "amount": 12.5, "status": "Completed", "description": "Transaction 1 description"},
        {"id": 2, "date": "2024-05-02T11:30:00.000Z", "merchant": "FinBank", "category": "Travel",
         "amount": 7000, "status": "Pending", "description": "Transaction 2 description"}
    ]"#;

    #[test]
    fn test_load_json_records_preserves_order() {
        let records = load_json_records(TWO_RECORDS.as_bytes(), "inline").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].merchant, "FinBank");
        assert_eq!(records[1].amount, 7000.0);
        assert_eq!(records[1].status, Status::Pending);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TWO_RECORDS.as_bytes()).unwrap();

        let records = load_json_file(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_empty_array_is_valid() {
        let records = load_json_records("[]".as_bytes(), "inline").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_file_is_load_failure() {
        let result = load_json_file("/definitely/not/here/transactions.json");
        assert!(matches!(result, Err(GridError::LoadFailure { .. })));
    }

    #[test]
    fn test_malformed_json_is_load_failure() {
        let result = load_json_records(r#"[{"id": 1}"#.as_bytes(), "inline");
        assert!(matches!(result, Err(GridError::LoadFailure { .. })));

        let result = load_json_records(r#"{"not": "an array"}"#.as_bytes(), "inline");
        assert!(matches!(result, Err(GridError::LoadFailure { .. })));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = TWO_RECORDS.replace("\"id\": 2", "\"id\": 1");
        let result = load_json_records(json.as_bytes(), "inline");
        match result {
            Err(GridError::LoadFailure { reason, .. }) => {
                assert!(reason.contains("duplicate record id 1"))
            }
            other => panic!("expected LoadFailure, got {:?}", other),
        }
    }
}
