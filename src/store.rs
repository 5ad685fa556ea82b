// ==============================================================================
// store.rs - Flat-File Record Store
// ==============================================================================
// Description: Loads and rewrites the variant table backing the /result API
// Author: Matt Barham
// Created: 2026-10-17
// Modified: 2026-10-17
// Version: 1.0.0
// ==============================================================================
//
// The store owns two files:
//   - the derived table (CSV, `index` column + schema), read on every request
//     and rewritten in full after every mutation
//   - the original VCF-style source, parsed only while the derived table does
//     not exist yet; the first successful parse writes the derived table
//
// Saves go through a temporary file in the same directory followed by a
// rename, so a crash mid-write never leaves a truncated table behind. There is
// no locking across load -> mutate -> save; concurrent writers can lose updates.
//
// ==============================================================================

use csv::{ReaderBuilder, WriterBuilder};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{canonical_integer, FieldValue, Table, VariantRecord, CHROM_COLUMN};

/// Header of the surrogate row-index column in the derived table
pub const INDEX_COLUMN: &str = "index";

/// Prefix of VCF meta-information lines skipped during source parsing
const META_PREFIX: &str = "##";

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Variant store unavailable at {}: {reason}", .path.display())]
    Unavailable { path: PathBuf, reason: String },

    #[error("Failed to parse variant store: {0}")]
    Parse(String),

    #[error("Failed to write variant store: {0}")]
    Write(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Locations of the derived table and its fallback source
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Canonical derived table; its existence decides which format is read
    pub store_path: PathBuf,

    /// Original tab-delimited VCF-style file
    pub source_path: PathBuf,
}

/// Flat-file record store
#[derive(Debug, Clone)]
pub struct RecordStore {
    config: StoreConfig,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Load the full table, converting the source on first use
    pub fn load(&self) -> Result<Table, StoreError> {
        if self.config.store_path.exists() {
            debug!("Loading derived store: {:?}", self.config.store_path);
            return self.read_derived();
        }

        info!(
            "Derived store {:?} not found, converting source {:?}",
            self.config.store_path, self.config.source_path
        );

        let table = parse_source_file(&self.config.source_path)?;

        self.save(&table)?;
        info!(
            "Converted {} variants ({} columns) to {:?}",
            table.rows.len(),
            table.columns.len(),
            self.config.store_path
        );

        Ok(table)
    }

    /// Rewrite the derived table in full
    pub fn save(&self, table: &Table) -> Result<(), StoreError> {
        let target = &self.config.store_path;
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| StoreError::Write(format!("temporary file in {:?}: {}", dir, e)))?;

        {
            let mut writer = WriterBuilder::new().from_writer(tmp.as_file_mut());

            writer.write_record(
                std::iter::once(INDEX_COLUMN).chain(table.columns.iter().map(String::as_str)),
            )?;

            for row in &table.rows {
                let mut record = Vec::with_capacity(table.columns.len() + 1);
                record.push(row.index.to_string());
                for column in &table.columns {
                    record.push(row.get(column).map(|v| v.to_string()).unwrap_or_default());
                }
                writer.write_record(&record)?;
            }

            writer.flush()?;
        }

        tmp.as_file().sync_all()?;
        tmp.persist(target)
            .map_err(|e| StoreError::Write(format!("{:?}: {}", target, e.error)))?;

        debug!("Saved {} variants to {:?}", table.rows.len(), target);
        Ok(())
    }

    /// True if either backing file is present
    pub fn is_available(&self) -> bool {
        self.config.store_path.exists() || self.config.source_path.exists()
    }

    fn read_derived(&self) -> Result<Table, StoreError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.config.store_path)
            .map_err(|e| StoreError::Unavailable {
                path: self.config.store_path.clone(),
                reason: e.to_string(),
            })?;

        let headers = reader.headers()?.clone();
        match headers.get(0) {
            Some(INDEX_COLUMN) => {}
            other => {
                return Err(StoreError::Parse(format!(
                    "expected leading '{}' column, found {:?}",
                    INDEX_COLUMN, other
                )))
            }
        }
        let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result?;

            let raw_index = record.get(0).unwrap_or_default();
            let index = canonical_integer(raw_index)
                .and_then(|value| u64::try_from(value).ok())
                .ok_or_else(|| {
                    StoreError::Parse(format!(
                        "invalid row index '{}' on data row {}",
                        raw_index,
                        line + 1
                    ))
                })?;

            let fields = columns
                .iter()
                .zip(record.iter().skip(1))
                .map(|(column, raw)| (column.clone(), FieldValue::from_raw(column, raw)))
                .collect();

            rows.push(VariantRecord { index, fields });
        }

        Ok(Table { columns, rows })
    }
}

/// Parse the original tab-delimited source
///
/// Meta lines (`##...`) are skipped, the first remaining line is the header
/// and any header cell containing `#` becomes `CHROM`. Rows are indexed from 0
/// in file order.
pub fn parse_source(reader: impl BufRead) -> Result<Table, StoreError> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(line_no, line)| line.map(|l| (line_no + 1, l.trim_end_matches('\r').to_string())));

    let mut columns: Vec<String> = Vec::new();
    for line in lines.by_ref() {
        let (_, line) = line?;
        if is_skipped(&line) {
            continue;
        }
        columns = line
            .split('\t')
            .map(|cell| {
                if cell.contains('#') {
                    CHROM_COLUMN.to_string()
                } else {
                    cell.to_string()
                }
            })
            .collect();
        break;
    }

    if columns.is_empty() {
        return Err(StoreError::Parse("source has no header line".to_string()));
    }

    let mut rows = Vec::new();
    for line in lines {
        let (line_no, line) = line?;
        if is_skipped(&line) {
            continue;
        }

        let cells: Vec<&str> = line.split('\t').collect();
        if cells.len() != columns.len() {
            return Err(StoreError::Parse(format!(
                "line {}: expected {} columns, found {}",
                line_no,
                columns.len(),
                cells.len()
            )));
        }

        let fields: IndexMap<String, FieldValue> = columns
            .iter()
            .zip(cells)
            .map(|(column, raw)| (column.clone(), FieldValue::from_raw(column, raw)))
            .collect();

        rows.push(VariantRecord {
            index: rows.len() as u64,
            fields,
        });
    }

    Ok(Table { columns, rows })
}

fn is_skipped(line: &str) -> bool {
    line.is_empty() || line.starts_with(META_PREFIX)
}

/// Parse the source file at `path`
pub fn parse_source_file(path: &Path) -> Result<Table, StoreError> {
    let file = File::open(path).map_err(|e| StoreError::Unavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_source(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SOURCE: &str = "\
##fileformat=VCFv4.2
##source=unit-test
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA00001
chr1\t100\trs123\tA\tG\t50\tPASS\tDP=10\tGT\t0|1
chr2\t200\trs456\tC\tT\t.\tPASS\t.\tGT\t1|1
chrX\t300\trs123\tG\tA\t.\tq10\t.\tGT\t0|0
";

    fn store_in(dir: &TempDir, source: &str) -> RecordStore {
        let source_path = dir.path().join("data");
        let mut file = File::create(&source_path).unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file.flush().unwrap();

        RecordStore::new(StoreConfig {
            store_path: dir.path().join("data.csv"),
            source_path,
        })
    }

    #[test]
    fn test_parse_source_normalises_header() {
        let table = parse_source(SOURCE.as_bytes()).unwrap();

        assert_eq!(table.columns[0], "CHROM");
        assert_eq!(table.columns.len(), 10);
        assert_eq!(table.rows.len(), 3);

        let first = &table.rows[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.get("POS"), Some(&FieldValue::Integer(100)));
        assert_eq!(first.get("NA00001"), Some(&FieldValue::Text("0|1".to_string())));
        assert_eq!(table.rows[2].index, 2);
    }

    #[test]
    fn test_parse_source_rejects_ragged_rows() {
        let source = "#CHROM\tPOS\tID\nchr1\t1\n";
        let result = parse_source(source.as_bytes());
        assert!(matches!(result, Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_parse_source_requires_header() {
        let result = parse_source("##only meta\n".as_bytes());
        assert!(matches!(result, Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_first_load_writes_derived_table() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, SOURCE);

        assert!(!store.config().store_path.exists());
        let table = store.load().unwrap();
        assert!(store.config().store_path.exists());
        assert_eq!(table.rows.len(), 3);
    }

    #[test]
    fn test_derived_table_preferred_over_source() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, SOURCE);
        let first = store.load().unwrap();

        // Source changes are ignored once the derived table exists
        std::fs::write(&store.config().source_path, "#CHROM\tPOS\n").unwrap();

        let second = store.load().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_then_load_reproduces_rows() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, SOURCE);
        let original = store.load().unwrap();

        store.save(&original).unwrap();
        let reloaded = store.load().unwrap();

        assert_eq!(original, reloaded);
    }

    #[test]
    fn test_save_preserves_sparse_indices() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, SOURCE);
        let mut table = store.load().unwrap();

        table.rows.remove(1);
        store.save(&table).unwrap();

        let reloaded = store.load().unwrap();
        let indices: Vec<u64> = reloaded.rows.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(reloaded.next_index(), 3);
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, SOURCE);
        let table = store.load().unwrap();
        store.save(&table).unwrap();

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 2); // source + derived table
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let table = parse_source(SOURCE.as_bytes()).unwrap();
        let store = RecordStore::new(StoreConfig {
            store_path: dir.path().join("no-such-dir").join("data.csv"),
            source_path: dir.path().join("data"),
        });

        assert!(matches!(store.save(&table), Err(StoreError::Write(_))));
        assert!(!store.config().store_path.exists());
    }

    #[test]
    fn test_failed_rename_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let table = parse_source(SOURCE.as_bytes()).unwrap();

        // A non-empty directory at the target path cannot be replaced by a file
        let target = dir.path().join("data.csv");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "previous").unwrap();

        let store = RecordStore::new(StoreConfig {
            store_path: target.clone(),
            source_path: dir.path().join("data"),
        });

        assert!(matches!(store.save(&table), Err(StoreError::Write(_))));
        assert_eq!(std::fs::read_to_string(target.join("keep")).unwrap(), "previous");

        // The temporary file is removed with the failed rename
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_missing_files_are_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::new(StoreConfig {
            store_path: dir.path().join("missing.csv"),
            source_path: dir.path().join("missing"),
        });

        assert!(!store.is_available());
        assert!(matches!(store.load(), Err(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_derived_table_requires_index_column() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir, SOURCE);
        std::fs::write(&store.config().store_path, "CHROM,POS\nchr1,1\n").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Parse(_))));
    }
}
