//! CSV and JSON export of a result set

use crate::config::OutputFormat;
use crate::extract::normalize::sanitize_filename;
use crate::records::{Record, ResultSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Longest slug kept in a file name
const MAX_SLUG_LENGTH: usize = 100;

/// Errors that can occur while writing output files
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write CSV {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Failed to write JSON {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Builds the output file stem `<slug>_<timestamp>`
///
/// # Example
///
/// ```
/// use listing_harvest::output::file_stem;
///
/// assert_eq!(file_stem("Gaming Laptops", "20240101_120000"), "gaming_laptops_20240101_120000");
/// ```
pub fn file_stem(slug: &str, timestamp: &str) -> String {
    let slug = sanitize_filename(slug, MAX_SLUG_LENGTH);
    if slug.is_empty() {
        format!("results_{}", timestamp)
    } else {
        format!("{}_{}", slug, timestamp)
    }
}

/// Writes a result set as CSV and/or JSON
///
/// The CSV header is the set's column list; JSON is a pretty-printed array
/// of objects with the same fields in the same order. Writing the same set
/// twice with the same stem overwrites the files with identical content.
///
/// # Arguments
///
/// * `results` - The records to write
/// * `format` - Which files to produce
/// * `dir` - Output directory (created if missing)
/// * `stem` - File name without extension
///
/// # Returns
///
/// * `Ok(Vec<PathBuf>)` - Paths of the files written
/// * `Err(WriteError)` - A directory or file could not be written
pub fn write_results(
    results: &ResultSet,
    format: OutputFormat,
    dir: &Path,
    stem: &str,
) -> Result<Vec<PathBuf>, WriteError> {
    std::fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();

    if format.includes_csv() {
        let path = dir.join(format!("{}.csv", stem));
        write_csv(results, &path)?;
        tracing::info!("Saved {} records to {}", results.len(), path.display());
        written.push(path);
    }

    if format.includes_json() {
        let path = dir.join(format!("{}.json", stem));
        write_json(results, &path)?;
        tracing::info!("Saved {} records to {}", results.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

fn write_csv(results: &ResultSet, path: &Path) -> Result<(), WriteError> {
    let csv_err = |source| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(results.columns()).map_err(csv_err)?;

    for record in results.iter() {
        let row = results
            .columns()
            .iter()
            .map(|column| record.get(column).unwrap_or(""));
        writer.write_record(row).map_err(csv_err)?;
    }

    writer.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json(results: &ResultSet, path: &Path) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let rows: Vec<Record> = results
        .iter()
        .map(|record| project(record, results.columns()))
        .collect();

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &rows).map_err(|source| WriteError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)
}

/// Reorders a record to the column list, filling absent columns with ""
fn project(record: &Record, columns: &[String]) -> Record {
    columns.iter().fold(Record::new(), |row, column| {
        let value = record.get(column).unwrap_or("");
        row.with(column.as_str(), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_set() -> ResultSet {
        let mut set = ResultSet::new(
            "link",
            vec!["title".to_string(), "link".to_string(), "price".to_string()],
        );
        set.merge(vec![
            Record::new()
                .with("title", "Desk, oak")
                .with("link", "https://shop.example/1")
                .with("price", "4999"),
            Record::new()
                .with("link", "https://shop.example/2")
                .with("title", "Lamp \"LED\""),
        ]);
        set
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(
            file_stem("jobs_python developer_remote", "20240101_000000"),
            "jobs_python_developer_remote_20240101_000000"
        );
        assert_eq!(file_stem("???", "20240101_000000"), "results_20240101_000000");
    }

    #[test]
    fn test_write_both_formats() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("data");
        let set = sample_set();
        let paths = write_results(&set, OutputFormat::Both, &out, "shop_1").unwrap();

        assert_eq!(paths, vec![out.join("shop_1.csv"), out.join("shop_1.json")]);

        let csv = std::fs::read_to_string(&paths[0]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("title,link,price"));
        assert_eq!(lines.next(), Some("\"Desk, oak\",https://shop.example/1,4999"));
        assert_eq!(lines.next(), Some("\"Lamp \"\"LED\"\"\",https://shop.example/2,"));

        let json = std::fs::read_to_string(&paths[1]).unwrap();
        let rows: Vec<Record> = serde_json::from_str(&json).unwrap();
        let expected = vec![
            Record::new()
                .with("title", "Desk, oak")
                .with("link", "https://shop.example/1")
                .with("price", "4999"),
            Record::new()
                .with("title", "Lamp \"LED\"")
                .with("link", "https://shop.example/2")
                .with("price", ""),
        ];
        assert_eq!(rows, expected);
        assert_eq!(set.len(), rows.len());
        let names: Vec<&str> = rows[1].field_names().collect();
        assert_eq!(names, vec!["title", "link", "price"]);
        assert_eq!(rows[1].get("price"), Some(""));
    }

    #[test]
    fn test_single_format() {
        let dir = TempDir::new().unwrap();
        let paths = write_results(&sample_set(), OutputFormat::Json, dir.path(), "only").unwrap();
        assert_eq!(paths, vec![dir.path().join("only.json")]);
        assert!(!dir.path().join("only.csv").exists());
    }

    #[test]
    fn test_rewrite_is_identical() {
        let dir = TempDir::new().unwrap();
        let set = sample_set();
        let first = write_results(&set, OutputFormat::Both, dir.path(), "same").unwrap();
        let before: Vec<String> = first.iter().map(|p| std::fs::read_to_string(p).unwrap()).collect();

        let second = write_results(&set, OutputFormat::Both, dir.path(), "same").unwrap();
        let after: Vec<String> = second.iter().map(|p| std::fs::read_to_string(p).unwrap()).collect();

        assert_eq!(first, second);
        assert_eq!(before, after);
    }

    #[test]
    fn test_unwritable_directory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = write_results(&sample_set(), OutputFormat::Csv, &blocker.join("sub"), "x").unwrap_err();
        assert!(matches!(err, WriteError::CreateDir { .. }));
    }
}
