//! Dataset CSV ingest and the train/test split.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors, exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic splits** (seeded shuffle, no hidden randomness)

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::StringRecord;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::domain::{Clarity, Color, Cut, DATASET_COLUMNS, Paths, Record};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed records plus row errors.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub source: PathBuf,
    pub records: Vec<Record>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedData {
    pub fn rows_used(&self) -> usize {
        self.records.len()
    }
}

/// Load and validate the dataset CSV.
pub fn load_records(path: &Path) -> Result<IngestedData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let missing: Vec<&str> = DATASET_COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::schema(format!(
            "Missing required column(s) in '{}': {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let row = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&row, &header_map) {
            Ok(record) => records.push(record),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if records.is_empty() {
        return Err(AppError::data(format!(
            "No valid rows in '{}' ({} read, {} rejected).",
            path.display(),
            rows_read,
            row_errors.len()
        )));
    }

    log::info!(
        "loaded {} of {} rows from {}",
        records.len(),
        rows_read,
        path.display()
    );
    if !row_errors.is_empty() {
        log::warn!("{} row(s) skipped during ingest", row_errors.len());
    }

    Ok(IngestedData {
        source: path.to_path_buf(),
        records,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    column: &str,
) -> Result<&'a str, String> {
    header_map
        .get(column)
        .and_then(|&idx| record.get(idx))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{column}` value."))
}

fn parse_positive(raw: &str, column: &str) -> Result<f64, String> {
    let v: f64 = raw
        .parse()
        .map_err(|_| format!("Invalid `{column}` value '{raw}'."))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(format!("`{column}` must be finite and > 0 (got {raw})."));
    }
    Ok(v)
}

fn parse_price(raw: &str) -> Result<u32, String> {
    let v: f64 = raw
        .parse()
        .map_err(|_| format!("Invalid `price` value '{raw}'."))?;
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) {
        return Err(format!("`price` must be a non-negative integer (got {raw})."));
    }
    Ok(v as u32)
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<Record, String> {
    let field = |c: &str| get_required(record, header_map, c);

    let cut: Cut = field("cut")?.parse().map_err(|e: AppError| e.to_string())?;
    let color: Color = field("color")?.parse().map_err(|e: AppError| e.to_string())?;
    let clarity: Clarity = field("clarity")?
        .parse()
        .map_err(|e: AppError| e.to_string())?;

    Ok(Record {
        carat: parse_positive(field("carat")?, "carat")?,
        cut,
        color,
        clarity,
        depth: parse_positive(field("depth")?, "depth")?,
        table: parse_positive(field("table")?, "table")?,
        price: parse_price(field("price")?)?,
        x: parse_positive(field("x")?, "x")?,
        y: parse_positive(field("y")?, "y")?,
        z: parse_positive(field("z")?, "z")?,
    })
}

/// Deterministic shuffled split into `(train, test)`.
///
/// The test partition holds `ceil(n * test_fraction)` rows.
pub fn split_train_test(
    records: &[Record],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<Record>, Vec<Record>), AppError> {
    if !(test_fraction.is_finite() && test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AppError::invalid_input(format!(
            "Test fraction must be in (0, 1) (got {test_fraction})."
        )));
    }
    let n = records.len();
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AppError::data(format!(
            "Cannot split {n} rows with test fraction {test_fraction}."
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let test = order[..n_test].iter().map(|&i| records[i].clone()).collect();
    let train = order[n_test..].iter().map(|&i| records[i].clone()).collect();
    Ok((train, test))
}

/// Write records with the dataset header.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::io(format!("Failed to create directory '{}': {e}", parent.display()))
        })?;
    }

    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create CSV '{}': {e}", path.display())))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| AppError::io(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

/// Everything the training step needs from ingestion.
#[derive(Debug, Clone)]
pub struct IngestionOutput {
    pub ingest: IngestedData,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub train: Vec<Record>,
    pub test: Vec<Record>,
}

/// Read the dataset, split it, and write `data.csv`, `train.csv`, `test.csv`
/// into the artifact directory.
pub fn run_ingestion(
    paths: &Paths,
    test_fraction: f64,
    seed: u64,
) -> Result<IngestionOutput, AppError> {
    let ingest = load_records(&paths.dataset)?;

    fs::create_dir_all(&paths.artifact_dir).map_err(|e| {
        AppError::io(format!(
            "Failed to create artifact directory '{}': {e}",
            paths.artifact_dir.display()
        ))
    })?;
    write_records(&paths.raw_csv(), &ingest.records)?;

    let (train, test) = split_train_test(&ingest.records, test_fraction, seed)?;
    let train_path = paths.train_csv();
    let test_path = paths.test_csv();
    write_records(&train_path, &train)?;
    write_records(&test_path, &test)?;

    log::info!(
        "split {} rows into train={} test={} under {}",
        ingest.records.len(),
        train.len(),
        test.len(),
        paths.artifact_dir.display()
    );

    Ok(IngestionOutput {
        ingest,
        train_path,
        test_path,
        train,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::{SampleConfig, generate_records};
    use crate::error::ErrorKind;
    use std::io::Write;

    fn paths_in(dir: &Path) -> Paths {
        Paths {
            dataset: dir.join("diamonds.csv"),
            artifact_dir: dir.join("artifact"),
            price_model: dir.join("price.json"),
            carat_model: dir.join("carat.json"),
        }
    }

    fn write_file(path: &Path, body: &str) {
        let mut f = File::create(path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn header_names_are_normalized() {
        assert_eq!(normalize_header_name("\u{feff}Carat "), "carat");
    }

    #[test]
    fn bad_rows_are_collected_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        write_file(
            &path,
            "\u{feff}carat,cut,color,clarity,depth,table,price,x,y,z\n\
             0.23,Ideal,E,SI2,61.5,55,326,3.95,3.98,2.43\n\
             0.21,Excellent,E,SI1,59.8,61,326,3.89,3.84,2.31\n\
             0.23,Good,E,VS1,56.9,65,327,4.05,4.07,0\n\
             0.29,Premium,I,VS2,62.4,58,334,4.20,4.23,2.63\n",
        );

        let data = load_records(&path).unwrap();
        assert_eq!(data.rows_read, 4);
        assert_eq!(data.rows_used(), 2);
        assert_eq!(data.row_errors.len(), 2);
        assert_eq!(data.row_errors[0].line, 3);
        assert!(data.row_errors[0].message.contains("Excellent"));
        assert!(data.row_errors[1].message.contains("`z`"));
        assert_eq!(data.records[1].cut, Cut::Premium);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d.csv");
        write_file(&path, "carat,cut,color\n0.2,Ideal,E\n");
        let err = load_records(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.message().contains("clarity"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_records(Path::new("/nonexistent/diamonds.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn split_is_deterministic_with_ceil_test_size() {
        let records = generate_records(&SampleConfig { rows: 101, seed: 3 }).unwrap();
        let (train, test) = split_train_test(&records, 0.2, 42).unwrap();
        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);

        let (train2, test2) = split_train_test(&records, 0.2, 42).unwrap();
        assert_eq!(train, train2);
        assert_eq!(test, test2);

        let (_, test3) = split_train_test(&records, 0.2, 7).unwrap();
        assert_ne!(test, test3);
    }

    #[test]
    fn invalid_fraction_is_rejected() {
        let records = generate_records(&SampleConfig { rows: 10, seed: 3 }).unwrap();
        assert!(split_train_test(&records, 0.0, 42).is_err());
        assert!(split_train_test(&records, 1.5, 42).is_err());
    }

    #[test]
    fn ingestion_writes_three_csvs_that_reload() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        let records = generate_records(&SampleConfig { rows: 50, seed: 8 }).unwrap();
        write_records(&paths.dataset, &records).unwrap();

        let out = run_ingestion(&paths, 0.2, 42).unwrap();
        assert_eq!(out.train.len() + out.test.len(), 50);
        assert!(paths.raw_csv().exists());

        let reloaded = load_records(&out.test_path).unwrap();
        assert_eq!(reloaded.records, out.test);
        assert!(reloaded.row_errors.is_empty());
    }
}
