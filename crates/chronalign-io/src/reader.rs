//! CSV readers for series and labelled training examples.

use std::fs::File;
use std::path::{Path, PathBuf};

use chronalign_dtw::Series;
use chronalign_knn::TrainingExample;
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads one multivariate series from a CSV file.
///
/// Expected CSV format:
/// - Header row required, one column per feature
/// - One row per frame, in time order
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::Series`] | The frames fail series validation |
pub struct SeriesReader {
    path: PathBuf,
}

impl SeriesReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning one frame per row.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Series<f64>, IoError> {
        let (mut rdr, expected_cols) = open_csv(&self.path)?;

        let mut frames = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = checked_record(&self.path, row_index, result, expected_cols)?;
            let frame = (0..record.len())
                .map(|col_index| parse_value(&self.path, &record, row_index, col_index))
                .collect::<Result<Vec<_>, _>>()?;
            frames.push(frame);
        }

        if frames.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let series = Series::new(frames).map_err(|e| IoError::Series {
            path: self.path.clone(),
            source: e,
        })?;

        info!(
            n_frames = series.len(),
            dimension = series.dimension(),
            "series loaded"
        );
        Ok(series)
    }
}

/// Training examples read from a CSV file, with the feature column names.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleSet {
    /// Header names of the feature columns.
    pub input_names: Vec<String>,
    /// One example per data row.
    pub examples: Vec<TrainingExample>,
}

/// Reads labelled training examples from a CSV file.
///
/// Expected CSV format:
/// - Header row required
/// - Leading label columns holding non-negative integer classes (one by default,
///   conventionally named `class`), followed by feature columns
/// - `class,f0,f1,...,fn`
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::TooFewColumns`] | Header has no feature column after the labels |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidLabel`] | Label cell is not a non-negative integer |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable float |
pub struct ExampleReader {
    path: PathBuf,
    label_columns: usize,
}

impl ExampleReader {
    /// Create a new reader with a single leading label column.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            label_columns: 1,
        }
    }

    /// Treat the first `n` columns as labels, one per output model.
    #[must_use]
    pub fn with_label_columns(mut self, n: usize) -> Self {
        self.label_columns = n.max(1);
        self
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display(), label_columns = self.label_columns))]
    pub fn read(&self) -> Result<ExampleSet, IoError> {
        let (mut rdr, expected_cols) = open_csv(&self.path)?;
        if expected_cols <= self.label_columns {
            return Err(IoError::TooFewColumns {
                path: self.path.clone(),
                needed: self.label_columns + 1,
                got: expected_cols,
            });
        }

        let input_names = rdr
            .headers()
            .map_err(|e| csv_error(&self.path, e))?
            .iter()
            .skip(self.label_columns)
            .map(str::to_string)
            .collect();

        let mut examples = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = checked_record(&self.path, row_index, result, expected_cols)?;

            let output = (0..self.label_columns)
                .map(|col_index| parse_label(&self.path, &record, row_index, col_index))
                .collect::<Result<Vec<_>, _>>()?;
            let input = (self.label_columns..record.len())
                .map(|col_index| parse_value(&self.path, &record, row_index, col_index))
                .collect::<Result<Vec<_>, _>>()?;

            examples.push(TrainingExample::new(input, output));
        }

        if examples.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_examples = examples.len(),
            n_features = expected_cols - self.label_columns,
            "training examples loaded"
        );
        Ok(ExampleSet {
            input_names,
            examples,
        })
    }
}

fn open_csv(path: &Path) -> Result<(csv::Reader<File>, usize), IoError> {
    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    // flexible(true) so ragged rows surface as InconsistentRowLength rather
    // than a CsvParse error.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let expected_cols = rdr.headers().map_err(|e| csv_error(path, e))?.len();
    debug!(expected_cols, "read CSV header");
    Ok((rdr, expected_cols))
}

fn csv_error(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

fn checked_record(
    path: &Path,
    row_index: usize,
    result: Result<csv::StringRecord, csv::Error>,
    expected_cols: usize,
) -> Result<csv::StringRecord, IoError> {
    let record = result.map_err(|e| csv_error(path, e))?;
    if record.len() != expected_cols {
        return Err(IoError::InconsistentRowLength {
            path: path.to_path_buf(),
            row_index,
            expected: expected_cols,
            got: record.len(),
        });
    }
    Ok(record)
}

fn parse_value(
    path: &Path,
    record: &csv::StringRecord,
    row_index: usize,
    col_index: usize,
) -> Result<f64, IoError> {
    let raw = record.get(col_index).unwrap_or("");
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(IoError::NonFiniteValue {
            path: path.to_path_buf(),
            row_index,
            col_index,
            raw: raw.to_string(),
        }),
    }
}

fn parse_label(
    path: &Path,
    record: &csv::StringRecord,
    row_index: usize,
    col_index: usize,
) -> Result<usize, IoError> {
    let raw = record.get(col_index).unwrap_or("");
    raw.parse().map_err(|_| IoError::InvalidLabel {
        path: path.to_path_buf(),
        row_index,
        col_index,
        raw: raw.to_string(),
    })
}
