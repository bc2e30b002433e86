//! CSV Source Loader Module
//! Discovers per-source CSV files and loads them into one frame per source using Polars.

use crate::config::SourcePatterns;
use polars::prelude::*;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

pub const STATE_COL: &str = "state";
pub const DISTRICT_COL: &str = "district";

/// Fixed enrolment age-bracket columns.
pub const ENROLMENT_COLUMNS: [&str; 3] = ["age_0_5", "age_5_17", "age_18_greater"];

/// Marker identifying count columns in update sources.
pub const UPDATE_COLUMN_MARKER: &str = "age";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Data directory not found: {0}")]
    DataDirNotFound(PathBuf),
    #[error("{path}: missing required column '{column}'")]
    MissingKeyColumn { path: String, column: &'static str },
    #[error("Enrolment data is missing count column(s): {}", .0.join(", "))]
    MissingEnrolmentColumns(Vec<String>),
    #[error(
        "No enrolment rows found under {} ({files} matching files; working directory {})",
        root.display(),
        cwd.display()
    )]
    NoEnrolmentData {
        root: PathBuf,
        cwd: PathBuf,
        files: usize,
    },
}

/// The three logical input sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Enrolment,
    Demographic,
    Biometric,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Enrolment,
        SourceKind::Demographic,
        SourceKind::Biometric,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Enrolment => "enrolment",
            SourceKind::Demographic => "demographic update",
            SourceKind::Biometric => "biometric update",
        }
    }

    /// Select the count columns of this source from a file's header.
    pub fn count_columns(&self, columns: &[String]) -> Vec<String> {
        match self {
            SourceKind::Enrolment => columns
                .iter()
                .filter(|c| ENROLMENT_COLUMNS.contains(&c.as_str()))
                .cloned()
                .collect(),
            SourceKind::Demographic | SourceKind::Biometric => columns
                .iter()
                .filter(|c| c.contains(UPDATE_COLUMN_MARKER))
                .cloned()
                .collect(),
        }
    }
}

/// All rows of one source, concatenated across its files.
///
/// Key columns are strings and every count column is a non-negative Float64.
/// `frame` is `None` when the source has no files.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub kind: SourceKind,
    pub files: Vec<PathBuf>,
    pub frame: Option<DataFrame>,
    pub count_columns: Vec<String>,
}

impl SourceTable {
    pub fn empty(kind: SourceKind) -> Self {
        Self {
            kind,
            files: Vec::new(),
            frame: None,
            count_columns: Vec::new(),
        }
    }

    /// Build a table from an in-memory frame, applying the same
    /// normalisation as file loading.
    pub fn from_frame(kind: SourceKind, df: DataFrame) -> Result<Self, LoaderError> {
        let (lazy, count_columns) = DataLoader::normalize(kind, df, "<memory>")?;
        Ok(Self {
            kind,
            files: Vec::new(),
            frame: Some(lazy.collect()?),
            count_columns,
        })
    }

    pub fn row_count(&self) -> usize {
        self.frame.as_ref().map(|df| df.height()).unwrap_or(0)
    }
}

/// Loaded inputs for one run.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub enrolment: SourceTable,
    pub demographic: SourceTable,
    pub biometric: SourceTable,
}

impl SourceTables {
    /// Assemble tables, enforcing that enrolment data is present.
    pub fn new(
        enrolment: SourceTable,
        demographic: SourceTable,
        biometric: SourceTable,
    ) -> Result<Self, LoaderError> {
        let missing: Vec<String> = ENROLMENT_COLUMNS
            .iter()
            .filter(|c| !enrolment.count_columns.iter().any(|have| have == *c))
            .map(|c| c.to_string())
            .collect();
        if enrolment.row_count() > 0 && !missing.is_empty() {
            return Err(LoaderError::MissingEnrolmentColumns(missing));
        }

        Ok(Self {
            enrolment,
            demographic,
            biometric,
        })
    }
}

/// Locates and loads source CSV files beneath a data root.
pub struct DataLoader {
    root: PathBuf,
    patterns: SourcePatterns,
}

impl DataLoader {
    pub fn new(root: impl Into<PathBuf>, patterns: SourcePatterns) -> Self {
        Self {
            root: root.into(),
            patterns,
        }
    }

    /// Recursively find files for a source: `<prefix>*.csv`, hidden
    /// directories skipped, sorted by path.
    pub fn discover(&self, kind: SourceKind) -> Result<Vec<PathBuf>, LoaderError> {
        if !self.root.is_dir() {
            return Err(LoaderError::DataDirNotFound(self.root.clone()));
        }

        let prefix = self.patterns.prefix_for(kind);
        let mut files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable path: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| matches_source_file(entry.file_name(), prefix))
            .map(DirEntry::into_path)
            .collect();

        files.sort();
        Ok(files)
    }

    /// Discover and load every file of one source.
    pub fn load_source(&self, kind: SourceKind) -> Result<SourceTable, LoaderError> {
        let files = self.discover(kind)?;
        Self::load_files(kind, files)
    }

    /// Load all three sources. Fails when no enrolment rows exist.
    pub fn load_all(&self) -> Result<SourceTables, LoaderError> {
        let enrolment = self.load_source(SourceKind::Enrolment)?;
        if enrolment.row_count() == 0 {
            return Err(LoaderError::NoEnrolmentData {
                root: self.root.clone(),
                cwd: std::env::current_dir().unwrap_or_default(),
                files: enrolment.files.len(),
            });
        }

        let demographic = self.load_source(SourceKind::Demographic)?;
        let biometric = self.load_source(SourceKind::Biometric)?;

        SourceTables::new(enrolment, demographic, biometric)
    }

    /// Read and diagonally concatenate the given files.
    pub fn load_files(kind: SourceKind, files: Vec<PathBuf>) -> Result<SourceTable, LoaderError> {
        if files.is_empty() {
            return Ok(SourceTable::empty(kind));
        }

        let mut frames = Vec::with_capacity(files.len());
        let mut count_columns: Vec<String> = Vec::new();

        for path in &files {
            let (lazy, columns) = Self::read_csv(kind, path)?;
            for c in columns {
                if !count_columns.contains(&c) {
                    count_columns.push(c);
                }
            }
            frames.push(lazy);
        }

        let df = concat_lf_diagonal(frames, UnionArgs::default())?.collect()?;
        debug!(
            "Loaded {} {} rows from {} files",
            df.height(),
            kind.label(),
            files.len()
        );

        Ok(SourceTable {
            kind,
            files,
            frame: Some(df),
            count_columns,
        })
    }

    fn read_csv(kind: SourceKind, path: &Path) -> Result<(LazyFrame, Vec<String>), LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        debug!("Read {} rows from {}", df.height(), path.display());
        Self::normalize(kind, df, &path.display().to_string())
    }

    /// Keep the key columns plus this source's count columns, with counts
    /// coerced to non-negative Float64.
    fn normalize(
        kind: SourceKind,
        df: DataFrame,
        origin: &str,
    ) -> Result<(LazyFrame, Vec<String>), LoaderError> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for key in [STATE_COL, DISTRICT_COL] {
            if !columns.iter().any(|c| c == key) {
                return Err(LoaderError::MissingKeyColumn {
                    path: origin.to_string(),
                    column: key,
                });
            }
        }

        let count_columns = kind.count_columns(&columns);
        let mut exprs = vec![
            col(STATE_COL).cast(DataType::String),
            col(DISTRICT_COL).cast(DataType::String),
        ];
        exprs.extend(count_columns.iter().map(|c| sanitized_count(c)));

        Ok((df.lazy().select(exprs), count_columns))
    }
}

/// Non-numeric, missing, non-finite and negative cells all become zero.
fn sanitized_count(name: &str) -> Expr {
    let value = col(name).cast(DataType::Float64);
    when(value.clone().is_finite().and(value.clone().gt_eq(lit(0.0))))
        .then(value)
        .otherwise(lit(0.0))
        .alias(name)
}

fn matches_source_file(file_name: &OsStr, prefix: &str) -> bool {
    file_name
        .to_str()
        .map(|name| name.starts_with(prefix) && name.ends_with(".csv"))
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}
