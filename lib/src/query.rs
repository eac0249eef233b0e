//! SQL over a directory of parquet files
//!
//! [`QueryEngine`] is a thin façade over the SQL engine: every call opens a
//! fresh in-process session, registers the parquet files found in the
//! dataset directory as tables, runs one query, and tears the session down.
//! Nothing is shared between calls, so concurrent callers cannot observe
//! each other.

use crate::params::{self, Param};
use crate::Result;
use itertools::Itertools;
use polars::{prelude::*, sql::SQLContext};
use std::path::{Path, PathBuf};

/// Stateless query executor for a single dataset directory.
///
/// Holds only the directory path. Each dataset file is addressable in SQL by
/// its file stem (`FROM games`) or by its file name (`FROM "games.parquet"`,
/// `FROM 'games.parquet'`).
#[derive(Debug, Clone)]
pub struct QueryEngine {
    data_dir: PathBuf,
}

/// One column of a dataset file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: DataType,
}

/// Outcome of a schema lookup. A missing file is an expected result, not an
/// error; callers branch on the variant instead of catching anything.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaLookup {
    Found {
        filename: String,
        columns: Vec<ColumnSchema>,
    },
    NotFound {
        filename: String,
    },
}

impl SchemaLookup {
    pub fn filename(&self) -> &str {
        match self {
            SchemaLookup::Found { filename, .. } => filename,
            SchemaLookup::NotFound { filename } => filename,
        }
    }

    pub fn columns(&self) -> Option<&[ColumnSchema]> {
        match self {
            SchemaLookup::Found { columns, .. } => Some(columns),
            SchemaLookup::NotFound { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaLookup::NotFound { .. })
    }
}

impl QueryEngine {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        QueryEngine {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Run a query with no bound parameters.
    pub fn execute(&self, sql: &str) -> Result<DataFrame> {
        self.execute_with(sql, &[])
    }

    /// Bind `?` placeholders to `params` and run the query, materializing
    /// the full result. An empty frame is a valid result, distinct from an
    /// error. The session lives only for this call; it is dropped on every
    /// exit path, error returns included.
    pub fn execute_with(&self, sql: &str, params: &[Param]) -> Result<DataFrame> {
        let bound = params::bind(sql, params)?;

        let mut ctx = SQLContext::new();
        if self.data_dir.is_dir() {
            self.register_datasets(&mut ctx)?;
        }

        let df = ctx.execute(&bound)?.collect()?;
        log::debug!("query returned {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }

    /// Names of the parquet files directly inside the dataset directory,
    /// alphabetical. A missing directory is created and reported as empty:
    /// listing is expected to run speculatively before any data exists.
    pub fn list_datasets(&self) -> Result<Vec<String>> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)?;
            return Ok(Vec::new());
        }

        let names = std::fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_parquet(path))
            .filter_map(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
            })
            .sorted()
            .collect();
        Ok(names)
    }

    /// Column names and types of one dataset file, in file order. Only the
    /// parquet metadata is read. A missing file yields
    /// [`SchemaLookup::NotFound`], never an `Err`.
    pub fn describe_schema(&self, filename: &str) -> Result<SchemaLookup> {
        let path = self.data_dir.join(filename);
        if !path.is_file() {
            return Ok(SchemaLookup::NotFound {
                filename: filename.to_string(),
            });
        }

        let mut lf = LazyFrame::scan_parquet(&path, ScanArgsParquet::default())?;
        let schema = lf.schema()?;
        let columns = schema
            .iter()
            .map(|(name, dtype)| ColumnSchema {
                name: name.to_string(),
                dtype: dtype.clone(),
            })
            .collect();
        Ok(SchemaLookup::Found {
            filename: filename.to_string(),
            columns,
        })
    }

    // Registers every readable parquet file under both its stem and its file
    // name, so bare names resolve against the dataset directory no matter
    // where the process is running from. Registered names shadow the
    // engine's own path lookup.
    fn register_datasets(&self, ctx: &mut SQLContext) -> Result<()> {
        let files: Vec<PathBuf> = std::fs::read_dir(&self.data_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_parquet(path))
            .sorted()
            .collect();

        let mut registered = 0;
        for path in files {
            let filename = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            match LazyFrame::scan_parquet(&path, ScanArgsParquet::default()) {
                Ok(lf) => {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        ctx.register(stem, lf.clone());
                    }
                    ctx.register(&filename, lf);
                    registered += 1;
                }
                // One unreadable file must not poison unrelated queries; a
                // query naming it still fails with the engine's own
                // "relation not found" diagnostic.
                Err(e) => log::warn!("Skipping unreadable dataset {}: {}", filename, e),
            }
        }
        log::debug!("registered {} datasets from {}", registered, self.data_dir.display());
        Ok(())
    }
}

fn is_parquet(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("parquet")
}
