//! Dataset Loader
//! Reads the retail transactions CSV into memory using Polars.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("dataset '{path}' not found; place it in the working directory or adjust DATA_PATH")]
    DatasetNotFound { path: String },
    #[error("failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
}

/// Load a delimited dataset with a header row, materializing it fully.
///
/// The only validation performed here is the existence check; malformed
/// contents surface as whatever the CSV parser reports.
pub fn load_dataset(path: &str) -> Result<DataFrame, LoaderError> {
    if !Path::new(path).exists() {
        return Err(LoaderError::DatasetNotFound {
            path: path.to_string(),
        });
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;

    info!(rows = df.height(), columns = df.width(), %path, "dataset loaded");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_the_path() {
        let err = load_dataset("no_such_dataset.csv").unwrap_err();
        match err {
            LoaderError::DatasetNotFound { path } => assert_eq!(path, "no_such_dataset.csv"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loads_a_csv_with_header() {
        let dir = std::env::temp_dir().join("storelens_loader_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mini.csv");
        std::fs::write(&path, "Sales,Category\n10.5,Furniture\n3.0,Office\n").unwrap();

        let df = load_dataset(path.to_str().unwrap()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }
}
