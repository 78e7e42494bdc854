//! Reading statement batches from SQL files

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::batch::StatementBatch;
use crate::error::{BatchError, BatchResult};

impl StatementBatch {
    /// Load and split a single SQL file.
    ///
    /// # Errors
    /// [`BatchError::Read`] if the file cannot be opened or is not valid UTF-8.
    pub fn load(path: impl AsRef<Path>) -> BatchResult<Self> {
        let path = path.as_ref();
        let read_error = |source| BatchError::Read {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(read_error)?;
        let batch = Self::from_reader(BufReader::new(file)).map_err(read_error)?;

        tracing::info!(
            path = %path.display(),
            statements = batch.len(),
            "loaded SQL file"
        );
        Ok(batch)
    }

    /// Load several SQL files into one batch, in argument order.
    ///
    /// The first file that cannot be read fails the whole load.
    pub fn load_files<I, P>(paths: I) -> BatchResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let batches = paths
            .into_iter()
            .map(Self::load)
            .collect::<BatchResult<Vec<_>>>()?;
        Ok(Self::concat(batches))
    }

    /// Load every `.sql` file directly inside `dir`, ordered by file name.
    ///
    /// Subdirectories are not descended into. An empty directory gives an
    /// empty batch.
    pub fn load_dir(dir: impl AsRef<Path>) -> BatchResult<Self> {
        let dir = dir.as_ref();
        let files = sql_files_in(dir).map_err(|source| BatchError::Read {
            path: dir.to_path_buf(),
            source,
        })?;

        tracing::debug!(dir = %dir.display(), files = files.len(), "found SQL files");
        Self::load_files(files)
    }
}

fn sql_files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_sql = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if is_sql && entry.file_type()?.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
