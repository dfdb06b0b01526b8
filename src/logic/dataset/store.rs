use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::record::Reading;
use super::StoreError;

/// Append-only CSV table of raw readings.
///
/// The ingest path only ever appends; rows already on disk are never
/// rewritten. Appends from one process are serialized by `write_lock`.
pub struct FeatureStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FeatureStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one reading as a row.
    /// Writes the header first when the file is absent or empty.
    pub fn append(&self, reading: &Reading) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        ensure_parent_dir(&self.path)?;
        let write_header = needs_header(&self.path)?;

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);

        writer.serialize(reading)?;
        writer.flush()?;

        Ok(())
    }

    /// Load the whole table in file order
    pub fn load_all(&self) -> Result<Vec<Reading>, StoreError> {
        let file = open_existing(&self.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        reader
            .deserialize::<Reading>()
            .map(|row| row.map_err(StoreError::from))
            .collect()
    }

    /// Number of data rows currently stored (0 when the file is missing)
    pub fn row_count(&self) -> Result<usize, StoreError> {
        let file = match open_existing(&self.path) {
            Ok(f) => f,
            Err(StoreError::NotFound(_)) => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut reader = csv::Reader::from_reader(BufReader::new(file));
        let mut count = 0;
        for record in reader.records() {
            record?;
            count += 1;
        }
        Ok(count)
    }
}

pub(super) fn open_existing(path: &Path) -> Result<File, StoreError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => StoreError::NotFound(path.to_path_buf()),
        _ => StoreError::Io(e),
    })
}

pub(super) fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn needs_header(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}
