//! JSON-lines [`SampleLog`].
//!
//! One sample per line, appended and synced under an exclusive lock; the
//! parsed records are cached in memory so queries never touch the file.
//! Readers take the shared lock and therefore see a record only after its
//! line is fully on disk.
//!
//! Reset builds an empty file beside the log and renames it over the log:
//! the rename either happens (all records gone, new handle ready) or does
//! not (old file and cache untouched).

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use log::{error, info, warn};

use crate::adapters::file_store::sync_parent_directory;
use crate::app::ports::SampleLog;
use crate::error::StorageError;
use crate::sample::Sample;

struct Inner {
    file: File,
    /// Byte length of the well-formed prefix of the file.
    bytes: u64,
    cache: Vec<Sample>,
    /// A failed append left bytes that could not be cut off.  Appends are
    /// refused until the log is reopened (which drops the torn tail) or reset.
    needs_reopen: bool,
}

pub struct FileSampleLog {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl FileSampleLog {
    /// Open (creating if needed) the log at `path` and load its records.
    ///
    /// A torn final line, left by a crash mid-append, is cut off.
    /// Unparsable lines elsewhere are skipped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let (cache, bytes) = parse_lines(&text);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        if bytes < text.len() as u64 {
            warn!(
                "sample log {}: dropping torn trailing record ({} bytes)",
                path.display(),
                text.len() as u64 - bytes
            );
            file.set_len(bytes)?;
        }

        info!(
            "sample log {}: {} records loaded",
            path.display(),
            cache.len()
        );
        Ok(Self {
            path,
            inner: RwLock::new(Inner {
                file,
                bytes,
                cache,
                needs_reopen: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse complete lines; returns the records and the byte length of every
/// newline-terminated line.
fn parse_lines(text: &str) -> (Vec<Sample>, u64) {
    let mut records = Vec::new();
    let mut complete = 0usize;
    for (lineno, line) in text.split_inclusive('\n').enumerate() {
        if !line.ends_with('\n') {
            break;
        }
        complete += line.len();
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Sample>(trimmed) {
            Ok(s) => records.push(s),
            Err(e) => warn!("sample log line {}: skipped ({e})", lineno + 1),
        }
    }
    (records, complete as u64)
}

impl SampleLog for FileSampleLog {
    fn append(&self, sample: &Sample) -> Result<(), StorageError> {
        let mut line =
            serde_json::to_vec(sample).map_err(|e| StorageError::Encode(e.to_string()))?;
        line.push(b'\n');

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.needs_reopen {
            return Err(StorageError::Io(io::Error::other(
                "sample log holds a partial record; reopen to recover",
            )));
        }
        let written = inner
            .file
            .write_all(&line)
            .and_then(|()| inner.file.sync_data());
        if let Err(e) = written {
            // Cut any partial line so the next append starts clean.
            if let Err(cut) = inner.file.set_len(inner.bytes) {
                error!(
                    "sample log {}: partial record not removed ({cut}); appends refused until reopen",
                    self.path.display()
                );
                inner.needs_reopen = true;
            }
            return Err(e.into());
        }
        inner.bytes += line.len() as u64;
        inner.cache.push(*sample);
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Sample>, StorageError> {
        Ok(self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cache
            .clone())
    }

    fn reset(&self) -> Result<(), StorageError> {
        let mut tmp = self.path.as_os_str().to_os_string();
        tmp.push(".reset");
        let tmp_path = PathBuf::from(tmp);

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let swapped = (|| {
            File::create(&tmp_path)?.sync_all()?;
            let file = OpenOptions::new().append(true).open(&tmp_path)?;
            fs::rename(&tmp_path, &self.path)?;
            sync_parent_directory(&self.path)?;
            Ok::<File, io::Error>(file)
        })();

        match swapped {
            Ok(file) => {
                let dropped = inner.cache.len();
                *inner = Inner {
                    file,
                    bytes: 0,
                    cache: Vec::new(),
                    needs_reopen: false,
                };
                info!("sample log {}: reset ({dropped} records dropped)", self.path.display());
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(e.into())
            }
        }
    }

    fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cache
            .len()
    }
}
