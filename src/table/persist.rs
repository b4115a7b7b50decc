use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
};

use crate::{
    foundation::core::TABLES_FILE_NAME,
    foundation::error::{MeltError, MeltResult},
    table::codec,
    table::store::TableStore,
};

/// Location of the tables file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TablesFile {
    path: PathBuf,
}

impl TablesFile {
    /// Tables file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/TABLES1.WAD`, creating `dir` when it does not exist yet.
    pub fn in_config_dir(dir: &Path) -> MeltResult<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| MeltError::io(format!("create config dir '{}'", dir.display()), e))?;
        Ok(Self::new(dir.join(TABLES_FILE_NAME)))
    }

    /// Path of the tables file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save `store`; see [`save_all`].
    pub fn save(&self, store: &TableStore) -> MeltResult<SaveSummary> {
        save_all(store, &self.path)
    }

    /// Load into `store`; see [`load_all`].
    pub fn load(&self, store: &mut TableStore) -> MeltResult<LoadSummary> {
        load_all(store, &self.path)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// What a save wrote.
pub struct SaveSummary {
    /// Tables written to the file.
    pub written: u32,
    /// Unreferenced dead tables left out of the file.
    pub dropped: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// What a load read.
pub struct LoadSummary {
    /// Table count announced by the file header (0 when there was no file).
    pub declared: u32,
    /// Tables read and inserted into the store.
    pub loaded: u32,
    /// Tables read but skipped because their UUID was already present.
    pub skipped: u32,
}

/// Encode every table that is not both unreferenced and dead.
pub fn encode_tables(store: &TableStore) -> MeltResult<(Vec<u8>, SaveSummary)> {
    let mut summary = SaveSummary::default();
    let survivors: Vec<_> = store
        .iter()
        .filter(|t| {
            if t.is_collectable() {
                tracing::info!(uuid = %t.uuid(), "table removed by cleanup");
                summary.dropped += 1;
                false
            } else {
                true
            }
        })
        .collect();

    let count = u32::try_from(survivors.len())
        .map_err(|_| MeltError::validation("too many tables to save"))?;
    let mut buf = Vec::new();
    codec::write_header(&mut buf, count)?;
    for table in survivors {
        codec::write_entry(&mut buf, table)?;
        summary.written += 1;
    }
    Ok((buf, summary))
}

/// Decode tables from `r` into `store`.
///
/// On the first unreadable entry the tables decoded so far stay in the store and
/// [`MeltError::PartialLoad`] is returned; nothing after the failing entry is read.
pub fn decode_tables(store: &mut TableStore, r: &mut dyn Read) -> MeltResult<LoadSummary> {
    let declared = codec::read_header(r)?;
    let mut summary = LoadSummary {
        declared,
        ..LoadSummary::default()
    };

    for index in 0..declared {
        let table = match codec::read_entry(r, index) {
            Ok(table) => table,
            Err(err) => {
                return Err(MeltError::PartialLoad {
                    recovered: index,
                    declared,
                    source: Box::new(err),
                });
            }
        };
        let uuid = table.uuid();
        if store.insert_loaded(table) {
            tracing::info!(%uuid, "read table");
            summary.loaded += 1;
        } else {
            summary.skipped += 1;
        }
    }
    Ok(summary)
}

/// Write the whole store to `path`.
///
/// The file image is built in memory and written to a sibling temporary file that is then
/// renamed over `path`, so a failed save leaves the previous file as it was.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn save_all(store: &TableStore, path: &Path) -> MeltResult<SaveSummary> {
    let (bytes, summary) = encode_tables(store)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = write_file(&tmp, &bytes).and_then(|()| {
        std::fs::rename(&tmp, path).map_err(|e| {
            MeltError::io(
                format!("replace tables file '{}'", path.display()),
                e,
            )
        })
    });
    if let Err(err) = written {
        let _ = std::fs::remove_file(&tmp);
        tracing::error!(error = %err, "IO error writing tables");
        return Err(err);
    }

    tracing::info!(
        written = summary.written,
        dropped = summary.dropped,
        "saved tables"
    );
    Ok(summary)
}

fn write_file(path: &Path, bytes: &[u8]) -> MeltResult<()> {
    let mut f = File::create(path)
        .map_err(|e| MeltError::io(format!("create '{}'", path.display()), e))?;
    f.write_all(bytes)
        .map_err(|e| MeltError::io(format!("write '{}'", path.display()), e))?;
    f.sync_all()
        .map_err(|e| MeltError::io(format!("flush '{}'", path.display()), e))
}

/// Read tables from `path` into `store`.
///
/// A missing file is not an error: the store simply stays as it is.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_all(store: &mut TableStore, path: &Path) -> MeltResult<LoadSummary> {
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no tables file yet");
            return Ok(LoadSummary::default());
        }
        Err(e) => {
            return Err(MeltError::io(
                format!("open tables file '{}'", path.display()),
                e,
            ));
        }
    };

    let mut reader = BufReader::new(f);
    match decode_tables(store, &mut reader) {
        Ok(summary) => {
            tracing::info!(loaded = summary.loaded, "loaded tables");
            Ok(summary)
        }
        Err(err) => {
            tracing::error!(
                error = %err,
                "error occurred while reading the tables file; unreadable tables will be regenerated"
            );
            Err(err)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/table/persist.rs"]
mod tests;
