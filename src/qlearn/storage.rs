//! Storage for learned action values.
//!
//! The table is sparse: only states the agent has updated are present, and
//! every lookup of an unseen `(state, action)` pair yields 0.0. Rows are
//! never removed.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while reading or writing a persisted value table.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read, written or renamed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved in the failed operation.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid value-table JSON.
    #[error("malformed value table: {0}")]
    Format(#[from] serde_json::Error),

    /// The table was written for a different action set.
    #[error("value table actions {found:?} do not match {expected:?}")]
    ActionMismatch {
        /// Actions the agent uses.
        expected: Vec<String>,
        /// Actions recorded in the file.
        found: Vec<String>,
    },

    /// A state row has the wrong number of values.
    #[error("state {state} has {found} values, expected {expected}")]
    RowLength {
        /// Offending state key.
        state: String,
        /// Number of actions.
        expected: usize,
        /// Number of values in the row.
        found: usize,
    },
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Sparse table of action values keyed by state.
///
/// Each state key maps to one value per action, indexed by the action's
/// position in its enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueStore {
    /// state_key -> [value per action]
    values: FxHashMap<String, Vec<f64>>,

    /// Number of actions per row.
    num_actions: usize,
}

impl ValueStore {
    /// Create an empty store for `num_actions` actions.
    pub fn new(num_actions: usize) -> Self {
        Self {
            values: FxHashMap::default(),
            num_actions,
        }
    }

    /// Number of actions per state row.
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Value of `action` in `state`, or 0.0 if never written.
    pub fn get(&self, state: &str, action: usize) -> f64 {
        self.values
            .get(state)
            .and_then(|row| row.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Insert or overwrite the value of `action` in `state`.
    pub fn set(&mut self, state: &str, action: usize, value: f64) {
        debug_assert!(action < self.num_actions, "action index {} out of range", action);

        if let Some(row) = self.values.get_mut(state) {
            row[action] = value;
            return;
        }

        let mut row = vec![0.0; self.num_actions];
        row[action] = value;
        self.values.insert(state.to_string(), row);
    }

    /// Highest action value in `state`.
    pub fn max_value(&self, state: &str) -> f64 {
        match self.values.get(state) {
            Some(row) => row.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            None => 0.0,
        }
    }

    /// Index of the highest-valued action in `state`.
    ///
    /// Ties go to the lowest index, so an unseen state always yields 0.
    pub fn best_action(&self, state: &str) -> usize {
        let Some(row) = self.values.get(state) else {
            return 0;
        };

        let mut best = 0;
        for (i, &value) in row.iter().enumerate().skip(1) {
            if value > row[best] {
                best = i;
            }
        }
        best
    }

    /// Number of states stored.
    pub fn num_states(&self) -> usize {
        self.values.len()
    }

    /// Whether no state has been written.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(state_key, values)` rows.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Export storage to serializable format.
    pub fn export(&self, actions: Vec<String>) -> ValueStoreExport {
        ValueStoreExport {
            actions,
            values: self.values.clone(),
        }
    }

    /// Import storage from serialized format, checking it against `actions`.
    pub fn import(data: ValueStoreExport, actions: &[String]) -> Result<Self, StoreError> {
        if data.actions != actions {
            return Err(StoreError::ActionMismatch {
                expected: actions.to_vec(),
                found: data.actions,
            });
        }

        let num_actions = actions.len();
        if let Some((state, row)) = data.values.iter().find(|(_, row)| row.len() != num_actions) {
            return Err(StoreError::RowLength {
                state: state.clone(),
                expected: num_actions,
                found: row.len(),
            });
        }

        Ok(Self {
            values: data.values,
            num_actions,
        })
    }

    /// Read a persisted table.
    ///
    /// Returns `Ok(None)` when nothing exists at `path`.
    pub fn try_load<P: AsRef<Path>>(
        path: P,
        actions: &[String],
    ) -> Result<Option<Self>, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let data: ValueStoreExport = serde_json::from_str(&content)?;
        Self::import(data, actions).map(Some)
    }

    /// Load a persisted table, falling back to an empty one.
    ///
    /// A missing file starts learning from scratch. An unreadable or corrupt
    /// file is logged and also yields an empty table.
    pub fn load<P: AsRef<Path>>(path: P, actions: &[String]) -> Self {
        let path = path.as_ref();
        match Self::try_load(path, actions) {
            Ok(Some(store)) => {
                info!(
                    path = %path.display(),
                    states = store.num_states(),
                    "loaded value table"
                );
                store
            }
            Ok(None) => {
                info!(path = %path.display(), "no value table found, starting empty");
                Self::new(actions.len())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding unreadable value table");
                Self::new(actions.len())
            }
        }
    }

    /// Persist the full table to `path`, replacing previous contents.
    ///
    /// Writes `<path>.tmp` first and renames it into place so an interrupted
    /// save leaves the previous file intact.
    pub fn save<P: AsRef<Path>>(&self, path: P, actions: &[String]) -> Result<(), StoreError> {
        let path = path.as_ref();
        let export = self.export(actions.to_vec());
        let json = serde_json::to_string_pretty(&export)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp = temp_path(path);
        let mut file = fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| StoreError::io(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }

    /// Get total memory usage estimate in bytes.
    pub fn memory_usage(&self) -> usize {
        self.values
            .iter()
            .map(|(k, v)| k.len() + v.len() * std::mem::size_of::<f64>())
            .sum()
    }
}

/// `<path>.tmp`, keeping the full file name so tables never share a temp file.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("q_table"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serializable export format for the value table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueStoreExport {
    /// Action names, in the order of each row.
    pub actions: Vec<String>,
    /// state_key -> [value per action]
    pub values: FxHashMap<String, Vec<f64>>,
}
