//! Copybook provider backed by the workspace file system.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;
use walkdir::WalkDir;

use crate::base::LogicalName;
use crate::base::constants::{
    COPYBOOK_EXTENSIONS, COPYBOOK_FOLDER_NAME, MAX_COPYBOOK_SEARCH_DEPTH,
};
use crate::bus::{Event, EventBus, EventKind, FetchResult, Subscription};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read copybook {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Finds copybooks in the `COPYBOOKS` folder of each workspace folder.
///
/// The index maps upper-cased file stems to paths. When two folders hold
/// the same name, the first folder scanned wins.
#[derive(Debug, Default)]
pub struct WorkspaceCopybookProvider {
    index: RwLock<FxHashMap<LogicalName, PathBuf>>,
}

impl WorkspaceCopybookProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the index from `folders`. Returns the number of copybooks found.
    pub fn scan_workspace(&self, folders: &[PathBuf]) -> usize {
        let mut index: FxHashMap<LogicalName, PathBuf> = FxHashMap::default();
        for folder in folders {
            let root = folder.join(COPYBOOK_FOLDER_NAME);
            if !root.is_dir() {
                tracing::debug!(folder = %folder.display(), "no copybook folder");
                continue;
            }
            for path in collect_copybook_paths(&root) {
                let Some(name) = copybook_name(&path) else {
                    continue;
                };
                if let Some(existing) = index.get(&name) {
                    tracing::debug!(
                        copybook = %name,
                        kept = %existing.display(),
                        ignored = %path.display(),
                        "duplicate copybook name"
                    );
                    continue;
                }
                index.insert(name, path);
            }
        }

        let count = index.len();
        tracing::info!(copybooks = count, folders = folders.len(), "workspace scanned");
        *self.index.write() = index;
        count
    }

    pub fn path_for(&self, name: &LogicalName) -> Option<PathBuf> {
        self.index.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Read a copybook. `Ok(None)` when the name is not indexed.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    pub fn load(&self, name: &LogicalName) -> Result<Option<(String, PathBuf)>, ProviderError> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        let bytes = std::fs::read(&path).map_err(|source| ProviderError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Some((String::from_utf8_lossy(&bytes).into_owned(), path)))
    }

    /// The answer to a scan request for `name`.
    pub fn fetch(&self, name: &LogicalName) -> FetchResult {
        match self.load(name) {
            Ok(Some((content, path))) => {
                FetchResult::found(name.clone(), content).with_uri(file_uri(&path))
            }
            Ok(None) => {
                tracing::debug!(copybook = %name, "copybook not in workspace");
                FetchResult::not_found(name.clone())
            }
            Err(err) => {
                tracing::warn!(copybook = %name, error = %err, "copybook unreadable");
                FetchResult::not_found(name.clone())
            }
        }
    }

    /// Answer scan requests on `bus` until the returned guard is dropped.
    ///
    /// Answers are published synchronously from inside the request's dispatch.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) -> Subscription {
        let provider = Arc::clone(self);
        let responder = bus.clone();
        bus.subscribe(EventKind::ScanRequest, move |event| {
            if let Event::ScanRequest(request) = event {
                responder.publish(provider.fetch(&request.name));
            }
        })
    }
}

fn collect_copybook_paths(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .max_depth(MAX_COPYBOOK_SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| has_copybook_extension(path))
        .collect()
}

fn has_copybook_extension(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        None => true,
        Some(ext) => COPYBOOK_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
    }
}

fn copybook_name(path: &Path) -> Option<LogicalName> {
    let stem = path.file_stem()?.to_str()?;
    LogicalName::new(stem).ok()
}

/// `file://` URI for an absolute path.
pub fn file_uri(path: &Path) -> String {
    let display = path.to_string_lossy().replace('\\', "/");
    if display.starts_with('/') {
        format!("file://{display}")
    } else {
        format!("file:///{display}")
    }
}
