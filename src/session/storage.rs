use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

/// Durable string slots backing the session, in the spirit of browser `localStorage`.
/// Implementations never fail from the caller's point of view; backend trouble is logged
/// and degrades to "slot absent".
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_items(&self, items: &[(&str, String)]);
    fn remove_items(&self, keys: &[&str]);

    fn set_item(&self, key: &str, value: String) { self.set_items(&[(key, value)]); }
    fn remove_item(&self, key: &str) { self.remove_items(&[key]); }
}

/// Process-local storage. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> { self.slots.read().get(key).cloned() }

    fn set_items(&self, items: &[(&str, String)]) {
        let mut m = self.slots.write();
        for (k, v) in items { m.insert(k.to_string(), v.clone()); }
    }

    fn remove_items(&self, keys: &[&str]) {
        let mut m = self.slots.write();
        for k in keys { m.remove(*k); }
    }
}

/// JSON-file storage: the whole slot map lives in one document which is rewritten
/// (temp file + rename) on each mutation, so a crash leaves either the old or the new state.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    slots: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file. A missing or unreadable file starts empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let slots = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                Ok(m) => m,
                Err(e) => {
                    warn!(target: "resetmental::session", "session file '{}' is not valid JSON, starting empty: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(target: "resetmental::session", "cannot read session file '{}', starting empty: {}", path.display(), e);
                HashMap::new()
            }
        };
        debug!(target: "resetmental::session", "opened session file '{}' slots={}", path.display(), slots.len());
        Self { path, slots: RwLock::new(slots) }
    }

    pub fn path(&self) -> &Path { &self.path }

    // Called with the write lock held so concurrent mutations serialize their flushes.
    fn flush(&self, slots: &HashMap<String, String>) {
        if let Err(e) = write_atomic(&self.path, slots) {
            warn!(target: "resetmental::session", "failed to persist session file '{}': {}", self.path.display(), e);
        }
    }
}

fn write_atomic(path: &Path, slots: &HashMap<String, String>) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
    }
    let bytes = serde_json::to_vec_pretty(slots).map_err(std::io::Error::other)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> { self.slots.read().get(key).cloned() }

    fn set_items(&self, items: &[(&str, String)]) {
        if items.is_empty() { return; }
        let mut m = self.slots.write();
        for (k, v) in items { m.insert(k.to_string(), v.clone()); }
        self.flush(&m);
    }

    fn remove_items(&self, keys: &[&str]) {
        let mut m = self.slots.write();
        let mut changed = false;
        for k in keys { changed |= m.remove(*k).is_some(); }
        if changed { self.flush(&m); }
    }
}
