use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const STORE_FILE_NAME: &str = ".wot_replay_ids";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write identifier store {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to move identifier store into place at {}: {source}", path.display())]
    Rename { path: PathBuf, source: io::Error },
}

/// Persisted mapping from replay path to its stable display number.
///
/// The file is line-oriented `<id>\t<path>` text. Ids start at 1 and a new
/// path always gets `max + 1`; an id assigned once never changes, even after
/// the file it pointed at disappears from disk. This type is the only reader
/// and writer of the store file.
#[derive(Debug)]
pub struct IdStore {
    path: PathBuf,
    ids: HashMap<String, u32>,
    next: u32,
}

impl IdStore {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(STORE_FILE_NAME))
    }

    /// Loads the store. A missing, unreadable, or corrupt file is an empty
    /// mapping; malformed lines inside a readable file are skipped
    /// individually. Never fatal.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut ids = HashMap::new();

        match fs::read_to_string(&path) {
            Ok(content) => {
                for line in content.lines() {
                    let Some((id, entry_path)) = parse_line(line) else {
                        if !line.trim().is_empty() {
                            tracing::warn!(line, "skipping malformed identifier record");
                        }
                        continue;
                    };
                    ids.insert(entry_path.to_string(), id);
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    %err,
                    "identifier store unreadable, starting empty"
                );
            }
        }

        let next = ids.values().copied().max().unwrap_or(0) + 1;
        Self { path, ids, next }
    }

    pub fn get(&self, path: &str) -> Option<u32> {
        self.ids.get(path).copied()
    }

    /// Returns the existing id for `path`, or allocates the next one.
    /// Idempotent per path; a retained entry for a vanished file is reused
    /// unchanged if the path reappears.
    pub fn get_or_assign(&mut self, path: &str) -> u32 {
        if let Some(id) = self.ids.get(path) {
            return *id;
        }

        let id = self.next;
        self.next += 1;
        self.ids.insert(path.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rewrites the whole mapping through a sibling temp file and a rename;
    /// the store file is never left half-written.
    pub fn persist(&self) -> Result<(), StoreError> {
        let mut entries: Vec<(&str, u32)> = self
            .ids
            .iter()
            .map(|(path, id)| (path.as_str(), *id))
            .collect();
        entries.sort_by_key(|(_, id)| *id);

        let mut body = String::new();
        for (path, id) in entries {
            let _ = writeln!(body, "{id}\t{path}");
        }

        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        let tmp = temp_sibling(&self.path);
        fs::write(&tmp, body).map_err(|source| StoreError::Write {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Rename {
            path: self.path.clone(),
            source,
        })
    }
}

fn parse_line(line: &str) -> Option<(u32, &str)> {
    let (id, path) = line.split_once('\t')?;
    let id: u32 = id.trim().parse().ok()?;
    if id == 0 || path.is_empty() {
        return None;
    }
    Some((id, path))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| STORE_FILE_NAME.into());
    name.push(".tmp");
    path.with_file_name(name)
}
