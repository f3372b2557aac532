use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub const REPLAY_EXTENSION: &str = "wotreplay";

#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub files: Vec<PathBuf>,
    pub missing_roots: Vec<PathBuf>,
}

/// Ordered scan roots: the replays folder next to the game executable wins,
/// then the fixed well-known user folders, then any user-configured extras.
pub fn replay_roots(executable: Option<&Path>, extra_roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(exe) = executable {
        if let Some(dir) = exe.parent() {
            roots.push(dir.join("replays"));
        }
    }

    if let Some(home) = dirs::home_dir() {
        roots.push(home.join("Documents").join("World of Tanks").join("replays"));
        roots.push(home.join("Downloads"));
    }

    roots.extend(extra_roots.iter().cloned());
    dedup_preserving_order(roots)
}

/// Recursively collects replay files under each root, in root order.
/// Entries are walked name-sorted so repeated scans of an unchanged tree
/// yield the same sequence. Roots that cannot be read are reported in
/// `missing_roots` and skipped; unreadable subtrees are skipped silently.
pub fn resolve(roots: &[PathBuf]) -> Resolved {
    let mut resolved = Resolved::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for root in roots {
        let canonical = match root.canonicalize() {
            Ok(canonical) if fs::read_dir(&canonical).is_ok() => canonical,
            _ => {
                tracing::debug!(root = %root.display(), "skipping unreadable scan root");
                resolved.missing_roots.push(root.clone());
                continue;
            }
        };

        for entry in WalkDir::new(&canonical)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if !has_replay_extension(entry.path()) {
                continue;
            }

            let path = entry.into_path();
            if seen.insert(path.clone()) {
                resolved.files.push(path);
            }
        }
    }

    tracing::debug!(
        files = resolved.files.len(),
        skipped_roots = resolved.missing_roots.len(),
        "replay scan finished"
    );
    resolved
}

fn has_replay_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(REPLAY_EXTENSION))
}

fn dedup_preserving_order(roots: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    roots
        .into_iter()
        .filter(|root| seen.insert(root.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"replay").unwrap();
    }

    #[test]
    fn finds_replays_recursively_and_name_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.wotreplay"));
        touch(&dir.path().join("a.wotreplay"));
        touch(&dir.path().join("season/2024/c.wotreplay"));

        let resolved = resolve(&[dir.path().to_path_buf()]);
        let names: Vec<_> = resolved
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, ["a.wotreplay", "b.wotreplay", "c.wotreplay"]);
        assert!(resolved.missing_roots.is_empty());
    }

    #[test]
    fn extension_match_is_case_insensitive_and_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("upper.WOTREPLAY"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("archive.wotreplay.bak"));

        let resolved = resolve(&[dir.path().to_path_buf()]);

        assert_eq!(resolved.files.len(), 1);
        assert!(resolved.files[0].ends_with("upper.WOTREPLAY"));
    }

    #[test]
    fn missing_root_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.wotreplay"));
        let missing = dir.path().join("does-not-exist");

        let resolved = resolve(&[missing.clone(), dir.path().to_path_buf()]);

        assert_eq!(resolved.files.len(), 1);
        assert_eq!(resolved.missing_roots, vec![missing]);
    }

    #[test]
    fn duplicate_paths_collapse_across_roots() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.wotreplay"));

        let root = dir.path().to_path_buf();
        let resolved = resolve(&[root.clone(), root]);

        assert_eq!(resolved.files.len(), 1);
    }

    #[test]
    fn replay_roots_put_executable_folder_first() {
        let exe = PathBuf::from("/games/wot/WorldOfTanks.exe");
        let extra = PathBuf::from("/data/replays");

        let roots = replay_roots(Some(&exe), &[extra.clone()]);

        assert_eq!(roots[0], PathBuf::from("/games/wot/replays"));
        assert_eq!(roots.last(), Some(&extra));
    }

    #[test]
    fn replay_roots_dedup_preserves_first_position() {
        let exe = PathBuf::from("/games/wot/WorldOfTanks.exe");
        let dup = PathBuf::from("/games/wot/replays");

        let roots = replay_roots(Some(&exe), &[dup.clone()]);

        assert_eq!(roots.iter().filter(|r| **r == dup).count(), 1);
        assert_eq!(roots[0], dup);
    }
}
