use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use replaycore_meta::{MetadataSource, ReplayMeta};
use replaycore_store::IdStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFile {
    pub path: PathBuf,
    pub display_name: String,
    pub meta: ReplayMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: u32,
    pub file: ReplayFile,
}

/// The live, ordered view of discovered replays. Rebuilt wholesale on each
/// rescan; identifiers come from the store, so row numbers survive restarts
/// and file removals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    rows: Vec<CatalogRow>,
}

impl Catalog {
    /// Consolidates resolved paths into ordered rows: ids assigned (or
    /// reused) in discovery order, rows sorted by id ascending. Decoration
    /// failures leave the metadata fields absent; they never abort the build.
    pub fn build(files: &[PathBuf], store: &mut IdStore, source: &dyn MetadataSource) -> Self {
        let mut rows = Vec::with_capacity(files.len());

        for path in files {
            let key = path.to_string_lossy();
            let id = store.get_or_assign(key.as_ref());
            let meta = source.enrich(path).unwrap_or_default();

            rows.push(CatalogRow {
                id,
                file: ReplayFile {
                    path: path.clone(),
                    display_name: display_name_for(path),
                    meta,
                },
            });
        }

        rows.sort_by_key(|row| row.id);
        Self { rows }
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_by_id(&self, id: u32) -> Option<&CatalogRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Case-insensitive substring filter over display name and any present
    /// metadata fields. An empty query keeps everything; survivors keep
    /// their relative order.
    pub fn filter(&self, query: &str) -> Vec<CatalogRow> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.rows.clone();
        }

        self.rows
            .iter()
            .filter(|row| row_matches(row, &needle))
            .cloned()
            .collect()
    }
}

/// Renders the user-facing `#NNN` label; ids past 999 grow naturally.
pub fn display_label(id: u32) -> String {
    format!("#{id:03}")
}

fn display_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn row_matches(row: &CatalogRow, needle_lower: &str) -> bool {
    if row.file.display_name.to_lowercase().contains(needle_lower) {
        return true;
    }

    row.file
        .meta
        .present_fields()
        .any(|field| field.to_lowercase().contains(needle_lower))
}

#[cfg(test)]
mod tests {
    use super::*;
    use replaycore_meta::NoMetadata;
    use replaycore_store::STORE_FILE_NAME;

    struct FixedMeta(ReplayMeta);

    impl MetadataSource for FixedMeta {
        fn enrich(&self, _path: &Path) -> Option<ReplayMeta> {
            Some(self.0.clone())
        }
    }

    fn fresh_store(dir: &tempfile::TempDir) -> IdStore {
        IdStore::load(dir.path().join(STORE_FILE_NAME))
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| PathBuf::from(format!("/home/u/Documents/World of Tanks/replays/{name}")))
            .collect()
    }

    #[test]
    fn build_numbers_in_discovery_order_and_sorts_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);

        let catalog = Catalog::build(
            &paths(&["a.wotreplay", "b.wotreplay"]),
            &mut store,
            &NoMetadata,
        );

        let ids: Vec<_> = catalog.rows().iter().map(|row| row.id).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(catalog.rows()[0].file.display_name, "a");
        assert_eq!(catalog.rows()[1].file.display_name, "b");
    }

    #[test]
    fn rebuild_on_unchanged_input_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);
        let files = paths(&["a.wotreplay", "b.wotreplay", "c.wotreplay"]);

        let first = Catalog::build(&files, &mut store, &NoMetadata);
        let second = Catalog::build(&files, &mut store, &NoMetadata);

        assert_eq!(first, second);
    }

    #[test]
    fn removed_file_keeps_its_number_reserved() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);

        Catalog::build(&paths(&["a.wotreplay", "b.wotreplay"]), &mut store, &NoMetadata);
        let after = Catalog::build(
            &paths(&["a.wotreplay", "c.wotreplay"]),
            &mut store,
            &NoMetadata,
        );

        let ids: Vec<_> = after.rows().iter().map(|row| row.id).collect();
        assert_eq!(ids, [1, 3]);
        assert_eq!(store.get("/home/u/Documents/World of Tanks/replays/b.wotreplay"), Some(2));
    }

    #[test]
    fn reappearing_file_reuses_its_old_number() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);

        Catalog::build(&paths(&["a.wotreplay", "b.wotreplay"]), &mut store, &NoMetadata);
        Catalog::build(&paths(&["a.wotreplay"]), &mut store, &NoMetadata);
        let back = Catalog::build(
            &paths(&["a.wotreplay", "b.wotreplay"]),
            &mut store,
            &NoMetadata,
        );

        let ids: Vec<_> = back.rows().iter().map(|row| row.id).collect();
        assert_eq!(ids, [1, 2]);
    }

    #[test]
    fn empty_filter_returns_the_full_ordered_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);
        let catalog = Catalog::build(
            &paths(&["a.wotreplay", "b.wotreplay"]),
            &mut store,
            &NoMetadata,
        );

        assert_eq!(catalog.filter(""), catalog.rows().to_vec());
        assert_eq!(catalog.filter("   "), catalog.rows().to_vec());
    }

    #[test]
    fn filter_keeps_order_and_only_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);
        let catalog = Catalog::build(
            &paths(&["alpha.wotreplay", "bravo.wotreplay", "almost.wotreplay"]),
            &mut store,
            &NoMetadata,
        );

        let hits = catalog.filter("AL");
        let ids: Vec<_> = hits.iter().map(|row| row.id).collect();

        assert_eq!(ids, [1, 3]);
    }

    #[test]
    fn filter_matches_present_metadata_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);
        let meta = ReplayMeta {
            map: Some("Prokhorovka".to_string()),
            ..ReplayMeta::default()
        };
        let catalog = Catalog::build(&paths(&["a.wotreplay"]), &mut store, &FixedMeta(meta));

        assert_eq!(catalog.filter("prokho").len(), 1);
        assert!(catalog.filter("himmelsdorf").is_empty());
    }

    #[test]
    fn display_labels_pad_to_three_digits() {
        assert_eq!(display_label(1), "#001");
        assert_eq!(display_label(42), "#042");
        assert_eq!(display_label(1000), "#1000");
    }
}
